use super::*;
use jsonwebtoken::{EncodingKey, Header, encode};

const SECRET: &str = "supersecretsessionsecretforunittesting123";

fn sample_user() -> SessionUser {
    SessionUser {
        user_identifier: "42".to_string(),
        display_name: Some("octocat".to_string()),
        email: Some("octocat@example.com".to_string()),
        avatar_url: Some("https://avatars.example/42".to_string()),
    }
}

#[test]
fn test_session_token_roundtrip() {
    let token = issue_session_token(&sample_user(), SECRET).unwrap();

    let claims = validate_session_token(&token, SECRET).expect("Valid token should pass");
    assert_eq!(claims.sub, "42");
    assert_eq!(claims.name.as_deref(), Some("octocat"));
    assert_eq!(claims.email.as_deref(), Some("octocat@example.com"));
}

#[test]
fn test_expired_session_token_is_rejected() {
    let my_claims = SessionClaims {
        sub: "42".to_string(),
        name: None,
        email: None,
        avatar_url: None,
        exp: 1, // past
    };

    let token = encode(
        &Header::default(),
        &my_claims,
        &EncodingKey::from_secret(SECRET.as_bytes()),
    )
    .unwrap();

    let result = validate_session_token(&token, SECRET);
    assert!(result.is_err());
}

#[test]
fn test_session_token_with_wrong_secret_is_rejected() {
    let token = issue_session_token(&sample_user(), "wrongsecret").unwrap();

    let result = validate_session_token(&token, SECRET);
    assert!(result.is_err());
}
