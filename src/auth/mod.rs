use std::sync::Arc;

use anyhow::{Result, anyhow};
use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
};
use axum_extra::extract::cookie::CookieJar;
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::config::config_model::DotEnvyConfig;

pub const SESSION_COOKIE: &str = "storefront_session";
const SESSION_TTL_DAYS: i64 = 7;

#[derive(Debug, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Stable external identity, e.g. a stringified GitHub numeric id.
    pub sub: String,
    pub name: Option<String>,
    pub email: Option<String>,
    pub avatar_url: Option<String>,
    pub exp: usize,
}

/// Authenticated caller resolved from the session cookie.
#[derive(Debug, Clone)]
pub struct SessionUser {
    pub user_identifier: String,
    pub display_name: Option<String>,
    pub email: Option<String>,
    pub avatar_url: Option<String>,
}

/// Session extractor that never rejects; handlers that redirect instead of
/// returning 401 use this one.
#[derive(Debug, Clone)]
pub struct OptionalSessionUser(pub Option<SessionUser>);

#[derive(Debug)]
pub struct AuthError(anyhow::Error);

impl From<anyhow::Error> for AuthError {
    fn from(err: anyhow::Error) -> Self {
        AuthError(err)
    }
}

impl axum::response::IntoResponse for AuthError {
    fn into_response(self) -> axum::response::Response {
        (
            StatusCode::UNAUTHORIZED,
            format!("Unauthorized: {}", self.0),
        )
            .into_response()
    }
}

pub fn issue_session_token(user: &SessionUser, secret: &str) -> Result<String> {
    let claims = SessionClaims {
        sub: user.user_identifier.clone(),
        name: user.display_name.clone(),
        email: user.email.clone(),
        avatar_url: user.avatar_url.clone(),
        exp: (Utc::now() + Duration::days(SESSION_TTL_DAYS)).timestamp() as usize,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|err| anyhow!("failed to sign session token: {}", err))
}

pub fn validate_session_token(token: &str, secret: &str) -> Result<SessionClaims> {
    let token_data = decode::<SessionClaims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|err| anyhow!("session token validation failed: {}", err))?;

    Ok(token_data.claims)
}

fn resolve_session(parts: &Parts) -> Result<SessionUser> {
    let config = parts
        .extensions
        .get::<Arc<DotEnvyConfig>>()
        .ok_or_else(|| anyhow!("session config is not installed"))?;

    let jar = CookieJar::from_headers(&parts.headers);
    let token = jar
        .get(SESSION_COOKIE)
        .map(|cookie| cookie.value().to_string())
        .ok_or_else(|| anyhow!("missing session cookie"))?;

    let claims = validate_session_token(&token, &config.auth.session_secret)?;

    Ok(SessionUser {
        user_identifier: claims.sub,
        display_name: claims.name,
        email: claims.email,
        avatar_url: claims.avatar_url,
    })
}

#[async_trait]
impl<S> FromRequestParts<S> for SessionUser
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        resolve_session(parts).map_err(AuthError)
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for OptionalSessionUser
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(OptionalSessionUser(resolve_session(parts).ok()))
    }
}

#[cfg(test)]
mod tests;
