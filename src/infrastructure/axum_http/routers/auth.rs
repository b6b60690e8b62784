use std::sync::Arc;

use anyhow::{Result, anyhow};
use axum::{
    Router,
    extract::{Query, State},
    response::{IntoResponse, Redirect},
    routing::get,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use reqwest::header::{ACCEPT, AUTHORIZATION, USER_AGENT};
use serde::Deserialize;
use tracing::info;

use crate::{
    auth::{SESSION_COOKIE, SessionUser, issue_session_token},
    config::config_model::DotEnvyConfig,
    infrastructure::axum_http::error_responses::AppError,
};

const OAUTH_STATE_COOKIE: &str = "oauth_state";
const GITHUB_AUTHORIZE_URL: &str = "https://github.com/login/oauth/authorize";
const GITHUB_TOKEN_URL: &str = "https://github.com/login/oauth/access_token";
const GITHUB_USER_URL: &str = "https://api.github.com/user";

#[derive(Clone)]
pub struct AuthRouterState {
    config: Arc<DotEnvyConfig>,
    http: reqwest::Client,
}

pub fn routes(config: Arc<DotEnvyConfig>) -> Router {
    Router::new()
        .route("/auth/sign-in", get(sign_in))
        .route("/auth/callback", get(callback))
        .with_state(AuthRouterState {
            config,
            http: reqwest::Client::new(),
        })
}

pub async fn sign_in(State(state): State<AuthRouterState>, jar: CookieJar) -> impl IntoResponse {
    let oauth_state = hex::encode(rand::random::<[u8; 16]>());

    let authorize_url = format!(
        "{}?client_id={}&redirect_uri={}/auth/callback&scope=read:user&state={}",
        GITHUB_AUTHORIZE_URL,
        state.config.auth.github_client_id,
        state.config.base_url,
        oauth_state,
    );

    let jar = jar.add(
        Cookie::build((OAUTH_STATE_COOKIE, oauth_state))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .build(),
    );

    (jar, Redirect::temporary(&authorize_url))
}

#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    pub code: String,
    pub state: String,
}

pub async fn callback(
    State(state): State<AuthRouterState>,
    jar: CookieJar,
    Query(query): Query<CallbackQuery>,
) -> Result<impl IntoResponse, AppError> {
    let expected_state = jar
        .get(OAUTH_STATE_COOKIE)
        .map(|cookie| cookie.value().to_string())
        .ok_or_else(|| AppError::BadRequest("missing oauth state cookie".to_string()))?;
    if expected_state != query.state {
        return Err(AppError::BadRequest("oauth state mismatch".to_string()));
    }

    let session_user = fetch_github_user(&state, &query.code).await?;
    info!(
        user_identifier = %session_user.user_identifier,
        "auth: github sign-in completed"
    );

    let token = issue_session_token(&session_user, &state.config.auth.session_secret)?;

    let jar = jar.remove(Cookie::from(OAUTH_STATE_COOKIE)).add(
        Cookie::build((SESSION_COOKIE, token))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .build(),
    );

    Ok((jar, Redirect::temporary(&state.config.base_url)))
}

#[derive(Debug, Deserialize)]
struct AccessTokenResponse {
    access_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GithubUser {
    id: i64,
    login: String,
    email: Option<String>,
    avatar_url: Option<String>,
}

/// Exchanges the OAuth code and resolves the GitHub user behind it. The
/// stringified numeric id becomes the stable user identifier.
async fn fetch_github_user(state: &AuthRouterState, code: &str) -> Result<SessionUser> {
    let token_response: AccessTokenResponse = state
        .http
        .post(GITHUB_TOKEN_URL)
        .header(ACCEPT, "application/json")
        .form(&[
            ("client_id", state.config.auth.github_client_id.as_str()),
            (
                "client_secret",
                state.config.auth.github_client_secret.as_str(),
            ),
            ("code", code),
        ])
        .send()
        .await?
        .json()
        .await?;

    let access_token = token_response
        .access_token
        .ok_or_else(|| anyhow!("github did not return an access token"))?;

    let github_user: GithubUser = state
        .http
        .get(GITHUB_USER_URL)
        .header(AUTHORIZATION, format!("Bearer {}", access_token))
        .header(USER_AGENT, "content-storefront")
        .header(ACCEPT, "application/vnd.github+json")
        .send()
        .await?
        .json()
        .await?;

    Ok(SessionUser {
        user_identifier: github_user.id.to_string(),
        display_name: Some(github_user.login),
        email: github_user.email,
        avatar_url: github_user.avatar_url,
    })
}
