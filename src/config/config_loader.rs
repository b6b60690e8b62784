use anyhow::{Result, anyhow};

use super::config_model::{Auth, ContentRepo, Database, DotEnvyConfig, Server, Stripe};

const REQUIRED_VARS: &[&str] = &[
    "SERVER_PORT",
    "SERVER_BODY_LIMIT",
    "SERVER_TIMEOUT",
    "DATABASE_URL",
    "BASE_URL",
    "AUTH_SECRET",
    "GITHUB_ID",
    "GITHUB_SECRET",
    "STRIPE_SECRET_KEY",
    "STRIPE_WEBHOOK_SECRET",
    "CONTENT_REPO_OWNER",
    "CONTENT_REPO_NAME",
];

pub fn load() -> Result<DotEnvyConfig> {
    dotenvy::dotenv().ok();

    // Report every missing variable at once instead of failing one at a time.
    let missing: Vec<&str> = REQUIRED_VARS
        .iter()
        .filter(|name| std::env::var(name).map_or(true, |value| value.is_empty()))
        .copied()
        .collect();
    if !missing.is_empty() {
        return Err(anyhow!(
            "missing required environment variables: {}",
            missing.join(", ")
        ));
    }

    let server = Server {
        port: required("SERVER_PORT")?.parse()?,
        body_limit: required("SERVER_BODY_LIMIT")?.parse()?,
        timeout: required("SERVER_TIMEOUT")?.parse()?,
    };

    let database = Database {
        url: required("DATABASE_URL")?,
    };

    let auth = Auth {
        session_secret: required("AUTH_SECRET")?,
        github_client_id: required("GITHUB_ID")?,
        github_client_secret: required("GITHUB_SECRET")?,
    };

    let stripe = Stripe {
        secret_key: required("STRIPE_SECRET_KEY")?,
        webhook_secret: required("STRIPE_WEBHOOK_SECRET")?,
        currency: std::env::var("CHECKOUT_CURRENCY").unwrap_or_else(|_| "jpy".to_string()),
    };

    let content_repo = ContentRepo {
        owner: required("CONTENT_REPO_OWNER")?,
        name: required("CONTENT_REPO_NAME")?,
        branch: std::env::var("CONTENT_REPO_BRANCH").unwrap_or_else(|_| "main".to_string()),
    };

    let base_url = required("BASE_URL")?.trim_end_matches('/').to_string();

    Ok(DotEnvyConfig {
        server,
        database,
        auth,
        stripe,
        content_repo,
        base_url,
    })
}

fn required(name: &str) -> Result<String> {
    std::env::var(name).map_err(|_| anyhow!("{} is invalid", name))
}
