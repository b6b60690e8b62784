use anyhow::Result;
use axum::async_trait;
use reqwest::StatusCode;
use reqwest::header::{ACCEPT, USER_AGENT};

use crate::config::config_model::ContentRepo;
use crate::domain::repositories::content::ContentProvider;
use crate::domain::value_objects::content::RemoteItemModel;

const USER_AGENT_VALUE: &str = "content-storefront";

/// Content provider backed by a public GitHub repository: the contents API
/// for directory listings, the raw host for file bodies.
pub struct GithubContentProvider {
    http: reqwest::Client,
    api_base: String,
    raw_base: String,
}

impl GithubContentProvider {
    pub fn new(content_repo: &ContentRepo) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_base: format!(
                "https://api.github.com/repos/{}/{}/contents",
                content_repo.owner, content_repo.name
            ),
            raw_base: format!(
                "https://raw.githubusercontent.com/{}/{}/{}",
                content_repo.owner, content_repo.name, content_repo.branch
            ),
        }
    }
}

#[async_trait]
impl ContentProvider for GithubContentProvider {
    async fn fetch_directory(&self, path: &str) -> Result<Option<Vec<RemoteItemModel>>> {
        let resp = self
            .http
            .get(format!("{}/{}", self.api_base, path))
            .header(USER_AGENT, USER_AGENT_VALUE)
            .header(ACCEPT, "application/vnd.github+json")
            .send()
            .await?;

        if resp.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !resp.status().is_success() {
            anyhow::bail!("GitHub API error: {} for {}", resp.status(), path);
        }

        let items: Vec<RemoteItemModel> = resp.json().await?;
        Ok(Some(items))
    }

    async fn fetch_file(&self, path: &str) -> Result<Option<String>> {
        let resp = self
            .http
            .get(format!("{}/{}", self.raw_base, path))
            .header(USER_AGENT, USER_AGENT_VALUE)
            .send()
            .await?;

        if resp.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !resp.status().is_success() {
            anyhow::bail!("failed to fetch file: {} for {}", resp.status(), path);
        }

        Ok(Some(resp.text().await?))
    }

    fn raw_url(&self, path: &str) -> String {
        format!("{}/{}", self.raw_base, path)
    }
}
