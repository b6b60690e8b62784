use anyhow::Result;
use axum::async_trait;
use mockall::automock;

use crate::domain::value_objects::content::RemoteItemModel;

/// Remote content repository port (directory listings and raw file bodies).
/// `None` means the path does not exist; transport failures are errors.
#[automock]
#[async_trait]
pub trait ContentProvider {
    async fn fetch_directory(&self, path: &str) -> Result<Option<Vec<RemoteItemModel>>>;
    async fn fetch_file(&self, path: &str) -> Result<Option<String>>;
    /// Public URL for a raw asset such as a book cover image.
    fn raw_url(&self, path: &str) -> String;
}
