use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Metadata keys attached to every checkout session and read back verbatim
/// from the webhook event. This is the only channel carrying purchase intent
/// across the asynchronous boundary.
pub mod metadata_keys {
    pub const USER_IDENTIFIER: &str = "user-identifier";
    pub const CONTENT_ID: &str = "content-id";
    pub const PRICE: &str = "price";
    pub const VERSION: &str = "version";
}

/// Schema version written into checkout metadata at session-creation time.
pub const METADATA_VERSION: &str = "v1";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    Book,
    Article,
}

impl ContentType {
    /// Detail page for the content, used both as the dedupe short-circuit
    /// response and as the base of the checkout success URL.
    pub fn detail_url(&self, base_url: &str, content_id: &str) -> String {
        match self {
            ContentType::Book => format!("{}/books/{}", base_url, content_id),
            ContentType::Article => format!("{}/posts/{}", base_url, content_id),
        }
    }

    pub fn checkout_success_url(&self, base_url: &str, content_id: &str) -> String {
        format!("{}?success=true", self.detail_url(base_url, content_id))
    }

    /// Where the access gate sends an authenticated user who has not
    /// purchased: books go to their detail page, articles to the index
    /// anchor.
    pub fn purchase_redirect_url(&self, base_url: &str, content_id: &str) -> String {
        match self {
            ContentType::Book => format!("{}/books/{}", base_url, content_id),
            ContentType::Article => format!("{}/#articles", base_url),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequestModel {
    pub content_id: String,
    /// Unit amount in the smallest currency unit. Same width as the ledger's
    /// amount column so the metadata echo always parses back.
    pub price: i32,
    pub title: String,
    pub content_type: ContentType,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutResponseModel {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    pub url: String,
}

/// Provider-agnostic checkout session request built by the checkout usecase.
#[derive(Debug, Clone, PartialEq)]
pub struct CreateCheckoutSessionModel {
    pub title: String,
    pub description: String,
    pub unit_amount: i64,
    pub success_url: String,
    pub cancel_url: String,
    pub metadata: HashMap<String, String>,
}

#[derive(Debug, Clone)]
pub struct CheckoutSessionHandle {
    pub id: String,
    pub url: String,
}
