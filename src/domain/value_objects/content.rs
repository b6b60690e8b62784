use serde::{Deserialize, Serialize};

/// One entry of a remote directory listing.
#[derive(Debug, Clone, Deserialize)]
pub struct RemoteItemModel {
    pub name: String,
    #[serde(rename = "type")]
    pub item_type: String,
}

impl RemoteItemModel {
    pub fn is_file(&self) -> bool {
        self.item_type == "file"
    }

    pub fn is_dir(&self) -> bool {
        self.item_type == "dir"
    }
}

/// YAML front matter of an article markdown file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ArticleFrontMatter {
    pub title: Option<String>,
    #[serde(default)]
    pub topics: Vec<String>,
    pub price: Option<i64>,
    pub emoji: Option<String>,
    pub published_at: Option<String>,
    pub updated_at: Option<String>,
}

/// `config.yaml` at the root of a book directory.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BookConfig {
    pub title: Option<String>,
    pub summary: Option<String>,
    #[serde(default)]
    pub topics: Vec<String>,
    pub price: Option<i64>,
    pub published_at: Option<String>,
    pub updated_at: Option<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ArticleModel {
    pub id: String,
    pub title: String,
    pub tags: Vec<String>,
    pub price: i64,
    pub is_paid: bool,
    pub emoji: String,
    pub created_at: String,
    pub updated_at: String,
    /// Raw markdown body. Stripped from listings so paid content is only
    /// served through the gated detail endpoint.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BookModel {
    pub id: String,
    pub title: String,
    pub description: String,
    pub tags: Vec<String>,
    pub price: i64,
    pub is_paid: bool,
    pub cover_image: String,
    pub chapter_count: usize,
    pub created_at: String,
    pub updated_at: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub chapters: Vec<String>,
}
