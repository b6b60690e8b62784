use std::sync::Arc;

use anyhow::Result;
use chrono::Utc;
use tracing::warn;

use crate::domain::repositories::content::ContentProvider;
use crate::domain::value_objects::content::{
    ArticleFrontMatter, ArticleModel, BookConfig, BookModel, RemoteItemModel,
};

const ARTICLES_DIR: &str = "articles";
const BOOKS_DIR: &str = "books";

/// Catalog over the remote content repository: articles are markdown files
/// with YAML front matter, books are directories with a `config.yaml` and
/// numerically ordered chapter files.
pub struct CatalogUseCase<C>
where
    C: ContentProvider + Send + Sync + 'static,
{
    content_provider: Arc<C>,
}

impl<C> CatalogUseCase<C>
where
    C: ContentProvider + Send + Sync + 'static,
{
    pub fn new(content_provider: Arc<C>) -> Self {
        Self { content_provider }
    }

    /// Lists article metadata. Bodies are stripped so paid content is only
    /// reachable through the gated detail endpoint.
    pub async fn list_articles(&self) -> Result<Vec<ArticleModel>> {
        let items = self
            .content_provider
            .fetch_directory(ARTICLES_DIR)
            .await?
            .unwrap_or_default();

        let mut articles = Vec::new();
        for item in items.iter().filter(|item| is_markdown_file(item)) {
            let path = format!("{}/{}", ARTICLES_DIR, item.name);
            let Some(markdown) = self.content_provider.fetch_file(&path).await? else {
                warn!(path = %path, "catalog: listed article vanished before fetch");
                continue;
            };
            let id = item.name.trim_end_matches(".md").to_string();
            let mut article = article_from_markdown(id, &markdown);
            article.content = None;
            articles.push(article);
        }
        Ok(articles)
    }

    pub async fn get_article(&self, article_id: &str) -> Result<Option<ArticleModel>> {
        if !is_safe_id(article_id) {
            return Ok(None);
        }
        let path = format!("{}/{}.md", ARTICLES_DIR, article_id);
        let Some(markdown) = self.content_provider.fetch_file(&path).await? else {
            return Ok(None);
        };
        Ok(Some(article_from_markdown(
            article_id.to_string(),
            &markdown,
        )))
    }

    pub async fn list_books(&self) -> Result<Vec<BookModel>> {
        let items = self
            .content_provider
            .fetch_directory(BOOKS_DIR)
            .await?
            .unwrap_or_default();

        let mut books = Vec::new();
        for item in items.iter().filter(|item| item.is_dir()) {
            match self.load_book(&item.name).await? {
                Some(mut book) => {
                    book.chapters.clear();
                    books.push(book);
                }
                None => warn!(book_dir = %item.name, "catalog: book directory has no config.yaml"),
            }
        }
        Ok(books)
    }

    pub async fn get_book(&self, book_id: &str) -> Result<Option<BookModel>> {
        if !is_safe_id(book_id) {
            return Ok(None);
        }
        self.load_book(book_id).await
    }

    /// Raw markdown for one chapter. The caller is responsible for gating
    /// paid books before invoking this.
    pub async fn get_chapter(&self, book_id: &str, chapter: &str) -> Result<Option<String>> {
        if !is_safe_id(book_id) || !is_safe_id(chapter) {
            return Ok(None);
        }
        let path = format!("{}/{}/{}.md", BOOKS_DIR, book_id, chapter);
        self.content_provider.fetch_file(&path).await
    }

    async fn load_book(&self, book_dir: &str) -> Result<Option<BookModel>> {
        let config_path = format!("{}/{}/config.yaml", BOOKS_DIR, book_dir);
        let Some(config_content) = self.content_provider.fetch_file(&config_path).await? else {
            return Ok(None);
        };
        let config: BookConfig = serde_yaml::from_str(&config_content)
            .map_err(|err| anyhow::anyhow!("failed to parse {}: {}", config_path, err))?;

        let chapters = self
            .content_provider
            .fetch_directory(&format!("{}/{}", BOOKS_DIR, book_dir))
            .await?
            .unwrap_or_default();
        let chapter_names = sorted_chapter_names(&chapters);

        let now = Utc::now().to_rfc3339();
        let price = config.price.unwrap_or(0);
        let created_at = config.published_at.clone().unwrap_or_else(|| now.clone());
        let updated_at = config
            .updated_at
            .clone()
            .or_else(|| config.published_at.clone())
            .unwrap_or(now);

        Ok(Some(BookModel {
            id: book_dir.to_string(),
            title: config.title.unwrap_or_else(|| book_dir.to_string()),
            description: config.summary.unwrap_or_default(),
            tags: config.topics,
            price,
            is_paid: price > 0,
            cover_image: self
                .content_provider
                .raw_url(&format!("{}/{}/cover.png", BOOKS_DIR, book_dir)),
            chapter_count: chapter_names.len(),
            created_at,
            updated_at,
            chapters: chapter_names,
        }))
    }
}

fn is_markdown_file(item: &RemoteItemModel) -> bool {
    item.is_file() && item.name.ends_with(".md") && !item.name.starts_with('.')
}

/// Ids come straight from request paths; reject anything that could walk
/// outside the content directories.
fn is_safe_id(id: &str) -> bool {
    !id.is_empty()
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
        && !id.contains("..")
}

/// Chapter files are ordered by their numeric filename prefix
/// (`1.intro.md`, `2.setup.md`, ...). Returns the stems without `.md`.
fn sorted_chapter_names(items: &[RemoteItemModel]) -> Vec<String> {
    let mut chapters: Vec<&RemoteItemModel> = items
        .iter()
        .filter(|item| is_markdown_file(item))
        .collect();
    chapters.sort_by_key(|item| numeric_prefix(&item.name));
    chapters
        .iter()
        .map(|item| item.name.trim_end_matches(".md").to_string())
        .collect()
}

fn numeric_prefix(name: &str) -> i64 {
    name.split('.')
        .next()
        .and_then(|prefix| prefix.parse().ok())
        .unwrap_or(0)
}

fn article_from_markdown(id: String, markdown: &str) -> ArticleModel {
    let (front_matter, body) = parse_front_matter(markdown);
    let now = Utc::now().to_rfc3339();
    let price = front_matter.price.unwrap_or(0);
    let created_at = front_matter
        .published_at
        .clone()
        .unwrap_or_else(|| now.clone());
    let updated_at = front_matter
        .updated_at
        .clone()
        .or_else(|| front_matter.published_at.clone())
        .unwrap_or(now);

    ArticleModel {
        id,
        title: front_matter
            .title
            .unwrap_or_else(|| "Untitled".to_string()),
        tags: front_matter.topics,
        price,
        is_paid: price > 0,
        emoji: front_matter.emoji.unwrap_or_else(|| "📝".to_string()),
        created_at,
        updated_at,
        content: Some(body.to_string()),
    }
}

/// Splits a `---` delimited YAML front matter block off the markdown body.
/// Documents without front matter yield defaults and the full body.
fn parse_front_matter(markdown: &str) -> (ArticleFrontMatter, &str) {
    let Some((yaml, body)) = split_front_matter(markdown) else {
        return (ArticleFrontMatter::default(), markdown);
    };
    match serde_yaml::from_str(yaml) {
        Ok(front_matter) => (front_matter, body),
        Err(err) => {
            warn!(error = %err, "catalog: unparseable front matter, treating as plain markdown");
            (ArticleFrontMatter::default(), markdown)
        }
    }
}

fn split_front_matter(markdown: &str) -> Option<(&str, &str)> {
    let rest = markdown.strip_prefix("---")?;
    let rest = rest.strip_prefix('\n')?;
    if let Some(end) = rest.find("\n---\n") {
        return Some((&rest[..end], &rest[end + 5..]));
    }
    if let Some(yaml) = rest.strip_suffix("\n---") {
        return Some((yaml, ""));
    }
    None
}
