use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State},
    response::{IntoResponse, Redirect, Response},
    routing::get,
};

use crate::{
    application::usecases::{
        catalog::CatalogUseCase,
        content_access::{AccessDecision, ContentAccessUseCase},
    },
    auth::OptionalSessionUser,
    config::config_model::DotEnvyConfig,
    domain::{
        repositories::{content::ContentProvider, purchases::PurchaseRepository},
        value_objects::checkout::ContentType,
    },
    infrastructure::{
        axum_http::error_responses::AppError,
        content::github::GithubContentProvider,
        postgres::{postgres_connection::PgPoolSquad, repositories::purchases::PurchasePostgres},
    },
};

pub struct CatalogRouterState<C, T>
where
    C: ContentProvider + Send + Sync + 'static,
    T: PurchaseRepository + Send + Sync + 'static,
{
    catalog_usecase: Arc<CatalogUseCase<C>>,
    access_usecase: Arc<ContentAccessUseCase<T>>,
}

impl<C, T> Clone for CatalogRouterState<C, T>
where
    C: ContentProvider + Send + Sync + 'static,
    T: PurchaseRepository + Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        Self {
            catalog_usecase: Arc::clone(&self.catalog_usecase),
            access_usecase: Arc::clone(&self.access_usecase),
        }
    }
}

pub fn routes(config: Arc<DotEnvyConfig>, db_pool: Arc<PgPoolSquad>) -> Router {
    let content_provider = GithubContentProvider::new(&config.content_repo);
    let purchases_repository = PurchasePostgres::new(Arc::clone(&db_pool));

    let state = CatalogRouterState {
        catalog_usecase: Arc::new(CatalogUseCase::new(Arc::new(content_provider))),
        access_usecase: Arc::new(ContentAccessUseCase::new(
            Arc::new(purchases_repository),
            config.base_url.clone(),
        )),
    };

    Router::new()
        .route("/articles", get(list_articles))
        .route("/articles/:article_id", get(get_article))
        .route("/books", get(list_books))
        .route("/books/:book_id", get(get_book))
        .route("/books/:book_id/chapters/:chapter", get(get_chapter))
        .with_state(state)
}

pub async fn list_articles<C, T>(
    State(state): State<CatalogRouterState<C, T>>,
) -> Result<impl IntoResponse, AppError>
where
    C: ContentProvider + Send + Sync + 'static,
    T: PurchaseRepository + Send + Sync + 'static,
{
    let articles = state.catalog_usecase.list_articles().await?;
    Ok(Json(articles))
}

pub async fn get_article<C, T>(
    State(state): State<CatalogRouterState<C, T>>,
    OptionalSessionUser(session_user): OptionalSessionUser,
    Path(article_id): Path<String>,
) -> Result<Response, AppError>
where
    C: ContentProvider + Send + Sync + 'static,
    T: PurchaseRepository + Send + Sync + 'static,
{
    let article = state
        .catalog_usecase
        .get_article(&article_id)
        .await?
        .ok_or_else(|| AppError::NotFound("article not found".to_string()))?;

    if article.is_paid {
        let user_identifier = session_user
            .as_ref()
            .map(|user| user.user_identifier.as_str());
        match state
            .access_usecase
            .check_access(user_identifier, &article_id, ContentType::Article)
            .await?
        {
            AccessDecision::Allow => {}
            AccessDecision::Redirect(url) => {
                return Ok(Redirect::temporary(&url).into_response());
            }
        }
    }

    Ok(Json(article).into_response())
}

pub async fn list_books<C, T>(
    State(state): State<CatalogRouterState<C, T>>,
) -> Result<impl IntoResponse, AppError>
where
    C: ContentProvider + Send + Sync + 'static,
    T: PurchaseRepository + Send + Sync + 'static,
{
    let books = state.catalog_usecase.list_books().await?;
    Ok(Json(books))
}

pub async fn get_book<C, T>(
    State(state): State<CatalogRouterState<C, T>>,
    Path(book_id): Path<String>,
) -> Result<impl IntoResponse, AppError>
where
    C: ContentProvider + Send + Sync + 'static,
    T: PurchaseRepository + Send + Sync + 'static,
{
    let book = state
        .catalog_usecase
        .get_book(&book_id)
        .await?
        .ok_or_else(|| AppError::NotFound("book not found".to_string()))?;

    Ok(Json(book))
}

pub async fn get_chapter<C, T>(
    State(state): State<CatalogRouterState<C, T>>,
    OptionalSessionUser(session_user): OptionalSessionUser,
    Path((book_id, chapter)): Path<(String, String)>,
) -> Result<Response, AppError>
where
    C: ContentProvider + Send + Sync + 'static,
    T: PurchaseRepository + Send + Sync + 'static,
{
    let book = state
        .catalog_usecase
        .get_book(&book_id)
        .await?
        .ok_or_else(|| AppError::NotFound("book not found".to_string()))?;

    if book.is_paid {
        let user_identifier = session_user
            .as_ref()
            .map(|user| user.user_identifier.as_str());
        match state
            .access_usecase
            .check_access(user_identifier, &book_id, ContentType::Book)
            .await?
        {
            AccessDecision::Allow => {}
            AccessDecision::Redirect(url) => {
                return Ok(Redirect::temporary(&url).into_response());
            }
        }
    }

    let markdown = state
        .catalog_usecase
        .get_chapter(&book_id, &chapter)
        .await?
        .ok_or_else(|| AppError::NotFound("chapter not found".to_string()))?;

    Ok(markdown.into_response())
}
