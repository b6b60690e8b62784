use std::sync::Arc;

use anyhow::Result;
use tracing::info;

use crate::domain::repositories::purchases::PurchaseRepository;
use crate::domain::value_objects::checkout::ContentType;

pub const SIGN_IN_ROUTE: &str = "/auth/sign-in";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessDecision {
    Allow,
    Redirect(String),
}

/// Gate consulted before serving paid content bodies.
pub struct ContentAccessUseCase<T>
where
    T: PurchaseRepository + Send + Sync + 'static,
{
    purchases_repository: Arc<T>,
    base_url: String,
}

impl<T> ContentAccessUseCase<T>
where
    T: PurchaseRepository + Send + Sync + 'static,
{
    pub fn new(purchases_repository: Arc<T>, base_url: String) -> Self {
        Self {
            purchases_repository,
            base_url,
        }
    }

    /// Unauthenticated callers are sent to sign-in regardless of purchase
    /// state; authenticated callers without a purchase are sent to the
    /// content-type-specific purchase destination.
    pub async fn check_access(
        &self,
        user_identifier: Option<&str>,
        content_id: &str,
        content_type: ContentType,
    ) -> Result<AccessDecision> {
        let Some(user_identifier) = user_identifier else {
            return Ok(AccessDecision::Redirect(SIGN_IN_ROUTE.to_string()));
        };

        let has_purchased = self
            .purchases_repository
            .exists(user_identifier, content_id)
            .await?;

        if has_purchased {
            Ok(AccessDecision::Allow)
        } else {
            info!(
                user_identifier,
                content_id, "access gate: no purchase on record, redirecting"
            );
            Ok(AccessDecision::Redirect(
                content_type.purchase_redirect_url(&self.base_url, content_id),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::repositories::purchases::MockPurchaseRepository;

    fn usecase(purchases: MockPurchaseRepository) -> ContentAccessUseCase<MockPurchaseRepository> {
        ContentAccessUseCase::new(Arc::new(purchases), "https://store.example".to_string())
    }

    #[tokio::test]
    async fn purchased_user_is_allowed() {
        let mut purchases = MockPurchaseRepository::new();
        purchases
            .expect_exists()
            .withf(|user, content| user == "42" && content == "intro-book")
            .returning(|_, _| Ok(true));

        let decision = usecase(purchases)
            .check_access(Some("42"), "intro-book", ContentType::Book)
            .await
            .unwrap();
        assert_eq!(decision, AccessDecision::Allow);
    }

    #[tokio::test]
    async fn unpurchased_book_redirects_to_detail_page() {
        let mut purchases = MockPurchaseRepository::new();
        purchases.expect_exists().returning(|_, _| Ok(false));

        let decision = usecase(purchases)
            .check_access(Some("42"), "intro-book", ContentType::Book)
            .await
            .unwrap();
        assert_eq!(
            decision,
            AccessDecision::Redirect("https://store.example/books/intro-book".to_string())
        );
    }

    #[tokio::test]
    async fn unpurchased_article_redirects_to_article_index() {
        let mut purchases = MockPurchaseRepository::new();
        purchases.expect_exists().returning(|_, _| Ok(false));

        let decision = usecase(purchases)
            .check_access(Some("42"), "rust-tips", ContentType::Article)
            .await
            .unwrap();
        assert_eq!(
            decision,
            AccessDecision::Redirect("https://store.example/#articles".to_string())
        );
    }

    #[tokio::test]
    async fn unauthenticated_user_is_sent_to_sign_in() {
        let mut purchases = MockPurchaseRepository::new();
        purchases.expect_exists().times(0);

        let decision = usecase(purchases)
            .check_access(None, "intro-book", ContentType::Book)
            .await
            .unwrap();
        assert_eq!(
            decision,
            AccessDecision::Redirect(SIGN_IN_ROUTE.to_string())
        );
    }
}
