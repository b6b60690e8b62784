use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use tracing::{error, info};

use crate::domain::repositories::payments::PaymentProvider;
use crate::domain::repositories::purchases::PurchaseRepository;
use crate::domain::value_objects::checkout::{
    CheckoutRequestModel, CheckoutResponseModel, CreateCheckoutSessionModel, METADATA_VERSION,
    metadata_keys,
};

pub struct CheckoutUseCase<T, P>
where
    T: PurchaseRepository + Send + Sync + 'static,
    P: PaymentProvider + Send + Sync + 'static,
{
    purchases_repository: Arc<T>,
    payment_provider: Arc<P>,
    base_url: String,
}

impl<T, P> CheckoutUseCase<T, P>
where
    T: PurchaseRepository + Send + Sync + 'static,
    P: PaymentProvider + Send + Sync + 'static,
{
    pub fn new(purchases_repository: Arc<T>, payment_provider: Arc<P>, base_url: String) -> Self {
        Self {
            purchases_repository,
            payment_provider,
            base_url,
        }
    }

    /// Creates a checkout session for the given user, short-circuiting to
    /// the content detail page when the purchase already exists. The
    /// existing-purchase path never touches the payment provider, which
    /// makes the endpoint idempotent for already-purchased content.
    pub async fn create_checkout_session(
        &self,
        user_identifier: &str,
        model: CheckoutRequestModel,
    ) -> Result<CheckoutResponseModel> {
        let already_purchased = self
            .purchases_repository
            .exists(user_identifier, &model.content_id)
            .await
            .map_err(|err| {
                error!(
                    user_identifier,
                    content_id = %model.content_id,
                    db_error = ?err,
                    "checkout: purchase lookup failed"
                );
                err
            })?;

        if already_purchased {
            info!(
                user_identifier,
                content_id = %model.content_id,
                "checkout: already purchased, returning detail page"
            );
            return Ok(CheckoutResponseModel {
                session_id: None,
                url: model.content_type.detail_url(&self.base_url, &model.content_id),
            });
        }

        let mut metadata = HashMap::new();
        metadata.insert(
            metadata_keys::USER_IDENTIFIER.to_string(),
            user_identifier.to_string(),
        );
        metadata.insert(
            metadata_keys::CONTENT_ID.to_string(),
            model.content_id.clone(),
        );
        metadata.insert(metadata_keys::PRICE.to_string(), model.price.to_string());
        metadata.insert(
            metadata_keys::VERSION.to_string(),
            METADATA_VERSION.to_string(),
        );

        let params = CreateCheckoutSessionModel {
            title: model.title.clone(),
            description: format!("Content ID: {}", model.content_id),
            unit_amount: i64::from(model.price),
            success_url: model
                .content_type
                .checkout_success_url(&self.base_url, &model.content_id),
            cancel_url: self.base_url.clone(),
            metadata,
        };

        let handle = self
            .payment_provider
            .create_checkout_session(params)
            .await
            .map_err(|err| {
                error!(
                    user_identifier,
                    content_id = %model.content_id,
                    error = ?err,
                    "checkout: checkout session creation failed"
                );
                err
            })?;

        info!(
            user_identifier,
            content_id = %model.content_id,
            session_id = %handle.id,
            "checkout: checkout session created"
        );

        Ok(CheckoutResponseModel {
            session_id: Some(handle.id),
            url: handle.url,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::repositories::payments::MockPaymentProvider;
    use crate::domain::repositories::purchases::MockPurchaseRepository;
    use crate::domain::value_objects::checkout::{CheckoutSessionHandle, ContentType};

    fn request() -> CheckoutRequestModel {
        CheckoutRequestModel {
            content_id: "intro-book".to_string(),
            price: 1500,
            title: "Intro".to_string(),
            content_type: ContentType::Book,
        }
    }

    #[tokio::test]
    async fn creates_session_with_purchase_intent_metadata() {
        let mut purchases = MockPurchaseRepository::new();
        purchases
            .expect_exists()
            .withf(|user, content| user == "42" && content == "intro-book")
            .returning(|_, _| Ok(false));

        let mut provider = MockPaymentProvider::new();
        provider
            .expect_create_checkout_session()
            .withf(|params| {
                params.unit_amount == 1500
                    && params.title == "Intro"
                    && params.success_url == "https://store.example/books/intro-book?success=true"
                    && params.cancel_url == "https://store.example"
                    && params.metadata.get("user-identifier").map(String::as_str) == Some("42")
                    && params.metadata.get("content-id").map(String::as_str) == Some("intro-book")
                    && params.metadata.get("price").map(String::as_str) == Some("1500")
                    && params.metadata.get("version").map(String::as_str) == Some("v1")
            })
            .times(1)
            .returning(|_| {
                Ok(CheckoutSessionHandle {
                    id: "cs_test_123".to_string(),
                    url: "https://checkout.stripe.com/c/pay/cs_test_123".to_string(),
                })
            });

        let usecase = CheckoutUseCase::new(
            Arc::new(purchases),
            Arc::new(provider),
            "https://store.example".to_string(),
        );

        let response = usecase
            .create_checkout_session("42", request())
            .await
            .unwrap();
        assert_eq!(response.session_id.as_deref(), Some("cs_test_123"));
        assert!(response.url.contains("checkout.stripe.com"));
    }

    #[tokio::test]
    async fn existing_purchase_short_circuits_without_provider_call() {
        let mut purchases = MockPurchaseRepository::new();
        purchases.expect_exists().returning(|_, _| Ok(true));

        let mut provider = MockPaymentProvider::new();
        provider.expect_create_checkout_session().times(0);

        let usecase = CheckoutUseCase::new(
            Arc::new(purchases),
            Arc::new(provider),
            "https://store.example".to_string(),
        );

        let response = usecase
            .create_checkout_session("42", request())
            .await
            .unwrap();
        assert_eq!(response.session_id, None);
        assert_eq!(response.url, "https://store.example/books/intro-book");
    }

    #[tokio::test]
    async fn article_urls_point_at_posts() {
        let mut purchases = MockPurchaseRepository::new();
        purchases.expect_exists().returning(|_, _| Ok(false));

        let mut provider = MockPaymentProvider::new();
        provider
            .expect_create_checkout_session()
            .withf(|params| {
                params.success_url == "https://store.example/posts/rust-tips?success=true"
            })
            .returning(|_| {
                Ok(CheckoutSessionHandle {
                    id: "cs_test_456".to_string(),
                    url: "https://checkout.stripe.com/c/pay/cs_test_456".to_string(),
                })
            });

        let usecase = CheckoutUseCase::new(
            Arc::new(purchases),
            Arc::new(provider),
            "https://store.example".to_string(),
        );

        let model = CheckoutRequestModel {
            content_id: "rust-tips".to_string(),
            price: 500,
            title: "Rust Tips".to_string(),
            content_type: ContentType::Article,
        };
        let response = usecase.create_checkout_session("42", model).await.unwrap();
        assert_eq!(response.session_id.as_deref(), Some("cs_test_456"));
    }
}
