use std::sync::Arc;

use thiserror::Error;
use tracing::{error, info, warn};

use crate::domain::entities::purchases::InsertPurchaseEntity;
use crate::domain::repositories::payments::PaymentProvider;
use crate::domain::repositories::purchases::PurchaseRepository;
use crate::domain::value_objects::checkout::metadata_keys;
use crate::domain::value_objects::payment_events::{
    CheckoutSessionObjectModel, EVENT_CHECKOUT_COMPLETED, PAYMENT_STATUS_PAID,
};

#[derive(Debug, Error)]
pub enum WebhookError {
    #[error("webhook signature verification failed: {0}")]
    SignatureInvalid(String),
    /// Intrinsically broken event payload. Answered with 400 so the
    /// provider does not retry it forever.
    #[error("malformed webhook event: {0}")]
    MalformedEvent(String),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl WebhookError {
    pub fn status_code(&self) -> axum::http::StatusCode {
        use axum::http::StatusCode;
        match self {
            WebhookError::SignatureInvalid(_) | WebhookError::MalformedEvent(_) => {
                StatusCode::BAD_REQUEST
            }
            WebhookError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

pub struct PaymentWebhookUseCase<T, P>
where
    T: PurchaseRepository + Send + Sync + 'static,
    P: PaymentProvider + Send + Sync + 'static,
{
    purchases_repository: Arc<T>,
    payment_provider: Arc<P>,
}

impl<T, P> PaymentWebhookUseCase<T, P>
where
    T: PurchaseRepository + Send + Sync + 'static,
    P: PaymentProvider + Send + Sync + 'static,
{
    pub fn new(purchases_repository: Arc<T>, payment_provider: Arc<P>) -> Self {
        Self {
            purchases_repository,
            payment_provider,
        }
    }

    /// Verifies and dispatches one webhook delivery. Unknown event types are
    /// acknowledged without action so new provider events never fail the
    /// endpoint. An `Internal` error signals the provider to redeliver.
    pub async fn handle_event(
        &self,
        payload: &[u8],
        signature_header: &str,
    ) -> Result<(), WebhookError> {
        let event = self
            .payment_provider
            .verify_event(payload, signature_header)
            .map_err(|err| {
                warn!(error = %err, "payment webhook: signature verification failed");
                WebhookError::SignatureInvalid(err.to_string())
            })?;

        info!(
            event_id = ?event.id,
            event_type = %event.event_type,
            "payment webhook: event verified"
        );

        match event.event_type.as_str() {
            EVENT_CHECKOUT_COMPLETED => {
                let session: CheckoutSessionObjectModel =
                    serde_json::from_value(event.data.object).map_err(|err| {
                        warn!(error = %err, "payment webhook: checkout session object does not deserialize");
                        WebhookError::MalformedEvent(format!("checkout session object: {err}"))
                    })?;
                self.record_completed_purchase(session).await?;
            }
            other => {
                info!(event_type = %other, "payment webhook: ignoring unhandled event type");
            }
        }

        Ok(())
    }

    /// Records the purchase carried by a completed checkout session.
    /// Returns false when payment has not settled yet. Safe under
    /// redelivery: the existence check short-circuits, and the unique
    /// index turns a racing insert into a no-op.
    pub async fn record_completed_purchase(
        &self,
        session: CheckoutSessionObjectModel,
    ) -> Result<bool, WebhookError> {
        let user_identifier = session
            .metadata
            .get(metadata_keys::USER_IDENTIFIER)
            .filter(|value| !value.is_empty())
            .ok_or_else(|| {
                WebhookError::MalformedEvent("missing user identifier metadata".to_string())
            })?;
        let content_id = session
            .metadata
            .get(metadata_keys::CONTENT_ID)
            .filter(|value| !value.is_empty())
            .ok_or_else(|| {
                WebhookError::MalformedEvent("missing content id metadata".to_string())
            })?;
        let amount: i32 = session
            .metadata
            .get(metadata_keys::PRICE)
            .map(String::as_str)
            .unwrap_or("0")
            .parse()
            .map_err(|_| WebhookError::MalformedEvent("price metadata is not an integer".to_string()))?;

        if session.payment_status.as_deref() != Some(PAYMENT_STATUS_PAID) {
            info!(
                session_id = ?session.id,
                payment_status = ?session.payment_status,
                "payment webhook: payment not settled yet, skipping"
            );
            return Ok(false);
        }

        let payment_reference = session
            .payment_intent
            .as_ref()
            .and_then(|reference| reference.reference_id())
            .unwrap_or("")
            .to_string();

        let already_recorded = self
            .purchases_repository
            .exists(user_identifier, content_id)
            .await
            .map_err(|err| {
                error!(
                    user_identifier = %user_identifier,
                    content_id = %content_id,
                    db_error = ?err,
                    "payment webhook: purchase lookup failed"
                );
                WebhookError::Internal(err)
            })?;
        if already_recorded {
            info!(
                user_identifier = %user_identifier,
                content_id = %content_id,
                "payment webhook: purchase already recorded, acknowledging redelivery"
            );
            return Ok(true);
        }

        let inserted = self
            .purchases_repository
            .create(InsertPurchaseEntity {
                user_identifier: user_identifier.clone(),
                content_id: content_id.clone(),
                stripe_payment_intent_id: payment_reference,
                amount,
            })
            .await
            .map_err(|err| {
                error!(
                    user_identifier = %user_identifier,
                    content_id = %content_id,
                    db_error = ?err,
                    "payment webhook: purchase insert failed"
                );
                WebhookError::Internal(err)
            })?;

        if inserted {
            info!(
                user_identifier = %user_identifier,
                content_id = %content_id,
                amount,
                "payment webhook: purchase recorded"
            );
        } else {
            info!(
                user_identifier = %user_identifier,
                content_id = %content_id,
                "payment webhook: concurrent delivery already recorded the purchase"
            );
        }

        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use serde_json::json;

    use crate::domain::repositories::payments::MockPaymentProvider;
    use crate::domain::repositories::purchases::MockPurchaseRepository;
    use crate::domain::value_objects::payment_events::{PaymentEventData, PaymentEventModel};

    fn completed_event(object: serde_json::Value) -> PaymentEventModel {
        PaymentEventModel {
            id: Some("evt_1".to_string()),
            event_type: EVENT_CHECKOUT_COMPLETED.to_string(),
            data: PaymentEventData { object },
        }
    }

    fn paid_session() -> serde_json::Value {
        json!({
            "id": "cs_test_123",
            "payment_status": "paid",
            "payment_intent": "pi_test_123",
            "metadata": {
                "user-identifier": "42",
                "content-id": "intro-book",
                "price": "1500",
                "version": "v1",
            },
        })
    }

    fn usecase_with(
        purchases: MockPurchaseRepository,
        provider: MockPaymentProvider,
    ) -> PaymentWebhookUseCase<MockPurchaseRepository, MockPaymentProvider> {
        PaymentWebhookUseCase::new(Arc::new(purchases), Arc::new(provider))
    }

    #[tokio::test]
    async fn completed_paid_event_inserts_one_purchase() {
        let mut purchases = MockPurchaseRepository::new();
        purchases
            .expect_exists()
            .withf(|user, content| user == "42" && content == "intro-book")
            .returning(|_, _| Ok(false));
        purchases
            .expect_create()
            .withf(|entity| {
                entity.user_identifier == "42"
                    && entity.content_id == "intro-book"
                    && entity.stripe_payment_intent_id == "pi_test_123"
                    && entity.amount == 1500
            })
            .times(1)
            .returning(|_| Ok(true));

        let mut provider = MockPaymentProvider::new();
        provider
            .expect_verify_event()
            .returning(|_, _| Ok(completed_event(paid_session())));

        let usecase = usecase_with(purchases, provider);
        usecase.handle_event(b"{}", "sig").await.unwrap();
    }

    #[tokio::test]
    async fn redelivery_is_acknowledged_without_insert() {
        let mut purchases = MockPurchaseRepository::new();
        purchases.expect_exists().returning(|_, _| Ok(true));
        purchases.expect_create().times(0);

        let mut provider = MockPaymentProvider::new();
        provider
            .expect_verify_event()
            .returning(|_, _| Ok(completed_event(paid_session())));

        let usecase = usecase_with(purchases, provider);
        usecase.handle_event(b"{}", "sig").await.unwrap();
    }

    #[tokio::test]
    async fn unsettled_payment_is_a_no_op() {
        let mut purchases = MockPurchaseRepository::new();
        purchases.expect_exists().times(0);
        purchases.expect_create().times(0);

        let mut provider = MockPaymentProvider::new();
        provider.expect_verify_event().returning(|_, _| {
            Ok(completed_event(json!({
                "id": "cs_test_123",
                "payment_status": "unpaid",
                "metadata": {
                    "user-identifier": "42",
                    "content-id": "intro-book",
                    "price": "1500",
                },
            })))
        });

        let usecase = usecase_with(purchases, provider);
        usecase.handle_event(b"{}", "sig").await.unwrap();
    }

    #[tokio::test]
    async fn missing_metadata_is_a_non_retryable_error() {
        let mut purchases = MockPurchaseRepository::new();
        purchases.expect_create().times(0);

        let mut provider = MockPaymentProvider::new();
        provider.expect_verify_event().returning(|_, _| {
            Ok(completed_event(json!({
                "id": "cs_test_123",
                "payment_status": "paid",
                "metadata": { "price": "1500" },
            })))
        });

        let usecase = usecase_with(purchases, provider);
        let err = usecase.handle_event(b"{}", "sig").await.unwrap_err();
        assert!(matches!(err, WebhookError::MalformedEvent(_)));
        assert_eq!(err.status_code(), axum::http::StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn unparseable_price_is_a_non_retryable_error() {
        let purchases = MockPurchaseRepository::new();
        let mut provider = MockPaymentProvider::new();
        provider.expect_verify_event().returning(|_, _| {
            Ok(completed_event(json!({
                "id": "cs_test_123",
                "payment_status": "paid",
                "metadata": {
                    "user-identifier": "42",
                    "content-id": "intro-book",
                    "price": "not-a-number",
                },
            })))
        });

        let usecase = usecase_with(purchases, provider);
        let err = usecase.handle_event(b"{}", "sig").await.unwrap_err();
        assert!(matches!(err, WebhookError::MalformedEvent(_)));
    }

    #[tokio::test]
    async fn invalid_signature_rejects_before_touching_the_ledger() {
        let mut purchases = MockPurchaseRepository::new();
        purchases.expect_exists().times(0);
        purchases.expect_create().times(0);

        let mut provider = MockPaymentProvider::new();
        provider
            .expect_verify_event()
            .returning(|_, _| Err(anyhow!("invalid webhook signature")));

        let usecase = usecase_with(purchases, provider);
        let err = usecase.handle_event(b"{}", "bad-sig").await.unwrap_err();
        assert!(matches!(err, WebhookError::SignatureInvalid(_)));
    }

    #[tokio::test]
    async fn unknown_event_types_are_acknowledged() {
        let mut purchases = MockPurchaseRepository::new();
        purchases.expect_exists().times(0);
        purchases.expect_create().times(0);

        let mut provider = MockPaymentProvider::new();
        provider.expect_verify_event().returning(|_, _| {
            Ok(PaymentEventModel {
                id: Some("evt_2".to_string()),
                event_type: "invoice.payment_succeeded".to_string(),
                data: PaymentEventData {
                    object: json!({}),
                },
            })
        });

        let usecase = usecase_with(purchases, provider);
        usecase.handle_event(b"{}", "sig").await.unwrap();
    }

    #[tokio::test]
    async fn price_metadata_at_the_column_maximum_is_recorded_exactly() {
        let mut purchases = MockPurchaseRepository::new();
        purchases.expect_exists().returning(|_, _| Ok(false));
        purchases
            .expect_create()
            .withf(|entity| entity.amount == i32::MAX)
            .times(1)
            .returning(|_| Ok(true));

        let mut provider = MockPaymentProvider::new();
        provider.expect_verify_event().returning(|_, _| {
            Ok(completed_event(json!({
                "id": "cs_test_123",
                "payment_status": "paid",
                "payment_intent": "pi_test_123",
                "metadata": {
                    "user-identifier": "42",
                    "content-id": "intro-book",
                    "price": "2147483647",
                },
            })))
        });

        let usecase = usecase_with(purchases, provider);
        usecase.handle_event(b"{}", "sig").await.unwrap();
    }

    #[tokio::test]
    async fn missing_payment_reference_is_stored_as_empty_string() {
        let mut purchases = MockPurchaseRepository::new();
        purchases.expect_exists().returning(|_, _| Ok(false));
        purchases
            .expect_create()
            .withf(|entity| entity.stripe_payment_intent_id.is_empty())
            .times(1)
            .returning(|_| Ok(true));

        let mut provider = MockPaymentProvider::new();
        provider.expect_verify_event().returning(|_, _| {
            Ok(completed_event(json!({
                "id": "cs_test_123",
                "payment_status": "paid",
                "metadata": {
                    "user-identifier": "42",
                    "content-id": "intro-book",
                    "price": "1500",
                },
            })))
        });

        let usecase = usecase_with(purchases, provider);
        usecase.handle_event(b"{}", "sig").await.unwrap();
    }
}
