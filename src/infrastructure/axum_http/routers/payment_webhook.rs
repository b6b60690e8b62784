use std::sync::Arc;

use axum::{
    Router,
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
};
use tracing::{error, warn};

use crate::{
    application::usecases::payment_webhook::{PaymentWebhookUseCase, WebhookError},
    config::config_model::DotEnvyConfig,
    domain::repositories::{payments::PaymentProvider, purchases::PurchaseRepository},
    infrastructure::{
        payments::stripe_client::StripeClient,
        postgres::{postgres_connection::PgPoolSquad, repositories::purchases::PurchasePostgres},
    },
};

pub const SIGNATURE_HEADER: &str = "stripe-signature";

pub fn routes(config: Arc<DotEnvyConfig>, db_pool: Arc<PgPoolSquad>) -> Router {
    let purchases_repository = PurchasePostgres::new(Arc::clone(&db_pool));
    let payment_provider = StripeClient::new(
        config.stripe.secret_key.clone(),
        config.stripe.webhook_secret.clone(),
        config.stripe.currency.clone(),
    );
    let payment_webhook_usecase = PaymentWebhookUseCase::new(
        Arc::new(purchases_repository),
        Arc::new(payment_provider),
    );

    Router::new()
        .route("/webhooks/payment", post(handle_payment_webhook))
        .with_state(Arc::new(payment_webhook_usecase))
}

/// Raw-body webhook endpoint. 5xx answers signal the provider to redeliver;
/// signature and malformed-event failures answer 4xx so broken events are
/// not retried forever.
pub async fn handle_payment_webhook<T, P>(
    State(payment_webhook_usecase): State<Arc<PaymentWebhookUseCase<T, P>>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response
where
    T: PurchaseRepository + Send + Sync + 'static,
    P: PaymentProvider + Send + Sync + 'static,
{
    let Some(signature) = headers
        .get(SIGNATURE_HEADER)
        .and_then(|value| value.to_str().ok())
    else {
        warn!("payment webhook: missing signature header");
        return (StatusCode::UNAUTHORIZED, "missing stripe-signature header").into_response();
    };

    match payment_webhook_usecase.handle_event(&body, signature).await {
        Ok(()) => StatusCode::OK.into_response(),
        Err(err @ WebhookError::Internal(_)) => {
            error!(error = ?err, "payment webhook: internal failure, provider will retry");
            (err.status_code(), "internal error".to_string()).into_response()
        }
        Err(err) => (err.status_code(), format!("Webhook Error: {}", err)).into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    use crate::domain::repositories::payments::MockPaymentProvider;
    use crate::domain::repositories::purchases::MockPurchaseRepository;

    fn handler_state(
        purchases: MockPurchaseRepository,
        provider: MockPaymentProvider,
    ) -> Arc<PaymentWebhookUseCase<MockPurchaseRepository, MockPaymentProvider>> {
        Arc::new(PaymentWebhookUseCase::new(
            Arc::new(purchases),
            Arc::new(provider),
        ))
    }

    #[tokio::test]
    async fn missing_signature_header_is_unauthorized_without_touching_the_ledger() {
        let mut purchases = MockPurchaseRepository::new();
        purchases.expect_exists().times(0);
        purchases.expect_create().times(0);
        let mut provider = MockPaymentProvider::new();
        provider.expect_verify_event().times(0);

        let response = handle_payment_webhook(
            State(handler_state(purchases, provider)),
            HeaderMap::new(),
            Bytes::from_static(b"{}"),
        )
        .await;

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn invalid_signature_answers_bad_request() {
        let mut purchases = MockPurchaseRepository::new();
        purchases.expect_create().times(0);
        let mut provider = MockPaymentProvider::new();
        provider
            .expect_verify_event()
            .returning(|_, _| Err(anyhow!("invalid webhook signature")));

        let mut headers = HeaderMap::new();
        headers.insert(SIGNATURE_HEADER, "t=1,v1=deadbeef".parse().unwrap());

        let response = handle_payment_webhook(
            State(handler_state(purchases, provider)),
            headers,
            Bytes::from_static(b"{}"),
        )
        .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
