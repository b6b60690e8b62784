use anyhow::Result;
use axum::async_trait;
use mockall::automock;

use crate::domain::value_objects::payment_events::PaymentEventModel;
use crate::domain::value_objects::checkout::{CheckoutSessionHandle, CreateCheckoutSessionModel};

/// Payment provider port, kept narrow so the checkout and webhook usecases
/// can be exercised against mocks.
#[automock]
#[async_trait]
pub trait PaymentProvider {
    /// Creates one remote checkout session and returns its handle.
    async fn create_checkout_session(
        &self,
        params: CreateCheckoutSessionModel,
    ) -> Result<CheckoutSessionHandle>;

    /// Verifies the webhook signature over the raw payload and deserializes
    /// the event. The payload must not be trusted before this passes.
    fn verify_event(&self, payload: &[u8], signature_header: &str) -> Result<PaymentEventModel>;
}
