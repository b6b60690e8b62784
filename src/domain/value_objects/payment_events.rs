use std::collections::HashMap;

use serde::Deserialize;

pub const EVENT_CHECKOUT_COMPLETED: &str = "checkout.session.completed";
pub const PAYMENT_STATUS_PAID: &str = "paid";

/// A signature-verified webhook event. `object` stays untyped until the
/// dispatching usecase knows which shape to expect for the event type.
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentEventModel {
    pub id: Option<String>,
    #[serde(rename = "type")]
    pub event_type: String,
    pub data: PaymentEventData,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PaymentEventData {
    pub object: serde_json::Value,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutSessionObjectModel {
    pub id: Option<String>,
    pub payment_status: Option<String>,
    pub payment_intent: Option<PaymentIntentRef>,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

/// The provider returns the payment intent either as a bare id or as an
/// expanded object.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum PaymentIntentRef {
    Id(String),
    Object { id: Option<String> },
}

impl PaymentIntentRef {
    pub fn reference_id(&self) -> Option<&str> {
        match self {
            PaymentIntentRef::Id(id) => Some(id.as_str()),
            PaymentIntentRef::Object { id } => id.as_deref(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payment_intent_parses_from_bare_id() {
        let session: CheckoutSessionObjectModel =
            serde_json::from_value(serde_json::json!({
                "id": "cs_123",
                "payment_status": "paid",
                "payment_intent": "pi_123",
            }))
            .unwrap();
        assert_eq!(
            session.payment_intent.unwrap().reference_id(),
            Some("pi_123")
        );
    }

    #[test]
    fn payment_intent_parses_from_expanded_object() {
        let session: CheckoutSessionObjectModel =
            serde_json::from_value(serde_json::json!({
                "id": "cs_123",
                "payment_status": "paid",
                "payment_intent": { "id": "pi_456", "status": "succeeded" },
            }))
            .unwrap();
        assert_eq!(
            session.payment_intent.unwrap().reference_id(),
            Some("pi_456")
        );
    }

    #[test]
    fn payment_intent_may_be_absent() {
        let session: CheckoutSessionObjectModel =
            serde_json::from_value(serde_json::json!({ "id": "cs_123" })).unwrap();
        assert!(session.payment_intent.is_none());
        assert!(session.metadata.is_empty());
    }
}
