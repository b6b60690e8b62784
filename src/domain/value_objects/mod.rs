pub mod checkout;
pub mod content;
pub mod payment_events;
