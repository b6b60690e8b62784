pub mod catalog;
pub mod checkout;
pub mod content_access;
pub mod payment_webhook;
