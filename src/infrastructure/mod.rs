pub mod axum_http;
pub mod content;
pub mod payments;
pub mod postgres;
