pub mod content;
pub mod payments;
pub mod purchases;
