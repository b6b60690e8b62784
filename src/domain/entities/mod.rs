pub mod purchases;
