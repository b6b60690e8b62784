use anyhow::Result;
use axum::async_trait;
use mockall::automock;

use crate::domain::entities::purchases::InsertPurchaseEntity;

/// Purchase ledger port. Rows are written once on payment confirmation and
/// read back for dedupe and access checks.
#[automock]
#[async_trait]
pub trait PurchaseRepository {
    /// Inserts a purchase record. Returns false when the (user, content)
    /// pair already holds a row; the unique index makes the insert the
    /// authoritative dedupe point.
    async fn create(&self, insert_purchase_entity: InsertPurchaseEntity) -> Result<bool>;
    async fn exists(&self, user_identifier: &str, content_id: &str) -> Result<bool>;
}
