use chrono::{DateTime, Utc};
use diesel::prelude::*;

use crate::infrastructure::postgres::schema::purchases;

#[derive(Debug, Clone, Identifiable, Selectable, Queryable)]
#[diesel(table_name = purchases)]
pub struct PurchaseEntity {
    pub id: i64,
    pub user_identifier: String,
    pub content_id: String,
    pub stripe_payment_intent_id: String,
    pub amount: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = purchases)]
pub struct InsertPurchaseEntity {
    pub user_identifier: String,
    pub content_id: String,
    pub stripe_payment_intent_id: String,
    pub amount: i32,
}
