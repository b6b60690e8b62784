use std::sync::Arc;

use anyhow::Result;
use axum::async_trait;
use diesel::prelude::*;

use crate::domain::entities::purchases::InsertPurchaseEntity;
use crate::domain::repositories::purchases::PurchaseRepository;
use crate::infrastructure::postgres::postgres_connection::PgPoolSquad;
use crate::infrastructure::postgres::schema::purchases;

pub struct PurchasePostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl PurchasePostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl PurchaseRepository for PurchasePostgres {
    async fn create(&self, insert_purchase_entity: InsertPurchaseEntity) -> Result<bool> {
        let db_pool = Arc::clone(&self.db_pool);
        let rows = tokio::task::spawn_blocking(move || -> Result<usize> {
            let mut conn = db_pool.get()?;
            // The composite unique index on (user_identifier, content_id)
            // makes concurrent webhook deliveries collapse into one row.
            let rows = diesel::insert_into(purchases::table)
                .values(&insert_purchase_entity)
                .on_conflict((purchases::user_identifier, purchases::content_id))
                .do_nothing()
                .execute(&mut conn)?;
            Ok(rows)
        })
        .await??;

        Ok(rows > 0)
    }

    async fn exists(&self, user_identifier: &str, content_id: &str) -> Result<bool> {
        let db_pool = Arc::clone(&self.db_pool);
        let user_identifier = user_identifier.to_string();
        let content_id = content_id.to_string();
        let found = tokio::task::spawn_blocking(move || -> Result<Option<i64>> {
            let mut conn = db_pool.get()?;
            let id = purchases::table
                .filter(purchases::user_identifier.eq(&user_identifier))
                .filter(purchases::content_id.eq(&content_id))
                .select(purchases::id)
                .first::<i64>(&mut conn)
                .optional()?;
            Ok(id)
        })
        .await??;

        Ok(found.is_some())
    }
}
