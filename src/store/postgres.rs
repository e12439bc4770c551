use super::OrderStore;
use crate::claim::ClaimQueue;
use crate::error::{AuctionError, Result};
use crate::gateway::MediaAttachment;
use crate::models::order::ORDER_COLUMNS;
use crate::models::{Location, Order, OrderColumns, OrderMedia, OrderRow, TelegramUser};
use crate::state_machine::ReviewCheck;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::error;

/// PostgreSQL order store
#[derive(Clone)]
pub struct PgOrderStore {
    pool: PgPool,
}

impl PgOrderStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl OrderStore for PgOrderStore {
    async fn claim_next(&self, queue: ClaimQueue, now: DateTime<Utc>) -> Result<Option<Order>> {
        let query = format!(
            r#"
            SELECT {ORDER_COLUMNS}
            FROM orders
            WHERE {}
            ORDER BY id
            LIMIT 1
            FOR UPDATE SKIP LOCKED
            "#,
            queue.selection_predicate()
        );

        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, OrderRow>(&query)
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| {
                error!(queue = %queue, "Failed to select claimable order: {}", e);
                AuctionError::DatabaseError(format!("Order claiming failed: {e}"))
            })?;

        let Some(row) = row else {
            tx.rollback().await?;
            return Ok(None);
        };

        let mut order = Order::try_from(row)?;
        queue.apply_claim(&mut order, now);
        order.save_with(&mut *tx, queue.columns()).await?;
        tx.commit().await?;

        Ok(Some(order))
    }

    async fn reset_stale_review_claims(&self, cutoff: DateTime<Utc>) -> Result<u64> {
        let query = format!(
            r#"
            SELECT {ORDER_COLUMNS}
            FROM orders
            WHERE review_check = $1
              AND (review_claimed_at IS NULL OR review_claimed_at < $2)
            ORDER BY id
            FOR UPDATE SKIP LOCKED
            "#
        );

        let mut tx = self.pool.begin().await?;

        let rows = sqlx::query_as::<_, OrderRow>(&query)
            .bind(ReviewCheck::Sending.code())
            .bind(cutoff)
            .fetch_all(&mut *tx)
            .await?;

        let mut reset = 0;
        for row in rows {
            let mut order = Order::try_from(row)?;
            order.release_review_claim();
            order.save_with(&mut *tx, OrderColumns::Review).await?;
            reset += 1;
        }

        tx.commit().await?;
        Ok(reset)
    }

    async fn find_by_id(&self, order_id: i64) -> Result<Option<Order>> {
        Order::find_by_id(&self.pool, order_id).await
    }

    async fn save(&self, order: &mut Order, columns: OrderColumns) -> Result<()> {
        order.save(&self.pool, columns).await
    }

    async fn locations_for(&self, order_id: i64) -> Result<Vec<Location>> {
        Ok(Location::for_order(&self.pool, order_id).await?)
    }

    async fn attach_locations(&self, order_id: i64, location_ids: &[i64]) -> Result<()> {
        Location::attach(&self.pool, order_id, location_ids).await?;
        Ok(())
    }

    async fn media_for(&self, order_id: i64) -> Result<Vec<MediaAttachment>> {
        let media = OrderMedia::for_order(&self.pool, order_id).await?;
        Ok(media.iter().filter_map(OrderMedia::to_attachment).collect())
    }

    async fn submitter(&self, uid: i64) -> Result<Option<TelegramUser>> {
        Ok(TelegramUser::find_by_uid(&self.pool, uid).await?)
    }
}
