//! # Job Claimer
//!
//! Distributed claiming for the poll workers. Any number of worker processes
//! may call [`JobClaimer::claim_next`] concurrently; the row lock taken by the
//! store guarantees a row is handed to at most one of them.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use auction_core::claim::{ClaimQueue, JobClaimer};
//! use auction_core::store::PgOrderStore;
//! use sqlx::PgPool;
//! use std::sync::Arc;
//!
//! # async fn example(pool: PgPool) -> Result<(), Box<dyn std::error::Error>> {
//! let claimer = JobClaimer::new(Arc::new(PgOrderStore::new(pool)));
//!
//! if let Some(order) = claimer.claim_next(ClaimQueue::Review, None).await? {
//!     println!("Claimed order {}", order.id);
//! }
//! # Ok(())
//! # }
//! ```

use super::ClaimQueue;
use crate::error::{AuctionError, Result};
use crate::models::Order;
use crate::store::OrderStore;
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument};
use uuid::Uuid;

pub struct JobClaimer {
    store: Arc<dyn OrderStore>,
    claimer_id: String,
}

impl JobClaimer {
    pub fn new(store: Arc<dyn OrderStore>) -> Self {
        Self {
            store,
            claimer_id: format!("claimer-{}", Uuid::new_v4()),
        }
    }

    pub fn claimer_id(&self) -> &str {
        &self.claimer_id
    }

    /// Claim the next order from `queue`.
    ///
    /// With `target` set the row is loaded by id without locking and without
    /// a claim marker. That path exists for manual runs and tests only.
    #[instrument(skip(self), fields(claimer_id = %self.claimer_id))]
    pub async fn claim_next(&self, queue: ClaimQueue, target: Option<i64>) -> Result<Option<Order>> {
        if let Some(order_id) = target {
            debug!(order_id = order_id, queue = %queue, "Loading target order without claim");
            return self.store.find_by_id(order_id).await;
        }

        let claimed = self.store.claim_next(queue, Utc::now()).await?;

        match &claimed {
            Some(order) => info!(
                order_id = order.id,
                queue = %queue,
                lot_name = order.lot_label(),
                "Claimed order"
            ),
            None => debug!(queue = %queue, "No claimable orders"),
        }

        Ok(claimed)
    }

    /// Return review claims older than `threshold` to the queue.
    ///
    /// Idempotent; a claim younger than the threshold is left alone.
    #[instrument(skip(self), fields(claimer_id = %self.claimer_id))]
    pub async fn sweep_stale_claims(&self, threshold: Duration) -> Result<u64> {
        let threshold = chrono::Duration::from_std(threshold).map_err(|e| {
            AuctionError::ConfigurationError(format!("stale claim threshold out of range: {e}"))
        })?;
        let cutoff = Utc::now() - threshold;

        let reset = self.store.reset_stale_review_claims(cutoff).await?;

        if reset > 0 {
            info!(
                reset_count = reset,
                cutoff = %cutoff,
                "🧹 Reset stale review claims"
            );
        } else {
            debug!("No stale review claims found");
        }

        Ok(reset)
    }
}
