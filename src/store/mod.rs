//! # Order Store
//!
//! Persistence seam for the workers. [`PgOrderStore`] is the production
//! implementation; [`crate::test_helpers::InMemoryOrderStore`] mirrors its
//! semantics for tests that do not need PostgreSQL.

pub mod postgres;

use crate::claim::ClaimQueue;
use crate::error::Result;
use crate::gateway::MediaAttachment;
use crate::models::{Location, Order, OrderColumns, TelegramUser};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

pub use postgres::PgOrderStore;

#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Lock, mark and return the lowest-id order matching `queue`, skipping
    /// rows locked by other claimers. `None` when nothing is claimable.
    async fn claim_next(&self, queue: ClaimQueue, now: DateTime<Utc>) -> Result<Option<Order>>;

    /// Release review claims taken before `cutoff`; returns rows reset
    async fn reset_stale_review_claims(&self, cutoff: DateTime<Utc>) -> Result<u64>;

    async fn find_by_id(&self, order_id: i64) -> Result<Option<Order>>;

    /// Write the `columns` group of `order` and refresh `order` from the
    /// stored row, picking up whatever other writers changed meanwhile.
    async fn save(&self, order: &mut Order, columns: OrderColumns) -> Result<()>;

    async fn locations_for(&self, order_id: i64) -> Result<Vec<Location>>;

    async fn attach_locations(&self, order_id: i64, location_ids: &[i64]) -> Result<()>;

    /// Attachments that can be re-sent by file id
    async fn media_for(&self, order_id: i64) -> Result<Vec<MediaAttachment>>;

    async fn submitter(&self, uid: i64) -> Result<Option<TelegramUser>>;
}
