//! # Order Model
//!
//! The central entity of the pipeline. Review and auction state are private
//! and only change through the transition methods below. Each transition
//! belongs to one [`OrderColumns`] group and a save writes only that group,
//! deriving the `status` column from whatever the row holds at write time.

use crate::error::{AuctionError, Result};
use crate::state_machine::{
    derive_status, derive_status_sql, AuctionStatus, OrderStatus, ReviewCheck,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgExecutor, PgPool};

/// Shared column list for every query that materializes an [`Order`]
pub(crate) const ORDER_COLUMNS: &str = r#"
    id, uid, text, lot_name, bid, locations, review_check, review_claimed_at,
    status, broken, closed_at, auction_status, auction_message_id,
    auction_comment_message_id, auction_posted_at, created_at, updated_at
"#;

/// Column groups written by a single save.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderColumns {
    /// `review_check` and `review_claimed_at`
    Review,
    /// `auction_status`, the two message ids and `auction_posted_at`
    Auction,
    /// `closed_at` and `broken`, written by intake and moderation
    Lifecycle,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: i64,
    pub uid: i64,
    pub text: String,
    pub lot_name: Option<String>,
    pub bid: Option<i64>,
    /// Free-text pickup description consumed by the location resolver
    pub locations: Option<String>,
    review_check: ReviewCheck,
    review_claimed_at: Option<DateTime<Utc>>,
    broken: bool,
    closed_at: Option<DateTime<Utc>>,
    auction_status: Option<AuctionStatus>,
    auction_message_id: Option<i64>,
    auction_comment_message_id: Option<i64>,
    auction_posted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// New Order for creation (intake side)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewOrder {
    pub uid: i64,
    pub text: String,
    pub lot_name: Option<String>,
    pub bid: Option<i64>,
    pub locations: Option<String>,
}

/// Raw `orders` row. Converted with [`TryFrom`] so unknown codes surface as
/// validation errors instead of panics.
#[derive(Debug, Clone, FromRow)]
pub struct OrderRow {
    pub id: i64,
    pub uid: i64,
    pub text: String,
    pub lot_name: Option<String>,
    pub bid: Option<i64>,
    pub locations: Option<String>,
    pub review_check: i16,
    pub review_claimed_at: Option<DateTime<Utc>>,
    pub status: i16,
    pub broken: bool,
    pub closed_at: Option<DateTime<Utc>>,
    pub auction_status: Option<String>,
    pub auction_message_id: Option<i64>,
    pub auction_comment_message_id: Option<i64>,
    pub auction_posted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<OrderRow> for Order {
    type Error = AuctionError;

    fn try_from(row: OrderRow) -> Result<Self> {
        let review_check =
            ReviewCheck::from_code(row.review_check).map_err(AuctionError::ValidationError)?;
        let auction_status = row
            .auction_status
            .as_deref()
            .map(str::parse::<AuctionStatus>)
            .transpose()
            .map_err(AuctionError::ValidationError)?;

        // The stored status is derived data; it is recomputed on the next save
        Ok(Order {
            id: row.id,
            uid: row.uid,
            text: row.text,
            lot_name: row.lot_name,
            bid: row.bid,
            locations: row.locations,
            review_check,
            review_claimed_at: row.review_claimed_at,
            broken: row.broken,
            closed_at: row.closed_at,
            auction_status,
            auction_message_id: row.auction_message_id,
            auction_comment_message_id: row.auction_comment_message_id,
            auction_posted_at: row.auction_posted_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

impl Order {
    /// Build an unsaved order as intake would create it
    pub fn from_new(id: i64, new_order: NewOrder, now: DateTime<Utc>) -> Self {
        Self {
            id,
            uid: new_order.uid,
            text: new_order.text,
            lot_name: new_order.lot_name,
            bid: new_order.bid,
            locations: new_order.locations,
            review_check: ReviewCheck::New,
            review_claimed_at: None,
            broken: false,
            closed_at: None,
            auction_status: None,
            auction_message_id: None,
            auction_comment_message_id: None,
            auction_posted_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Derived lifecycle status; the only source for the `status` column
    pub fn status(&self) -> OrderStatus {
        derive_status(self.closed_at.is_some(), self.review_check, self.broken)
    }

    pub fn review_check(&self) -> ReviewCheck {
        self.review_check
    }

    pub fn review_claimed_at(&self) -> Option<DateTime<Utc>> {
        self.review_claimed_at
    }

    pub fn is_broken(&self) -> bool {
        self.broken
    }

    pub fn closed_at(&self) -> Option<DateTime<Utc>> {
        self.closed_at
    }

    pub fn auction_status(&self) -> Option<AuctionStatus> {
        self.auction_status
    }

    pub fn auction_message_id(&self) -> Option<i64> {
        self.auction_message_id
    }

    pub fn auction_comment_message_id(&self) -> Option<i64> {
        self.auction_comment_message_id
    }

    pub fn auction_posted_at(&self) -> Option<DateTime<Utc>> {
        self.auction_posted_at
    }

    pub fn lot_label(&self) -> &str {
        self.lot_name.as_deref().unwrap_or("")
    }

    // Review transitions

    pub fn claim_for_review(&mut self, at: DateTime<Utc>) {
        self.review_check = ReviewCheck::Sending;
        self.review_claimed_at = Some(at);
    }

    pub fn mark_review_sent(&mut self) {
        self.review_check = ReviewCheck::Sended;
        self.review_claimed_at = None;
    }

    /// Return an abandoned review claim to the queue
    pub fn release_review_claim(&mut self) {
        self.review_check = ReviewCheck::New;
        self.review_claimed_at = None;
    }

    /// Record the admin decision taken outside the pipeline
    pub fn record_review_decision(&mut self, accepted: bool) {
        self.review_check = if accepted {
            ReviewCheck::InWork
        } else {
            ReviewCheck::Blocked
        };
        self.review_claimed_at = None;
    }

    pub fn close(&mut self, at: DateTime<Utc>) {
        self.closed_at = Some(at);
    }

    pub fn mark_broken(&mut self) {
        self.broken = true;
    }

    // Auction transitions

    pub fn begin_publishing(&mut self) {
        self.auction_status = Some(AuctionStatus::Publishing);
    }

    /// Persisted right after the channel post so a re-claim never posts twice
    pub fn record_channel_message(&mut self, message_id: i64) {
        self.auction_message_id = Some(message_id);
    }

    pub fn mark_published(&mut self, comment_message_id: Option<i64>, at: DateTime<Utc>) -> Result<()> {
        if self.auction_message_id.is_none() {
            return Err(AuctionError::InvalidState(format!(
                "order {} cannot be published without a channel message id",
                self.id
            )));
        }
        self.auction_comment_message_id = comment_message_id;
        self.auction_status = Some(AuctionStatus::Published);
        self.auction_posted_at = Some(at);
        Ok(())
    }

    pub fn mark_failed(&mut self) {
        self.auction_status = Some(AuctionStatus::Failed);
    }

    // Persistence

    /// Insert a new order; the status column starts from the derived value
    pub async fn create(pool: &PgPool, new_order: NewOrder) -> Result<Order> {
        let query = format!(
            r#"
            INSERT INTO orders (uid, text, lot_name, bid, locations, review_check, status,
                                broken, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, false, NOW(), NOW())
            RETURNING {ORDER_COLUMNS}
            "#
        );

        let row = sqlx::query_as::<_, OrderRow>(&query)
            .bind(new_order.uid)
            .bind(&new_order.text)
            .bind(&new_order.lot_name)
            .bind(new_order.bid)
            .bind(&new_order.locations)
            .bind(ReviewCheck::New.code())
            .bind(derive_status(false, ReviewCheck::New, false).code())
            .fetch_one(pool)
            .await?;

        Order::try_from(row)
    }

    pub async fn find_by_id<'e, E: PgExecutor<'e>>(executor: E, id: i64) -> Result<Option<Order>> {
        let query = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1");

        let row = sqlx::query_as::<_, OrderRow>(&query)
            .bind(id)
            .fetch_optional(executor)
            .await?;

        row.map(Order::try_from).transpose()
    }

    /// Persist one group of columns, then reload the whole row.
    ///
    /// Only the columns owned by `columns` are written, so changes another
    /// writer made to the rest of the row while this copy was held survive.
    /// `status` is recomputed in the same statement from the row's current
    /// inputs.
    pub async fn save_with<'e, E: PgExecutor<'e>>(
        &mut self,
        executor: E,
        columns: OrderColumns,
    ) -> Result<()> {
        let row = match columns {
            OrderColumns::Review => {
                let status =
                    derive_status_sql("closed_at IS NOT NULL", "$2::smallint", "broken");
                let query = format!(
                    r#"
                    UPDATE orders
                    SET review_check = $2,
                        review_claimed_at = $3,
                        status = {status},
                        updated_at = NOW()
                    WHERE id = $1
                    RETURNING {ORDER_COLUMNS}
                    "#
                );
                sqlx::query_as::<_, OrderRow>(&query)
                    .bind(self.id)
                    .bind(self.review_check.code())
                    .bind(self.review_claimed_at)
                    .fetch_optional(executor)
                    .await?
            }
            OrderColumns::Auction => {
                let status = derive_status_sql("closed_at IS NOT NULL", "review_check", "broken");
                let query = format!(
                    r#"
                    UPDATE orders
                    SET auction_status = $2,
                        auction_message_id = $3,
                        auction_comment_message_id = $4,
                        auction_posted_at = $5,
                        status = {status},
                        updated_at = NOW()
                    WHERE id = $1
                    RETURNING {ORDER_COLUMNS}
                    "#
                );
                sqlx::query_as::<_, OrderRow>(&query)
                    .bind(self.id)
                    .bind(self.auction_status.map(|s| s.as_str()))
                    .bind(self.auction_message_id)
                    .bind(self.auction_comment_message_id)
                    .bind(self.auction_posted_at)
                    .fetch_optional(executor)
                    .await?
            }
            OrderColumns::Lifecycle => {
                let status = derive_status_sql(
                    "$2::timestamptz IS NOT NULL",
                    "review_check",
                    "$3::boolean",
                );
                let query = format!(
                    r#"
                    UPDATE orders
                    SET closed_at = $2,
                        broken = $3,
                        status = {status},
                        updated_at = NOW()
                    WHERE id = $1
                    RETURNING {ORDER_COLUMNS}
                    "#
                );
                sqlx::query_as::<_, OrderRow>(&query)
                    .bind(self.id)
                    .bind(self.closed_at)
                    .bind(self.broken)
                    .fetch_optional(executor)
                    .await?
            }
        };

        let row =
            row.ok_or_else(|| AuctionError::DatabaseError(format!("order {} not found", self.id)))?;
        *self = Order::try_from(row)?;
        Ok(())
    }

    pub async fn save(&mut self, pool: &PgPool, columns: OrderColumns) -> Result<()> {
        self.save_with(pool, columns).await
    }

    /// Copy the columns in `columns` from `source`, leaving the rest as is
    pub(crate) fn merge_columns(&mut self, source: &Order, columns: OrderColumns) {
        match columns {
            OrderColumns::Review => {
                self.review_check = source.review_check;
                self.review_claimed_at = source.review_claimed_at;
            }
            OrderColumns::Auction => {
                self.auction_status = source.auction_status;
                self.auction_message_id = source.auction_message_id;
                self.auction_comment_message_id = source.auction_comment_message_id;
                self.auction_posted_at = source.auction_posted_at;
            }
            OrderColumns::Lifecycle => {
                self.closed_at = source.closed_at;
                self.broken = source.broken;
            }
        }
    }
}
