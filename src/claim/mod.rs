//! # Job Claim Protocol
//!
//! Both workers pull work from the `orders` table the same way: lock the
//! lowest-id matching row with `FOR UPDATE SKIP LOCKED`, stamp a claim marker
//! on it through the [`Order`] entity, write, commit. A [`ClaimQueue`] names
//! the selection predicate and the marker; [`JobClaimer`] drives the
//! protocol against an [`OrderStore`](crate::store::OrderStore).

pub mod claimer;

use crate::models::{Order, OrderColumns};
use crate::state_machine::{OrderStatus, ReviewCheck};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

pub use claimer::JobClaimer;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClaimQueue {
    /// New orders waiting to be sent to the admin
    Review,
    /// Approved orders waiting to be published
    Auction,
}

impl ClaimQueue {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Review => "review",
            Self::Auction => "auction",
        }
    }

    /// SQL `WHERE` fragment selecting claimable rows
    pub fn selection_predicate(&self) -> String {
        match self {
            Self::Review => format!(
                "review_check = {} AND closed_at IS NULL",
                ReviewCheck::New.code()
            ),
            Self::Auction => format!(
                "status = {} AND auction_status IS NULL",
                OrderStatus::InWork.code()
            ),
        }
    }

    /// In-process form of [`Self::selection_predicate`]
    pub fn matches(&self, order: &Order) -> bool {
        match self {
            Self::Review => order.review_check() == ReviewCheck::New && order.closed_at().is_none(),
            Self::Auction => order.status() == OrderStatus::InWork && order.auction_status().is_none(),
        }
    }

    /// Columns the claim marker lives in
    pub fn columns(&self) -> OrderColumns {
        match self {
            Self::Review => OrderColumns::Review,
            Self::Auction => OrderColumns::Auction,
        }
    }

    /// Stamp the claim marker. Afterwards the order no longer matches.
    pub fn apply_claim(&self, order: &mut Order, now: DateTime<Utc>) {
        match self {
            Self::Review => order.claim_for_review(now),
            Self::Auction => order.begin_publishing(),
        }
    }
}

impl fmt::Display for ClaimQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
