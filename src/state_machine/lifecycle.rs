//! # Order Lifecycle Rules
//!
//! The order `status` is a pure function of three inputs: whether the order
//! is closed, its review check, and an explicit broken override. Inserts
//! persist the value returned by [`derive_status`]; updates recompute it in
//! SQL with [`derive_status_sql`]. Nothing assigns a status directly.

use super::states::{OrderStatus, ReviewCheck};

/// Derive the lifecycle status.
///
/// Precedence: broken > closed > blocked > in work > new.
pub fn derive_status(closed: bool, review_check: ReviewCheck, broken: bool) -> OrderStatus {
    if broken {
        OrderStatus::Broken
    } else if closed {
        OrderStatus::Closed
    } else if review_check == ReviewCheck::Blocked {
        OrderStatus::RejectedByAdmin
    } else if review_check == ReviewCheck::InWork {
        OrderStatus::InWork
    } else {
        OrderStatus::New
    }
}

/// SQL `CASE` expression with the same precedence as [`derive_status`].
///
/// Each argument is a SQL expression: `closed` and `broken` evaluate to
/// booleans, `review_check` to the stored review code. Writes that touch only
/// part of a row use this so the status is derived from the row's current
/// values rather than from a copy held in memory.
pub fn derive_status_sql(closed: &str, review_check: &str, broken: &str) -> String {
    format!(
        "CASE WHEN {broken} THEN {} WHEN {closed} THEN {} \
         WHEN {review_check} = {} THEN {} WHEN {review_check} = {} THEN {} ELSE {} END",
        OrderStatus::Broken.code(),
        OrderStatus::Closed.code(),
        ReviewCheck::Blocked.code(),
        OrderStatus::RejectedByAdmin.code(),
        ReviewCheck::InWork.code(),
        OrderStatus::InWork.code(),
        OrderStatus::New.code(),
    )
}
