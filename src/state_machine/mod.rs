// State machine module for the order pipeline
//
// Review, lifecycle and auction states plus the pure derivation rule that
// keeps the persisted lifecycle status consistent with its inputs.

pub mod lifecycle;
pub mod states;

// Re-export main types for convenient access
pub use lifecycle::{derive_status, derive_status_sql};
pub use states::{AuctionStatus, OrderStatus, ReviewCheck};
