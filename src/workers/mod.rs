//! # Workers
//!
//! The two poll workers and the loop that drives them.

pub mod admin_notifier;
pub mod auction_publisher;
pub mod formatting;
pub mod poll_loop;

pub use admin_notifier::AdminNotifier;
pub use auction_publisher::AuctionPublisher;
pub use poll_loop::{PollLoop, PollLoopConfig, PollLoopSummary, PollWorker};
