//! # Resilience Module
//!
//! Fixed-delay retry for upstream calls that fail with a transient
//! signature (HTTP 502/503 from the messaging platform or its proxy).
//!
//! ## Usage
//!
//! ```rust,no_run
//! use auction_core::resilience::RetryPolicy;
//! use auction_core::gateway::GatewayOutcome;
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let policy = RetryPolicy::new(3, Duration::from_secs(2))?;
//!
//! let outcome = policy
//!     .run(|| async { Ok::<_, auction_core::AuctionError>(GatewayOutcome::delivered(vec![42])) })
//!     .await?;
//! assert_eq!(outcome.last_message_id(), Some(42));
//! # Ok(())
//! # }
//! ```

pub mod retry;

pub use retry::{RetryPolicy, TransientOutcome};
