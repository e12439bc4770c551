#![allow(clippy::doc_markdown)] // Allow technical terms like PostgreSQL, SQLx in docs
#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Auction Core
//!
//! Background claim-and-publish pipeline for marketplace auction orders.
//!
//! ## Overview
//!
//! Orders enter the `orders` table through an intake API. Two independently
//! scaled worker processes move them forward:
//!
//! - the **admin notifier** claims new orders and sends each one to the admin
//!   chat for review;
//! - the **auction publisher** claims approved orders, posts them to the
//!   public channel, finds the comment thread the platform creates for the
//!   post, opens bidding in it and optionally reposts the lot.
//!
//! Any number of processes may run each worker. Mutual exclusion comes only
//! from the row lock taken while claiming (`FOR UPDATE SKIP LOCKED`).
//!
//! ## Module Organization
//!
//! - [`state_machine`] - Review, lifecycle and auction states
//! - [`models`] - Orders and the rows they reference
//! - [`claim`] - Queue predicates, claim markers and stale-claim recovery
//! - [`store`] - Persistence seam with the PostgreSQL implementation
//! - [`gateway`] - Messaging seam with the Telegram Bot API implementation
//! - [`resilience`] - Retry on transient upstream failures
//! - [`thread_discovery`] - Comment thread lookup over the request log
//! - [`workers`] - The two workers, message formatting and the poll loop
//! - [`config`] - Layered configuration
//! - [`error`] - Structured error handling
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use auction_core::config::ConfigManager;
//! use auction_core::database::DatabaseConnection;
//! use auction_core::gateway::TelegramGateway;
//! use auction_core::locations::NoopLocationResolver;
//! use auction_core::store::PgOrderStore;
//! use auction_core::workers::{AdminNotifier, PollLoop};
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let manager = ConfigManager::load(None)?;
//! let config = manager.config();
//! let db = DatabaseConnection::connect(&config.database).await?;
//!
//! let notifier = AdminNotifier::new(
//!     Arc::new(PgOrderStore::new(db.pool().clone())),
//!     Arc::new(TelegramGateway::new(&config.telegram)?),
//!     Arc::new(NoopLocationResolver),
//!     config,
//! )?;
//!
//! let summary = PollLoop::new((&config.workers).into()).run(&notifier).await?;
//! println!("processed {} orders", summary.processed);
//! # Ok(())
//! # }
//! ```

pub mod claim;
pub mod config;
pub mod constants;
pub mod database;
pub mod error;
pub mod gateway;
pub mod locations;
pub mod logging;
pub mod models;
pub mod resilience;
pub mod state_machine;
pub mod store;
pub mod test_helpers;
pub mod thread_discovery;
pub mod workers;

pub use claim::{ClaimQueue, JobClaimer};
pub use config::{AuctionConfig, ConfigManager};
pub use error::{AuctionError, Result};
pub use gateway::{GatewayOutcome, MessagingGateway, OutboundMessage};
pub use models::{NewOrder, Order};
pub use state_machine::{derive_status, AuctionStatus, OrderStatus, ReviewCheck};
pub use store::{OrderStore, PgOrderStore};
pub use workers::{AdminNotifier, AuctionPublisher, PollLoop, PollWorker};
