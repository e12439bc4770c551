//! # Auction Worker
//!
//! Process entry point for the pipeline workers. A scheduler starts one
//! process per worker every minute; each run polls for the configured
//! execution window and exits.

use anyhow::{Context, Result};
use auction_core::config::ConfigManager;
use auction_core::database::DatabaseConnection;
use auction_core::gateway::TelegramGateway;
use auction_core::locations::NoopLocationResolver;
use auction_core::logging::init_structured_logging;
use auction_core::models::PgLogStore;
use auction_core::store::PgOrderStore;
use auction_core::workers::{AdminNotifier, AuctionPublisher, PollLoop, PollWorker};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "auction-worker")]
#[command(about = "Claim and publish auction orders")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    /// Configuration file (default: config/auction.toml if present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Send new orders to the admin chat for review
    AdminNotifier {
        /// Process a single order by id without claiming it
        #[arg(long)]
        order: Option<i64>,
    },

    /// Publish approved orders to the auction channel
    Publisher {
        /// Process a single order by id without claiming it
        #[arg(long)]
        order: Option<i64>,
    },

    /// Apply database migrations
    Migrate,
}

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    init_structured_logging();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        error!(error = %format!("{e:#}"), "❌ auction-worker failed");
        eprintln!("❌ {e:#}");
        process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let manager = ConfigManager::load(cli.config.as_deref()).context("loading configuration")?;
    let config = manager.config();

    info!(
        environment = manager.environment(),
        version = auction_core::constants::system::AUCTION_CORE_VERSION,
        "Starting auction-worker"
    );

    let db = DatabaseConnection::connect(&config.database)
        .await
        .context("connecting to database")?;
    if !db.health_check().await.context("checking database health")? {
        anyhow::bail!("database health check returned an unexpected value");
    }

    match cli.command {
        Commands::Migrate => {
            db.run_migrations().await.context("running migrations")?;
        }
        Commands::AdminNotifier { order } => {
            let notifier = AdminNotifier::new(
                Arc::new(PgOrderStore::new(db.pool().clone())),
                Arc::new(TelegramGateway::new(&config.telegram)?),
                Arc::new(NoopLocationResolver),
                config,
            )?;

            match order {
                Some(order_id) => report_single(order_id, notifier.process_order(order_id).await?),
                None => run_loop(&notifier, &manager).await?,
            }
        }
        Commands::Publisher { order } => {
            let publisher = AuctionPublisher::new(
                Arc::new(PgOrderStore::new(db.pool().clone())),
                Arc::new(TelegramGateway::new(&config.telegram)?),
                Arc::new(PgLogStore::new(db.pool().clone())),
                config,
            )?;

            match order {
                Some(order_id) => report_single(order_id, publisher.process_order(order_id).await?),
                None => run_loop(&publisher, &manager).await?,
            }
        }
    }

    db.close().await;
    Ok(())
}

async fn run_loop<W: PollWorker>(worker: &W, manager: &ConfigManager) -> Result<()> {
    let poll_loop = PollLoop::new((&manager.config().workers).into());
    let summary = poll_loop
        .run(worker)
        .await
        .with_context(|| format!("{} stopped", worker.name()))?;

    println!(
        "{}: {} iterations, {} processed, {} idle sleeps",
        worker.name(),
        summary.iterations,
        summary.processed,
        summary.idle_sleeps
    );
    Ok(())
}

fn report_single(order_id: i64, found: bool) {
    if found {
        println!("✅ Order #{order_id} processed");
    } else {
        println!("❌ Order #{order_id} not found");
    }
}
