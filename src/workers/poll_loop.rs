//! # Poll Loop
//!
//! Drives one worker for a bounded wall-clock window. The process is
//! expected to be restarted by its supervisor after the window ends, which
//! keeps each run short enough for a minute-granular scheduler.

use crate::config::WorkerConfig;
use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tracing::{debug, info};

#[async_trait]
pub trait PollWorker: Send + Sync {
    fn name(&self) -> &'static str;

    /// One-time setup before polling starts
    async fn prepare(&self) -> Result<()> {
        Ok(())
    }

    /// Claim and process one unit of work. `Ok(false)` means nothing was
    /// claimable.
    async fn process_next(&self) -> Result<bool>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollLoopConfig {
    pub max_execution_window: Duration,
    pub idle_backoff: Duration,
}

impl From<&WorkerConfig> for PollLoopConfig {
    fn from(config: &WorkerConfig) -> Self {
        Self {
            max_execution_window: config.max_execution_window(),
            idle_backoff: config.idle_backoff(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollLoopSummary {
    pub iterations: u64,
    pub processed: u64,
    pub idle_sleeps: u64,
}

pub struct PollLoop {
    config: PollLoopConfig,
}

impl PollLoop {
    pub fn new(config: PollLoopConfig) -> Self {
        Self { config }
    }

    /// Run `worker` until the execution window elapses. A worker error stops
    /// the loop and is returned.
    pub async fn run<W: PollWorker + ?Sized>(&self, worker: &W) -> Result<PollLoopSummary> {
        let started = Instant::now();
        let deadline = started + self.config.max_execution_window;
        let mut summary = PollLoopSummary::default();

        worker.prepare().await?;

        info!(
            worker = worker.name(),
            window_seconds = self.config.max_execution_window.as_secs(),
            "🚀 Poll loop started"
        );

        while Instant::now() < deadline {
            summary.iterations += 1;

            if worker.process_next().await? {
                summary.processed += 1;
                continue;
            }

            debug!(worker = worker.name(), "Nothing claimed, backing off");
            summary.idle_sleeps += 1;
            sleep(self.config.idle_backoff).await;
        }

        info!(
            worker = worker.name(),
            iterations = summary.iterations,
            processed = summary.processed,
            idle_sleeps = summary.idle_sleeps,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "🏁 Poll loop finished"
        );

        Ok(summary)
    }
}
