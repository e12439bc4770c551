use crate::config::RetryConfig;
use crate::error::{AuctionError, Result};
use crate::gateway::GatewayOutcome;
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

/// Outcomes the retry policy can inspect for a transient signature
pub trait TransientOutcome {
    fn is_transient(&self) -> bool;
}

impl TransientOutcome for GatewayOutcome {
    fn is_transient(&self) -> bool {
        self.is_transient_failure()
    }
}

// Transport failures never reached the upstream and are not retried here
impl<T: TransientOutcome, E> TransientOutcome for std::result::Result<T, E> {
    fn is_transient(&self) -> bool {
        matches!(self, Ok(outcome) if outcome.is_transient())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, delay: Duration) -> Result<Self> {
        if max_attempts == 0 {
            return Err(AuctionError::ConfigurationError(
                "retry max_attempts must be at least 1".into(),
            ));
        }
        Ok(Self {
            max_attempts,
            delay,
        })
    }

    pub fn from_config(config: &RetryConfig) -> Result<Self> {
        Self::new(config.max_attempts, config.delay())
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Run `operation` until it returns a non-transient outcome or attempts
    /// run out. The last outcome is returned as-is; callers check success.
    pub async fn run<F, Fut, T>(&self, mut operation: F) -> T
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = T>,
        T: TransientOutcome,
    {
        let mut attempt = 1;
        loop {
            let outcome = operation().await;

            if !outcome.is_transient() {
                if attempt > 1 {
                    debug!(attempt = attempt, "Operation settled after retry");
                }
                return outcome;
            }

            if attempt >= self.max_attempts {
                warn!(
                    attempts = attempt,
                    "Transient failure persisted, giving up"
                );
                return outcome;
            }

            warn!(
                attempt = attempt,
                max_attempts = self.max_attempts,
                delay_ms = self.delay.as_millis() as u64,
                "Transient upstream failure, retrying"
            );
            sleep(self.delay).await;
            attempt += 1;
        }
    }
}
