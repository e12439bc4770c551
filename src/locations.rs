//! Location resolution seam.
//!
//! Matching free-text pickup descriptions to known locations is done by an
//! external service. The admin worker only needs the ids it produced.

use crate::error::Result;
use async_trait::async_trait;

#[async_trait]
pub trait LocationResolver: Send + Sync {
    /// Ids of known locations mentioned in `text`
    async fn resolve_locations_in_text(&self, text: &str) -> Result<Vec<i64>>;
}

/// Resolver for deployments without a location service
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopLocationResolver;

#[async_trait]
impl LocationResolver for NoopLocationResolver {
    async fn resolve_locations_in_text(&self, _text: &str) -> Result<Vec<i64>> {
        Ok(Vec::new())
    }
}
