use crate::error::{AuctionError, Result};
use crate::locations::LocationResolver;
use async_trait::async_trait;
use parking_lot::Mutex;

/// Resolver returning a fixed id list and recording the texts it was given
pub struct StaticLocationResolver {
    result: std::result::Result<Vec<i64>, String>,
    calls: Mutex<Vec<String>>,
}

impl StaticLocationResolver {
    pub fn returning(location_ids: Vec<i64>) -> Self {
        Self {
            result: Ok(location_ids),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            result: Err(message.to_string()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl LocationResolver for StaticLocationResolver {
    async fn resolve_locations_in_text(&self, text: &str) -> Result<Vec<i64>> {
        self.calls.lock().push(text.to_string());
        self.result.clone().map_err(AuctionError::LocationError)
    }
}
