use crate::error::Result;
use crate::models::{AutoForwardQuery, InboundRecord, LogStore};
use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;

#[derive(Default)]
struct LogState {
    records: Vec<InboundRecord>,
    // Records that become visible once `queries` reaches the given count
    delayed: Vec<(usize, InboundRecord)>,
    queries: usize,
    next_id: i64,
}

/// Request log kept in memory, filtered with the same pre-filter as SQL
#[derive(Default)]
pub struct InMemoryLogStore {
    state: Mutex<LogState>,
}

impl InMemoryLogStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn build_record(state: &mut LogState, url: &str, body: &str) -> InboundRecord {
        state.next_id += 1;
        InboundRecord {
            id: state.next_id,
            method: "POST".to_string(),
            url: url.to_string(),
            request_data: Some(body.to_string()),
            created_at: Utc::now(),
        }
    }

    /// Record an inbound webhook received now
    pub fn record(&self, url: &str, body: &str) -> InboundRecord {
        let mut state = self.state.lock();
        let record = Self::build_record(&mut state, url, body);
        state.records.push(record.clone());
        record
    }

    /// Record a webhook that only shows up after `after_queries` lookups
    pub fn record_after(&self, after_queries: usize, url: &str, body: &str) {
        let mut state = self.state.lock();
        let record = Self::build_record(&mut state, url, body);
        state.delayed.push((after_queries, record));
    }

    pub fn query_count(&self) -> usize {
        self.state.lock().queries
    }
}

#[async_trait]
impl LogStore for InMemoryLogStore {
    async fn recent_auto_forwards(&self, query: &AutoForwardQuery) -> Result<Vec<InboundRecord>> {
        let mut state = self.state.lock();
        let queries = state.queries;
        state.queries += 1;

        let (ready, pending): (Vec<_>, Vec<_>) = std::mem::take(&mut state.delayed)
            .into_iter()
            .partition(|(after, _)| *after <= queries);
        state.delayed = pending;
        for (_, mut record) in ready {
            record.created_at = Utc::now();
            state.records.push(record);
        }

        let mut matches: Vec<InboundRecord> = state
            .records
            .iter()
            .filter(|record| query.matches(record))
            .cloned()
            .collect();
        matches.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        matches.truncate(usize::try_from(query.limit).unwrap_or(0));
        Ok(matches)
    }
}
