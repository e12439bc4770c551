use crate::claim::ClaimQueue;
use crate::error::{AuctionError, Result};
use crate::gateway::MediaAttachment;
use crate::models::{Location, NewOrder, Order, OrderColumns, TelegramUser};
use crate::state_machine::ReviewCheck;
use crate::store::OrderStore;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap};

#[derive(Default)]
struct StoreState {
    // BTreeMap keeps claim order equal to id order
    orders: BTreeMap<i64, Order>,
    next_id: i64,
    locations: HashMap<i64, Location>,
    links: Vec<(i64, i64)>,
    media: HashMap<i64, Vec<MediaAttachment>>,
    users: HashMap<i64, TelegramUser>,
    saves: usize,
}

/// Order store backed by a mutex; the lock plays the role of the row lock
#[derive(Default)]
pub struct InMemoryOrderStore {
    state: Mutex<StoreState>,
}

impl InMemoryOrderStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an order the way intake would
    pub fn insert(&self, new_order: NewOrder) -> Order {
        let mut state = self.state.lock();
        state.next_id += 1;
        let order = Order::from_new(state.next_id, new_order, Utc::now());
        state.orders.insert(order.id, order.clone());
        order
    }

    /// Insert or replace an order as-is
    pub fn put(&self, order: Order) {
        let mut state = self.state.lock();
        state.next_id = state.next_id.max(order.id);
        state.orders.insert(order.id, order);
    }

    pub fn get(&self, order_id: i64) -> Option<Order> {
        self.state.lock().orders.get(&order_id).cloned()
    }

    pub fn add_location(&self, location: Location) {
        self.state.lock().locations.insert(location.id, location);
    }

    pub fn add_media(&self, order_id: i64, attachment: MediaAttachment) {
        self.state
            .lock()
            .media
            .entry(order_id)
            .or_default()
            .push(attachment);
    }

    pub fn add_user(&self, user: TelegramUser) {
        self.state.lock().users.insert(user.uid, user);
    }

    pub fn linked_location_ids(&self, order_id: i64) -> Vec<i64> {
        self.state
            .lock()
            .links
            .iter()
            .filter(|(linked_order, _)| *linked_order == order_id)
            .map(|(_, location_id)| *location_id)
            .collect()
    }

    /// Number of successful `save` calls
    pub fn save_count(&self) -> usize {
        self.state.lock().saves
    }
}

#[async_trait]
impl OrderStore for InMemoryOrderStore {
    async fn claim_next(&self, queue: ClaimQueue, now: DateTime<Utc>) -> Result<Option<Order>> {
        let mut state = self.state.lock();
        let Some(order) = state.orders.values_mut().find(|order| queue.matches(order)) else {
            return Ok(None);
        };

        queue.apply_claim(order, now);
        order.updated_at = now;
        Ok(Some(order.clone()))
    }

    async fn reset_stale_review_claims(&self, cutoff: DateTime<Utc>) -> Result<u64> {
        let mut state = self.state.lock();
        let mut reset = 0;
        for order in state.orders.values_mut() {
            let stale = order.review_check() == ReviewCheck::Sending
                && order.review_claimed_at().map_or(true, |at| at < cutoff);
            if stale {
                order.release_review_claim();
                order.updated_at = Utc::now();
                reset += 1;
            }
        }
        Ok(reset)
    }

    async fn find_by_id(&self, order_id: i64) -> Result<Option<Order>> {
        Ok(self.get(order_id))
    }

    async fn save(&self, order: &mut Order, columns: OrderColumns) -> Result<()> {
        let mut state = self.state.lock();
        let Some(stored) = state.orders.get_mut(&order.id) else {
            return Err(AuctionError::DatabaseError(format!(
                "order {} not found",
                order.id
            )));
        };
        stored.merge_columns(order, columns);
        stored.updated_at = Utc::now();
        *order = stored.clone();
        state.saves += 1;
        Ok(())
    }

    async fn locations_for(&self, order_id: i64) -> Result<Vec<Location>> {
        let state = self.state.lock();
        Ok(state
            .links
            .iter()
            .filter(|(linked_order, _)| *linked_order == order_id)
            .filter_map(|(_, location_id)| state.locations.get(location_id).cloned())
            .collect())
    }

    async fn attach_locations(&self, order_id: i64, location_ids: &[i64]) -> Result<()> {
        let mut state = self.state.lock();
        for location_id in location_ids {
            if !state.locations.contains_key(location_id) {
                return Err(AuctionError::DatabaseError(format!(
                    "location {location_id} does not exist"
                )));
            }
            if !state.links.contains(&(order_id, *location_id)) {
                state.links.push((order_id, *location_id));
            }
        }
        Ok(())
    }

    async fn media_for(&self, order_id: i64) -> Result<Vec<MediaAttachment>> {
        Ok(self
            .state
            .lock()
            .media
            .get(&order_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn submitter(&self, uid: i64) -> Result<Option<TelegramUser>> {
        Ok(self.state.lock().users.get(&uid).cloned())
    }
}
