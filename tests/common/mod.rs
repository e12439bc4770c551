//! Shared fixtures for the integration tests

use auction_core::models::{NewOrder, Order};
use auction_core::test_helpers::InMemoryOrderStore;

pub fn new_order(lot_name: &str, bid: Option<i64>) -> NewOrder {
    NewOrder {
        uid: 501,
        text: format!("{lot_name} in good condition"),
        lot_name: Some(lot_name.to_string()),
        bid,
        locations: Some("Haifa".to_string()),
    }
}

/// Insert an order the admin has already accepted
pub fn approved_order(store: &InMemoryOrderStore, lot_name: &str, bid: Option<i64>) -> Order {
    let mut order = store.insert(new_order(lot_name, bid));
    order.record_review_decision(true);
    store.put(order.clone());
    order
}
