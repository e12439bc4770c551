//! Admin notification worker scenarios

use crate::common::new_order;
use auction_core::gateway::GatewayOutcome;
use auction_core::models::{Location, TelegramUser};
use auction_core::store::OrderStore;
use auction_core::test_helpers::test_utils::TEST_ADMIN_CHAT;
use auction_core::test_helpers::{
    test_config, InMemoryOrderStore, RecordingGateway, StaticLocationResolver,
};
use auction_core::workers::{AdminNotifier, PollLoop, PollLoopConfig, PollWorker};
use auction_core::{AuctionError, ReviewCheck};
use chrono::{Duration as ChronoDuration, Utc};
use std::sync::Arc;
use std::time::Duration;

struct Harness {
    store: Arc<InMemoryOrderStore>,
    gateway: Arc<RecordingGateway>,
    resolver: Arc<StaticLocationResolver>,
    notifier: AdminNotifier,
}

fn harness(resolver: StaticLocationResolver) -> Harness {
    let store = Arc::new(InMemoryOrderStore::new());
    let gateway = Arc::new(RecordingGateway::new());
    let resolver = Arc::new(resolver);
    let notifier = AdminNotifier::new(
        store.clone(),
        gateway.clone(),
        resolver.clone(),
        &test_config(),
    )
    .unwrap();
    Harness {
        store,
        gateway,
        resolver,
        notifier,
    }
}

fn haifa() -> Location {
    Location {
        id: 7,
        city: Some("Haifa".into()),
        district: None,
        region: Some("Haifa District".into()),
        country: Some("Israel".into()),
    }
}

#[tokio::test]
async fn test_sweep_resets_only_stale_claims() {
    let h = harness(StaticLocationResolver::returning(vec![]));

    let mut stale = h.store.insert(new_order("Sofa", Some(100)));
    stale.claim_for_review(Utc::now() - ChronoDuration::minutes(10));
    h.store.put(stale.clone());

    let mut fresh = h.store.insert(new_order("Table", Some(40)));
    fresh.claim_for_review(Utc::now() - ChronoDuration::minutes(2));
    h.store.put(fresh.clone());

    h.notifier.prepare().await.unwrap();

    let stale = h.store.get(stale.id).unwrap();
    assert_eq!(stale.review_check(), ReviewCheck::New);
    assert_eq!(stale.review_claimed_at(), None);

    let fresh = h.store.get(fresh.id).unwrap();
    assert_eq!(fresh.review_check(), ReviewCheck::Sending);
    assert!(fresh.review_claimed_at().is_some());

    // Running the sweep again changes nothing
    assert_eq!(h.notifier.sweep_stale_claims().await.unwrap(), 0);
}

#[tokio::test]
async fn test_new_order_sent_with_review_buttons() {
    let h = harness(StaticLocationResolver::returning(vec![]));
    h.store.add_user(TelegramUser {
        uid: 501,
        username: Some("@seller".into()),
        first_name: Some("Dana".into()),
    });
    let order = h.store.insert(new_order("Sofa", Some(100)));

    assert!(h.notifier.process_next().await.unwrap());

    let stored = h.store.get(order.id).unwrap();
    assert_eq!(stored.review_check(), ReviewCheck::Sended);
    assert_eq!(stored.review_claimed_at(), None);

    let sent = h.gateway.sent_messages();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].destination, TEST_ADMIN_CHAT);
    assert_eq!(
        sent[0].tag.as_deref(),
        Some(format!("admin_order_{}", order.id).as_str())
    );
    assert!(sent[0].text.contains(&format!("New lot <b>#{}</b>", order.id)));
    assert!(sent[0].text.contains("💰 - 100₪"));
    assert!(sent[0].text.contains("👤 - @seller"));

    let keyboard = sent[0].keyboard.as_ref().unwrap();
    let callbacks: Vec<_> = keyboard.buttons().map(|b| b.callback_data.clone()).collect();
    assert_eq!(
        callbacks,
        vec![
            format!("admin_acceptOrder_{}", order.id),
            format!("admin_rejectOrder_{}", order.id)
        ]
    );

    // Sent orders leave the review queue
    assert!(!h.notifier.process_next().await.unwrap());
}

#[tokio::test]
async fn test_locations_resolved_and_linked() {
    let h = harness(StaticLocationResolver::returning(vec![7]));
    h.store.add_location(haifa());
    let order = h.store.insert(new_order("Sofa", Some(100)));

    assert!(h.notifier.process_next().await.unwrap());

    assert_eq!(h.resolver.calls(), vec!["Haifa".to_string()]);
    assert_eq!(h.store.linked_location_ids(order.id), vec![7]);

    let sent = h.gateway.sent_messages();
    assert!(sent[0]
        .text
        .contains("📍 - Haifa (Haifa, Haifa District, Israel)"));
}

#[tokio::test]
async fn test_linked_locations_skip_resolver() {
    let h = harness(StaticLocationResolver::returning(vec![7]));
    h.store.add_location(haifa());
    let order = h.store.insert(new_order("Sofa", Some(100)));
    h.store.attach_locations(order.id, &[7]).await.unwrap();

    assert!(h.notifier.process_next().await.unwrap());

    assert!(h.resolver.calls().is_empty());
    assert_eq!(h.store.linked_location_ids(order.id), vec![7]);
}

#[tokio::test]
async fn test_resolver_failure_is_not_fatal() {
    let h = harness(StaticLocationResolver::failing("geocoder offline"));
    let order = h.store.insert(new_order("Sofa", Some(100)));

    assert!(h.notifier.process_next().await.unwrap());

    let stored = h.store.get(order.id).unwrap();
    assert_eq!(stored.review_check(), ReviewCheck::Sended);
    assert!(!h.gateway.sent_messages()[0].text.contains("📍"));
}

#[tokio::test]
async fn test_send_failure_keeps_claim_and_errors() {
    let h = harness(StaticLocationResolver::returning(vec![]));
    let order = h.store.insert(new_order("Sofa", Some(100)));

    h.gateway
        .push_send(Err(AuctionError::GatewayError("connection refused".into())));

    let result = h.notifier.process_next().await;
    assert!(matches!(result, Err(AuctionError::GatewayError(_))));

    let stored = h.store.get(order.id).unwrap();
    assert_eq!(stored.review_check(), ReviewCheck::Sending);
    assert!(stored.review_claimed_at().is_some());
}

#[tokio::test]
async fn test_rejected_send_keeps_claim_and_errors() {
    let h = harness(StaticLocationResolver::returning(vec![]));
    let order = h.store.insert(new_order("Sofa", Some(100)));

    h.gateway
        .push_send(Ok(GatewayOutcome::failed(403, "bot was kicked from the group chat")));

    let result = h.notifier.process_next().await;
    assert!(matches!(result, Err(AuctionError::GatewayError(_))));
    assert_eq!(
        h.store.get(order.id).unwrap().review_check(),
        ReviewCheck::Sending
    );
}

#[tokio::test(start_paused = true)]
async fn test_send_failure_stops_poll_loop() {
    let h = harness(StaticLocationResolver::returning(vec![]));
    h.store.insert(new_order("Sofa", Some(100)));
    h.store.insert(new_order("Table", Some(40)));

    h.gateway
        .push_send(Err(AuctionError::GatewayError("connection refused".into())));

    let poll_loop = PollLoop::new(PollLoopConfig {
        max_execution_window: Duration::from_secs(55),
        idle_backoff: Duration::from_secs(1),
    });
    let result = poll_loop.run(&h.notifier).await;

    assert!(result.is_err());
    assert_eq!(h.gateway.send_count(), 1);
    assert_eq!(h.store.get(2).unwrap().review_check(), ReviewCheck::New);
}

#[tokio::test(start_paused = true)]
async fn test_poll_loop_resends_stale_claim_in_same_run() {
    let h = harness(StaticLocationResolver::returning(vec![]));
    let mut abandoned = h.store.insert(new_order("Sofa", Some(100)));
    abandoned.claim_for_review(Utc::now() - ChronoDuration::minutes(10));
    h.store.put(abandoned.clone());

    let poll_loop = PollLoop::new(PollLoopConfig {
        max_execution_window: Duration::from_secs(5),
        idle_backoff: Duration::from_secs(1),
    });
    let summary = poll_loop.run(&h.notifier).await.unwrap();

    // Only reachable if the sweep ran before the first claim
    assert_eq!(summary.processed, 1);
    assert_eq!(h.gateway.send_count(), 1);
    assert_eq!(
        h.store.get(abandoned.id).unwrap().review_check(),
        ReviewCheck::Sended
    );
}

#[test]
fn test_missing_admin_chat_is_configuration_error() {
    let mut config = test_config();
    config.admin.chat_id = None;

    let result = AdminNotifier::new(
        Arc::new(InMemoryOrderStore::new()),
        Arc::new(RecordingGateway::new()),
        Arc::new(StaticLocationResolver::returning(vec![])),
        &config,
    );

    match result {
        Err(e) => assert!(e.is_configuration()),
        Ok(_) => panic!("expected a configuration error"),
    }
}
