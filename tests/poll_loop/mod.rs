//! Poll loop driving a real worker under the paused clock

use crate::common::approved_order;
use auction_core::test_helpers::{
    test_config, InMemoryLogStore, InMemoryOrderStore, RecordingGateway,
};
use auction_core::workers::{AuctionPublisher, PollLoop};
use auction_core::AuctionStatus;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

#[tokio::test(start_paused = true)]
async fn test_publisher_drains_queue_then_idles() {
    let config = test_config();
    let store = Arc::new(InMemoryOrderStore::new());
    let first = approved_order(&store, "Sofa", Some(100));
    let second = approved_order(&store, "Table", Some(40));

    let publisher = AuctionPublisher::new(
        store.clone(),
        Arc::new(RecordingGateway::new()),
        Arc::new(InMemoryLogStore::new()),
        &config,
    )
    .unwrap();

    let started = Instant::now();
    let summary = PollLoop::new((&config.workers).into())
        .run(&publisher)
        .await
        .unwrap();

    // Each publish spends 18s waiting for a thread that never appears,
    // leaving 19 idle polls in the 55s window
    assert_eq!(summary.processed, 2);
    assert_eq!(summary.idle_sleeps, 19);
    assert_eq!(summary.iterations, 21);
    assert_eq!(started.elapsed(), Duration::from_secs(55));

    for order_id in [first.id, second.id] {
        assert_eq!(
            store.get(order_id).unwrap().auction_status(),
            Some(AuctionStatus::Published)
        );
    }
}

#[tokio::test(start_paused = true)]
async fn test_window_overrun_finishes_current_order() {
    let mut config = test_config();
    config.workers.max_execution_seconds = 10;
    let store = Arc::new(InMemoryOrderStore::new());
    approved_order(&store, "Sofa", Some(100));
    approved_order(&store, "Table", Some(40));

    let publisher = AuctionPublisher::new(
        store.clone(),
        Arc::new(RecordingGateway::new()),
        Arc::new(InMemoryLogStore::new()),
        &config,
    )
    .unwrap();

    let summary = PollLoop::new((&config.workers).into())
        .run(&publisher)
        .await
        .unwrap();

    // The deadline is checked between iterations only
    assert_eq!(summary.processed, 1);
    assert_eq!(summary.idle_sleeps, 0);
    assert_eq!(
        store.get(2).unwrap().auction_status(),
        None,
        "second order stays queued for the next run"
    );
}
