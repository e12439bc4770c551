//! Comment thread discovery over the request log

use auction_core::config::ThreadDiscoveryConfig;
use auction_core::models::{AutoForwardQuery, LogStore, PgLogStore};
use auction_core::test_helpers::auto_forward_payload;
use auction_core::test_helpers::test_utils::{
    TEST_CHANNEL, TEST_CHANNEL_ID, TEST_DISCUSSION_GROUP, TEST_WEBHOOK_URL,
};
use auction_core::test_helpers::InMemoryLogStore;
use auction_core::thread_discovery::ThreadDiscoveryScanner;
use chrono::Utc;
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

fn scanner(logs: Arc<InMemoryLogStore>, discussion_group: Option<i64>) -> ThreadDiscoveryScanner {
    ThreadDiscoveryScanner::new(
        logs,
        TEST_CHANNEL,
        discussion_group,
        ThreadDiscoveryConfig::default(),
    )
}

#[tokio::test(start_paused = true)]
async fn test_gives_up_after_max_attempts() {
    let logs = Arc::new(InMemoryLogStore::new());
    let started = Instant::now();

    let found = scanner(logs.clone(), Some(TEST_DISCUSSION_GROUP))
        .find_thread_id(777)
        .await
        .unwrap();

    assert_eq!(found, None);
    assert_eq!(logs.query_count(), 10);
    // Nine intervals between ten attempts
    assert_eq!(started.elapsed(), Duration::from_secs(18));
}

#[tokio::test(start_paused = true)]
async fn test_finds_late_auto_forward() {
    let logs = Arc::new(InMemoryLogStore::new());
    logs.record_after(
        2,
        TEST_WEBHOOK_URL,
        &auto_forward_payload(42, 777, TEST_CHANNEL_ID, TEST_DISCUSSION_GROUP),
    );
    let started = Instant::now();

    let found = scanner(logs.clone(), Some(TEST_DISCUSSION_GROUP))
        .find_thread_id(777)
        .await
        .unwrap();

    assert_eq!(found, Some(42));
    assert_eq!(logs.query_count(), 3);
    assert_eq!(started.elapsed(), Duration::from_secs(4));
}

#[tokio::test(start_paused = true)]
async fn test_ignores_forwards_of_other_posts() {
    let logs = Arc::new(InMemoryLogStore::new());
    logs.record(
        TEST_WEBHOOK_URL,
        &auto_forward_payload(41, 776, TEST_CHANNEL_ID, TEST_DISCUSSION_GROUP),
    );
    logs.record(
        "https://bot.example/api/telegram/other_webhook",
        &auto_forward_payload(43, 777, TEST_CHANNEL_ID, TEST_DISCUSSION_GROUP),
    );

    let found = scanner(logs, Some(TEST_DISCUSSION_GROUP))
        .find_thread_id(777)
        .await
        .unwrap();

    assert_eq!(found, None);
}

#[tokio::test(start_paused = true)]
async fn test_rejects_forward_from_foreign_channel() {
    let logs = Arc::new(InMemoryLogStore::new());
    logs.record(
        TEST_WEBHOOK_URL,
        &auto_forward_payload(42, 777, -1009999, TEST_DISCUSSION_GROUP),
    );

    let found = scanner(logs, Some(TEST_DISCUSSION_GROUP))
        .find_thread_id(777)
        .await
        .unwrap();

    assert_eq!(found, None);
}

#[tokio::test(start_paused = true)]
async fn test_missing_discussion_group_skips_lookup() {
    let logs = Arc::new(InMemoryLogStore::new());
    logs.record(
        TEST_WEBHOOK_URL,
        &auto_forward_payload(42, 777, TEST_CHANNEL_ID, TEST_DISCUSSION_GROUP),
    );

    let found = scanner(logs.clone(), None).find_thread_id(777).await.unwrap();

    assert_eq!(found, None);
    assert_eq!(logs.query_count(), 0);
}

// PostgreSQL

async fn insert_request_log(pool: &PgPool, url: &str, body: &str, age_minutes: i32) {
    sqlx::query(
        "INSERT INTO request_logs (method, url, request_data, created_at) \
         VALUES ('POST', $1, $2, NOW() - make_interval(mins => $3))",
    )
    .bind(url)
    .bind(body)
    .bind(age_minutes)
    .execute(pool)
    .await
    .unwrap();
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires PostgreSQL"]
async fn test_pg_scanner_finds_auto_forward(pool: PgPool) {
    let forward = |thread_id, channel_message_id| {
        auto_forward_payload(thread_id, channel_message_id, TEST_CHANNEL_ID, TEST_DISCUSSION_GROUP)
    };
    insert_request_log(&pool, TEST_WEBHOOK_URL, &forward(43, 778), 0).await;
    insert_request_log(
        &pool,
        "https://bot.example/api/telegram/other_webhook",
        &forward(44, 777),
        0,
    )
    .await;
    insert_request_log(&pool, TEST_WEBHOOK_URL, &forward(42, 777), 0).await;

    let found = ThreadDiscoveryScanner::new(
        Arc::new(PgLogStore::new(pool)),
        TEST_CHANNEL,
        Some(TEST_DISCUSSION_GROUP),
        ThreadDiscoveryConfig::default(),
    )
    .find_thread_id(777)
    .await
    .unwrap();

    assert_eq!(found, Some(42));
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires PostgreSQL"]
async fn test_pg_log_store_applies_lookback_and_limit(pool: PgPool) {
    for (thread_id, age_minutes) in [(41, 10), (42, 2), (43, 0)] {
        let body = auto_forward_payload(thread_id, 777, TEST_CHANNEL_ID, TEST_DISCUSSION_GROUP);
        insert_request_log(&pool, TEST_WEBHOOK_URL, &body, age_minutes).await;
    }

    let store = PgLogStore::new(pool);
    let mut query = AutoForwardQuery {
        url_tag: ThreadDiscoveryConfig::default().webhook_url_tag,
        received_since: Utc::now() - chrono::Duration::minutes(5),
        forward_from_message_id: 777,
        discussion_group_id: TEST_DISCUSSION_GROUP,
        limit: 1,
    };

    let newest = store.recent_auto_forwards(&query).await.unwrap();
    assert_eq!(newest.len(), 1);
    assert!(newest[0]
        .request_data
        .as_deref()
        .unwrap()
        .contains(r#""message_id":43"#));

    // The ten-minute-old record is outside the lookback window
    query.limit = 10;
    let recent = store.recent_auto_forwards(&query).await.unwrap();
    assert_eq!(recent.len(), 2);
    assert!(recent.iter().all(|record| query.matches(record)));
}
