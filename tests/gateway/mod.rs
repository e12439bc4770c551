//! Telegram gateway against a local HTTP stub of the Bot API
//!
//! The stub answers each method with a fixed status and body and counts the
//! calls, so the tests can see exactly what reached the upstream.

use auction_core::config::TelegramConfig;
use auction_core::gateway::{
    MediaAttachment, MediaKind, MessagingGateway, OutboundMessage, TelegramGateway,
};
use auction_core::resilience::RetryPolicy;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

const PHOTO_OK: &str = r#"{"ok":true,"result":{"message_id":10}}"#;
const TEXT_OK: &str = r#"{"ok":true,"result":{"message_id":11}}"#;
const BAD_GATEWAY: &str = "<html><body><h1>502 Bad Gateway</h1></body></html>";
const CHAT_NOT_FOUND: &str = r#"{"ok":false,"error_code":400,"description":"Bad Request: chat not found"}"#;

struct Route {
    method: &'static str,
    status: u16,
    body: &'static str,
}

struct StubApi {
    base_url: String,
    calls: Arc<Mutex<Vec<String>>>,
}

impl StubApi {
    async fn start(routes: Vec<Route>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base_url = format!("http://{}", listener.local_addr().unwrap());
        let calls = Arc::new(Mutex::new(Vec::new()));

        let routes = Arc::new(routes);
        let recorded = calls.clone();
        tokio::spawn(async move {
            while let Ok((socket, _)) = listener.accept().await {
                tokio::spawn(respond(socket, routes.clone(), recorded.clone()));
            }
        });

        Self { base_url, calls }
    }

    fn gateway(&self) -> TelegramGateway {
        TelegramGateway::new(&TelegramConfig {
            bot_token: "123456:TEST".into(),
            api_base_url: self.base_url.clone(),
            request_timeout_seconds: 5,
        })
        .unwrap()
    }

    fn count(&self, method: &str) -> usize {
        self.calls.lock().iter().filter(|m| *m == method).count()
    }
}

async fn respond(
    mut socket: TcpStream,
    routes: Arc<Vec<Route>>,
    calls: Arc<Mutex<Vec<String>>>,
) {
    let Some(path) = read_request_path(&mut socket).await else {
        return;
    };
    let method = path.rsplit('/').next().unwrap_or_default().to_string();
    calls.lock().push(method.clone());

    let (status, body) = routes
        .iter()
        .find(|route| route.method == method)
        .map(|route| (route.status, route.body))
        .unwrap_or((404, r#"{"ok":false,"error_code":404,"description":"Not Found"}"#));
    let reason = match status {
        200 => "OK",
        400 => "Bad Request",
        502 => "Bad Gateway",
        _ => "Not Found",
    };

    let response = format!(
        "HTTP/1.1 {status} {reason}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    );
    let _ = socket.write_all(response.as_bytes()).await;
    let _ = socket.shutdown().await;
}

/// Read one request fully and return its path
async fn read_request_path(socket: &mut TcpStream) -> Option<String> {
    let mut buffer = Vec::new();
    let mut chunk = [0_u8; 4096];

    let header_end = loop {
        let read = socket.read(&mut chunk).await.ok()?;
        if read == 0 {
            return None;
        }
        buffer.extend_from_slice(&chunk[..read]);
        if let Some(position) = buffer.windows(4).position(|w| w == b"\r\n\r\n") {
            break position + 4;
        }
    };

    let head = String::from_utf8_lossy(&buffer[..header_end]).to_string();
    let content_length = head
        .lines()
        .filter_map(|line| line.split_once(':'))
        .find(|(name, _)| name.eq_ignore_ascii_case("content-length"))
        .and_then(|(_, value)| value.trim().parse::<usize>().ok())
        .unwrap_or(0);

    while buffer.len() < header_end + content_length {
        let read = socket.read(&mut chunk).await.ok()?;
        if read == 0 {
            break;
        }
        buffer.extend_from_slice(&chunk[..read]);
    }

    head.split_whitespace().nth(1).map(str::to_string)
}

fn photo_post(text_len: usize) -> OutboundMessage {
    OutboundMessage::new("@Auction_Israel", "x".repeat(text_len)).with_media(vec![MediaAttachment {
        kind: MediaKind::Photo,
        file_id: "AgACAgQAAx".into(),
    }])
}

fn retry() -> RetryPolicy {
    RetryPolicy::new(3, Duration::from_millis(10)).unwrap()
}

#[tokio::test]
async fn test_overflow_text_gateway_error_posts_media_once() {
    let api = StubApi::start(vec![
        Route { method: "sendPhoto", status: 200, body: PHOTO_OK },
        Route { method: "sendMessage", status: 502, body: BAD_GATEWAY },
    ])
    .await;
    let gateway = api.gateway();
    let message = photo_post(1500);

    let outcome = retry()
        .run(|| gateway.send_message(message.clone()))
        .await
        .unwrap();

    assert!(outcome.is_ok());
    assert_eq!(outcome.message_ids, vec![10]);
    assert_eq!(api.count("sendPhoto"), 1);
    assert_eq!(api.count("sendMessage"), 1);
}

#[tokio::test]
async fn test_overflow_text_rejection_keeps_media_id() {
    let api = StubApi::start(vec![
        Route { method: "sendPhoto", status: 200, body: PHOTO_OK },
        Route { method: "sendMessage", status: 400, body: CHAT_NOT_FOUND },
    ])
    .await;
    let gateway = api.gateway();
    let message = photo_post(1500);

    let outcome = retry()
        .run(|| gateway.send_message(message.clone()))
        .await
        .unwrap();

    assert!(outcome.error.is_none());
    assert_eq!(outcome.last_message_id(), Some(10));
    assert_eq!(api.count("sendPhoto"), 1);
}

#[tokio::test]
async fn test_overflow_text_delivered_after_media() {
    let api = StubApi::start(vec![
        Route { method: "sendPhoto", status: 200, body: PHOTO_OK },
        Route { method: "sendMessage", status: 200, body: TEXT_OK },
    ])
    .await;
    let gateway = api.gateway();

    let outcome = gateway.send_message(photo_post(1500)).await.unwrap();

    assert_eq!(outcome.message_ids, vec![10, 11]);
    assert_eq!(outcome.last_message_id(), Some(11));
}

#[tokio::test]
async fn test_media_gateway_error_retried_alone() {
    let api = StubApi::start(vec![Route {
        method: "sendPhoto",
        status: 502,
        body: BAD_GATEWAY,
    }])
    .await;
    let gateway = api.gateway();
    let message = photo_post(1500);

    let outcome = retry()
        .run(|| gateway.send_message(message.clone()))
        .await
        .unwrap();

    assert!(outcome.is_transient_failure());
    assert_eq!(api.count("sendPhoto"), 3);
    assert_eq!(api.count("sendMessage"), 0);
}

#[tokio::test]
async fn test_short_caption_is_one_call() {
    let api = StubApi::start(vec![Route {
        method: "sendPhoto",
        status: 200,
        body: PHOTO_OK,
    }])
    .await;
    let gateway = api.gateway();

    let outcome = gateway.send_message(photo_post(200)).await.unwrap();

    assert_eq!(outcome.message_ids, vec![10]);
    assert_eq!(api.calls.lock().len(), 1);
}
