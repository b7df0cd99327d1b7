//! Transport-level failure scenarios driven by raw TCP servers, for behavior
//! wiremock cannot express (dropped connections, refused connects, bodies cut
//! mid-stream).

use booker_client::{ApiClient, Error, Payload, RetryPolicy};
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

const UNAVAILABLE: &[u8] =
    b"HTTP/1.1 503 Service Unavailable\r\nContent-Length: 0\r\nConnection: close\r\n\r\n";

const TRUNCATED_NOT_FOUND: &[u8] =
    b"HTTP/1.1 404 Not Found\r\nContent-Type: application/json\r\nContent-Length: 50\r\nConnection: close\r\n\r\n{\"err";

const TRUNCATED_OK: &[u8] =
    b"HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: 50\r\nConnection: close\r\n\r\n[1,";

const EMPTY_LIST: &[u8] =
    b"HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: 2\r\nConnection: close\r\n\r\n[]";

fn fast_retries(total: usize) -> RetryPolicy {
    RetryPolicy::default()
        .with_total(total)
        .with_backoff_factor(Duration::from_millis(10))
}

/// Reads until the end of the request head. Bodies in these tests are small
/// enough to arrive in the same segment.
async fn read_request_head(stream: &mut TcpStream) {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    loop {
        match stream.read(&mut chunk).await {
            Ok(0) | Err(_) => return,
            Ok(n) => {
                buf.extend_from_slice(&chunk[..n]);
                if buf.windows(4).any(|w| w == b"\r\n\r\n") {
                    return;
                }
            }
        }
    }
}

/// Serves `UNAVAILABLE` to the first `unavailable` connections, then reads the
/// request and drops every later connection without answering.
async fn spawn_flaky_server(unavailable: usize) -> (String, Arc<AtomicUsize>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let accepted = Arc::new(AtomicUsize::new(0));
    let accepted_clone = accepted.clone();

    tokio::spawn(async move {
        loop {
            let Ok((mut stream, _)) = listener.accept().await else {
                return;
            };
            let seen = accepted_clone.fetch_add(1, Ordering::SeqCst);
            read_request_head(&mut stream).await;
            if seen < unavailable {
                let _ = stream.write_all(UNAVAILABLE).await;
                let _ = stream.shutdown().await;
            }
            drop(stream);
        }
    });

    (format!("http://{}", addr), accepted)
}

/// Answers connection `n` with `replies[n]` (the last reply repeats), then closes.
/// Replies may advertise a longer body than they carry to cut it mid-stream.
async fn spawn_scripted_server(replies: Vec<&'static [u8]>) -> (String, Arc<AtomicUsize>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let accepted = Arc::new(AtomicUsize::new(0));
    let accepted_clone = accepted.clone();

    tokio::spawn(async move {
        loop {
            let Ok((mut stream, _)) = listener.accept().await else {
                return;
            };
            let seen = accepted_clone.fetch_add(1, Ordering::SeqCst);
            read_request_head(&mut stream).await;
            let reply = replies[seen.min(replies.len() - 1)];
            let _ = stream.write_all(reply).await;
            let _ = stream.shutdown().await;
        }
    });

    (format!("http://{}", addr), accepted)
}

async fn closed_port_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}", addr)
}

#[tokio::test]
async fn test_unavailable_then_reset_exhausts_as_network_failure() {
    let (base_url, accepted) = spawn_flaky_server(3).await;

    let client = ApiClient::builder()
        .base_url(&base_url)
        .unwrap()
        .retry_policy(fast_retries(3))
        .build()
        .unwrap();

    let err = client.get("/booking").await.unwrap_err();

    assert!(
        matches!(err, Error::Network { .. }),
        "Expected network failure, got {:?}",
        err
    );
    assert_eq!(err.status_code(), None);
    assert!(err.payload().is_none());
    assert_eq!(err.attempts(), Some(4));
    assert_eq!(accepted.load(Ordering::SeqCst), 4);
}

#[tokio::test]
async fn test_post_is_not_replayed_after_reset() {
    let (base_url, accepted) = spawn_flaky_server(0).await;

    let client = ApiClient::builder()
        .base_url(&base_url)
        .unwrap()
        .retry_policy(fast_retries(3))
        .build()
        .unwrap();

    let payload = Payload::try_from(json!({"firstname": "Alex"})).unwrap();
    let err = client.post("/booking", payload).await.unwrap_err();

    assert!(err.is_network_failure());
    assert_eq!(err.attempts(), Some(1));
    assert_eq!(accepted.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_connection_refused_is_retried_for_every_method() {
    let base_url = closed_port_url().await;

    let client = ApiClient::builder()
        .base_url(&base_url)
        .unwrap()
        .retry_policy(fast_retries(2))
        .build()
        .unwrap();

    let err = client.get("/booking").await.unwrap_err();
    assert!(matches!(err, Error::Network { .. }));
    assert_eq!(err.status_code(), None);
    assert_eq!(err.attempts(), Some(3));

    let payload = Payload::try_from(json!({"firstname": "Alex"})).unwrap();
    let err = client.post("/booking", payload).await.unwrap_err();
    assert!(matches!(err, Error::Network { .. }));
    assert_eq!(err.attempts(), Some(3));
}

#[tokio::test]
async fn test_disabled_retries_make_one_attempt() {
    let (base_url, accepted) = spawn_flaky_server(usize::MAX).await;

    let client = ApiClient::builder()
        .base_url(&base_url)
        .unwrap()
        .retry_policy(RetryPolicy::none())
        .build()
        .unwrap();

    let err = client.get("/booking").await.unwrap_err();

    assert_eq!(err.status_code(), Some(503));
    assert_eq!(accepted.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_unreadable_error_body_keeps_status() {
    let (base_url, accepted) = spawn_scripted_server(vec![TRUNCATED_NOT_FOUND]).await;

    let client = ApiClient::builder()
        .base_url(&base_url)
        .unwrap()
        .retry_policy(RetryPolicy::none())
        .build()
        .unwrap();

    let err = client.get("/booking/1").await.unwrap_err();

    match &err {
        Error::HttpError {
            status,
            raw_response,
            payload,
            ..
        } => {
            assert_eq!(status.as_u16(), 404);
            assert!(raw_response.is_empty());
            assert!(payload.is_none());
        }
        other => panic!("Expected HttpError, got {:?}", other),
    }
    assert_eq!(err.status_code(), Some(404));
    assert_eq!(accepted.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_unreadable_error_body_keeps_status_after_retries() {
    let (base_url, accepted) = spawn_scripted_server(vec![TRUNCATED_NOT_FOUND]).await;

    let client = ApiClient::builder()
        .base_url(&base_url)
        .unwrap()
        .retry_policy(fast_retries(2))
        .build()
        .unwrap();

    let err = client.get("/booking/1").await.unwrap_err();

    assert_eq!(err.status_code(), Some(404));
    assert!(err.payload().is_none());
    assert_eq!(accepted.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_body_cut_mid_stream_is_retried() {
    let (base_url, accepted) = spawn_scripted_server(vec![TRUNCATED_OK, EMPTY_LIST]).await;

    let client = ApiClient::builder()
        .base_url(&base_url)
        .unwrap()
        .retry_policy(fast_retries(3))
        .build()
        .unwrap();

    let response = client.get("/booking").await.unwrap();

    assert_eq!(response.status_code(), 200);
    assert_eq!(response.attempts, 2);
    assert_eq!(response.text(), "[]");
    assert_eq!(accepted.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_body_cut_mid_stream_is_not_replayed_for_post() {
    let (base_url, accepted) = spawn_scripted_server(vec![TRUNCATED_OK, EMPTY_LIST]).await;

    let client = ApiClient::builder()
        .base_url(&base_url)
        .unwrap()
        .retry_policy(fast_retries(3))
        .build()
        .unwrap();

    let payload = Payload::try_from(json!({"firstname": "Alex"})).unwrap();
    let err = client.post("/booking", payload).await.unwrap_err();

    assert!(matches!(err, Error::Network { .. }), "got {:?}", err);
    assert_eq!(err.status_code(), None);
    assert_eq!(err.attempts(), Some(1));
    assert_eq!(accepted.load(Ordering::SeqCst), 1);
}
