//! Outbound transport against a local mock origin.

use dream_relay::config::{TimeoutConfig, TransportConfig};
use dream_relay::http::{Method, Request};
use dream_relay::resilience::BackoffPolicy;
use dream_relay::transport::{Transport, TransportError};

mod common;

use common::{close_delimited_response, decode_chunked, split_reply, start_mock_upstream};

fn transport() -> Transport {
    let timeouts = TimeoutConfig {
        connect_secs: 5,
        request_secs: 10,
    };
    Transport::new(&timeouts, &TransportConfig::default()).unwrap()
}

#[tokio::test]
async fn error_status_is_a_successful_exchange() {
    let upstream = start_mock_upstream(
        b"HTTP/1.1 404 Not Found\r\nContent-Length: 4\r\nX-Trace: abc\r\nConnection: close\r\n\r\ngone".to_vec(),
    )
    .await;

    let mut request = Request::new(format!("{}/api/v1/thing", upstream.base_url()));
    request.set_query_param("k", "v w");
    let reply = transport().execute(&request).await.unwrap();

    assert_eq!(reply.status_code, 404);
    assert_eq!(reply.body, b"gone");
    assert_eq!(reply.headers.get_ignore_case("x-trace"), Some("abc"));
    assert!(upstream.requests()[0].starts_with("get /api/v1/thing?k=v%20w http/1.1\r\n"));
}

#[tokio::test]
async fn post_carries_the_body() {
    let upstream = start_mock_upstream(b"HTTP/1.1 201 Created\r\nContent-Length: 0\r\n\r\n".to_vec()).await;

    let mut request = Request::new(format!("{}/upload", upstream.base_url()));
    request.set_method(Method::Post);
    request.set_body_text("hello");
    let reply = transport().execute(&request).await.unwrap();

    assert_eq!(reply.status_code, 201);
    let sent = &upstream.requests()[0];
    assert!(sent.starts_with("post /upload http/1.1\r\n"));
    assert!(sent.contains("content-length: 5\r\n"));
}

#[tokio::test]
async fn refused_connection_is_a_connect_error() {
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };

    let request = Request::new(format!("http://127.0.0.1:{}/", port));
    let err = transport().execute(&request).await.unwrap_err();
    assert!(matches!(err, TransportError::Connect(_)), "{:?}", err);
}

#[tokio::test]
async fn streaming_into_a_buffer() {
    let body = vec![b'q'; 10_000];
    let upstream = start_mock_upstream(close_delimited_response(&body)).await;

    let request = Request::new(format!("{}/blob", upstream.base_url()));
    let mut sink = Vec::new();
    let summary = transport()
        .execute_streaming(&request, &mut sink, BackoffPolicy::default())
        .await
        .unwrap();

    assert!(summary.chunked);
    assert_eq!(summary.upstream_status, 200);
    assert_eq!(summary.body_bytes, 10_000);

    let (head, framed) = split_reply(&sink);
    assert!(head.contains("Transfer-Encoding: chunked\r\n"));
    let (payload, _) = decode_chunked(&framed);
    assert_eq!(payload, body);
}

#[tokio::test]
async fn reply_headers_follow_the_client_header_map() {
    let upstream = start_mock_upstream(
        b"HTTP/1.1 200 OK\r\nX-Beta: 1\r\nX-Alpha: 2\r\nX-Beta: 3\r\nContent-Length: 0\r\nConnection: close\r\n\r\n"
            .to_vec(),
    )
    .await;

    let request = Request::new(format!("{}/headers", upstream.base_url()));
    let reply = transport().execute(&request).await.unwrap();

    let names: Vec<&str> = reply.headers.iter().map(|(name, _)| name).collect();
    let beta = names.iter().position(|n| *n == "x-beta").unwrap();
    let alpha = names.iter().position(|n| *n == "x-alpha").unwrap();
    assert!(beta < alpha);
    assert_eq!(names.iter().filter(|n| **n == "x-beta").count(), 1);

    assert_eq!(reply.headers.get("x-beta"), Some("3"));
    assert_eq!(reply.headers.get("X-Beta"), None);
    assert_eq!(reply.headers.get_ignore_case("X-Alpha"), Some("2"));
}

#[tokio::test]
async fn truncated_upstream_body_fails_the_stream() {
    let upstream = start_mock_upstream(
        b"HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\n\r\n5\r\nhello\r\n".to_vec(),
    )
    .await;

    let request = Request::new(format!("{}/partial", upstream.base_url()));
    let mut sink = Vec::new();
    let err = transport()
        .execute_streaming(&request, &mut sink, BackoffPolicy::default())
        .await
        .unwrap_err();

    assert!(!matches!(err, TransportError::Connect(_)), "{:?}", err);
    if !sink.is_empty() {
        let (_, framed) = split_reply(&sink);
        assert!(!framed.windows(5).any(|w| w == b"0\r\n\r\n"));
    }
}
