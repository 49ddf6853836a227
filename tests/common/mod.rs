//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use dream_relay::config::ListenerConfig;
use dream_relay::{PollOutcome, RelayConfig, RelayServer};

/// Raw-TCP upstream that records request heads and answers with canned bytes.
pub struct MockUpstream {
    pub addr: SocketAddr,
    requests: Arc<Mutex<Vec<String>>>,
}

impl MockUpstream {
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Request heads received so far, lowercased.
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

/// Start a mock upstream that answers every request with `response`.
pub async fn start_mock_upstream(response: Vec<u8>) -> MockUpstream {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let requests = Arc::new(Mutex::new(Vec::new()));
    let recorded = requests.clone();
    let response = Arc::new(response);

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    let recorded = recorded.clone();
                    let response = response.clone();
                    tokio::spawn(async move {
                        let head = read_head(&mut socket).await;
                        recorded.lock().unwrap().push(head.to_lowercase());
                        let _ = socket.write_all(&response).await;
                        let _ = socket.shutdown().await;
                        tokio::time::sleep(Duration::from_millis(10)).await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    MockUpstream { addr, requests }
}

/// `200 OK` with a declared length.
pub fn fixed_length_response(content_type: &str, body: &[u8]) -> Vec<u8> {
    let mut out = format!(
        "HTTP/1.1 200 OK\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        content_type,
        body.len()
    )
    .into_bytes();
    out.extend_from_slice(body);
    out
}

/// `200 OK` whose body ends when the connection closes.
pub fn close_delimited_response(body: &[u8]) -> Vec<u8> {
    let mut out = b"HTTP/1.1 200 OK\r\nConnection: close\r\n\r\n".to_vec();
    out.extend_from_slice(body);
    out
}

async fn read_head(socket: &mut TcpStream) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    loop {
        match socket.read(&mut chunk).await {
            Ok(0) | Err(_) => break,
            Ok(n) => {
                buf.extend_from_slice(&chunk[..n]);
                if buf.windows(4).any(|w| w == b"\r\n\r\n") {
                    break;
                }
            }
        }
    }
    String::from_utf8_lossy(&buf).into_owned()
}

/// Loopback relay config pointed at `base_url`.
pub fn relay_config(base_url: &str) -> RelayConfig {
    let mut config = RelayConfig {
        listener: ListenerConfig {
            bind_address: "127.0.0.1".to_string(),
            ..ListenerConfig::default()
        },
        ..RelayConfig::default()
    };
    config.upstream.base_url = base_url.to_string();
    config.timeouts.connect_secs = 5;
    config.timeouts.request_secs = 10;
    config
}

/// Poll until one connection has been served.
pub async fn serve_one(relay: &RelayServer) {
    for _ in 0..400 {
        if let PollOutcome::Served(_) = relay.poll_once().await.unwrap() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("no connection reached the relay");
}

/// Send `raw` to the relay, half-close, and collect everything it answers.
pub async fn exchange(relay: &RelayServer, raw: &[u8]) -> Vec<u8> {
    let addr = relay.local_addr().expect("relay must be started");
    let raw = raw.to_vec();
    let client = tokio::spawn(async move {
        let mut stream = TcpStream::connect(addr).await.unwrap();
        stream.write_all(&raw).await.unwrap();
        let _ = stream.shutdown().await;
        let mut out = Vec::new();
        let _ = stream.read_to_end(&mut out).await;
        out
    });

    serve_one(relay).await;
    client.await.unwrap()
}

/// Split a reply into its head and body.
pub fn split_reply(reply: &[u8]) -> (String, Vec<u8>) {
    let pos = reply
        .windows(4)
        .position(|w| w == b"\r\n\r\n")
        .expect("reply has a head");
    (
        String::from_utf8_lossy(&reply[..pos + 4]).into_owned(),
        reply[pos + 4..].to_vec(),
    )
}

/// Decode a chunked body, returning the payload and every chunk size.
pub fn decode_chunked(mut body: &[u8]) -> (Vec<u8>, Vec<usize>) {
    let mut payload = Vec::new();
    let mut sizes = Vec::new();
    loop {
        let line_end = body
            .windows(2)
            .position(|w| w == b"\r\n")
            .expect("chunk size line");
        let size = usize::from_str_radix(std::str::from_utf8(&body[..line_end]).unwrap(), 16).unwrap();
        body = &body[line_end + 2..];
        sizes.push(size);
        if size == 0 {
            assert_eq!(body, b"\r\n", "terminal chunk must close the body");
            return (payload, sizes);
        }
        payload.extend_from_slice(&body[..size]);
        assert_eq!(&body[size..size + 2], b"\r\n");
        body = &body[size + 2..];
    }
}
