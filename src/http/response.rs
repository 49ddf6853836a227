//! Reply model and the relay's canned inbound responses.
//!
//! # Design Decisions
//! - `Reply` is filled once by the transport and not mutated afterwards
//! - Error responses are status line plus `Content-Length: 0`, no body

use crate::http::params::HeaderFields;

/// Buffered result of one outbound exchange.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reply {
    pub headers: HeaderFields,
    pub body: Vec<u8>,
    pub status_code: u16,
}

impl Reply {
    pub fn body_text(&self) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }
}

/// `400 Bad Request` with an empty body.
pub const BAD_REQUEST: &[u8] = b"HTTP/1.1 400 Bad Request\r\nContent-Length: 0\r\n\r\n";

/// `404 Not Found` with an empty body.
pub const NOT_FOUND: &[u8] = b"HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\n\r\n";

/// Content type used when the upstream does not declare one.
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Head of a relayed reply.
///
/// `Some(len)` frames the body by length, `None` switches to chunked framing.
pub fn relay_head(content_type: &str, content_length: Option<u64>) -> String {
    let mut head = String::from("HTTP/1.1 200 OK\r\n");
    head.push_str(&format!("Content-Type: {}\r\n", content_type));
    match content_length {
        Some(len) => head.push_str(&format!("Content-Length: {}\r\n", len)),
        None => head.push_str("Transfer-Encoding: chunked\r\n"),
    }
    head.push_str("Connection: close\r\n\r\n");
    head
}
