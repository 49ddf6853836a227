//! Inbound HTTP/1.1 request framing.
//!
//! # Responsibilities
//! - Accumulate bytes until the header terminator, then until the declared body length
//! - Split the request line, URI path and query string
//! - Report framing problems as `FramingError` (the caller drops the connection)
//!
//! # Design Decisions
//! - `Content-Length` is matched case-insensitively; absent or unparsable means 0
//! - The request line must be exactly three space-separated tokens
//! - For repeated query keys the first occurrence wins
//! - Query keys and values are form-decoded (`+` is a space)

use std::time::Duration;

use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt};

use crate::http::params::{decode_form_component, QueryParams};
use crate::net::connection::ConnectionState;

const HEADER_TERMINATOR: &[u8] = b"\r\n\r\n";
const CONTENT_LENGTH: &str = "content-length:";
const READ_CHUNK: usize = 4096;

/// Errors raised before a request can be dispatched.
#[derive(Debug, Error)]
pub enum FramingError {
    #[error("malformed request: no header terminator")]
    MissingHeaderTerminator,

    #[error("malformed request: body shorter than Content-Length ({received} of {declared} bytes)")]
    Truncated { declared: usize, received: usize },

    #[error("malformed request line: {0:?}")]
    MalformedRequestLine(String),

    #[error("request head is not valid UTF-8")]
    InvalidEncoding,

    #[error("request exceeds {limit} bytes")]
    TooLarge { limit: usize },

    #[error("timed out waiting for request bytes")]
    ReadTimeout,

    #[error("I/O error while reading request: {0}")]
    Io(#[from] std::io::Error),
}

/// Bounds applied while reading one request.
#[derive(Debug, Clone, Copy)]
pub struct ReadLimits {
    /// Maximum wait for any single read.
    pub read_timeout: Duration,
    /// Maximum size of head plus body.
    pub max_request_bytes: usize,
}

/// A framed inbound request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundRequest {
    pub method: String,
    pub path: String,
    pub version: String,
    pub query: QueryParams,
    pub body: Vec<u8>,
}

/// Read one request off `reader`.
///
/// Stops once the head and the declared body are buffered, or when the peer
/// closes. The returned bytes are not validated; see [`parse_request`].
pub async fn read_request<R>(
    reader: &mut R,
    limits: &ReadLimits,
    state: &mut ConnectionState,
) -> Result<Vec<u8>, FramingError>
where
    R: AsyncRead + Unpin,
{
    *state = ConnectionState::AwaitHeaders;
    let mut buf = Vec::with_capacity(READ_CHUNK);
    let mut chunk = [0u8; READ_CHUNK];

    loop {
        let n = match tokio::time::timeout(limits.read_timeout, reader.read(&mut chunk)).await {
            Ok(Ok(n)) => n,
            Ok(Err(e)) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Ok(Err(e)) => return Err(FramingError::Io(e)),
            Err(_) => return Err(FramingError::ReadTimeout),
        };
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);

        if let Some(head_end) = find_header_end(&buf) {
            let declared = parse_content_length(&buf[..head_end]);
            *state = ConnectionState::AwaitBody {
                content_length: declared,
            };
            let total = (head_end + HEADER_TERMINATOR.len())
                .checked_add(declared)
                .filter(|total| *total <= limits.max_request_bytes)
                .ok_or(FramingError::TooLarge {
                    limit: limits.max_request_bytes,
                })?;
            if buf.len() >= total {
                break;
            }
        } else if buf.len() > limits.max_request_bytes {
            return Err(FramingError::TooLarge {
                limit: limits.max_request_bytes,
            });
        }
    }

    Ok(buf)
}

/// Parse a buffered request into method, path, query and body.
pub fn parse_request(raw: &[u8]) -> Result<InboundRequest, FramingError> {
    let head_end = find_header_end(raw).ok_or(FramingError::MissingHeaderTerminator)?;
    let head = std::str::from_utf8(&raw[..head_end]).map_err(|_| FramingError::InvalidEncoding)?;

    let declared = parse_content_length(head.as_bytes());
    let body_start = head_end + HEADER_TERMINATOR.len();
    let available = raw.len() - body_start;
    if available < declared {
        return Err(FramingError::Truncated {
            declared,
            received: available,
        });
    }
    let body = raw[body_start..body_start + declared].to_vec();

    let request_line = head.split("\r\n").next().unwrap_or_default();
    let parts: Vec<&str> = request_line.split(' ').collect();
    let &[method, uri, version] = parts.as_slice() else {
        return Err(FramingError::MalformedRequestLine(request_line.to_string()));
    };

    let (path, query) = match uri.split_once('?') {
        Some((path, qs)) => (path, parse_query(qs)),
        None => (uri, QueryParams::new()),
    };

    Ok(InboundRequest {
        method: method.to_string(),
        path: path.to_string(),
        version: version.to_string(),
        query,
        body,
    })
}

/// Split `k1=v1&k2=v2`; pairs without `=` are dropped, first key wins.
pub fn parse_query(qs: &str) -> QueryParams {
    let mut params = QueryParams::new();
    for pair in qs.split('&') {
        if let Some((key, value)) = pair.split_once('=') {
            params.insert_if_absent(decode_form_component(key), decode_form_component(value));
        }
    }
    params
}

/// Value of the first `Content-Length` header line, or 0.
pub fn parse_content_length(head: &[u8]) -> usize {
    let head = String::from_utf8_lossy(head);
    for line in head.split('\n') {
        let line = line.trim_end_matches('\r');
        if line.len() >= CONTENT_LENGTH.len()
            && line.is_char_boundary(CONTENT_LENGTH.len())
            && line[..CONTENT_LENGTH.len()].eq_ignore_ascii_case(CONTENT_LENGTH)
        {
            return line[CONTENT_LENGTH.len()..].trim().parse().unwrap_or(0);
        }
    }
    0
}

/// Offset of `\r\n\r\n`, if present.
pub fn find_header_end(buf: &[u8]) -> Option<usize> {
    buf.windows(HEADER_TERMINATOR.len())
        .position(|w| w == HEADER_TERMINATOR)
}
