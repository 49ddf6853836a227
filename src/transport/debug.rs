//! Request dumps produced instead of contacting the origin.
//!
//! Debug mode never opens an outbound connection. The dump lists the
//! request the relay would have sent, followed by a small diagnostic block.

use std::fmt::Write as _;
use std::time::Instant;

use url::Url;

use crate::http::request::Request;

/// Status reported for a dumped request.
pub const DEBUG_STATUS: u16 = 218;

/// Reason phrase paired with [`DEBUG_STATUS`].
pub const DEBUG_REASON: &str = "This is fine";

const DEFAULT_USER_AGENT: &str = concat!("dream-relay/", env!("CARGO_PKG_VERSION"));

/// Render the dump for `request`. `started` is when the request began processing.
pub fn render_dump(request: &Request, started: Instant) -> String {
    let full_url = request.build_url_with_params();
    let parsed = Url::parse(&full_url).ok();

    let (path, host, port) = match &parsed {
        Some(url) => {
            let mut path = url.path().to_string();
            if let Some(query) = url.query() {
                path.push('?');
                path.push_str(query);
            }
            let host = url.host_str().unwrap_or_default().to_string();
            (path, host, url.port_or_known_default().unwrap_or(0))
        }
        None => ("/".to_string(), String::new(), 0),
    };

    let mut head = String::new();
    let _ = write!(head, "{} {} HTTP/1.1\r\n", request.method(), path);
    match parsed.as_ref().and_then(Url::port) {
        Some(explicit) => {
            let _ = write!(head, "Host: {}:{}\r\n", host, explicit);
        }
        None => {
            let _ = write!(head, "Host: {}\r\n", host);
        }
    }
    for (name, value) in request.headers().iter() {
        if name.eq_ignore_ascii_case("authorization") {
            let _ = write!(head, "{}: {}\r\n", name, redact(value));
        } else {
            let _ = write!(head, "{}: {}\r\n", name, value);
        }
    }
    if !request.headers().contains_ignore_case("user-agent") {
        let _ = write!(head, "User-Agent: {}\r\n", DEFAULT_USER_AGENT);
    }

    let upload = if request.method().carries_body() {
        request.body()
    } else {
        &[]
    };
    if request.method().carries_body() && !request.headers().contains_ignore_case("content-length") {
        let _ = write!(head, "Content-Length: {}\r\n", upload.len());
    }
    head.push_str("\r\n");

    let mut dump = head.clone();
    dump.push_str("Body:\r\n");
    dump.push_str(&String::from_utf8_lossy(upload));
    dump.push_str("\r\n\r\n--- DEBUG INFO ---\r\n");
    let _ = write!(dump, "Response Code: 0\r\n");
    let _ = write!(dump, "Total Time: {:.6}s\r\n", started.elapsed().as_secs_f64());
    let _ = write!(dump, "Header Size: {} bytes\r\n", head.len());
    let _ = write!(dump, "Request Size: {} bytes\r\n", head.len() + upload.len());
    let _ = write!(dump, "Upload Size: {} bytes\r\n", upload.len());
    let _ = write!(dump, "Primary Host: {}\r\n", host);
    let _ = write!(dump, "Primary Port: {}\r\n", port);
    dump
}

/// Head written before a streamed dump.
pub fn stream_head(dump_len: usize) -> String {
    format!(
        "HTTP/1.1 {} {}\r\nContent-Type: application/octet-stream\r\nContent-Length: {}\r\n\r\n",
        DEBUG_STATUS, DEBUG_REASON, dump_len
    )
}

/// Keep the scheme, hide the secret.
fn redact(value: &str) -> String {
    match value.split_once(' ') {
        Some((scheme, _)) => format!("{} <redacted>", scheme),
        None => "<redacted>".to_string(),
    }
}
