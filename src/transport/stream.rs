//! Re-framing of an upstream reply onto the inbound socket.
//!
//! The upstream status line is consumed here and replaced by a synthesized
//! `200 OK`. Framing follows the declared length: a known `Content-Length`
//! is passed through, anything else is re-framed as chunked with chunks of
//! at most [`MAX_CHUNK_SIZE`] bytes.

use crate::http::response::{relay_head, DEFAULT_CONTENT_TYPE};
use crate::transport::sink::{ReplySink, SinkWriter};
use crate::transport::TransportError;

/// Largest payload carried by one chunk.
pub const MAX_CHUNK_SIZE: usize = 8192;

/// Terminal chunk of a chunked body.
pub const LAST_CHUNK: &[u8] = b"0\r\n\r\n";

/// Per-exchange streaming state.
#[derive(Debug)]
pub struct StreamContext {
    headers_sent: bool,
    content_type: String,
    content_length: Option<u64>,
    body_bytes: u64,
}

impl Default for StreamContext {
    fn default() -> Self {
        Self::new()
    }
}

impl StreamContext {
    pub fn new() -> Self {
        Self {
            headers_sent: false,
            content_type: DEFAULT_CONTENT_TYPE.to_string(),
            content_length: None,
            body_bytes: 0,
        }
    }

    /// Record one upstream header. Only `Content-Type` and `Content-Length` matter.
    ///
    /// Headers seen after the head went out are ignored.
    pub fn observe_header(&mut self, name: &str, value: &str) {
        if self.headers_sent {
            return;
        }
        let value = value.trim();
        if name.eq_ignore_ascii_case("content-type") {
            self.content_type = value.to_string();
        } else if name.eq_ignore_ascii_case("content-length") {
            // An unparseable length switches to chunked framing.
            self.content_length = value.parse().ok();
        }
    }

    /// Whether the body is re-framed as chunked.
    pub fn is_chunked(&self) -> bool {
        self.content_length.is_none()
    }

    pub fn headers_sent(&self) -> bool {
        self.headers_sent
    }

    /// Body payload bytes forwarded so far, excluding chunk framing.
    pub fn body_bytes(&self) -> u64 {
        self.body_bytes
    }

    /// The synthesized head for the headers observed so far.
    pub fn head(&self) -> String {
        relay_head(&self.content_type, self.content_length)
    }

    /// Send the head once. Later calls are no-ops.
    pub async fn flush_head<S: ReplySink + ?Sized>(
        &mut self,
        writer: &mut SinkWriter<'_, S>,
    ) -> Result<(), TransportError> {
        if self.headers_sent {
            return Ok(());
        }
        writer.write_all(self.head().as_bytes()).await?;
        self.headers_sent = true;
        Ok(())
    }

    /// Forward one piece of upstream body.
    pub async fn forward<S: ReplySink + ?Sized>(
        &mut self,
        data: &[u8],
        writer: &mut SinkWriter<'_, S>,
    ) -> Result<(), TransportError> {
        self.flush_head(writer).await?;
        if data.is_empty() {
            return Ok(());
        }
        if self.is_chunked() {
            for piece in data.chunks(MAX_CHUNK_SIZE) {
                writer.write_all(&encode_chunk(piece)).await?;
            }
        } else {
            writer.write_all(data).await?;
        }
        self.body_bytes += data.len() as u64;
        Ok(())
    }

    /// Complete the reply after the upstream body ended without error.
    pub async fn finish<S: ReplySink + ?Sized>(
        &mut self,
        writer: &mut SinkWriter<'_, S>,
    ) -> Result<(), TransportError> {
        self.flush_head(writer).await?;
        if self.is_chunked() {
            writer.write_all(LAST_CHUNK).await?;
        }
        Ok(())
    }
}

/// `<hex len>\r\n<payload>\r\n`
pub fn encode_chunk(payload: &[u8]) -> Vec<u8> {
    let size_line = format!("{:x}\r\n", payload.len());
    let mut frame = Vec::with_capacity(size_line.len() + payload.len() + 2);
    frame.extend_from_slice(size_line.as_bytes());
    frame.extend_from_slice(payload);
    frame.extend_from_slice(b"\r\n");
    frame
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resilience::BackoffPolicy;

    #[test]
    fn chunk_encoding() {
        assert_eq!(encode_chunk(b"hello"), b"5\r\nhello\r\n");
        let big = vec![b'x'; 300];
        assert!(encode_chunk(&big).starts_with(b"12c\r\n"));
    }

    #[test]
    fn header_observation_is_case_insensitive() {
        let mut ctx = StreamContext::new();
        ctx.observe_header("content-TYPE", "application/x-msgpack");
        ctx.observe_header("Content-Length", " 42 ");
        assert!(!ctx.is_chunked());
        assert!(ctx.head().contains("Content-Type: application/x-msgpack\r\n"));
        assert!(ctx.head().contains("Content-Length: 42\r\n"));
    }

    #[test]
    fn bad_length_falls_back_to_chunked() {
        let mut ctx = StreamContext::new();
        ctx.observe_header("Content-Length", "lots");
        assert!(ctx.is_chunked());
        assert!(ctx.head().contains("Content-Type: application/octet-stream\r\n"));
    }

    #[test]
    fn zero_length_is_fixed_length() {
        let mut ctx = StreamContext::new();
        ctx.observe_header("Content-Length", "0");
        assert!(!ctx.is_chunked());
        assert!(ctx.head().contains("Content-Length: 0\r\n"));
    }

    #[tokio::test]
    async fn fixed_length_body_is_passed_through() {
        let mut out = Vec::new();
        let mut writer = SinkWriter::new(&mut out, BackoffPolicy::default());
        let mut ctx = StreamContext::new();
        ctx.observe_header("Content-Length", "6");

        ctx.forward(b"abc", &mut writer).await.unwrap();
        ctx.forward(b"def", &mut writer).await.unwrap();
        ctx.finish(&mut writer).await.unwrap();

        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("HTTP/1.1 200 OK\r\n"));
        assert!(text.ends_with("\r\n\r\nabcdef"));
        assert_eq!(ctx.body_bytes(), 6);
    }

    #[tokio::test]
    async fn chunked_body_is_split_and_terminated() {
        let mut out = Vec::new();
        let mut writer = SinkWriter::new(&mut out, BackoffPolicy::default());
        let mut ctx = StreamContext::new();

        let payload = vec![b'z'; MAX_CHUNK_SIZE + 10];
        ctx.forward(&payload, &mut writer).await.unwrap();
        ctx.finish(&mut writer).await.unwrap();

        let head = ctx.head();
        let body = &out[head.len()..];
        let mut expected = encode_chunk(&payload[..MAX_CHUNK_SIZE]);
        expected.extend_from_slice(&encode_chunk(&payload[MAX_CHUNK_SIZE..]));
        expected.extend_from_slice(LAST_CHUNK);
        assert_eq!(body, expected.as_slice());
    }

    #[tokio::test]
    async fn empty_reply_still_gets_a_head() {
        let mut out = Vec::new();
        let mut writer = SinkWriter::new(&mut out, BackoffPolicy::default());
        let mut ctx = StreamContext::new();
        ctx.observe_header("Content-Length", "0");
        ctx.finish(&mut writer).await.unwrap();

        assert_eq!(out, ctx.head().as_bytes());
        assert!(ctx.headers_sent());
    }

    #[tokio::test]
    async fn head_is_sent_once() {
        let mut out = Vec::new();
        let mut writer = SinkWriter::new(&mut out, BackoffPolicy::default());
        let mut ctx = StreamContext::new();
        ctx.flush_head(&mut writer).await.unwrap();
        ctx.flush_head(&mut writer).await.unwrap();
        ctx.observe_header("Content-Length", "3");

        assert!(ctx.is_chunked());
        assert_eq!(out, ctx.head().as_bytes());
    }
}
