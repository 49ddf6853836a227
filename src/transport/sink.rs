//! Non-blocking reply sinks and backpressure-aware writes.
//!
//! # Design Decisions
//! - A sink only offers `try_write`; waiting is the writer's job
//! - Would-block is retried with bounded exponential backoff; the attempt
//!   counter resets after any progress
//! - Broken pipe, reset and zero-length writes abort immediately

use std::io;

use crate::observability::metrics;
use crate::resilience::BackoffPolicy;
use crate::transport::TransportError;

/// Destination of a streamed reply.
pub trait ReplySink {
    /// Write as much of `buf` as possible without blocking.
    ///
    /// Returns `ErrorKind::WouldBlock` when nothing can be written yet.
    fn try_write(&mut self, buf: &[u8]) -> io::Result<usize>;
}

impl ReplySink for tokio::net::TcpStream {
    fn try_write(&mut self, buf: &[u8]) -> io::Result<usize> {
        tokio::net::TcpStream::try_write(self, buf)
    }
}

impl ReplySink for Vec<u8> {
    fn try_write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.extend_from_slice(buf);
        Ok(buf.len())
    }
}

impl<S: ReplySink + ?Sized> ReplySink for &mut S {
    fn try_write(&mut self, buf: &[u8]) -> io::Result<usize> {
        (**self).try_write(buf)
    }
}

/// Writes whole buffers to a [`ReplySink`], waiting out backpressure.
pub struct SinkWriter<'a, S: ?Sized> {
    sink: &'a mut S,
    policy: BackoffPolicy,
    bytes_written: u64,
    retries: u64,
}

impl<'a, S: ReplySink + ?Sized> SinkWriter<'a, S> {
    pub fn new(sink: &'a mut S, policy: BackoffPolicy) -> Self {
        Self {
            sink,
            policy,
            bytes_written: 0,
            retries: 0,
        }
    }

    /// Write all of `data` or fail.
    pub async fn write_all(&mut self, mut data: &[u8]) -> Result<(), TransportError> {
        let mut attempt = 0u32;
        while !data.is_empty() {
            match self.sink.try_write(data) {
                Ok(0) => return Err(TransportError::SinkClosed),
                Ok(n) => {
                    data = &data[n..];
                    self.bytes_written += n as u64;
                    attempt = 0;
                }
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => {
                    attempt += 1;
                    let Some(delay) = self.policy.delay_for(attempt) else {
                        tracing::warn!(attempts = self.policy.max_attempts, "Inbound socket stayed unwritable");
                        return Err(TransportError::Backpressure {
                            attempts: self.policy.max_attempts,
                        });
                    };
                    self.retries += 1;
                    metrics::record_sink_retry();
                    tokio::time::sleep(delay).await;
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) if is_disconnect(&e) => return Err(TransportError::SinkClosed),
                Err(e) => return Err(TransportError::Sink(e)),
            }
        }
        Ok(())
    }

    /// Bytes accepted by the sink so far.
    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    /// Would-block retries so far.
    pub fn retries(&self) -> u64 {
        self.retries
    }
}

fn is_disconnect(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::BrokenPipe | io::ErrorKind::ConnectionReset | io::ErrorKind::ConnectionAborted
    )
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Sink that replays scripted outcomes, then accepts everything.
    pub(crate) struct ScriptedSink {
        pub script: Vec<io::Result<usize>>,
        pub written: Vec<u8>,
        pub max_write: usize,
    }

    impl ScriptedSink {
        pub(crate) fn new(script: Vec<io::Result<usize>>) -> Self {
            Self {
                script,
                written: Vec::new(),
                max_write: usize::MAX,
            }
        }
    }

    impl ReplySink for ScriptedSink {
        fn try_write(&mut self, buf: &[u8]) -> io::Result<usize> {
            if !self.script.is_empty() {
                return match self.script.remove(0) {
                    Ok(limit) => {
                        let n = limit.min(buf.len());
                        self.written.extend_from_slice(&buf[..n]);
                        Ok(n)
                    }
                    Err(e) => Err(e),
                };
            }
            let n = self.max_write.min(buf.len());
            self.written.extend_from_slice(&buf[..n]);
            Ok(n)
        }
    }

    fn would_block() -> io::Result<usize> {
        Err(io::Error::from(io::ErrorKind::WouldBlock))
    }

    fn fast_policy(max_attempts: u32) -> BackoffPolicy {
        BackoffPolicy {
            max_attempts,
            base_delay_ms: 1,
            max_delay_ms: 2,
        }
    }

    #[tokio::test]
    async fn retries_through_backpressure() {
        let mut sink = ScriptedSink::new(vec![would_block(), would_block(), Ok(3), would_block()]);
        let mut writer = SinkWriter::new(&mut sink, fast_policy(5));

        writer.write_all(b"hello world").await.unwrap();
        assert_eq!(writer.bytes_written(), 11);
        assert_eq!(writer.retries(), 3);
        assert_eq!(sink.written, b"hello world");
    }

    #[tokio::test]
    async fn partial_writes_are_completed() {
        let mut sink = ScriptedSink::new(Vec::new());
        sink.max_write = 2;
        let mut writer = SinkWriter::new(&mut sink, fast_policy(1));

        writer.write_all(b"abcdefg").await.unwrap();
        assert_eq!(sink.written, b"abcdefg");
    }

    #[tokio::test]
    async fn gives_up_after_bounded_attempts() {
        let script = (0..10).map(|_| would_block()).collect();
        let mut sink = ScriptedSink::new(script);
        let mut writer = SinkWriter::new(&mut sink, fast_policy(3));

        let err = writer.write_all(b"data").await.unwrap_err();
        assert!(matches!(err, TransportError::Backpressure { attempts: 3 }));
        assert!(sink.written.is_empty());
    }

    #[tokio::test]
    async fn broken_pipe_aborts_immediately() {
        let mut sink = ScriptedSink::new(vec![Err(io::Error::from(io::ErrorKind::BrokenPipe))]);
        let mut writer = SinkWriter::new(&mut sink, fast_policy(5));

        let err = writer.write_all(b"data").await.unwrap_err();
        assert!(matches!(err, TransportError::SinkClosed));
        assert_eq!(writer.retries(), 0);
    }

    #[tokio::test]
    async fn zero_length_write_means_closed() {
        let mut sink = ScriptedSink::new(vec![Ok(0)]);
        let mut writer = SinkWriter::new(&mut sink, fast_policy(5));
        assert!(matches!(
            writer.write_all(b"x").await,
            Err(TransportError::SinkClosed)
        ));
    }

    #[tokio::test]
    async fn interrupted_is_retried_without_backoff() {
        let mut sink = ScriptedSink::new(vec![Err(io::Error::from(io::ErrorKind::Interrupted))]);
        let mut writer = SinkWriter::new(&mut sink, fast_policy(1));

        writer.write_all(b"ok").await.unwrap();
        assert_eq!(writer.retries(), 0);
        assert_eq!(sink.written, b"ok");
    }
}
