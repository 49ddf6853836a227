//! Non-blocking TCP listener.
//!
//! # Responsibilities
//! - Bind to the configured address with reuse-address and a bounded backlog
//! - Zero-timeout accept: report "nothing pending" instead of waiting
//! - Hand accepted sockets over as Tokio streams
//!
//! # Design Decisions
//! - One listening socket, one accepted connection at a time
//! - No connection queueing beyond the OS listen backlog

use std::net::{IpAddr, SocketAddr};

use thiserror::Error;
use tokio::net::{TcpSocket, TcpStream};

use crate::config::ListenerConfig;

/// Error type for listener operations.
#[derive(Debug, Error)]
pub enum ListenerError {
    /// Failed to create, bind or listen on the socket.
    #[error("Failed to bind: {0}")]
    Bind(std::io::Error),
    /// Failed to accept a pending connection.
    #[error("Failed to accept: {0}")]
    Accept(std::io::Error),
    /// `poll_once` was called before `start` succeeded.
    #[error("Listener is not started")]
    NotStarted,
}

/// A bound, non-blocking listening socket.
#[derive(Debug)]
pub struct Listener {
    // Accepting through the std handle: a pending connection is visible
    // without waiting for a reactor turn.
    inner: std::net::TcpListener,
    local_addr: SocketAddr,
}

impl Listener {
    /// Bind `config.bind_address:port` and start listening.
    pub fn bind(config: &ListenerConfig, port: u16) -> Result<Self, ListenerError> {
        let ip: IpAddr = config.bind_address.parse().map_err(|e| {
            ListenerError::Bind(std::io::Error::new(std::io::ErrorKind::InvalidInput, e))
        })?;
        let addr = SocketAddr::new(ip, port);

        let socket = match addr {
            SocketAddr::V4(_) => TcpSocket::new_v4(),
            SocketAddr::V6(_) => TcpSocket::new_v6(),
        }
        .map_err(ListenerError::Bind)?;
        socket.set_reuseaddr(true).map_err(ListenerError::Bind)?;
        socket.bind(addr).map_err(ListenerError::Bind)?;

        let listener = socket.listen(config.backlog).map_err(ListenerError::Bind)?;
        let inner = listener.into_std().map_err(ListenerError::Bind)?;
        inner.set_nonblocking(true).map_err(ListenerError::Bind)?;
        let local_addr = inner.local_addr().map_err(ListenerError::Bind)?;

        tracing::info!(
            address = %local_addr,
            backlog = config.backlog,
            "Listener bound"
        );

        Ok(Self { inner, local_addr })
    }

    /// Accept one pending connection, if any, without blocking.
    pub fn try_accept(&self) -> Result<Option<(TcpStream, SocketAddr)>, ListenerError> {
        let (stream, peer) = match self.inner.accept() {
            Ok(accepted) => accepted,
            Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => return Ok(None),
            Err(e) => return Err(ListenerError::Accept(e)),
        };

        stream.set_nonblocking(true).map_err(ListenerError::Accept)?;
        stream.set_nodelay(true).map_err(ListenerError::Accept)?;
        let stream = TcpStream::from_std(stream).map_err(ListenerError::Accept)?;

        tracing::debug!(peer_addr = %peer, "Connection accepted");
        Ok(Some((stream, peer)))
    }

    /// The address this listener is bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loopback() -> ListenerConfig {
        ListenerConfig {
            bind_address: "127.0.0.1".to_string(),
            ..ListenerConfig::default()
        }
    }

    #[tokio::test]
    async fn idle_listener_accepts_nothing() {
        let listener = Listener::bind(&loopback(), 0).unwrap();
        assert!(listener.try_accept().unwrap().is_none());
    }

    #[tokio::test]
    async fn pending_connection_is_accepted() {
        let listener = Listener::bind(&loopback(), 0).unwrap();
        let _client = std::net::TcpStream::connect(listener.local_addr()).unwrap();

        let mut accepted = None;
        for _ in 0..100 {
            if let Some(conn) = listener.try_accept().unwrap() {
                accepted = Some(conn);
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        }
        let (_, peer) = accepted.expect("connection should be accepted");
        assert!(peer.ip().is_loopback());
    }

    #[test]
    fn invalid_bind_address_is_rejected() {
        let config = ListenerConfig {
            bind_address: "not-an-ip".to_string(),
            ..ListenerConfig::default()
        };
        assert!(matches!(Listener::bind(&config, 0), Err(ListenerError::Bind(_))));
    }
}
