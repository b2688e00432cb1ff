//! UDP socket wrapper.
//!
//! Socket construction and kernel buffer sizing go through socket2; the
//! configured socket is then handed to std's `UdpSocket` for ordinary
//! blocking I/O with read timeouts.

use socket2::{Domain, Protocol, Socket, Type};
use std::io::{self, ErrorKind};
use std::net::{SocketAddr, ToSocketAddrs, UdpSocket};
use std::time::Duration;
use thiserror::Error;

/// Socket errors.
#[derive(Error, Debug)]
pub enum SocketError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("could not resolve endpoint: {0}")]
    Resolve(String),
}

impl SocketError {
    /// Whether this error is a read-deadline expiry rather than a real
    /// failure. Deadline expiry surfaces as `WouldBlock` on Unix and
    /// `TimedOut` on Windows.
    pub fn is_timeout(&self) -> bool {
        match self {
            SocketError::Io(err) => {
                matches!(err.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut)
            }
            SocketError::Resolve(_) => false,
        }
    }
}

/// Resolve an endpoint string to a socket address.
///
/// An empty string selects a loopback ephemeral port.
pub fn resolve_endpoint(endpoint: &str) -> Result<SocketAddr, SocketError> {
    let endpoint = if endpoint.is_empty() {
        "127.0.0.1:0"
    } else {
        endpoint
    };

    endpoint
        .to_socket_addrs()
        .map_err(|_| SocketError::Resolve(endpoint.to_string()))?
        .next()
        .ok_or_else(|| SocketError::Resolve(endpoint.to_string()))
}

/// A bound datagram socket.
#[derive(Debug)]
pub struct DgramSocket {
    inner: UdpSocket,
}

impl DgramSocket {
    /// Bind a datagram socket on `addr`, sizing its kernel send and receive
    /// buffers to `buffer_size` when it is nonzero. Some platforms drop
    /// datagrams silently when the kernel buffer is smaller than the
    /// datagram, so callers moving large payloads should size accordingly.
    pub fn bind(addr: SocketAddr, buffer_size: usize) -> Result<Self, SocketError> {
        let domain = if addr.is_ipv4() {
            Domain::IPV4
        } else {
            Domain::IPV6
        };

        let socket = Socket::new(domain, Type::DGRAM, Some(Protocol::UDP))?;
        socket.set_reuse_address(true)?;

        if buffer_size > 0 {
            socket.set_send_buffer_size(buffer_size)?;
            socket.set_recv_buffer_size(buffer_size)?;
        }

        socket.bind(&addr.into())?;

        Ok(DgramSocket {
            inner: socket.into(),
        })
    }

    /// Local address this socket is bound to.
    pub fn local_addr(&self) -> Result<SocketAddr, SocketError> {
        Ok(self.inner.local_addr()?)
    }

    /// Send one datagram to `target`. Returns the number of bytes sent.
    pub fn send_to(&self, buf: &[u8], target: SocketAddr) -> Result<usize, SocketError> {
        Ok(self.inner.send_to(buf, target)?)
    }

    /// Receive one datagram, blocking until data arrives or the read
    /// timeout (if any) expires.
    pub fn recv_from(&self, buf: &mut [u8]) -> Result<(usize, SocketAddr), SocketError> {
        Ok(self.inner.recv_from(buf)?)
    }

    /// Set or clear the blocking-read timeout.
    pub fn set_read_timeout(&self, timeout: Option<Duration>) -> Result<(), SocketError> {
        Ok(self.inner.set_read_timeout(timeout)?)
    }

    /// Clone the socket handle, e.g. to split reading and writing between
    /// two tasks.
    pub fn try_clone(&self) -> Result<Self, SocketError> {
        Ok(DgramSocket {
            inner: self.inner.try_clone()?,
        })
    }
}
