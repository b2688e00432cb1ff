//! Connection over an unreliable datagram socket.
//!
//! A `Connection` owns one UDP socket and composes the packet codec, the
//! sliding ACK window, and the in-flight reliable queue around it. State is
//! single-owner: every mutation goes through `&mut self`, so sequence
//! allocation, window updates, and the in-flight scan are serialized by
//! construction. The socket itself may be cloned and shared between a
//! reader and a writer task; the connection must not be.

use bytes::BytesMut;
use parking_lot::RwLock;
use reliagram_io::{resolve_endpoint, DgramSocket, SocketError};
use reliagram_protocol::{AckWindow, InFlightQueue, Packet, PacketError, ReliablePacket, RetryPoll};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, trace};

/// Callback fired for each packet successfully read off the socket.
pub type ReadCallback = Box<dyn FnMut(&Packet)>;

/// Read buffer size used when the caller passes zero.
const DEFAULT_BUFFER_SIZE: usize = 1500;

/// Default read deadline applied inside `tick`. A small positive value;
/// sub-millisecond deadlines behave poorly on some platforms.
const DEFAULT_READ_TIMEOUT: Duration = Duration::from_millis(1);

/// Connection errors.
#[derive(Error, Debug)]
pub enum ConnectionError {
    #[error("failed to resolve endpoint: {0}")]
    ResolveFailed(#[source] SocketError),

    #[error("failed to bind datagram socket: {0}")]
    BindFailed(#[source] SocketError),

    #[error("connection is closed")]
    Closed,

    #[error(transparent)]
    Malformed(#[from] PacketError),

    #[error("socket read failed: {0}")]
    ReadFailed(#[source] SocketError),

    #[error("socket write failed: {0}")]
    SendFailed(#[source] SocketError),

    #[error("no remote address specified to send to")]
    NoRemote,
}

impl ConnectionError {
    /// Whether this error is a read-deadline expiry rather than a real
    /// failure.
    pub fn is_timeout(&self) -> bool {
        matches!(self, ConnectionError::ReadFailed(err) if err.is_timeout())
    }
}

/// Connection statistics snapshot.
#[derive(Debug, Clone, Default)]
pub struct ConnectionStats {
    pub packets_sent: u64,
    pub packets_received: u64,
    pub bytes_sent: u64,
    pub bytes_received: u64,
    /// Reliable packets sent again after their retry timer fired.
    pub retransmissions: u64,
    /// In-flight records retired by an inbound acknowledgement.
    pub reliable_acked: u64,
    /// In-flight records that ran out of retry budget.
    pub reliable_exhausted: u64,
}

/// A connection-like object owning one datagram socket.
///
/// Delivers each received packet once, as received. Ordering and
/// deduplication are the application's responsibility.
pub struct Connection {
    socket: DgramSocket,
    local_addr: SocketAddr,
    remote_addr: Option<SocketAddr>,
    read_buffer: Vec<u8>,
    write_scratch: BytesMut,
    ack_window: AckWindow,
    in_flight: InFlightQueue,
    next_seq: u32,
    read_timeout: Duration,
    is_open: bool,
    stats: Arc<RwLock<ConnectionStats>>,

    /// Fold inbound sequence numbers into the ACK window on every read.
    /// Turning this off may suit a connection reading from many clients.
    pub update_acks_on_read: bool,

    /// Stamp the current ACK window onto every outbound packet. Turning
    /// this off (together with preset sequence numbers) is a test mode for
    /// driving the window deterministically; it is not meant for regular
    /// traffic.
    pub update_acks_on_send: bool,

    /// Fired by `read` for each successfully decoded packet.
    pub on_packet_read: Option<ReadCallback>,
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("socket", &self.socket)
            .field("local_addr", &self.local_addr)
            .field("remote_addr", &self.remote_addr)
            .field("read_buffer", &self.read_buffer)
            .field("write_scratch", &self.write_scratch)
            .field("ack_window", &self.ack_window)
            .field("in_flight", &self.in_flight)
            .field("next_seq", &self.next_seq)
            .field("read_timeout", &self.read_timeout)
            .field("is_open", &self.is_open)
            .field("stats", &self.stats)
            .field("update_acks_on_read", &self.update_acks_on_read)
            .field("update_acks_on_send", &self.update_acks_on_send)
            .field("on_packet_read", &self.on_packet_read.is_some())
            .finish()
    }
}

impl Connection {
    /// Open a connection.
    ///
    /// `local_addr` is the endpoint to bind; `None` or an empty string
    /// selects a loopback ephemeral port. `remote_addr`, when given, becomes
    /// the default destination for sends. `buffer_size` sizes both the read
    /// buffer and, when nonzero, the socket's kernel buffers; it must be at
    /// least as large as the biggest expected datagram.
    pub fn open(
        buffer_size: usize,
        local_addr: Option<&str>,
        remote_addr: Option<&str>,
    ) -> Result<Self, ConnectionError> {
        let bind_addr =
            resolve_endpoint(local_addr.unwrap_or("")).map_err(ConnectionError::ResolveFailed)?;

        let remote_addr = match remote_addr {
            Some(endpoint) => {
                Some(resolve_endpoint(endpoint).map_err(ConnectionError::ResolveFailed)?)
            }
            None => None,
        };

        let socket =
            DgramSocket::bind(bind_addr, buffer_size).map_err(ConnectionError::BindFailed)?;
        let local_addr = socket.local_addr().map_err(ConnectionError::BindFailed)?;

        let capacity = if buffer_size > 0 {
            buffer_size
        } else {
            DEFAULT_BUFFER_SIZE
        };

        debug!(%local_addr, buffer = capacity, "connection open");

        Ok(Connection {
            socket,
            local_addr,
            remote_addr,
            read_buffer: vec![0u8; capacity],
            write_scratch: BytesMut::with_capacity(capacity),
            ack_window: AckWindow::new(),
            in_flight: InFlightQueue::new(),
            next_seq: 1,
            read_timeout: DEFAULT_READ_TIMEOUT,
            is_open: true,
            stats: Arc::new(RwLock::new(ConnectionStats::default())),
            update_acks_on_read: true,
            update_acks_on_send: true,
            on_packet_read: None,
        })
    }

    /// Close the connection. Safe to call more than once. Pending reliable
    /// records are dropped without firing callbacks; the socket descriptor
    /// closes when the connection is dropped.
    pub fn close(&mut self) {
        if !self.is_open {
            return;
        }
        self.is_open = false;
        self.in_flight.clear();
        debug!(local = %self.local_addr, "connection closed");
    }

    pub fn is_open(&self) -> bool {
        self.is_open
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn remote_addr(&self) -> Option<SocketAddr> {
        self.remote_addr
    }

    /// Highest inbound sequence observed so far.
    pub fn last_seen_seq(&self) -> u32 {
        self.ack_window.last_seen_seq()
    }

    /// Current acknowledgement bitmask.
    pub fn ack_mask(&self) -> u32 {
        self.ack_window.mask()
    }

    /// Number of reliable packets awaiting acknowledgement.
    pub fn in_flight_len(&self) -> usize {
        self.in_flight.len()
    }

    /// Sequence number the next stamped send will carry.
    pub fn next_seq(&self) -> u32 {
        self.next_seq
    }

    /// Read deadline applied inside `tick`.
    pub fn read_timeout(&self) -> Duration {
        self.read_timeout
    }

    /// Change the read deadline applied inside `tick`.
    pub fn set_read_timeout(&mut self, timeout: Duration) {
        self.read_timeout = timeout;
    }

    /// Set or clear the socket deadline for bare `read` calls made outside
    /// `tick`. Note that `tick` overwrites this with its own deadline.
    pub fn set_read_deadline(&self, timeout: Option<Duration>) -> Result<(), ConnectionError> {
        self.socket
            .set_read_timeout(timeout)
            .map_err(ConnectionError::ReadFailed)
    }

    /// Statistics snapshot.
    pub fn stats(&self) -> ConnectionStats {
        self.stats.read().clone()
    }

    /// Fold `cur` into the ACK window and return the updated
    /// `(mask, last_seen_seq)` pair. `read` applies this to every inbound
    /// sequence; it is exposed for diagnostics and tests.
    pub fn calc_ack_mask(&mut self, cur: u32) -> (u32, u32) {
        self.ack_window.observe(cur)
    }

    fn take_next_seq(&mut self) -> u32 {
        let seq = self.next_seq;
        self.next_seq = self.next_seq.wrapping_add(1);
        seq
    }

    /// Send one packet.
    ///
    /// With `generate_new_seq`, the packet is stamped with a fresh sequence
    /// number (the field is updated in place, so the caller can observe the
    /// assigned value). Unless `update_acks_on_send` has been turned off,
    /// the packet's `ack_seq` and `ack_mask` are overwritten with the
    /// connection's current window before serialization. The packet goes to
    /// `remote` when given, else to the connection's default remote.
    pub fn send(
        &mut self,
        packet: &mut Packet,
        generate_new_seq: bool,
        remote: Option<SocketAddr>,
    ) -> Result<(), ConnectionError> {
        if !self.is_open {
            return Err(ConnectionError::Closed);
        }

        if generate_new_seq {
            packet.seq = self.take_next_seq();
        }

        if self.update_acks_on_send {
            packet.ack_seq = self.ack_window.last_seen_seq();
            packet.ack_mask = self.ack_window.mask();
        }

        let target = remote
            .or(self.remote_addr)
            .ok_or(ConnectionError::NoRemote)?;

        packet.write_to(&mut self.write_scratch);
        let sent = self
            .socket
            .send_to(&self.write_scratch, target)
            .map_err(ConnectionError::SendFailed)?;

        trace!(seq = packet.seq, bytes = sent, %target, "sent packet");

        let mut stats = self.stats.write();
        stats.packets_sent += 1;
        stats.bytes_sent += sent as u64;

        Ok(())
    }

    /// Send a reliable packet and start watching for its acknowledgement.
    ///
    /// The record is enqueued in the in-flight queue with its retry timer
    /// set one interval from now. `remote` is recorded on the record so
    /// retransmissions go to the same destination.
    pub fn send_reliable(
        &mut self,
        mut record: ReliablePacket,
        generate_new_seq: bool,
        remote: Option<SocketAddr>,
    ) -> Result<(), ConnectionError> {
        record.remote_address = remote;
        self.send(&mut record.packet, generate_new_seq, remote)?;
        record.reset_timer(Instant::now());
        self.in_flight.push(record);
        Ok(())
    }

    /// Read one packet, blocking until data arrives or the socket deadline
    /// (if any) expires.
    ///
    /// On success the source address is attached to the packet, the ACK
    /// window is updated (unless `update_acks_on_read` is off), in-flight
    /// reliable packets acknowledged by the inbound packet are retired with
    /// their `on_ack` callbacks, and `on_packet_read` fires. The window
    /// update happens before the in-flight scan, so a single inbound packet
    /// that both acknowledges a send and advances the mask is observed
    /// atomically.
    pub fn read(&mut self) -> Result<Packet, ConnectionError> {
        if !self.is_open {
            return Err(ConnectionError::Closed);
        }

        let (n, addr) = self
            .socket
            .recv_from(&mut self.read_buffer)
            .map_err(ConnectionError::ReadFailed)?;

        let mut packet = Packet::from_bytes(n, &self.read_buffer)?;
        packet.remote_address = Some(addr);

        if self.update_acks_on_read {
            self.ack_window.observe(packet.seq);
        }

        let retired = self.in_flight.retire_acked(&packet);

        trace!(seq = packet.seq, from = %addr, retired, "read packet");

        {
            let mut stats = self.stats.write();
            stats.packets_received += 1;
            stats.bytes_received += n as u64;
            stats.reliable_acked += retired as u64;
        }

        if let Some(on_read) = self.on_packet_read.as_mut() {
            on_read(&packet);
        }

        Ok(packet)
    }

    /// One scheduler turn: a read bounded by `read_timeout`, then the retry
    /// sweep.
    ///
    /// Returns whether a packet was read. A read-deadline expiry is not an
    /// error, just an empty turn; the retry sweep runs either way.
    pub fn tick(&mut self) -> Result<bool, ConnectionError> {
        if !self.is_open {
            return Err(ConnectionError::Closed);
        }

        self.socket
            .set_read_timeout(Some(self.read_timeout))
            .map_err(ConnectionError::ReadFailed)?;

        let read_result = self.read();
        let retry_result = self.retry_tick(Instant::now());

        match read_result {
            Ok(_) => {
                retry_result?;
                Ok(true)
            }
            Err(err) if err.is_timeout() => {
                retry_result?;
                Ok(false)
            }
            Err(err) => Err(err),
        }
    }

    /// Sweep the in-flight queue once: retransmit due records and retire
    /// those whose retry budget is spent (firing `on_fail_to_ack`).
    ///
    /// Each record's timer advances at most one interval per sweep, so a
    /// late tick cannot flood the peer. A retransmission carries a fresh
    /// sequence number and the record keeps it, which means only the newest
    /// transmission of a reliable packet is ack-eligible.
    pub fn retry_tick(&mut self, now: Instant) -> Result<(), ConnectionError> {
        let mut kept = InFlightQueue::new();
        let mut first_err = None;

        while let Some(mut record) = self.in_flight.pop_front() {
            match record.poll_retry(now) {
                RetryPoll::Wait => kept.push(record),
                RetryPoll::Retransmit => {
                    debug!(
                        seq = record.packet.seq,
                        fails = record.fail_count(),
                        "retransmitting reliable packet"
                    );
                    let destination = record.remote_address;
                    match self.send(&mut record.packet, true, destination) {
                        Ok(()) => self.stats.write().retransmissions += 1,
                        Err(err) => {
                            if first_err.is_none() {
                                first_err = Some(err);
                            }
                        }
                    }
                    kept.push(record);
                }
                RetryPoll::Exhausted => {
                    debug!(seq = record.packet.seq, "reliable packet exhausted retry budget");
                    self.stats.write().reliable_exhausted += 1;
                    if let Some(mut on_fail) = record.on_fail_to_ack.take() {
                        on_fail(&record);
                    }
                }
            }
        }

        self.in_flight = kept;
        match first_err {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}
