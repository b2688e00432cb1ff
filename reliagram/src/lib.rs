//! Selective-reliability transport over unordered, unreliable datagrams.
//!
//! A library, not a server: it exposes a connection-like object that owns
//! one UDP socket. Applications can send arbitrary-sized datagrams, mark
//! individual datagrams as reliable so they are retransmitted until
//! acknowledged or a retry budget runs out, and get acknowledgements for
//! free — every outgoing packet carries a compact 32-slot sliding ACK
//! bitmask covering recently received traffic.
//!
//! What this crate does not do: in-order delivery, streams, fragmentation,
//! flow or congestion control, duplicate suppression, or connection
//! handshakes. Each received packet is delivered once, as received.
//!
//! ```no_run
//! use reliagram::{Connection, Packet};
//! use std::time::Duration;
//!
//! # fn main() -> Result<(), reliagram::ConnectionError> {
//! let mut conn = Connection::open(1500, None, Some("127.0.0.1:4600"))?;
//!
//! let ping = Packet::new(42, 0, 7, 0, 0, &b"ping"[..]);
//! let reliable = ping.make_reliable(Duration::from_millis(250), 5);
//! conn.send_reliable(reliable, true, None)?;
//!
//! while conn.in_flight_len() > 0 {
//!     conn.tick()?;
//! }
//! # Ok(())
//! # }
//! ```

pub use reliagram_io as io;
pub use reliagram_protocol as protocol;

mod connection;

pub use connection::{Connection, ConnectionError, ConnectionStats, ReadCallback};
pub use protocol::{
    AckWindow, InFlightQueue, Packet, PacketError, ReliablePacket, RetryPoll, ACK_MASK_DEPTH,
    HEADER_SIZE,
};
