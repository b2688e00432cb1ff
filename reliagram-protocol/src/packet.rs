//! Packet structure and serialization.
//!
//! One datagram carries exactly one packet: a fixed 21-byte header in
//! network byte order followed by the payload. There is no framing marker;
//! the datagram boundary is the frame boundary.

use crate::reliable::ReliablePacket;
use bytes::{Buf, BufMut, Bytes, BytesMut};
use std::net::SocketAddr;
use std::time::Duration;
use thiserror::Error;

/// Size of the packet header in bytes (4 + 4 + 1 + 4 + 4 + 4).
pub const HEADER_SIZE: usize = 21;

/// Depth of the acknowledgement bitmask: how many consecutive inbound
/// sequences one `ack_mask` can cover, ending at `ack_seq`.
pub const ACK_MASK_DEPTH: u32 = 32;

/// A single transport packet.
///
/// `client_id` and `channel` are opaque application tags; the transport
/// never inspects them. `ack_seq` and `ack_mask` echo the sender's view of
/// inbound traffic so that every outgoing packet doubles as an
/// acknowledgement.
///
/// Sequence numbers are compared with plain unsigned arithmetic. Behavior
/// near the 32-bit wrap boundary is a known limitation of the format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    pub client_id: u32,
    /// Sender-chosen sequence number.
    pub seq: u32,
    pub channel: u8,
    /// The sender's most recently seen inbound sequence.
    pub ack_seq: u32,
    /// Bitmask over the 32 inbound sequences ending at `ack_seq`
    /// (bit 0 = `ack_seq`, bit k = `ack_seq - k`).
    pub ack_mask: u32,
    /// Byte length of the payload carried on the wire.
    pub payload_size: u32,
    pub payload: Bytes,
    /// Source address of an inbound packet, or an optional default
    /// destination on an outbound one. Never serialized.
    pub remote_address: Option<SocketAddr>,
}

impl Packet {
    /// Create a new packet. `payload_size` is derived from the payload.
    pub fn new(
        client_id: u32,
        seq: u32,
        channel: u8,
        ack_seq: u32,
        ack_mask: u32,
        payload: impl Into<Bytes>,
    ) -> Self {
        let payload = payload.into();
        Packet {
            client_id,
            seq,
            channel,
            ack_seq,
            ack_mask,
            payload_size: payload.len() as u32,
            payload,
            remote_address: None,
        }
    }

    /// Serialize the packet into `buf`, resetting it first.
    pub fn write_to(&self, buf: &mut BytesMut) {
        let size = (self.payload_size as usize).min(self.payload.len());
        buf.clear();
        buf.reserve(HEADER_SIZE + size);
        buf.put_u32(self.client_id);
        buf.put_u32(self.seq);
        buf.put_u8(self.channel);
        buf.put_u32(self.ack_seq);
        buf.put_u32(self.ack_mask);
        buf.put_u32(size as u32);
        buf.put_slice(&self.payload[..size]);
    }

    /// Parse a packet from the first `n` bytes of `buf`.
    ///
    /// Trailing bytes beyond the declared payload are ignored, and a
    /// `payload_size` claiming more than the datagram actually delivered is
    /// clamped to the bytes present. The payload is copied into a freshly
    /// owned buffer. `remote_address` is left unset; the connection fills it
    /// in from the socket.
    pub fn from_bytes(n: usize, buf: &[u8]) -> Result<Self, PacketError> {
        let n = n.min(buf.len());
        if n < HEADER_SIZE {
            return Err(PacketError::MalformedHeader {
                expected: HEADER_SIZE,
                actual: n,
            });
        }

        let mut header = &buf[..HEADER_SIZE];
        let client_id = header.get_u32();
        let seq = header.get_u32();
        let channel = header.get_u8();
        let ack_seq = header.get_u32();
        let ack_mask = header.get_u32();
        let declared = header.get_u32() as usize;

        let size = declared.min(n - HEADER_SIZE);
        let payload = Bytes::copy_from_slice(&buf[HEADER_SIZE..HEADER_SIZE + size]);

        Ok(Packet {
            client_id,
            seq,
            channel,
            ack_seq,
            ack_mask,
            payload_size: size as u32,
            payload,
            remote_address: None,
        })
    }

    /// Check whether the inbound `ack` packet acknowledges this one.
    ///
    /// True iff this packet's sequence falls within the 32-slot window
    /// ending at `ack.ack_seq` and the matching mask bit is set.
    pub fn is_acked_by(&self, ack: &Packet) -> bool {
        if ack.ack_seq < self.seq {
            return false;
        }

        let seq_diff = ack.ack_seq - self.seq;
        if seq_diff >= ACK_MASK_DEPTH {
            return false;
        }

        ack.ack_mask & (0x0001 << seq_diff) != 0
    }

    /// Wrap this packet in a reliable record with the given retry policy.
    pub fn make_reliable(self, retry_interval: Duration, retry_count: u32) -> ReliablePacket {
        ReliablePacket::new(self, retry_interval, retry_count)
    }
}

/// Packet parsing errors.
#[derive(Error, Debug)]
pub enum PacketError {
    #[error("malformed header: need {expected} bytes, got {actual}")]
    MalformedHeader { expected: usize, actual: usize },
}
