//! Core wire protocol for the reliagram transport.
//!
//! This crate is pure: the packet codec, the sliding ACK window, and the
//! reliable-packet bookkeeping, with no I/O. The `reliagram` crate composes
//! these around a datagram socket.

pub mod ack;
pub mod packet;
pub mod reliable;

pub use ack::AckWindow;
pub use packet::{Packet, PacketError, ACK_MASK_DEPTH, HEADER_SIZE};
pub use reliable::{AckCallback, InFlightQueue, ReliablePacket, RetryPoll};
