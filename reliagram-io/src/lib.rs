//! I/O layer for the reliagram transport: a blocking UDP socket wrapper
//! with kernel buffer sizing, endpoint resolution, and timing helpers.

pub mod socket;
pub mod time;

pub use socket::{resolve_endpoint, DgramSocket, SocketError};
pub use time::Timer;
