//! Shared helpers for the integration tests in `tests/`.

use reliagram::Connection;
use std::time::Duration;

/// Open a server on a loopback ephemeral port and a client whose default
/// remote is that server.
pub fn open_pair(buffer_size: usize) -> (Connection, Connection) {
    let server = Connection::open(buffer_size, None, None).expect("server bind");
    let server_addr = server.local_addr().to_string();
    let client =
        Connection::open(buffer_size, None, Some(&server_addr)).expect("client bind");
    (client, server)
}

/// Bound read deadline so a failing test times out instead of hanging.
pub fn guard_deadline(conn: &Connection) {
    conn.set_read_deadline(Some(Duration::from_secs(2)))
        .expect("set read deadline");
}
