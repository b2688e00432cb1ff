//! End-to-end connection tests over loopback UDP.

use bytes::Bytes;
use rand::RngCore;
use reliagram::io::DgramSocket;
use reliagram::{ConnectionError, Packet};
use reliagram_tests::{guard_deadline, open_pair};

#[test]
fn test_basic_echo() {
    let (mut client, mut server) = open_pair(1500);
    guard_deadline(&server);

    let payload = Bytes::from_static(b"Connection seems to work!");
    let mut packet = Packet::new(42, 0, 7, 0, 0, payload.clone());
    client.send(&mut packet, true, None).unwrap();

    let received = server.read().unwrap();
    assert_eq!(received.client_id, 42);
    assert_eq!(received.channel, 7);
    assert_eq!(received.seq, 1);
    assert_eq!(received.payload, payload);
    assert_eq!(received.payload_size, payload.len() as u32);
    assert_eq!(received.remote_address, Some(client.local_addr()));
}

#[test]
fn test_large_payload() {
    const BUFFER_SIZE: usize = 512 * 1024;
    const PAYLOAD_SIZE: usize = 32 * 32 * 32;

    let (mut client, mut server) = open_pair(BUFFER_SIZE);
    guard_deadline(&server);

    let mut payload = vec![0u8; PAYLOAD_SIZE];
    rand::thread_rng().fill_bytes(&mut payload);

    let mut packet = Packet::new(42, 0, 7, 0, 0, payload.clone());
    client.send(&mut packet, true, None).unwrap();

    let received = server.read().unwrap();
    assert_eq!(received.payload_size as usize, PAYLOAD_SIZE);
    assert_eq!(&received.payload[..], &payload[..]);
}

#[test]
fn test_malformed_datagram() {
    let (_, mut server) = open_pair(1500);
    guard_deadline(&server);

    let raw = DgramSocket::bind("127.0.0.1:0".parse().unwrap(), 0).unwrap();
    raw.send_to(&[0u8; 10], server.local_addr()).unwrap();

    let err = server.read().unwrap_err();
    assert!(matches!(err, ConnectionError::Malformed(_)));
}

#[test]
fn test_read_updates_ack_state() {
    let (mut client, mut server) = open_pair(1500);
    guard_deadline(&server);

    for _ in 0..3 {
        let mut packet = Packet::new(1, 0, 0, 0, 0, Bytes::from_static(b"x"));
        client.send(&mut packet, true, None).unwrap();
        server.read().unwrap();
    }

    assert_eq!(server.last_seen_seq(), 3);
    assert_eq!(server.ack_mask(), 0b111);
}

#[test]
fn test_update_acks_on_read_disabled() {
    let (mut client, mut server) = open_pair(1500);
    guard_deadline(&server);
    server.update_acks_on_read = false;

    let mut packet = Packet::new(1, 0, 0, 0, 0, Bytes::from_static(b"x"));
    client.send(&mut packet, true, None).unwrap();

    let received = server.read().unwrap();
    assert_eq!(received.seq, 1);
    assert_eq!(server.last_seen_seq(), 0);
    assert_eq!(server.ack_mask(), 0);
}

#[test]
fn test_on_packet_read_fires() {
    use std::cell::Cell;
    use std::rc::Rc;

    let (mut client, mut server) = open_pair(1500);
    guard_deadline(&server);

    let seen = Rc::new(Cell::new(0u32));
    let observed = seen.clone();
    server.on_packet_read = Some(Box::new(move |packet| {
        assert_eq!(packet.client_id, 42);
        observed.set(observed.get() + 1);
    }));

    let mut packet = Packet::new(42, 0, 0, 0, 0, Bytes::from_static(b"x"));
    client.send(&mut packet, true, None).unwrap();
    server.read().unwrap();

    assert_eq!(seen.get(), 1);
}

#[test]
fn test_stats_track_traffic() {
    let (mut client, mut server) = open_pair(1500);
    guard_deadline(&server);

    let mut packet = Packet::new(1, 0, 0, 0, 0, Bytes::from_static(b"hello"));
    client.send(&mut packet, true, None).unwrap();
    server.read().unwrap();

    let client_stats = client.stats();
    assert_eq!(client_stats.packets_sent, 1);
    assert!(client_stats.bytes_sent > 0);

    let server_stats = server.stats();
    assert_eq!(server_stats.packets_received, 1);
    assert!(server_stats.bytes_received > 0);
}
