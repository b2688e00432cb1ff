//! Property-based tests for the packet codec and the acknowledgement
//! predicate.

use bytes::BytesMut;
use proptest::prelude::*;
use reliagram::protocol::{Packet, PacketError, ACK_MASK_DEPTH, HEADER_SIZE};

fn packet_strategy() -> impl Strategy<Value = Packet> {
    (
        any::<u32>(),
        any::<u32>(),
        any::<u8>(),
        any::<u32>(),
        any::<u32>(),
        prop::collection::vec(any::<u8>(), 0..=256),
    )
        .prop_map(|(client_id, seq, channel, ack_seq, ack_mask, payload)| {
            Packet::new(client_id, seq, channel, ack_seq, ack_mask, payload)
        })
}

proptest! {
    #[test]
    fn prop_roundtrip(packet in packet_strategy()) {
        let mut buf = BytesMut::new();
        packet.write_to(&mut buf);
        prop_assert_eq!(buf.len(), HEADER_SIZE + packet.payload.len());

        let decoded = Packet::from_bytes(buf.len(), &buf).unwrap();
        prop_assert_eq!(decoded, packet);
    }

    #[test]
    fn prop_short_input_rejected(len in 0..HEADER_SIZE) {
        let buf = vec![0u8; len];
        let is_malformed_header = matches!(
            Packet::from_bytes(len, &buf),
            Err(PacketError::MalformedHeader { .. })
        );
        prop_assert!(is_malformed_header);
    }

    #[test]
    fn prop_trailing_bytes_ignored(packet in packet_strategy(), extra in 1usize..=64) {
        let mut buf = BytesMut::new();
        packet.write_to(&mut buf);
        buf.extend_from_slice(&vec![0xAB; extra]);

        let decoded = Packet::from_bytes(buf.len(), &buf).unwrap();
        prop_assert_eq!(decoded.payload, packet.payload);
        prop_assert_eq!(decoded.payload_size, packet.payload_size);
    }

    #[test]
    fn prop_is_acked_by_matches_definition(
        seq in any::<u32>(),
        ack_seq in any::<u32>(),
        ack_mask in any::<u32>(),
    ) {
        let p = Packet::new(0, seq, 0, 0, 0, vec![]);
        let q = Packet::new(0, 0, 0, ack_seq, ack_mask, vec![]);

        let expected = ack_seq >= seq
            && ack_seq - seq < ACK_MASK_DEPTH
            && (ack_mask >> (ack_seq - seq)) & 1 == 1;
        prop_assert_eq!(p.is_acked_by(&q), expected);
    }
}
