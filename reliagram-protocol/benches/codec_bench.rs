use bytes::{Bytes, BytesMut};
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use reliagram_protocol::{AckWindow, Packet};

fn bench_packet_serialize(c: &mut Criterion) {
    let payload = Bytes::from(vec![0u8; 1400]);
    let packet = Packet::new(42, 1000, 7, 998, 0x00FF, payload);
    let mut buf = BytesMut::with_capacity(2048);

    c.bench_function("packet_serialize", |b| {
        b.iter(|| {
            black_box(&packet).write_to(&mut buf);
            black_box(&buf);
        });
    });
}

fn bench_packet_deserialize(c: &mut Criterion) {
    let payload = Bytes::from(vec![0u8; 1400]);
    let packet = Packet::new(42, 1000, 7, 998, 0x00FF, payload);
    let mut buf = BytesMut::with_capacity(2048);
    packet.write_to(&mut buf);

    c.bench_function("packet_deserialize", |b| {
        b.iter(|| {
            let decoded = Packet::from_bytes(buf.len(), black_box(&buf)).unwrap();
            black_box(decoded);
        });
    });
}

fn bench_ack_window(c: &mut Criterion) {
    let mut group = c.benchmark_group("ack_window");

    group.bench_function("observe_fresh", |b| {
        let mut window = AckWindow::new();
        let mut seq = 0u32;
        b.iter(|| {
            seq = seq.wrapping_add(1);
            black_box(window.observe(seq));
        });
    });

    group.bench_function("observe_duplicate", |b| {
        let mut window = AckWindow::new();
        window.observe(1000);
        b.iter(|| {
            black_box(window.observe(995));
        });
    });

    group.finish();
}

fn bench_is_acked_by(c: &mut Criterion) {
    let packet = Packet::new(0, 990, 0, 0, 0, Bytes::new());
    let ack = Packet::new(0, 0, 0, 1000, 0xFFFF_FFFF, Bytes::new());

    c.bench_function("is_acked_by", |b| {
        b.iter(|| {
            black_box(black_box(&packet).is_acked_by(black_box(&ack)));
        });
    });
}

criterion_group!(
    benches,
    bench_packet_serialize,
    bench_packet_deserialize,
    bench_ack_window,
    bench_is_acked_by
);
criterion_main!(benches);
