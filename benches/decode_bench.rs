/*
This benchmark measures the per-packet cost of the receive hot path: parsing
one 36-byte RDT record and scaling it into physical units. At the sensor's
native rate (up to 7 kHz) this runs once per packet, so it must stay far
below the inter-packet gap.
*/

use criterion::{Criterion, criterion_group, criterion_main};

use std::hint::black_box;
use std::time::SystemTime;

use bytes::BytesMut;
use netft_logger::acquisition::packet::{PACKET_SIZE, RawPacket, Scaling};

fn wire_record() -> BytesMut {
    let packet = RawPacket {
        rdt_sequence: 123,
        ft_sequence: 456,
        status: 0x0200,
        counts: [2_000_000, -1_500_000, 750_000, -250_000, 125_000, -62_500],
    };
    let mut wire = BytesMut::with_capacity(PACKET_SIZE);
    packet.encode(&mut wire);
    wire
}

fn bench_packet_hot_path(c: &mut Criterion) {
    let mut group = c.benchmark_group("packet_hot_path");
    let wire = wire_record();
    let scaling = Scaling::default();

    group.bench_function("parse", |b| {
        b.iter(|| {
            let packet = RawPacket::parse(black_box(&wire)).unwrap();
            black_box(packet);
        });
    });

    group.bench_function("parse_and_scale", |b| {
        b.iter(|| {
            let packet = RawPacket::parse(black_box(&wire)).unwrap();
            let reading = packet.into_reading(scaling, SystemTime::UNIX_EPOCH);
            black_box(reading);
        });
    });

    group.bench_function("encode", |b| {
        let packet = RawPacket::parse(&wire).unwrap();
        let mut out = BytesMut::with_capacity(PACKET_SIZE);
        b.iter(|| {
            out.clear();
            packet.encode(&mut out);
            black_box(&out);
        });
    });

    group.finish();
}

criterion_group!(benches, bench_packet_hot_path);
criterion_main!(benches);
