//! Performance benchmarks for FrameCodec.
//!
//! Run benchmarks with:
//! ```sh
//! cargo bench --bench codec_bench
//! ```

use bytes::BytesMut;
use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use std::hint::black_box;
use tokio_util::codec::{Decoder, Encoder};
use tagbridge_core::{Rarity, TagUid, UnitKind};
use tagbridge_protocol::{
    FrameCodec, Message, MessageType, RegistrationRequest, RegistrationResponse,
};

fn registration_request() -> Message {
    let uid = TagUid::from_hex("04A3B2C1D2E3F4").unwrap();
    RegistrationRequest::new(uid, UnitKind::Goblin, Rarity::Legendary).into_message()
}

fn full_response() -> Message {
    let payload = vec![
        0x07, 0x04, 0xA3, 0xB2, 0xC1, 0xD2, 0xE3, 0xF4, // uid
        0x00, 0x01, 0x02, // status, type, rarity
        0x03, 0x01, 0x07, 0x02, 0xFF, 0x00, 0xFF, 0x00, // abilities
    ];
    Message::new(MessageType::NfcData, payload).unwrap()
}

fn encoded(message: Message) -> BytesMut {
    let mut buffer = BytesMut::new();
    FrameCodec::new().encode(message, &mut buffer).unwrap();
    buffer
}

fn bench_encode_request(c: &mut Criterion) {
    let mut group = c.benchmark_group("encode_request");
    group.throughput(Throughput::Elements(1));

    let msg = registration_request();
    group.bench_function("encode_registration_request", |b| {
        b.iter(|| {
            let mut codec = FrameCodec::new();
            let mut buffer = BytesMut::new();
            codec.encode(black_box(msg.clone()), &mut buffer).unwrap();
            black_box(buffer);
        });
    });

    group.finish();
}

fn bench_decode_response(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode_response");
    group.throughput(Throughput::Elements(1));

    let wire = encoded(full_response());
    group.bench_function("decode_and_parse_response", |b| {
        b.iter(|| {
            let mut codec = FrameCodec::new();
            let mut buffer = wire.clone();
            let msg = codec.decode(black_box(&mut buffer)).unwrap().unwrap();
            black_box(RegistrationResponse::from_message(&msg).unwrap());
        });
    });

    group.finish();
}

/// Decoding with the frame arriving in chunks of varying size.
fn bench_decode_chunked(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode_chunked");

    let wire = encoded(full_response());
    for chunk in [1usize, 4, 16] {
        group.throughput(Throughput::Bytes(wire.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(chunk), &chunk, |b, &chunk| {
            b.iter(|| {
                let mut codec = FrameCodec::new();
                let mut buffer = BytesMut::new();
                for piece in wire.chunks(chunk) {
                    buffer.extend_from_slice(piece);
                    if let Some(msg) = codec.decode(&mut buffer).unwrap() {
                        black_box(msg);
                    }
                }
            });
        });
    }

    group.finish();
}

fn bench_decode_batch(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode_batch");

    for count in [10usize, 100, 1000] {
        let mut wire = BytesMut::new();
        let mut codec = FrameCodec::new();
        for _ in 0..count {
            codec.encode(full_response(), &mut wire).unwrap();
        }

        group.throughput(Throughput::Elements(count as u64));
        group.bench_with_input(BenchmarkId::from_parameter(count), &wire, |b, wire| {
            b.iter(|| {
                let mut codec = FrameCodec::new();
                let mut buffer = wire.clone();
                while let Some(msg) = codec.decode(&mut buffer).unwrap() {
                    black_box(msg);
                }
            });
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_encode_request,
    bench_decode_response,
    bench_decode_chunked,
    bench_decode_batch
);
criterion_main!(benches);
