//! Criterion benchmarks for frame encoding.
//!
//! The streaming loop encodes one frame every 50 ms; encoding must stay far
//! below that even for the largest groups.
//!
//! Run with:
//! ```bash
//! cargo bench --package hue-core --bench frame_bench
//! ```

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use hue_core::{encode_frame, extract_session_id, LightState, Rgb, SessionId};

fn bench_encode_frame(c: &mut Criterion) {
    let session = SessionId::new("1a8d99cc-967b-44f2-9202-43f976c0fa6b").unwrap();
    let mut group = c.benchmark_group("encode_frame");

    for count in [1usize, 10, 20, 256] {
        let channels: Vec<u8> = (0..count).map(|i| i as u8).collect();
        let state = LightState::uniform(channels.iter().copied(), Rgb::new(12, 34, 56));

        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, _| {
            b.iter(|| encode_frame(black_box(&session), black_box(&channels), black_box(&state)))
        });
    }

    group.finish();
}

fn bench_extract_session_id(c: &mut Criterion) {
    let chunk = r#"data: [{"creationtime":"2024-01-01T00:00:00Z","data":[{"id":"1a8d99cc-967b-44f2-9202-43f976c0fa6b","type":"entertainment_configuration"}],"type":"update"}]"#;
    c.bench_function("extract_session_id", |b| {
        b.iter(|| extract_session_id(black_box(chunk)))
    });
}

criterion_group!(benches, bench_encode_frame, bench_extract_session_id);
criterion_main!(benches);
