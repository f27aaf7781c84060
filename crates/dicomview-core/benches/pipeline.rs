//! Benchmarks for the streaming pipe and bridge.
//!
//! Run with: cargo bench -p dicomview-core

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use dicomview_core::config::PipeConfig;
use dicomview_core::decode::{DecodedFrame, FrameImage};
use dicomview_core::{pipe, render_rgba, StreamBridge};
use std::io::{Cursor, Read};

const PAYLOAD_LEN: usize = 4 * 1024 * 1024;

fn bridge_config(capacity: usize) -> PipeConfig {
    PipeConfig {
        capacity,
        ..PipeConfig::default()
    }
}

fn benchmark_bridge_throughput(c: &mut Criterion) {
    let payload = vec![0x5au8; PAYLOAD_LEN];
    let mut group = c.benchmark_group("bridge_throughput");
    group.throughput(Throughput::Bytes(PAYLOAD_LEN as u64));

    for capacity in [4_096usize, 32_000, 256_000] {
        group.bench_with_input(
            BenchmarkId::from_parameter(capacity),
            &capacity,
            |b, &capacity| {
                b.iter(|| {
                    let (writer, mut reader) = pipe(capacity);
                    let source = Cursor::new(payload.clone());
                    let handle = StreamBridge::new(source, writer, bridge_config(capacity))
                        .spawn()
                        .unwrap();

                    let mut sink = Vec::with_capacity(PAYLOAD_LEN);
                    reader.read_to_end(&mut sink).unwrap();
                    drop(reader);
                    black_box(handle.join());
                })
            },
        );
    }
    group.finish();
}

fn benchmark_pipe_direct(c: &mut Criterion) {
    let chunk = vec![1u8; 16 * 1024];
    let mut group = c.benchmark_group("pipe_direct");
    group.throughput(Throughput::Bytes(PAYLOAD_LEN as u64));

    group.bench_function("write_read_32000", |b| {
        b.iter(|| {
            let (mut writer, mut reader) = pipe(32_000);
            let chunk = chunk.clone();
            let producer = std::thread::spawn(move || {
                for _ in 0..PAYLOAD_LEN / chunk.len() {
                    writer.write_all(&chunk).unwrap();
                }
                writer.close(std::time::Duration::from_secs(5))
            });

            let mut buf = [0u8; 8192];
            let mut total = 0;
            loop {
                let n = reader.read(&mut buf).unwrap();
                if n == 0 {
                    break;
                }
                total += n;
            }
            drop(reader);
            black_box(total);
            producer.join().unwrap();
        })
    });
    group.finish();
}

fn benchmark_render(c: &mut Criterion) {
    let frame = DecodedFrame::new(FrameImage::new_luma16(512, 512));

    c.bench_function("render_rgba_512", |b| {
        b.iter(|| black_box(render_rgba(black_box(&frame))))
    });
}

criterion_group!(
    benches,
    benchmark_bridge_throughput,
    benchmark_pipe_direct,
    benchmark_render,
);
criterion_main!(benches);
