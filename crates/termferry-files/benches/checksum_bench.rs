//! Checksum benchmarks for termferry-files.
//!
//! Run with: `cargo bench -p termferry-files`
//!
//! Uploads and downloads hash the whole payload once per attempt, up to the
//! 10 MiB ceiling.

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use termferry_files::{checksum_hex, verify_checksum};

fn bench_checksum_hex(c: &mut Criterion) {
    let mut group = c.benchmark_group("checksum_hex");

    for size in [1024, 64 * 1024, 1024 * 1024, 10 * 1024 * 1024] {
        let data: Vec<u8> = (0..size).map(|i| (i % 251) as u8).collect();

        group.throughput(Throughput::Bytes(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &data, |b, data| {
            b.iter(|| black_box(checksum_hex(black_box(data))));
        });
    }

    group.finish();
}

fn bench_verify_checksum(c: &mut Criterion) {
    let data = vec![b'a'; 1024 * 1024];
    let expected = checksum_hex(&data).to_uppercase();

    c.bench_function("verify_checksum_1mib", |b| {
        b.iter(|| black_box(verify_checksum(black_box(&data), black_box(&expected))));
    });
}

criterion_group!(checksum_benches, bench_checksum_hex, bench_verify_checksum);
criterion_main!(checksum_benches);
