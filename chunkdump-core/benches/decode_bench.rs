use chunkdump_core::compression::{XorDecoder, XorEncoder};
use chunkdump_core::{decode, ContainerWriter, DecodeConfig, Sample};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

/// Regular 15s scrapes with slowly varying values
fn generate_samples(n: usize) -> Vec<Sample> {
    (0..n)
        .map(|i| {
            let ts = 1_600_000_000_000 + i as i64 * 15_000;
            let value = 20.0 + 5.0 * (i as f64 * 0.01).sin();
            Sample::new(ts, value)
        })
        .collect()
}

fn bench_chunk_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("chunk_decode");

    for size in [120, 1_000, 10_000] {
        let mut encoder = XorEncoder::new();
        for sample in generate_samples(size) {
            encoder.encode(sample);
        }
        let block = encoder.finish();
        group.throughput(Throughput::Elements(size as u64));

        group.bench_with_input(BenchmarkId::new("varying", size), &block, |b, block| {
            b.iter(|| {
                let mut decoder = XorDecoder::new(black_box(&block.data), block.count);
                black_box(decoder.decode_all().unwrap())
            });
        });
    }

    group.finish();
}

fn bench_container_decode(c: &mut Criterion) {
    let samples = generate_samples(120 * 64);
    let mut writer = ContainerWriter::new(br#"{"metric":{"__name__":"up"}}"#);
    for chunk in samples.chunks(120) {
        writer.push_chunk(chunk).unwrap();
    }
    let bytes = writer.finish().unwrap();
    let config = DecodeConfig::default();

    let mut group = c.benchmark_group("container_decode");
    group.throughput(Throughput::Bytes(bytes.len() as u64));
    group.bench_function("64_chunks", |b| {
        b.iter(|| black_box(decode(black_box(&bytes), &config).unwrap()));
    });
    group.finish();
}

criterion_group!(benches, bench_chunk_decode, bench_container_decode);
criterion_main!(benches);
