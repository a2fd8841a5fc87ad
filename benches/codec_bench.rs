use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use gdshare::keys::{FILE_KEY, LEVEL_KEY};
use gdshare::plist::{Dict, Document, Node};
use gdshare::{codec, Level};

fn sample_document(levels: usize) -> Document {
    let mut array = Dict::array();
    for i in 0..levels {
        let mut level = Level::new();
        level.set_name(&format!("Level {}", i)).set_description("benchmark");
        array.set(format!("k_{}", i), Node::Dict(level.into_dict()));
    }

    let mut root = Dict::new();
    root.set("LLM_01", Node::Dict(array));
    root.set("LLM_02", Node::Int(35));
    Document::new(root)
}

pub fn xor_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("xor");
    for size in [64, 1024, 16 * 1024, 256 * 1024].iter() {
        let data = vec![b'a'; *size];
        group.throughput(Throughput::Bytes(*size as u64));
        group.bench_with_input(BenchmarkId::new("file-key", size), size, |b, &_size| {
            b.iter(|| codec::xor(black_box(&data), FILE_KEY))
        });
        group.bench_with_input(BenchmarkId::new("level-key", size), size, |b, &_size| {
            b.iter(|| codec::xor(black_box(&data), LEVEL_KEY))
        });
    }
    group.finish();
}

pub fn envelope_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("envelope");
    for levels in [1, 16, 128].iter() {
        let xml = sample_document(*levels).print(false);
        let encoded = codec::encode_envelope(&xml, FILE_KEY);
        group.throughput(Throughput::Bytes(xml.len() as u64));
        group.bench_with_input(BenchmarkId::new("encode", levels), levels, |b, &_levels| {
            b.iter(|| codec::encode_envelope(black_box(&xml), FILE_KEY))
        });
        group.bench_with_input(BenchmarkId::new("decode", levels), levels, |b, &_levels| {
            b.iter(|| codec::decode_envelope(black_box(&encoded), FILE_KEY).unwrap())
        });
    }
    group.finish();
}

pub fn plist_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("plist");
    for levels in [1, 16, 128].iter() {
        let doc = sample_document(*levels);
        let xml = doc.print(false);
        group.throughput(Throughput::Bytes(xml.len() as u64));
        group.bench_with_input(BenchmarkId::new("parse", levels), levels, |b, &_levels| {
            b.iter(|| Document::parse(black_box(&xml)).unwrap())
        });
        group.bench_with_input(BenchmarkId::new("print", levels), levels, |b, &_levels| {
            b.iter(|| black_box(&doc).print(false))
        });
    }
    group.finish();
}

criterion_group!(benches, xor_benchmark, envelope_benchmark, plist_benchmark);
criterion_main!(benches);
