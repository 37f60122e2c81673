//! Marshalling Benchmarks
//!
//! Performance benchmarks for pixel/tensor conversion at the recommended
//! style resolution.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use stylize::marshal::{blend, decode, encode, Normalization, PixelBuffer};

const SIZE: u32 = 512;

fn gradient(size: u32) -> PixelBuffer {
    let mut data = Vec::with_capacity((size * size * 4) as usize);
    for y in 0..size {
        for x in 0..size {
            data.extend_from_slice(&[(x % 256) as u8, (y % 256) as u8, ((x + y) % 256) as u8, 255]);
        }
    }
    PixelBuffer::new(data, size, size)
}

fn benchmark_encode(c: &mut Criterion) {
    let pixels = gradient(SIZE);

    c.bench_function("encode_512", |b| {
        b.iter(|| encode(black_box(&pixels), Normalization::Unit).unwrap())
    });
}

fn benchmark_decode(c: &mut Criterion) {
    let tensor = encode(&gradient(SIZE), Normalization::Unit).unwrap();

    c.bench_function("decode_512", |b| {
        b.iter(|| decode(black_box(&tensor), SIZE, SIZE, Normalization::Unit).unwrap())
    });
}

fn benchmark_blend(c: &mut Criterion) {
    let original = gradient(SIZE);
    let stylized = PixelBuffer::filled(SIZE, SIZE, [200, 40, 90, 255]);

    c.bench_function("blend_512_half", |b| {
        b.iter(|| blend(black_box(&original), black_box(&stylized), 0.5).unwrap())
    });
}

criterion_group!(benches, benchmark_encode, benchmark_decode, benchmark_blend);
criterion_main!(benches);
