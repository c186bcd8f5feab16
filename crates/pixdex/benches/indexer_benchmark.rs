use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use image::{Rgba, RgbaImage};
use pixdex::{build_palette, extract_colormap, index_sequence, FrameIndexer};
use std::hint::black_box;

fn generate_gradient_rgba(width: u32, height: u32) -> RgbaImage {
    RgbaImage::from_fn(width, height, |x, y| {
        let r = ((x * 255) / width.max(1)) as u8;
        let g = ((y * 255) / height.max(1)) as u8;
        let b = 128;
        Rgba([r, g, b, 255])
    })
}

fn bench_build_palette(c: &mut Criterion) {
    let colormap = generate_gradient_rgba(256, 64);

    c.bench_function("build_palette_gradient_256x64", |b| {
        b.iter(|| {
            let result = build_palette(black_box(&colormap), 255);
            assert!(result.is_ok());
            result
        })
    });
}

fn bench_index_frame(c: &mut Criterion) {
    let palette = build_palette(&generate_gradient_rgba(64, 64), 64).unwrap();
    let indexer = FrameIndexer::new(&palette).unwrap();

    let mut group = c.benchmark_group("index_frame");
    for size in [32u32, 128, 320] {
        // mostly colors outside the palette, so the nearest search dominates
        let frame = generate_gradient_rgba(size, size);
        group.bench_with_input(BenchmarkId::new("gradient", size), &frame, |b, frame| {
            b.iter(|| indexer.index_frame(black_box(frame)))
        });
    }
    group.finish();
}

fn bench_index_sequence(c: &mut Criterion) {
    let palette = build_palette(&generate_gradient_rgba(64, 64), 255).unwrap();
    let indexer = FrameIndexer::new(&palette).unwrap();
    let frames: Vec<RgbaImage> = (0..16).map(|_| generate_gradient_rgba(128, 64)).collect();

    c.bench_function("index_sequence_16x128x64", |b| {
        b.iter(|| {
            let mut out = Vec::with_capacity(16 * 128 * 64);
            let result = index_sequence(
                frames.iter().cloned().map(Ok),
                &indexer,
                black_box(&mut out),
            );
            assert!(result.is_ok());
            out
        })
    });
}

fn bench_extract_colormap(c: &mut Criterion) {
    let img = generate_gradient_rgba(200, 150);

    c.bench_function("extract_colormap_200x150", |b| {
        b.iter(|| {
            let result = extract_colormap(black_box(&img), 255);
            assert!(result.is_ok());
            result
        })
    });
}

criterion_group!(
    benches,
    bench_build_palette,
    bench_index_frame,
    bench_index_sequence,
    bench_extract_colormap
);
criterion_main!(benches);
