//! Benchmarks for sv operations.
//!
//! Run with: `cargo bench`

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};

use sv_color::{ChromaUpsampling, ConvertOptions, convert, convert_with};
use sv_core::{Image, Orientation, PixelFormat};
use sv_ops::{Interpolation, resize_with, rotate, warp};

const SIZES: [(u32, u32); 2] = [(640, 480), (1920, 1080)];

fn frame(width: u32, height: u32, format: PixelFormat) -> Image {
    let mut img = Image::new(width, height, format, Orientation::TopLeft).unwrap();
    for plane in 0..img.plane_count() {
        let ext = img.plane_extent(plane);
        for y in 0..ext.height {
            let row: Vec<u8> = (0..ext.row_bytes()).map(|i| (i as u32 ^ y) as u8).collect();
            img.write_row(plane, y, &row).unwrap();
        }
    }
    img
}

fn pixels(width: u32, height: u32) -> Throughput {
    Throughput::Elements(u64::from(width) * u64::from(height))
}

/// Benchmark orientation changes.
fn bench_rotate(c: &mut Criterion) {
    let mut group = c.benchmark_group("rotate");

    for (w, h) in SIZES {
        group.throughput(pixels(w, h));
        for format in [PixelFormat::BGRA, PixelFormat::NV12] {
            let img = frame(w, h, format);
            for target in [Orientation::RightTop, Orientation::BottomRight] {
                let name = format!("{format}/{}", target.code());
                let id = BenchmarkId::new(name, format!("{w}x{h}"));
                group.bench_with_input(id, &img, |b, img| {
                    b.iter(|| rotate(black_box(img), target).unwrap())
                });
            }
        }
    }

    group.finish();
}

/// Benchmark half-size resampling.
fn bench_resize(c: &mut Criterion) {
    let mut group = c.benchmark_group("resize");

    for (w, h) in SIZES {
        group.throughput(pixels(w, h));
        let img = frame(w, h, PixelFormat::J420);
        for interp in [Interpolation::Nearest, Interpolation::Bilinear] {
            let id = BenchmarkId::new(format!("{interp:?}"), format!("{w}x{h}"));
            group.bench_with_input(id, &img, |b, img| {
                b.iter(|| resize_with(black_box(img), w / 2, h / 2, interp).unwrap())
            });
        }
    }

    group.finish();
}

/// Benchmark a small rotation plus zoom.
fn bench_warp(c: &mut Criterion) {
    let mut group = c.benchmark_group("warp");

    let (sin, cos) = 0.1f32.sin_cos();
    let matrix = [cos * 0.9, -sin, 12.0, sin, cos * 0.9, -8.0];
    for (w, h) in SIZES {
        group.throughput(pixels(w, h));
        let img = frame(w, h, PixelFormat::NV21);
        group.bench_with_input(BenchmarkId::new("nv21", format!("{w}x{h}")), &img, |b, img| {
            b.iter(|| warp(black_box(img), matrix, w, h).unwrap())
        });
    }

    group.finish();
}

/// Benchmark the common capture and display conversions.
fn bench_convert(c: &mut Criterion) {
    let mut group = c.benchmark_group("convert");

    let bilinear = ConvertOptions {
        chroma_upsampling: ChromaUpsampling::Bilinear,
    };
    for (w, h) in SIZES {
        group.throughput(pixels(w, h));
        let bgra = frame(w, h, PixelFormat::BGRA);
        let nv12 = frame(w, h, PixelFormat::NV12);

        let id = BenchmarkId::new("bgra_to_nv12", format!("{w}x{h}"));
        group.bench_with_input(id, &bgra, |b, img| {
            b.iter(|| convert(black_box(img), PixelFormat::NV12).unwrap())
        });
        let id = BenchmarkId::new("bgra_to_gray8", format!("{w}x{h}"));
        group.bench_with_input(id, &bgra, |b, img| {
            b.iter(|| convert(black_box(img), PixelFormat::GRAY8).unwrap())
        });
        let id = BenchmarkId::new("nv12_to_rgb", format!("{w}x{h}"));
        group.bench_with_input(id, &nv12, |b, img| {
            b.iter(|| convert(black_box(img), PixelFormat::RGB).unwrap())
        });
        group.bench_with_input(
            BenchmarkId::new("nv12_to_rgb_bilinear", format!("{w}x{h}")),
            &nv12,
            |b, img| b.iter(|| convert_with(black_box(img), PixelFormat::RGB, bilinear).unwrap()),
        );
    }

    group.finish();
}

criterion_group!(benches, bench_rotate, bench_resize, bench_warp, bench_convert);
criterion_main!(benches);
