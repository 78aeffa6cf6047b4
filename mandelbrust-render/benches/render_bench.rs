use criterion::{criterion_group, criterion_main, Criterion};

use mandelbrust_core::{
    AddendFunction, Color, ColoringMethod, CountingFunction, Fractal, Gradient,
    InterpolationMethod, RenderingParams, TransferFunction,
};
use mandelbrust_render::{anti_aliase, draw_fractal, ThreadPool};

fn discrete_rendering() -> RenderingParams {
    RenderingParams::new(
        1,
        Color::BLACK,
        CountingFunction::Discrete,
        ColoringMethod::IterationCount,
        AddendFunction::TriangleInequality,
        1.0,
        InterpolationMethod::None,
        TransferFunction::Identity,
        0.025,
        0.0,
        Gradient::new(&[Color::BLACK, Color::WHITE], 65536).unwrap(),
    )
    .unwrap()
}

fn bench_full_frame_render(c: &mut Criterion) {
    let fractal = Fractal::default_mandelbrot();
    let rendering = discrete_rendering();
    let pool = ThreadPool::new(8);

    c.bench_function("draw_fractal_640x480", |b| {
        b.iter(|| draw_fractal(&pool, &fractal, &rendering, 640, 480, 5, 0.0035, None).unwrap());
    });
}

fn bench_iteration_throughput(c: &mut Criterion) {
    let fractal = Fractal::new(
        mandelbrust_core::Formula::Mandelbrot,
        mandelbrust_core::Complex::new(-0.5, 0.0),
        1.28,
        1.28,
        mandelbrust_core::Complex::ZERO,
        2.0,
        2.0,
        1000,
    )
    .unwrap();
    let rendering = discrete_rendering();
    let pool = ThreadPool::new(8);

    c.bench_function("draw_fractal_256x256_1000iter", |b| {
        b.iter(|| draw_fractal(&pool, &fractal, &rendering, 256, 256, 5, 0.0035, None).unwrap());
    });
}

fn bench_adaptive_aa(c: &mut Criterion) {
    let fractal = Fractal::default_mandelbrot();
    let rendering = discrete_rendering();
    let pool = ThreadPool::new(8);
    let base = draw_fractal(&pool, &fractal, &rendering, 640, 480, 5, 0.0035, None).unwrap();

    c.bench_function("anti_aliase_640x480", |b| {
        b.iter(|| anti_aliase(&pool, &fractal, &rendering, &base, 3, 0.0505, None).unwrap());
    });
}

criterion_group!(
    benches,
    bench_full_frame_render,
    bench_iteration_throughput,
    bench_adaptive_aa
);
criterion_main!(benches);
