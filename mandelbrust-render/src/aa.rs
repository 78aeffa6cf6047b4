//! Adaptive anti-alias pass ("AntiAliase"): selectively super-samples
//! pixels whose 8-neighbourhood disagrees with them by more than a
//! threshold, replacing only those with a filtered A×A super-sample.

use crate::filter::GaussianFilter1D;
use crate::rect::partition;
use crate::task::{execute_blocking, Task, ThreadPool, WorkerContext, WorkerRoutine};
use crate::tile::PixelGrid;
use crate::RenderError;
use mandelbrust_core::{select_kernel, Color, Fractal, IterationResult, RenderingParams};

fn color_to_unit(c: Color) -> [f64; 3] {
    [
        c.r as f64 / 0xFFFF as f64,
        c.g as f64 / 0xFFFF as f64,
        c.b as f64 / 0xFFFF as f64,
    ]
}

fn manhattan_distance(a: Color, b: Color) -> f64 {
    let a = color_to_unit(a);
    let b = color_to_unit(b);
    let sum: f64 = (0..3).map(|i| (a[i] - b[i]).abs()).sum();
    sum / 3.0
}

fn neighbour_dissimilarity(snapshot: &PixelGrid, x: u32, y: u32) -> f64 {
    let w = snapshot.width();
    let h = snapshot.height();
    let c0 = snapshot.get(x, y);
    let mut max_d: f64 = 0.0;
    for dy in -1i64..=1 {
        for dx in -1i64..=1 {
            if dx == 0 && dy == 0 {
                continue;
            }
            let nx = (x as i64 + dx).clamp(0, w as i64 - 1) as u32;
            let ny = (y as i64 + dy).clamp(0, h as i64 - 1) as u32;
            let d = manhattan_distance(c0, snapshot.get(nx, ny));
            if d > max_d {
                max_d = d;
            }
        }
    }
    max_d
}

#[allow(clippy::too_many_arguments)]
fn supersample_pixel(
    fractal: &Fractal,
    rendering: &RenderingParams,
    kernel: mandelbrust_core::KernelFn,
    filter: &GaussianFilter1D,
    width: u32,
    height: u32,
    x: u32,
    y: u32,
    grid_side: u32,
) -> Color {
    let samples_side = grid_side as usize;
    let mut samples = vec![Color::BLACK; samples_side * samples_side];
    let full_width = width as u64 * grid_side as u64;
    let full_height = height as u64 * grid_side as u64;
    for l in 0..samples_side {
        for k in 0..samples_side {
            let sub_x = x as f64 * grid_side as f64 + k as f64;
            let sub_y = y as f64 * grid_side as f64 + l as f64;
            let point = fractal.point_at(sub_x, sub_y, full_width as f64, full_height as f64);
            let value = match kernel(fractal, rendering, point) {
                IterationResult::Interior => rendering.space_color,
                IterationResult::Escaped(v) => {
                    let idx = mandelbrust_core::gradient_index(v, rendering);
                    rendering.gradient.at(idx)
                }
            };
            samples[l * samples_side + k] = value;
        }
    }

    let mut horizontal = vec![Color::BLACK; samples_side * samples_side];
    for l in 0..samples_side {
        for k in 0..samples_side {
            horizontal[l * samples_side + k] =
                filter.apply_horizontal(&samples, grid_side, grid_side, k as i64, l as u32);
        }
    }
    let centre = (samples_side / 2) as u32;
    filter.apply_vertical(&horizontal, grid_side, grid_side, centre, centre as i64)
}

/// Refines `source` in place, copying its untouched pixels forward and
/// replacing only those whose 8-neighbourhood disagrees by more than
/// `threshold` with an `grid_side × grid_side` super-sampled, Gaussian-
/// filtered replacement.
#[allow(clippy::too_many_arguments)]
pub fn anti_aliase(
    pool: &ThreadPool,
    fractal: &Fractal,
    rendering: &RenderingParams,
    source: &PixelGrid,
    grid_side: u32,
    threshold: f64,
    on_progress: Option<&(dyn Fn(f64) + Sync)>,
) -> Result<PixelGrid, RenderError> {
    if grid_side == 0 {
        return Err(RenderError::InvalidAaGrid(grid_side));
    }
    let width = source.width();
    let height = source.height();
    let out = PixelGrid::new(width, height);
    for y in 0..height {
        for x in 0..width {
            out.set(x, y, source.get(x, y));
        }
    }
    if grid_side < 2 {
        return Ok(out);
    }

    let kernel = select_kernel(fractal);
    let filter = GaussianFilter1D::new(grid_side);
    let worker_count = pool
        .size()
        .min((width as u64 * height as u64) as usize)
        .max(1);
    let rects = partition(width, height, worker_count);

    let routines: Vec<WorkerRoutine> = rects
        .into_iter()
        .map(|rect| {
            let out = &out;
            let filter = &filter;
            Box::new(move |ctx: &WorkerContext| {
                for y in rect.y..rect.y + rect.height {
                    for x in rect.x..rect.x + rect.width {
                        let delta = neighbour_dissimilarity(source, x, y);
                        if delta > threshold {
                            let refined = supersample_pixel(
                                fractal, rendering, kernel, filter, width, height, x, y, grid_side,
                            );
                            out.set(x, y, refined);
                        }
                    }
                    if ctx.checkpoint() {
                        return;
                    }
                }
                ctx.set_progress(100);
            }) as WorkerRoutine
        })
        .collect();

    match execute_blocking(pool, Task::leaf(routines), on_progress) {
        crate::task::TaskOutcome::Completed => Ok(out),
        crate::task::TaskOutcome::Cancelled => Err(RenderError::Cancelled),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tile::draw_fractal;
    use mandelbrust_core::{
        AddendFunction, ColoringMethod, CountingFunction, Fractal as CoreFractal, Gradient,
        InterpolationMethod, TransferFunction,
    };

    fn rendering() -> RenderingParams {
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

    #[test]
    fn a_less_than_2_is_a_no_op() {
        let fractal = CoreFractal::default_mandelbrot();
        let rendering = rendering();
        let pool = ThreadPool::new(2);
        let source = draw_fractal(&pool, &fractal, &rendering, 4, 4, 1, 0.0035, None).unwrap();
        let refined = anti_aliase(&pool, &fractal, &rendering, &source, 1, 0.05, None).unwrap();
        for y in 0..4 {
            for x in 0..4 {
                assert_eq!(source.get(x, y), refined.get(x, y));
            }
        }
    }

    #[test]
    fn idempotent_when_threshold_already_satisfied() {
        // A second AA pass over an already-smoothed image must change
        // (almost) nothing: a handful of pixels can still flip at the
        // boundary of a just-refined region, where the first pass itself
        // introduced a sharp new edge against an untouched neighbour.
        let fractal = CoreFractal::default_mandelbrot();
        let rendering = rendering();
        let pool = ThreadPool::new(2);
        let source = draw_fractal(&pool, &fractal, &rendering, 128, 128, 1, 0.0035, None).unwrap();
        let once = anti_aliase(&pool, &fractal, &rendering, &source, 3, 0.05, None).unwrap();
        let twice = anti_aliase(&pool, &fractal, &rendering, &once, 3, 0.05, None).unwrap();
        let mut changed = 0;
        for y in 0..128 {
            for x in 0..128 {
                if once.get(x, y) != twice.get(x, y) {
                    changed += 1;
                }
            }
        }
        assert!(
            changed < (128 * 128) / 100,
            "second pass changed too many pixels: {changed}"
        );
    }

    #[test]
    fn rejects_zero_grid_side() {
        let fractal = CoreFractal::default_mandelbrot();
        let rendering = rendering();
        let pool = ThreadPool::new(1);
        let source = PixelGrid::new(2, 2);
        let err = anti_aliase(&pool, &fractal, &rendering, &source, 0, 0.05, None).unwrap_err();
        assert!(matches!(err, RenderError::InvalidAaGrid(0)));
    }
}
