use crate::rect::partition;
use crate::task::{execute_blocking, Task, ThreadPool, WorkerContext, WorkerRoutine};
use crate::tile::PixelGrid;
use mandelbrust_core::Color;

/// A separable 1-D Gaussian filter of radius `r`, `σ = r/3`, normalised to
/// sum 1. Used for both directions of §4.4's AA refiltering pass and for
/// the whole-image `-a blur` post-process.
#[derive(Debug, Clone)]
pub struct GaussianFilter1D {
    pub radius: u32,
    weights: Vec<f64>,
}

impl GaussianFilter1D {
    pub fn new(radius: u32) -> Self {
        let sigma = radius as f64 / 3.0;
        let n = (2 * radius + 1) as usize;
        let mut weights = vec![0.0; n];
        let mut sum = 0.0;
        for (i, w) in weights.iter_mut().enumerate() {
            let offset = i as f64 - radius as f64;
            *w = (-(offset * offset) / (2.0 * sigma * sigma)).exp();
            sum += *w;
        }
        if sum > 0.0 {
            for w in weights.iter_mut() {
                *w /= sum;
            }
        }
        Self { radius, weights }
    }

    #[inline]
    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    /// Applies the filter horizontally at `(x, y)`, clamping to the image
    /// edge. `height` is the number of rows in `samples` (for bounds
    /// checking only; the sampled row never moves).
    pub fn apply_horizontal(
        &self,
        samples: &[Color],
        width: u32,
        height: u32,
        x: i64,
        y: u32,
    ) -> Color {
        self.apply_1d(samples, width, height, 1, 0, x, y as i64)
    }

    /// Applies the filter vertically at `(x, y)`, clamping to the image
    /// edge.
    pub fn apply_vertical(
        &self,
        samples: &[Color],
        width: u32,
        height: u32,
        x: u32,
        y: i64,
    ) -> Color {
        self.apply_1d(samples, width, height, 0, 1, x as i64, y)
    }

    #[allow(clippy::too_many_arguments)]
    fn apply_1d(
        &self,
        samples: &[Color],
        width: u32,
        height: u32,
        dx: i64,
        dy: i64,
        fixed_x: i64,
        fixed_y: i64,
    ) -> Color {
        let r = self.radius as i64;
        let mut acc = [0.0f64; 3];
        for (i, &w) in self.weights.iter().enumerate() {
            let offset = i as i64 - r;
            let sx = (fixed_x + offset * dx).clamp(0, width as i64 - 1);
            let sy = (fixed_y + offset * dy).clamp(0, height as i64 - 1);
            let idx = (sy as usize) * (width as usize) + (sx as usize);
            let c = samples[idx];
            acc[0] += w * c.r as f64;
            acc[1] += w * c.g as f64;
            acc[2] += w * c.b as f64;
        }
        Color::new(
            acc[0].round().clamp(0.0, 0xFFFF as f64) as u16,
            acc[1].round().clamp(0.0, 0xFFFF as f64) as u16,
            acc[2].round().clamp(0.0, 0xFFFF as f64) as u16,
        )
    }
}

/// Whole-image separable Gaussian blur (the CLI's `-a blur` mode): every
/// pixel is replaced, unconditionally, by its filtered neighbourhood —
/// unlike [`crate::aa::anti_aliase`], there is no dissimilarity gate.
pub fn blur_whole_image(pool: &ThreadPool, source: &PixelGrid, radius: u32) -> PixelGrid {
    let width = source.width();
    let height = source.height();
    let filter = GaussianFilter1D::new(radius);

    let samples = source.to_colors();
    let horizontal = PixelGrid::new(width, height);
    let worker_count = pool
        .size()
        .min((width as u64 * height as u64) as usize)
        .max(1);

    let routines: Vec<WorkerRoutine> = partition(width, height, worker_count)
        .into_iter()
        .map(|rect| {
            let horizontal = &horizontal;
            let samples = &samples;
            let filter = &filter;
            Box::new(move |ctx: &WorkerContext| {
                for y in rect.y..rect.y + rect.height {
                    for x in rect.x..rect.x + rect.width {
                        horizontal.set(
                            x,
                            y,
                            filter.apply_horizontal(samples, width, height, x as i64, y),
                        );
                    }
                    if ctx.checkpoint() {
                        return;
                    }
                }
            }) as WorkerRoutine
        })
        .collect();
    execute_blocking(pool, Task::leaf(routines), None);

    let h_samples = horizontal.to_colors();
    let out = PixelGrid::new(width, height);
    let routines: Vec<WorkerRoutine> = partition(width, height, worker_count)
        .into_iter()
        .map(|rect| {
            let out = &out;
            let h_samples = &h_samples;
            let filter = &filter;
            Box::new(move |ctx: &WorkerContext| {
                for y in rect.y..rect.y + rect.height {
                    for x in rect.x..rect.x + rect.width {
                        out.set(
                            x,
                            y,
                            filter.apply_vertical(h_samples, width, height, x, y as i64),
                        );
                    }
                    if ctx.checkpoint() {
                        return;
                    }
                }
            }) as WorkerRoutine
        })
        .collect();
    execute_blocking(pool, Task::leaf(routines), None);

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weights_sum_to_one() {
        let f = GaussianFilter1D::new(3);
        let sum: f64 = f.weights().iter().sum();
        assert!((sum - 1.0).abs() < 1e-9);
    }

    #[test]
    fn weights_are_symmetric() {
        let f = GaussianFilter1D::new(4);
        let w = f.weights();
        for i in 0..w.len() / 2 {
            assert!((w[i] - w[w.len() - 1 - i]).abs() < 1e-12);
        }
    }

    #[test]
    fn uniform_image_is_unchanged_by_filtering() {
        let samples = vec![Color::new(100, 150, 200); 9];
        let f = GaussianFilter1D::new(1);
        let out = f.apply_horizontal(&samples, 3, 3, 1, 1);
        assert_eq!(out, Color::new(100, 150, 200));
    }

    #[test]
    fn blur_leaves_uniform_image_unchanged() {
        let source = PixelGrid::new(6, 6);
        for y in 0..6 {
            for x in 0..6 {
                source.set(x, y, Color::new(10, 20, 30));
            }
        }
        let pool = ThreadPool::new(2);
        let blurred = blur_whole_image(&pool, &source, 2);
        for y in 0..6 {
            for x in 0..6 {
                assert_eq!(blurred.get(x, y), Color::new(10, 20, 30));
            }
        }
    }

    #[test]
    fn blur_smooths_a_sharp_edge() {
        let source = PixelGrid::new(8, 1);
        for x in 0..8 {
            source.set(x, 0, if x < 4 { Color::BLACK } else { Color::WHITE });
        }
        let pool = ThreadPool::new(2);
        let blurred = blur_whole_image(&pool, &source, 2);
        // a pixel straddling the edge should land strictly between black
        // and white, unlike the untouched source.
        assert!(blurred.get(4, 0).r > 0 && blurred.get(4, 0).r < 0xFFFF);
    }
}
