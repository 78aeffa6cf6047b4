//! Adaptive tile scheduler ("DrawFractal"): splits the image across
//! worker rectangles, then recursively tiles each rectangle into quads,
//! corner-sampling and bilinearly interpolating where the corners agree
//! closely enough, and evaluating exhaustively where they don't.

use crate::rect::{partition, Rect};
use crate::task::{execute_blocking, Task, ThreadPool, WorkerContext, WorkerRoutine};
use crate::RenderError;
use mandelbrust_core::{select_kernel, Color, Fractal, IterationResult, RenderingParams};

/// A pixel buffer workers write into directly, with no per-pixel
/// synchronisation. `rect.rs::partition` splits the image into disjoint
/// rectangles handed one-to-one to workers, and every writer in this
/// crate (`draw_rect`/`draw_quad`, `anti_aliase`, `blur_whole_image`) only
/// ever touches pixels inside the rectangle it was given, so concurrent
/// `set` calls from different workers never touch the same cell — the
/// no-pixel-synchronisation contract §5 requires.
///
/// `get`/`set` go through a raw pointer into the backing allocation
/// rather than an `UnsafeCell<Vec<Color>>`, so no `&Vec`/`&mut Vec`
/// spanning the whole buffer is ever created while workers are writing:
/// each access borrows only the one `Color` it touches.
#[derive(Debug)]
pub struct PixelGrid {
    width: u32,
    height: u32,
    len: usize,
    ptr: *mut Color,
}

// SAFETY: every access goes through `ptr`, offset by an index computed
// from disjoint worker rectangles; no two threads ever touch the same
// offset, so sharing `&PixelGrid`/sending it across threads is sound.
unsafe impl Sync for PixelGrid {}
unsafe impl Send for PixelGrid {}

impl PixelGrid {
    pub fn new(width: u32, height: u32) -> Self {
        let len = (width as usize) * (height as usize);
        let mut buf = vec![Color::BLACK; len];
        let ptr = buf.as_mut_ptr();
        std::mem::forget(buf);
        Self {
            width,
            height,
            len,
            ptr,
        }
    }

    #[inline]
    fn index(&self, x: u32, y: u32) -> usize {
        (y as usize) * (self.width as usize) + (x as usize)
    }

    pub fn get(&self, x: u32, y: u32) -> Color {
        let idx = self.index(x, y);
        // SAFETY: `idx < self.len` by construction; no concurrent writer
        // ever targets this offset while it's being read.
        unsafe { self.ptr.add(idx).read() }
    }

    pub fn set(&self, x: u32, y: u32, color: Color) {
        let idx = self.index(x, y);
        // SAFETY: `idx < self.len` by construction; the disjoint-rectangle
        // discipline guarantees no other thread targets this offset.
        unsafe { self.ptr.add(idx).write(color) };
    }

    pub fn to_colors(&self) -> Vec<Color> {
        // SAFETY: called once every writer has joined past the task
        // substrate's barrier, so no concurrent writer remains; `ptr` is
        // valid for `len` elements since construction.
        unsafe { std::slice::from_raw_parts(self.ptr, self.len).to_vec() }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }
}

impl Drop for PixelGrid {
    fn drop(&mut self) {
        // SAFETY: `ptr` was obtained from a `Vec<Color>` of length and
        // capacity `self.len` via `mem::forget` in `new`, and is never
        // reallocated or freed elsewhere.
        unsafe {
            drop(Vec::from_raw_parts(self.ptr, self.len, self.len));
        }
    }
}

fn color_to_unit(c: Color) -> [f64; 3] {
    [
        c.r as f64 / 0xFFFF as f64,
        c.g as f64 / 0xFFFF as f64,
        c.b as f64 / 0xFFFF as f64,
    ]
}

/// Manhattan colour distance, normalised per-channel to `[0,1]`, averaged
/// over the three channels so the whole distance itself lies in `[0,1]`.
fn manhattan_distance(a: Color, b: Color) -> f64 {
    let a = color_to_unit(a);
    let b = color_to_unit(b);
    let sum: f64 = (0..3).map(|i| (a[i] - b[i]).abs()).sum();
    sum / 3.0
}

fn evaluate_pixel(
    fractal: &Fractal,
    rendering: &RenderingParams,
    kernel: mandelbrust_core::KernelFn,
    width: u32,
    height: u32,
    x: u32,
    y: u32,
) -> Color {
    let point = fractal.point_at(x as f64, y as f64, width as f64, height as f64);
    match kernel(fractal, rendering, point) {
        IterationResult::Interior => rendering.space_color,
        IterationResult::Escaped(v) => {
            let idx = mandelbrust_core::gradient_index(v, rendering);
            rendering.gradient.at(idx)
        }
    }
}

fn bilerp(tl: Color, tr: Color, bl: Color, br: Color, u: f64, v: f64) -> Color {
    let mix = |a: u16, b: u16, t: f64| -> f64 { a as f64 + (b as f64 - a as f64) * t };
    let top = [mix(tl.r, tr.r, u), mix(tl.g, tr.g, u), mix(tl.b, tr.b, u)];
    let bot = [mix(bl.r, br.r, u), mix(bl.g, br.g, u), mix(bl.b, br.b, u)];
    Color::new(
        (top[0] + (bot[0] - top[0]) * v)
            .round()
            .clamp(0.0, 0xFFFF as f64) as u16,
        (top[1] + (bot[1] - top[1]) * v)
            .round()
            .clamp(0.0, 0xFFFF as f64) as u16,
        (top[2] + (bot[2] - top[2]) * v)
            .round()
            .clamp(0.0, 0xFFFF as f64) as u16,
    )
}

/// Draws one worker's rectangle, tiling into quads of side `≤ quad_side`.
#[allow(clippy::too_many_arguments)]
fn draw_rect(
    grid: &PixelGrid,
    fractal: &Fractal,
    rendering: &RenderingParams,
    kernel: mandelbrust_core::KernelFn,
    rect: Rect,
    quad_side: u32,
    quad_threshold: f64,
    ctx: &WorkerContext,
) -> bool {
    let w = grid.width();
    let h = grid.height();

    if quad_side <= 1 {
        for y in rect.y..rect.y + rect.height {
            for x in rect.x..rect.x + rect.width {
                let c = evaluate_pixel(fractal, rendering, kernel, w, h, x, y);
                grid.set(x, y, c);
            }
            if ctx.checkpoint() {
                return true;
            }
        }
        return false;
    }

    let mut qy = rect.y;
    while qy < rect.y + rect.height {
        let qh = quad_side.min(rect.y + rect.height - qy);
        let mut qx = rect.x;
        while qx < rect.x + rect.width {
            let qw = quad_side.min(rect.x + rect.width - qx);
            draw_quad(
                grid,
                fractal,
                rendering,
                kernel,
                qx,
                qy,
                qw,
                qh,
                w,
                h,
                quad_threshold,
            );
            qx += qw;
        }
        qy += qh;
        if ctx.checkpoint() {
            return true;
        }
    }
    false
}

#[allow(clippy::too_many_arguments)]
fn draw_quad(
    grid: &PixelGrid,
    fractal: &Fractal,
    rendering: &RenderingParams,
    kernel: mandelbrust_core::KernelFn,
    qx: u32,
    qy: u32,
    qw: u32,
    qh: u32,
    width: u32,
    height: u32,
    threshold: f64,
) {
    let right = qx + qw - 1;
    let bottom = qy + qh - 1;

    let tl = evaluate_pixel(fractal, rendering, kernel, width, height, qx, qy);
    let tr = evaluate_pixel(fractal, rendering, kernel, width, height, right, qy);
    let bl = evaluate_pixel(fractal, rendering, kernel, width, height, qx, bottom);
    let br = evaluate_pixel(fractal, rendering, kernel, width, height, right, bottom);
    grid.set(qx, qy, tl);
    grid.set(right, qy, tr);
    grid.set(qx, bottom, bl);
    grid.set(right, bottom, br);
    if qw == 1 && qh == 1 {
        return;
    }

    let pairs = [(tl, tr), (tl, bl), (tl, br), (tr, bl), (tr, br), (bl, br)];
    let d: f64 = pairs
        .iter()
        .map(|(a, b)| manhattan_distance(*a, *b))
        .sum::<f64>()
        / pairs.len() as f64;

    if d < threshold {
        for y in qy..=bottom {
            for x in qx..=right {
                if (x == qx || x == right) && (y == qy || y == bottom) {
                    continue;
                }
                let u = if qw > 1 {
                    (x - qx) as f64 / (qw - 1) as f64
                } else {
                    0.0
                };
                let v = if qh > 1 {
                    (y - qy) as f64 / (qh - 1) as f64
                } else {
                    0.0
                };
                grid.set(x, y, bilerp(tl, tr, bl, br, u, v));
            }
        }
    } else {
        for y in qy..=bottom {
            for x in qx..=right {
                if (x == qx || x == right) && (y == qy || y == bottom) {
                    continue;
                }
                let c = evaluate_pixel(fractal, rendering, kernel, width, height, x, y);
                grid.set(x, y, c);
            }
        }
    }
}

/// Renders `fractal`/`rendering` into a fresh `width × height` grid on
/// `pool`, tiling each worker's rectangle into quads of side `quad_side`
/// and bilinearly interpolating quads whose corners agree within
/// `quad_threshold`. Returns `Err(RenderError::Cancelled)` if a
/// concurrent cancellation is observed.
#[allow(clippy::too_many_arguments)]
pub fn draw_fractal(
    pool: &ThreadPool,
    fractal: &Fractal,
    rendering: &RenderingParams,
    width: u32,
    height: u32,
    quad_side: u32,
    quad_threshold: f64,
    on_progress: Option<&(dyn Fn(f64) + Sync)>,
) -> Result<PixelGrid, RenderError> {
    if quad_side == 0 {
        return Err(RenderError::InvalidQuadSide(quad_side));
    }
    if quad_threshold < 0.0 {
        return Err(RenderError::InvalidThreshold(quad_threshold));
    }
    let grid = PixelGrid::new(width, height);
    if width < 2 || height < 2 {
        return Ok(grid);
    }

    let kernel = select_kernel(fractal);
    let worker_count = pool
        .size()
        .min((width as u64 * height as u64) as usize)
        .max(1);
    let rects = partition(width, height, worker_count);

    let routines: Vec<WorkerRoutine> = rects
        .into_iter()
        .map(|rect| {
            let grid = &grid;
            Box::new(move |ctx: &WorkerContext| {
                draw_rect(
                    grid,
                    fractal,
                    rendering,
                    kernel,
                    rect,
                    quad_side,
                    quad_threshold,
                    ctx,
                );
                ctx.set_progress(100);
            }) as WorkerRoutine
        })
        .collect();

    let outcome = execute_blocking(pool, Task::leaf(routines), on_progress);
    match outcome {
        crate::task::TaskOutcome::Completed => Ok(grid),
        crate::task::TaskOutcome::Cancelled => Err(RenderError::Cancelled),
    }
}
