//! Per-pixel fractal evaluation.
//!
//! [`select_kernel`] picks, once per render (never per pixel), the
//! monomorphized step function matching `(formula, pIsInt)`; the returned
//! function pointer is what the tile scheduler actually calls for every
//! pixel. Coloring/addend/interpolation/counting choices are read from
//! [`RenderingParams`] inside that single call, which keeps the dispatch a
//! table lookup rather than a per-pixel cascade of formula checks.

use crate::complex::Complex;
use crate::float::Float;
use crate::fractal::{Formula, Fractal, IterationResult};
use crate::rendering::{
    AddendFunction, ColoringMethod, CountingFunction, InterpolationMethod, RenderingParams,
};

/// A specialised kernel: evaluates one world-space point under a given
/// fractal/rendering configuration.
pub type KernelFn = fn(&Fractal, &RenderingParams, Complex) -> IterationResult;

/// Picks the monomorphized step implementation for `fractal.formula` and
/// `fractal.p_is_int`. A single match, evaluated once per render.
pub fn select_kernel(fractal: &Fractal) -> KernelFn {
    match (fractal.formula, fractal.p_is_int) {
        (Formula::Mandelbrot, _) => evaluate::<MandelbrotStep>,
        (Formula::MandelbrotP, true) => evaluate::<MandelbrotPIntStep>,
        (Formula::MandelbrotP, false) => evaluate::<MandelbrotPRealStep>,
        (Formula::Julia, _) => evaluate::<JuliaStep>,
        (Formula::JuliaP, true) => evaluate::<JuliaPIntStep>,
        (Formula::JuliaP, false) => evaluate::<JuliaPRealStep>,
        (Formula::Rudy, true) => evaluate::<RudyIntStep>,
        (Formula::Rudy, false) => evaluate::<RudyRealStep>,
    }
}

/// A formula's initial value and per-iteration step, generalised so the
/// evaluator body is shared and only this trait's two methods are
/// monomorphized per formula.
trait Step {
    /// Returns `(z0, c)` for the given pixel point.
    fn init(pixel: Complex, fractal: &Fractal) -> (Complex, Complex);
    fn step(z: Complex, c: Complex, fractal: &Fractal) -> Complex;
}

struct MandelbrotStep;
impl Step for MandelbrotStep {
    #[inline]
    fn init(pixel: Complex, _fractal: &Fractal) -> (Complex, Complex) {
        (Complex::ZERO, pixel)
    }
    #[inline]
    fn step(z: Complex, c: Complex, _fractal: &Fractal) -> Complex {
        z.square() + c
    }
}

struct MandelbrotPIntStep;
impl Step for MandelbrotPIntStep {
    #[inline]
    fn init(pixel: Complex, _fractal: &Fractal) -> (Complex, Complex) {
        (Complex::ZERO, pixel)
    }
    #[inline]
    fn step(z: Complex, c: Complex, fractal: &Fractal) -> Complex {
        z.ipow(fractal.p_int as u32) + c
    }
}

struct MandelbrotPRealStep;
impl Step for MandelbrotPRealStep {
    #[inline]
    fn init(pixel: Complex, _fractal: &Fractal) -> (Complex, Complex) {
        (Complex::ZERO, pixel)
    }
    #[inline]
    fn step(z: Complex, c: Complex, fractal: &Fractal) -> Complex {
        z.powf(fractal.p) + c
    }
}

struct JuliaStep;
impl Step for JuliaStep {
    #[inline]
    fn init(pixel: Complex, fractal: &Fractal) -> (Complex, Complex) {
        (pixel, fractal.c)
    }
    #[inline]
    fn step(z: Complex, c: Complex, _fractal: &Fractal) -> Complex {
        z.square() + c
    }
}

struct JuliaPIntStep;
impl Step for JuliaPIntStep {
    #[inline]
    fn init(pixel: Complex, fractal: &Fractal) -> (Complex, Complex) {
        (pixel, fractal.c)
    }
    #[inline]
    fn step(z: Complex, c: Complex, fractal: &Fractal) -> Complex {
        z.ipow(fractal.p_int as u32) + c
    }
}

struct JuliaPRealStep;
impl Step for JuliaPRealStep {
    #[inline]
    fn init(pixel: Complex, fractal: &Fractal) -> (Complex, Complex) {
        (pixel, fractal.c)
    }
    #[inline]
    fn step(z: Complex, c: Complex, fractal: &Fractal) -> Complex {
        z.powf(fractal.p) + c
    }
}

struct RudyIntStep;
impl Step for RudyIntStep {
    #[inline]
    fn init(pixel: Complex, _fractal: &Fractal) -> (Complex, Complex) {
        (Complex::ZERO, pixel)
    }
    #[inline]
    fn step(z: Complex, c: Complex, fractal: &Fractal) -> Complex {
        z.ipow(fractal.p_int as u32) + fractal.c * z + c
    }
}

struct RudyRealStep;
impl Step for RudyRealStep {
    #[inline]
    fn init(pixel: Complex, _fractal: &Fractal) -> (Complex, Complex) {
        (Complex::ZERO, pixel)
    }
    #[inline]
    fn step(z: Complex, c: Complex, fractal: &Fractal) -> Complex {
        z.powf(fractal.p) + fractal.c * z + c
    }
}

/// Running per-orbit bookkeeping for the `Average` coloring method.
///
/// `history[k]` holds the contribution computed after the `k`-th step, or
/// `None` when that step's denominator vanished (a null contribution that
/// does not count toward any suffix average).
struct Orbit {
    history: Vec<Option<Float>>,
    zs: [Complex; 2], // z_{n-1}, z_{n-2}, most recent first
    filled: usize,
}

impl Orbit {
    fn new(max_iter: u32) -> Self {
        Self {
            history: Vec::with_capacity(max_iter as usize + 1),
            zs: [Complex::ZERO; 2],
            filled: 0,
        }
    }

    /// Suffix mean from offset `i`, per §4.2's `S_i` definition. Yields 0
    /// when the suffix is empty or every entry in it was a null
    /// contribution.
    fn sum_at(&self, i: usize) -> Float {
        if i >= self.history.len() {
            return 0.0;
        }
        let mut total = 0.0;
        let mut count = 0u32;
        for v in self.history[i..].iter().flatten() {
            total += v;
            count += 1;
        }
        if count == 0 {
            0.0
        } else {
            total / count as Float
        }
    }
}

#[inline]
fn counting_value(fn_kind: CountingFunction, n: u32, z: Complex, fractal: &Fractal) -> Float {
    let r = z.norm();
    match fn_kind {
        CountingFunction::Discrete => n as Float,
        CountingFunction::Continuous => {
            n as Float
                + (fractal.escape_radius_p - r) / (fractal.escape_radius_p - fractal.escape_radius)
        }
        CountingFunction::Smooth => {
            n as Float + 1.0 + ((fractal.log_escape_radius / r.ln()).ln()) / fractal.p.ln()
        }
    }
}

#[inline]
fn interpolate(method: InterpolationMethod, d: Float, orbit: &Orbit) -> Float {
    match method {
        InterpolationMethod::None => orbit.sum_at(0),
        InterpolationMethod::Linear => d * orbit.sum_at(0) + (1.0 - d) * orbit.sum_at(1),
        InterpolationMethod::Spline => {
            let (s0, s1, s2, s3) = (
                orbit.sum_at(0),
                orbit.sum_at(1),
                orbit.sum_at(2),
                orbit.sum_at(3),
            );
            let d2 = d * d;
            let d3 = d2 * d;
            ((-d2 + d3) * s0
                + (d + 4.0 * d2 - 3.0 * d3) * s1
                + (2.0 - 5.0 * d2 + 3.0 * d3) * s2
                + (-d + 2.0 * d2 - d3) * s3)
                / 2.0
        }
    }
}

/// The shared evaluator body, generic over the formula's step function.
fn evaluate<S: Step>(
    fractal: &Fractal,
    rendering: &RenderingParams,
    pixel: Complex,
) -> IterationResult {
    let (mut z, c) = S::init(pixel, fractal);
    let mut n = 0u32;
    let want_orbit = rendering.coloring_method == ColoringMethod::Average;
    let mut orbit = if want_orbit {
        Some(Orbit::new(fractal.max_iter))
    } else {
        None
    };

    while n < fractal.max_iter && z.norm2() < fractal.escape_radius2 {
        let prev = z;
        let new_z = S::step(z, c, fractal);
        if let Some(orbit) = orbit.as_mut() {
            push_addend(
                orbit,
                prev,
                new_z,
                c,
                fractal,
                rendering.addend_fn,
                rendering.stripe_density,
            );
        }
        z = new_z;
        n += 1;
    }

    if z.norm2() < fractal.escape_radius2 {
        return IterationResult::Interior;
    }

    let scalar = match rendering.coloring_method {
        ColoringMethod::IterationCount => counting_value(rendering.counting_fn, n, z, fractal),
        ColoringMethod::Average => {
            let smooth = counting_value(CountingFunction::Smooth, n, z, fractal);
            let d = smooth.fract();
            interpolate(rendering.interpolation_method, d, orbit.as_ref().unwrap())
        }
    };
    IterationResult::Escaped(scalar.max(0.0))
}

/// Pushes one step's addend contribution, threading `stripe_density`
/// explicitly (it lives on [`RenderingParams`], not [`Fractal`]).
fn push_addend(
    orbit: &mut Orbit,
    prev: Complex,
    new_z: Complex,
    c: Complex,
    fractal: &Fractal,
    addend: AddendFunction,
    stripe_density: Float,
) {
    let contribution = match addend {
        AddendFunction::TriangleInequality => {
            let prev_p = prev.powf(fractal.p).norm();
            let c_norm = c.norm();
            let m = (prev_p - c_norm).abs();
            let big_m = prev_p + c_norm;
            let r = new_z.norm();
            let denom = big_m - m;
            if denom == 0.0 {
                None
            } else {
                Some((r - m) / denom)
            }
        }
        AddendFunction::Curvature => {
            if orbit.filled < 2 {
                None
            } else {
                let z1 = orbit.zs[0];
                let z2 = orbit.zs[1];
                let denom = z1 - z2;
                if denom.norm2() == 0.0 {
                    None
                } else {
                    Some(((new_z - z1) / denom).arg().abs())
                }
            }
        }
        AddendFunction::Stripe => Some(((stripe_density * new_z.arg()).sin() + 1.0) / 2.0),
    };
    orbit.history.push(contribution);
    orbit.zs[1] = orbit.zs[0];
    orbit.zs[0] = new_z;
    orbit.filled += 1;
}

/// The transfer/gradient stage: applies the configured transfer function,
/// scales by `multiplier · gradientLen`, offsets by `offset · gradientLen`,
/// and truncates to a (wrapping) gradient index.
pub fn gradient_index(scalar: Float, rendering: &RenderingParams) -> i64 {
    let gradient_len = rendering.gradient.len() as Float;
    let t = rendering.transfer_fn.apply(scalar);
    let scaled = t * rendering.multiplier * gradient_len + rendering.offset * gradient_len;
    scaled as i64
}
