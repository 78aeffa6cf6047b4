use crate::complex::Complex;
use crate::error::CoreError;
use crate::float::Float;

/// Which escape-time formula a [`Fractal`] iterates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Formula {
    /// z₀ = 0, c = pixel; z ← z² + c.
    Mandelbrot,
    /// z₀ = 0, c = pixel; z ← z^p + c.
    MandelbrotP,
    /// z₀ = pixel, c = fractal.c; z ← z² + c.
    Julia,
    /// z₀ = pixel, c = fractal.c; z ← z^p + c.
    JuliaP,
    /// z₀ = 0, c = pixel, d = fractal.c; z ← z^p + d·z + c.
    Rudy,
}

/// The distinguished return of a kernel: either an escape scalar (always
/// non-negative) or the "didn't escape" sentinel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum IterationResult {
    Escaped(Float),
    Interior,
}

impl IterationResult {
    #[inline]
    pub fn is_interior(self) -> bool {
        matches!(self, Self::Interior)
    }
}

/// Immutable description of one escape-time fractal to render.
///
/// Built once by [`Fractal::new`], which enforces every invariant in the
/// data model (positive span, `R > 1`, `maxIter > 0`, `p ≥ 0`); there is no
/// mutation afterwards.
#[derive(Debug, Clone, Copy)]
pub struct Fractal {
    pub formula: Formula,
    pub p: Float,
    pub p_is_int: bool,
    pub p_int: i64,
    pub c: Complex,
    pub centre: Complex,
    pub span_x: Float,
    pub span_y: Float,
    pub x1: Float,
    pub x2: Float,
    pub y1: Float,
    pub y2: Float,
    pub escape_radius: Float,
    pub escape_radius2: Float,
    pub escape_radius_p: Float,
    pub log_escape_radius: Float,
    pub max_iter: u32,
}

impl Fractal {
    /// `centre`/`span` define the view rectangle; `c` is the Julia
    /// parameter (ignored for the two Mandelbrot formulas); `p` is the
    /// exponent (forced to 2 for the two fixed-power formulas).
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        formula: Formula,
        centre: Complex,
        span_x: Float,
        span_y: Float,
        c: Complex,
        p: Float,
        escape_radius: Float,
        max_iter: u32,
    ) -> Result<Self, CoreError> {
        if span_x <= 0.0 || span_y <= 0.0 {
            return Err(CoreError::InvalidSpan {
                reason: format!("span must be positive, got ({span_x}, {span_y})"),
            });
        }
        if escape_radius <= 1.0 {
            return Err(CoreError::InvalidEscapeRadius(escape_radius));
        }
        if max_iter == 0 {
            return Err(CoreError::InvalidMaxIterations(max_iter));
        }
        if p < 0.0 {
            return Err(CoreError::InvalidExponent(p));
        }

        let (p, p_is_int, p_int) = match formula {
            Formula::Mandelbrot | Formula::Julia => (2.0, true, 2),
            _ => {
                let p_int = p.round() as i64;
                let p_is_int = (p - p_int as Float).abs() == 0.0;
                (p, p_is_int, p_int)
            }
        };

        Ok(Self {
            formula,
            p,
            p_is_int,
            p_int,
            c,
            centre,
            span_x,
            span_y,
            x1: centre.re - span_x / 2.0,
            x2: centre.re + span_x / 2.0,
            y1: centre.im - span_y / 2.0,
            y2: centre.im + span_y / 2.0,
            escape_radius,
            escape_radius2: escape_radius * escape_radius,
            escape_radius_p: escape_radius.powf(p),
            log_escape_radius: escape_radius.ln(),
            max_iter,
        })
    }

    /// Maps a pixel position in an image of `width`×`height` to the
    /// complex plane, sampling the pixel centre: `x1 + (fx+0.5)*spanX/width`.
    #[inline]
    pub fn point_at(&self, fx: Float, fy: Float, width: Float, height: Float) -> Complex {
        Complex::new(
            self.x1 + (fx + 0.5) / width * self.span_x,
            self.y1 + (fy + 0.5) / height * self.span_y,
        )
    }

    pub fn default_mandelbrot() -> Self {
        Self::new(
            Formula::Mandelbrot,
            Complex::new(-0.7, 0.0),
            3.0,
            3.0,
            Complex::ZERO,
            2.0,
            1000.0,
            250,
        )
        .expect("default mandelbrot parameters are valid")
    }

    pub fn default_julia() -> Self {
        Self::new(
            Formula::Julia,
            Complex::ZERO,
            3.5,
            3.5,
            Complex::new(-0.7, 0.27015),
            2.0,
            4.0,
            500,
        )
        .expect("default julia parameters are valid")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_nonpositive_span() {
        assert!(Fractal::new(
            Formula::Mandelbrot,
            Complex::ZERO,
            0.0,
            1.0,
            Complex::ZERO,
            2.0,
            2.0,
            100
        )
        .is_err());
    }

    #[test]
    fn rejects_escape_radius_at_or_below_one() {
        assert!(Fractal::new(
            Formula::Mandelbrot,
            Complex::ZERO,
            1.0,
            1.0,
            Complex::ZERO,
            2.0,
            1.0,
            100
        )
        .is_err());
    }

    #[test]
    fn rejects_zero_max_iter() {
        assert!(Fractal::new(
            Formula::Mandelbrot,
            Complex::ZERO,
            1.0,
            1.0,
            Complex::ZERO,
            2.0,
            2.0,
            0
        )
        .is_err());
    }

    #[test]
    fn mandelbrot_forces_p_equals_2() {
        let f = Fractal::new(
            Formula::Mandelbrot,
            Complex::ZERO,
            1.0,
            1.0,
            Complex::ZERO,
            7.0,
            2.0,
            100,
        )
        .unwrap();
        assert_eq!(f.p, 2.0);
        assert!(f.p_is_int);
        assert_eq!(f.p_int, 2);
    }

    #[test]
    fn corners_derived_from_centre_and_span() {
        let f = Fractal::new(
            Formula::Mandelbrot,
            Complex::new(1.0, -1.0),
            4.0,
            2.0,
            Complex::ZERO,
            2.0,
            2.0,
            100,
        )
        .unwrap();
        assert_eq!(f.x1, -1.0);
        assert_eq!(f.x2, 3.0);
        assert_eq!(f.y1, -2.0);
        assert_eq!(f.y2, 0.0);
    }

    #[test]
    fn mandelbrot_p_detects_non_integer_exponent() {
        let f = Fractal::new(
            Formula::MandelbrotP,
            Complex::ZERO,
            1.0,
            1.0,
            Complex::ZERO,
            3.5,
            2.0,
            100,
        )
        .unwrap();
        assert!(!f.p_is_int);
    }
}
