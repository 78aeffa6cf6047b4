use crate::error::CoreError;
use crate::float::Float;
use crate::gradient::{Color, Gradient};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountingFunction {
    Discrete,
    Continuous,
    Smooth,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColoringMethod {
    IterationCount,
    Average,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddendFunction {
    TriangleInequality,
    Curvature,
    Stripe,
}

impl AddendFunction {
    /// Number of running sums this interpolation method needs.
    #[inline]
    pub fn sum_count(interpolation: InterpolationMethod) -> usize {
        match interpolation {
            InterpolationMethod::None => 1,
            InterpolationMethod::Linear => 2,
            InterpolationMethod::Spline => 4,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterpolationMethod {
    None,
    Linear,
    Spline,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferFunction {
    Log,
    CubeRoot,
    SquareRoot,
    Identity,
    Square,
    Cube,
    Exp,
}

impl TransferFunction {
    #[inline]
    pub fn apply(self, x: Float) -> Float {
        match self {
            Self::Log => x.ln_1p(),
            Self::CubeRoot => x.cbrt(),
            Self::SquareRoot => x.max(0.0).sqrt(),
            Self::Identity => x,
            Self::Square => x * x,
            Self::Cube => x * x * x,
            Self::Exp => x.exp(),
        }
    }
}

/// Parameters controlling how iteration data becomes colour.
///
/// Built once per render and immutable thereafter. `stripe_density` is
/// only meaningful when `addend_fn == Stripe`; `addend_fn` and
/// `interpolation_method` are only meaningful when
/// `coloring_method == Average` (and are simply ignored, not rejected,
/// otherwise).
#[derive(Debug, Clone)]
pub struct RenderingParams {
    pub bytes_per_component: u8,
    pub space_color: Color,
    pub counting_fn: CountingFunction,
    pub coloring_method: ColoringMethod,
    pub addend_fn: AddendFunction,
    pub stripe_density: Float,
    pub interpolation_method: InterpolationMethod,
    pub transfer_fn: TransferFunction,
    pub multiplier: Float,
    pub offset: Float,
    pub gradient: Gradient,
}

impl RenderingParams {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        bytes_per_component: u8,
        space_color: Color,
        counting_fn: CountingFunction,
        coloring_method: ColoringMethod,
        addend_fn: AddendFunction,
        stripe_density: Float,
        interpolation_method: InterpolationMethod,
        transfer_fn: TransferFunction,
        multiplier: Float,
        offset: Float,
        gradient: Gradient,
    ) -> Result<Self, CoreError> {
        if bytes_per_component != 1 && bytes_per_component != 2 {
            return Err(CoreError::InvalidConfiguration(format!(
                "bytesPerComponent must be 1 or 2, got {bytes_per_component}"
            )));
        }
        if addend_fn == AddendFunction::Stripe && stripe_density <= 0.0 {
            return Err(CoreError::InvalidConfiguration(
                "stripeDensity must be > 0 when addendFn = Stripe".into(),
            ));
        }
        Ok(Self {
            bytes_per_component,
            space_color,
            counting_fn,
            coloring_method,
            addend_fn,
            stripe_density,
            interpolation_method,
            transfer_fn,
            multiplier,
            offset,
            gradient,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gradient() -> Gradient {
        Gradient::new(&[Color::BLACK, Color::WHITE], 16).unwrap()
    }

    #[test]
    fn rejects_bad_byte_depth() {
        let err = RenderingParams::new(
            3,
            Color::BLACK,
            CountingFunction::Discrete,
            ColoringMethod::IterationCount,
            AddendFunction::TriangleInequality,
            0.0,
            InterpolationMethod::None,
            TransferFunction::Identity,
            1.0,
            0.0,
            gradient(),
        );
        assert!(err.is_err());
    }

    #[test]
    fn stripe_requires_positive_density() {
        let err = RenderingParams::new(
            1,
            Color::BLACK,
            CountingFunction::Discrete,
            ColoringMethod::Average,
            AddendFunction::Stripe,
            0.0,
            InterpolationMethod::None,
            TransferFunction::Identity,
            1.0,
            0.0,
            gradient(),
        );
        assert!(err.is_err());
    }

    #[test]
    fn transfer_functions_apply() {
        assert_eq!(TransferFunction::Identity.apply(3.0), 3.0);
        assert_eq!(TransferFunction::Square.apply(3.0), 9.0);
        assert_eq!(TransferFunction::Cube.apply(2.0), 8.0);
        assert!((TransferFunction::SquareRoot.apply(4.0) - 2.0).abs() < 1e-9);
    }

    #[test]
    fn sum_count_matches_interpolation() {
        assert_eq!(AddendFunction::sum_count(InterpolationMethod::None), 1);
        assert_eq!(AddendFunction::sum_count(InterpolationMethod::Linear), 2);
        assert_eq!(AddendFunction::sum_count(InterpolationMethod::Spline), 4);
    }
}
