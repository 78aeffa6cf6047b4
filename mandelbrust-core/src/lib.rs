pub mod complex;
pub mod error;
pub mod float;
pub mod fractal;
pub mod gradient;
pub mod kernel;
pub mod rendering;

pub use complex::Complex;
pub use error::CoreError;
pub use float::Float;
pub use fractal::{Formula, Fractal, IterationResult};
pub use gradient::{Color, Gradient};
pub use kernel::{gradient_index, select_kernel, KernelFn};
pub use rendering::{
    AddendFunction, ColoringMethod, CountingFunction, InterpolationMethod, RenderingParams,
    TransferFunction,
};

/// Convenience result type for the core crate.
pub type Result<T> = std::result::Result<T, CoreError>;
