use thiserror::Error;

/// Errors originating from the rendering pipeline.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("invalid quad interpolation side: {0} (must be > 0)")]
    InvalidQuadSide(u32),

    #[error("invalid dissimilarity threshold: {0} (must be >= 0.0)")]
    InvalidThreshold(f64),

    #[error("invalid image dimensions: {width}×{height}")]
    InvalidDimensions { width: u32, height: u32 },

    #[error("invalid AA supersampling grid side: {0} (must be > 0)")]
    InvalidAaGrid(u32),

    #[error("render cancelled")]
    Cancelled,

    #[error(transparent)]
    Core(#[from] mandelbrust_core::CoreError),
}
