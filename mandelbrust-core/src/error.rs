use thiserror::Error;

/// Errors originating from the core fractal engine.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid max iterations: {0} (must be >= 1)")]
    InvalidMaxIterations(u32),

    #[error("invalid escape radius: {0} (must be > 1.0)")]
    InvalidEscapeRadius(f64),

    #[error("invalid exponent: {0} (must be >= 0.0)")]
    InvalidExponent(f64),

    #[error("invalid fractal span: {reason}")]
    InvalidSpan { reason: String },

    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("operation cancelled")]
    Cancelled,
}
