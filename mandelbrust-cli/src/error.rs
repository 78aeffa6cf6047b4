use thiserror::Error;

/// Top-level error taxonomy for the batch renderer. Each variant maps to a
/// one-line diagnostic and a non-zero exit code in `main`.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("usage error: {0}")]
    Usage(String),

    #[error("{path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{path}:{line}: {reason}")]
    Parse {
        path: String,
        line: usize,
        reason: String,
    },

    #[error(transparent)]
    Core(#[from] mandelbrust_core::CoreError),

    #[error(transparent)]
    Render(#[from] mandelbrust_render::RenderError),
}

impl CliError {
    /// Exit code FractalNow's own CLI used for each failure category:
    /// usage errors are distinct from I/O/parse/engine failures so a
    /// calling script can tell "you asked for something invalid" apart
    /// from "the render itself failed".
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Usage(_) => 1,
            CliError::Io { .. } | CliError::Parse { .. } => 2,
            CliError::Core(_) | CliError::Render(_) => 3,
        }
    }
}
