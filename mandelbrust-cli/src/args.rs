//! Command-line surface: flags exactly as FractalNow's own `command_line.c`
//! (`-h -q -v -c -r -o -x -y -j -a -s -p -i -t`), parsed with `clap` and
//! then cross-validated the way the original `ParseCommandLineArguments`
//! does (mutual exclusivity, AA-method-specific requirements).

use crate::error::CliError;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Default worker-thread count (`DEFAULT_NB_THREADS`).
pub const DEFAULT_THREADS: usize = 16;
/// Default quad interpolation side (`DEFAULT_QUAD_INTERPOLATION_SIZE`).
pub const DEFAULT_QUAD_SIDE: u32 = 5;
/// Default quad dissimilarity threshold (`DEFAULT_COLOR_DISSIMILARITY_THRESHOLD`).
pub const DEFAULT_QUAD_THRESHOLD: f64 = 0.0035;
/// Default adaptive anti-aliasing threshold (`DEFAULT_ADAPTIVE_AAM_THRESHOLD`).
pub const DEFAULT_ADAPTIVE_THRESHOLD: f64 = 0.0505;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
#[clap(rename_all = "lower")]
pub enum AaMethod {
    None,
    Blur,
    Oversampling,
    Adaptive,
}

#[derive(Parser, Debug)]
#[command(
    name = "mandelbrust",
    about = "Batch escape-time fractal renderer",
    disable_version_flag = true
)]
struct RawArgs {
    /// Fractal descriptor file.
    #[arg(short = 'c')]
    fractal_file: PathBuf,

    /// Rendering descriptor file.
    #[arg(short = 'r')]
    rendering_file: PathBuf,

    /// Output PPM path.
    #[arg(short = 'o')]
    output_file: PathBuf,

    /// Output image width (at least one of -x/-y is required).
    #[arg(short = 'x')]
    width: Option<u32>,

    /// Output image height (at least one of -x/-y is required).
    #[arg(short = 'y')]
    height: Option<u32>,

    /// Worker thread count.
    #[arg(short = 'j')]
    threads: Option<usize>,

    /// Anti-aliasing method.
    #[arg(short = 'a', value_enum, default_value_t = AaMethod::None)]
    aa_method: AaMethod,

    /// Anti-aliasing size parameter (meaning depends on -a).
    #[arg(short = 's')]
    aa_size: Option<f64>,

    /// Adaptive anti-aliasing dissimilarity threshold (only with -a adaptive).
    #[arg(short = 'p')]
    adaptive_threshold: Option<f64>,

    /// Quad interpolation side for the tile scheduler.
    #[arg(short = 'i', default_value_t = DEFAULT_QUAD_SIDE)]
    quad_side: u32,

    /// Quad dissimilarity threshold for the tile scheduler.
    #[arg(short = 't', default_value_t = DEFAULT_QUAD_THRESHOLD)]
    quad_threshold: f64,

    /// Suppress all but error-level diagnostics.
    #[arg(short = 'q')]
    quiet: bool,

    /// Emit per-worker and per-task progress diagnostics.
    #[arg(short = 'v')]
    verbose: bool,
}

/// Validated, fully-resolved arguments — everything `RawArgs` could leave
/// ambiguous (derived height/width, default adaptive threshold) is
/// resolved here, once, the way `ParseCommandLineArguments` resolves it
/// before ever touching the renderer.
#[derive(Debug)]
pub struct Args {
    pub fractal_file: PathBuf,
    pub rendering_file: PathBuf,
    pub output_file: PathBuf,
    /// `None` means "derive from the other dimension, preserving the
    /// fractal's aspect ratio" — resolved once the fractal descriptor is
    /// read, via [`Args::resolve_dimensions`].
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub threads: usize,
    pub aa_method: AaMethod,
    pub aa_size: Option<f64>,
    pub adaptive_threshold: Option<f64>,
    pub quad_side: u32,
    pub quad_threshold: f64,
    pub quiet: bool,
    pub verbose: bool,
}

impl Args {
    pub fn parse() -> Result<Self, CliError> {
        let raw = RawArgs::parse();
        Self::from_raw(raw)
    }

    fn from_raw(raw: RawArgs) -> Result<Self, CliError> {
        if raw.quiet && raw.verbose {
            return Err(CliError::Usage("-q and -v are mutually exclusive".into()));
        }

        if raw.width.is_none() && raw.height.is_none() {
            return Err(CliError::Usage(
                "at least output image width (-x) or height (-y) must be specified".into(),
            ));
        }
        if raw.width.is_some_and(|w| w < 2) {
            return Err(CliError::Usage("output image width must be >= 2".into()));
        }
        if raw.height.is_some_and(|h| h < 2) {
            return Err(CliError::Usage("output image height must be >= 2".into()));
        }

        if let Some(t) = raw.threads {
            if t == 0 {
                return Err(CliError::Usage("number of threads must be positive".into()));
            }
        }
        if raw.quad_side == 0 {
            return Err(CliError::Usage(
                "quad interpolation size must be positive".into(),
            ));
        }
        if raw.quad_threshold < 0.0 {
            return Err(CliError::Usage(
                "quad dissimilarity threshold must be >= 0".into(),
            ));
        }

        let adaptive_threshold = match raw.aa_method {
            AaMethod::None => {
                if raw.aa_size.is_some() {
                    return Err(CliError::Usage(
                        "no size parameter (-s) should be specified when anti-aliasing is disabled"
                            .into(),
                    ));
                }
                if raw.adaptive_threshold.is_some() {
                    return Err(CliError::Usage(
                        "no adaptive threshold (-p) should be specified when anti-aliasing is disabled".into(),
                    ));
                }
                None
            }
            AaMethod::Blur => {
                let size = raw.aa_size.ok_or_else(|| {
                    CliError::Usage("no size parameter (-s) specified for blur".into())
                })?;
                if size <= 0.0 {
                    return Err(CliError::Usage(
                        "size parameter (-s) for gaussian blur must be > 0".into(),
                    ));
                }
                if raw.adaptive_threshold.is_some() {
                    return Err(CliError::Usage(
                        "no adaptive threshold (-p) should be specified when anti-aliasing method is blur".into(),
                    ));
                }
                None
            }
            AaMethod::Oversampling => {
                let size = raw.aa_size.ok_or_else(|| {
                    CliError::Usage("no size parameter (-s) specified for oversampling".into())
                })?;
                if size <= 1.0 {
                    return Err(CliError::Usage(
                        "size parameter (-s) for oversampling must be > 1".into(),
                    ));
                }
                if raw.adaptive_threshold.is_some() {
                    return Err(CliError::Usage(
                        "no adaptive threshold (-p) should be specified when anti-aliasing method is oversampling".into(),
                    ));
                }
                None
            }
            AaMethod::Adaptive => {
                let size = raw.aa_size.ok_or_else(|| {
                    CliError::Usage(
                        "no size parameter (-s) specified for adaptive anti-aliasing".into(),
                    )
                })?;
                if size.fract() != 0.0 {
                    return Err(CliError::Usage(
                        "size parameter (-s) for adaptive anti-aliasing should be an integer"
                            .into(),
                    ));
                }
                if size <= 1.0 {
                    return Err(CliError::Usage(
                        "size parameter (-s) for adaptive anti-aliasing must be > 1".into(),
                    ));
                }
                if let Some(p) = raw.adaptive_threshold {
                    if p < 0.0 {
                        return Err(CliError::Usage(
                            "adaptive anti-aliasing threshold must be >= 0".into(),
                        ));
                    }
                    Some(p)
                } else {
                    Some(DEFAULT_ADAPTIVE_THRESHOLD)
                }
            }
        };

        for (path, label) in [
            (&raw.fractal_file, "fractal file"),
            (&raw.rendering_file, "rendering file"),
        ] {
            if !path.is_file() {
                return Err(CliError::Usage(format!(
                    "{label} '{}' does not exist",
                    path.display()
                )));
            }
        }

        Ok(Self {
            fractal_file: raw.fractal_file,
            rendering_file: raw.rendering_file,
            output_file: raw.output_file,
            width: raw.width,
            height: raw.height,
            threads: raw.threads.unwrap_or(DEFAULT_THREADS),
            aa_method: raw.aa_method,
            aa_size: raw.aa_size,
            adaptive_threshold,
            quad_side: raw.quad_side,
            quad_threshold: raw.quad_threshold,
            quiet: raw.quiet,
            verbose: raw.verbose,
        })
    }

    /// Resolves whichever of width/height was left unset from the other,
    /// preserving the fractal's aspect ratio (`round(spanX*height/spanY)`
    /// or `round(spanY*width/spanX)`), the way `main.c` derives it once
    /// the fractal descriptor's spans are known. Panics if both are
    /// `None`, which [`Args::from_raw`] already rejects.
    pub fn resolve_dimensions(&self, span_x: f64, span_y: f64) -> (u32, u32) {
        match (self.width, self.height) {
            (Some(w), Some(h)) => (w, h),
            (Some(w), None) => {
                let h = (span_y * w as f64 / span_x).round() as u32;
                (w, h.max(1))
            }
            (None, Some(h)) => {
                let w = (span_x * h as f64 / span_y).round() as u32;
                (w.max(1), h)
            }
            (None, None) => unreachable!("at least one of -x/-y is required by from_raw"),
        }
    }
}
