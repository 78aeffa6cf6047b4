//! Fractal and rendering descriptor files: a small `key = value` text
//! format, one assignment per line, `#` starting a comment. Mirrors
//! FractalNow's own textual config-file convention in spirit (its
//! `ReadFractalFile`/`ReadRenderingFile` read a fixed positional token
//! sequence; this format names each field instead, which is friendlier to
//! hand-edit and tolerates field reordering).

use crate::error::CliError;
use mandelbrust_core::{
    AddendFunction, Color, ColoringMethod, Complex, CountingFunction, Formula, Fractal, Gradient,
    InterpolationMethod, RenderingParams, TransferFunction,
};
use std::collections::HashMap;
use std::path::Path;

struct KeyValueFile {
    path: String,
    fields: HashMap<String, (usize, String)>,
}

impl KeyValueFile {
    fn read(path: &Path) -> Result<Self, CliError> {
        let path_str = path.display().to_string();
        let text = std::fs::read_to_string(path).map_err(|source| CliError::Io {
            path: path_str.clone(),
            source,
        })?;

        let mut fields = HashMap::new();
        for (idx, raw_line) in text.lines().enumerate() {
            let line = raw_line.split('#').next().unwrap_or("").trim();
            if line.is_empty() {
                continue;
            }
            let Some((key, value)) = line.split_once('=') else {
                return Err(CliError::Parse {
                    path: path_str,
                    line: idx + 1,
                    reason: format!("expected 'key = value', got '{line}'"),
                });
            };
            fields.insert(
                key.trim().to_ascii_lowercase(),
                (idx + 1, value.trim().to_string()),
            );
        }
        Ok(Self {
            path: path_str,
            fields,
        })
    }

    fn get(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(|(_, v)| v.as_str())
    }

    fn line_of(&self, key: &str) -> usize {
        self.fields.get(key).map(|(line, _)| *line).unwrap_or(0)
    }

    fn require(&self, key: &str) -> Result<&str, CliError> {
        self.get(key).ok_or_else(|| CliError::Parse {
            path: self.path.clone(),
            line: 0,
            reason: format!("missing required key '{key}'"),
        })
    }

    fn parse_required<T: std::str::FromStr>(&self, key: &str) -> Result<T, CliError> {
        let raw = self.require(key)?;
        raw.parse().map_err(|_| CliError::Parse {
            path: self.path.clone(),
            line: self.line_of(key),
            reason: format!("'{key}' = '{raw}' is not a valid value"),
        })
    }

    fn parse_optional<T: std::str::FromStr>(&self, key: &str, default: T) -> Result<T, CliError> {
        match self.get(key) {
            None => Ok(default),
            Some(raw) => raw.parse().map_err(|_| CliError::Parse {
                path: self.path.clone(),
                line: self.line_of(key),
                reason: format!("'{key}' = '{raw}' is not a valid value"),
            }),
        }
    }

    fn parse_color(&self, key: &str) -> Result<Color, CliError> {
        let raw = self.require(key)?;
        let bad = || CliError::Parse {
            path: self.path.clone(),
            line: self.line_of(key),
            reason: format!("'{key}' = '{raw}' is not a valid 'r,g,b' color"),
        };
        let parts: Vec<&str> = raw.split(',').collect();
        if parts.len() != 3 {
            return Err(bad());
        }
        let mut channels = [0u16; 3];
        for (dst, part) in channels.iter_mut().zip(parts) {
            *dst = part.trim().parse().map_err(|_| bad())?;
        }
        Ok(Color::new(channels[0], channels[1], channels[2]))
    }
}

fn parse_formula(raw: &str) -> Option<Formula> {
    match raw.to_ascii_lowercase().as_str() {
        "mandelbrot" => Some(Formula::Mandelbrot),
        "mandelbrotp" => Some(Formula::MandelbrotP),
        "julia" => Some(Formula::Julia),
        "juliap" => Some(Formula::JuliaP),
        "rudy" => Some(Formula::Rudy),
        _ => None,
    }
}

/// Reads a fractal descriptor file into a validated [`Fractal`].
///
/// Keys: `formula`, `centre_re`, `centre_im`, `span_x`, `span_y`,
/// `escape_radius`, `max_iter`; `p` (default 2.0, only meaningful for
/// `MandelbrotP`/`JuliaP`/`Rudy`); `c_re`/`c_im` (default 0.0, only
/// meaningful for `Julia`/`JuliaP`/`Rudy`).
pub fn read_fractal_file(path: &Path) -> Result<Fractal, CliError> {
    let file = KeyValueFile::read(path)?;

    let formula_raw = file.require("formula")?;
    let formula = parse_formula(formula_raw).ok_or_else(|| CliError::Parse {
        path: file.path.clone(),
        line: file.line_of("formula"),
        reason: format!("unknown formula '{formula_raw}'"),
    })?;

    let p: f64 = file.parse_optional("p", 2.0)?;
    let c_re: f64 = file.parse_optional("c_re", 0.0)?;
    let c_im: f64 = file.parse_optional("c_im", 0.0)?;
    let centre_re: f64 = file.parse_required("centre_re")?;
    let centre_im: f64 = file.parse_required("centre_im")?;
    let span_x: f64 = file.parse_required("span_x")?;
    let span_y: f64 = file.parse_required("span_y")?;
    let escape_radius: f64 = file.parse_required("escape_radius")?;
    let max_iter: u32 = file.parse_required("max_iter")?;

    Fractal::new(
        formula,
        Complex::new(centre_re, centre_im),
        span_x,
        span_y,
        Complex::new(c_re, c_im),
        p,
        escape_radius,
        max_iter,
    )
    .map_err(CliError::from)
}

fn parse_counting_fn(raw: &str) -> Option<CountingFunction> {
    match raw.to_ascii_lowercase().as_str() {
        "discrete" => Some(CountingFunction::Discrete),
        "continuous" => Some(CountingFunction::Continuous),
        "smooth" => Some(CountingFunction::Smooth),
        _ => None,
    }
}

fn parse_coloring_method(raw: &str) -> Option<ColoringMethod> {
    match raw.to_ascii_lowercase().as_str() {
        "iterationcount" => Some(ColoringMethod::IterationCount),
        "average" => Some(ColoringMethod::Average),
        _ => None,
    }
}

fn parse_addend_fn(raw: &str) -> Option<AddendFunction> {
    match raw.to_ascii_lowercase().as_str() {
        "triangleinequality" => Some(AddendFunction::TriangleInequality),
        "curvature" => Some(AddendFunction::Curvature),
        "stripe" => Some(AddendFunction::Stripe),
        _ => None,
    }
}

fn parse_interpolation_method(raw: &str) -> Option<InterpolationMethod> {
    match raw.to_ascii_lowercase().as_str() {
        "none" => Some(InterpolationMethod::None),
        "linear" => Some(InterpolationMethod::Linear),
        "spline" => Some(InterpolationMethod::Spline),
        _ => None,
    }
}

fn parse_transfer_fn(raw: &str) -> Option<TransferFunction> {
    match raw.to_ascii_lowercase().as_str() {
        "log" => Some(TransferFunction::Log),
        "cuberoot" => Some(TransferFunction::CubeRoot),
        "squareroot" => Some(TransferFunction::SquareRoot),
        "identity" => Some(TransferFunction::Identity),
        "square" => Some(TransferFunction::Square),
        "cube" => Some(TransferFunction::Cube),
        "exp" => Some(TransferFunction::Exp),
        _ => None,
    }
}

/// Reads a rendering descriptor file into a validated [`RenderingParams`].
///
/// Keys: `bytes_per_component`, `space_color` (`r,g,b`), `counting_fn`,
/// `coloring_method`, `addend_fn`, `stripe_density` (default 0.0),
/// `interpolation_method`, `transfer_fn`, `multiplier`, `offset`,
/// `gradient` (`;`-separated list of `r,g,b` control colors),
/// `gradient_transitions` (default 65536).
pub fn read_rendering_file(path: &Path) -> Result<RenderingParams, CliError> {
    let file = KeyValueFile::read(path)?;

    let bytes_per_component: u8 = file.parse_required("bytes_per_component")?;
    let space_color = file.parse_color("space_color")?;

    let counting_raw = file.require("counting_fn")?;
    let counting_fn = parse_counting_fn(counting_raw).ok_or_else(|| CliError::Parse {
        path: file.path.clone(),
        line: file.line_of("counting_fn"),
        reason: format!("unknown counting function '{counting_raw}'"),
    })?;

    let coloring_raw = file.require("coloring_method")?;
    let coloring_method = parse_coloring_method(coloring_raw).ok_or_else(|| CliError::Parse {
        path: file.path.clone(),
        line: file.line_of("coloring_method"),
        reason: format!("unknown coloring method '{coloring_raw}'"),
    })?;

    let addend_raw = file.require("addend_fn")?;
    let addend_fn = parse_addend_fn(addend_raw).ok_or_else(|| CliError::Parse {
        path: file.path.clone(),
        line: file.line_of("addend_fn"),
        reason: format!("unknown addend function '{addend_raw}'"),
    })?;
    let stripe_density: f64 = file.parse_optional("stripe_density", 0.0)?;

    let interp_raw = file.require("interpolation_method")?;
    let interpolation_method =
        parse_interpolation_method(interp_raw).ok_or_else(|| CliError::Parse {
            path: file.path.clone(),
            line: file.line_of("interpolation_method"),
            reason: format!("unknown interpolation method '{interp_raw}'"),
        })?;

    let transfer_raw = file.require("transfer_fn")?;
    let transfer_fn = parse_transfer_fn(transfer_raw).ok_or_else(|| CliError::Parse {
        path: file.path.clone(),
        line: file.line_of("transfer_fn"),
        reason: format!("unknown transfer function '{transfer_raw}'"),
    })?;

    let multiplier: f64 = file.parse_required("multiplier")?;
    let offset: f64 = file.parse_required("offset")?;

    let gradient_raw = file.require("gradient")?;
    let mut controls = Vec::new();
    for (i, group) in gradient_raw.split(';').enumerate() {
        let parts: Vec<&str> = group.split(',').map(str::trim).collect();
        if parts.len() != 3 {
            return Err(CliError::Parse {
                path: file.path.clone(),
                line: file.line_of("gradient"),
                reason: format!("gradient control color #{i} '{group}' is not 'r,g,b'"),
            });
        }
        let mut channels = [0u16; 3];
        for (dst, part) in channels.iter_mut().zip(parts) {
            *dst = part.parse().map_err(|_| CliError::Parse {
                path: file.path.clone(),
                line: file.line_of("gradient"),
                reason: format!("gradient control color #{i} '{group}' is not 'r,g,b'"),
            })?;
        }
        controls.push(Color::new(channels[0], channels[1], channels[2]));
    }
    let transition_count: usize = file.parse_optional("gradient_transitions", 65536)?;
    let gradient = Gradient::new(&controls, transition_count).map_err(CliError::from)?;

    RenderingParams::new(
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
    )
    .map_err(CliError::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_fixture(name: &str, contents: &str) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(format!(
            "mandelbrust-cli-test-{name}-{:?}",
            std::thread::current().id()
        ));
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn reads_a_minimal_mandelbrot_descriptor() {
        let path = write_fixture(
            "mandelbrot",
            "formula = Mandelbrot\n\
             centre_re = -0.7\n\
             centre_im = 0.0\n\
             span_x = 3.0\n\
             span_y = 3.0\n\
             escape_radius = 1000.0\n\
             max_iter = 250\n",
        );
        let fractal = read_fractal_file(&path).unwrap();
        assert_eq!(fractal.formula, Formula::Mandelbrot);
        assert_eq!(fractal.max_iter, 250);
        std::fs::remove_file(path).ok();
    }

    #[test]
    fn comments_and_blank_lines_are_ignored() {
        let path = write_fixture(
            "comments",
            "# a fractal\n\
             formula = Julia\n\n\
             c_re = -0.7 # julia parameter\n\
             c_im = 0.27015\n\
             centre_re = 0.0\n\
             centre_im = 0.0\n\
             span_x = 3.5\n\
             span_y = 3.5\n\
             escape_radius = 4.0\n\
             max_iter = 500\n",
        );
        let fractal = read_fractal_file(&path).unwrap();
        assert_eq!(fractal.formula, Formula::Julia);
        assert_eq!(fractal.c, Complex::new(-0.7, 0.27015));
        std::fs::remove_file(path).ok();
    }

    #[test]
    fn unknown_formula_is_a_parse_error() {
        let path = write_fixture(
            "bad-formula",
            "formula = Sierpinski\n\
             centre_re = 0.0\n\
             centre_im = 0.0\n\
             span_x = 1.0\n\
             span_y = 1.0\n\
             escape_radius = 2.0\n\
             max_iter = 10\n",
        );
        let err = read_fractal_file(&path).unwrap_err();
        assert!(matches!(err, CliError::Parse { .. }));
        std::fs::remove_file(path).ok();
    }

    #[test]
    fn missing_required_key_is_a_parse_error() {
        let path = write_fixture("missing-key", "formula = Mandelbrot\n");
        let err = read_fractal_file(&path).unwrap_err();
        assert!(matches!(err, CliError::Parse { .. }));
        std::fs::remove_file(path).ok();
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = read_fractal_file(std::path::Path::new("/nonexistent/mandelbrust.fractal"))
            .unwrap_err();
        assert!(matches!(err, CliError::Io { .. }));
    }

    #[test]
    fn reads_a_full_rendering_descriptor() {
        let path = write_fixture(
            "rendering",
            "bytes_per_component = 1\n\
             space_color = 0,0,0\n\
             counting_fn = Smooth\n\
             coloring_method = Average\n\
             addend_fn = Stripe\n\
             stripe_density = 2.0\n\
             interpolation_method = Spline\n\
             transfer_fn = Log\n\
             multiplier = 1.0\n\
             offset = 0.0\n\
             gradient = 0,0,0;65535,65535,65535\n\
             gradient_transitions = 256\n",
        );
        let rendering = read_rendering_file(&path).unwrap();
        assert_eq!(rendering.counting_fn, CountingFunction::Smooth);
        assert_eq!(rendering.coloring_method, ColoringMethod::Average);
        assert_eq!(rendering.addend_fn, AddendFunction::Stripe);
        std::fs::remove_file(path).ok();
    }

    #[test]
    fn malformed_gradient_entry_is_a_parse_error() {
        let path = write_fixture(
            "bad-gradient",
            "bytes_per_component = 1\n\
             space_color = 0,0,0\n\
             counting_fn = Discrete\n\
             coloring_method = IterationCount\n\
             addend_fn = TriangleInequality\n\
             interpolation_method = None\n\
             transfer_fn = Identity\n\
             multiplier = 1.0\n\
             offset = 0.0\n\
             gradient = not-a-color\n",
        );
        let err = read_rendering_file(&path).unwrap_err();
        assert!(matches!(err, CliError::Parse { .. }));
        std::fs::remove_file(path).ok();
    }
}
