//! P6 (binary) PPM output — the one on-disk format this tool produces.

use crate::error::CliError;
use mandelbrust_render::Image;
use std::io::Write;
use std::path::Path;

pub fn write_ppm(path: &Path, image: &Image<'_>) -> Result<(), CliError> {
    let path_str = path.display().to_string();
    let mut file = std::fs::File::create(path).map_err(|source| CliError::Io {
        path: path_str.clone(),
        source,
    })?;

    let max_value = if image.bytes_per_component == 1 {
        255
    } else {
        65535
    };
    let header = format!("P6\n{} {}\n{}\n", image.width, image.height, max_value);
    file.write_all(header.as_bytes())
        .and_then(|_| file.write_all(&image.to_bytes()))
        .map_err(|source| CliError::Io {
            path: path_str,
            source,
        })
}
