mod args;
mod descriptor;
mod error;
mod ppm;

use args::AaMethod;
use error::CliError;
use mandelbrust_render::{
    anti_aliase, blur_whole_image, draw_fractal, Image, PixelGrid, ThreadPool,
};
use tracing_subscriber::EnvFilter;

fn init_logging(quiet: bool, verbose: bool) {
    let level = if quiet {
        "error"
    } else if verbose {
        "debug"
    } else {
        "info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(level))
        .without_time()
        .with_target(false)
        .init();
}

/// Unconditional full-image oversampling: renders at `factor`× resolution
/// and box-averages each `factor × factor` block down to one pixel.
/// Unlike [`anti_aliase`], every pixel pays the supersampling cost, not
/// just the ones whose neighbourhood disagrees.
#[allow(clippy::too_many_arguments)]
fn oversample(
    pool: &ThreadPool,
    fractal: &mandelbrust_core::Fractal,
    rendering: &mandelbrust_core::RenderingParams,
    width: u32,
    height: u32,
    quad_side: u32,
    quad_threshold: f64,
    factor: u32,
    on_progress: Option<&(dyn Fn(f64) + Sync)>,
) -> Result<PixelGrid, CliError> {
    let big = draw_fractal(
        pool,
        fractal,
        rendering,
        width * factor,
        height * factor,
        quad_side,
        quad_threshold,
        on_progress,
    )?;
    let out = PixelGrid::new(width, height);
    for y in 0..height {
        for x in 0..width {
            let mut sums = [0u64; 3];
            for dy in 0..factor {
                for dx in 0..factor {
                    let c = big.get(x * factor + dx, y * factor + dy);
                    sums[0] += c.r as u64;
                    sums[1] += c.g as u64;
                    sums[2] += c.b as u64;
                }
            }
            let n = (factor * factor) as u64;
            out.set(
                x,
                y,
                mandelbrust_core::Color::new(
                    (sums[0] / n) as u16,
                    (sums[1] / n) as u16,
                    (sums[2] / n) as u16,
                ),
            );
        }
    }
    Ok(out)
}

fn run() -> Result<(), CliError> {
    let parsed = args::Args::parse()?;
    init_logging(parsed.quiet, parsed.verbose);

    tracing::info!(file = %parsed.fractal_file.display(), "reading fractal descriptor");
    let fractal = descriptor::read_fractal_file(&parsed.fractal_file)?;
    tracing::info!(file = %parsed.rendering_file.display(), "reading rendering descriptor");
    let rendering = descriptor::read_rendering_file(&parsed.rendering_file)?;

    let (width, height) = parsed.resolve_dimensions(fractal.span_x, fractal.span_y);

    let pool = ThreadPool::new(parsed.threads);
    tracing::info!(threads = parsed.threads, width, height, "starting render");

    let progress_cb: Option<&(dyn Fn(f64) + Sync)> = if parsed.verbose {
        Some(&|fraction: f64| {
            tracing::debug!(
                percent = format!("{:.1}", fraction * 100.0),
                "render progress"
            )
        })
    } else {
        None
    };

    let grid = draw_fractal(
        &pool,
        &fractal,
        &rendering,
        width,
        height,
        parsed.quad_side,
        parsed.quad_threshold,
        progress_cb,
    )?;

    let grid = match parsed.aa_method {
        AaMethod::None => grid,
        AaMethod::Blur => {
            tracing::info!(
                radius = parsed.aa_size.unwrap(),
                "applying whole-image blur"
            );
            blur_whole_image(&pool, &grid, parsed.aa_size.unwrap().round() as u32)
        }
        AaMethod::Oversampling => {
            let factor = parsed.aa_size.unwrap().round() as u32;
            tracing::info!(factor, "re-rendering with full oversampling");
            oversample(
                &pool,
                &fractal,
                &rendering,
                width,
                height,
                parsed.quad_side,
                parsed.quad_threshold,
                factor,
                progress_cb,
            )?
        }
        AaMethod::Adaptive => {
            let grid_side = parsed.aa_size.unwrap().round() as u32;
            let threshold = parsed
                .adaptive_threshold
                .expect("adaptive threshold resolved during arg validation");
            tracing::info!(grid_side, threshold, "applying adaptive anti-aliasing");
            anti_aliase(
                &pool,
                &fractal,
                &rendering,
                &grid,
                grid_side,
                threshold,
                progress_cb,
            )?
        }
    };

    let colors = grid.to_colors();
    let image = Image::from_borrowed_buffer(width, height, rendering.bytes_per_component, &colors);
    tracing::info!(file = %parsed.output_file.display(), "writing output");
    ppm::write_ppm(&parsed.output_file, &image)?;

    Ok(())
}

fn main() {
    if let Err(e) = run() {
        eprintln!("mandelbrust: {e}");
        std::process::exit(e.exit_code());
    }
}
