pub mod aa;
pub mod error;
pub mod filter;
pub mod image;
pub mod rect;
pub mod task;
pub mod tile;

pub use aa::anti_aliase;
pub use error::RenderError;
pub use filter::{blur_whole_image, GaussianFilter1D};
pub use image::Image;
pub use rect::Rect;
pub use task::{
    CancelFlag, ProgressTable, Task, TaskKind, TaskOutcome, ThreadPool, WorkerContext,
    WorkerRoutine,
};
pub use tile::{draw_fractal, PixelGrid};

/// Convenience result type for the render crate.
pub type Result<T> = std::result::Result<T, RenderError>;
