//! Point-density tile rendering.
//!
//! Pipeline for one tile:
//! - [`source::TileSource`] reads the padded window of base-zoom tiles from the
//!   point store into a sparse [`grid::DensityGrid`]
//! - [`render::Renderer`] samples every grid through a [`kernel::Kernel`],
//!   normalizes for zoom, blends source hues and shades each pixel
//! - [`png`] encodes the result

pub mod color;
pub mod config;
pub mod grid;
pub mod kernel;
pub mod png;
pub mod render;
pub mod source;

pub use config::{RenderConfig, SourceConfig};
pub use grid::DensityGrid;
pub use kernel::{Kernel, KernelEntry};
pub use render::{RenderOutput, Renderer};
pub use source::{TileSource, TileWindow};
