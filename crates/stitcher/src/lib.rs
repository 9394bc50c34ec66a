//! Composite images assembled from slippy-map tiles.
//!
//! A [`TileLayer`] turns a URL template into tiles and draws every tile that
//! overlaps a canvas centered on a coordinate. Layers are then stacked with
//! [`merge_layers`].

pub mod fetch;
pub mod layer;
pub mod plan;

pub use fetch::{HttpTileFetcher, TileFetcher};
pub use layer::{merge_layers, stitch, TileLayer};
pub use plan::{CanvasPlan, TilePlacement};
