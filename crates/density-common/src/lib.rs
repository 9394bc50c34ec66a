//! Common types shared across the density-tiles crates and services.

pub mod bounds;
pub mod error;
pub mod point;
pub mod tile;

pub use bounds::GeoBounds;
pub use error::{DensityError, DensityResult};
pub use point::GeoPoint;
pub use tile::{TileCoord, MAX_ZOOM, TILE_SIZE};
