//! Coordinate transformations for the slippy-map tile pyramid.
//!
//! Only spherical Web Mercator is supported; implemented from scratch without
//! external dependencies.

pub mod mercator;

pub use mercator::{
    geo_to_tile, is_valid_latitude, tile_bounds, tile_index, tile_to_geo,
    MAX_LATITUDE,
};
