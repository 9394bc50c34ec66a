//! Storage abstractions for density-tiles services.
//!
//! Provides:
//! - The point store, keyed by base-zoom tile (in-memory and PostgreSQL)
//! - The on-disk cache of rendered PNG tiles

pub mod disk_cache;
pub mod points;
pub mod postgres;

pub use disk_cache::DiskTileCache;
pub use points::{MemoryPointStore, PointStore, PointStream};
pub use postgres::{PgPointStore, PgPointStoreConfig};
