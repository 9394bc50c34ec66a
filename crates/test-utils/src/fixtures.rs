//! Common fixtures for density-tiles tests.

use std::sync::Arc;

use density_common::{DensityResult, GeoPoint};
use storage::{MemoryPointStore, PointStore};

/// Well-known places as (lat, lng) with their tile indices.
pub mod places {
    /// Lower Manhattan
    pub const NEW_YORK: (f64, f64) = (40.7128, -74.0060);
    /// NEW_YORK at zoom 10
    pub const NEW_YORK_Z10: (u32, u32) = (301, 384);

    /// Central London
    pub const LONDON: (f64, f64) = (51.5074, -0.1278);

    /// Null Island, dropped by the loader as a missing-value marker
    pub const NULL_ISLAND: (f64, f64) = (0.0, 0.0);
}

/// Loader input covering every row class: valid, missing-value marker,
/// unparsable, out of range, outside Mercator and short.
pub const SAMPLE_CSV: &str = "\
40.7128,-74.0060
51.5074,-0.1278
0,0
abc,12.5
91.0,10.0
10.0,181.0
89.0,10.0
-33.8688,151.2093
42.0
";

/// Number of rows in [`SAMPLE_CSV`] the loader accepts.
pub const SAMPLE_CSV_VALID: usize = 3;

/// Insert points into a store keyed by their tile at `base_zoom`.
///
/// Returns the number of points inserted.
pub async fn load_points(
    store: &dyn PointStore,
    base_zoom: u32,
    points: &[GeoPoint],
) -> DensityResult<usize> {
    for p in points {
        let (x, y) = projection::tile_index(base_zoom, p.lat, p.lng);
        store.insert(base_zoom, x, y, *p).await?;
    }
    Ok(points.len())
}

/// In-memory store pre-loaded with `points` at `base_zoom`.
pub async fn memory_store_with(base_zoom: u32, points: &[GeoPoint]) -> Arc<MemoryPointStore> {
    let store = Arc::new(MemoryPointStore::new());
    load_points(store.as_ref(), base_zoom, points)
        .await
        .expect("in-memory insert cannot fail");
    store
}

/// Fresh temporary directory for a tile cache, removed on drop.
pub fn temp_cache_dir() -> tempfile::TempDir {
    tempfile::Builder::new()
        .prefix("density-cache-")
        .tempdir()
        .expect("failed to create temp dir")
}
