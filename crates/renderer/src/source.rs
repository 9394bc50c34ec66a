//! Reading points for one tile out of a point store.

use futures::TryStreamExt;
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

use density_common::{DensityResult, TileCoord};
use storage::PointStore;

use crate::config::SourceConfig;
use crate::grid::DensityGrid;

/// Inclusive rectangle of base-zoom tile keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileWindow {
    pub zoom: u32,
    pub x0: i64,
    pub y0: i64,
    pub x1: i64,
    pub y1: i64,
}

impl TileWindow {
    /// Base-zoom tiles that cover `coord` plus `padding` tiles on every side.
    ///
    /// Above the base zoom the requested tile lies inside one base tile; below
    /// it the request spans a `2^(base - zoom)` square of base tiles.
    pub fn for_tile(coord: &TileCoord, base_zoom: u32, padding: u32) -> Self {
        let p = padding as i64;
        let (x, y) = (coord.x as i64, coord.y as i64);

        let (x0, y0, x1, y1) = if coord.z > base_zoom {
            let d = 1i64 << (coord.z - base_zoom);
            (x / d - p, y / d - p, x / d + p, y / d + p)
        } else if coord.z < base_zoom {
            let d = 1i64 << (base_zoom - coord.z);
            (x * d - p, y * d - p, (x + 1) * d - 1 + p, (y + 1) * d - 1 + p)
        } else {
            (x - p, y - p, x + p, y + p)
        };

        Self {
            zoom: base_zoom,
            x0,
            y0,
            x1,
            y1,
        }
    }

    /// Number of tile keys in the window.
    pub fn len(&self) -> usize {
        ((self.x1 - self.x0 + 1) * (self.y1 - self.y0 + 1)).max(0) as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Keys in column-major order.
    pub fn tiles(&self) -> impl Iterator<Item = (i64, i64)> + '_ {
        (self.x0..=self.x1).flat_map(move |x| (self.y0..=self.y1).map(move |y| (x, y)))
    }
}

/// A dataset of points ingested at one base zoom, drawn in one hue.
#[derive(Clone)]
pub struct TileSource {
    name: String,
    store: Arc<dyn PointStore>,
    config: SourceConfig,
}

impl TileSource {
    pub fn new(name: impl Into<String>, store: Arc<dyn PointStore>, config: SourceConfig) -> Self {
        Self {
            name: name.into(),
            store,
            config,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &SourceConfig {
        &self.config
    }

    pub fn base_zoom(&self) -> u32 {
        self.config.base_zoom
    }

    pub fn hue(&self) -> f64 {
        self.config.hue
    }

    /// Store window to read for a tile, `None` below the minimum zoom.
    pub fn window(&self, coord: &TileCoord) -> Option<TileWindow> {
        if coord.z < self.config.min_zoom {
            return None;
        }
        Some(TileWindow::for_tile(
            coord,
            self.config.base_zoom,
            self.config.padding,
        ))
    }

    /// Accumulate every point in the tile's padded window into a fresh grid.
    ///
    /// Window tiles are queried one after another and points are splatted as
    /// rows arrive. A failing query aborts the whole read.
    pub async fn get_tile(&self, coord: &TileCoord) -> DensityResult<DensityGrid> {
        let mut grid = DensityGrid::new(*coord);
        let window = match self.window(coord) {
            Some(window) => window,
            None => return Ok(grid),
        };

        let start = Instant::now();
        for (x, y) in window.tiles() {
            let mut rows = self.store.query(window.zoom, x, y);
            while let Some(point) = rows.try_next().await? {
                grid.add_point(&point);
            }
        }

        debug!(
            source = %self.name,
            tile = %coord,
            window_tiles = window.len(),
            points = grid.point_count(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Loaded tile points"
        );

        Ok(grid)
    }
}

impl std::fmt::Debug for TileSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TileSource")
            .field("name", &self.name)
            .field("config", &self.config)
            .finish()
    }
}
