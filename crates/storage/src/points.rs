//! Point store interface and the in-memory implementation.
//!
//! Points are persisted at a single ingestion zoom and keyed by the tile that
//! contains them at that zoom. Readers stream every row under one key; no
//! ordering is guaranteed.

use async_trait::async_trait;
use futures::stream::{self, BoxStream, StreamExt};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::RwLock;

use density_common::{DensityResult, GeoPoint};

/// Stream of points returned by a range read.
pub type PointStream<'a> = BoxStream<'a, DensityResult<GeoPoint>>;

/// A point store keyed by (zoom, x, y).
///
/// Tile indices are signed: padded read windows may reach one tile past the
/// world edge, and such keys simply hold no rows.
#[async_trait]
pub trait PointStore: Send + Sync {
    /// Stream all points stored under a tile key.
    fn query(&self, zoom: u32, x: i64, y: i64) -> PointStream<'_>;

    /// Store one point under a tile key.
    async fn insert(&self, zoom: u32, x: i64, y: i64, point: GeoPoint) -> DensityResult<()>;
}

type TileKey = (u32, i64, i64);

/// Point store held entirely in memory.
///
/// Used by tests, benchmarks and small demo deployments.
#[derive(Default)]
pub struct MemoryPointStore {
    tiles: RwLock<HashMap<TileKey, Vec<GeoPoint>>>,
    queries: AtomicU64,
}

impl MemoryPointStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of range reads served so far.
    pub fn query_count(&self) -> u64 {
        self.queries.load(Ordering::Relaxed)
    }

    /// Total number of stored points.
    pub async fn len(&self) -> usize {
        self.tiles.read().await.values().map(Vec::len).sum()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Keys that hold at least one point.
    pub async fn keys(&self) -> Vec<(u32, i64, i64)> {
        let mut keys: Vec<_> = self.tiles.read().await.keys().copied().collect();
        keys.sort_unstable();
        keys
    }
}

#[async_trait]
impl PointStore for MemoryPointStore {
    fn query(&self, zoom: u32, x: i64, y: i64) -> PointStream<'_> {
        self.queries.fetch_add(1, Ordering::Relaxed);
        stream::once(async move {
            let tiles = self.tiles.read().await;
            tiles.get(&(zoom, x, y)).cloned().unwrap_or_default()
        })
        .flat_map(|points| stream::iter(points.into_iter().map(Ok)))
        .boxed()
    }

    async fn insert(&self, zoom: u32, x: i64, y: i64, point: GeoPoint) -> DensityResult<()> {
        self.tiles
            .write()
            .await
            .entry((zoom, x, y))
            .or_default()
            .push(point);
        Ok(())
    }
}
