//! On-disk cache of rendered PNG tiles.
//!
//! Layout is `{root}/{z}/{x}/{y}.png`, which a static file server can also
//! serve directly. Only tiles with content are ever written; empty tiles stay
//! uncached so that new points become visible once rendered.

use bytes::Bytes;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::debug;

use density_common::{DensityError, DensityResult, TileCoord};

/// Sequence for temporary file names; unique per write within the process.
static WRITE_SEQ: AtomicU64 = AtomicU64::new(0);

/// Directory-backed tile cache.
#[derive(Debug, Clone)]
pub struct DiskTileCache {
    root: PathBuf,
}

impl DiskTileCache {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the cached PNG for a tile.
    pub fn tile_path(&self, coord: &TileCoord) -> PathBuf {
        self.root
            .join(coord.z.to_string())
            .join(coord.x.to_string())
            .join(format!("{}.png", coord.y))
    }

    /// Read a cached tile, `None` when it has never been written.
    pub async fn get(&self, coord: &TileCoord) -> DensityResult<Option<Bytes>> {
        match tokio::fs::read(self.tile_path(coord)).await {
            Ok(data) => Ok(Some(Bytes::from(data))),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(DensityError::Cache(format!("Cache read failed: {}", e))),
        }
    }

    /// Store an encoded tile.
    ///
    /// The file is written under a temporary name unique to this write and
    /// renamed into place, so a concurrent reader never sees a partial PNG and
    /// concurrent writers of the same tile never share a temporary file.
    pub async fn put(&self, coord: &TileCoord, data: &[u8]) -> DensityResult<()> {
        let path = self.tile_path(coord);
        if let Some(dir) = path.parent() {
            tokio::fs::create_dir_all(dir)
                .await
                .map_err(|e| DensityError::Cache(format!("Cache mkdir failed: {}", e)))?;
        }

        let seq = WRITE_SEQ.fetch_add(1, Ordering::Relaxed);
        let tmp = path.with_extension(format!("png.{}.{}.tmp", std::process::id(), seq));
        if let Err(e) = tokio::fs::write(&tmp, data).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(DensityError::Cache(format!("Cache write failed: {}", e)));
        }
        if let Err(e) = tokio::fs::rename(&tmp, &path).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(DensityError::Cache(format!("Cache rename failed: {}", e)));
        }

        debug!(tile = %coord, bytes = data.len(), "Cached tile");
        Ok(())
    }

    /// Remove a cached tile. Missing files are not an error.
    pub async fn remove(&self, coord: &TileCoord) -> DensityResult<bool> {
        match tokio::fs::remove_file(self.tile_path(coord)).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(DensityError::Cache(format!("Cache delete failed: {}", e))),
        }
    }
}
