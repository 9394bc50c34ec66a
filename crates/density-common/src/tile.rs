//! Slippy-map tile coordinates.

use serde::{Deserialize, Serialize};

/// Width and height of every tile, in pixels.
pub const TILE_SIZE: u32 = 256;

/// Deepest zoom level accepted from clients.
pub const MAX_ZOOM: u32 = 30;

/// A tile coordinate (z/x/y) in the standard power-of-two pyramid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TileCoord {
    /// Zoom level
    pub z: u32,
    /// Column (x)
    pub x: u32,
    /// Row (y), 0 at the north edge
    pub y: u32,
}

impl TileCoord {
    pub fn new(z: u32, x: u32, y: u32) -> Self {
        Self { z, x, y }
    }

    /// Validate zoom and index range, returning the coordinate on success.
    pub fn checked(z: u32, x: u32, y: u32) -> Option<Self> {
        if z > MAX_ZOOM {
            return None;
        }
        let n = Self::tiles_per_axis(z);
        if u64::from(x) >= n || u64::from(y) >= n {
            return None;
        }
        Some(Self { z, x, y })
    }

    /// Number of tiles along one axis at a zoom level.
    pub fn tiles_per_axis(z: u32) -> u64 {
        1u64 << z
    }

    /// Relative path fragment "z/x/y", used for cache layout and logging.
    pub fn cache_key(&self) -> String {
        format!("{}/{}/{}", self.z, self.x, self.y)
    }

    /// Get the parent tile (zoom - 1).
    pub fn parent(&self) -> Option<TileCoord> {
        if self.z == 0 {
            return None;
        }
        Some(TileCoord {
            z: self.z - 1,
            x: self.x / 2,
            y: self.y / 2,
        })
    }

    /// Get the four children tiles (zoom + 1).
    pub fn children(&self) -> [TileCoord; 4] {
        let x = self.x * 2;
        let y = self.y * 2;
        let z = self.z + 1;
        [
            TileCoord { z, x, y },
            TileCoord { z, x: x + 1, y },
            TileCoord { z, x, y: y + 1 },
            TileCoord {
                z,
                x: x + 1,
                y: y + 1,
            },
        ]
    }
}

impl std::fmt::Display for TileCoord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}/{}", self.z, self.x, self.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checked_rejects_out_of_range() {
        assert!(TileCoord::checked(0, 0, 0).is_some());
        assert!(TileCoord::checked(0, 1, 0).is_none());
        assert!(TileCoord::checked(2, 3, 3).is_some());
        assert!(TileCoord::checked(2, 4, 0).is_none());
        assert!(TileCoord::checked(31, 0, 0).is_none());
    }

    #[test]
    fn test_parent_children() {
        let tile = TileCoord { z: 5, x: 10, y: 15 };
        let parent = tile.parent().unwrap();
        assert_eq!(parent, TileCoord { z: 4, x: 5, y: 7 });

        let children = parent.children();
        assert!(children.contains(&tile));
        assert!(TileCoord::new(0, 0, 0).parent().is_none());
    }

    #[test]
    fn test_cache_key_and_display() {
        let tile = TileCoord::new(18, 100, 200);
        assert_eq!(tile.cache_key(), "18/100/200");
        assert_eq!(tile.to_string(), "18/100/200");
    }
}
