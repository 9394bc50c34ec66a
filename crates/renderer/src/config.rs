//! Rendering and tile-source configuration.

use serde::{Deserialize, Serialize};

use density_common::tile::MAX_ZOOM;

/// Policy knobs for turning sampled density into pixels.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Smoothing kernel radius in pixels.
    pub kernel_radius: u32,

    /// Calibration constant `C` in `scale = C / 4^(base_zoom - zoom)`.
    pub calibration: f64,

    /// Compress density with `t / (t + 1)` before shading. When disabled the
    /// density is clamped to 1 instead.
    pub tone_curve: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            kernel_radius: 2,
            calibration: 32.0,
            tone_curve: true,
        }
    }
}

impl RenderConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(val) = std::env::var("KERNEL_RADIUS") {
            if let Ok(radius) = val.parse() {
                config.kernel_radius = radius;
            }
        }

        if let Ok(val) = std::env::var("DENSITY_CALIBRATION") {
            if let Ok(c) = val.parse() {
                config.calibration = c;
            }
        }

        if let Ok(val) = std::env::var("TONE_CURVE") {
            config.tone_curve = val.to_lowercase() == "true" || val == "1";
        }

        config
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.kernel_radius > 64 {
            return Err("kernel_radius must be <= 64".to_string());
        }

        if !(self.calibration.is_finite() && self.calibration > 0.0) {
            return Err("calibration must be a positive number".to_string());
        }

        Ok(())
    }
}

/// Per-dataset settings of a tile source.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Zoom level at which points were ingested and keyed.
    pub base_zoom: u32,

    /// Hue in degrees, [0, 360).
    pub hue: f64,

    /// Base tiles of padding read around the requested area. One tile is
    /// enough while the kernel radius is small next to 256px; larger kernels
    /// need proportionally more.
    pub padding: u32,

    /// Requests below this zoom render empty.
    pub min_zoom: u32,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            base_zoom: 18,
            hue: 215.0,
            padding: 1,
            min_zoom: 12,
        }
    }
}

impl SourceConfig {
    pub fn new(base_zoom: u32, hue: f64) -> Self {
        Self {
            base_zoom,
            hue,
            ..Self::default()
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.base_zoom > MAX_ZOOM {
            return Err(format!("base_zoom must be <= {}", MAX_ZOOM));
        }

        if !(0.0..360.0).contains(&self.hue) {
            return Err(format!("hue must be in [0, 360), got {}", self.hue));
        }

        Ok(())
    }
}
