//! Server configuration.
//!
//! A deployment serves one or more point tables. With no sources file the
//! server renders a single table given on the command line; otherwise the
//! YAML file lists every source and may override render settings:
//!
//! ```yaml
//! render:
//!   kernel_radius: 2
//!   calibration: 32
//! sources:
//!   - table: checkins
//!     base_zoom: 18
//!     hue: 215
//!   - table: photos
//!     hue: 30
//! ```

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use density_common::{DensityError, DensityResult};
use renderer::{RenderConfig, SourceConfig};

/// Contents of a sources file.
#[derive(Debug, Clone, Deserialize)]
pub struct SourcesFile {
    #[serde(default)]
    pub render: RenderConfig,
    pub sources: Vec<SourceEntry>,
}

/// One point table and how to draw it.
#[derive(Debug, Clone, Deserialize)]
pub struct SourceEntry {
    pub table: String,
    #[serde(flatten)]
    pub config: SourceConfig,
}

impl SourcesFile {
    /// Single-source configuration.
    pub fn single(table: impl Into<String>, config: SourceConfig, render: RenderConfig) -> Self {
        Self {
            render,
            sources: vec![SourceEntry {
                table: table.into(),
                config,
            }],
        }
    }

    pub fn from_yaml(contents: &str) -> DensityResult<Self> {
        let file: Self = serde_yaml::from_str(contents)
            .map_err(|e| DensityError::Config(format!("invalid sources file: {}", e)))?;
        file.validate()?;
        Ok(file)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> DensityResult<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|e| {
            DensityError::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        let file = Self::from_yaml(&contents)?;
        info!(
            path = %path.display(),
            sources = file.sources.len(),
            "Loaded sources file"
        );
        Ok(file)
    }

    pub fn validate(&self) -> DensityResult<()> {
        if self.sources.is_empty() {
            return Err(DensityError::Config("no sources configured".to_string()));
        }
        self.render.validate().map_err(DensityError::Config)?;
        for source in &self.sources {
            source
                .config
                .validate()
                .map_err(|e| DensityError::Config(format!("{}: {}", source.table, e)))?;
        }
        Ok(())
    }
}

/// Everything the server needs to start.
#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub database_url: String,
    pub max_connections: u32,
    pub cache_dir: PathBuf,
    pub sources: SourcesFile,
}
