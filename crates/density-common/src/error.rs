//! Error types for density-tiles services.

use thiserror::Error;

/// Result type alias using DensityError.
pub type DensityResult<T> = Result<T, DensityError>;

/// Primary error type for rendering, storage and fetch operations.
#[derive(Debug, Error)]
pub enum DensityError {
    // === Request Errors ===
    #[error("Invalid tile coordinate: {0}")]
    InvalidTile(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    // === Storage Errors ===
    #[error("Point store error: {0}")]
    Store(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Cache error: {0}")]
    Cache(String),

    // === Raster Errors ===
    #[error("Tile fetch failed for {url}: {message}")]
    Fetch { url: String, message: String },

    #[error("Image decode failed: {0}")]
    Decode(String),

    #[error("Image encode failed: {0}")]
    Encode(String),

    // === Infrastructure Errors ===
    #[error("Internal error: {0}")]
    Internal(String),
}

impl DensityError {
    /// Create a Fetch error for a tile URL.
    pub fn fetch(url: impl Into<String>, message: impl ToString) -> Self {
        Self::Fetch {
            url: url.into(),
            message: message.to_string(),
        }
    }

    /// Get the HTTP status code for this error.
    pub fn http_status_code(&self) -> u16 {
        match self {
            DensityError::InvalidTile(_) | DensityError::Config(_) => 400,

            DensityError::Fetch { .. } => 502,

            DensityError::Store(_) | DensityError::Database(_) => 503,

            _ => 500,
        }
    }
}

impl From<std::io::Error> for DensityError {
    fn from(err: std::io::Error) -> Self {
        DensityError::Internal(err.to_string())
    }
}

impl From<serde_json::Error> for DensityError {
    fn from(err: serde_json::Error) -> Self {
        DensityError::Internal(format!("JSON error: {}", err))
    }
}
