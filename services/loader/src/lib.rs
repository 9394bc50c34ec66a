//! Bulk loader for point datasets.
//!
//! Reads CSV records, keeps the ones that carry a usable coordinate and
//! writes each point under its tile key at the ingestion zoom through a fixed
//! pool of writers.

pub mod pipeline;
pub mod record;

pub use pipeline::{load, LoadStats, LoaderConfig};
pub use record::{parse_record, RowError};
