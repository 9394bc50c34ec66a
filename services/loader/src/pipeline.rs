//! Reader and writer pool.
//!
//! One reader parses CSV records and pushes points onto a bounded queue; a
//! fixed number of writers drain it and insert into the store. The queue bound
//! keeps the reader from running ahead of the store.

use csv::{ReaderBuilder, StringRecord, Trim};
use std::io::Read;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, info, warn};

use density_common::{DensityError, DensityResult, GeoPoint};
use storage::PointStore;

use crate::record::{parse_record, RowError};

/// Rows between progress log lines.
const PROGRESS_INTERVAL: usize = 100_000;

/// Loader settings.
#[derive(Debug, Clone)]
pub struct LoaderConfig {
    /// Ingestion zoom; every point is keyed by its tile at this zoom.
    pub zoom: u32,
    /// Column holding the latitude.
    pub lat_index: usize,
    /// Column holding the longitude.
    pub lng_index: usize,
    /// Field delimiter, a single ASCII byte.
    pub delimiter: u8,
    /// Treat the first record as a header.
    pub skip_header: bool,
    /// Number of concurrent writers.
    pub workers: usize,
    /// Bound of the queue between reader and writers.
    pub queue_size: usize,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            zoom: 18,
            lat_index: 0,
            lng_index: 1,
            delimiter: b',',
            skip_header: false,
            workers: 64,
            queue_size: 1024,
        }
    }
}

impl LoaderConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.zoom > density_common::MAX_ZOOM {
            return Err(format!("zoom {} above maximum {}", self.zoom, density_common::MAX_ZOOM));
        }
        if self.lat_index == self.lng_index {
            return Err("latitude and longitude columns must differ".to_string());
        }
        if !self.delimiter.is_ascii() {
            return Err("delimiter must be an ASCII character".to_string());
        }
        if self.workers == 0 {
            return Err("at least one writer is required".to_string());
        }
        if self.queue_size == 0 {
            return Err("queue size must be positive".to_string());
        }
        Ok(())
    }

    /// CSV reader for this configuration. Rows may have any number of fields;
    /// short rows are rejected per row rather than failing the load.
    pub fn csv_reader<R: Read>(&self, input: R) -> csv::Reader<R> {
        ReaderBuilder::new()
            .delimiter(self.delimiter)
            .has_headers(self.skip_header)
            .flexible(true)
            .trim(Trim::All)
            .from_reader(input)
    }
}

/// Counters for one load.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct LoadStats {
    /// Data records read, header excluded.
    pub rows: usize,
    /// Points written to the store.
    pub loaded: usize,
    /// Rows rejected by the filters.
    pub skipped: usize,
}

/// Load every record of `input` into `store`.
///
/// The input is parsed on a blocking thread. Rejected rows are counted and
/// skipped. A store failure stops the writer that hit it; the load then
/// reports the first such error once the remaining writers have drained the
/// queue.
pub async fn load<R>(
    input: R,
    store: Arc<dyn PointStore>,
    config: &LoaderConfig,
) -> DensityResult<LoadStats>
where
    R: Read + Send + 'static,
{
    config.validate().map_err(DensityError::Config)?;

    let start = Instant::now();
    let (tx, rx) = mpsc::channel::<GeoPoint>(config.queue_size);
    let rx = Arc::new(Mutex::new(rx));

    let writers: Vec<_> = (0..config.workers)
        .map(|id| {
            let rx = rx.clone();
            let store = store.clone();
            let zoom = config.zoom;
            tokio::spawn(async move { write_points(id, rx, store, zoom).await })
        })
        .collect();
    drop(rx);

    let reader_config = config.clone();
    let read = tokio::task::spawn_blocking(move || read_records(input, &reader_config, tx))
        .await
        .map_err(|e| DensityError::Internal(format!("Reader task failed: {}", e)))
        .and_then(|result| result);

    let mut loaded = 0;
    let mut first_error = None;
    for writer in writers {
        match writer.await {
            Ok(Ok(written)) => loaded += written,
            Ok(Err(e)) => {
                first_error.get_or_insert(e);
            }
            Err(e) => {
                first_error.get_or_insert(DensityError::Internal(format!("Writer task failed: {}", e)));
            }
        }
    }

    let mut stats = read?;
    if let Some(e) = first_error {
        return Err(e);
    }
    stats.loaded = loaded;

    info!(
        rows = stats.rows,
        loaded = stats.loaded,
        skipped = stats.skipped,
        zoom = config.zoom,
        elapsed_ms = start.elapsed().as_millis() as u64,
        "Load complete"
    );

    Ok(stats)
}

/// Parse records and queue the accepted points. Runs on a blocking thread.
fn read_records<R: Read>(
    input: R,
    config: &LoaderConfig,
    tx: mpsc::Sender<GeoPoint>,
) -> DensityResult<LoadStats> {
    let mut reader = config.csv_reader(input);
    let mut record = StringRecord::new();
    let mut stats = LoadStats::default();

    loop {
        let parsed = match reader.read_record(&mut record) {
            Ok(true) => parse_record(&record, config.lat_index, config.lng_index),
            Ok(false) => break,
            Err(e) if e.is_io_error() => {
                return Err(DensityError::Decode(format!("Input read failed: {}", e)));
            }
            Err(e) => Err(RowError::Malformed(e.to_string())),
        };
        stats.rows += 1;

        match parsed {
            Ok(point) => {
                if tx.blocking_send(point).is_err() {
                    warn!(row = stats.rows, "All writers stopped, abandoning input");
                    break;
                }
            }
            Err(reason) => {
                stats.skipped += 1;
                debug!(row = stats.rows, reason = %reason, "Skipping row");
            }
        }

        if stats.rows % PROGRESS_INTERVAL == 0 {
            info!(rows = stats.rows, skipped = stats.skipped, "Load progress");
        }
    }

    Ok(stats)
}

async fn write_points(
    id: usize,
    rx: Arc<Mutex<mpsc::Receiver<GeoPoint>>>,
    store: Arc<dyn PointStore>,
    zoom: u32,
) -> DensityResult<usize> {
    let mut written = 0;
    loop {
        let next = rx.lock().await.recv().await;
        let Some(point) = next else { break };

        let (x, y) = projection::tile_index(zoom, point.lat, point.lng);
        if let Err(e) = store.insert(zoom, x, y, point).await {
            warn!(worker = id, error = %e, "Insert failed, stopping writer");
            return Err(e);
        }
        written += 1;
    }

    debug!(worker = id, written = written, "Writer finished");
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = LoaderConfig::default();
        assert_eq!(config.zoom, 18);
        assert_eq!(config.workers, 64);
        assert_eq!(config.queue_size, 1024);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_config() {
        let config = LoaderConfig {
            lng_index: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = LoaderConfig {
            workers: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = LoaderConfig {
            delimiter: 0xa7,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_quoted_fields_keep_their_delimiters() {
        let input = "\"Raleigh, NC\",35.7796,-78.6382\n\"say \"\"hi\"\"\",51.5074,-0.1278\n";
        let config = LoaderConfig {
            lat_index: 1,
            lng_index: 2,
            ..Default::default()
        };
        let mut reader = config.csv_reader(input.as_bytes());
        let points: Vec<_> = reader
            .records()
            .map(|r| parse_record(&r.unwrap(), 1, 2).unwrap())
            .collect();
        assert_eq!(
            points,
            vec![GeoPoint::new(35.7796, -78.6382), GeoPoint::new(51.5074, -0.1278)]
        );
    }
}
