//! Sources of time series: RRD files and graphite/prometheus JSON.

pub mod graphite;
pub mod prometheus;
pub mod rrd;

pub use graphite::Graphite;
pub use prometheus::Prometheus;
pub use rrd::{Archive, ConsolidationFunction, DataSource, DataSourceType, Endianness, RrdError, RrdFile};

use strum::{AsRefStr, Display};
use thiserror::Error;

use crate::series::TimeSeries;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Rrd(#[from] RrdError),

    #[error("Unsupported prometheus result type: {0}")]
    UnsupportedResultType(String),

    #[error("Unrecognized data format")]
    UnknownFormat,
}

/// Data formats that can be loaded into time series.
#[derive(AsRefStr, Clone, Copy, Debug, Display, PartialEq, Eq)]
pub enum Format {
    Rrd,
    Graphite,
    Prometheus,
    Unknown,
}

impl Format {
    /// Detect the format from the first bytes of the data.
    pub fn detect(data: &[u8]) -> Self {
        if RrdFile::detect(data) {
            Format::Rrd
        } else if Graphite::detect(data) {
            Format::Graphite
        } else if Prometheus::detect(data) {
            Format::Prometheus
        } else {
            Format::Unknown
        }
    }
}

/// Load every series in `data`.
///
/// For RRD files each key is read over `window`, or over the range the
/// unconsolidated archives cover when no window is given. JSON series are
/// trimmed to `[start, end)` when a window is given.
pub fn load(data: &[u8], window: Option<(i64, i64)>) -> Result<Vec<TimeSeries>, SourceError> {
    match Format::detect(data) {
        Format::Rrd => {
            let rrd = RrdFile::parse(data)?;
            let (start, end) = window.unwrap_or_else(|| rrd.default_window());
            Ok(rrd
                .keys()
                .iter()
                .map(|key| rrd.get_time_series(key, start, end, None))
                .collect())
        }
        Format::Graphite => Ok(trim(Graphite::parse(data)?, window)),
        Format::Prometheus => Ok(trim(Prometheus::parse(data)?, window)),
        Format::Unknown => Err(SourceError::UnknownFormat),
    }
}

fn trim(series: Vec<TimeSeries>, window: Option<(i64, i64)>) -> Vec<TimeSeries> {
    match window {
        Some((start, end)) => series.iter().map(|ts| ts.within(start, end)).collect(),
        None => series,
    }
}
