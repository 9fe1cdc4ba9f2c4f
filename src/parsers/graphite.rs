//! Graphite render API JSON (`format=json`) parser
//!
//! `[{"target": "name", "datapoints": [[value | null, timestamp], ...]}, ...]`

use serde::Deserialize;

use super::SourceError;
use crate::series::TimeSeries;

#[derive(Debug, Deserialize)]
struct Target {
    target: String,
    #[serde(default)]
    datapoints: Vec<(Option<f64>, i64)>,
}

/// Graphite render API parser
pub struct Graphite;

impl Graphite {
    /// Detect if data looks like a graphite response: a JSON array.
    pub fn detect(data: &[u8]) -> bool {
        data.iter().find(|b| !b.is_ascii_whitespace()) == Some(&b'[')
    }

    pub fn parse(data: &[u8]) -> Result<Vec<TimeSeries>, SourceError> {
        let targets: Vec<Target> = serde_json::from_slice(data)?;
        let series: Vec<TimeSeries> = targets
            .into_iter()
            .map(|t| {
                let mut ts = TimeSeries::new(t.target);
                ts.add_graphite_points(&t.datapoints);
                ts
            })
            .collect();
        tracing::info!("Parsed {} graphite targets", series.len());
        Ok(series)
    }
}
