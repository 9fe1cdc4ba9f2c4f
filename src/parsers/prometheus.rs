//! Prometheus range query JSON parser
//!
//! Accepts a matrix result either bare,
//! `{"resultType": "matrix", "result": [...]}` (older exports use `type` and
//! `value`), or inside the HTTP API envelope `{"status": ..., "data": {...}}`.
//! Each result is `{"metric": {labels}, "values": [[timestamp, "value"], ...]}`.

use std::collections::BTreeMap;

use serde::Deserialize;

use super::SourceError;
use crate::series::TimeSeries;

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Response {
    Envelope { data: Matrix },
    Bare(Matrix),
}

#[derive(Debug, Deserialize)]
struct Matrix {
    #[serde(rename = "resultType", alias = "type")]
    result_type: String,
    #[serde(rename = "result", alias = "value", default)]
    result: Vec<Metric>,
}

#[derive(Debug, Deserialize)]
struct Metric {
    #[serde(default)]
    metric: BTreeMap<String, String>,
    #[serde(default)]
    values: Vec<(f64, String)>,
}

impl Metric {
    /// `__name__`, with any other labels in braces; `series<N>` if unlabeled.
    fn name(&self, index: usize) -> String {
        let base = self.metric.get("__name__").cloned().unwrap_or_default();
        let labels: Vec<String> = self
            .metric
            .iter()
            .filter(|(k, _)| k.as_str() != "__name__")
            .map(|(k, v)| format!("{}=\"{}\"", k, v))
            .collect();
        match (base.is_empty(), labels.is_empty()) {
            (true, true) => format!("series{}", index),
            (_, true) => base,
            _ => format!("{}{{{}}}", base, labels.join(",")),
        }
    }
}

/// Prometheus query API parser
pub struct Prometheus;

impl Prometheus {
    /// Detect if data looks like a prometheus response: a JSON object.
    pub fn detect(data: &[u8]) -> bool {
        data.iter().find(|b| !b.is_ascii_whitespace()) == Some(&b'{')
    }

    pub fn parse(data: &[u8]) -> Result<Vec<TimeSeries>, SourceError> {
        let matrix = match serde_json::from_slice::<Response>(data)? {
            Response::Envelope { data } => data,
            Response::Bare(matrix) => matrix,
        };
        if matrix.result_type != "matrix" {
            return Err(SourceError::UnsupportedResultType(matrix.result_type));
        }

        let series: Vec<TimeSeries> = matrix
            .result
            .iter()
            .enumerate()
            .map(|(i, metric)| {
                let mut ts = TimeSeries::new(metric.name(i));
                let points: Vec<(i64, Option<f64>)> = metric
                    .values
                    .iter()
                    .map(|(t, v)| (t.floor() as i64, v.parse::<f64>().ok().filter(|v| v.is_finite())))
                    .collect();
                ts.add_points(&points);
                ts
            })
            .collect();
        tracing::info!("Parsed {} prometheus series", series.len());
        Ok(series)
    }
}
