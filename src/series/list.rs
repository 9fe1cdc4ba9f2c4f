//! Several series aligned onto one timestamp grid.
//!
//! Alignment pads every series to the shared `[min_x, max_x]` range at the
//! smallest interval among them, so rows line up for plotting and CSV export.

use std::fmt::Write;

use super::time_series::{SeriesError, TimeSeries};

/// A set of series normalized onto one shared timestamp grid, so they can be
/// plotted together.
#[derive(Clone, Debug, Default)]
pub struct TimeSeriesList {
    list: Vec<TimeSeries>,
    min_x: Option<i64>,
    max_x: Option<i64>,
    min_y: Option<f64>,
    max_y: Option<f64>,
    interval: Option<i64>,
}

impl TimeSeriesList {
    /// Take ownership of `list` and align every series, empty ones included,
    /// to `min_x..=max_x` stepping by the smallest interval found in any of
    /// them. When no series has an interval the series are left as given.
    pub fn new(mut list: Vec<TimeSeries>) -> Result<Self, SeriesError> {
        let real: Vec<&TimeSeries> = list.iter().filter(|ts| !ts.is_empty()).collect();
        let min_x = real.iter().filter_map(|ts| ts.timestamps.iter().min().copied()).min();
        let max_x = real.iter().filter_map(|ts| ts.timestamps.iter().max().copied()).max();
        let min_y = real.iter().filter_map(|ts| ts.min()).reduce(f64::min);
        let max_y = real.iter().filter_map(|ts| ts.max()).reduce(f64::max);
        let interval = real.iter().filter_map(|ts| ts.min_interval()).min();

        match interval {
            Some(interval) => {
                for ts in list.iter_mut() {
                    ts.normalize(min_x, max_x, Some(interval))?;
                }
            }
            None => {
                tracing::warn!("No series has two distinct timestamps; skipping alignment");
            }
        }

        Ok(Self {
            list,
            min_x,
            max_x,
            min_y,
            max_y,
            interval,
        })
    }

    pub fn series(&self) -> &[TimeSeries] {
        &self.list
    }

    pub fn into_inner(self) -> Vec<TimeSeries> {
        self.list
    }

    pub fn len(&self) -> usize {
        self.list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }

    pub fn min_x(&self) -> Option<i64> {
        self.min_x
    }

    pub fn max_x(&self) -> Option<i64> {
        self.max_x
    }

    pub fn min_y(&self) -> Option<f64> {
        self.min_y
    }

    pub fn max_y(&self) -> Option<f64> {
        self.max_y
    }

    pub fn interval(&self) -> Option<i64> {
        self.interval
    }

    /// CSV with a `timestamp` column followed by one column per series, gaps
    /// written as `null`. Rows follow the first series' timestamps.
    pub fn to_csv(&self) -> String {
        let mut out = String::from("timestamp");
        for ts in &self.list {
            out.push(',');
            out.push_str(&ts.name);
        }
        out.push('\n');

        let Some(first) = self.list.first() else {
            return out;
        };
        for (i, timestamp) in first.timestamps.iter().enumerate() {
            let _ = write!(out, "{}", timestamp);
            for ts in &self.list {
                match ts.values.get(i).copied().flatten() {
                    Some(value) => {
                        let _ = write!(out, ",{}", value);
                    }
                    None => out.push_str(",null"),
                }
            }
            out.push('\n');
        }
        out
    }
}
