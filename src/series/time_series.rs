//! A named series of timestamped samples.
//!
//! Timestamps are integer seconds. A value of `None` is a gap in the data: it
//! is never treated as zero and it survives every transform in this module.

use std::borrow::Cow;
use std::fmt;

use serde::Serialize;
use strum::{AsRefStr, EnumString};
use thiserror::Error;

/// Gaps wider than this many intervals are refused by
/// [`TimeSeries::normalize`].
pub const MAX_GAP_INTERVALS: i64 = 100;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SeriesError {
    #[error("Data points are too distant on the time scale: gap of {gap}s at interval {interval}s")]
    TooDistant { gap: i64, interval: i64 },

    #[error("Interval must be positive, got {0}")]
    InvalidInterval(i64),

    #[error("Got {timestamps} timestamps but {values} values")]
    LengthMismatch { timestamps: usize, values: usize },
}

/// One sample.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Point {
    pub timestamp: i64,
    pub value: Option<f64>,
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.value {
            Some(v) => write!(f, "({}, {})", self.timestamp, v),
            None => write!(f, "({}, null)", self.timestamp),
        }
    }
}

/// How [`TimeSeries::to_interval`] computes the value at each grid point.
#[derive(AsRefStr, Clone, Copy, Debug, Default, EnumString, PartialEq, Eq)]
#[strum(serialize_all = "lowercase")]
pub enum Resample {
    /// Linear interpolation between the bracketing samples.
    #[default]
    Interpolate,
    /// Mean of the present samples within half an interval of the grid point.
    Average,
}

/// A named list of samples. `timestamps` and `values` are index-aligned and
/// always the same length; timestamps may be unsorted until [`sort`](Self::sort).
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct TimeSeries {
    pub name: String,
    pub timestamps: Vec<i64>,
    pub values: Vec<Option<f64>>,
}

impl TimeSeries {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            timestamps: Vec::new(),
            values: Vec::new(),
        }
    }

    pub fn from_arrays(
        name: impl Into<String>,
        timestamps: Vec<i64>,
        values: Vec<Option<f64>>,
    ) -> Result<Self, SeriesError> {
        if timestamps.len() != values.len() {
            return Err(SeriesError::LengthMismatch {
                timestamps: timestamps.len(),
                values: values.len(),
            });
        }
        Ok(Self {
            name: name.into(),
            timestamps,
            values,
        })
    }

    /// Append `(timestamp, value)` pairs.
    pub fn add_points(&mut self, points: &[(i64, Option<f64>)]) {
        self.timestamps.reserve(points.len());
        self.values.reserve(points.len());
        for &(timestamp, value) in points {
            self.timestamps.push(timestamp);
            self.values.push(value);
        }
    }

    /// Append graphite-style `[value, timestamp]` pairs.
    pub fn add_graphite_points(&mut self, points: &[(Option<f64>, i64)]) {
        self.timestamps.reserve(points.len());
        self.values.reserve(points.len());
        for &(value, timestamp) in points {
            self.timestamps.push(timestamp);
            self.values.push(value);
        }
    }

    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    pub fn points(&self) -> impl Iterator<Item = Point> + '_ {
        self.timestamps
            .iter()
            .zip(&self.values)
            .map(|(&timestamp, &value)| Point { timestamp, value })
    }

    /// Samples as `(timestamp, value)` pairs, in timestamp order.
    pub fn to_vec(&self) -> Vec<(i64, Option<f64>)> {
        let series = self.sorted();
        series
            .timestamps
            .iter()
            .copied()
            .zip(series.values.iter().copied())
            .collect()
    }

    /// The samples with `start <= timestamp < end`, in their current order.
    pub fn within(&self, start: i64, end: i64) -> TimeSeries {
        let mut series = TimeSeries::new(self.name.clone());
        for point in self.points().filter(|p| (start..end).contains(&p.timestamp)) {
            series.timestamps.push(point.timestamp);
            series.values.push(point.value);
        }
        series
    }

    /// Smallest present value.
    pub fn min(&self) -> Option<f64> {
        self.values.iter().flatten().copied().reduce(f64::min)
    }

    /// Largest present value.
    pub fn max(&self) -> Option<f64> {
        self.values.iter().flatten().copied().reduce(f64::max)
    }

    pub fn is_sorted(&self) -> bool {
        self.timestamps.windows(2).all(|w| w[0] <= w[1])
    }

    /// Stable sort by timestamp, keeping values in lockstep.
    pub fn sort(&mut self) {
        if self.is_sorted() {
            return;
        }
        let mut order: Vec<usize> = (0..self.len()).collect();
        order.sort_by_key(|&i| self.timestamps[i]);
        self.timestamps = order.iter().map(|&i| self.timestamps[i]).collect();
        self.values = order.iter().map(|&i| self.values[i]).collect();
    }

    /// The series itself if already sorted, otherwise a sorted copy.
    pub fn sorted(&self) -> Cow<'_, TimeSeries> {
        if self.is_sorted() {
            Cow::Borrowed(self)
        } else {
            let mut copy = self.clone();
            copy.sort();
            Cow::Owned(copy)
        }
    }

    /// Smallest positive gap between consecutive timestamps.
    pub fn min_interval(&self) -> Option<i64> {
        min_gap(&self.sorted().timestamps)
    }

    /// Sort, pad with missing samples at `minimum` and `maximum` when the
    /// series does not reach them, then fill every gap wider than `interval`
    /// with missing samples at `prev + k * interval`.
    ///
    /// `interval` defaults to the smallest gap after padding. When none can be
    /// inferred the series is only sorted and padded. On error the samples are
    /// left sorted but otherwise unchanged.
    pub fn normalize(
        &mut self,
        minimum: Option<i64>,
        maximum: Option<i64>,
        interval: Option<i64>,
    ) -> Result<(), SeriesError> {
        if let Some(interval) = interval.filter(|&i| i <= 0) {
            return Err(SeriesError::InvalidInterval(interval));
        }
        self.sort();

        let mut points = self.to_vec();
        if let Some(min) = minimum {
            if points.first().map_or(true, |&(first, _)| first > min) {
                points.insert(0, (min, None));
            }
        }
        if let Some(max) = maximum {
            if points.last().map_or(true, |&(last, _)| last < max) {
                points.push((max, None));
            }
        }

        let timestamps: Vec<i64> = points.iter().map(|&(t, _)| t).collect();
        let interval = match interval.or_else(|| min_gap(&timestamps)) {
            Some(interval) => interval,
            None => {
                self.replace(points);
                return Ok(());
            }
        };

        let limit = interval.saturating_mul(MAX_GAP_INTERVALS);
        let mut filled: Vec<(i64, Option<f64>)> = Vec::with_capacity(points.len());
        for (timestamp, value) in points {
            if let Some(&(prev, _)) = filled.last() {
                let gap = timestamp - prev;
                if gap > limit {
                    return Err(SeriesError::TooDistant { gap, interval });
                }
                let mut t = prev + interval;
                while t < timestamp {
                    filled.push((t, None));
                    t += interval;
                }
            }
            filled.push((timestamp, value));
        }
        self.replace(filled);
        Ok(())
    }

    /// Value at `timestamp`, interpolated linearly between the bracketing
    /// samples. An exact hit returns the stored value, gap or not. Outside the
    /// series, or next to a gap, the result is `None` unless `skip_missing`
    /// lets the search walk outward past gaps first.
    pub fn interpolate(&self, timestamp: i64, skip_missing: bool) -> Option<f64> {
        let series = self.sorted();
        interpolate_sorted(&series.timestamps, &series.values, timestamp, skip_missing)
    }

    /// Resample onto the grid `minimum, minimum + interval, ...` up to but not
    /// including `maximum`. `minimum` defaults to the first timestamp and
    /// `maximum` to one interval past the last.
    pub fn to_interval(
        &self,
        interval: i64,
        minimum: Option<i64>,
        maximum: Option<i64>,
        op: Resample,
    ) -> Result<TimeSeries, SeriesError> {
        if interval <= 0 {
            return Err(SeriesError::InvalidInterval(interval));
        }
        let series = self.sorted();
        let mut rv = TimeSeries::new(self.name.clone());
        let first = minimum.or_else(|| series.timestamps.first().copied());
        let last = maximum.or_else(|| series.timestamps.last().map(|&t| t.saturating_add(interval)));
        let (Some(first), Some(last)) = (first, last) else {
            return Ok(rv);
        };

        let mut timestamp = first;
        while timestamp < last {
            let value = match op {
                Resample::Interpolate => {
                    interpolate_sorted(&series.timestamps, &series.values, timestamp, false)
                }
                Resample::Average => bucket_average(&series, timestamp, interval),
            };
            rv.timestamps.push(timestamp);
            rv.values.push(value);
            timestamp = match timestamp.checked_add(interval) {
                Some(t) => t,
                None => break,
            };
        }
        Ok(rv)
    }

    fn replace(&mut self, points: Vec<(i64, Option<f64>)>) {
        (self.timestamps, self.values) = points.into_iter().unzip();
    }
}

fn min_gap(sorted: &[i64]) -> Option<i64> {
    sorted.windows(2).map(|w| w[1] - w[0]).filter(|&gap| gap > 0).min()
}

fn interpolate_sorted(
    timestamps: &[i64],
    values: &[Option<f64>],
    timestamp: i64,
    skip_missing: bool,
) -> Option<f64> {
    let mut right = timestamps.partition_point(|&t| t < timestamp);
    let mut left = right.checked_sub(1);
    if skip_missing {
        while let Some(l) = left {
            if values[l].is_some() {
                break;
            }
            left = l.checked_sub(1);
        }
        while right < timestamps.len() && values[right].is_none() {
            right += 1;
        }
    }

    if timestamps.get(right) == Some(&timestamp) {
        return values[right];
    }
    let left = left?;
    let (t1, y1) = (timestamps[left], values[left]?);
    let (t2, y2) = (*timestamps.get(right)?, values[right]?);
    Some(y1 + (y2 - y1) * (timestamp - t1) as f64 / (t2 - t1) as f64)
}

/// Mean of the present samples in `[timestamp - interval/2, timestamp + interval/2)`.
/// An empty bucket falls back to interpolation; a bucket of gaps is a gap.
fn bucket_average(series: &TimeSeries, timestamp: i64, interval: i64) -> Option<f64> {
    let half = interval as f64 / 2.0;
    let center = timestamp as f64;
    let lo = series.timestamps.partition_point(|&t| (t as f64) < center - half);
    let hi = series.timestamps.partition_point(|&t| (t as f64) < center + half);
    if lo == hi {
        return interpolate_sorted(&series.timestamps, &series.values, timestamp, false);
    }
    let present: Vec<f64> = series.values[lo..hi].iter().flatten().copied().collect();
    if present.is_empty() {
        None
    } else {
        Some(present.iter().sum::<f64>() / present.len() as f64)
    }
}
