//! Time series data model.
//!
//! - `time_series` - a named series of `(timestamp, Option<f64>)` samples,
//!   with sorting, gap filling and resampling
//! - `antialias` - projection of a series onto a grid of partially covered cells
//! - `list` - a set of series aligned onto one shared timestamp grid

pub mod antialias;
pub mod list;
pub mod time_series;

pub use antialias::{Bounds, CellData};
pub use list::TimeSeriesList;
pub use time_series::{Point, Resample, SeriesError, TimeSeries, MAX_GAP_INTERVALS};
