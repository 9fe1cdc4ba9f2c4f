//! yeri - time series plumbing for terminal and SVG graphs
//!
//! This library turns raw time series into the data structures a graph
//! renderer paints: series aligned on a shared grid, antialiased coverage
//! grids, calendar-aware axis ticks and a laid-out graph box. It also reads
//! round-robin database files and graphite/prometheus JSON.
//!
//! ## Module Structure
//!
//! - [`time`] - Time constants, sequence generation and the `TimeBuddy` tick chooser
//! - [`series`] - The `TimeSeries` model, resampling and rasterization
//!   - `time_series` - Sorting, gap filling, interpolation, interval conversion
//!   - `antialias` - Line and fill coverage per cell
//!   - `list` - Alignment of several series and CSV export
//! - [`parsers`] - Data sources (RRD, graphite, prometheus) and format detection
//! - [`numbers`] - SI formatting and currency/precision rounding
//! - [`config`] - Graph configuration with defaults and validation
//! - [`layout`] - Graph box, bounds, grid lines, labels and coverage grids

pub mod config;
pub mod layout;
pub mod numbers;
pub mod parsers;
pub mod series;
pub mod time;
