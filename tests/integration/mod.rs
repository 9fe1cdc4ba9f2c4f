//! Integration tests for end-to-end functionality
//!
//! Tests for:
//! - RRD and JSON sources through alignment, CSV and layout
//! - Resampling loaded data before plotting
