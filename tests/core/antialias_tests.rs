//! Tests for antialiased coverage grids
//!
//! Tests cover:
//! - Line coverage per column summing to a whole cell
//! - Fill coverage under, above and below the plot bounds
//! - Samples far outside the bounds
//! - Gaps breaking the line

use yeri::series::{Bounds, CellData, TimeSeries};

use crate::common::assertions::assert_valid_cells;
use crate::common::float_cmp::assert_approx_eq;
use crate::common::synthetic::{dense, series};

fn column_width(cells: &CellData, x: usize) -> f64 {
    (0..cells.height).map(|y| cells.width_at(x, y)).sum()
}

#[test]
fn test_ramp_matches_reference_grid() {
    let ramp = dense(
        "ramp",
        &[100, 120, 140, 160, 180, 200],
        &[50.0, 100.0, 150.0, 200.0, 250.0, 300.0],
    );
    let cells = ramp.antialias(4, 5, Bounds::default());
    assert_eq!(
        cells.width_percent,
        vec![
            0.0, 0.0, 0.0, 0.96, //
            0.0, 0.0, 0.92, 0.04, //
            0.0, 0.88, 0.08, 0.0, //
            0.84, 0.12, 0.0, 0.0, //
            0.16, 0.0, 0.0, 0.0,
        ]
    );
    assert_valid_cells(&cells);
}

#[test]
fn test_every_column_gets_one_cell_of_line() {
    let zigzag = dense("zigzag", &[0, 10, 20, 30, 40], &[0.0, 10.0, 0.0, 10.0, 0.0]);
    let cells = zigzag.antialias(4, 5, Bounds::new(10.0, 0.0, 0, 40));
    for x in 0..4 {
        assert_approx_eq(column_width(&cells, x), 1.0, 0.01);
    }
    assert_valid_cells(&cells);
}

#[test]
fn test_flat_line_fill() {
    let flat = dense("flat", &[0, 4], &[0.25, 0.25]);
    let cells = flat.antialias(4, 2, Bounds::new(1.0, 0.0, 0, 4));
    for x in 0..4 {
        assert_eq!(cells.width_at(x, 1), 1.0);
        assert_eq!(cells.fill_at(x, 1), 0.5);
        assert_eq!(cells.width_at(x, 0), 0.0);
        assert_eq!(cells.fill_at(x, 0), 0.0);
    }
}

#[test]
fn test_gap_breaks_the_line() {
    let ts = series("gap", &[(0, Some(0.5)), (10, None), (20, Some(0.5)), (30, Some(0.5))]);
    let cells = ts.antialias(3, 2, Bounds::new(2.0, 0.0, 0, 30));
    assert_eq!(column_width(&cells, 0), 0.0);
    assert_eq!(column_width(&cells, 1), 0.0);
    assert_eq!(cells.width_at(2, 1), 1.0);
}

#[test]
fn test_above_top_fills_whole_column() {
    let high = dense("high", &[0, 10], &[10.0, 10.0]);
    let cells = high.antialias(2, 3, Bounds::new(1.0, 0.0, 0, 10));
    assert!(cells.width_percent.iter().all(|&v| v == 0.0));
    assert!(cells.fill_percent.iter().all(|&v| v == 1.0));
}

#[test]
fn test_below_bottom_is_dropped() {
    let low = dense("low", &[0, 10], &[-5.0, -5.0]);
    let cells = low.antialias(2, 3, Bounds::new(1.0, 0.0, 0, 10));
    assert_eq!(cells, CellData::empty(2, 3));
}

#[test]
fn test_far_below_bottom_stays_bounded() {
    let plunge = dense("plunge", &[0, 10, 20], &[5.0, 5.0, -1e12]);
    let cells = plunge.antialias(4, 5, Bounds::new(10.0, 0.0, 0, 20));
    assert_eq!(cells.width_at(0, 2), 1.0);
    assert_eq!(cells.width_at(1, 2), 1.0);
    assert_eq!(cells.width_percent.iter().sum::<f64>(), 2.0);
    assert_eq!(cells.fill_at(0, 2), 0.5);
    assert_eq!(cells.fill_at(0, 4), 1.0);
    assert_eq!(column_width(&cells, 3), 0.0);
    assert_valid_cells(&cells);

    // default bounds put the bottom at zero
    let dive = dense("dive", &[0, 10], &[1.0, -4e9]);
    assert_valid_cells(&dive.antialias(4, 5, Bounds::default()));
}

#[test]
fn test_far_above_top_fills_whole_column() {
    let spike = dense("spike", &[0, 20], &[1e12, 1e12]);
    let cells = spike.antialias(4, 5, Bounds::new(1.0, 0.0, 0, 20));
    assert!(cells.width_percent.iter().all(|&v| v == 0.0));
    assert!(cells.fill_percent.iter().all(|&v| v == 1.0));
}

#[test]
fn test_samples_far_outside_left_and_right() {
    let wide = dense("wide", &[-1_000_000_000_000, 1_000_000_000_000], &[5.0, 5.0]);
    let cells = wide.antialias(4, 5, Bounds::new(10.0, 0.0, 0, 20));
    for x in 0..4 {
        assert_eq!(cells.width_at(x, 2), 1.0);
        assert_eq!(column_width(&cells, x), 1.0);
    }
}

#[test]
fn test_unsorted_input_matches_sorted() {
    let sorted = dense("ts", &[0, 10, 20], &[1.0, 3.0, 2.0]);
    let unsorted = series("ts", &[(20, Some(2.0)), (0, Some(1.0)), (10, Some(3.0))]);
    let bounds = Bounds::new(4.0, 0.0, 0, 20);
    assert_eq!(unsorted.antialias(5, 4, bounds), sorted.antialias(5, 4, bounds));
    assert_eq!(unsorted.timestamps, vec![20, 0, 10]);
}

#[test]
fn test_zero_sized_grid() {
    let cells = dense("ts", &[0, 10], &[1.0, 2.0]).antialias(0, 5, Bounds::default());
    assert!(cells.width_percent.is_empty());
    assert!(cells.fill_percent.is_empty());
}

#[test]
fn test_cell_indexing() {
    let cells = CellData::empty(3, 2);
    assert_eq!(cells.index(2, 1), 5);
    assert_eq!(cells.width_at(5, 5), 0.0);
    let empty = TimeSeries::new("empty").antialias(3, 2, Bounds::default());
    assert_eq!(empty, cells);
}
