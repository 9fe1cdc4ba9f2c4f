//! Antialiased rasterization of a time series onto a grid of cells.
//!
//! The series is mapped into continuous cell coordinates, split so that every
//! piece of the line lies inside a single cell, and each piece then credits
//! the cell it crosses with the fraction of the cell's width it spans
//! (`width_percent`) and the fraction of the cell's area below it
//! (`fill_percent`). Cells under a piece get full fill for its width.

use serde::Serialize;

use super::time_series::TimeSeries;

/// Values within this distance of an integer are treated as that integer, so
/// float noise can't push a point across a cell boundary.
const SNAP_EPSILON: f64 = 1e-9;

/// Plot bounds. Unset fields default to the series' own extent, with `bottom`
/// defaulting to zero.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Bounds {
    pub top: Option<f64>,
    pub bottom: Option<f64>,
    pub left: Option<i64>,
    pub right: Option<i64>,
}

impl Bounds {
    pub fn new(top: f64, bottom: f64, left: i64, right: i64) -> Self {
        Self {
            top: Some(top),
            bottom: Some(bottom),
            left: Some(left),
            right: Some(right),
        }
    }
}

/// Coverage of each cell by one series. Both grids are `width * height`
/// fractions in `[0, 1]`, indexed `y * width + x` with `y = 0` at the top.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct CellData {
    pub width: usize,
    pub height: usize,
    /// How much of the cell's width the line passes through.
    pub width_percent: Vec<f64>,
    /// How much of the cell's area lies below the line.
    pub fill_percent: Vec<f64>,
}

impl CellData {
    pub fn empty(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            width_percent: vec![0.0; width * height],
            fill_percent: vec![0.0; width * height],
        }
    }

    pub fn index(&self, x: usize, y: usize) -> usize {
        y * self.width + x
    }

    pub fn width_at(&self, x: usize, y: usize) -> f64 {
        self.width_percent.get(self.index(x, y)).copied().unwrap_or(0.0)
    }

    pub fn fill_at(&self, x: usize, y: usize) -> f64 {
        self.fill_percent.get(self.index(x, y)).copied().unwrap_or(0.0)
    }
}

/// Accumulator in value space: rows counted from the bottom.
struct Grid {
    width: usize,
    height: usize,
    line: Vec<f64>,
    fill: Vec<f64>,
}

impl Grid {
    fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            line: vec![0.0; width * height],
            fill: vec![0.0; width * height],
        }
    }

    /// Credit one piece of the line, from `a` to `b`, which lies in a single cell.
    fn add_piece(&mut self, a: (f64, f64), b: (f64, f64)) {
        let dx = b.0 - a.0;
        if dx <= 0.0 {
            return;
        }
        let col = ((a.0 + b.0) / 2.0).floor();
        if col < 0.0 || col >= self.width as f64 {
            return;
        }
        let col = col as usize;
        let row = ((a.1 + b.1) / 2.0).floor();

        if row >= self.height as f64 {
            // above the top: the whole column is under the line
            for r in 0..self.height {
                self.fill[r * self.width + col] += dx;
            }
            return;
        }
        if row < 0.0 {
            return;
        }

        let r = row as usize;
        let index = r * self.width + col;
        self.line[index] += dx;
        let ya = (a.1 - row).clamp(0.0, 1.0);
        let yb = (b.1 - row).clamp(0.0, 1.0);
        self.fill[index] += dx * (ya + yb) / 2.0;
        for below in 0..r {
            self.fill[below * self.width + col] += dx;
        }
    }

    fn into_cells(self) -> CellData {
        let mut cells = CellData::empty(self.width, self.height);
        for row in 0..self.height {
            for col in 0..self.width {
                let from = row * self.width + col;
                let to = (self.height - 1 - row) * self.width + col;
                cells.width_percent[to] = finish(self.line[from]);
                cells.fill_percent[to] = finish(self.fill[from]);
            }
        }
        cells
    }
}

impl TimeSeries {
    /// Rasterize onto a `width x height` grid. Gaps break the line. Pieces
    /// above the top fill their whole column; pieces below the bottom or
    /// outside `[left, right]` are dropped.
    pub fn antialias(&self, width: usize, height: usize, bounds: Bounds) -> CellData {
        if width == 0 || height == 0 {
            return CellData::empty(width, height);
        }
        let series = self.sorted();
        let (Some(&first), Some(&last)) = (series.timestamps.first(), series.timestamps.last()) else {
            return CellData::empty(width, height);
        };

        let bottom = bounds.bottom.unwrap_or(0.0);
        let top = bounds
            .top
            .or_else(|| series.max())
            .filter(|&top| top > bottom)
            .unwrap_or(bottom + 1.0);
        let left = bounds.left.unwrap_or(first);
        let right = bounds.right.unwrap_or(last).max(left + 1);
        let cell_width = (right - left) as f64 / width as f64;
        let cell_height = (top - bottom) / height as f64;

        let mut grid = Grid::new(width, height);
        let mut run: Vec<(f64, f64)> = Vec::new();
        for point in series.points() {
            match point.value.filter(|v| v.is_finite()) {
                Some(value) if ((value - bottom) / cell_height).is_finite() => run.push((
                    snap((point.timestamp - left) as f64 / cell_width),
                    snap((value - bottom) / cell_height),
                )),
                _ => {
                    draw_run(&mut grid, &run);
                    run.clear();
                }
            }
        }
        draw_run(&mut grid, &run);
        grid.into_cells()
    }
}

fn draw_run(grid: &mut Grid, run: &[(f64, f64)]) {
    let height = grid.height as f64;
    for segment in run.windows(2) {
        let Some((a, b)) = clip_columns(segment[0], segment[1], grid.width as f64) else {
            continue;
        };
        for (a, b) in split_at_edges(a, b, height) {
            let mid = (a.1 + b.1) / 2.0;
            if mid < 0.0 {
                continue;
            }
            // above the top only the x extent matters
            let (a, b) = if mid > height {
                ((a.0, height), (b.0, height))
            } else {
                (a, b)
            };
            let pieces = split_rows(&split_columns(&[a, b]));
            for piece in pieces.windows(2) {
                grid.add_piece(piece[0], piece[1]);
            }
        }
    }
}

/// Cut a segment down to `0 <= x <= width`, or `None` if nothing is left.
fn clip_columns(a: (f64, f64), b: (f64, f64), width: f64) -> Option<((f64, f64), (f64, f64))> {
    if b.0 <= a.0 || b.0 <= 0.0 || a.0 >= width {
        return None;
    }
    let y_at = |x: f64| snap(a.1 + (b.1 - a.1) * (x - a.0) / (b.0 - a.0));
    let start = if a.0 < 0.0 { (0.0, y_at(0.0)) } else { a };
    let end = if b.0 > width { (width, y_at(width)) } else { b };
    Some((start, end))
}

/// Split a segment where it crosses the bottom (`y = 0`) or top (`y = height`).
fn split_at_edges(a: (f64, f64), b: (f64, f64), height: f64) -> Vec<((f64, f64), (f64, f64))> {
    let mut edges = [0.0, height];
    if b.1 < a.1 {
        edges.reverse();
    }
    let mut vertices = vec![a];
    for y in edges {
        if (a.1 < y && y < b.1) || (b.1 < y && y < a.1) {
            vertices.push((snap(a.0 + (b.0 - a.0) * (y - a.1) / (b.1 - a.1)), y));
        }
    }
    vertices.push(b);
    vertices.windows(2).map(|pair| (pair[0], pair[1])).collect()
}

/// Add a vertex wherever a segment crosses an integer x. Callers clip to the
/// grid first so the walk is bounded by its size.
fn split_columns(run: &[(f64, f64)]) -> Vec<(f64, f64)> {
    let mut out = Vec::with_capacity(run.len() * 2);
    if let Some(&first) = run.first() {
        out.push(first);
    }
    for segment in run.windows(2) {
        let (a, b) = (segment[0], segment[1]);
        let mut x = a.0.floor() + 1.0;
        while x < b.0 {
            out.push((x, snap(a.1 + (b.1 - a.1) * (x - a.0) / (b.0 - a.0))));
            x += 1.0;
        }
        out.push(b);
    }
    out
}

/// Add a vertex wherever a segment crosses an integer y, in either direction.
fn split_rows(points: &[(f64, f64)]) -> Vec<(f64, f64)> {
    let mut out = Vec::with_capacity(points.len() * 2);
    if let Some(&first) = points.first() {
        out.push(first);
    }
    for segment in points.windows(2) {
        let (a, b) = (segment[0], segment[1]);
        let x_at = |y: f64| snap(a.0 + (b.0 - a.0) * (y - a.1) / (b.1 - a.1));
        if b.1 > a.1 {
            let mut y = a.1.floor() + 1.0;
            while y < b.1 {
                out.push((x_at(y), y));
                y += 1.0;
            }
        } else if b.1 < a.1 {
            let mut y = a.1.ceil() - 1.0;
            while y > b.1 {
                out.push((x_at(y), y));
                y -= 1.0;
            }
        }
        out.push(b);
    }
    out
}

fn snap(v: f64) -> f64 {
    let rounded = v.round();
    if (v - rounded).abs() < SNAP_EPSILON {
        rounded
    } else {
        v
    }
}

fn finish(v: f64) -> f64 {
    (v.clamp(0.0, 1.0) * 1000.0).round() / 1000.0
}
