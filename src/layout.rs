//! Graph layout: everything a renderer needs that isn't drawing.
//!
//! The graph box sits in the middle of the canvas: the title above it, y
//! axis labels to its left, x axis labels and an optional two-column legend
//! below it. [`GraphLayout`] works out the box, the value and time bounds,
//! the grid lines and their labels, and one coverage grid per series.

use std::fmt;

use chrono::DateTime;
use chrono_tz::Tz;
use thiserror::Error;

use crate::config::{ConfigError, GraphConfig};
use crate::numbers::{ceil_to_currency, ceil_to_precision, floor_to_precision, to_si};
use crate::series::{Bounds, CellData, TimeSeriesList};
use crate::time::{default_time_label, TimeBuddy, TimeScale, UNBOUNDED};

pub type XLabelFormat = Box<dyn Fn(&DateTime<Tz>, TimeScale) -> String>;
pub type YLabelFormat = Box<dyn Fn(f64) -> String>;

#[derive(Debug, Error)]
pub enum LayoutError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("No data to plot")]
    NoData,

    #[error("No room for the graph in {width}x{height} with {legend_lines} legend lines")]
    GraphTooSmall {
        width: usize,
        height: usize,
        legend_lines: usize,
    },
}

/// Cell rectangle of the plot area within the canvas.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GraphBox {
    pub x: usize,
    pub y: usize,
    pub width: usize,
    pub height: usize,
}

impl GraphBox {
    pub fn right(&self) -> usize {
        self.x + self.width
    }

    pub fn bottom(&self) -> usize {
        self.y + self.height
    }
}

/// A text label placed at a canvas cell.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Label {
    pub x: usize,
    pub y: usize,
    pub text: String,
}

pub struct GraphLayout<'a> {
    list: &'a TimeSeriesList,
    config: GraphConfig,
    time_buddy: TimeBuddy,
    top: f64,
    bottom: f64,
    left: i64,
    right: i64,
    graph: GraphBox,
    legend_lines: usize,
    x_label_format: XLabelFormat,
    y_label_format: YLabelFormat,
}

impl fmt::Debug for GraphLayout<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GraphLayout")
            .field("top", &self.top)
            .field("bottom", &self.bottom)
            .field("left", &self.left)
            .field("right", &self.right)
            .field("graph", &self.graph)
            .field("legend_lines", &self.legend_lines)
            .finish_non_exhaustive()
    }
}

impl<'a> GraphLayout<'a> {
    pub fn new(list: &'a TimeSeriesList, config: GraphConfig) -> Result<Self, LayoutError> {
        config.validate()?;
        let time_buddy = config.time_buddy()?;

        let (Some(left), Some(right)) = (list.min_x(), list.max_x()) else {
            return Err(LayoutError::NoData);
        };
        let right = right.max(left + 1);

        let top = match (config.max_y, list.max_y()) {
            (Some(max_y), _) => max_y,
            (None, Some(max_y)) => ceil_to_precision(max_y * 1.1, 2),
            (None, None) => return Err(LayoutError::NoData),
        };
        let bottom = if config.scale_to_zero {
            0.0
        } else {
            list.min_y().map(|min_y| floor_to_precision(min_y, 2)).unwrap_or(0.0)
        };
        let top = if top > bottom { top } else { bottom + 1.0 };

        let legend_lines = if config.show_legend { list.len().div_ceil(2) } else { 0 };
        let x = config.y_axis_label_width + 1;
        let y = config.title_lines();
        let height = config
            .height
            .checked_sub(legend_lines + 2 + y)
            .filter(|&h| h > 0)
            .ok_or(LayoutError::GraphTooSmall {
                width: config.width,
                height: config.height,
                legend_lines,
            })?;
        let graph = GraphBox {
            x,
            y,
            width: config.width - x,
            height,
        };
        tracing::debug!(
            "Graph box {:?}, y in [{}, {}], x in [{}, {}]",
            graph,
            bottom,
            top,
            left,
            right
        );

        Ok(Self {
            list,
            config,
            time_buddy,
            top,
            bottom,
            left,
            right,
            graph,
            legend_lines,
            x_label_format: Box::new(|time: &DateTime<Tz>, scale: TimeScale| default_time_label(time, scale)),
            y_label_format: Box::new(to_si),
        })
    }

    /// Replace the x axis label formatter.
    pub fn with_x_label_format(mut self, format: impl Fn(&DateTime<Tz>, TimeScale) -> String + 'static) -> Self {
        self.x_label_format = Box::new(format);
        self
    }

    /// Replace the y axis label formatter.
    pub fn with_y_label_format(mut self, format: impl Fn(f64) -> String + 'static) -> Self {
        self.y_label_format = Box::new(format);
        self
    }

    pub fn config(&self) -> &GraphConfig {
        &self.config
    }

    pub fn graph(&self) -> GraphBox {
        self.graph
    }

    pub fn top(&self) -> f64 {
        self.top
    }

    pub fn bottom(&self) -> f64 {
        self.bottom
    }

    pub fn left(&self) -> i64 {
        self.left
    }

    pub fn right(&self) -> i64 {
        self.right
    }

    pub fn legend_lines(&self) -> usize {
        self.legend_lines
    }

    /// Values for horizontal grid lines: the bottom and top (when their labels
    /// are shown), then currency-spaced lines strictly between them.
    pub fn y_lines(&self) -> Vec<f64> {
        if self.config.y_lines == 0 {
            return Vec::new();
        }
        let interval = ceil_to_currency((self.top - self.bottom) / self.config.y_lines as f64);
        let base = floor_to_precision(self.bottom, 1);
        let mut lines = Vec::new();
        if self.config.show_bottom_y_label {
            lines.push(self.bottom);
        }
        if self.config.show_top_y_label {
            lines.push(self.top);
        }
        lines.extend(
            (1..=self.config.y_lines)
                .map(|i| base + i as f64 * interval)
                .filter(|&y| y > self.bottom && y < self.top),
        );
        lines
    }

    /// Timestamps for vertical grid lines, as many as fit the labels. May be
    /// the degenerate `[left, UNBOUNDED]` when nothing fits.
    pub fn x_lines(&self) -> Vec<i64> {
        let count = self.graph.width / self.config.x_axis_label_width;
        self.time_buddy.time_granularity_for(self.left, self.right, count)
    }

    /// Column within the graph box for timestamp `x`.
    pub fn x_to_cell(&self, x: i64) -> usize {
        let fraction = (x - self.left) as f64 / (self.right - self.left) as f64;
        let cell = (fraction * self.graph.width as f64).floor().max(0.0) as usize;
        cell.min(self.graph.width - 1)
    }

    /// Row within the graph box for value `y`; row 0 is the top.
    pub fn y_to_cell(&self, y: f64) -> usize {
        let scale = 1.0 - (y - self.bottom) / (self.top - self.bottom);
        let cell = (scale * self.graph.height as f64).floor().max(0.0) as usize;
        cell.min(self.graph.height - 1)
    }

    /// Y axis labels, right-aligned in the label column.
    pub fn y_labels(&self) -> Vec<Label> {
        let width = self.config.y_axis_label_width;
        self.y_lines()
            .into_iter()
            .map(|y| Label {
                x: 0,
                y: self.graph.y + self.y_to_cell(y),
                text: format!("{:>width$}", (self.y_label_format)(y), width = width),
            })
            .collect()
    }

    /// X axis labels, centered under their grid line.
    pub fn x_labels(&self) -> Vec<Label> {
        let ticks: Vec<i64> = self.x_lines().into_iter().filter(|&t| t != UNBOUNDED).collect();
        let scale = match ticks.as_slice() {
            [first, second, ..] => TimeScale::for_interval(second - first),
            _ => TimeScale::default(),
        };
        ticks
            .into_iter()
            .filter_map(|t| {
                let time = self.time_buddy.local(t)?;
                let text = (self.x_label_format)(&time, scale);
                let x = (self.graph.x + self.x_to_cell(t)).saturating_sub(text.chars().count() / 2);
                Some(Label {
                    x,
                    y: self.graph.bottom() + 1,
                    text,
                })
            })
            .collect()
    }

    /// Title, centered over the whole canvas.
    pub fn title(&self) -> Option<Label> {
        let text = self.config.title.clone()?;
        let x = (self.config.width.saturating_sub(text.chars().count()) as f64 / 2.0).round() as usize;
        Some(Label { x, y: 0, text })
    }

    /// Series names in two columns under the x labels; the label starts one
    /// cell after its color swatch.
    pub fn legend(&self) -> Vec<Label> {
        if !self.config.show_legend || self.legend_lines == 0 {
            return Vec::new();
        }
        let half = (self.graph.width as f64 / 2.0).round() as usize;
        let max_len = half.saturating_sub(4);
        self.list
            .series()
            .iter()
            .enumerate()
            .map(|(i, ts)| Label {
                x: self.graph.x + half * (i / self.legend_lines),
                y: self.graph.bottom() + 2 + i % self.legend_lines,
                text: format!(" {}", ts.name).chars().take(max_len).collect(),
            })
            .collect()
    }

    /// Coverage grid of every series over the graph box.
    pub fn cells(&self) -> Vec<CellData> {
        let bounds = Bounds::new(self.top, self.bottom, self.left, self.right);
        self.list
            .series()
            .iter()
            .map(|ts| ts.antialias(self.graph.width, self.graph.height, bounds))
            .collect()
    }

    /// The grid a renderer should blend with: fill coverage for filled graphs,
    /// line coverage otherwise.
    pub fn alphas<'c>(&self, cells: &'c CellData) -> &'c [f64] {
        if self.config.fill {
            &cells.fill_percent
        } else {
            &cells.width_percent
        }
    }
}
