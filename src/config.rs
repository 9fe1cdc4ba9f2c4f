//! Graph configuration.
//!
//! Every field has a documented default, so a JSON config only needs the
//! fields it changes. Call [`GraphConfig::validate`] (or load through
//! [`GraphConfig::from_json`]) before handing a config to a layout.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::time::TimeBuddy;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Graph size must be non-zero, got {width}x{height}")]
    ZeroSize { width: usize, height: usize },

    #[error("Graph {dimension} of {size} is too small, need at least {minimum}")]
    TooSmall {
        dimension: &'static str,
        size: usize,
        minimum: usize,
    },

    #[error("X axis label width must be non-zero")]
    ZeroLabelWidth,

    #[error("Maximum y value must be finite, got {0}")]
    InvalidMaxY(f64),

    #[error("Unknown time zone: {0}")]
    UnknownTimezone(String),

    #[error("Failed to parse graph config: {0}")]
    Json(#[from] serde_json::Error),
}

/// Settings for one graph
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    /// Centered above the graph, if set
    pub title: Option<String>,
    /// Total width in cells, labels included
    pub width: usize,
    /// Total height in cells, labels and legend included
    pub height: usize,
    /// IANA zone for x axis ticks and labels
    pub timezone: String,
    /// Aim for this many horizontal grid lines
    pub y_lines: usize,
    /// Draw a solid shape filled down instead of a line
    pub fill: bool,
    /// Start the y axis at zero instead of the smallest value
    pub scale_to_zero: bool,
    /// Fixed top of the y axis
    pub max_y: Option<f64>,
    pub show_top_y_label: bool,
    pub show_bottom_y_label: bool,
    /// Series names under the graph, two columns
    pub show_legend: bool,
    /// Room for each x label; labels are at most 5 characters ("12:34",
    /// "05/17", "2019") so 7 leaves a space on each side
    pub x_axis_label_width: usize,
    pub y_axis_label_width: usize,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            title: None,
            width: 78,
            height: 24,
            timezone: "UTC".to_string(),
            y_lines: 5,
            fill: false,
            scale_to_zero: true,
            max_y: None,
            show_top_y_label: true,
            show_bottom_y_label: true,
            show_legend: true,
            x_axis_label_width: 7,
            y_axis_label_width: 6,
        }
    }
}

impl GraphConfig {
    /// Parse a JSON config and validate it.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: GraphConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.width == 0 || self.height == 0 {
            return Err(ConfigError::ZeroSize {
                width: self.width,
                height: self.height,
            });
        }
        // one column for the axis line, one for the plot
        let min_width = self.y_axis_label_width + 2;
        if self.width < min_width {
            return Err(ConfigError::TooSmall {
                dimension: "width",
                size: self.width,
                minimum: min_width,
            });
        }
        // x labels and axis line below one plot row
        let min_height = self.title_lines() + 3;
        if self.height < min_height {
            return Err(ConfigError::TooSmall {
                dimension: "height",
                size: self.height,
                minimum: min_height,
            });
        }
        if self.x_axis_label_width == 0 {
            return Err(ConfigError::ZeroLabelWidth);
        }
        if let Some(max_y) = self.max_y.filter(|m| !m.is_finite()) {
            return Err(ConfigError::InvalidMaxY(max_y));
        }
        self.time_buddy()?;
        Ok(())
    }

    /// Tick chooser for the configured time zone.
    pub fn time_buddy(&self) -> Result<TimeBuddy, ConfigError> {
        TimeBuddy::from_name(&self.timezone).map_err(|_| ConfigError::UnknownTimezone(self.timezone.clone()))
    }

    pub(crate) fn title_lines(&self) -> usize {
        usize::from(self.title.is_some())
    }
}
