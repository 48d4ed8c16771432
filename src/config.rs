//! Pipeline configuration
//!
//! A single [`PipelineConfig`] selects the plotted channels, the smoothing
//! window of each source, the panel layout and where the figure goes.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::TrendError;
use crate::types::{Channel, SleepChannel, Window};

/// Default half-width of the weight smoothing window
pub const DEFAULT_WEIGHT_WINDOW: usize = 5;

/// Default half-width of the second pass over weight change
pub const DEFAULT_WEIGHT_CHANGE_WINDOW: usize = 2;

/// Default half-width of the sleep smoothing window
pub const DEFAULT_SLEEP_WINDOW: usize = 5;

/// Largest accepted half-width, a year of daily samples on each side
pub const MAX_WINDOW: usize = 365;

/// Half-widths of the symmetric smoothing windows per source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SmoothingWindows {
    pub weight: usize,
    pub weight_change: usize,
    pub sleep: usize,
}

impl Default for SmoothingWindows {
    fn default() -> Self {
        Self {
            weight: DEFAULT_WEIGHT_WINDOW,
            weight_change: DEFAULT_WEIGHT_CHANGE_WINDOW,
            sleep: DEFAULT_SLEEP_WINDOW,
        }
    }
}

impl SmoothingWindows {
    /// Primary smoothing window for a channel
    pub fn for_channel(&self, channel: Channel) -> Window {
        match channel {
            Channel::Weight | Channel::WeightChange => Window::symmetric(self.weight),
            Channel::Sleep(_) => Window::symmetric(self.sleep),
        }
    }

    /// Second pass applied to weight change
    pub fn change_window(&self) -> Window {
        Window::symmetric(self.weight_change)
    }
}

/// Panel arrangement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Layout {
    /// One panel; the second channel shares the x axis on a secondary y axis
    Single,
    /// One stacked panel per channel
    Multi,
}

/// Where the assembled figure is written
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputTarget {
    /// Figure JSON on standard output
    Stdout,
    /// Image or JSON file, chosen by extension
    File(PathBuf),
}

impl OutputTarget {
    /// `-` selects stdout, anything else is a file path
    pub fn from_arg(arg: &Path) -> Self {
        if arg.as_os_str() == "-" {
            OutputTarget::Stdout
        } else {
            OutputTarget::File(arg.to_path_buf())
        }
    }
}

/// Full configuration of one pipeline run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Channels in plotting order
    pub channels: Vec<Channel>,
    pub windows: SmoothingWindows,
    pub layout: Layout,
    pub output: OutputTarget,
    pub title: Option<String>,
    /// Image size in pixels
    pub width: u32,
    pub height: u32,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            channels: vec![
                Channel::WeightChange,
                Channel::Sleep(SleepChannel::Restlessness),
            ],
            windows: SmoothingWindows::default(),
            layout: Layout::Single,
            output: OutputTarget::Stdout,
            title: None,
            width: 1200,
            height: 700,
        }
    }
}

impl PipelineConfig {
    /// Load a configuration from JSON; missing fields take their defaults
    pub fn from_json(json: &str) -> Result<Self, TrendError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize to pretty JSON
    pub fn to_json(&self) -> Result<String, TrendError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Replace the sleep channel(s) with `channel`
    pub fn with_sleep_channel(mut self, channel: SleepChannel) -> Self {
        for c in &mut self.channels {
            if let Channel::Sleep(_) = c {
                *c = Channel::Sleep(channel);
            }
        }
        self
    }

    /// Check the configuration is drawable
    pub fn validate(&self) -> Result<(), TrendError> {
        if self.channels.is_empty() {
            return Err(TrendError::InvalidConfig(
                "at least one channel must be selected".to_string(),
            ));
        }

        if self.layout == Layout::Single && self.channels.len() > 2 {
            return Err(TrendError::InvalidConfig(format!(
                "single layout draws at most 2 channels, {} selected",
                self.channels.len()
            )));
        }

        for (name, window) in [
            ("weight", self.windows.weight),
            ("weight_change", self.windows.weight_change),
            ("sleep", self.windows.sleep),
        ] {
            if window > MAX_WINDOW {
                return Err(TrendError::InvalidConfig(format!(
                    "{} window {} exceeds the maximum of {}",
                    name, window, MAX_WINDOW
                )));
            }
        }

        if self.width == 0 || self.height == 0 {
            return Err(TrendError::InvalidConfig(
                "image size must be non-zero".to_string(),
            ));
        }

        Ok(())
    }
}
