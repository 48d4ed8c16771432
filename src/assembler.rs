//! Plot assembly
//!
//! Arranges aligned channels into panels with axis and legend labels. The
//! resulting [`Figure`] is backend-neutral; see [`crate::render`] for drawing.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::{Layout, PipelineConfig};
use crate::error::TrendError;
use crate::types::{AlignedSeries, Channel};

/// X-axis label shared by every panel
pub const DATE_AXIS_LABEL: &str = "date";

/// 0xRRGGBB colour
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Color(pub u32);

impl Color {
    pub const BLACK: Color = Color(0x000000);
    pub const BLUE: Color = Color(0x1F4FD8);

    pub fn rgb(&self) -> (u8, u8, u8) {
        (
            ((self.0 >> 16) & 0xFF) as u8,
            ((self.0 >> 8) & 0xFF) as u8,
            (self.0 & 0xFF) as u8,
        )
    }
}

/// Stroke pattern of a line
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineDash {
    #[default]
    Solid,
    Dotted,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Style {
    /// Stroke width in pixels
    pub width: u32,
    pub color: Color,
    #[serde(default)]
    pub dash: LineDash,
    /// Shade the area between the line and zero
    pub fill_to_zero: bool,
}

impl Style {
    fn for_channel(channel: Channel) -> Self {
        match channel {
            Channel::WeightChange => Style {
                width: 1,
                color: Color::BLACK,
                dash: LineDash::Dotted,
                fill_to_zero: true,
            },
            Channel::Weight => Style {
                width: 2,
                color: Color::BLACK,
                dash: LineDash::Solid,
                fill_to_zero: false,
            },
            Channel::Sleep(_) => Style {
                width: 2,
                color: Color::BLUE,
                dash: LineDash::Solid,
                fill_to_zero: false,
            },
        }
    }
}

/// One line on a panel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlotSeries {
    /// Legend label
    pub label: String,
    pub channel: Channel,
    pub dates: Vec<DateTime<Utc>>,
    pub values: Vec<f64>,
    pub style: Style,
}

impl PlotSeries {
    pub fn from_aligned(series: AlignedSeries) -> Self {
        Self {
            label: series.channel.label().to_string(),
            channel: series.channel,
            style: Style::for_channel(series.channel),
            dates: series.dates,
            values: series.values,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// A y axis and the series drawn against it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Axis {
    pub label: String,
    pub series: Vec<PlotSeries>,
}

impl Axis {
    fn for_series(series: PlotSeries) -> Self {
        Self {
            label: series.channel.axis_label().to_string(),
            series: vec![series],
        }
    }

    /// True when nothing on this axis has samples
    pub fn is_blank(&self) -> bool {
        self.series.iter().all(PlotSeries::is_empty)
    }
}

/// One plotting area sharing a date axis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Panel {
    pub x_label: String,
    pub primary: Axis,
    /// Twin axis on the right-hand side
    pub secondary: Option<Axis>,
}

impl Panel {
    pub fn is_blank(&self) -> bool {
        self.primary.is_blank() && self.secondary.as_ref().map_or(true, Axis::is_blank)
    }

    /// Every series on the panel, primary axis first
    pub fn all_series(&self) -> impl Iterator<Item = &PlotSeries> {
        self.primary
            .series
            .iter()
            .chain(self.secondary.iter().flat_map(|axis| axis.series.iter()))
    }
}

/// A complete figure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Figure {
    pub title: Option<String>,
    pub width: u32,
    pub height: u32,
    pub panels: Vec<Panel>,
}

/// Assembler arranging aligned channels per the configured layout
pub struct PlotAssembler;

impl PlotAssembler {
    /// Build a figure from channels given in plotting order
    pub fn assemble(
        config: &PipelineConfig,
        channels: Vec<AlignedSeries>,
    ) -> Result<Figure, TrendError> {
        config.validate()?;

        let mut series = channels.into_iter().map(PlotSeries::from_aligned);

        let panels = match config.layout {
            Layout::Single => {
                let primary = series.next().map(Axis::for_series).ok_or_else(|| {
                    TrendError::InvalidConfig("no channels to assemble".to_string())
                })?;
                let secondary = series.next().map(Axis::for_series);
                if series.next().is_some() {
                    return Err(TrendError::InvalidConfig(
                        "single layout draws at most 2 channels".to_string(),
                    ));
                }

                vec![Panel {
                    x_label: DATE_AXIS_LABEL.to_string(),
                    primary,
                    secondary,
                }]
            }
            Layout::Multi => series
                .map(|s| Panel {
                    x_label: DATE_AXIS_LABEL.to_string(),
                    primary: Axis::for_series(s),
                    secondary: None,
                })
                .collect(),
        };

        Ok(Figure {
            title: config.title.clone(),
            width: config.width,
            height: config.height,
            panels,
        })
    }
}
