//! Pipeline orchestration
//!
//! This module provides the public entry point of biotrend. It wires export
//! loading, per-channel alignment, plot assembly and rendering into one
//! parameterized run.

use log::{debug, info};

use crate::aligner::SeriesAligner;
use crate::assembler::{Figure, PlotAssembler};
use crate::config::PipelineConfig;
use crate::error::TrendError;
use crate::render::{check_output_target, write_figure};
use crate::source::{ExportSource, SourceData};
use crate::types::{AlignedSeries, Channel};

/// Build the aligned series for one channel.
///
/// # Arguments
/// * `channel` - Channel to extract
/// * `data` - Tracker records
/// * `config` - Supplies the smoothing windows
pub fn channel_series(
    channel: Channel,
    data: &SourceData,
    config: &PipelineConfig,
) -> Result<AlignedSeries, TrendError> {
    let window = config.windows.for_channel(channel);

    match channel {
        Channel::Weight => {
            let series = SeriesAligner::weight_series(&data.weights);
            SeriesAligner::align(channel, &series, window)
        }
        Channel::WeightChange => {
            let series = SeriesAligner::weight_series(&data.weights);
            SeriesAligner::weight_change(&series, window, config.windows.change_window())
        }
        Channel::Sleep(sleep_channel) => {
            let series = SeriesAligner::sleep_series(&data.sleep_scores, sleep_channel);
            SeriesAligner::align(channel, &series, window)
        }
    }
}

/// Single-pass pipeline from export records to a drawn figure
pub struct TrendPipeline {
    config: PipelineConfig,
}

impl Default for TrendPipeline {
    fn default() -> Self {
        Self {
            config: PipelineConfig::default(),
        }
    }
}

impl TrendPipeline {
    /// Create a pipeline, rejecting configurations that cannot be drawn
    pub fn new(config: PipelineConfig) -> Result<Self, TrendError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Align every configured channel and arrange them into a figure
    pub fn assemble(&self, data: &SourceData) -> Result<Figure, TrendError> {
        debug!(
            "{} heart-rate readings available, not plotted",
            data.heart_rates.len()
        );

        let channels = self
            .config
            .channels
            .iter()
            .map(|&channel| {
                let aligned = channel_series(channel, data, &self.config)?;
                info!("{}: {} smoothed samples", channel.label(), aligned.len());
                Ok(aligned)
            })
            .collect::<Result<Vec<_>, TrendError>>()?;

        PlotAssembler::assemble(&self.config, channels)
    }

    /// Load an export directory, assemble the figure and write it out
    pub fn run(&self, source: &ExportSource) -> Result<Figure, TrendError> {
        check_output_target(&self.config.output)?;
        let data = source.load_tracker_data()?;
        let figure = self.assemble(&data)?;
        write_figure(&figure, &self.config.output)?;
        Ok(figure)
    }
}
