//! Biotrend - Smoothed, date-aligned trends from personal tracker exports
//!
//! Biotrend turns raw fitness-tracker exports into smoothed series drawn on a
//! shared date axis: export adaptation → smoothing → alignment → plot
//! assembly → rendering.
//!
//! ## Modules
//!
//! - **Tracker Pipeline**: Weight and sleep-score exports into weight, weight
//!   change and sleep channels
//! - **Listening History**: Streaming-history plays, summaries and audio-feature
//!   enrichment

pub mod adapters;
pub mod aligner;
pub mod assembler;
pub mod config;
pub mod error;
pub mod music;
pub mod pipeline;
pub mod render;
pub mod smoothing;
pub mod source;
pub mod types;

pub use assembler::{Figure, PlotAssembler};
pub use config::{Layout, OutputTarget, PipelineConfig, SmoothingWindows};
pub use error::TrendError;
pub use pipeline::{channel_series, TrendPipeline};
pub use source::{ExportSource, SourceData};
pub use types::{AlignedSeries, Channel, SleepChannel, TimeSeries, Window};

/// Biotrend version reported by the CLI
pub const BIOTREND_VERSION: &str = env!("CARGO_PKG_VERSION");
