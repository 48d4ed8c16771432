//! Export file adapters
//!
//! This module provides adapters that parse raw export files from the fitness
//! tracker and the music-streaming service into typed records.

mod fitbit;
mod streaming;

pub use fitbit::{FitbitHeartRateAdapter, FitbitSleepScoreAdapter, FitbitWeightAdapter};
pub use streaming::StreamingHistoryAdapter;

use crate::error::TrendError;

/// Trait for export file adapters
pub trait ExportAdapter {
    /// Record type produced by this adapter
    type Record;

    /// Parse the raw contents of one export file
    fn parse(&self, raw: &str) -> Result<Vec<Self::Record>, TrendError>;
}
