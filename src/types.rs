//! Core types for the biotrend pipeline
//!
//! This module defines the data structures that flow through each stage of the
//! pipeline: export records, raw time series, smoothing windows, channels, and
//! date-aligned output series.

use chrono::{DateTime, Utc};
use log::warn;
use serde::{Deserialize, Serialize};

use crate::smoothing::{delta, smooth2};

/// A single body-weight measurement
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeightReading {
    /// Measurement time (epoch seconds)
    pub timestamp: f64,
    /// Weight in the unit configured on the tracker
    pub weight: f64,
}

/// One nightly sleep-score row
///
/// All score columns are optional; a row missing one channel still contributes
/// to the others.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SleepScoreRecord {
    /// Score time (epoch seconds)
    pub timestamp: f64,
    /// Overall sleep score (0-100)
    pub overall_score: Option<f64>,
    /// Resting heart rate during sleep (bpm)
    pub resting_heart_rate: Option<f64>,
    /// Restlessness fraction (0-1)
    pub restlessness: Option<f64>,
    /// Composition sub-score
    pub composition_score: Option<f64>,
    /// Revitalization sub-score
    pub revitalization_score: Option<f64>,
    /// Duration sub-score
    pub duration_score: Option<f64>,
    /// Deep sleep duration (minutes)
    pub deep_sleep_minutes: Option<f64>,
}

impl SleepScoreRecord {
    /// Value of the given channel on this record, if present
    pub fn channel_value(&self, channel: SleepChannel) -> Option<f64> {
        match channel {
            SleepChannel::Score => self.overall_score,
            SleepChannel::HeartRate => self.resting_heart_rate,
            SleepChannel::Restlessness => self.restlessness,
        }
    }
}

/// A single heart-rate reading
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HeartRateReading {
    /// Reading time (epoch seconds)
    pub timestamp: f64,
    /// Beats per minute
    pub bpm: f64,
    /// Tracker confidence (0-3), when reported
    pub confidence: Option<u8>,
}

/// Smoothing window: number of neighbouring samples on each side of a centre
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Window {
    pub before: usize,
    pub after: usize,
}

impl Window {
    /// Window with `distance` samples on both sides
    pub fn symmetric(distance: usize) -> Self {
        Self {
            before: distance,
            after: distance,
        }
    }

    /// Number of input samples contributing to one output sample
    pub fn size(&self) -> usize {
        self.before.saturating_add(self.after).saturating_add(1)
    }

    /// Output length for an input of `len` samples
    pub fn output_len(&self, len: usize) -> usize {
        len.saturating_sub(self.before.saturating_add(self.after))
    }

    /// Apply this window to a value sequence
    pub fn apply(&self, values: &[f64]) -> Vec<f64> {
        smooth2(values, self.before, self.after)
    }
}

/// Parallel timestamp/value sequences for one channel
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TimeSeries {
    /// Epoch seconds, non-decreasing
    pub timestamps: Vec<f64>,
    /// Values paired index-for-index with `timestamps`
    pub values: Vec<f64>,
}

impl TimeSeries {
    /// Build a series from `(timestamp, value)` pairs.
    ///
    /// Pairs are sorted by timestamp when they arrive out of order; the sort is
    /// stable so equal timestamps keep their input order.
    pub fn from_pairs(mut pairs: Vec<(f64, f64)>) -> Self {
        if !is_sorted(&pairs) {
            warn!(
                "{} samples arrived out of chronological order, sorting before smoothing",
                pairs.len()
            );
            pairs.sort_by(|a, b| a.0.total_cmp(&b.0));
        }

        let (timestamps, values) = pairs.into_iter().unzip();
        Self { timestamps, values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Smooth values and timestamps with the same window so they stay paired
    pub fn smoothed(&self, window: Window) -> Self {
        Self {
            timestamps: window.apply(&self.timestamps),
            values: window.apply(&self.values),
        }
    }

    /// First difference of the values.
    ///
    /// Each difference is stamped with the later sample of its pair, so the
    /// first timestamp is dropped rather than padding the values.
    pub fn delta(&self) -> Self {
        Self {
            timestamps: self.timestamps.iter().skip(1).copied().collect(),
            values: delta(&self.values),
        }
    }
}

fn is_sorted(pairs: &[(f64, f64)]) -> bool {
    pairs.windows(2).all(|w| w[0].0 <= w[1].0)
}

/// Sleep-record channel selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SleepChannel {
    Score,
    HeartRate,
    Restlessness,
}

impl SleepChannel {
    pub fn as_str(&self) -> &'static str {
        match self {
            SleepChannel::Score => "score",
            SleepChannel::HeartRate => "heart_rate",
            SleepChannel::Restlessness => "restlessness",
        }
    }
}

/// A plottable physiological channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    /// Smoothed absolute weight
    Weight,
    /// Smoothed change in weight per smoothed step
    WeightChange,
    /// One channel of the nightly sleep score
    Sleep(SleepChannel),
}

impl Channel {
    /// Legend label
    pub fn label(&self) -> &'static str {
        match self {
            Channel::Weight => "weight",
            Channel::WeightChange => "weight change",
            Channel::Sleep(SleepChannel::Score) => "sleep score",
            Channel::Sleep(SleepChannel::HeartRate) => "sleep resting heart rate",
            Channel::Sleep(SleepChannel::Restlessness) => "sleep restlessness",
        }
    }

    /// Y-axis label
    pub fn axis_label(&self) -> &'static str {
        match self {
            Channel::Weight | Channel::WeightChange => "weight",
            Channel::Sleep(SleepChannel::Score) => "score",
            Channel::Sleep(SleepChannel::HeartRate) => "bpm",
            Channel::Sleep(SleepChannel::Restlessness) => "restlessness",
        }
    }
}

/// A smoothed channel with calendar dates, ready to hand to a renderer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlignedSeries {
    pub channel: Channel,
    pub dates: Vec<DateTime<Utc>>,
    pub values: Vec<f64>,
}

impl AlignedSeries {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Fractional epoch seconds of a UTC date-time
pub fn epoch_seconds(date: &DateTime<Utc>) -> f64 {
    date.timestamp() as f64 + f64::from(date.timestamp_subsec_nanos()) / 1e9
}
