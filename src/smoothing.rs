//! Smoothing engine
//!
//! Pure transforms over in-memory sample sequences:
//! - Moving averages that drop boundary samples instead of padding them
//! - First differences
//! - Threshold splits with a dead zone around the threshold
//!
//! Nothing here allocates beyond its output or fails on short input: windows
//! larger than the input produce an empty sequence.

use serde::{Deserialize, Serialize};

/// Half-width of the dead zone around a split threshold
pub const DEAD_ZONE_HALF_WIDTH: f64 = 0.05;

/// Symmetric moving average with `distance` samples on each side.
pub fn smooth(values: &[f64], distance: usize) -> Vec<f64> {
    smooth2(values, distance, distance)
}

/// Asymmetric moving average.
///
/// For every centre index `i` in `[before, len - after)` the output holds the
/// mean of `values[i - before..=i + after]`. Output length is
/// `max(0, len - before - after)`.
pub fn smooth2(values: &[f64], before: usize, after: usize) -> Vec<f64> {
    let size = match before.checked_add(after).and_then(|n| n.checked_add(1)) {
        Some(size) if size <= values.len() => size,
        _ => return Vec::new(),
    };

    values
        .windows(size)
        .map(|window| window.iter().sum::<f64>() / size as f64)
        .collect()
}

/// First difference: `output[i] = values[i + 1] - values[i]`
pub fn delta(values: &[f64]) -> Vec<f64> {
    values.windows(2).map(|pair| pair[1] - pair[0]).collect()
}

/// Two masked views of one sequence, split around a threshold
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThresholdSplit {
    /// Values at or below `threshold - 0.05`; everything else masked
    pub loss: Vec<Option<f64>>,
    /// Values at or above `threshold + 0.05`; everything else masked
    pub gain: Vec<Option<f64>>,
}

impl ThresholdSplit {
    /// Retained loss values, in order
    pub fn loss_values(&self) -> Vec<f64> {
        self.loss.iter().flatten().copied().collect()
    }

    /// Retained gain values, in order
    pub fn gain_values(&self) -> Vec<f64> {
        self.gain.iter().flatten().copied().collect()
    }
}

/// Split a sequence into loss and gain views.
///
/// Values strictly within 0.05 of `threshold` fall in the dead zone and are
/// masked in both views. Both boundaries are inclusive.
pub fn split_on_threshold(values: &[f64], threshold: f64) -> ThresholdSplit {
    let loss_limit = threshold - DEAD_ZONE_HALF_WIDTH;
    let gain_limit = threshold + DEAD_ZONE_HALF_WIDTH;

    ThresholdSplit {
        loss: values
            .iter()
            .map(|&v| (v <= loss_limit).then_some(v))
            .collect(),
        gain: values
            .iter()
            .map(|&v| (v >= gain_limit).then_some(v))
            .collect(),
    }
}

/// [`split_on_threshold`] around zero
pub fn split_on_zero(values: &[f64]) -> ThresholdSplit {
    split_on_threshold(values, 0.0)
}
