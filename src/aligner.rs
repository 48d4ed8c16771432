//! Series alignment
//!
//! Turns export records into smoothed channels on a shared calendar axis.
//! Values and timestamps of a channel always pass through the same window so
//! index `i` of the values still describes date `i`.

use chrono::{DateTime, Utc};
use log::debug;

use crate::error::TrendError;
use crate::types::{
    AlignedSeries, Channel, SleepChannel, SleepScoreRecord, TimeSeries, WeightReading, Window,
};

/// Aligner for building date-indexed channels from raw records
pub struct SeriesAligner;

impl SeriesAligner {
    /// Raw weight series in chronological order
    pub fn weight_series(readings: &[WeightReading]) -> TimeSeries {
        TimeSeries::from_pairs(readings.iter().map(|r| (r.timestamp, r.weight)).collect())
    }

    /// Raw series for one sleep channel, skipping records without that value
    pub fn sleep_series(records: &[SleepScoreRecord], channel: SleepChannel) -> TimeSeries {
        let pairs: Vec<(f64, f64)> = records
            .iter()
            .filter_map(|r| r.channel_value(channel).map(|v| (r.timestamp, v)))
            .collect();

        if pairs.len() < records.len() {
            debug!(
                "sleep {}: {} of {} records have no value",
                channel.as_str(),
                records.len() - pairs.len(),
                records.len()
            );
        }

        TimeSeries::from_pairs(pairs)
    }

    /// Smooth a series and attach calendar dates
    pub fn align(
        channel: Channel,
        series: &TimeSeries,
        window: Window,
    ) -> Result<AlignedSeries, TrendError> {
        let smoothed = series.smoothed(window);
        if smoothed.is_empty() && !series.is_empty() {
            debug!(
                "{}: {} samples are too few for a window of {}",
                channel.label(),
                series.len(),
                window.size()
            );
        }

        Ok(AlignedSeries {
            channel,
            dates: to_dates(&smoothed.timestamps)?,
            values: smoothed.values,
        })
    }

    /// Change in smoothed weight per smoothed step, smoothed again.
    ///
    /// Weights are smoothed with `weight_window`, differenced, then smoothed
    /// with `change_window`. Each difference takes the later timestamp of its
    /// pair; no leading placeholder is inserted.
    pub fn weight_change(
        series: &TimeSeries,
        weight_window: Window,
        change_window: Window,
    ) -> Result<AlignedSeries, TrendError> {
        let change = series.smoothed(weight_window).delta().smoothed(change_window);

        Ok(AlignedSeries {
            channel: Channel::WeightChange,
            dates: to_dates(&change.timestamps)?,
            values: change.values,
        })
    }
}

/// Convert fractional epoch seconds to UTC date-times
pub fn to_dates(timestamps: &[f64]) -> Result<Vec<DateTime<Utc>>, TrendError> {
    timestamps.iter().map(|&t| epoch_to_date(t)).collect()
}

/// Convert fractional epoch seconds to a UTC date-time
pub fn epoch_to_date(timestamp: f64) -> Result<DateTime<Utc>, TrendError> {
    if !timestamp.is_finite() {
        return Err(TrendError::TimestampOutOfRange(timestamp));
    }

    let mut secs = timestamp.floor();
    let mut nanos = ((timestamp - secs) * 1e9).round();
    if nanos >= 1e9 {
        secs += 1.0;
        nanos = 0.0;
    }

    DateTime::from_timestamp(secs as i64, nanos as u32)
        .ok_or(TrendError::TimestampOutOfRange(timestamp))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::smoothing::{delta, smooth};
    use crate::types::epoch_seconds;
    use pretty_assertions::assert_eq;

    const DAY: f64 = 86_400.0;

    fn linear_weights(n: usize) -> Vec<WeightReading> {
        (0..n)
            .map(|i| WeightReading {
                timestamp: i as f64 * DAY,
                weight: 180.0 - 0.5 * i as f64,
            })
            .collect()
    }

    fn sleep_records(n: usize) -> Vec<SleepScoreRecord> {
        (0..n)
            .map(|i| SleepScoreRecord {
                timestamp: i as f64 * DAY + 25_200.0,
                overall_score: Some(70.0 + i as f64),
                resting_heart_rate: (i % 2 == 0).then_some(58.0),
                restlessness: Some(0.05 + 0.001 * i as f64),
                ..Default::default()
            })
            .collect()
    }

    #[test]
    fn test_epoch_to_date() {
        let date = epoch_to_date(1_578_209_531.0).unwrap();
        assert_eq!(date.to_rfc3339(), "2020-01-05T07:32:11+00:00");

        let fractional = epoch_to_date(1.5).unwrap();
        assert_eq!(fractional.timestamp_subsec_millis(), 500);
        assert_eq!(epoch_seconds(&fractional), 1.5);
    }

    #[test]
    fn test_epoch_to_date_rejects_non_finite() {
        assert!(matches!(
            epoch_to_date(f64::NAN),
            Err(TrendError::TimestampOutOfRange(_))
        ));
        assert!(epoch_to_date(f64::INFINITY).is_err());
    }

    #[test]
    fn test_align_sleep_channel() {
        let records = sleep_records(12);
        let series = SeriesAligner::sleep_series(&records, SleepChannel::Score);
        let aligned = SeriesAligner::align(
            Channel::Sleep(SleepChannel::Score),
            &series,
            Window::symmetric(5),
        )
        .unwrap();

        assert_eq!(aligned.len(), 2);
        assert_eq!(aligned.dates.len(), aligned.values.len());
        assert_eq!(aligned.values, vec![75.0, 76.0]);
        // Centre of the first window is day 5 at 07:00
        assert_eq!(aligned.dates[0].to_rfc3339(), "1970-01-06T07:00:00+00:00");
    }

    #[test]
    fn test_sleep_series_skips_missing_values() {
        let records = sleep_records(6);
        let series = SeriesAligner::sleep_series(&records, SleepChannel::HeartRate);

        assert_eq!(series.len(), 3);
        assert_eq!(series.timestamps[1], 2.0 * DAY + 25_200.0);
    }

    #[test]
    fn test_identical_windows_stay_aligned() {
        let records = sleep_records(15);
        let window = Window::symmetric(3);

        let score = SeriesAligner::align(
            Channel::Sleep(SleepChannel::Score),
            &SeriesAligner::sleep_series(&records, SleepChannel::Score),
            window,
        )
        .unwrap();
        let restlessness = SeriesAligner::align(
            Channel::Sleep(SleepChannel::Restlessness),
            &SeriesAligner::sleep_series(&records, SleepChannel::Restlessness),
            window,
        )
        .unwrap();

        assert_eq!(score.len(), restlessness.len());
        assert_eq!(score.dates, restlessness.dates);
    }

    #[test]
    fn test_window_larger_than_input_is_empty() {
        let series = SeriesAligner::weight_series(&linear_weights(4));
        let aligned = SeriesAligner::align(Channel::Weight, &series, Window::symmetric(5)).unwrap();

        assert!(aligned.is_empty());
        assert!(aligned.dates.is_empty());
    }

    #[test]
    fn test_weight_change_drops_rather_than_pads() {
        let series = SeriesAligner::weight_series(&linear_weights(20));
        let change =
            SeriesAligner::weight_change(&series, Window::symmetric(5), Window::symmetric(2))
                .unwrap();

        // 20 - 2*5 smoothed, -1 for the difference, -2*2 for the second pass
        assert_eq!(change.len(), 5);
        assert_eq!(change.dates.len(), 5);
        for value in &change.values {
            assert!((value + 0.5).abs() < 1e-9);
        }

        let first_day = (epoch_seconds(&change.dates[0]) / DAY).round();
        assert_eq!(first_day, 8.0);
        let last_day = (epoch_seconds(&change.dates[4]) / DAY).round();
        assert_eq!(last_day, 12.0);
    }

    #[test]
    fn test_weight_change_matches_engine_composition() {
        let weights: Vec<WeightReading> = [182.0, 181.4, 181.9, 180.7, 181.2, 180.1, 180.6, 179.8, 180.2]
            .iter()
            .enumerate()
            .map(|(i, w)| WeightReading {
                timestamp: i as f64 * DAY,
                weight: *w,
            })
            .collect();
        let raw: Vec<f64> = weights.iter().map(|w| w.weight).collect();

        let change = SeriesAligner::weight_change(
            &SeriesAligner::weight_series(&weights),
            Window::symmetric(1),
            Window::symmetric(1),
        )
        .unwrap();

        let expected = smooth(&delta(&smooth(&raw, 1)), 1);
        assert_eq!(change.values, expected);
    }

    #[test]
    fn test_weight_change_short_input() {
        let series = SeriesAligner::weight_series(&linear_weights(11));
        let change =
            SeriesAligner::weight_change(&series, Window::symmetric(5), Window::symmetric(2))
                .unwrap();

        assert!(change.is_empty());
    }

    #[test]
    fn test_unsorted_records_are_repaired() {
        let mut records = sleep_records(7);
        records.reverse();

        let series = SeriesAligner::sleep_series(&records, SleepChannel::Score);
        assert!(series.timestamps.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(series.values[0], 70.0);
    }
}
