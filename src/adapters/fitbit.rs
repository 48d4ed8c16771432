//! Fitness-tracker export adapters
//!
//! Parses the weight, sleep-score and heart-rate files of a Fitbit account
//! export. Naive export times are interpreted as UTC.

use crate::error::TrendError;
use crate::types::{HeartRateReading, SleepScoreRecord, WeightReading};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use serde::Deserialize;

use super::ExportAdapter;

/// Sleep-score CSV timestamp format, e.g. `2020-01-05T07:12:30Z`
const SLEEP_TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// `weight-YYYY-MM-DD.json` adapter
pub struct FitbitWeightAdapter;

impl ExportAdapter for FitbitWeightAdapter {
    type Record = WeightReading;

    fn parse(&self, raw: &str) -> Result<Vec<WeightReading>, TrendError> {
        let entries: Vec<FitbitWeight> = serde_json::from_str(raw)?;

        entries
            .into_iter()
            .map(|entry| {
                let timestamp = parse_export_date_time(&entry.date, &entry.time)?;
                Ok(WeightReading {
                    timestamp,
                    weight: entry.weight,
                })
            })
            .collect()
    }
}

/// `sleep_score.csv` adapter
pub struct FitbitSleepScoreAdapter;

impl ExportAdapter for FitbitSleepScoreAdapter {
    type Record = SleepScoreRecord;

    fn parse(&self, raw: &str) -> Result<Vec<SleepScoreRecord>, TrendError> {
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(raw.as_bytes());

        let mut records = Vec::new();
        for row in reader.deserialize::<FitbitSleepRow>() {
            let row = row?;
            let naive = NaiveDateTime::parse_from_str(&row.timestamp, SLEEP_TIMESTAMP_FORMAT)
                .map_err(|e| {
                    TrendError::DateParseError(format!("sleep score '{}': {}", row.timestamp, e))
                })?;

            records.push(SleepScoreRecord {
                timestamp: naive_to_epoch(&naive),
                overall_score: row.overall_score,
                resting_heart_rate: row.resting_heart_rate,
                restlessness: row.restlessness,
                composition_score: row.composition_score,
                revitalization_score: row.revitalization_score,
                duration_score: row.duration_score,
                deep_sleep_minutes: row.deep_sleep_in_minutes,
            });
        }

        Ok(records)
    }
}

/// `heart_rate-YYYY-MM-DD.json` adapter
pub struct FitbitHeartRateAdapter;

impl ExportAdapter for FitbitHeartRateAdapter {
    type Record = HeartRateReading;

    fn parse(&self, raw: &str) -> Result<Vec<HeartRateReading>, TrendError> {
        let entries: Vec<FitbitHeartRate> = serde_json::from_str(raw)?;

        entries
            .into_iter()
            .map(|entry| {
                let (date, time) = entry.date_time.split_once(' ').ok_or_else(|| {
                    TrendError::DateParseError(format!(
                        "heart rate dateTime '{}' has no time part",
                        entry.date_time
                    ))
                })?;

                Ok(HeartRateReading {
                    timestamp: parse_export_date_time(date, time)?,
                    bpm: entry.value.bpm,
                    confidence: entry.value.confidence,
                })
            })
            .collect()
    }
}

/// Parse an export `MM/DD/YY` date and `HH:MM:SS` time into epoch seconds.
///
/// Two-digit years are always in the 2000s.
fn parse_export_date_time(date: &str, time: &str) -> Result<f64, TrendError> {
    let parts: Vec<&str> = date.trim().split('/').collect();
    let [month, day, year] = parts.as_slice() else {
        return Err(TrendError::DateParseError(format!(
            "expected MM/DD/YY, got '{}'",
            date
        )));
    };

    let parse_part = |part: &str| {
        part.parse::<u32>()
            .map_err(|e| TrendError::DateParseError(format!("date '{}': {}", date, e)))
    };
    let (month, day, year) = (parse_part(*month)?, parse_part(*day)?, parse_part(*year)?);
    if year > 99 {
        return Err(TrendError::DateParseError(format!(
            "expected a two-digit year, got '{}'",
            date
        )));
    }

    let date = NaiveDate::from_ymd_opt(2000 + year as i32, month, day)
        .ok_or_else(|| TrendError::DateParseError(format!("invalid date '{}'", date)))?;
    let time = NaiveTime::parse_from_str(time.trim(), "%H:%M:%S")
        .map_err(|e| TrendError::DateParseError(format!("time '{}': {}", time, e)))?;

    Ok(naive_to_epoch(&date.and_time(time)))
}

fn naive_to_epoch(naive: &NaiveDateTime) -> f64 {
    Utc.from_utc_datetime(naive).timestamp() as f64
}

// Fitbit export structures

#[derive(Debug, Deserialize)]
struct FitbitWeight {
    date: String,
    time: String,
    weight: f64,
}

#[derive(Debug, Deserialize)]
struct FitbitSleepRow {
    timestamp: String,
    overall_score: Option<f64>,
    composition_score: Option<f64>,
    revitalization_score: Option<f64>,
    duration_score: Option<f64>,
    deep_sleep_in_minutes: Option<f64>,
    resting_heart_rate: Option<f64>,
    restlessness: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct FitbitHeartRate {
    #[serde(rename = "dateTime")]
    date_time: String,
    value: FitbitHeartRateValue,
}

#[derive(Debug, Deserialize)]
struct FitbitHeartRateValue {
    bpm: f64,
    confidence: Option<u8>,
}
