//! Export directory loading
//!
//! Locates the export files under a data directory and runs them through the
//! matching adapters. The expected layout mirrors the raw account exports:
//!
//! ```text
//! <data>/fitbit/user-site-export/weight-*.json
//! <data>/fitbit/user-site-export/heart_rate-*.json
//! <data>/fitbit/sleep-score/sleep_score.csv
//! <data>/spotify/StreamingHistory*.json
//! ```

use log::{debug, info, warn};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::adapters::{
    ExportAdapter, FitbitHeartRateAdapter, FitbitSleepScoreAdapter, FitbitWeightAdapter,
    StreamingHistoryAdapter,
};
use crate::error::TrendError;
use crate::music::StreamingPlay;
use crate::types::{HeartRateReading, SleepScoreRecord, WeightReading};

const TRACKER_EXPORT_DIR: &str = "fitbit/user-site-export";
const SLEEP_SCORE_DIR: &str = "fitbit/sleep-score";
const SLEEP_SCORE_FILE: &str = "sleep_score.csv";
const STREAMING_DIR: &str = "spotify";

/// Kind of export file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportKind {
    Weight,
    SleepScore,
    HeartRate,
    StreamingHistory,
}

impl ExportKind {
    pub const ALL: [ExportKind; 4] = [
        ExportKind::Weight,
        ExportKind::SleepScore,
        ExportKind::HeartRate,
        ExportKind::StreamingHistory,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ExportKind::Weight => "weight",
            ExportKind::SleepScore => "sleep_score",
            ExportKind::HeartRate => "heart_rate",
            ExportKind::StreamingHistory => "streaming_history",
        }
    }
}

/// Tracker data read from one export directory
#[derive(Debug, Clone, Default)]
pub struct SourceData {
    pub weights: Vec<WeightReading>,
    pub sleep_scores: Vec<SleepScoreRecord>,
    pub heart_rates: Vec<HeartRateReading>,
}

/// Export files found for one kind
#[derive(Debug, Clone, Serialize)]
pub struct ExportFiles {
    pub kind: ExportKind,
    pub files: Vec<PathBuf>,
}

/// An export directory on disk
#[derive(Debug, Clone)]
pub struct ExportSource {
    root: PathBuf,
}

impl ExportSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Files present for `kind`, sorted by name
    pub fn files(&self, kind: ExportKind) -> Result<Vec<PathBuf>, TrendError> {
        match kind {
            ExportKind::Weight => find_files(&self.root.join(TRACKER_EXPORT_DIR), "weight", ".json"),
            ExportKind::HeartRate => {
                find_files(&self.root.join(TRACKER_EXPORT_DIR), "heart_rate", ".json")
            }
            ExportKind::SleepScore => {
                let path = self.root.join(SLEEP_SCORE_DIR).join(SLEEP_SCORE_FILE);
                Ok(if path.is_file() { vec![path] } else { Vec::new() })
            }
            ExportKind::StreamingHistory => find_files(
                &self.root.join(STREAMING_DIR),
                "StreamingHistory",
                ".json",
            ),
        }
    }

    /// Files present for every kind
    pub fn inventory(&self) -> Result<Vec<ExportFiles>, TrendError> {
        ExportKind::ALL
            .iter()
            .map(|&kind| {
                Ok(ExportFiles {
                    kind,
                    files: self.files(kind)?,
                })
            })
            .collect()
    }

    pub fn load_weights(&self) -> Result<Vec<WeightReading>, TrendError> {
        self.load(ExportKind::Weight, &FitbitWeightAdapter)
    }

    pub fn load_sleep_scores(&self) -> Result<Vec<SleepScoreRecord>, TrendError> {
        self.load(ExportKind::SleepScore, &FitbitSleepScoreAdapter)
    }

    pub fn load_heart_rates(&self) -> Result<Vec<HeartRateReading>, TrendError> {
        self.load(ExportKind::HeartRate, &FitbitHeartRateAdapter)
    }

    pub fn load_plays(&self) -> Result<Vec<StreamingPlay>, TrendError> {
        self.load(ExportKind::StreamingHistory, &StreamingHistoryAdapter)
    }

    /// Load every tracker export; streaming history is loaded separately
    pub fn load_tracker_data(&self) -> Result<SourceData, TrendError> {
        let data = SourceData {
            weights: self.load_weights()?,
            sleep_scores: self.load_sleep_scores()?,
            heart_rates: self.load_heart_rates()?,
        };

        info!(
            "loaded {} weight readings, {} sleep scores, {} heart-rate readings from {}",
            data.weights.len(),
            data.sleep_scores.len(),
            data.heart_rates.len(),
            self.root.display()
        );

        Ok(data)
    }

    fn load<A: ExportAdapter>(
        &self,
        kind: ExportKind,
        adapter: &A,
    ) -> Result<Vec<A::Record>, TrendError> {
        let files = self.files(kind)?;
        if files.is_empty() {
            warn!("no {} export found under {}", kind.as_str(), self.root.display());
            return Ok(Vec::new());
        }

        let mut records = Vec::new();
        for path in files {
            let raw = fs::read_to_string(&path)?;
            let parsed = adapter
                .parse(&raw)
                .map_err(|e| TrendError::ParseError(format!("{}: {}", path.display(), e)))?;
            debug!("{}: {} records", path.display(), parsed.len());
            records.extend(parsed);
        }

        Ok(records)
    }
}

/// Files in `dir` whose names start with `prefix` and end with `suffix`
fn find_files(dir: &Path, prefix: &str, suffix: &str) -> Result<Vec<PathBuf>, TrendError> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }

    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        let matches = path
            .file_name()
            .and_then(|n| n.to_str())
            .map_or(false, |name| name.starts_with(prefix) && name.ends_with(suffix));
        if matches && path.is_file() {
            files.push(path);
        }
    }

    files.sort();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn write(root: &Path, relative: &str, contents: &str) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }

    #[test]
    fn test_find_files_sorted_and_filtered() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "fitbit/user-site-export/weight-2020-02-01.json", "[]");
        write(dir.path(), "fitbit/user-site-export/weight-2020-01-01.json", "[]");
        write(dir.path(), "fitbit/user-site-export/heart_rate-2020-01-01.json", "[]");
        write(dir.path(), "fitbit/user-site-export/weight-notes.txt", "");

        let source = ExportSource::new(dir.path());
        let files = source.files(ExportKind::Weight).unwrap();
        let names: Vec<String> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();

        assert_eq!(
            names,
            vec!["weight-2020-01-01.json", "weight-2020-02-01.json"]
        );
        assert_eq!(source.files(ExportKind::HeartRate).unwrap().len(), 1);
    }

    #[test]
    fn test_missing_exports_load_empty() {
        let dir = tempfile::tempdir().unwrap();
        let source = ExportSource::new(dir.path());

        let data = source.load_tracker_data().unwrap();
        assert!(data.weights.is_empty());
        assert!(data.sleep_scores.is_empty());
        assert!(source.load_plays().unwrap().is_empty());
    }

    #[test]
    fn test_load_weights_across_files() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            "fitbit/user-site-export/weight-2020-01-01.json",
            r#"[{ "weight": 180.0, "date": "01/01/20", "time": "07:00:00" }]"#,
        );
        write(
            dir.path(),
            "fitbit/user-site-export/weight-2020-02-01.json",
            r#"[{ "weight": 179.0, "date": "02/01/20", "time": "07:00:00" }]"#,
        );

        let weights = ExportSource::new(dir.path()).load_weights().unwrap();

        assert_eq!(weights.len(), 2);
        assert_eq!(weights[0].weight, 180.0);
        assert_eq!(weights[1].weight, 179.0);
    }

    #[test]
    fn test_parse_errors_name_the_file() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "fitbit/sleep-score/sleep_score.csv", "timestamp\nnot-a-date\n");

        let result = ExportSource::new(dir.path()).load_sleep_scores();

        match result {
            Err(TrendError::ParseError(message)) => assert!(message.contains("sleep_score.csv")),
            other => panic!("expected parse error, got {:?}", other),
        }
    }

    #[test]
    fn test_inventory_lists_every_kind() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "spotify/StreamingHistory0.json", "[]");

        let inventory = ExportSource::new(dir.path()).inventory().unwrap();

        assert_eq!(inventory.len(), 4);
        let streaming = inventory
            .iter()
            .find(|f| f.kind == ExportKind::StreamingHistory)
            .unwrap();
        assert_eq!(streaming.files.len(), 1);
    }
}
