//! Music-streaming history adapter
//!
//! Parses `StreamingHistory*.json` files from a streaming-service data export.

use crate::error::TrendError;
use crate::music::StreamingPlay;
use chrono::{NaiveDateTime, TimeZone, Utc};
use serde::Deserialize;

use super::ExportAdapter;

/// Play end time format, e.g. `2020-01-05 21:14`
const END_TIME_FORMAT: &str = "%Y-%m-%d %H:%M";

/// `StreamingHistory*.json` adapter
pub struct StreamingHistoryAdapter;

impl ExportAdapter for StreamingHistoryAdapter {
    type Record = StreamingPlay;

    fn parse(&self, raw: &str) -> Result<Vec<StreamingPlay>, TrendError> {
        let entries: Vec<StreamingHistoryEntry> = serde_json::from_str(raw)?;

        entries
            .into_iter()
            .map(|entry| {
                let naive = NaiveDateTime::parse_from_str(entry.end_time.trim(), END_TIME_FORMAT)
                    .map_err(|e| {
                        TrendError::DateParseError(format!("endTime '{}': {}", entry.end_time, e))
                    })?;

                Ok(StreamingPlay {
                    end_time: Utc.from_utc_datetime(&naive),
                    artist_name: entry.artist_name,
                    track_name: entry.track_name,
                    ms_played: entry.ms_played,
                })
            })
            .collect()
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StreamingHistoryEntry {
    end_time: String,
    artist_name: String,
    track_name: String,
    ms_played: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_streaming_history() {
        let json = r#"[
            { "endTime": "2020-01-05 21:14", "artistName": "Boards of Canada", "trackName": "Roygbiv", "msPlayed": 151000 },
            { "endTime": "2020-01-05 21:18", "artistName": "Aphex Twin", "trackName": "Xtal", "msPlayed": 291000 }
        ]"#;

        let plays = StreamingHistoryAdapter.parse(json).unwrap();

        assert_eq!(plays.len(), 2);
        assert_eq!(plays[0].artist_name, "Boards of Canada");
        assert_eq!(plays[1].ms_played, 291000);
        assert_eq!(
            plays[0].end_time.format("%Y-%m-%d %H:%M").to_string(),
            "2020-01-05 21:14"
        );
    }

    #[test]
    fn test_parse_streaming_history_bad_time() {
        let json = r#"[{ "endTime": "last night", "artistName": "a", "trackName": "t", "msPlayed": 1 }]"#;
        let result = StreamingHistoryAdapter.parse(json);

        assert!(matches!(result, Err(TrendError::DateParseError(_))));
    }
}
