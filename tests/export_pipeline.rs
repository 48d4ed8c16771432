//! End-to-end run over an export directory laid out on disk

use biotrend::source::ExportSource;
use biotrend::{Channel, Layout, OutputTarget, PipelineConfig, SleepChannel, TrendPipeline};
use chrono::{Duration, NaiveDate};
use pretty_assertions::assert_eq;
use std::fs;
use std::path::Path;

const DAYS: i64 = 40;

fn write(root: &Path, relative: &str, contents: &str) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
}

/// Forty days of weight split across two monthly files, plus a sleep-score CSV
/// written newest first the way the tracker exports it.
fn build_export(root: &Path) {
    let start = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
    let mut january = Vec::new();
    let mut february = Vec::new();

    for i in 0..DAYS {
        let date = start + Duration::days(i);
        let entry = serde_json::json!({
            "logId": 1_577_865_600_000_i64 + i,
            "weight": 190.0 - 0.1 * i as f64,
            "bmi": 27.1,
            "date": date.format("%m/%d/%y").to_string(),
            "time": "07:15:00",
            "source": "Aria"
        });
        if i < 31 {
            january.push(entry);
        } else {
            february.push(entry);
        }
    }

    write(
        root,
        "fitbit/user-site-export/weight-2020-01-01.json",
        &serde_json::to_string(&january).unwrap(),
    );
    write(
        root,
        "fitbit/user-site-export/weight-2020-02-01.json",
        &serde_json::to_string(&february).unwrap(),
    );

    let mut csv = String::from(
        "sleep_log_entry_id,timestamp,overall_score,composition_score,revitalization_score,\
         duration_score,deep_sleep_in_minutes,resting_heart_rate,restlessness\n",
    );
    for i in (0..DAYS).rev() {
        let date = start + Duration::days(i);
        // every seventh night is missing its restlessness value
        let restlessness = if i % 7 == 3 {
            String::new()
        } else {
            format!("{:.3}", 0.05 + 0.001 * (i % 10) as f64)
        };
        csv.push_str(&format!(
            "{},{}T06:30:00Z,{},20,18,40,{},{},{}\n",
            26_000_000_000_i64 + i,
            date.format("%Y-%m-%d"),
            70 + i % 15,
            60 + i % 20,
            55 + i % 4,
            restlessness
        ));
    }
    write(root, "fitbit/sleep-score/sleep_score.csv", &csv);

    write(
        root,
        "spotify/StreamingHistory0.json",
        r#"[
            { "endTime": "2020-01-03 22:10", "artistName": "Nils Frahm", "trackName": "Says", "msPlayed": 540000 },
            { "endTime": "2020-01-04 08:02", "artistName": "Nils Frahm", "trackName": "Ode", "msPlayed": 120000 }
        ]"#,
    );
}

#[test]
fn test_default_config_writes_figure_json() {
    let dir = tempfile::tempdir().unwrap();
    build_export(dir.path());
    let output = dir.path().join("trend.json");

    let config = PipelineConfig {
        output: OutputTarget::File(output.clone()),
        title: Some("weight vs restlessness".to_string()),
        ..Default::default()
    };
    let pipeline = TrendPipeline::new(config).unwrap();
    let figure = pipeline.run(&ExportSource::new(dir.path())).unwrap();

    let written: biotrend::Figure =
        serde_json::from_str(&fs::read_to_string(&output).unwrap()).unwrap();
    assert_eq!(written, figure);

    assert_eq!(figure.panels.len(), 1);
    let panel = &figure.panels[0];

    // 40 - 2 * 5 - 1 - 2 * 2
    let change = &panel.primary.series[0];
    assert_eq!(change.channel, Channel::WeightChange);
    assert_eq!(change.values.len(), 25);
    assert_eq!(change.dates.len(), change.values.len());
    for value in &change.values {
        assert!((value + 0.1).abs() < 1e-9, "unexpected change {}", value);
    }

    // 40 nights, 6 without restlessness, smoothed with 5 on each side
    let restlessness = &panel.secondary.as_ref().unwrap().series[0];
    assert_eq!(restlessness.channel, Channel::Sleep(SleepChannel::Restlessness));
    assert_eq!(restlessness.values.len(), 34 - 10);
    assert!(restlessness.dates.windows(2).all(|w| w[0] < w[1]));
}

#[test]
fn test_multi_layout_from_json_config() {
    let dir = tempfile::tempdir().unwrap();
    build_export(dir.path());

    let config = PipelineConfig::from_json(
        r#"{
            "channels": ["weight", {"sleep": "score"}, {"sleep": "heart_rate"}],
            "windows": { "weight": 3, "sleep": 2 },
            "layout": "multi"
        }"#,
    )
    .unwrap();
    assert_eq!(config.layout, Layout::Multi);

    let data = ExportSource::new(dir.path()).load_tracker_data().unwrap();
    let figure = TrendPipeline::new(config).unwrap().assemble(&data).unwrap();

    let lengths: Vec<usize> = figure
        .panels
        .iter()
        .map(|p| p.primary.series[0].values.len())
        .collect();
    assert_eq!(lengths, vec![34, 36, 36]);

    let first_weight = &figure.panels[0].primary.series[0];
    assert_eq!(
        first_weight.dates[0].format("%Y-%m-%d %H:%M").to_string(),
        "2020-01-04 07:15"
    );
}

#[test]
fn test_streaming_history_summary() {
    let dir = tempfile::tempdir().unwrap();
    build_export(dir.path());

    let plays = ExportSource::new(dir.path()).load_plays().unwrap();
    let summary = biotrend::music::summarize_plays(&plays, 5);

    assert_eq!(summary.plays, 2);
    assert_eq!(summary.total_minutes, 11.0);
    assert_eq!(summary.top_artists[0].artist, "Nils Frahm");
    assert_eq!(summary.top_artists[0].plays, 2);
}
