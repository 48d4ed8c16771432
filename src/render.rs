//! Figure rendering
//!
//! Draws an assembled [`Figure`] with plotters. The backend is picked from the
//! output file extension: `.svg`, `.png`, or `.json` for the raw figure.

use log::{debug, warn};
use plotters::coord::Shift;
use plotters::prelude::*;
use std::fs;
use std::io::Write;
use std::ops::Range;
use std::path::Path;

use crate::aligner::epoch_to_date;
use crate::assembler::{Axis, Figure, LineDash, Panel, PlotSeries};
use crate::config::OutputTarget;
use crate::error::TrendError;
use crate::types::epoch_seconds;

const SECONDS_PER_DAY: f64 = 86_400.0;

/// Dot length and gap of dotted lines, in pixels
const DOT_LENGTH: u32 = 2;
const DOT_GAP: u32 = 3;

/// Write a figure to its configured target
pub fn write_figure(figure: &Figure, target: &OutputTarget) -> Result<(), TrendError> {
    match target {
        OutputTarget::Stdout => {
            let stdout = std::io::stdout();
            let mut out = stdout.lock();
            serde_json::to_writer(&mut out, figure)?;
            writeln!(out)?;
            Ok(())
        }
        OutputTarget::File(path) => render_to_file(figure, path),
    }
}

/// File formats a figure can be written in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Svg,
    Png,
    Json,
}

impl OutputFormat {
    /// Format selected by a path's extension, case-insensitively
    pub fn from_path(path: &Path) -> Result<Self, TrendError> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();

        match extension.as_str() {
            "svg" => Ok(OutputFormat::Svg),
            "png" => Ok(OutputFormat::Png),
            "json" => Ok(OutputFormat::Json),
            other => Err(TrendError::InvalidConfig(format!(
                "unsupported output extension '{}' (expected svg, png or json)",
                other
            ))),
        }
    }
}

/// Check a target can be written: a known extension and a writable directory
pub fn check_output_target(target: &OutputTarget) -> Result<OutputFormat, TrendError> {
    let path = match target {
        OutputTarget::Stdout => return Ok(OutputFormat::Json),
        OutputTarget::File(path) => path,
    };

    let format = OutputFormat::from_path(path)?;
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));

    if !dir.is_dir() {
        return Err(TrendError::InvalidConfig(format!(
            "output directory {} does not exist",
            dir.display()
        )));
    }
    if fs::metadata(dir)?.permissions().readonly() {
        return Err(TrendError::InvalidConfig(format!(
            "output directory {} is read-only",
            dir.display()
        )));
    }

    Ok(format)
}

/// Render a figure to a file, choosing the format by extension
pub fn render_to_file(figure: &Figure, path: &Path) -> Result<(), TrendError> {
    let format = OutputFormat::from_path(path)?;
    let size = (figure.width, figure.height);

    debug!("rendering {} panel(s) to {}", figure.panels.len(), path.display());

    match format {
        OutputFormat::Svg => draw_figure(SVGBackend::new(path, size).into_drawing_area(), figure),
        OutputFormat::Png => draw_figure(BitMapBackend::new(path, size).into_drawing_area(), figure),
        OutputFormat::Json => {
            fs::write(path, serde_json::to_string_pretty(figure)?)?;
            Ok(())
        }
    }
}

fn draw_figure<DB: DrawingBackend>(
    root: DrawingArea<DB, Shift>,
    figure: &Figure,
) -> Result<(), TrendError> {
    root.fill(&WHITE).map_err(render_error)?;
    let root = match &figure.title {
        Some(title) => root
            .titled(title, ("sans-serif", 24))
            .map_err(render_error)?,
        None => root,
    };

    let areas = root.split_evenly((figure.panels.len().max(1), 1));
    for (area, panel) in areas.iter().zip(&figure.panels) {
        draw_panel(area, panel)?;
    }

    root.present().map_err(render_error)?;
    Ok(())
}

fn draw_panel<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    panel: &Panel,
) -> Result<(), TrendError> {
    if panel.is_blank() {
        warn!("panel '{}' has no samples, leaving it blank", panel.primary.label);
        return Ok(());
    }

    let x_range = date_bounds(panel.all_series());
    let y_range = value_bounds(&panel.primary);

    let mut builder = ChartBuilder::on(area);
    builder
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(60);
    if panel.secondary.is_some() {
        builder.right_y_label_area_size(60);
    }

    let mut chart = builder
        .build_cartesian_2d(x_range.clone(), y_range)
        .map_err(render_error)?;

    chart
        .configure_mesh()
        .x_desc(panel.x_label.as_str())
        .y_desc(panel.primary.label.as_str())
        .x_labels(8)
        .x_label_formatter(&format_date_tick)
        .draw()
        .map_err(render_error)?;

    for series in &panel.primary.series {
        let (color, stroke) = series_style(series);
        let points = series_points(series);
        if series.style.fill_to_zero {
            chart
                .draw_series(AreaSeries::new(points.clone(), 0.0, color.mix(0.3).filled()))
                .map_err(render_error)?;
        }
        let drawn = match series.style.dash {
            LineDash::Solid => chart.draw_series(LineSeries::new(points, stroke)),
            LineDash::Dotted => {
                chart.draw_series(DashedLineSeries::new(points, DOT_LENGTH, DOT_GAP, stroke))
            }
        };
        drawn
            .map_err(render_error)?
            .label(series.label.as_str())
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], stroke));
    }

    match &panel.secondary {
        Some(secondary) => {
            let mut chart = chart.set_secondary_coord(x_range, value_bounds(secondary));
            chart
                .configure_secondary_axes()
                .y_desc(secondary.label.as_str())
                .draw()
                .map_err(render_error)?;

            for series in &secondary.series {
                let (_, stroke) = series_style(series);
                let points = series_points(series);
                let drawn = match series.style.dash {
                    LineDash::Solid => chart.draw_secondary_series(LineSeries::new(points, stroke)),
                    LineDash::Dotted => chart.draw_secondary_series(DashedLineSeries::new(
                        points,
                        DOT_LENGTH,
                        DOT_GAP,
                        stroke,
                    )),
                };
                drawn
                    .map_err(render_error)?
                    .label(series.label.as_str())
                    .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], stroke));
            }

            chart
                .configure_series_labels()
                .position(SeriesLabelPosition::UpperRight)
                .background_style(&WHITE.mix(0.8))
                .border_style(&BLACK)
                .draw()
                .map_err(render_error)?;
        }
        None => {
            chart
                .configure_series_labels()
                .position(SeriesLabelPosition::LowerLeft)
                .background_style(&WHITE.mix(0.8))
                .border_style(&BLACK)
                .draw()
                .map_err(render_error)?;
        }
    }

    Ok(())
}

fn series_style(series: &PlotSeries) -> (RGBColor, ShapeStyle) {
    let (r, g, b) = series.style.color.rgb();
    let color = RGBColor(r, g, b);
    (color, color.stroke_width(series.style.width))
}

fn series_points(series: &PlotSeries) -> Vec<(f64, f64)> {
    series
        .dates
        .iter()
        .zip(&series.values)
        .map(|(date, value)| (epoch_seconds(date), *value))
        .collect()
}

/// X range over every date on the panel, widened to a day when degenerate
fn date_bounds<'a>(series: impl Iterator<Item = &'a PlotSeries>) -> Range<f64> {
    let seconds = series.flat_map(|s| s.dates.iter().map(epoch_seconds));
    padded_bounds(seconds, SECONDS_PER_DAY, 0.0)
}

/// Y range over one axis with 5% headroom
fn value_bounds(axis: &Axis) -> Range<f64> {
    let values = axis.series.iter().flat_map(|s| s.values.iter().copied());
    padded_bounds(values, 1.0, 0.05)
}

fn padded_bounds(values: impl Iterator<Item = f64>, degenerate_pad: f64, margin: f64) -> Range<f64> {
    let (min, max) = values
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        });

    if min > max {
        return 0.0..1.0;
    }
    if min == max {
        return (min - degenerate_pad)..(max + degenerate_pad);
    }

    let pad = (max - min) * margin;
    (min - pad)..(max + pad)
}

fn format_date_tick(x: &f64) -> String {
    epoch_to_date(*x)
        .map(|date| date.format("%b %Y").to_string())
        .unwrap_or_default()
}

fn render_error<E: std::fmt::Display>(e: E) -> TrendError {
    TrendError::RenderError(e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assembler::{Color, Style};
    use crate::types::Channel;
    use chrono::{TimeZone, Utc};
    use pretty_assertions::assert_eq;

    fn series(values: Vec<f64>) -> PlotSeries {
        PlotSeries {
            label: "weight".to_string(),
            channel: Channel::Weight,
            dates: (0..values.len())
                .map(|i| Utc.with_ymd_and_hms(2020, 3, 1 + i as u32, 0, 0, 0).unwrap())
                .collect(),
            values,
            style: Style {
                width: 2,
                color: Color::BLACK,
                dash: LineDash::Solid,
                fill_to_zero: false,
            },
        }
    }

    fn axis(values: Vec<f64>) -> Axis {
        Axis {
            label: "weight".to_string(),
            series: vec![series(values)],
        }
    }

    #[test]
    fn test_value_bounds_padding() {
        let range = value_bounds(&axis(vec![0.0, 10.0, 5.0]));
        assert_eq!(range, -0.5..10.5);
    }

    #[test]
    fn test_value_bounds_degenerate() {
        assert_eq!(value_bounds(&axis(vec![3.0, 3.0])), 2.0..4.0);
        assert_eq!(value_bounds(&axis(vec![])), 0.0..1.0);
        assert_eq!(value_bounds(&axis(vec![f64::NAN, 2.0])), 1.0..3.0);
    }

    #[test]
    fn test_date_bounds_single_day() {
        let s = series(vec![1.0]);
        let start = epoch_seconds(&s.dates[0]);
        let range = date_bounds(std::iter::once(&s));

        assert_eq!(range, (start - SECONDS_PER_DAY)..(start + SECONDS_PER_DAY));
    }

    #[test]
    fn test_format_date_tick() {
        let x = epoch_seconds(&Utc.with_ymd_and_hms(2020, 3, 14, 12, 0, 0).unwrap());
        assert_eq!(format_date_tick(&x), "Mar 2020");
        assert_eq!(format_date_tick(&f64::NAN), "");
    }

    #[test]
    fn test_render_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("figure.json");
        let figure = Figure {
            title: Some("trend".to_string()),
            width: 800,
            height: 600,
            panels: vec![Panel {
                x_label: "date".to_string(),
                primary: axis(vec![1.0, 2.0]),
                secondary: None,
            }],
        };

        render_to_file(&figure, &path).unwrap();

        let parsed: Figure = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(parsed, figure);
    }

    #[test]
    fn test_render_unsupported_extension() {
        let figure = Figure {
            title: None,
            width: 800,
            height: 600,
            panels: Vec::new(),
        };
        let result = render_to_file(&figure, Path::new("figure.gif"));

        assert!(matches!(result, Err(TrendError::InvalidConfig(_))));
    }

    #[test]
    fn test_output_format_from_extension() {
        assert_eq!(OutputFormat::from_path(Path::new("a/trend.SVG")).unwrap(), OutputFormat::Svg);
        assert_eq!(OutputFormat::from_path(Path::new("trend.png")).unwrap(), OutputFormat::Png);
        assert!(OutputFormat::from_path(Path::new("trend")).is_err());
    }

    #[test]
    fn test_check_output_target() {
        let dir = tempfile::tempdir().unwrap();

        assert_eq!(
            check_output_target(&OutputTarget::Stdout).unwrap(),
            OutputFormat::Json
        );
        assert_eq!(
            check_output_target(&OutputTarget::File(dir.path().join("trend.png"))).unwrap(),
            OutputFormat::Png
        );

        let missing = OutputTarget::File(dir.path().join("missing").join("trend.svg"));
        assert!(matches!(
            check_output_target(&missing),
            Err(TrendError::InvalidConfig(_))
        ));

        let gif = OutputTarget::File(dir.path().join("trend.gif"));
        assert!(matches!(
            check_output_target(&gif),
            Err(TrendError::InvalidConfig(_))
        ));
    }
}
