//! Trend CLI - Command-line interface for Biotrend
//!
//! Commands:
//! - plot: Draw smoothed tracker channels on a shared date axis
//! - series: Print one aligned channel as JSON
//! - plays: Summarize the streaming history
//! - config: Print the default pipeline configuration
//! - doctor: Check which export files are present

use clap::{Parser, Subcommand, ValueEnum};
use env_logger::Env;
use log::info;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use biotrend::music::summarize_plays;
use biotrend::render::check_output_target;
use biotrend::source::ExportKind;
use biotrend::{
    channel_series, Channel, ExportSource, Layout, OutputTarget, PipelineConfig, SleepChannel,
    TrendError, TrendPipeline, Window, BIOTREND_VERSION,
};

/// Trend - Smoothed, date-aligned trends from tracker exports
#[derive(Parser)]
#[command(name = "trend")]
#[command(version = BIOTREND_VERSION)]
#[command(about = "Plot smoothed weight and sleep trends from tracker exports", long_about = None)]
struct Cli {
    /// Log filter (error, warn, info, debug, trace); RUST_LOG takes precedence
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Draw smoothed tracker channels on a shared date axis
    Plot {
        /// Export directory
        #[arg(short, long)]
        data_dir: PathBuf,

        /// Pipeline configuration JSON
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Output path: .svg, .png or .json (use - for stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Panel layout
        #[arg(long)]
        layout: Option<LayoutArg>,

        /// Sleep channel plotted against weight change
        #[arg(long)]
        sleep_channel: Option<SleepChannelArg>,

        /// Sleep smoothing half-width
        #[arg(long)]
        sleep_window: Option<usize>,

        /// Weight smoothing half-width
        #[arg(long)]
        weight_window: Option<usize>,

        /// Figure title
        #[arg(long)]
        title: Option<String>,
    },

    /// Print one aligned channel as JSON
    Series {
        /// Export directory
        #[arg(short, long)]
        data_dir: PathBuf,

        /// Channel to extract
        #[arg(long, value_enum)]
        channel: ChannelArg,

        /// Smoothing half-width (defaults to the channel's configured window)
        #[arg(long)]
        window: Option<usize>,
    },

    /// Summarize the streaming history
    Plays {
        /// Export directory
        #[arg(short, long)]
        data_dir: PathBuf,

        /// Number of artists to list
        #[arg(long, default_value = "10")]
        top: usize,
    },

    /// Print the default pipeline configuration
    Config,

    /// Check which export files are present
    Doctor {
        /// Export directory
        #[arg(short, long)]
        data_dir: PathBuf,

        /// Pipeline configuration JSON to validate
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Output path to check (overrides the configuration's output)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum LayoutArg {
    /// One panel with a secondary axis
    Single,
    /// One panel per channel
    Multi,
}

impl From<LayoutArg> for Layout {
    fn from(arg: LayoutArg) -> Self {
        match arg {
            LayoutArg::Single => Layout::Single,
            LayoutArg::Multi => Layout::Multi,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum SleepChannelArg {
    /// Overall sleep score
    Score,
    /// Resting heart rate
    HeartRate,
    /// Restlessness
    Restlessness,
}

impl From<SleepChannelArg> for SleepChannel {
    fn from(arg: SleepChannelArg) -> Self {
        match arg {
            SleepChannelArg::Score => SleepChannel::Score,
            SleepChannelArg::HeartRate => SleepChannel::HeartRate,
            SleepChannelArg::Restlessness => SleepChannel::Restlessness,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum ChannelArg {
    Weight,
    WeightChange,
    SleepScore,
    SleepHeartRate,
    SleepRestlessness,
}

impl From<ChannelArg> for Channel {
    fn from(arg: ChannelArg) -> Self {
        match arg {
            ChannelArg::Weight => Channel::Weight,
            ChannelArg::WeightChange => Channel::WeightChange,
            ChannelArg::SleepScore => Channel::Sleep(SleepChannel::Score),
            ChannelArg::SleepHeartRate => Channel::Sleep(SleepChannel::HeartRate),
            ChannelArg::SleepRestlessness => Channel::Sleep(SleepChannel::Restlessness),
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    env_logger::Builder::from_env(Env::default().default_filter_or(cli.log_level.as_str())).init();

    match run(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!(
                "{}",
                serde_json::to_string(&CliError::from(e))
                    .unwrap_or_else(|_| "Unknown error".to_string())
            );
            ExitCode::FAILURE
        }
    }
}

fn run(command: Commands) -> Result<(), TrendCliError> {
    match command {
        Commands::Plot {
            data_dir,
            config,
            output,
            layout,
            sleep_channel,
            sleep_window,
            weight_window,
            title,
        } => {
            let mut pipeline_config = load_config(config.as_deref())?;
            if let Some(output) = output {
                pipeline_config.output = OutputTarget::from_arg(&output);
            }
            if let Some(layout) = layout {
                pipeline_config.layout = layout.into();
            }
            if let Some(channel) = sleep_channel {
                pipeline_config = pipeline_config.with_sleep_channel(channel.into());
            }
            if let Some(window) = sleep_window {
                pipeline_config.windows.sleep = window;
            }
            if let Some(window) = weight_window {
                pipeline_config.windows.weight = window;
            }
            if title.is_some() {
                pipeline_config.title = title;
            }
            cmd_plot(&data_dir, pipeline_config)
        }
        Commands::Series {
            data_dir,
            channel,
            window,
        } => cmd_series(&data_dir, channel.into(), window),
        Commands::Plays { data_dir, top } => cmd_plays(&data_dir, top),
        Commands::Config => {
            println!("{}", PipelineConfig::default().to_json()?);
            Ok(())
        }
        Commands::Doctor {
            data_dir,
            config,
            output,
            json,
        } => cmd_doctor(&data_dir, config.as_deref(), output.as_deref(), json),
    }
}

fn load_config(path: Option<&Path>) -> Result<PipelineConfig, TrendCliError> {
    match path {
        Some(path) => Ok(PipelineConfig::from_json(&fs::read_to_string(path)?)?),
        None => Ok(PipelineConfig::default()),
    }
}

fn require_dir(data_dir: &Path) -> Result<ExportSource, TrendCliError> {
    if !data_dir.is_dir() {
        return Err(TrendCliError::MissingDataDir(data_dir.to_path_buf()));
    }
    Ok(ExportSource::new(data_dir))
}

fn cmd_plot(data_dir: &Path, config: PipelineConfig) -> Result<(), TrendCliError> {
    let source = require_dir(data_dir)?;
    let pipeline = TrendPipeline::new(config)?;
    let figure = pipeline.run(&source)?;

    if let OutputTarget::File(path) = &pipeline.config().output {
        info!("wrote {} panel(s) to {}", figure.panels.len(), path.display());
    }
    Ok(())
}

fn cmd_series(
    data_dir: &Path,
    channel: Channel,
    window: Option<usize>,
) -> Result<(), TrendCliError> {
    let source = require_dir(data_dir)?;
    let mut config = PipelineConfig::default();
    if let Some(window) = window {
        match channel {
            Channel::Weight | Channel::WeightChange => config.windows.weight = window,
            Channel::Sleep(_) => config.windows.sleep = window,
        }
    }
    config.validate()?;

    let data = source.load_tracker_data()?;
    let aligned = channel_series(channel, &data, &config)?;
    if aligned.is_empty() {
        return Err(TrendCliError::NoSamples(
            channel.label().to_string(),
            config.windows.for_channel(channel),
        ));
    }

    print_json(&aligned)
}

fn cmd_plays(data_dir: &Path, top: usize) -> Result<(), TrendCliError> {
    let source = require_dir(data_dir)?;
    let plays = source.load_plays()?;
    if plays.is_empty() {
        return Err(TrendCliError::NoPlays);
    }

    print_json(&summarize_plays(&plays, top))
}

/// Pretty JSON for a terminal, compact JSON for a pipe
fn print_json<T: serde::Serialize>(value: &T) -> Result<(), TrendCliError> {
    let output = if atty::is(atty::Stream::Stdout) {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    println!("{}", output);
    Ok(())
}

fn cmd_doctor(
    data_dir: &Path,
    config: Option<&Path>,
    output: Option<&Path>,
    json: bool,
) -> Result<(), TrendCliError> {
    let mut checks: Vec<DoctorCheck> = Vec::new();

    checks.push(DoctorCheck {
        name: "version".to_string(),
        status: CheckStatus::Ok,
        message: format!("Biotrend version {}", BIOTREND_VERSION),
    });

    if data_dir.is_dir() {
        let source = ExportSource::new(data_dir);
        for entry in source.inventory()? {
            let required = matches!(entry.kind, ExportKind::Weight | ExportKind::SleepScore);
            let check = match entry.files.len() {
                0 => DoctorCheck {
                    name: entry.kind.as_str().to_string(),
                    status: CheckStatus::Warning,
                    message: if required {
                        "No export files found; channels built from it will be blank".to_string()
                    } else {
                        "No export files found".to_string()
                    },
                },
                n => DoctorCheck {
                    name: entry.kind.as_str().to_string(),
                    status: CheckStatus::Ok,
                    message: format!("{} file(s)", n),
                },
            };
            checks.push(check);
        }
    } else {
        checks.push(DoctorCheck {
            name: "data_dir".to_string(),
            status: CheckStatus::Error,
            message: format!("{} is not a directory", data_dir.display()),
        });
    }

    let mut pipeline_config = PipelineConfig::default();
    if let Some(config_path) = config {
        let check = match fs::read_to_string(config_path) {
            Ok(content) => match PipelineConfig::from_json(&content) {
                Ok(parsed) => {
                    let check = DoctorCheck {
                        name: "config".to_string(),
                        status: CheckStatus::Ok,
                        message: format!(
                            "Configuration valid ({} channel(s))",
                            parsed.channels.len()
                        ),
                    };
                    pipeline_config = parsed;
                    check
                }
                Err(e) => DoctorCheck {
                    name: "config".to_string(),
                    status: CheckStatus::Error,
                    message: format!("Invalid configuration: {}", e),
                },
            },
            Err(e) => DoctorCheck {
                name: "config".to_string(),
                status: CheckStatus::Error,
                message: format!("Cannot read configuration file: {}", e),
            },
        };
        checks.push(check);
    }

    let target = match output {
        Some(path) => OutputTarget::from_arg(path),
        None => pipeline_config.output,
    };
    let output_check = match (&target, check_output_target(&target)) {
        (OutputTarget::Stdout, _) => DoctorCheck {
            name: "output".to_string(),
            status: CheckStatus::Ok,
            message: "Figure JSON goes to stdout".to_string(),
        },
        (OutputTarget::File(path), Ok(format)) => DoctorCheck {
            name: "output".to_string(),
            status: CheckStatus::Ok,
            message: format!("{} is writable as {:?}", path.display(), format),
        },
        (OutputTarget::File(_), Err(e)) => DoctorCheck {
            name: "output".to_string(),
            status: CheckStatus::Error,
            message: e.to_string(),
        },
    };
    checks.push(output_check);

    let report = DoctorReport {
        version: BIOTREND_VERSION.to_string(),
        data_dir: data_dir.to_path_buf(),
        checks,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Trend Doctor Report");
        println!("===================");
        println!("Version:  {}", report.version);
        println!("Data dir: {}", report.data_dir.display());
        println!("\nChecks:");

        for check in &report.checks {
            let status_icon = match check.status {
                CheckStatus::Ok => "[OK]",
                CheckStatus::Warning => "[WARN]",
                CheckStatus::Error => "[ERR]",
            };
            println!("  {} {}: {}", status_icon, check.name, check.message);
        }
    }

    let has_errors = report
        .checks
        .iter()
        .any(|c| matches!(c.status, CheckStatus::Error));
    if has_errors {
        Err(TrendCliError::DoctorFailed)
    } else {
        Ok(())
    }
}

// Error types

#[derive(Debug)]
enum TrendCliError {
    Io(io::Error),
    Trend(TrendError),
    Json(serde_json::Error),
    MissingDataDir(PathBuf),
    NoSamples(String, Window),
    NoPlays,
    DoctorFailed,
}

impl From<io::Error> for TrendCliError {
    fn from(e: io::Error) -> Self {
        TrendCliError::Io(e)
    }
}

impl From<TrendError> for TrendCliError {
    fn from(e: TrendError) -> Self {
        TrendCliError::Trend(e)
    }
}

impl From<serde_json::Error> for TrendCliError {
    fn from(e: serde_json::Error) -> Self {
        TrendCliError::Json(e)
    }
}

#[derive(serde::Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<TrendCliError> for CliError {
    fn from(e: TrendCliError) -> Self {
        match e {
            TrendCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            TrendCliError::Trend(e) => {
                let (code, hint) = match &e {
                    TrendError::InvalidConfig(_) => {
                        ("INVALID_CONFIG", "Run 'trend config' for a valid starting point")
                    }
                    TrendError::RenderError(_) => {
                        ("RENDER_ERROR", "Try a .json output to inspect the figure")
                    }
                    TrendError::MusicApiError(_) => {
                        ("MUSIC_API_ERROR", "Check the music API credentials")
                    }
                    TrendError::IoError(_) => ("IO_ERROR", "Check file paths and permissions"),
                    _ => ("PARSE_ERROR", "Run 'trend doctor' to inspect the export directory"),
                };
                CliError {
                    code: code.to_string(),
                    message: e.to_string(),
                    hint: Some(hint.to_string()),
                }
            }
            TrendCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check JSON syntax".to_string()),
            },
            TrendCliError::MissingDataDir(path) => CliError {
                code: "MISSING_DATA_DIR".to_string(),
                message: format!("{} is not a directory", path.display()),
                hint: Some("Point --data-dir at the unpacked export".to_string()),
            },
            TrendCliError::NoSamples(channel, window) => CliError {
                code: "NO_SAMPLES".to_string(),
                message: format!(
                    "{} has too few samples for a window of {}",
                    channel,
                    window.size()
                ),
                hint: Some("Use a smaller --window".to_string()),
            },
            TrendCliError::NoPlays => CliError {
                code: "NO_PLAYS".to_string(),
                message: "No streaming history found".to_string(),
                hint: Some("Expected spotify/StreamingHistory*.json under --data-dir".to_string()),
            },
            TrendCliError::DoctorFailed => CliError {
                code: "DOCTOR_FAILED".to_string(),
                message: "One or more health checks failed".to_string(),
                hint: Some("Review the doctor report for details".to_string()),
            },
        }
    }
}

// Report types

#[derive(serde::Serialize)]
struct DoctorReport {
    version: String,
    data_dir: PathBuf,
    checks: Vec<DoctorCheck>,
}

#[derive(serde::Serialize)]
struct DoctorCheck {
    name: String,
    status: CheckStatus,
    message: String,
}

#[derive(serde::Serialize)]
#[serde(rename_all = "lowercase")]
enum CheckStatus {
    Ok,
    Warning,
    Error,
}
