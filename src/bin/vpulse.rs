//! Vpulse CLI - Command-line interface for Valvepulse
//!
//! Commands:
//! - report: Build a compliance report from a history payload
//! - devices: List device identifiers found in a history payload
//! - diagnose: Classify the latest reading of a device

use clap::{Parser, Subcommand, ValueEnum};
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use chrono::{DateTime, Utc};
use valvepulse::pipeline::DEFAULT_HISTORY_DAYS;
use valvepulse::{ComplianceProcessor, EngineError, HistoryAdapter, ENGINE_VERSION};

/// Vpulse - Telemetry compliance engine for valve-monitoring devices
#[derive(Parser)]
#[command(name = "vpulse")]
#[command(version = ENGINE_VERSION)]
#[command(about = "Transform valve telemetry into compliance reports", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a compliance report from a history payload
    Report {
        /// Input file path (use - for stdin)
        #[arg(short, long, default_value = "-")]
        input: PathBuf,

        /// Device to report on (defaults to the first device found)
        #[arg(short, long)]
        device: Option<String>,

        /// Output format
        #[arg(long, default_value = "json-pretty")]
        format: OutputFormat,

        /// Number of recent days to include
        #[arg(long, default_value_t = DEFAULT_HISTORY_DAYS)]
        days: usize,

        /// Reference instant (RFC3339) for "today" bucketing; defaults to now
        #[arg(long)]
        now: Option<String>,
    },

    /// List device identifiers found in a history payload
    Devices {
        /// Input file path (use - for stdin)
        #[arg(short, long, default_value = "-")]
        input: PathBuf,
    },

    /// Classify the latest reading of a device
    Diagnose {
        /// Input file path (use - for stdin)
        #[arg(short, long, default_value = "-")]
        input: PathBuf,

        /// Device to diagnose (defaults to the first device found)
        #[arg(short, long)]
        device: Option<String>,
    },
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// Compact JSON
    Json,
    /// Pretty-printed JSON
    JsonPretty,
    /// Human-readable summary
    Table,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
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

fn run(cli: Cli) -> Result<(), VpulseCliError> {
    match cli.command {
        Commands::Report {
            input,
            device,
            format,
            days,
            now,
        } => cmd_report(&input, device.as_deref(), format, days, now.as_deref()),
        Commands::Devices { input } => cmd_devices(&input),
        Commands::Diagnose { input, device } => cmd_diagnose(&input, device.as_deref()),
    }
}

fn cmd_report(
    input: &Path,
    device: Option<&str>,
    format: OutputFormat,
    days: usize,
    now: Option<&str>,
) -> Result<(), VpulseCliError> {
    let input_data = read_input(input)?;
    let now = resolve_now(now)?;

    let mut processor = ComplianceProcessor::with_history_days(days);
    let payload = processor.process(&input_data, device, now)?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string(&payload)?),
        OutputFormat::JsonPretty => println!("{}", serde_json::to_string_pretty(&payload)?),
        OutputFormat::Table => {
            println!("Device:     {}", payload.device_id);
            if let Some(diag) = &payload.diagnostic {
                println!("Status:     {} ({:?})", diag.message, diag.severity);
            }
            let card = &payload.compliance;
            println!(
                "Today:      score {}% ({}), start {}, duration {}, pressure {}",
                card.metrics.score,
                card.adherence.as_str(),
                card.metrics.start_clock,
                card.metrics.duration_label,
                card.pressure_band.as_str()
            );
            if !payload.recent_days.is_empty() {
                println!("\nRecent days:");
                for day in &payload.recent_days {
                    println!(
                        "  {}  start {:>8}  {:>7}  {:>3}%  {}",
                        day.date,
                        day.metrics.start_clock,
                        day.metrics.duration_label,
                        day.metrics.score,
                        day.pressure_band.as_str()
                    );
                }
            }
        }
    }

    Ok(())
}

fn cmd_devices(input: &Path) -> Result<(), VpulseCliError> {
    let input_data = read_input(input)?;
    let records = HistoryAdapter::parse_array(&input_data)?;

    let ids = HistoryAdapter::device_ids(&records);
    if ids.is_empty() {
        return Err(VpulseCliError::Engine(EngineError::EmptyHistory));
    }
    for id in ids {
        println!("{}", id);
    }
    Ok(())
}

fn cmd_diagnose(input: &Path, device: Option<&str>) -> Result<(), VpulseCliError> {
    let input_data = read_input(input)?;
    let mut processor = ComplianceProcessor::new();
    let payload = processor.process(&input_data, device, Utc::now())?;

    match payload.diagnostic {
        Some(diag) => {
            println!("{}: {} ({:?})", payload.device_id, diag.message, diag.severity);
            println!("{}", serde_json::to_string_pretty(&diag.status)?);
        }
        None => println!("{}: no readings", payload.device_id),
    }
    Ok(())
}

// Helper functions

fn read_input(input: &Path) -> Result<String, VpulseCliError> {
    if input.to_string_lossy() == "-" {
        if atty::is(atty::Stream::Stdin) {
            return Err(VpulseCliError::NoInput);
        }
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        Ok(buffer)
    } else {
        Ok(fs::read_to_string(input)?)
    }
}

fn resolve_now(now: Option<&str>) -> Result<DateTime<Utc>, VpulseCliError> {
    match now {
        None => Ok(Utc::now()),
        Some(s) => DateTime::parse_from_rfc3339(s)
            .map(|t| t.with_timezone(&Utc))
            .map_err(|e| VpulseCliError::BadNow(e.to_string())),
    }
}

// Error types

#[derive(Debug)]
enum VpulseCliError {
    Io(io::Error),
    Engine(EngineError),
    Json(serde_json::Error),
    BadNow(String),
    NoInput,
}

impl From<io::Error> for VpulseCliError {
    fn from(e: io::Error) -> Self {
        VpulseCliError::Io(e)
    }
}

impl From<EngineError> for VpulseCliError {
    fn from(e: EngineError) -> Self {
        VpulseCliError::Engine(e)
    }
}

impl From<serde_json::Error> for VpulseCliError {
    fn from(e: serde_json::Error) -> Self {
        VpulseCliError::Json(e)
    }
}

#[derive(serde::Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<VpulseCliError> for CliError {
    fn from(e: VpulseCliError) -> Self {
        match e {
            VpulseCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            VpulseCliError::Engine(e) => CliError {
                code: "ENGINE_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Ensure input is a JSON array of history records".to_string()),
            },
            VpulseCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check JSON syntax".to_string()),
            },
            VpulseCliError::BadNow(msg) => CliError {
                code: "BAD_NOW".to_string(),
                message: msg,
                hint: Some("Pass --now as an RFC3339 instant".to_string()),
            },
            VpulseCliError::NoInput => CliError {
                code: "NO_INPUT".to_string(),
                message: "stdin is a TTY and no input file was given".to_string(),
                hint: Some("Pipe a history payload or pass --input <file>".to_string()),
            },
        }
    }
}
