//! health-digest CLI
//!
//! Usage: `health-digest <EXPORT>`
//!
//! Reads a health export XML document and writes the dashboard digest to
//! `public/health_data_processed.json`.

use clap::Parser;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use health_digest::encoder::WriteReport;
use health_digest::{DigestError, DigestRun, ExportProcessor, DIGEST_VERSION};

/// Convert a health export into a compact dashboard digest
#[derive(Parser)]
#[command(name = "health-digest")]
#[command(version = DIGEST_VERSION)]
#[command(about = "Convert a health export XML into a dashboard JSON digest", long_about = None)]
struct Cli {
    /// Path to the export XML document
    export: PathBuf,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging();

    match run(&cli.export) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "Failed to process health data");
            eprintln!(
                "{}",
                serde_json::to_string(&CliError::from(e))
                    .unwrap_or_else(|_| "Unknown error".to_string())
            );
            ExitCode::FAILURE
        }
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run(export: &Path) -> Result<(), DigestCliError> {
    println!("Processing health data from: {}", export.display());

    let processor = ExportProcessor::new();
    let run = processor
        .process_path(export)
        .map_err(DigestCliError::Process)?;
    let written = processor
        .write_output(&run)
        .map_err(DigestCliError::Save)?;

    print_report(&run, &written);
    Ok(())
}

fn print_report(run: &DigestRun, written: &WriteReport) {
    println!();
    println!("Processing complete!");
    println!("Processed data saved to: {}", written.path.display());
    println!("Total days of data: {}", run.output.daily_summary.len());
    println!("Total workouts: {}", run.output.workout_summary.len());
    println!("File size: {:.2} MB", written.megabytes());
}

// Error types

#[derive(Debug, thiserror::Error)]
enum DigestCliError {
    #[error("{0}")]
    Process(DigestError),
    #[error("{0}")]
    Save(DigestError),
}

#[derive(serde::Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<DigestCliError> for CliError {
    fn from(e: DigestCliError) -> Self {
        match e {
            DigestCliError::Process(e @ DigestError::IoError(_)) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check the export path and permissions".to_string()),
            },
            DigestCliError::Process(
                e @ (DigestError::XmlError { .. } | DigestError::StructureError(_)),
            ) => CliError {
                code: "PARSE_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Ensure the input is a complete, well-formed export".to_string()),
            },
            DigestCliError::Process(e) => CliError {
                code: "PROCESS_ERROR".to_string(),
                message: e.to_string(),
                hint: None,
            },
            DigestCliError::Save(e) => CliError {
                code: "SAVE_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check that the output directory is writable".to_string()),
            },
        }
    }
}
