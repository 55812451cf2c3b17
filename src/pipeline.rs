//! Pipeline orchestration
//!
//! This module provides the public API for health-digest.
//! It runs the full pipeline from an export document to the digest document.

use crate::aggregator::{AggregateCounts, Aggregator};
use crate::config::DigestConfig;
use crate::encoder::{DigestEncoder, WriteReport};
use crate::error::DigestError;
use crate::scanner::{ExportScanner, ScanReport};
use crate::types::DigestOutput;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Outcome of one digest run
#[derive(Debug, Clone)]
pub struct DigestRun {
    /// The digest document
    pub output: DigestOutput,
    /// Node totals from the scanner
    pub scan: ScanReport,
    /// Per-node outcome tallies from the aggregator
    pub counts: AggregateCounts,
}

/// Convert the export at `path` into a digest using default settings.
///
/// # Arguments
/// * `path` - Path to the export XML document
///
/// # Example
/// ```ignore
/// let run = export_to_digest(Path::new("export.xml"))?;
/// println!("{} days", run.output.daily_summary.len());
/// ```
pub fn export_to_digest(path: &Path) -> Result<DigestRun, DigestError> {
    ExportProcessor::new().process_path(path)
}

/// Runs exports through scanning, aggregation, summarization and encoding.
///
/// Pipeline stages:
/// 1. ExportScanner - Stream the document, dispatching records and workouts
/// 2. Aggregator - Accumulate day buckets, workouts and recent heart rate
/// 3. Summarizer - Finalize days and compute rollups
/// 4. DigestEncoder - Assemble and write the digest
#[derive(Debug, Clone, Default)]
pub struct ExportProcessor {
    config: DigestConfig,
}

impl ExportProcessor {
    /// Create a processor with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a processor with specific settings
    pub fn with_config(config: DigestConfig) -> Self {
        Self { config }
    }

    /// Settings this processor runs with
    pub fn config(&self) -> &DigestConfig {
        &self.config
    }

    /// Process the export document at `path`
    pub fn process_path(&self, path: &Path) -> Result<DigestRun, DigestError> {
        tracing::info!(path = %path.display(), "Processing health export");
        let file = File::open(path)?;
        self.process_reader(BufReader::new(file))
    }

    /// Process an export document from any buffered reader
    pub fn process_reader<R: BufRead>(&self, input: R) -> Result<DigestRun, DigestError> {
        let mut aggregator = Aggregator::new(self.config.heart_rate_retention);
        let scan =
            ExportScanner::new(input, self.config.progress_interval).scan(&mut aggregator)?;

        let data = aggregator.into_parts();
        let counts = data.counts;
        tracing::debug!(
            records_applied = counts.records_applied,
            records_unrecognized = counts.records_unrecognized,
            records_skipped = counts.records_skipped,
            workouts_applied = counts.workouts_applied,
            workouts_skipped = counts.workouts_skipped,
            heart_rate_samples = counts.heart_rate_samples_seen,
            "Aggregation complete"
        );

        let output = DigestEncoder::assemble(data);
        tracing::info!(
            days = output.daily_summary.len(),
            workouts = output.workout_summary.len(),
            "Digest assembled"
        );

        Ok(DigestRun {
            output,
            scan,
            counts,
        })
    }

    /// Write a run's digest to the configured output path
    pub fn write_output(&self, run: &DigestRun) -> Result<WriteReport, DigestError> {
        DigestEncoder::write(&run.output, &self.config.output_path)
    }
}
