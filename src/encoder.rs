//! Digest encoding
//!
//! This module assembles the final digest document from the aggregated state and
//! writes it out as pretty-printed JSON. Writes go through a temporary file in the
//! destination directory so a failed run never leaves a truncated digest behind.

use crate::aggregator::AggregatedData;
use crate::error::DigestError;
use crate::summarizer::Summarizer;
use crate::types::DigestOutput;
use serde::Serialize;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Result of writing a digest to disk
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WriteReport {
    pub path: PathBuf,
    pub bytes: u64,
}

impl WriteReport {
    /// Size in mebibytes, as shown in the completion report
    ///
    /// Counts the pretty-printed bytes actually written, which is larger than the
    /// compact JSON length of the same document.
    pub fn megabytes(&self) -> f64 {
        self.bytes as f64 / 1024.0 / 1024.0
    }
}

/// Encoder for digest documents
pub struct DigestEncoder;

impl DigestEncoder {
    /// Build the digest document from final aggregator state
    pub fn assemble(data: AggregatedData) -> DigestOutput {
        let daily_summary = Summarizer::finalize_days(data.days);
        let summary_stats = Summarizer::summary_stats(&daily_summary, &data.workouts);

        DigestOutput {
            daily_summary,
            workout_summary: data.workouts,
            heart_rate_stats: data.recent_heart_rate,
            summary_stats,
        }
    }

    /// Encode to a pretty-printed JSON string
    pub fn encode_to_json(output: &DigestOutput) -> Result<String, DigestError> {
        Ok(serde_json::to_string_pretty(output)?)
    }

    /// Encode and write the digest to `path`, replacing any previous file
    pub fn write(output: &DigestOutput, path: &Path) -> Result<WriteReport, DigestError> {
        let json = Self::encode_to_json(output)?;
        write_atomic(path, json.as_bytes())?;

        tracing::debug!(path = %path.display(), bytes = json.len(), "Digest written");

        Ok(WriteReport {
            path: path.to_path_buf(),
            bytes: json.len() as u64,
        })
    }
}

/// Write `content` to a temp file next to `path`, then rename it into place
fn write_atomic(path: &Path, content: &[u8]) -> Result<(), DigestError> {
    let persist_error = |source: std::io::Error| DigestError::PersistError {
        path: path.to_path_buf(),
        source,
    };

    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent).map_err(persist_error)?;

    let mut temp = tempfile::NamedTempFile::new_in(parent).map_err(persist_error)?;
    temp.write_all(content).map_err(persist_error)?;
    temp.flush().map_err(persist_error)?;
    temp.persist(path).map_err(|e| persist_error(e.error))?;

    Ok(())
}
