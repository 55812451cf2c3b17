//! Error types for health-digest

use std::path::PathBuf;
use thiserror::Error;

/// Errors that abort a digest run
///
/// Record-level problems (missing attributes, bad numbers, bad timestamps) are
/// never surfaced here; the aggregator skips those nodes and keeps going.
#[derive(Debug, Error)]
pub enum DigestError {
    #[error("Malformed export document at byte {position}: {source}")]
    XmlError {
        position: u64,
        #[source]
        source: quick_xml::Error,
    },

    #[error("Malformed export document: {0}")]
    StructureError(String),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Failed to write output to {}: {source}", path.display())]
    PersistError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
