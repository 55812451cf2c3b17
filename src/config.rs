//! Run configuration
//!
//! Defaults reproduce the fixed behavior of the command-line tool. Library callers
//! can override them, mostly useful in tests.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Where the digest is written when no other path is configured
pub const DEFAULT_OUTPUT_PATH: &str = "public/health_data_processed.json";

/// Emit a progress notice after this many processed nodes
pub const DEFAULT_PROGRESS_INTERVAL: u64 = 10_000;

/// Number of most recent heart-rate samples kept in the output
pub const DEFAULT_HEART_RATE_RETENTION: usize = 1000;

/// Configuration for a single digest run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DigestConfig {
    /// Destination of the JSON digest
    pub output_path: PathBuf,
    /// Nodes between progress notices (0 disables them)
    pub progress_interval: u64,
    /// Most recent heart-rate samples to keep
    pub heart_rate_retention: usize,
}

impl Default for DigestConfig {
    fn default() -> Self {
        Self {
            output_path: PathBuf::from(DEFAULT_OUTPUT_PATH),
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
            heart_rate_retention: DEFAULT_HEART_RATE_RETENTION,
        }
    }
}

impl DigestConfig {
    pub fn with_output_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_path = path.into();
        self
    }

    pub fn with_progress_interval(mut self, interval: u64) -> Self {
        self.progress_interval = interval;
        self
    }

    pub fn with_heart_rate_retention(mut self, retention: usize) -> Self {
        self.heart_rate_retention = retention;
        self
    }
}
