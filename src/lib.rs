//! health-digest - Streaming digest of personal health-tracking exports
//!
//! Turns a large health export XML document into a compact JSON digest for a
//! dashboard through a single sequential pipeline: record scanning → day-bucket
//! aggregation → summarization → encoding.
//!
//! The document is read one XML event at a time, so memory grows with the number
//! of distinct days and workouts, not with the size of the export.

pub mod aggregator;
pub mod config;
pub mod encoder;
pub mod error;
pub mod pipeline;
pub mod scanner;
pub mod summarizer;
pub mod timestamp;
pub mod types;

pub use config::DigestConfig;
pub use error::DigestError;
pub use pipeline::{export_to_digest, DigestRun, ExportProcessor};
pub use types::{DaySummary, DigestOutput, HeartRateSample, SummaryStats, WorkoutEntry};

/// health-digest version
pub const DIGEST_VERSION: &str = env!("CARGO_PKG_VERSION");
