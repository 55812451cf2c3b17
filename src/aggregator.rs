//! Day-bucket aggregation
//!
//! The aggregator owns all mutable state of a run: one [`DailyBucket`] per day
//! key, the global workout list, and the bounded list of recent heart-rate
//! samples. Nodes that cannot be used are skipped without touching any of it.

use crate::config::DEFAULT_HEART_RATE_RETENTION;
use crate::scanner::{NodeHandler, RecordNode, WorkoutNode};
use crate::timestamp::day_key;
use crate::types::{DailyBucket, HeartRateSample, WorkoutEntry};
use serde::Serialize;
use std::collections::{BTreeMap, VecDeque};

/// Meters to miles
pub const METERS_TO_MILES: f64 = 0.000621371;

/// Bucket field a measurement record contributes to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricKind {
    StepCount,
    WalkingRunningDistance,
    ActiveEnergy,
    BasalEnergy,
    HeartRate,
}

/// Type-identifier markers, matched top to bottom; the first hit wins
const METRIC_MARKERS: [(&str, MetricKind); 5] = [
    ("StepCount", MetricKind::StepCount),
    ("DistanceWalkingRunning", MetricKind::WalkingRunningDistance),
    ("ActiveEnergyBurned", MetricKind::ActiveEnergy),
    ("BasalEnergyBurned", MetricKind::BasalEnergy),
    ("HeartRate", MetricKind::HeartRate),
];

impl MetricKind {
    /// Classify a record type identifier by substring match
    pub fn classify(record_type: &str) -> Option<Self> {
        METRIC_MARKERS
            .iter()
            .find(|(marker, _)| record_type.contains(marker))
            .map(|(_, kind)| *kind)
    }
}

/// Why a node was skipped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    MissingField(&'static str),
    InvalidNumber(&'static str),
    InvalidTimestamp,
}

/// What the aggregator did with a node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeOutcome {
    Applied,
    Unrecognized,
    Skipped(SkipReason),
}

/// Tallies of node outcomes over a run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AggregateCounts {
    pub records_applied: u64,
    pub records_unrecognized: u64,
    pub records_skipped: u64,
    pub workouts_applied: u64,
    pub workouts_skipped: u64,
    /// Heart-rate readings accepted, including ones later dropped from the recent list
    pub heart_rate_samples_seen: u64,
}

/// Accumulates records and workouts into day buckets
#[derive(Debug, Clone)]
pub struct Aggregator {
    days: BTreeMap<String, DailyBucket>,
    workouts: Vec<WorkoutEntry>,
    recent_heart_rate: VecDeque<HeartRateSample>,
    heart_rate_retention: usize,
    counts: AggregateCounts,
}

impl Default for Aggregator {
    fn default() -> Self {
        Self::new(DEFAULT_HEART_RATE_RETENTION)
    }
}

impl Aggregator {
    /// Create an aggregator keeping at most `heart_rate_retention` recent samples
    pub fn new(heart_rate_retention: usize) -> Self {
        Self {
            days: BTreeMap::new(),
            workouts: Vec::new(),
            recent_heart_rate: VecDeque::with_capacity(heart_rate_retention),
            heart_rate_retention,
            counts: AggregateCounts::default(),
        }
    }

    /// Apply a measurement record
    pub fn handle_record(&mut self, node: &RecordNode) -> NodeOutcome {
        let outcome = self.apply_record(node);
        match outcome {
            NodeOutcome::Applied => self.counts.records_applied += 1,
            NodeOutcome::Unrecognized => self.counts.records_unrecognized += 1,
            NodeOutcome::Skipped(_) => self.counts.records_skipped += 1,
        }
        outcome
    }

    /// Apply a workout
    pub fn handle_workout(&mut self, node: &WorkoutNode) -> NodeOutcome {
        let outcome = self.apply_workout(node);
        match outcome {
            NodeOutcome::Applied => self.counts.workouts_applied += 1,
            NodeOutcome::Unrecognized | NodeOutcome::Skipped(_) => {
                self.counts.workouts_skipped += 1
            }
        }
        outcome
    }

    fn apply_record(&mut self, node: &RecordNode) -> NodeOutcome {
        let record_type = match required(&node.record_type, "type") {
            Ok(v) => v,
            Err(reason) => return NodeOutcome::Skipped(reason),
        };
        let raw_value = match required(&node.value, "value") {
            Ok(v) => v,
            Err(reason) => return NodeOutcome::Skipped(reason),
        };
        let start_date = match required(&node.start_date, "startDate") {
            Ok(v) => v,
            Err(reason) => return NodeOutcome::Skipped(reason),
        };

        let Some(value) = parse_number(raw_value) else {
            return NodeOutcome::Skipped(SkipReason::InvalidNumber("value"));
        };
        let Some(day) = day_key(start_date) else {
            return NodeOutcome::Skipped(SkipReason::InvalidTimestamp);
        };
        let Some(kind) = MetricKind::classify(record_type) else {
            return NodeOutcome::Unrecognized;
        };

        let bucket = self.days.entry(day).or_default();
        match kind {
            MetricKind::StepCount => bucket.steps += value,
            MetricKind::WalkingRunningDistance => bucket.distance += value * METERS_TO_MILES,
            MetricKind::ActiveEnergy => bucket.calories_active += value,
            MetricKind::BasalEnergy => bucket.calories_basal += value,
            MetricKind::HeartRate => {
                bucket.heart_rate_samples.push(value);
                self.push_heart_rate(HeartRateSample {
                    value,
                    timestamp: start_date.to_string(),
                });
            }
        }

        NodeOutcome::Applied
    }

    fn apply_workout(&mut self, node: &WorkoutNode) -> NodeOutcome {
        let duration = match optional_number(&node.duration, "duration") {
            Ok(v) => v,
            Err(reason) => return NodeOutcome::Skipped(reason),
        };
        let distance = match optional_number(&node.total_distance, "totalDistance") {
            Ok(v) => v,
            Err(reason) => return NodeOutcome::Skipped(reason),
        };
        let energy = match optional_number(&node.total_energy_burned, "totalEnergyBurned") {
            Ok(v) => v,
            Err(reason) => return NodeOutcome::Skipped(reason),
        };

        let Some(start_date) = node.start_date.as_deref() else {
            return NodeOutcome::Skipped(SkipReason::MissingField("startDate"));
        };
        let Some(day) = day_key(start_date) else {
            return NodeOutcome::Skipped(SkipReason::InvalidTimestamp);
        };

        let entry = WorkoutEntry {
            activity_type: node.activity_type.clone(),
            duration_minutes: duration / 60.0,
            distance_miles: if distance != 0.0 {
                distance * METERS_TO_MILES
            } else {
                0.0
            },
            calories: energy,
            start_date: start_date.to_string(),
            day: day.clone(),
        };

        self.days.entry(day).or_default().workouts.push(entry.clone());
        self.workouts.push(entry);

        NodeOutcome::Applied
    }

    fn push_heart_rate(&mut self, sample: HeartRateSample) {
        self.counts.heart_rate_samples_seen += 1;
        if self.heart_rate_retention == 0 {
            return;
        }
        if self.recent_heart_rate.len() == self.heart_rate_retention {
            self.recent_heart_rate.pop_front();
        }
        self.recent_heart_rate.push_back(sample);
    }

    /// Day buckets, keyed and ordered by ISO day
    pub fn days(&self) -> &BTreeMap<String, DailyBucket> {
        &self.days
    }

    /// All workouts in arrival order
    pub fn workouts(&self) -> &[WorkoutEntry] {
        &self.workouts
    }

    /// Outcome tallies so far
    pub fn counts(&self) -> AggregateCounts {
        self.counts
    }

    /// Consume the aggregator, yielding its final state
    pub fn into_parts(self) -> AggregatedData {
        AggregatedData {
            days: self.days,
            workouts: self.workouts,
            recent_heart_rate: self.recent_heart_rate.into(),
            counts: self.counts,
        }
    }
}

impl NodeHandler for Aggregator {
    fn on_record(&mut self, node: &RecordNode) {
        self.handle_record(node);
    }

    fn on_workout(&mut self, node: &WorkoutNode) {
        self.handle_workout(node);
    }
}

/// Final aggregator state handed to the summarizer
#[derive(Debug, Clone)]
pub struct AggregatedData {
    pub days: BTreeMap<String, DailyBucket>,
    pub workouts: Vec<WorkoutEntry>,
    /// Most recent heart-rate samples, oldest first
    pub recent_heart_rate: Vec<HeartRateSample>,
    pub counts: AggregateCounts,
}

/// A required attribute: absent and empty are both missing
fn required<'a>(field: &'a Option<String>, name: &'static str) -> Result<&'a str, SkipReason> {
    match field.as_deref() {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(SkipReason::MissingField(name)),
    }
}

/// A numeric attribute that defaults to zero when absent
fn optional_number(field: &Option<String>, name: &'static str) -> Result<f64, SkipReason> {
    match field.as_deref() {
        None => Ok(0.0),
        Some(raw) => parse_number(raw).ok_or(SkipReason::InvalidNumber(name)),
    }
}

/// Parse a finite number, tolerating surrounding whitespace
///
/// `nan` and `inf` parse as floats but are rejected: JSON has no encoding for
/// them, so a node carrying one is skipped like any other invalid number.
fn parse_number(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}
