//! Summary computation
//!
//! Turns the aggregator's day buckets into finalized day records and computes the
//! rollup statistics over trailing windows of days.

use crate::types::{DailyBucket, DaySummary, SummaryStats, WorkoutEntry};
use std::collections::{BTreeMap, HashSet};

/// Long trailing window, in day records
pub const RECENT_WINDOW_DAYS: usize = 30;

/// Short trailing window, in day records
pub const SHORT_WINDOW_DAYS: usize = 7;

/// Summarizer for finalizing days and computing rollups
pub struct Summarizer;

impl Summarizer {
    /// Finalize day buckets into day records, ascending by day key
    ///
    /// Heart-rate statistics are set only for days that had samples; the raw
    /// samples themselves are dropped here.
    pub fn finalize_days(days: BTreeMap<String, DailyBucket>) -> Vec<DaySummary> {
        let mut summaries: Vec<DaySummary> = days
            .into_iter()
            .map(|(date, bucket)| finalize_day(date, bucket))
            .collect();

        // ISO day keys sort chronologically
        summaries.sort_by(|a, b| a.date.cmp(&b.date));
        summaries
    }

    /// Compute rollup statistics, or `None` when there are no days
    pub fn summary_stats(days: &[DaySummary], workouts: &[WorkoutEntry]) -> Option<SummaryStats> {
        if days.is_empty() {
            return None;
        }

        let recent = trailing_window(days, RECENT_WINDOW_DAYS);
        let short = trailing_window(days, SHORT_WINDOW_DAYS);

        // Exact day-key membership, not a date range: gaps in the history
        // shrink what counts as recent.
        let recent_dates: HashSet<&str> = recent.iter().map(|d| d.date.as_str()).collect();
        let recent_workouts_30d = workouts
            .iter()
            .filter(|w| recent_dates.contains(w.day.as_str()))
            .count();

        let mut workout_type_breakdown = BTreeMap::new();
        for workout in workouts {
            *workout_type_breakdown
                .entry(workout.breakdown_key().to_string())
                .or_insert(0) += 1;
        }

        Some(SummaryStats {
            total_days: days.len(),
            avg_daily_steps_30d: mean_by(recent, |d| d.steps),
            avg_daily_steps_7d: mean_by(short, |d| d.steps),
            total_workouts: workouts.len(),
            recent_workouts_30d,
            total_distance_miles: days.iter().map(|d| d.distance).sum(),
            avg_daily_distance_30d: mean_by(recent, |d| d.distance),
            workout_type_breakdown,
        })
    }
}

fn finalize_day(date: String, bucket: DailyBucket) -> DaySummary {
    let samples = &bucket.heart_rate_samples;
    let (avg_heart_rate, max_heart_rate, min_heart_rate) = if samples.is_empty() {
        (None, None, None)
    } else {
        let sum: f64 = samples.iter().sum();
        let max = samples.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let min = samples.iter().copied().fold(f64::INFINITY, f64::min);
        (Some(sum / samples.len() as f64), Some(max), Some(min))
    };

    DaySummary {
        date,
        steps: bucket.steps,
        distance: bucket.distance,
        calories_active: bucket.calories_active,
        calories_basal: bucket.calories_basal,
        workouts: bucket.workouts,
        avg_heart_rate,
        max_heart_rate,
        min_heart_rate,
    }
}

/// The last `len` day records, or all of them when there are fewer
fn trailing_window(days: &[DaySummary], len: usize) -> &[DaySummary] {
    &days[days.len().saturating_sub(len)..]
}

/// Mean of a non-empty window
fn mean_by(window: &[DaySummary], field: impl Fn(&DaySummary) -> f64) -> f64 {
    window.iter().map(field).sum::<f64>() / window.len() as f64
}
