//! Core types for the health-digest pipeline
//!
//! This module defines the data that flows through each stage: the per-day
//! accumulation buckets built while scanning, and the finalized records that make
//! up the emitted digest.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Running accumulation for one calendar day
///
/// Only the aggregator mutates a bucket. The raw heart-rate samples live here
/// until the summarizer turns them into daily statistics.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DailyBucket {
    /// Step count sum
    pub steps: f64,
    /// Walking/running distance sum (miles)
    pub distance: f64,
    /// Active energy sum
    pub calories_active: f64,
    /// Basal energy sum
    pub calories_basal: f64,
    /// Heart-rate readings observed that day, in arrival order
    pub heart_rate_samples: Vec<f64>,
    /// Workouts that started that day
    pub workouts: Vec<WorkoutEntry>,
}

/// A single workout session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkoutEntry {
    /// Activity type as written in the export (not validated)
    #[serde(rename = "type")]
    pub activity_type: Option<String>,
    pub duration_minutes: f64,
    pub distance_miles: f64,
    pub calories: f64,
    /// Raw start timestamp, original format preserved
    #[serde(rename = "date")]
    pub start_date: String,
    /// ISO day key derived from the start timestamp
    pub day: String,
}

impl WorkoutEntry {
    /// Key under which this workout is counted in the type breakdown
    pub fn breakdown_key(&self) -> &str {
        self.activity_type.as_deref().unwrap_or("null")
    }
}

/// A heart-rate reading kept for the recent-samples list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeartRateSample {
    pub value: f64,
    /// Raw start timestamp of the originating record
    pub timestamp: String,
}

/// Finalized record for one day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DaySummary {
    /// ISO day key (YYYY-MM-DD)
    pub date: String,
    pub steps: f64,
    pub distance: f64,
    pub calories_active: f64,
    pub calories_basal: f64,
    pub workouts: Vec<WorkoutEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avg_heart_rate: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_heart_rate: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_heart_rate: Option<f64>,
}

/// Rollup statistics across all days
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryStats {
    pub total_days: usize,
    pub avg_daily_steps_30d: f64,
    pub avg_daily_steps_7d: f64,
    pub total_workouts: usize,
    pub recent_workouts_30d: usize,
    pub total_distance_miles: f64,
    pub avg_daily_distance_30d: f64,
    pub workout_type_breakdown: BTreeMap<String, usize>,
}

/// The complete digest document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DigestOutput {
    pub daily_summary: Vec<DaySummary>,
    pub workout_summary: Vec<WorkoutEntry>,
    pub heart_rate_stats: Vec<HeartRateSample>,
    /// `{}` when the export held no usable days
    #[serde(with = "stats_or_empty")]
    pub summary_stats: Option<SummaryStats>,
}

/// Serializes `None` as an empty JSON object instead of `null`
mod stats_or_empty {
    use super::SummaryStats;
    use serde::ser::SerializeMap;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Stats(SummaryStats),
        Empty {},
    }

    pub fn serialize<S>(stats: &Option<SummaryStats>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match stats {
            Some(stats) => stats.serialize(serializer),
            None => serializer.serialize_map(Some(0))?.end(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<SummaryStats>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Repr::deserialize(deserializer)? {
            Repr::Stats(stats) => Ok(Some(stats)),
            Repr::Empty {} => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample_workout(activity_type: Option<&str>) -> WorkoutEntry {
        WorkoutEntry {
            activity_type: activity_type.map(str::to_string),
            duration_minutes: 30.0,
            distance_miles: 2.0,
            calories: 250.0,
            start_date: "2024-01-02 09:00:00 -0700".to_string(),
            day: "2024-01-02".to_string(),
        }
    }

    #[test]
    fn test_workout_field_names() {
        let value = serde_json::to_value(sample_workout(Some("HKWorkoutActivityTypeRunning")))
            .unwrap();

        assert_eq!(value["type"], "HKWorkoutActivityTypeRunning");
        assert_eq!(value["date"], "2024-01-02 09:00:00 -0700");
        assert_eq!(value["day"], "2024-01-02");
        assert!(value.get("activity_type").is_none());
    }

    #[test]
    fn test_untyped_workout_serializes_null() {
        let workout = sample_workout(None);
        let value = serde_json::to_value(&workout).unwrap();

        assert!(value["type"].is_null());
        assert_eq!(workout.breakdown_key(), "null");
    }

    #[test]
    fn test_day_without_heart_rate_omits_fields() {
        let day = DaySummary {
            date: "2024-01-01".to_string(),
            steps: 120.0,
            distance: 0.0,
            calories_active: 0.0,
            calories_basal: 0.0,
            workouts: Vec::new(),
            avg_heart_rate: None,
            max_heart_rate: None,
            min_heart_rate: None,
        };
        let value = serde_json::to_value(&day).unwrap();
        let object = value.as_object().unwrap();

        assert!(!object.contains_key("avg_heart_rate"));
        assert!(!object.contains_key("max_heart_rate"));
        assert!(!object.contains_key("min_heart_rate"));
        assert!(!object.contains_key("heart_rate_samples"));
    }

    #[test]
    fn test_empty_summary_stats_is_empty_object() {
        let output = DigestOutput {
            daily_summary: Vec::new(),
            workout_summary: Vec::new(),
            heart_rate_stats: Vec::new(),
            summary_stats: None,
        };

        let json = serde_json::to_string(&output).unwrap();
        assert!(json.contains(r#""summary_stats":{}"#));

        let parsed: DigestOutput = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.summary_stats, None);
    }

    #[test]
    fn test_top_level_key_order() {
        let output = DigestOutput {
            daily_summary: Vec::new(),
            workout_summary: Vec::new(),
            heart_rate_stats: Vec::new(),
            summary_stats: None,
        };
        let json = serde_json::to_string(&output).unwrap();

        let positions: Vec<usize> = [
            "daily_summary",
            "workout_summary",
            "heart_rate_stats",
            "summary_stats",
        ]
        .iter()
        .map(|key| json.find(key).unwrap())
        .collect();

        assert!(positions.windows(2).all(|pair| pair[0] < pair[1]));
    }
}
