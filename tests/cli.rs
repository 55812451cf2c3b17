use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

const EXPORT: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<HealthData locale="en_US">
 <Record type="HKQuantityTypeIdentifierStepCount" value="120" startDate="2024-01-01 08:00:00 -0700"/>
 <Record type="HKQuantityTypeIdentifierHeartRate" value="64" startDate="2024-01-01 08:05:00 -0700"/>
 <Workout workoutActivityType="HKWorkoutActivityTypeRunning" duration="1800" totalDistance="5000" totalEnergyBurned="250" startDate="2024-01-02 07:00:00 -0700"/>
</HealthData>
"#;

fn digest_cmd() -> Command {
    Command::cargo_bin("health-digest").unwrap()
}

#[test]
fn test_no_arguments_is_usage_error() {
    digest_cmd()
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn test_extra_arguments_rejected() {
    digest_cmd().args(["a.xml", "b.xml"]).assert().failure();
}

#[test]
fn test_success_writes_default_output() {
    let tmp = TempDir::new().unwrap();
    let input = tmp.path().join("export.xml");
    fs::write(&input, EXPORT).unwrap();

    digest_cmd()
        .current_dir(tmp.path())
        .arg(&input)
        .assert()
        .success()
        .stdout(predicate::str::contains("Processing health data from:"))
        .stdout(predicate::str::contains("Processing complete!"))
        .stdout(predicate::str::contains("Total days of data: 2"))
        .stdout(predicate::str::contains("Total workouts: 1"))
        .stdout(predicate::str::contains("MB"));

    let output = tmp.path().join("public").join("health_data_processed.json");
    let digest: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(output).unwrap()).unwrap();
    assert_eq!(digest["summary_stats"]["total_workouts"], 1);
    assert_eq!(digest["daily_summary"][0]["date"], "2024-01-01");
}

#[test]
fn test_missing_export_reports_io_error() {
    let tmp = TempDir::new().unwrap();

    digest_cmd()
        .current_dir(tmp.path())
        .arg("missing.xml")
        .assert()
        .failure()
        .stderr(predicate::str::contains("IO_ERROR"));

    assert!(!tmp.path().join("public").exists());
}

#[test]
fn test_malformed_export_reports_parse_error() {
    let tmp = TempDir::new().unwrap();
    let input = tmp.path().join("export.xml");
    fs::write(&input, "<HealthData><Record></HealthData>").unwrap();

    digest_cmd()
        .current_dir(tmp.path())
        .arg(&input)
        .assert()
        .failure()
        .stderr(predicate::str::contains("PARSE_ERROR"));

    assert!(!tmp
        .path()
        .join("public")
        .join("health_data_processed.json")
        .exists());
}
