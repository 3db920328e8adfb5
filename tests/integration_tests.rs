use air_quality_pipeline::analyzers::aggregate::aggregate_daily;
use air_quality_pipeline::analyzers::types::{CleanedMeasurement, DailyAggregate};
use air_quality_pipeline::output::{read_aggregates, save_daily_aggregates};
use air_quality_pipeline::parser::{parse_csv, parse_json_results};
use air_quality_pipeline::pipeline::{process_file, process_table};
use air_quality_pipeline::{PipelineError, calculate_aqi};
use chrono::NaiveDate;
use std::path::{Path, PathBuf};

const FIXTURE: &str = "tests/fixtures/charlotte_raw.csv";

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 10, d).unwrap()
}

fn temp_path(name: &str) -> PathBuf {
    std::env::temp_dir().join(name)
}

#[test]
fn test_full_pipeline() {
    let output = process_file(FIXTURE).expect("Failed to process fixture");

    assert_eq!(output.stats.input_rows, 10);
    assert_eq!(output.stats.duplicate_rows, 1);
    assert_eq!(output.stats.missing_fields, 1);
    assert_eq!(output.stats.invalid_timestamps, 1);
    assert_eq!(output.stats.cleaned_rows, 7);

    let keys: Vec<(NaiveDate, &str)> = output
        .aggregates
        .iter()
        .map(|a| (a.date, a.parameter.as_str()))
        .collect();
    assert_eq!(
        keys,
        vec![
            (day(25), "no2"),
            (day(25), "pm25"),
            (day(26), "no2"),
            (day(26), "o3"),
            (day(26), "pm25"),
        ]
    );

    // Rows without city, value or a valid timestamp never reach the mean.
    let pm25 = &output.aggregates[1];
    assert_eq!(pm25.value, 13.75);
    assert_eq!(pm25.city, "Charlotte");
    assert_eq!(pm25.country, "US");
    assert_eq!(pm25.unit, "µg/m³");
    assert_eq!(pm25.aqi, Some(54.5));

    let no2 = &output.aggregates[2];
    let aqi = no2.aqi.unwrap();
    assert!((101.0..=150.0).contains(&aqi));

    assert_eq!(output.aggregates[3].aqi, None); // o3: no table
    assert_eq!(output.aggregates[4].aqi, None); // pm25 600: above the top band
}

#[test]
fn test_dotted_and_underscored_timestamp_columns_agree() {
    let original = std::fs::read_to_string(FIXTURE).unwrap();
    let renamed = original.replacen("date.utc", "date_utc", 1);
    assert_ne!(original, renamed);

    let path = temp_path("air_quality_pipeline_it_underscored.csv");
    std::fs::write(&path, renamed).unwrap();

    let dotted = process_file(FIXTURE).unwrap();
    let underscored = process_file(&path).unwrap();
    assert_eq!(dotted.aggregates, underscored.aggregates);

    std::fs::remove_file(&path).unwrap();
}

#[test]
fn test_missing_input_is_surfaced() {
    let path = Path::new("tests/fixtures/does_not_exist.csv");
    match process_file(path) {
        Err(PipelineError::InputNotFound(p)) => assert_eq!(p, path),
        other => panic!("expected InputNotFound, got {other:?}"),
    }
}

#[test]
fn test_json_payload_matches_csv() {
    let body = r#"{"results": [
        {"city": "Charlotte", "country": "US", "parameter": "pm25", "value": 12.5,
         "unit": "µg/m³", "date": {"utc": "2025-10-25T00:00:00Z"}},
        {"city": "Charlotte", "country": "US", "parameter": "pm25", "value": 15.0,
         "unit": "µg/m³", "date": {"utc": "2025-10-25T01:00:00Z"}}
    ]}"#;
    let csv = "city,country,parameter,value,unit,date.utc\n\
               Charlotte,US,pm25,12.5,µg/m³,2025-10-25T00:00:00Z\n\
               Charlotte,US,pm25,15.0,µg/m³,2025-10-25T01:00:00Z\n";

    let from_json = process_table(&parse_json_results(body.as_bytes()).unwrap());
    let from_csv = process_table(&parse_csv(csv.as_bytes()).unwrap());

    assert_eq!(from_json.aggregates.len(), 1);
    assert_eq!(from_json.aggregates, from_csv.aggregates);
    assert_eq!(from_json.aggregates[0].aqi, calculate_aqi("pm25", 13.75));
}

#[test]
fn test_saved_output_reaggregates_unchanged() {
    let output = process_file(FIXTURE).unwrap();

    let dir = temp_path("air_quality_pipeline_it_processed");
    let _ = std::fs::remove_dir_all(&dir);
    let path = save_daily_aggregates(&dir, "Charlotte", &output.aggregates).unwrap();

    let saved: Vec<DailyAggregate> = read_aggregates(&path).unwrap();
    assert_eq!(saved, output.aggregates);

    let replay: Vec<CleanedMeasurement> = saved.iter().map(DailyAggregate::to_measurement).collect();
    assert_eq!(aggregate_daily(&replay), saved);

    std::fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn test_empty_raw_file_yields_no_aggregates() {
    let path = temp_path("air_quality_pipeline_it_header_only.csv");
    std::fs::write(&path, "city,country,parameter,value,unit,date.utc\n").unwrap();

    let output = process_file(&path).unwrap();
    assert!(output.aggregates.is_empty());
    assert_eq!(output.stats.input_rows, 0);

    std::fs::remove_file(&path).unwrap();
}
