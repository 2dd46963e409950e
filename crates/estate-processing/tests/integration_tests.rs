//! Integration tests for the listings pipeline.
//!
//! These tests run the whole pipeline over a small listings export with
//! missing values in every column that has a fill rule.

use chrono::Datelike;
use estate_processing::analysis::center_mask;
use estate_processing::utils::{f64_values, string_values};
use estate_processing::{
    ListingLoader, Pipeline, PipelineConfig, PipelineResult, PipelineStage, ProcessingError,
    listing_dates,
};
use pretty_assertions::assert_eq;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

// ============================================================================
// Helper Functions
// ============================================================================

fn fixtures_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn sample_path() -> PathBuf {
    fixtures_path().join("listings_sample.tsv")
}

fn run_default() -> PipelineResult {
    Pipeline::builder()
        .build()
        .unwrap()
        .process_file(&sample_path())
        .expect("Pipeline should succeed on the sample")
}

/// Observed range of `values` over the rows selected by `member`.
fn observed_range(values: &[Option<f64>], member: impl Fn(usize) -> bool) -> Option<(f64, f64)> {
    values
        .iter()
        .enumerate()
        .filter(|(i, _)| member(*i))
        .filter_map(|(_, v)| *v)
        .fold(None, |acc, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
}

// ============================================================================
// Pipeline Properties
// ============================================================================

#[test]
fn test_no_missing_values_after_cleaning() {
    let result = run_default();

    assert_eq!(result.data.height(), 24);
    assert_eq!(result.data.width(), 29);
    for column in result.data.get_columns() {
        assert_eq!(column.null_count(), 0, "column '{}' has nulls", column.name());
    }

    assert!(result.summary.missing_before > 0);
    assert_eq!(result.summary.missing_after, 0);
    assert_eq!(result.profile.total_missing, result.summary.missing_before);
    assert_eq!(result.summary.fill_percentage(), 100.0);
}

#[test]
fn test_grouped_fills_stay_within_group_range() {
    let raw = ListingLoader::default().load_file(&sample_path()).unwrap();
    let dates = listing_dates(&raw, "%Y-%m-%dT%H:%M:%S").unwrap();
    let result = run_default();

    // days_exposition: same year and month, else same year
    let raw_days = f64_values(&raw, "days_exposition").unwrap();
    let days = f64_values(&result.data, "days_exposition").unwrap();
    let mut checked = 0;
    for row in (0..raw.height()).filter(|i| raw_days[*i].is_none()) {
        let (year, month) = (dates[row].year(), dates[row].month());
        let range = observed_range(&raw_days, |i| {
            dates[i].year() == year && dates[i].month() == month
        })
        .or_else(|| observed_range(&raw_days, |i| dates[i].year() == year))
        .expect("every gap has an observed group");

        let filled = days[row].unwrap();
        assert!(filled >= range.0 && filled <= range.1, "row {}: {}", row, filled);
        checked += 1;
    }
    assert_eq!(checked, 4);

    // living_area: same total_area, else same room count
    let raw_living = f64_values(&raw, "living_area").unwrap();
    let areas = f64_values(&raw, "total_area").unwrap();
    let rooms = f64_values(&raw, "rooms").unwrap();
    let living = f64_values(&result.data, "living_area").unwrap();
    for row in (0..raw.height()).filter(|i| raw_living[*i].is_none()) {
        let range = observed_range(&raw_living, |i| areas[i] == areas[row])
            .or_else(|| observed_range(&raw_living, |i| rooms[i] == rooms[row]))
            .expect("every gap has an observed group");

        let filled = living[row].unwrap();
        assert!(filled >= range.0 && filled <= range.1, "row {}: {}", row, filled);
    }
}

#[test]
fn test_floor_kind_classification() {
    let result = run_default();

    let floors = f64_values(&result.data, "floor").unwrap();
    let totals = f64_values(&result.data, "floors_total").unwrap();
    let kinds = string_values(&result.data, "floor_kind").unwrap();

    for row in 0..result.data.height() {
        let floor = floors[row].unwrap() as i64;
        let total = totals[row].unwrap() as i64;
        let expected = if floor == 1 {
            "first"
        } else if floor == total {
            "last"
        } else {
            "other"
        };
        assert_eq!(kinds[row].as_deref(), Some(expected), "row {}", row);
    }

    // first row: 8th of 16 floors, second row: ground floor, 13th row: top floor
    assert_eq!(kinds[0].as_deref(), Some("other"));
    assert_eq!(kinds[1].as_deref(), Some("first"));
    assert_eq!(kinds[12].as_deref(), Some("last"));
}

#[test]
fn test_square_meter_price_is_exact() {
    let result = run_default();

    let prices = f64_values(&result.data, "last_price").unwrap();
    let areas = f64_values(&result.data, "total_area").unwrap();
    let per_meter = f64_values(&result.data, "square_meter_price").unwrap();

    for row in 0..result.data.height() {
        assert_eq!(
            per_meter[row],
            Some(prices[row].unwrap() / areas[row].unwrap()),
            "row {}",
            row
        );
    }
}

#[test]
fn test_pipeline_is_idempotent_on_its_output() {
    let pipeline = Pipeline::builder().build().unwrap();
    let first = pipeline.process_file(&sample_path()).unwrap();
    let second = pipeline.process(first.data.clone()).unwrap();

    assert!(second.data.equals_missing(&first.data));
    assert_eq!(second.summary.total_filled(), 0);
    assert_eq!(second.summary.missing_before, 0);
    assert_eq!(
        second.report.center.center.listings,
        first.report.center.center.listings
    );
}

#[test]
fn test_center_filter_selects_city_rows_below_threshold() {
    let config = PipelineConfig::default();
    let result = run_default();

    let localities = string_values(&result.data, "locality_name").unwrap();
    let distances = f64_values(&result.data, "cityCenters_nearest").unwrap();
    let expected: Vec<bool> = localities
        .iter()
        .zip(&distances)
        .map(|(locality, distance)| {
            let distance = distance.unwrap();
            locality.as_deref() == Some("санкт-петербург")
                && distance != config.sentinel
                && distance < 7500.0
        })
        .collect();

    assert_eq!(center_mask(&result.data, &config).unwrap(), expected);
    assert_eq!(expected.iter().filter(|m| **m).count(), 5);
    assert_eq!(result.report.center.center.listings, 5);
    assert_eq!(result.report.center.city.listings, 14);
    // 7500 m exactly is outside the center
    assert!(!expected[16]);
    assert!(expected[19]);
}

#[test]
fn test_center_locality_matches_without_config_builder() {
    let config = PipelineConfig {
        center_locality: "Санкт-Петербург".to_string(),
        ..PipelineConfig::default()
    };
    let result = Pipeline::builder()
        .config(config.clone())
        .build()
        .unwrap()
        .process_file(&sample_path())
        .unwrap();

    assert_eq!(result.report.center.locality, "санкт-петербург");
    assert_eq!(result.report.center.city.listings, 14);
    assert_eq!(result.report.center.center.listings, 5);
    assert_eq!(
        center_mask(&result.data, &config)
            .unwrap()
            .iter()
            .filter(|m| **m)
            .count(),
        5
    );
}

// ============================================================================
// Analysis Results
// ============================================================================

#[test]
fn test_sanitize_normalizes_localities_and_prices() {
    let result = run_default();

    let localities = string_values(&result.data, "locality_name").unwrap();
    assert_eq!(localities[21].as_deref(), Some("санкт-петербург"));
    assert_eq!(localities[22].as_deref(), Some("undefined"));

    let prices = f64_values(&result.data, "last_price").unwrap();
    assert!(prices.iter().all(|p| p.unwrap() > 0.0));
}

#[test]
fn test_locality_summary() {
    let result = run_default();
    let localities = &result.report.localities;

    assert_eq!(localities.localities, 10);
    assert_eq!(localities.top[0].locality, "санкт-петербург");
    assert_eq!(localities.top[0].listings, 14);
    assert!(localities.highest.is_some());
    assert!(localities.lowest.is_some());
}

#[test]
fn test_analysis_report_shape() {
    let result = run_default();
    let report = &result.report;

    assert_eq!(report.rows, 24);
    assert_eq!(report.price_factors.len(), 7);
    assert_eq!(report.center.comparison.len(), 8 + 5);
    assert_eq!(report.histograms.len(), 14);
    assert!(report.listing_duration.median_days.is_some());

    let per_meter = report
        .price_factors
        .iter()
        .find(|f| f.column == "square_meter_price")
        .unwrap();
    assert!(per_meter.correlation.unwrap() > 0.0);
}

// ============================================================================
// Errors
// ============================================================================

#[test]
fn test_missing_columns_are_reported() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.tsv");
    std::fs::write(&path, "last_price\ttotal_area\n1000000\t30\n").unwrap();

    let err = Pipeline::builder()
        .build()
        .unwrap()
        .process_file(&path)
        .unwrap_err();

    match err {
        ProcessingError::MissingColumns(columns) => {
            assert_eq!(columns.len(), 20);
            assert!(columns.contains(&"first_day_exposition".to_string()));
        }
        other => panic!("unexpected error: {}", other),
    }
}

#[test]
fn test_invalid_date_reports_row() {
    let content = std::fs::read_to_string(sample_path()).unwrap();
    let broken = content.replacen("2015-08-20T00:00:00", "yesterday", 1);

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("dates.tsv");
    std::fs::write(&path, broken).unwrap();

    let err = Pipeline::builder()
        .build()
        .unwrap()
        .process_file(&path)
        .unwrap_err();

    match err {
        ProcessingError::InvalidDate { row, value } => {
            assert_eq!(row, 2);
            assert_eq!(value, "yesterday");
        }
        other => panic!("unexpected error: {}", other),
    }
}

// ============================================================================
// Outputs and Progress
// ============================================================================

#[test]
fn test_report_and_cleaned_table_are_written() {
    let dir = tempfile::tempdir().unwrap();
    let config = PipelineConfig::builder()
        .output_dir(dir.path())
        .output_name("sample")
        .emit_report(true)
        .save_cleaned(true)
        .build()
        .unwrap();

    let result = Pipeline::builder()
        .config(config)
        .build()
        .unwrap()
        .process_file(&sample_path())
        .unwrap();

    let report_path = dir.path().join("sample_report.json");
    let cleaned_path = dir.path().join("sample_cleaned.csv");
    assert_eq!(result.summary.output_files.len(), 2);
    assert!(report_path.exists());
    assert!(cleaned_path.exists());

    let json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&report_path).unwrap()).unwrap();
    assert_eq!(json["analysis"]["rows"], 24);
    assert_eq!(json["configuration"]["center_threshold"], 7500.0);

    // the cleaned table loads again and needs no filling
    let again = Pipeline::builder()
        .build()
        .unwrap()
        .process_file(&cleaned_path)
        .unwrap();
    assert_eq!(again.summary.total_filled(), 0);
    assert_eq!(again.data.height(), 24);
}

#[test]
fn test_progress_is_monotonic_and_completes() {
    let updates = Arc::new(Mutex::new(Vec::new()));
    let updates_clone = updates.clone();

    Pipeline::builder()
        .on_progress(move |update| updates_clone.lock().unwrap().push(update))
        .build()
        .unwrap()
        .process_file(&sample_path())
        .unwrap();

    let updates = updates.lock().unwrap();
    assert_eq!(updates.first().map(|u| u.stage), Some(PipelineStage::Loading));
    assert_eq!(updates.last().map(|u| u.stage), Some(PipelineStage::Complete));
    for pair in updates.windows(2) {
        assert!(
            pair[1].progress + 1e-6 >= pair[0].progress,
            "{:?} -> {:?}",
            pair[0].stage,
            pair[1].stage
        );
    }
    assert!(
        updates
            .iter()
            .any(|u| u.stage == PipelineStage::Imputation && u.items_total.is_some())
    );
}
