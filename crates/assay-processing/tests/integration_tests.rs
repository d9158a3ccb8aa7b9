//! Integration tests for the assay analysis workflow.
//!
//! These tests run the public API end to end over the CSV fixtures.

use assay_processing::{
    AnalysisConfig, AssayError, AssayTable, DataCleaner, Exporter, GeochemicalAnalyzer,
    GradeColumn, MissingValueStrategy, OutlierMethod, QualityValidator, ReportGenerator,
    load_assay_data,
};
use pretty_assertions::assert_eq;
use std::path::PathBuf;

// ============================================================================
// Helper Functions
// ============================================================================

fn fixtures_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn load_fixture(filename: &str) -> AssayTable {
    load_assay_data(fixtures_path().join(filename))
        .expect("Failed to read CSV file")
        .expect("Fixture file exists")
}

fn assays() -> AssayTable {
    load_fixture("geochemical_assays.csv")
}

// ============================================================================
// Loading
// ============================================================================

#[test]
fn test_load_fixture_schema() {
    let table = assays();
    assert_eq!(table.height(), 20);
    assert!(table.missing_schema_columns().is_empty());
    for name in GradeColumn::names() {
        assert!(table.is_numeric_column(name), "{name} should be numeric");
    }
}

#[test]
fn test_load_missing_file_is_absent() {
    let result = load_assay_data(fixtures_path().join("nonexistent.csv")).unwrap();
    assert!(result.is_none());
}

#[test]
fn test_load_typed_records() {
    let records = assays().records().unwrap();
    assert_eq!(records[0].sample_id.as_deref(), Some("TEST-0001"));
    assert_eq!(records[0].au_ppm, Some(0.5));
    assert_eq!(records[4].au_ppm, None);
    assert_eq!(records[19].interval_length(), Some(5.0));
}

// ============================================================================
// Quality Validation
// ============================================================================

#[test]
fn test_quality_report_on_fixture() {
    let report = QualityValidator::validate(&assays()).unwrap();
    assert_eq!(report.total_rows, 20);
    assert_eq!(report.total_missing(), 5);
    assert!(report.duplicate_ids.is_empty());
    assert_eq!(report.invalid_depths, 0);
    assert_eq!(report.rejected_samples, 3);
    assert!(report.issues_found);
}

#[test]
fn test_quality_report_on_dirty_data() {
    let report = QualityValidator::validate(&load_fixture("dirty_assays.csv")).unwrap();
    assert_eq!(report.total_rows, 5);
    assert_eq!(report.missing_values["Au_ppm"], 1);
    assert_eq!(report.missing_values["Cu_pct"], 1);
    assert_eq!(report.missing_values["Ag_ppm"], 1);
    assert_eq!(report.duplicate_ids, vec!["D-002".to_string()]);
    assert_eq!(report.negative_values["Au_ppm"], 1);
    // One equal-depth interval and one inverted interval
    assert_eq!(report.invalid_depths, 2);
    assert_eq!(report.rejected_samples, 1);
    assert!(report.issues_found);
}

// ============================================================================
// Cleaning
// ============================================================================

#[test]
fn test_clean_then_filter_then_analyse() {
    let table = assays();
    let filled =
        DataCleaner::handle_missing_values(&table, MissingValueStrategy::Median, None).unwrap();
    let good = GeochemicalAnalyzer::filter_by_quality(&filled, "Good").unwrap();
    let stats = GeochemicalAnalyzer::element_statistics(&good, "Au_ppm").unwrap();

    assert_eq!(good.height(), 12);
    assert_eq!(stats.count, 12);
    assert!(stats.mean.unwrap() > 0.0);
}

#[test]
fn test_standardize_dirty_lithology() {
    let table = DataCleaner::standardize_lithology_names(&load_fixture("dirty_assays.csv")).unwrap();
    let names: Vec<String> = table
        .text_values("lithology")
        .unwrap()
        .into_iter()
        .flatten()
        .collect();
    assert_eq!(
        names,
        vec!["Granite", "Granite", "Basalt", "Mafic Volcanic", "Basalt"]
    );
}

#[test]
fn test_outliers_then_anomalies() {
    let table = assays();
    let trimmed =
        DataCleaner::remove_outliers(&table, "Au_ppm", OutlierMethod::Iqr, 1.5).unwrap();
    assert!(trimmed.height() < table.height());
    // Missing Au rows survive outlier rejection
    assert_eq!(trimmed.missing_count("Au_ppm").unwrap(), 2);

    let before = GeochemicalAnalyzer::detect_anomalies(&table, "Au_ppm", 2.0).unwrap();
    assert!(before.height() >= 1);
}

#[test]
fn test_compositing_fixture() {
    let with_lengths = DataCleaner::calculate_sample_interval(&assays()).unwrap();
    let composited = DataCleaner::merge_adjacent_samples(&with_lengths, "Au_ppm", 0.5).unwrap();

    assert_eq!(composited.height(), 20);
    assert!(composited.has_column("interval_length"));
    assert!(composited.has_column("composite_Au_ppm"));

    // Every 5 m interval in a hole touches the next, so each hole is one composite
    let ids = composited.numeric_values("composite_id").unwrap();
    assert_eq!(ids[0], Some(1.0));
    assert_eq!(ids[19], Some(2.0));

    // Equal interval lengths make the composite grade the plain mean of the hole
    let hole_one: Vec<f64> = assays().numeric_values("Au_ppm").unwrap()[..10]
        .iter()
        .flatten()
        .copied()
        .collect();
    let expected = hole_one.iter().sum::<f64>() / hole_one.len() as f64;
    let grade = composited.numeric_values("composite_Au_ppm").unwrap()[0].unwrap();
    assert!((grade - expected).abs() < 1e-9);
}

#[test]
fn test_depth_filter_fixture() {
    let shallow = DataCleaner::filter_by_depth_range(&assays(), None, Some(20.0)).unwrap();
    assert_eq!(shallow.height(), 8);
}

// ============================================================================
// Export
// ============================================================================

#[test]
fn test_csv_export_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cleaned.csv");
    let table = assays();

    assert!(Exporter::export(&table, &path, "csv").unwrap());
    let reloaded = load_assay_data(&path).unwrap().unwrap();

    assert_eq!(reloaded.height(), table.height());
    assert_eq!(reloaded.column_names(), table.column_names());
    assert_eq!(
        reloaded.numeric_values("Au_ppm").unwrap(),
        table.numeric_values("Au_ppm").unwrap()
    );
    assert_eq!(
        reloaded.text_values("sample_id").unwrap(),
        table.text_values("sample_id").unwrap()
    );
}

#[test]
fn test_excel_export_overwrites() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cleaned.xlsx");
    std::fs::write(&path, b"stale").unwrap();

    assert!(Exporter::export(&assays(), &path, "excel").unwrap());
    let bytes = std::fs::read(&path).unwrap();
    // Zip local file header
    assert_eq!(&bytes[..2], b"PK");
}

#[test]
fn test_export_unknown_format() {
    let dir = tempfile::tempdir().unwrap();
    let err = Exporter::export(&assays(), dir.path().join("x.json"), "json").unwrap_err();
    assert!(matches!(err, AssayError::InvalidArgument(_)));
}

// ============================================================================
// Reports
// ============================================================================

#[test]
fn test_variant_config_drives_report() {
    let config = AnalysisConfig::from_variant_json(
        r#"{"parameters": {"primary_element": "Cu", "secondary_elements": ["Au", "Ag"],
            "quality_filter": "Fair", "anomaly_threshold_multiplier": 1.0}}"#,
    )
    .unwrap();

    let table = assays();
    let cleaned = DataCleaner::apply_config(&table, &config).unwrap();
    let report =
        ReportGenerator::build_analysis_report("geochemical_assays.csv", None, &table, &cleaned, &config)
            .unwrap();

    assert_eq!(report.processing_summary.primary_element, "Cu_pct");
    assert_eq!(report.processing_summary.rows_analyzed, 5);
    let keys: Vec<_> = report.summary.keys().cloned().collect();
    assert_eq!(keys, vec!["Cu_pct", "Au_ppm", "Ag_ppm"]);
    assert_eq!(report.correlations.len(), 3);

    // The Fair samples are DH-02 10-35 m with no gaps
    assert_eq!(report.composites.len(), 1);
    let composite = &report.composites[0];
    assert_eq!(composite.hole_id.as_deref(), Some("DH-02"));
    assert_eq!((composite.from_depth, composite.to_depth), (Some(10.0), Some(35.0)));
    assert_eq!(composite.samples, 5);
}

#[test]
fn test_report_file_written() {
    let dir = tempfile::tempdir().unwrap();
    let config = AnalysisConfig::builder()
        .output_dir(dir.path())
        .build()
        .unwrap();
    let table = assays();
    let report =
        ReportGenerator::build_analysis_report("geochemical_assays.csv", None, &table, &table, &config)
            .unwrap();

    let generator = ReportGenerator::new(config.output_dir.clone());
    let path = generator
        .write_report_to_file(&report, "geochemical_assays")
        .unwrap();
    assert!(path.ends_with("geochemical_assays_report.json"));

    let json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(json["quality"]["rejected_samples"], 3);
    assert!(json["summary"]["Au_ppm"]["anomaly_count"].is_u64());
}

#[test]
fn test_weighted_mean_on_dirty_intervals() {
    // Lengths 2, 2, 0, -1 and 1.5; the zero and inverted intervals carry no
    // weight and the last row has no Au value
    let table = load_fixture("dirty_assays.csv");
    let mean = GeochemicalAnalyzer::interval_weighted_mean(&table, "Au_ppm").unwrap();
    assert!((mean - 0.3).abs() < 1e-12);
}

#[test]
fn test_correlation_undefined_is_distinct_from_zero() {
    let table = load_fixture("dirty_assays.csv");
    let constant = DataCleaner::filter_by_depth_range(&table, Some(6.0), None).unwrap();
    assert_eq!(constant.height(), 1);

    let err = GeochemicalAnalyzer::correlate_elements(&constant, "Au_ppm", "Fe_pct").unwrap_err();
    assert!(err.is_undefined());
    assert_eq!(err.error_code(), "UNDEFINED");
}
