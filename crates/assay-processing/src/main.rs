//! Geochemical assay analysis CLI.

use anyhow::{Result, anyhow};
use assay_processing::{
    AnalysisConfig, AnalysisReport, AssayTable, DataCleaner, Exporter, GradeColumn,
    MissingValueStrategy, OutlierMethod, ReportGenerator, load_assay_data,
};
use clap::{Parser, ValueEnum};
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

/// Number of anomalies listed in the text summary.
const TOP_ANOMALIES: usize = 5;

/// CLI-compatible missing value strategy enum
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliMissingStrategy {
    /// Drop rows with any missing value
    Drop,
    /// Fill with each column's mean
    Mean,
    /// Fill with each column's median
    Median,
    /// Fill with zero
    Zero,
}

impl From<CliMissingStrategy> for MissingValueStrategy {
    fn from(cli: CliMissingStrategy) -> Self {
        match cli {
            CliMissingStrategy::Drop => MissingValueStrategy::Drop,
            CliMissingStrategy::Mean => MissingValueStrategy::Mean,
            CliMissingStrategy::Median => MissingValueStrategy::Median,
            CliMissingStrategy::Zero => MissingValueStrategy::Zero,
        }
    }
}

/// CLI-compatible outlier method enum
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliOutlierMethod {
    /// Interquartile range fences
    Iqr,
    /// Standard deviations from the mean
    Zscore,
}

impl From<CliOutlierMethod> for OutlierMethod {
    fn from(cli: CliOutlierMethod) -> Self {
        match cli {
            CliOutlierMethod::Iqr => OutlierMethod::Iqr,
            CliOutlierMethod::Zscore => OutlierMethod::ZScore,
        }
    }
}

/// CLI-compatible export format enum
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliExportFormat {
    Csv,
    Excel,
}

impl CliExportFormat {
    fn as_str(self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Excel => "excel",
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    version,
    about = "Geochemical drill-hole assay analysis",
    long_about = "Validate, clean and analyse geochemical assay data.\n\n\
                  EXAMPLES:\n  \
                  # Analyse gold in good-quality samples\n  \
                  assay-processing -i data/geochemical_assays.csv\n\n  \
                  # Use a variant parameter file\n  \
                  assay-processing -i data/geochemical_assays.csv --config variant_config.json\n\n  \
                  # Fill missing grades and export the cleaned table\n  \
                  assay-processing -i data/geochemical_assays.csv --clean median --export clean.xlsx --format excel"
)]
struct Args {
    /// Path to the assay CSV file
    #[arg(short, long)]
    input: String,

    /// Output directory for reports
    #[arg(short, long, default_value = "output")]
    output: String,

    /// Variant parameter file (JSON)
    ///
    /// Command line options override values from the file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Primary element, by symbol (Au) or column name (Au_ppm)
    #[arg(short, long)]
    element: Option<String>,

    /// Sample quality label to analyse
    #[arg(long)]
    quality: Option<String>,

    /// Anomaly threshold multiplier (k in mean + k·std)
    #[arg(short, long, allow_negative_numbers = true)]
    threshold: Option<f64>,

    /// Missing value strategy applied before analysis
    #[arg(long, value_enum)]
    clean: Option<CliMissingStrategy>,

    /// Outlier rejection on the primary element before analysis
    #[arg(long, value_enum)]
    outliers: Option<CliOutlierMethod>,

    /// Outlier threshold; defaults to 1.5 for iqr and 3.0 for zscore
    #[arg(long)]
    outlier_threshold: Option<f64>,

    /// Largest gap in metres between samples composited together
    #[arg(long)]
    composite_gap: Option<f64>,

    /// Export the cleaned table to this path
    #[arg(long)]
    export: Option<PathBuf>,

    /// Export format
    #[arg(long, value_enum, default_value = "csv")]
    format: CliExportFormat,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Suppress progress output (only show errors and final result)
    #[arg(short, long)]
    quiet: bool,

    /// Output JSON to stdout instead of human-readable summary
    ///
    /// Disables all progress logs; only outputs the final JSON report.
    #[arg(long)]
    json: bool,

    /// Write a detailed JSON report to the output directory
    ///
    /// The report will be saved as <input_name>_report.json
    #[arg(short = 'r', long)]
    emit_report: bool,
}

/// Initialize the tracing subscriber for logging.
///
/// When `json_output` is true, logging is completely disabled to ensure
/// only JSON is written to stdout.
fn init_logging(level: &str, quiet: bool, json_output: bool) {
    if json_output {
        return;
    }

    use tracing_subscriber::EnvFilter;

    let effective_level = if quiet { "warn" } else { level };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(effective_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(&args.log_level, args.quiet, args.json);

    let config = build_config(&args)?;

    info!("Loading assay data from: {}", args.input);
    let Some(table) = load_assay_data(&args.input)? else {
        return Err(anyhow!("Input file not found: {}", args.input));
    };

    let cleaned = DataCleaner::apply_config(&table, &config)?;

    let exported = match &args.export {
        Some(path) => export_table(&cleaned, path, args.format)?,
        None => None,
    };

    let report = ReportGenerator::build_analysis_report(
        &args.input,
        exported.as_deref(),
        &table,
        &cleaned,
        &config,
    )?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    if args.emit_report {
        let generator = ReportGenerator::new(config.output_dir.clone());
        let report_path = generator.write_report_to_file(&report, &extract_file_stem(&args.input))?;
        info!("Report written to: {}", report_path.display());
    }

    print_human_readable_summary(&report, &table);
    Ok(())
}

/// Build the run configuration: variant file first, then command line overrides.
fn build_config(args: &Args) -> Result<AnalysisConfig> {
    let base = match &args.config {
        Some(path) => {
            info!("Reading variant configuration from {}", path.display());
            AnalysisConfig::from_variant_file(path)?
        }
        None => AnalysisConfig::default(),
    };

    let mut builder = AnalysisConfig::builder()
        .primary_element(base.primary_element)
        .elements(base.elements)
        .quality_filter(base.quality_filter)
        .anomaly_threshold_multiplier(base.anomaly_threshold_multiplier)
        .summary_anomaly_multiplier(base.summary_anomaly_multiplier)
        .composite_max_gap(base.composite_max_gap)
        .output_dir(&args.output);

    if let Some(symbol) = &args.element {
        let element: GradeColumn = symbol.parse()?;
        builder = builder.primary_element(element);
    }
    if let Some(quality) = &args.quality {
        builder = builder.quality_filter(quality);
    }
    if let Some(k) = args.threshold {
        builder = builder.anomaly_threshold_multiplier(k);
    }
    if let Some(gap) = args.composite_gap {
        builder = builder.composite_max_gap(gap);
    }
    if let Some(strategy) = args.clean {
        builder = builder.missing_strategy(strategy.into());
    }
    if let Some(method) = args.outliers {
        builder = builder.outlier_method(method.into());
    }
    if let Some(threshold) = args.outlier_threshold {
        if args.outliers.is_none() {
            warn!("--outlier-threshold has no effect without --outliers");
        }
        builder = builder.outlier_threshold(threshold);
    }

    Ok(builder.build()?)
}

/// Export the cleaned table. Returns the written path, or `None` if the write failed.
fn export_table(table: &AssayTable, path: &Path, format: CliExportFormat) -> Result<Option<String>> {
    if Exporter::export(table, path, format.as_str())? {
        Ok(Some(path.display().to_string()))
    } else {
        error!("Export to {} failed; continuing with analysis", path.display());
        Ok(None)
    }
}

/// Extract the file stem (name without extension) from a path.
fn extract_file_stem(path: &str) -> String {
    Path::new(path)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("output")
        .to_string()
}

fn fmt_opt(value: Option<f64>, precision: usize) -> String {
    match value {
        Some(v) => format!("{:.*}", precision, v),
        None => "n/a".to_string(),
    }
}

fn print_human_readable_summary(report: &AnalysisReport, table: &AssayTable) {
    let summary = &report.processing_summary;
    let primary = summary.primary_element.as_str();

    println!("{}", "=".repeat(60));
    println!("Geochemical Data Analysis");
    println!("{}", "=".repeat(60));

    println!("\n--- Step 1: Loading Data ---");
    println!("Loaded {} assay records from {}", summary.rows_loaded, report.input_file);
    println!("Columns: {:?}", table.column_names());
    if summary.rows_cleaned != summary.rows_loaded {
        println!("Cleaning kept {} records", summary.rows_cleaned);
    }
    if let Some(ref output_file) = report.output_file {
        println!("Cleaned table exported to {}", output_file);
    }

    println!("\n--- Step 2: Data Quality Check ---");
    let quality = &report.quality;
    println!("Total rows: {}", quality.total_rows);
    println!("Missing values: {}", quality.total_missing());
    for (column, count) in quality.missing_values.iter().filter(|(_, c)| **c > 0) {
        println!("  {}: {}", column, count);
    }
    println!("Duplicate sample ids: {}", quality.duplicate_ids.len());
    println!("Negative grade values: {}", quality.total_negative());
    println!("Invalid depth intervals: {}", quality.invalid_depths);
    println!("Rejected samples: {}", quality.rejected_samples);
    if !quality.missing_columns.is_empty() {
        println!("Missing columns: {}", quality.missing_columns.join(", "));
    }
    println!("Issues found: {}", if quality.issues_found { "yes" } else { "no" });

    println!("\n--- Step 3: Quality Filtering ---");
    println!(
        "Filtered to {} '{}' quality samples",
        summary.rows_analyzed, summary.quality_filter
    );

    println!("\n--- Step 4: Element Statistics ---");
    if let Some(element) = report.summary.get(primary) {
        let s = &element.statistics;
        println!("\nStatistics for {}:", primary);
        println!("  count: {}", s.count);
        for (key, value) in [
            ("mean", s.mean),
            ("std", s.std),
            ("min", s.min),
            ("25%", s.q25),
            ("50%", s.median),
            ("75%", s.q75),
            ("max", s.max),
        ] {
            println!("  {}: {}", key, fmt_opt(value, 4));
        }
    }
    println!(
        "Interval-weighted mean: {}",
        fmt_opt(report.weighted_mean, 4)
    );

    println!("\n--- Step 5: Anomaly Detection ---");
    println!(
        "Threshold: {} (mean + {}·std)",
        fmt_opt(summary.anomaly_threshold, 4),
        summary.anomaly_threshold_multiplier
    );
    println!("Found {} anomalous samples", report.anomalies.len());
    if !report.anomalies.is_empty() {
        println!("\nTop anomalies:");
        for anomaly in report.anomalies.iter().take(TOP_ANOMALIES) {
            println!(
                "  {} ({}): {:.4}",
                anomaly.sample_id.as_deref().unwrap_or("?"),
                anomaly.hole_id.as_deref().unwrap_or("?"),
                anomaly.value
            );
        }
    }

    println!("\n--- Step 6: Element Correlations ---");
    println!("\nCorrelation matrix:");
    for pair in &report.correlations {
        println!(
            "  {} vs {}: {}",
            pair.element_a,
            pair.element_b,
            fmt_opt(pair.coefficient, 3)
        );
    }

    println!("\n--- Step 7: Grouped Statistics ---");
    println!("\n{} by lithology:", primary);
    for group in &report.by_lithology {
        println!(
            "  {}: n={} mean={}",
            group.group.as_deref().unwrap_or("(none)"),
            group.statistics.count,
            fmt_opt(group.statistics.mean, 4)
        );
    }
    println!("\n{} by hole:", primary);
    for group in &report.by_hole {
        println!(
            "  {}: n={} mean={}",
            group.group.as_deref().unwrap_or("(none)"),
            group.statistics.count,
            fmt_opt(group.statistics.mean, 4)
        );
    }

    println!(
        "\n{} composites (max gap {} m):",
        primary, summary.composite_max_gap
    );
    for composite in &report.composites {
        println!(
            "  {} {}-{} m: {} samples, grade={}",
            composite.hole_id.as_deref().unwrap_or("(none)"),
            fmt_opt(composite.from_depth, 1),
            fmt_opt(composite.to_depth, 1),
            composite.samples,
            fmt_opt(composite.grade, 4)
        );
    }

    println!("\n--- Step 8: Summary Report ---");
    for (element, entry) in &report.summary {
        println!("\n{}:", element);
        println!("    count: {}", entry.statistics.count);
        println!("    mean: {}", fmt_opt(entry.statistics.mean, 4));
        println!("    std: {}", fmt_opt(entry.statistics.std, 4));
        println!("    min: {}", fmt_opt(entry.statistics.min, 4));
        println!("    max: {}", fmt_opt(entry.statistics.max, 4));
        println!("    missing: {}", entry.missing);
        println!("    anomaly_count: {}", entry.anomaly_count);
    }

    println!("\n{}", "=".repeat(60));
    println!("Analysis Complete!");
    println!("{}", "=".repeat(60));
}
