//! Geochemical Assay Processing Library
//!
//! Cleaning, validation and statistical analysis of drill-hole assay tables,
//! built with Rust and Polars.
//!
//! # Overview
//!
//! This library provides:
//!
//! - **Loading**: CSV assay tables with null-token handling and numeric coercion
//! - **Quality Validation**: missing values, duplicate ids, negative grades,
//!   inverted depth intervals and rejected samples
//! - **Data Cleaning**: missing value strategies, IQR / z-score outlier
//!   rejection, lithology normalisation, depth filtering and compositing
//! - **Analysis**: element statistics, threshold anomalies, Pearson
//!   correlation, interval-weighted means and grouped statistics
//! - **Reporting**: per-element summaries and full JSON analysis reports
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use assay_processing::{AnalysisConfig, DataCleaner, GeochemicalAnalyzer, MissingValueStrategy};
//! use assay_processing::{QualityValidator, ReportGenerator, load_assay_data};
//!
//! let Some(table) = load_assay_data("data/geochemical_assays.csv")? else {
//!     return Ok(());
//! };
//!
//! let quality = QualityValidator::validate(&table)?;
//! println!("Issues found: {}", quality.issues_found);
//!
//! let cleaned = DataCleaner::handle_missing_values(&table, MissingValueStrategy::Median, None)?;
//! let good = GeochemicalAnalyzer::filter_by_quality(&cleaned, "Good")?;
//! let anomalies = GeochemicalAnalyzer::detect_anomalies(&good, "Au_ppm", 2.5)?;
//!
//! let config = AnalysisConfig::default();
//! let summary = ReportGenerator::generate_summary_report(&good, &["Au_ppm", "Cu_pct"], &config)?;
//! ```
//!
//! # Undefined results
//!
//! Correlations over zero-variance data and weighted means over zero total
//! length return [`AssayError::Undefined`] rather than NaN, so a caller can
//! tell "the value is 0" apart from "there is no value".

pub mod analysis;
pub mod cleaner;
pub mod config;
pub mod error;
pub mod loader;
pub mod quality;
pub mod reporting;
pub mod schema;
pub mod table;
pub mod utils;

#[cfg(test)]
mod test_support;

// Re-export main types for convenience
pub use analysis::{
    ElementCorrelation, ElementStatistics, GeochemicalAnalyzer, GroupStatistics,
};
pub use cleaner::{DataCleaner, ExportFormat, Exporter, MissingValueStrategy, OutlierMethod};
pub use config::{
    AnalysisConfig, AnalysisConfigBuilder, ConfigValidationError, VariantConfig,
    DEFAULT_ANOMALY_THRESHOLD_MULTIPLIER, DEFAULT_COMPOSITE_MAX_GAP, DEFAULT_IQR_THRESHOLD,
    DEFAULT_SUMMARY_ANOMALY_MULTIPLIER, DEFAULT_ZSCORE_THRESHOLD,
};
pub use error::{AssayError, Result as AssayResult, ResultExt};
pub use loader::{load_assay_data, load_assay_data_from_reader};
pub use quality::{QualityReport, QualityValidator};
pub use reporting::{
    AnalysisReport, AnomalousSample, CompositeInterval, ElementSummary, ProcessingSummary,
    ReportGenerator, SummaryReport,
};
pub use schema::{AssayColumn, GradeColumn};
pub use table::{AssayRecord, AssayTable};
