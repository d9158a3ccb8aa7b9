//! Report generation module.
//!
//! This module composes analysis results into serializable snapshots:
//!
//! - [`SummaryReport`]: per-element statistics, missing and anomaly counts
//! - [`AnalysisReport`]: everything a run produces, for `--json` output and
//!   `--emit-report` files
//! - [`CompositeInterval`]: adjacent-sample composites of the primary element
//!
//! # Example
//!
//! ```rust,ignore
//! use assay_processing::reporting::ReportGenerator;
//!
//! let report = ReportGenerator::build_analysis_report("assays.csv", None, &table, &cleaned, &config)?;
//! println!("{}", serde_json::to_string_pretty(&report)?);
//!
//! let generator = ReportGenerator::new(PathBuf::from("output"));
//! generator.write_report_to_file(&report, "assays")?;
//! ```

mod generator;

pub use generator::{
    AnalysisReport, AnomalousSample, CompositeInterval, ElementSummary, ProcessingSummary,
    ReportGenerator, SummaryReport,
};
