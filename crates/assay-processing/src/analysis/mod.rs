//! Statistical analysis of assay tables.
//!
//! - [`statistics`]: descriptive statistics over measured values
//! - [`analyzer`]: quality filtering, anomalies, correlation, weighting and grouping

pub mod analyzer;
pub mod statistics;

pub use analyzer::{ElementCorrelation, GeochemicalAnalyzer, GroupStatistics};
pub use statistics::ElementStatistics;
