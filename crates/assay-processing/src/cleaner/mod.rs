//! Data cleaning for assay tables.
//!
//! This module provides functionality for:
//! - Filling or dropping missing grade values
//! - Rejecting outliers by IQR or z-score
//! - Normalising lithology names
//! - Depth filtering, interval lengths and adjacent-sample compositing
//! - Exporting cleaned tables to CSV or a spreadsheet
//!
//! Every operation borrows its input and returns a new [`AssayTable`].

mod export;
mod imputation;
mod intervals;
mod lithology;
mod outliers;

pub use export::{ExportFormat, Exporter};
pub(crate) use intervals::interval_lengths;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::info;

use crate::config::{AnalysisConfig, DEFAULT_IQR_THRESHOLD, DEFAULT_ZSCORE_THRESHOLD};
use crate::error::{AssayError, Result};
use crate::table::AssayTable;

/// How missing values are handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MissingValueStrategy {
    /// Remove rows with a missing value in any target column.
    Drop,
    /// Fill with the column's own mean.
    Mean,
    /// Fill with the column's own median.
    Median,
    /// Fill with zero.
    Zero,
}

impl MissingValueStrategy {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Drop => "drop",
            Self::Mean => "mean",
            Self::Median => "median",
            Self::Zero => "zero",
        }
    }
}

impl fmt::Display for MissingValueStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MissingValueStrategy {
    type Err = AssayError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "drop" => Ok(Self::Drop),
            "mean" => Ok(Self::Mean),
            "median" => Ok(Self::Median),
            "zero" => Ok(Self::Zero),
            other => Err(AssayError::InvalidArgument(format!(
                "unknown missing value strategy '{other}' (expected drop, mean, median or zero)"
            ))),
        }
    }
}

/// Outlier rejection method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutlierMethod {
    /// Bounds at `Q1 - t·IQR` and `Q3 + t·IQR`.
    Iqr,
    /// Bounds at `mean ± t·std`.
    ZScore,
}

impl OutlierMethod {
    /// Conventional threshold for the method: 1.5 for IQR, 3.0 for z-score.
    pub fn default_threshold(self) -> f64 {
        match self {
            Self::Iqr => DEFAULT_IQR_THRESHOLD,
            Self::ZScore => DEFAULT_ZSCORE_THRESHOLD,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Iqr => "iqr",
            Self::ZScore => "zscore",
        }
    }
}

impl fmt::Display for OutlierMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OutlierMethod {
    type Err = AssayError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "iqr" => Ok(Self::Iqr),
            "zscore" | "z-score" => Ok(Self::ZScore),
            other => Err(AssayError::InvalidArgument(format!(
                "unknown outlier method '{other}' (expected iqr or zscore)"
            ))),
        }
    }
}

/// Cleaning operations over assay tables.
pub struct DataCleaner;

impl DataCleaner {
    /// Apply the cleaning steps a configuration asks for: the missing value
    /// strategy over all numeric columns, then outlier rejection on the
    /// primary element.
    pub fn apply_config(table: &AssayTable, config: &AnalysisConfig) -> Result<AssayTable> {
        let mut cleaned = table.clone();

        if let Some(strategy) = config.missing_strategy {
            cleaned = Self::handle_missing_values(&cleaned, strategy, None)?;
        }

        if let (Some(method), Some(threshold)) =
            (config.outlier_method, config.effective_outlier_threshold())
        {
            cleaned = Self::remove_outliers(
                &cleaned,
                config.primary_element.column_name(),
                method,
                threshold,
            )?;
        }

        Ok(cleaned)
    }

    /// Handle missing values in numeric columns.
    ///
    /// `columns = None` targets every numeric column; for
    /// [`MissingValueStrategy::Drop`] it targets every column, so any row with
    /// a gap is removed. Named columns that are not numeric are left untouched.
    /// Mean and median are computed per column from that column's own values.
    pub fn handle_missing_values(
        table: &AssayTable,
        strategy: MissingValueStrategy,
        columns: Option<&[&str]>,
    ) -> Result<AssayTable> {
        let result = imputation::handle_missing_values(table, strategy, columns)?;
        info!(
            "Missing values handled with '{}': {} -> {} rows",
            strategy,
            table.height(),
            result.height()
        );
        Ok(result)
    }

    /// Drop rows whose `column` value falls outside the method's bounds.
    ///
    /// Rows with no value in `column` are kept. `threshold` is used as given
    /// for the chosen method; see [`OutlierMethod::default_threshold`].
    pub fn remove_outliers(
        table: &AssayTable,
        column: &str,
        method: OutlierMethod,
        threshold: f64,
    ) -> Result<AssayTable> {
        let result = outliers::remove_outliers(table, column, method, threshold)?;
        info!(
            "Removed {} outliers from '{}' ({}, threshold {})",
            table.height() - result.height(),
            column,
            method,
            threshold
        );
        Ok(result)
    }

    /// Title-case every lithology name. Nulls pass through.
    pub fn standardize_lithology_names(table: &AssayTable) -> Result<AssayTable> {
        lithology::standardize_lithology_names(table)
    }

    /// Keep rows with `from_depth >= min_depth` and `to_depth <= max_depth`.
    /// Either bound may be omitted.
    pub fn filter_by_depth_range(
        table: &AssayTable,
        min_depth: Option<f64>,
        max_depth: Option<f64>,
    ) -> Result<AssayTable> {
        intervals::filter_by_depth_range(table, min_depth, max_depth)
    }

    /// Add or overwrite the `interval_length` column.
    pub fn calculate_sample_interval(table: &AssayTable) -> Result<AssayTable> {
        intervals::calculate_sample_interval(table)
    }

    /// Tag runs of adjacent samples within each hole with a composite id and
    /// their interval-weighted composite grade for `element`.
    pub fn merge_adjacent_samples(
        table: &AssayTable,
        element: &str,
        max_gap: f64,
    ) -> Result<AssayTable> {
        intervals::merge_adjacent_samples(table, element, max_gap)
    }
}
