//! Outlier rejection by IQR fences or z-score bounds.

use tracing::debug;

use super::OutlierMethod;
use crate::analysis::ElementStatistics;
use crate::error::{AssayError, Result};
use crate::table::AssayTable;

pub(super) fn remove_outliers(
    table: &AssayTable,
    column: &str,
    method: OutlierMethod,
    threshold: f64,
) -> Result<AssayTable> {
    if !(threshold.is_finite() && threshold >= 0.0) {
        return Err(AssayError::InvalidArgument(format!(
            "outlier threshold must be finite and non-negative, got {threshold}"
        )));
    }

    let stats = ElementStatistics::from_chunked(&table.float_column(column)?)?;
    let Some((lower_bound, upper_bound)) = bounds(&stats, method, threshold) else {
        debug!("No spread in '{}', keeping all rows", column);
        return Ok(table.clone());
    };

    // Rows without a value are not outliers
    let keep: Vec<bool> = table
        .numeric_values(column)?
        .iter()
        .map(|v| v.is_none_or(|x| x >= lower_bound && x <= upper_bound))
        .collect();

    debug!(
        "Outlier bounds for '{}': [{:.4}, {:.4}]",
        column, lower_bound, upper_bound
    );
    table.filter_rows(&keep)
}

/// Inclusive bounds of accepted values, `None` when the spread is undefined.
fn bounds(stats: &ElementStatistics, method: OutlierMethod, threshold: f64) -> Option<(f64, f64)> {
    match method {
        OutlierMethod::Iqr => {
            let (q1, q3) = (stats.q25?, stats.q75?);
            let iqr = q3 - q1;
            Some((q1 - threshold * iqr, q3 + threshold * iqr))
        }
        OutlierMethod::ZScore => {
            let (mean, std) = (stats.mean?, stats.std?);
            Some((mean - threshold * std, mean + threshold * std))
        }
    }
}
