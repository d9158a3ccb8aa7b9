//! Missing value handling.

use tracing::{debug, warn};

use polars::prelude::*;

use super::MissingValueStrategy;
use crate::error::{AssayError, Result};
use crate::table::AssayTable;

pub(super) fn handle_missing_values(
    table: &AssayTable,
    strategy: MissingValueStrategy,
    columns: Option<&[&str]>,
) -> Result<AssayTable> {
    let targets = target_columns(table, strategy, columns)?;

    match strategy {
        MissingValueStrategy::Drop => drop_missing_rows(table, &targets),
        MissingValueStrategy::Mean | MissingValueStrategy::Median | MissingValueStrategy::Zero => {
            fill_missing(table, strategy, &targets)
        }
    }
}

/// Resolve which columns a strategy applies to.
fn target_columns(
    table: &AssayTable,
    strategy: MissingValueStrategy,
    columns: Option<&[&str]>,
) -> Result<Vec<String>> {
    match columns {
        Some(columns) => {
            if let Some(absent) = columns.iter().find(|c| !table.has_column(c)) {
                return Err(AssayError::ColumnNotFound(absent.to_string()));
            }
            Ok(columns
                .iter()
                .filter(|c| {
                    let numeric = table.is_numeric_column(c);
                    if !numeric {
                        debug!("Skipping non-numeric column '{}'", c);
                    }
                    numeric
                })
                .map(|c| c.to_string())
                .collect())
        }
        None if strategy == MissingValueStrategy::Drop => Ok(table.column_names()),
        None => Ok(table.numeric_column_names()),
    }
}

fn drop_missing_rows(table: &AssayTable, targets: &[String]) -> Result<AssayTable> {
    let mut keep = vec![true; table.height()];
    for column in targets {
        for (flag, missing) in keep.iter_mut().zip(table.missing_mask(column)?) {
            *flag &= !missing;
        }
    }

    let result = table.filter_rows(&keep)?;
    debug!(
        "Dropped {} rows with missing values",
        table.height() - result.height()
    );
    Ok(result)
}

fn fill_missing(
    table: &AssayTable,
    strategy: MissingValueStrategy,
    targets: &[String],
) -> Result<AssayTable> {
    let mut result = table.clone();

    for column in targets {
        let values = table.float_column(column)?;
        let missing = values.null_count();
        if missing == 0 {
            continue;
        }

        let fill_value = match strategy {
            MissingValueStrategy::Mean => values.mean(),
            MissingValueStrategy::Median => values.median(),
            MissingValueStrategy::Zero => Some(0.0),
            MissingValueStrategy::Drop => None,
        };

        let Some(fill_value) = fill_value else {
            warn!(
                "Cannot fill '{}' by {}: column has no values",
                column, strategy
            );
            continue;
        };

        let filled = values.fill_null_with_values(fill_value)?;
        result = result.with_series(filled.into_series())?;
        debug!(
            "Filled {} missing values in '{}' with {}: {:.4}",
            missing, column, strategy, fill_value
        );
    }

    Ok(result)
}
