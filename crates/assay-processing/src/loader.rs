//! Loading assay tables from delimited text.
//!
//! A missing file is not an error: [`load_assay_data`] returns `Ok(None)` so
//! callers can decide whether absence matters. Content that cannot be read as
//! a table is a [`AssayError::Format`].

use polars::io::csv::read::CsvReadOptions;
use polars::prelude::*;
use std::io::{Cursor, Read};
use std::path::Path;
use tracing::{debug, info, warn};

use crate::error::{AssayError, Result};
use crate::schema::AssayColumn;
use crate::table::AssayTable;

/// Tokens read as missing values, in addition to empty fields.
pub const NULL_TOKENS: [&str; 5] = ["NA", "NaN", "nan", "N/A", "null"];

/// Rows used to infer column types.
const INFER_SCHEMA_ROWS: usize = 100;

/// Load an assay table from a CSV file with a header row.
pub fn load_assay_data(path: impl AsRef<Path>) -> Result<Option<AssayTable>> {
    let path = path.as_ref();
    if !path.exists() {
        warn!("Assay file not found: {}", path.display());
        return Ok(None);
    }

    let bytes = std::fs::read(path)?;
    let table = parse_csv(bytes).map_err(|e| e.with_context(path.display().to_string()))?;
    info!(
        "Loaded {} rows, {} columns from {}",
        table.height(),
        table.column_names().len(),
        path.display()
    );
    Ok(Some(table))
}

/// Load an assay table from any reader holding CSV text.
pub fn load_assay_data_from_reader<R: Read>(mut reader: R) -> Result<AssayTable> {
    let mut bytes = Vec::new();
    reader.read_to_end(&mut bytes)?;
    parse_csv(bytes)
}

fn parse_csv(bytes: Vec<u8>) -> Result<AssayTable> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Err(AssayError::Format("file is empty".to_string()));
    }

    let null_values = NullValues::AllColumns(NULL_TOKENS.iter().map(|t| (*t).into()).collect());
    let df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(INFER_SCHEMA_ROWS))
        .with_parse_options(
            CsvParseOptions::default()
                .with_quote_char(Some(b'"'))
                .with_null_values(Some(null_values)),
        )
        .into_reader_with_file_handle(Cursor::new(bytes))
        .finish()
        .map_err(|e| AssayError::Format(e.to_string()))?;

    coerce_numeric_columns(df).map(AssayTable::new)
}

/// Depth and grade columns are always floats. Text that does not parse as a
/// number in one of them is a format error.
fn coerce_numeric_columns(mut df: DataFrame) -> Result<DataFrame> {
    for name in AssayColumn::numeric_names() {
        let Some(idx) = df.get_column_index(name) else {
            continue;
        };
        let series = df.get_columns()[idx].as_materialized_series();

        let coerced = match series.dtype() {
            DataType::Float64 => continue,
            DataType::String => series.strict_cast(&DataType::Float64).map_err(|_| {
                AssayError::Format(format!("column '{name}' contains non-numeric values"))
            })?,
            dtype => {
                debug!("Widening '{}' from {} to Float64", name, dtype);
                series.cast(&DataType::Float64)?
            }
        };
        df.with_column(coerced)?;
    }
    Ok(df)
}
