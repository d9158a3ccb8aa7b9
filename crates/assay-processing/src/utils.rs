//! Shared series helpers.
//!
//! Column aggregates go through polars float columns; row-wise arithmetic
//! (pairing, weighting, masks) works on extracted `Option<f64>` vectors.
//! NaN is treated as missing, the same as null.

use polars::prelude::*;

/// Check if a DataType is numeric (integer or float).
#[inline]
pub fn is_numeric_dtype(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
            | DataType::Float32
            | DataType::Float64
    )
}

/// Cast a series to a float column with NaN turned into null.
pub fn float_chunked(series: &Series) -> PolarsResult<Float64Chunked> {
    let float_series = series.cast(&DataType::Float64)?;
    let ca = float_series.f64()?;
    if !ca.into_iter().flatten().any(f64::is_nan) {
        return Ok(ca.clone());
    }
    let mut cleaned: Float64Chunked = ca
        .into_iter()
        .map(|v| v.filter(|x| !x.is_nan()))
        .collect();
    cleaned.rename(series.name().clone());
    Ok(cleaned)
}

/// Extract a series as floats. Unparseable text and NaN become `None`.
pub fn f64_values(series: &Series) -> PolarsResult<Vec<Option<f64>>> {
    Ok(float_chunked(series)?.into_iter().collect())
}

/// Extract a series as owned strings, rendering non-text values with their display form.
pub fn string_values(series: &Series) -> PolarsResult<Vec<Option<String>>> {
    let str_series = series.cast(&DataType::String)?;
    Ok(str_series
        .str()?
        .into_iter()
        .map(|v| v.map(str::to_string))
        .collect())
}

/// Non-missing values of an extracted column.
pub fn present(values: &[Option<f64>]) -> Vec<f64> {
    values.iter().flatten().copied().collect()
}

/// Build a boolean mask suitable for `DataFrame::filter`.
pub fn mask_from(keep: &[bool]) -> BooleanChunked {
    BooleanChunked::from_slice("mask".into(), keep)
}
