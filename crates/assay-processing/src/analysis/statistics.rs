//! Descriptive statistics over the measured values of a column.

use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// Count, moments and quartiles of a grade column.
///
/// Computed over non-missing values only. When `count` is zero every other
/// field is `None`; `std` is also `None` for a single value. Callers must check
/// `count` before trusting the central measures.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ElementStatistics {
    pub count: usize,
    pub mean: Option<f64>,
    pub std: Option<f64>,
    pub min: Option<f64>,
    #[serde(rename = "25%")]
    pub q25: Option<f64>,
    #[serde(rename = "50%")]
    pub median: Option<f64>,
    #[serde(rename = "75%")]
    pub q75: Option<f64>,
    pub max: Option<f64>,
}

impl ElementStatistics {
    /// Describe a float column; nulls are skipped.
    ///
    /// The standard deviation is the sample one (ddof 1) and quartiles use
    /// linear interpolation.
    pub fn from_chunked(values: &Float64Chunked) -> PolarsResult<Self> {
        let count = values.len() - values.null_count();
        if count == 0 {
            return Ok(Self::default());
        }

        Ok(Self {
            count,
            mean: values.mean(),
            std: if count > 1 { values.std(1) } else { None },
            min: values.min(),
            q25: values.quantile(0.25, QuantileMethod::Linear)?,
            median: values.median(),
            q75: values.quantile(0.75, QuantileMethod::Linear)?,
            max: values.max(),
        })
    }

    /// Describe a set of measured values.
    pub fn from_values(values: &[f64]) -> PolarsResult<Self> {
        Self::from_chunked(&Float64Chunked::from_slice("values".into(), values))
    }

    /// Anomaly threshold `mean + k·std`, if both moments are defined.
    pub fn threshold(&self, k: f64) -> Option<f64> {
        Some(self.mean? + k * self.std?)
    }
}
