//! The in-memory assay table.
//!
//! [`AssayTable`] wraps a polars [`DataFrame`] and is the single unit passed
//! between loader, cleaner and analyzer. Columns are whatever the source
//! carried; access by name is checked and reports
//! [`AssayError::ColumnNotFound`] rather than panicking. Transforms never
//! mutate a table in place: they return a new one.
//!
//! [`AssayRecord`] is the typed row view for consumers that prefer named
//! fields over column lookups.

use polars::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::{AssayError, Result};
use crate::schema::{AssayColumn, GradeColumn as G};
use crate::utils::{f64_values, float_chunked, is_numeric_dtype, mask_from, string_values};

/// An ordered set of assay rows backed by a polars `DataFrame`.
#[derive(Debug, Clone)]
pub struct AssayTable {
    df: DataFrame,
}

static_assertions::assert_impl_all!(AssayTable: Send, Sync);

impl AssayTable {
    pub fn new(df: DataFrame) -> Self {
        Self { df }
    }

    /// A table with no rows and no columns.
    pub fn empty() -> Self {
        Self::new(DataFrame::empty())
    }

    pub fn frame(&self) -> &DataFrame {
        &self.df
    }

    pub fn into_frame(self) -> DataFrame {
        self.df
    }

    /// Number of rows.
    pub fn height(&self) -> usize {
        self.df.height()
    }

    pub fn is_empty(&self) -> bool {
        self.df.height() == 0
    }

    /// Column names in table order.
    pub fn column_names(&self) -> Vec<String> {
        self.df
            .get_column_names()
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.df.get_column_index(name).is_some()
    }

    /// Expected schema columns that this table does not carry.
    pub fn missing_schema_columns(&self) -> Vec<&'static str> {
        AssayColumn::ALL
            .iter()
            .map(|c| c.name())
            .filter(|name| !self.has_column(name))
            .collect()
    }

    /// Borrow a column as a series.
    pub fn series(&self, name: &str) -> Result<&Series> {
        if !self.has_column(name) {
            return Err(AssayError::ColumnNotFound(name.to_string()));
        }
        Ok(self.df.column(name)?.as_materialized_series())
    }

    /// Whether the named column exists and has a numeric dtype.
    pub fn is_numeric_column(&self, name: &str) -> bool {
        self.series(name)
            .map(|s| is_numeric_dtype(s.dtype()))
            .unwrap_or(false)
    }

    /// Names of all numeric columns, in table order.
    pub fn numeric_column_names(&self) -> Vec<String> {
        self.df
            .get_columns()
            .iter()
            .filter(|c| is_numeric_dtype(c.dtype()))
            .map(|c| c.name().to_string())
            .collect()
    }

    /// A column's values as floats; missing and NaN values are `None`.
    pub fn numeric_values(&self, name: &str) -> Result<Vec<Option<f64>>> {
        Ok(f64_values(self.series(name)?)?)
    }

    /// A column cast to floats with NaN as null, for polars aggregates.
    pub fn float_column(&self, name: &str) -> Result<Float64Chunked> {
        Ok(float_chunked(self.series(name)?)?)
    }

    /// A column's values as text.
    pub fn text_values(&self, name: &str) -> Result<Vec<Option<String>>> {
        Ok(string_values(self.series(name)?)?)
    }

    /// Per-row missing flags for a column. For numeric columns NaN counts as missing.
    pub fn missing_mask(&self, name: &str) -> Result<Vec<bool>> {
        let series = self.series(name)?;
        if is_numeric_dtype(series.dtype()) {
            Ok(f64_values(series)?.iter().map(Option::is_none).collect())
        } else {
            Ok(series.is_null().into_iter().map(|v| v.unwrap_or(true)).collect())
        }
    }

    /// Count of missing cells in a column.
    pub fn missing_count(&self, name: &str) -> Result<usize> {
        Ok(self.missing_mask(name)?.into_iter().filter(|&m| m).count())
    }

    /// Keep the rows whose flag is `true`, preserving order.
    pub(crate) fn filter_rows(&self, keep: &[bool]) -> Result<AssayTable> {
        if keep.len() != self.height() {
            return Err(AssayError::InvalidArgument(format!(
                "row mask has {} entries for {} rows",
                keep.len(),
                self.height()
            )));
        }
        Ok(Self::new(self.df.filter(&mask_from(keep))?))
    }

    /// Gather rows by position, in the given order.
    pub(crate) fn take_rows(&self, indices: &[usize]) -> Result<AssayTable> {
        let idx: Vec<IdxSize> = indices.iter().map(|&i| i as IdxSize).collect();
        let idx = IdxCa::from_vec("idx".into(), idx);
        Ok(Self::new(self.df.take(&idx)?))
    }

    /// Return a copy of the table with the series added, replacing a column of the same name.
    pub(crate) fn with_series(&self, series: Series) -> Result<AssayTable> {
        let mut df = self.df.clone();
        df.with_column(series)?;
        Ok(Self::new(df))
    }

    /// Typed view of every row. Fails if an expected column is absent.
    pub fn records(&self) -> Result<Vec<AssayRecord>> {
        let text = |c: AssayColumn| self.text_values(c.name());
        let num = |c: AssayColumn| self.numeric_values(c.name());

        let sample_id = text(AssayColumn::SampleId)?;
        let hole_id = text(AssayColumn::HoleId)?;
        let from_depth = num(AssayColumn::FromDepth)?;
        let to_depth = num(AssayColumn::ToDepth)?;
        let lithology = text(AssayColumn::Lithology)?;
        let au = num(AssayColumn::Grade(G::Au))?;
        let cu = num(AssayColumn::Grade(G::Cu))?;
        let ag = num(AssayColumn::Grade(G::Ag))?;
        let fe = num(AssayColumn::Grade(G::Fe))?;
        let s = num(AssayColumn::Grade(G::S))?;
        let quality = text(AssayColumn::SampleQuality)?;
        let date = text(AssayColumn::AssayDate)?;

        Ok((0..self.height())
            .map(|i| AssayRecord {
                sample_id: sample_id[i].clone(),
                hole_id: hole_id[i].clone(),
                from_depth: from_depth[i],
                to_depth: to_depth[i],
                lithology: lithology[i].clone(),
                au_ppm: au[i],
                cu_pct: cu[i],
                ag_ppm: ag[i],
                fe_pct: fe[i],
                s_pct: s[i],
                sample_quality: quality[i].clone(),
                assay_date: date[i].clone(),
            })
            .collect())
    }

    /// Build a table with the full schema from typed rows.
    pub fn from_records(records: &[AssayRecord]) -> Result<Self> {
        fn text(name: AssayColumn, values: Vec<Option<String>>) -> Column {
            Series::new(name.name().into(), values).into()
        }
        fn num(name: AssayColumn, values: Vec<Option<f64>>) -> Column {
            Series::new(name.name().into(), values).into()
        }

        let columns = vec![
            text(AssayColumn::SampleId, records.iter().map(|r| r.sample_id.clone()).collect()),
            text(AssayColumn::HoleId, records.iter().map(|r| r.hole_id.clone()).collect()),
            num(AssayColumn::FromDepth, records.iter().map(|r| r.from_depth).collect()),
            num(AssayColumn::ToDepth, records.iter().map(|r| r.to_depth).collect()),
            text(AssayColumn::Lithology, records.iter().map(|r| r.lithology.clone()).collect()),
            num(AssayColumn::Grade(G::Au), records.iter().map(|r| r.au_ppm).collect()),
            num(AssayColumn::Grade(G::Cu), records.iter().map(|r| r.cu_pct).collect()),
            num(AssayColumn::Grade(G::Ag), records.iter().map(|r| r.ag_ppm).collect()),
            num(AssayColumn::Grade(G::Fe), records.iter().map(|r| r.fe_pct).collect()),
            num(AssayColumn::Grade(G::S), records.iter().map(|r| r.s_pct).collect()),
            text(
                AssayColumn::SampleQuality,
                records.iter().map(|r| r.sample_quality.clone()).collect(),
            ),
            text(AssayColumn::AssayDate, records.iter().map(|r| r.assay_date.clone()).collect()),
        ];

        Ok(Self::new(DataFrame::new(columns)?))
    }
}

impl From<DataFrame> for AssayTable {
    fn from(df: DataFrame) -> Self {
        Self::new(df)
    }
}

/// One assay interval with named, typed fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AssayRecord {
    pub sample_id: Option<String>,
    pub hole_id: Option<String>,
    pub from_depth: Option<f64>,
    pub to_depth: Option<f64>,
    pub lithology: Option<String>,
    #[serde(rename = "Au_ppm")]
    pub au_ppm: Option<f64>,
    #[serde(rename = "Cu_pct")]
    pub cu_pct: Option<f64>,
    #[serde(rename = "Ag_ppm")]
    pub ag_ppm: Option<f64>,
    #[serde(rename = "Fe_pct")]
    pub fe_pct: Option<f64>,
    #[serde(rename = "S_pct")]
    pub s_pct: Option<f64>,
    pub sample_quality: Option<String>,
    pub assay_date: Option<String>,
}

impl AssayRecord {
    /// Interval length, when both depths are present.
    pub fn interval_length(&self) -> Option<f64> {
        Some(self.to_depth? - self.from_depth?)
    }
}
