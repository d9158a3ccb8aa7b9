use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{debug, info};

use crate::error::Result;
use crate::schema::{AssayColumn, GradeColumn, QUALITY_REJECTED};
use crate::table::AssayTable;

/// Snapshot of data quality signals for one table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityReport {
    pub total_rows: usize,
    /// Missing cell count per column, in table order.
    pub missing_values: IndexMap<String, usize>,
    /// Sample ids that occur more than once, each listed once.
    pub duplicate_ids: Vec<String>,
    /// Count of values below zero per grade column.
    pub negative_values: IndexMap<String, usize>,
    /// Rows with `from_depth >= to_depth`.
    pub invalid_depths: usize,
    pub rejected_samples: usize,
    pub issues_found: bool,
    /// Expected columns the table does not carry. Informational only.
    #[serde(default)]
    pub missing_columns: Vec<String>,
}

impl QualityReport {
    pub fn total_missing(&self) -> usize {
        self.missing_values.values().sum()
    }

    pub fn total_negative(&self) -> usize {
        self.negative_values.values().sum()
    }
}

static_assertions::assert_impl_all!(QualityReport: Send, Sync);

pub struct QualityValidator;

impl QualityValidator {
    /// Compute the quality report. The table is only read.
    ///
    /// Checks whose columns are absent contribute nothing; the absent
    /// columns are listed in [`QualityReport::missing_columns`].
    pub fn validate(table: &AssayTable) -> Result<QualityReport> {
        let mut missing_values = IndexMap::new();
        for name in table.column_names() {
            let count = table.missing_count(&name)?;
            missing_values.insert(name, count);
        }

        let duplicate_ids = Self::duplicate_ids(table)?;
        let negative_values = Self::negative_values(table)?;
        let invalid_depths = Self::invalid_depths(table)?;
        let rejected_samples = Self::rejected_samples(table)?;

        let mut report = QualityReport {
            total_rows: table.height(),
            missing_values,
            duplicate_ids,
            negative_values,
            invalid_depths,
            rejected_samples,
            issues_found: false,
            missing_columns: table
                .missing_schema_columns()
                .into_iter()
                .map(str::to_string)
                .collect(),
        };

        report.issues_found = report.total_missing() > 0
            || !report.duplicate_ids.is_empty()
            || report.total_negative() > 0
            || report.invalid_depths > 0
            || report.rejected_samples > 0;

        if !report.missing_columns.is_empty() {
            debug!("Columns not present: {:?}", report.missing_columns);
        }
        info!(
            "Quality check: {} rows, {} missing, {} duplicate ids, {} invalid depths, {} rejected",
            report.total_rows,
            report.total_missing(),
            report.duplicate_ids.len(),
            report.invalid_depths,
            report.rejected_samples
        );

        Ok(report)
    }

    fn duplicate_ids(table: &AssayTable) -> Result<Vec<String>> {
        let name = AssayColumn::SampleId.name();
        if !table.has_column(name) {
            return Ok(Vec::new());
        }

        let mut seen = HashSet::new();
        let mut duplicates = IndexSet::new();
        for id in table.text_values(name)?.into_iter().flatten() {
            if !seen.insert(id.clone()) {
                duplicates.insert(id);
            }
        }
        Ok(duplicates.into_iter().collect())
    }

    fn negative_values(table: &AssayTable) -> Result<IndexMap<String, usize>> {
        let mut counts = IndexMap::new();
        for grade in GradeColumn::ALL {
            let name = grade.column_name();
            if !table.has_column(name) {
                continue;
            }
            let count = table
                .numeric_values(name)?
                .into_iter()
                .flatten()
                .filter(|v| *v < 0.0)
                .count();
            counts.insert(name.to_string(), count);
        }
        Ok(counts)
    }

    fn invalid_depths(table: &AssayTable) -> Result<usize> {
        let from = AssayColumn::FromDepth.name();
        let to = AssayColumn::ToDepth.name();
        if !(table.has_column(from) && table.has_column(to)) {
            return Ok(0);
        }

        let from = table.numeric_values(from)?;
        let to = table.numeric_values(to)?;
        Ok(from
            .iter()
            .zip(&to)
            .filter(|(f, t)| matches!((f, t), (Some(f), Some(t)) if f >= t))
            .count())
    }

    fn rejected_samples(table: &AssayTable) -> Result<usize> {
        let name = AssayColumn::SampleQuality.name();
        if !table.has_column(name) {
            return Ok(0);
        }
        Ok(table
            .text_values(name)?
            .iter()
            .filter(|q| q.as_deref() == Some(QUALITY_REJECTED))
            .count())
    }
}
