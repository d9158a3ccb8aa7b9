//! Queries over a cleaned assay table: quality filtering, element statistics,
//! anomaly detection, correlation, interval weighting and grouping.
//!
//! Every function here borrows the table and either returns a new table or a
//! value snapshot; nothing is mutated.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::statistics::ElementStatistics;
use crate::cleaner::interval_lengths;
use crate::error::{AssayError, Result, ResultExt};
use crate::schema::AssayColumn;
use crate::table::AssayTable;

/// Statistics for one partition of a grouped column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupStatistics {
    /// Group value; `None` is the partition of rows with no group value.
    pub group: Option<String>,
    #[serde(flatten)]
    pub statistics: ElementStatistics,
}

/// Pearson coefficient for one pair of elements.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementCorrelation {
    pub element_a: String,
    pub element_b: String,
    /// `None` when the correlation is undefined for this data.
    pub coefficient: Option<f64>,
}

/// Statistical analysis of geochemical assay tables.
pub struct GeochemicalAnalyzer;

impl GeochemicalAnalyzer {
    /// Keep rows whose `sample_quality` equals `quality_level` exactly.
    ///
    /// No case folding: `"good"` does not match `"Good"`, so naming
    /// inconsistencies upstream show up as empty results.
    pub fn filter_by_quality(table: &AssayTable, quality_level: &str) -> Result<AssayTable> {
        let quality = table.text_values(AssayColumn::SampleQuality.name())?;
        let keep: Vec<bool> = quality
            .iter()
            .map(|q| q.as_deref() == Some(quality_level))
            .collect();

        let filtered = table.filter_rows(&keep)?;
        debug!(
            "Kept {} of {} rows with quality '{}'",
            filtered.height(),
            table.height(),
            quality_level
        );
        Ok(filtered)
    }

    /// Descriptive statistics over the non-missing values of `element`.
    pub fn element_statistics(table: &AssayTable, element: &str) -> Result<ElementStatistics> {
        Ok(ElementStatistics::from_chunked(&table.float_column(element)?)?)
    }

    /// The anomaly threshold `mean + k·std` for `element`, `None` when fewer
    /// than two values are measured.
    pub fn anomaly_threshold(table: &AssayTable, element: &str, k: f64) -> Result<Option<f64>> {
        if !k.is_finite() {
            return Err(AssayError::InvalidArgument(format!(
                "threshold multiplier must be finite, got {k}"
            )));
        }
        Ok(Self::element_statistics(table, element)?.threshold(k))
    }

    /// Rows whose `element` value strictly exceeds `mean + k·std`.
    ///
    /// Rows with no value are never anomalous. `k` may be zero or negative.
    pub fn detect_anomalies(table: &AssayTable, element: &str, k: f64) -> Result<AssayTable> {
        let threshold = Self::anomaly_threshold(table, element, k)?;
        let values = table.numeric_values(element)?;

        let keep: Vec<bool> = match threshold {
            Some(threshold) => values
                .iter()
                .map(|v| v.is_some_and(|x| x > threshold))
                .collect(),
            None => {
                warn!("No anomaly threshold for '{}': fewer than two values", element);
                vec![false; values.len()]
            }
        };

        let anomalies = table.filter_rows(&keep)?;
        debug!(
            "Found {} anomalies in '{}' above {:?} (k = {})",
            anomalies.height(),
            element,
            threshold,
            k
        );
        Ok(anomalies)
    }

    /// Pearson correlation over rows where both elements are measured.
    ///
    /// Returns [`AssayError::Undefined`] when fewer than two complete pairs
    /// exist or either element has zero variance over those pairs.
    pub fn correlate_elements(table: &AssayTable, element_a: &str, element_b: &str) -> Result<f64> {
        let a = table.numeric_values(element_a)?;
        let b = table.numeric_values(element_b)?;

        let pairs: Vec<(f64, f64)> = a
            .iter()
            .zip(&b)
            .filter_map(|(x, y)| Some(((*x)?, (*y)?)))
            .collect();

        if pairs.len() < 2 {
            return Err(AssayError::Undefined(format!(
                "{} complete pairs for '{}' and '{}'",
                pairs.len(),
                element_a,
                element_b
            )));
        }

        // Rounding in the mean leaves a constant column a tiny variance
        if !has_spread(pairs.iter().map(|p| p.0)) || !has_spread(pairs.iter().map(|p| p.1)) {
            return Err(AssayError::Undefined(format!(
                "zero variance in '{}' or '{}'",
                element_a, element_b
            )));
        }

        if element_a == element_b {
            return Ok(1.0);
        }

        let n = pairs.len() as f64;
        let mean_a = pairs.iter().map(|p| p.0).sum::<f64>() / n;
        let mean_b = pairs.iter().map(|p| p.1).sum::<f64>() / n;

        let (mut sab, mut saa, mut sbb) = (0.0, 0.0, 0.0);
        for (x, y) in &pairs {
            let dx = x - mean_a;
            let dy = y - mean_b;
            sab += dx * dy;
            saa += dx * dx;
            sbb += dy * dy;
        }

        let r = sab / (saa.sqrt() * sbb.sqrt());
        if !r.is_finite() {
            return Err(AssayError::Undefined(format!(
                "variance of '{}' or '{}' is below floating point resolution",
                element_a, element_b
            )));
        }
        Ok(r.clamp(-1.0, 1.0))
    }

    /// Correlations for every unordered pair of `elements`, in upper-triangle order.
    pub fn correlation_matrix(
        table: &AssayTable,
        elements: &[&str],
    ) -> Result<Vec<ElementCorrelation>> {
        let mut correlations = Vec::new();
        for (i, a) in elements.iter().enumerate() {
            for b in &elements[i + 1..] {
                let coefficient = match Self::correlate_elements(table, a, b) {
                    Ok(r) => Some(r),
                    Err(e) if e.is_undefined() => None,
                    Err(e) => return Err(e),
                };
                correlations.push(ElementCorrelation {
                    element_a: a.to_string(),
                    element_b: b.to_string(),
                    coefficient,
                });
            }
        }
        Ok(correlations)
    }

    /// `Σ(value·length) / Σ(length)` over rows with a value and a known interval.
    ///
    /// Zero- and negative-length intervals carry no weight. Returns
    /// [`AssayError::Undefined`] when the total weight is zero.
    pub fn interval_weighted_mean(table: &AssayTable, element: &str) -> Result<f64> {
        let values = table.numeric_values(element)?;
        let lengths = interval_lengths(table).context("Interval weighting needs depths")?;

        let (weighted_sum, total_weight) = values
            .iter()
            .zip(&lengths)
            .filter_map(|(v, l)| Some(((*v)?, (*l)?.max(0.0))))
            .fold((0.0, 0.0), |(sum, weight), (v, l)| (sum + v * l, weight + l));

        if total_weight <= 0.0 {
            return Err(AssayError::Undefined(format!(
                "total interval length is zero for '{element}'"
            )));
        }
        Ok(weighted_sum / total_weight)
    }

    /// Statistics of `element` per distinct value of `group_column`, in order of
    /// first appearance. Rows with no group value form their own partition.
    pub fn group_statistics(
        table: &AssayTable,
        group_column: &str,
        element: &str,
    ) -> Result<Vec<GroupStatistics>> {
        let groups = table.text_values(group_column)?;
        let values = table.numeric_values(element)?;

        let mut partitions: IndexMap<Option<String>, Vec<f64>> = IndexMap::new();
        for (group, value) in groups.into_iter().zip(values) {
            let bucket = partitions.entry(group).or_default();
            if let Some(v) = value {
                bucket.push(v);
            }
        }

        partitions
            .into_iter()
            .map(|(group, values)| -> Result<GroupStatistics> {
                Ok(GroupStatistics {
                    group,
                    statistics: ElementStatistics::from_values(&values)?,
                })
            })
            .collect()
    }

    /// Element statistics per lithology.
    pub fn element_by_lithology(table: &AssayTable, element: &str) -> Result<Vec<GroupStatistics>> {
        Self::group_statistics(table, AssayColumn::Lithology.name(), element)
    }

    /// Element statistics per drill hole.
    pub fn element_by_hole(table: &AssayTable, element: &str) -> Result<Vec<GroupStatistics>> {
        Self::group_statistics(table, AssayColumn::HoleId.name(), element)
    }
}

/// Whether a column holds at least two distinct values.
fn has_spread(values: impl Iterator<Item = f64>) -> bool {
    let (min, max) = values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    });
    min < max
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{f64_at, sample_table};
    use polars::df;
    use polars::prelude::DataFrame;

    fn table(df: DataFrame) -> AssayTable {
        AssayTable::new(df)
    }

    // ========================================================================
    // filter_by_quality() tests
    // ========================================================================

    #[test]
    fn test_filter_good_quality() {
        let result = GeochemicalAnalyzer::filter_by_quality(&sample_table(), "Good").unwrap();
        assert_eq!(result.height(), 12);
        assert!(
            result
                .text_values("sample_quality")
                .unwrap()
                .iter()
                .all(|q| q.as_deref() == Some("Good"))
        );
    }

    #[test]
    fn test_filter_is_case_sensitive() {
        let result = GeochemicalAnalyzer::filter_by_quality(&sample_table(), "good").unwrap();
        assert_eq!(result.height(), 0);
    }

    #[test]
    fn test_filter_preserves_columns() {
        let source = sample_table();
        let result = GeochemicalAnalyzer::filter_by_quality(&source, "Fair").unwrap();
        assert_eq!(result.height(), 5);
        assert_eq!(result.column_names(), source.column_names());
    }

    #[test]
    fn test_filter_without_quality_column() {
        let err = GeochemicalAnalyzer::filter_by_quality(&AssayTable::empty(), "Good").unwrap_err();
        assert!(matches!(err, AssayError::ColumnNotFound(_)));
    }

    // ========================================================================
    // element_statistics() tests
    // ========================================================================

    #[test]
    fn test_statistics_count_excludes_missing() {
        let stats = GeochemicalAnalyzer::element_statistics(&sample_table(), "Au_ppm").unwrap();
        assert_eq!(stats.count, 18);

        // Sum of the 18 measured Au values is 25.7
        let mean = stats.mean.unwrap();
        assert!((mean - 25.7 / 18.0).abs() < 1e-9);
        assert_eq!(stats.min, Some(0.3));
        assert_eq!(stats.max, Some(5.5));
    }

    #[test]
    fn test_statistics_all_missing() {
        let t = table(df!["Au_ppm" => [Option::<f64>::None, None, None]].unwrap());
        let stats = GeochemicalAnalyzer::element_statistics(&t, "Au_ppm").unwrap();
        assert_eq!(stats.count, 0);
        assert!(stats.mean.is_none());
        assert!(stats.std.is_none());
    }

    #[test]
    fn test_statistics_missing_column() {
        let err = GeochemicalAnalyzer::element_statistics(&sample_table(), "Nonexistent_ppm")
            .unwrap_err();
        assert!(matches!(err, AssayError::ColumnNotFound(ref c) if c == "Nonexistent_ppm"));
    }

    // ========================================================================
    // detect_anomalies() tests
    // ========================================================================

    #[test]
    fn test_anomalies_exceed_threshold() {
        let source = sample_table();
        let threshold = GeochemicalAnalyzer::anomaly_threshold(&source, "Au_ppm", 2.0)
            .unwrap()
            .unwrap();
        let anomalies = GeochemicalAnalyzer::detect_anomalies(&source, "Au_ppm", 2.0).unwrap();

        assert!(anomalies.height() > 0);
        for row in 0..anomalies.height() {
            assert!(f64_at(&anomalies, "Au_ppm", row) > threshold);
        }
    }

    #[test]
    fn test_higher_threshold_fewer_anomalies() {
        let source = sample_table();
        let low = GeochemicalAnalyzer::detect_anomalies(&source, "Au_ppm", 1.5).unwrap();
        let high = GeochemicalAnalyzer::detect_anomalies(&source, "Au_ppm", 3.0).unwrap();
        assert!(high.height() <= low.height());
    }

    #[test]
    fn test_zero_multiplier_is_above_mean() {
        let t = table(df!["g" => [1.0, 2.0, 3.0, 4.0]].unwrap());
        let anomalies = GeochemicalAnalyzer::detect_anomalies(&t, "g", 0.0).unwrap();
        // Mean is 2.5; strictly greater keeps 3 and 4
        assert_eq!(anomalies.height(), 2);
    }

    #[test]
    fn test_anomalies_skip_missing_rows() {
        let t = table(df!["g" => [Some(1.0), None, Some(3.0)]].unwrap());
        let anomalies = GeochemicalAnalyzer::detect_anomalies(&t, "g", -10.0).unwrap();
        assert_eq!(anomalies.height(), 2);
    }

    #[test]
    fn test_anomalies_single_value_has_no_threshold() {
        let t = table(df!["g" => [Some(1.0), None]].unwrap());
        let anomalies = GeochemicalAnalyzer::detect_anomalies(&t, "g", 0.0).unwrap();
        assert_eq!(anomalies.height(), 0);
    }

    #[test]
    fn test_anomalies_reject_non_finite_multiplier() {
        let err = GeochemicalAnalyzer::detect_anomalies(&sample_table(), "Au_ppm", f64::INFINITY)
            .unwrap_err();
        assert!(matches!(err, AssayError::InvalidArgument(_)));
    }

    // ========================================================================
    // correlate_elements() tests
    // ========================================================================

    #[test]
    fn test_self_correlation_is_exactly_one() {
        let r = GeochemicalAnalyzer::correlate_elements(&sample_table(), "Au_ppm", "Au_ppm").unwrap();
        assert_eq!(r, 1.0);
    }

    #[test]
    fn test_correlation_symmetry_and_range() {
        let source = sample_table();
        let ab = GeochemicalAnalyzer::correlate_elements(&source, "Au_ppm", "Cu_pct").unwrap();
        let ba = GeochemicalAnalyzer::correlate_elements(&source, "Cu_pct", "Au_ppm").unwrap();
        assert_eq!(ab, ba);
        assert!((-1.0..=1.0).contains(&ab));
        // Au and Cu rise together in the fixture
        assert!(ab > 0.5);
    }

    #[test]
    fn test_perfect_negative_correlation() {
        let t = table(df!["a" => [1.0, 2.0, 3.0], "b" => [6.0, 4.0, 2.0]].unwrap());
        let r = GeochemicalAnalyzer::correlate_elements(&t, "a", "b").unwrap();
        assert!((r + 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_correlation_uses_complete_pairs_only() {
        let t = table(
            df![
                "a" => [Some(1.0), Some(2.0), None, Some(3.0)],
                "b" => [Some(2.0), Some(4.0), Some(100.0), Some(6.0)],
            ]
            .unwrap(),
        );
        let r = GeochemicalAnalyzer::correlate_elements(&t, "a", "b").unwrap();
        assert!((r - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_correlation_zero_variance_is_undefined() {
        let t = table(df!["a" => [1.0, 2.0, 3.0], "b" => [5.0, 5.0, 5.0]].unwrap());
        let err = GeochemicalAnalyzer::correlate_elements(&t, "a", "b").unwrap_err();
        assert!(err.is_undefined());

        let err = GeochemicalAnalyzer::correlate_elements(&t, "b", "b").unwrap_err();
        assert!(err.is_undefined());
    }

    #[test]
    fn test_correlation_inexact_constant_is_undefined() {
        // 0.1 and 0.3 have no exact binary form, so the computed mean drifts
        let t = table(
            df![
                "a" => [0.1, 0.1, 0.1],
                "b" => [1.0, 2.0, 3.0],
                "c" => [0.3, 0.3, 0.3],
            ]
            .unwrap(),
        );
        for (x, y) in [("a", "b"), ("b", "a"), ("a", "a"), ("c", "c"), ("a", "c")] {
            let err = GeochemicalAnalyzer::correlate_elements(&t, x, y).unwrap_err();
            assert!(err.is_undefined(), "{x} vs {y}");
        }
    }

    #[test]
    fn test_correlation_constant_over_complete_pairs_only() {
        // 'a' varies, but not on the rows where 'b' is measured
        let t = table(
            df![
                "a" => [Some(0.1), Some(0.1), Some(9.0)],
                "b" => [Some(1.0), Some(2.0), None],
            ]
            .unwrap(),
        );
        let err = GeochemicalAnalyzer::correlate_elements(&t, "a", "b").unwrap_err();
        assert!(err.is_undefined());
    }

    #[test]
    fn test_correlation_too_few_pairs_is_undefined() {
        let t = table(df!["a" => [Some(1.0), None], "b" => [Some(2.0), Some(3.0)]].unwrap());
        let err = GeochemicalAnalyzer::correlate_elements(&t, "a", "b").unwrap_err();
        assert!(err.is_undefined());
    }

    #[test]
    fn test_correlation_matrix_pairs() {
        let t = table(
            df![
                "a" => [1.0, 2.0, 3.0],
                "b" => [2.0, 4.0, 6.0],
                "c" => [7.0, 7.0, 7.0],
            ]
            .unwrap(),
        );
        let matrix = GeochemicalAnalyzer::correlation_matrix(&t, &["a", "b", "c"]).unwrap();
        assert_eq!(matrix.len(), 3);
        assert_eq!((matrix[0].element_a.as_str(), matrix[0].element_b.as_str()), ("a", "b"));
        assert!(matrix[0].coefficient.is_some());
        assert!(matrix[1].coefficient.is_none());
        assert!(matrix[2].coefficient.is_none());
    }

    #[test]
    fn test_correlation_matrix_missing_column_fails() {
        let err = GeochemicalAnalyzer::correlation_matrix(&sample_table(), &["Au_ppm", "Zn_ppm"])
            .unwrap_err();
        assert!(matches!(err, AssayError::ColumnNotFound(_)));
    }

    // ========================================================================
    // interval_weighted_mean() tests
    // ========================================================================

    #[test]
    fn test_weighted_mean_uses_interval_length() {
        let t = table(
            df![
                "from_depth" => [0.0, 1.0],
                "to_depth" => [1.0, 4.0],
                "Au_ppm" => [1.0, 3.0],
            ]
            .unwrap(),
        );
        // (1·1 + 3·3) / 4
        let mean = GeochemicalAnalyzer::interval_weighted_mean(&t, "Au_ppm").unwrap();
        assert_eq!(mean, 2.5);
    }

    #[test]
    fn test_weighted_mean_zero_length_carries_no_weight() {
        let t = table(
            df![
                "from_depth" => [0.0, 2.0, 3.0],
                "to_depth" => [2.0, 2.0, 5.0],
                "Au_ppm" => [Some(1.0), Some(100.0), Some(3.0)],
            ]
            .unwrap(),
        );
        let mean = GeochemicalAnalyzer::interval_weighted_mean(&t, "Au_ppm").unwrap();
        assert_eq!(mean, 2.0);
    }

    #[test]
    fn test_weighted_mean_all_zero_length_is_undefined() {
        let t = table(
            df![
                "from_depth" => [1.0, 2.0],
                "to_depth" => [1.0, 2.0],
                "Au_ppm" => [1.0, 2.0],
            ]
            .unwrap(),
        );
        let err = GeochemicalAnalyzer::interval_weighted_mean(&t, "Au_ppm").unwrap_err();
        assert!(err.is_undefined());
    }

    #[test]
    fn test_weighted_mean_equal_intervals_matches_mean() {
        let source = sample_table();
        let weighted = GeochemicalAnalyzer::interval_weighted_mean(&source, "Fe_pct").unwrap();
        let plain = GeochemicalAnalyzer::element_statistics(&source, "Fe_pct")
            .unwrap()
            .mean
            .unwrap();
        assert!((weighted - plain).abs() < 1e-9);
    }

    #[test]
    fn test_weighted_mean_without_depths() {
        let t = table(df!["Au_ppm" => [1.0]].unwrap());
        let err = GeochemicalAnalyzer::interval_weighted_mean(&t, "Au_ppm").unwrap_err();
        assert_eq!(err.error_code(), "COLUMN_NOT_FOUND");
    }

    // ========================================================================
    // group_statistics() tests
    // ========================================================================

    #[test]
    fn test_group_by_lithology() {
        let groups = GeochemicalAnalyzer::element_by_lithology(&sample_table(), "Au_ppm").unwrap();
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].group.as_deref(), Some("Granite"));
        // One missing Au value among the eight granite rows
        assert_eq!(groups[0].statistics.count, 7);
        assert_eq!(groups[1].group.as_deref(), Some("Basalt"));
        assert_eq!(groups[1].statistics.count, 11);
    }

    #[test]
    fn test_group_by_hole() {
        let groups = GeochemicalAnalyzer::element_by_hole(&sample_table(), "Fe_pct").unwrap();
        let holes: Vec<_> = groups.iter().map(|g| g.group.clone().unwrap()).collect();
        assert_eq!(holes, vec!["DH-01", "DH-02"]);
        assert!(groups.iter().all(|g| g.statistics.count == 10));
    }

    #[test]
    fn test_group_null_partition() {
        let t = table(
            df![
                "lithology" => [Some("Granite"), None, Some("Granite"), None],
                "Au_ppm" => [1.0, 2.0, 3.0, 4.0],
            ]
            .unwrap(),
        );
        let groups = GeochemicalAnalyzer::element_by_lithology(&t, "Au_ppm").unwrap();
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[1].group, None);
        assert_eq!(groups[1].statistics.mean, Some(3.0));
    }
}
