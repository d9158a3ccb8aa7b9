use chrono::Local;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::Write;
use std::path::PathBuf;
use tracing::{debug, info};

use crate::analysis::{ElementCorrelation, ElementStatistics, GeochemicalAnalyzer, GroupStatistics};
use crate::cleaner::DataCleaner;
use crate::config::AnalysisConfig;
use crate::error::Result;
use crate::quality::{QualityReport, QualityValidator};
use crate::schema::{AssayColumn, COMPOSITE_ID, COMPOSITE_LENGTH, composite_grade_column};
use crate::table::AssayTable;

// ============================================================================
// Report Types
// ============================================================================

/// Summary entry for one element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementSummary {
    #[serde(flatten)]
    pub statistics: ElementStatistics,
    /// Null count over the whole table.
    pub missing: usize,
    /// Rows above the summary anomaly threshold.
    pub anomaly_count: usize,
}

/// Per-element summaries keyed by column name, in request order.
pub type SummaryReport = IndexMap<String, ElementSummary>;

/// Machine-readable result of a full analysis run.
///
/// Serialized for `--json` output and written by
/// [`ReportGenerator::write_report_to_file`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisReport {
    /// Timestamp when the report was generated
    pub generated_at: String,
    /// Path to the input file
    pub input_file: String,
    /// Path of the exported table, if one was written
    pub output_file: Option<String>,
    pub processing_summary: ProcessingSummary,
    /// Quality of the table before cleaning
    pub quality: QualityReport,
    /// Summary over the quality-filtered table
    pub summary: SummaryReport,
    pub correlations: Vec<ElementCorrelation>,
    /// Sample ids of anomalous primary element values, highest first
    pub anomalies: Vec<AnomalousSample>,
    /// Interval-weighted mean of the primary element; `None` when undefined
    pub weighted_mean: Option<f64>,
    pub by_lithology: Vec<GroupStatistics>,
    pub by_hole: Vec<GroupStatistics>,
    /// Runs of adjacent primary element samples, per hole in depth order
    pub composites: Vec<CompositeInterval>,
}

/// Row counts and parameters of an analysis run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessingSummary {
    pub rows_loaded: usize,
    pub rows_cleaned: usize,
    pub rows_analyzed: usize,
    pub quality_filter: String,
    pub primary_element: String,
    pub anomaly_threshold_multiplier: f64,
    /// `mean + k·std` of the primary element; `None` when undefined
    pub anomaly_threshold: Option<f64>,
    pub composite_max_gap: f64,
}

/// One anomalous sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnomalousSample {
    pub sample_id: Option<String>,
    pub hole_id: Option<String>,
    pub value: f64,
}

/// One run of adjacent samples within a hole.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompositeInterval {
    pub composite_id: u32,
    pub hole_id: Option<String>,
    pub from_depth: Option<f64>,
    pub to_depth: Option<f64>,
    /// Summed interval length; `None` when no sample has both depths
    pub length: Option<f64>,
    pub samples: usize,
    /// Length-weighted grade; `None` when no sample carries weight
    pub grade: Option<f64>,
}

static_assertions::assert_impl_all!(AnalysisReport: Send, Sync);

// ============================================================================
// Generator
// ============================================================================

pub struct ReportGenerator {
    output_dir: PathBuf,
}

impl Default for ReportGenerator {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("output"),
        }
    }
}

impl ReportGenerator {
    pub fn new(output_dir: PathBuf) -> Self {
        Self { output_dir }
    }

    /// Statistics, missing count and anomaly count for each requested column.
    ///
    /// Anomaly counts use `config.summary_anomaly_multiplier`, not the run's
    /// own anomaly multiplier.
    pub fn generate_summary_report(
        table: &AssayTable,
        columns: &[&str],
        config: &AnalysisConfig,
    ) -> Result<SummaryReport> {
        let k = config.summary_anomaly_multiplier;
        let mut report = SummaryReport::new();

        for &column in columns {
            let statistics = GeochemicalAnalyzer::element_statistics(table, column)?;
            let missing = table.missing_count(column)?;
            let anomaly_count = GeochemicalAnalyzer::detect_anomalies(table, column, k)?.height();

            report.insert(
                column.to_string(),
                ElementSummary {
                    statistics,
                    missing,
                    anomaly_count,
                },
            );
        }

        debug!("Summary report built for {} columns", report.len());
        Ok(report)
    }

    /// Run the full analysis.
    ///
    /// Quality is checked on the `loaded` table; everything else runs on the
    /// rows of `cleaned` matching `config.quality_filter`.
    pub fn build_analysis_report(
        input_file: &str,
        output_file: Option<&str>,
        loaded: &AssayTable,
        cleaned: &AssayTable,
        config: &AnalysisConfig,
    ) -> Result<AnalysisReport> {
        let quality = QualityValidator::validate(loaded)?;
        let filtered = GeochemicalAnalyzer::filter_by_quality(cleaned, &config.quality_filter)?;

        let primary = config.primary_element.column_name();
        let elements: Vec<&str> = config.elements.iter().map(|e| e.column_name()).collect();
        let k = config.anomaly_threshold_multiplier;

        let summary = Self::generate_summary_report(&filtered, &elements, config)?;
        let correlations = GeochemicalAnalyzer::correlation_matrix(&filtered, &elements)?;
        let anomaly_threshold = GeochemicalAnalyzer::anomaly_threshold(&filtered, primary, k)?;
        let anomalies = Self::anomalous_samples(&filtered, primary, k)?;

        let weighted_mean = match GeochemicalAnalyzer::interval_weighted_mean(&filtered, primary) {
            Ok(mean) => Some(mean),
            Err(e) if e.is_undefined() => None,
            Err(e) => return Err(e),
        };

        let by_lithology = GeochemicalAnalyzer::element_by_lithology(&filtered, primary)?;
        let by_hole = GeochemicalAnalyzer::element_by_hole(&filtered, primary)?;
        let composites = Self::composite_intervals(&filtered, primary, config.composite_max_gap)?;

        Ok(AnalysisReport {
            generated_at: Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            input_file: input_file.to_string(),
            output_file: output_file.map(String::from),
            processing_summary: ProcessingSummary {
                rows_loaded: loaded.height(),
                rows_cleaned: cleaned.height(),
                rows_analyzed: filtered.height(),
                quality_filter: config.quality_filter.clone(),
                primary_element: primary.to_string(),
                anomaly_threshold_multiplier: k,
                anomaly_threshold,
                composite_max_gap: config.composite_max_gap,
            },
            quality,
            summary,
            correlations,
            anomalies,
            weighted_mean,
            by_lithology,
            by_hole,
            composites,
        })
    }

    /// Collapse the composite columns added by
    /// [`DataCleaner::merge_adjacent_samples`] into one entry per group.
    pub fn composite_intervals(
        table: &AssayTable,
        element: &str,
        max_gap: f64,
    ) -> Result<Vec<CompositeInterval>> {
        let merged = DataCleaner::merge_adjacent_samples(table, element, max_gap)?;
        let ids = merged.numeric_values(COMPOSITE_ID)?;
        let holes = merged.text_values(AssayColumn::HoleId.name())?;
        let from = merged.numeric_values(AssayColumn::FromDepth.name())?;
        let to = merged.numeric_values(AssayColumn::ToDepth.name())?;
        let lengths = merged.numeric_values(COMPOSITE_LENGTH)?;
        let grades = merged.numeric_values(&composite_grade_column(element))?;

        let mut composites: Vec<CompositeInterval> = Vec::new();
        for row in 0..merged.height() {
            let id = ids[row].map_or(0, |v| v as u32);
            if let Some(last) = composites.last_mut().filter(|c| c.composite_id == id) {
                last.samples += 1;
                last.to_depth = match (last.to_depth, to[row]) {
                    (Some(a), Some(b)) => Some(a.max(b)),
                    (a, b) => a.or(b),
                };
                continue;
            }
            composites.push(CompositeInterval {
                composite_id: id,
                hole_id: holes[row].clone(),
                from_depth: from[row],
                to_depth: to[row],
                length: lengths[row],
                samples: 1,
                grade: grades[row],
            });
        }

        debug!(
            "{} composites for '{}' with max gap {}",
            composites.len(),
            element,
            max_gap
        );
        Ok(composites)
    }

    /// Anomalies of `element`, sorted by value from highest.
    pub fn anomalous_samples(
        table: &AssayTable,
        element: &str,
        k: f64,
    ) -> Result<Vec<AnomalousSample>> {
        let anomalies = GeochemicalAnalyzer::detect_anomalies(table, element, k)?;
        let values = anomalies.numeric_values(element)?;
        let ids = Self::optional_text(&anomalies, AssayColumn::SampleId.name())?;
        let holes = Self::optional_text(&anomalies, AssayColumn::HoleId.name())?;

        let mut samples: Vec<AnomalousSample> = values
            .into_iter()
            .enumerate()
            .filter_map(|(i, v)| {
                Some(AnomalousSample {
                    sample_id: ids[i].clone(),
                    hole_id: holes[i].clone(),
                    value: v?,
                })
            })
            .collect();
        samples.sort_by(|a, b| b.value.total_cmp(&a.value));
        Ok(samples)
    }

    fn optional_text(table: &AssayTable, name: &str) -> Result<Vec<Option<String>>> {
        if table.has_column(name) {
            table.text_values(name)
        } else {
            Ok(vec![None; table.height()])
        }
    }

    /// Write a report to `<output_dir>/<base_name>_report.json`.
    pub fn write_report_to_file(
        &self,
        report: &AnalysisReport,
        report_base_name: &str,
    ) -> Result<PathBuf> {
        fs::create_dir_all(&self.output_dir)?;

        let report_path = self
            .output_dir
            .join(format!("{}_report.json", report_base_name));
        let mut file = File::create(&report_path)?;
        file.write_all(serde_json::to_string_pretty(report)?.as_bytes())?;

        info!("Report saved: {}", report_path.display());

        Ok(report_path)
    }
}
