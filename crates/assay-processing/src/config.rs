//! Configuration types for assay analysis.
//!
//! Thresholds that analysis functions would otherwise hide as literals live
//! here as named constants and as fields of [`AnalysisConfig`], so callers and
//! tests can see and override them.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::cleaner::{MissingValueStrategy, OutlierMethod};
use crate::schema::{GradeColumn, QUALITY_GOOD};

/// Multiplier used for the anomaly counts in a summary report.
pub const DEFAULT_SUMMARY_ANOMALY_MULTIPLIER: f64 = 2.5;
/// Default caller-side anomaly multiplier.
pub const DEFAULT_ANOMALY_THRESHOLD_MULTIPLIER: f64 = 2.5;
/// IQR multiplier for outlier rejection.
pub const DEFAULT_IQR_THRESHOLD: f64 = 1.5;
/// Standard deviations for z-score outlier rejection.
pub const DEFAULT_ZSCORE_THRESHOLD: f64 = 3.0;
/// Largest gap in metres between intervals that still counts as adjacent.
pub const DEFAULT_COMPOSITE_MAX_GAP: f64 = 0.5;

/// Configuration for an analysis run.
///
/// Use [`AnalysisConfig::builder()`] for a validated configuration, or
/// [`AnalysisConfig::from_variant_file`] to read the parameter file used by
/// assignment variants.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Element the run focuses on.
    /// Default: Au
    pub primary_element: GradeColumn,

    /// Elements included in correlations and the summary report.
    /// Default: all five grade columns
    pub elements: Vec<GradeColumn>,

    /// `sample_quality` label kept by quality filtering (exact match).
    /// Default: "Good"
    pub quality_filter: String,

    /// Standard deviations above the mean for anomaly detection.
    /// Default: 2.5
    pub anomaly_threshold_multiplier: f64,

    /// Fixed multiplier behind the summary report's anomaly counts.
    /// Default: 2.5
    pub summary_anomaly_multiplier: f64,

    /// Missing value strategy applied before export, if any.
    /// Default: None
    pub missing_strategy: Option<MissingValueStrategy>,

    /// Outlier method applied to the primary element before export, if any.
    /// Default: None
    pub outlier_method: Option<OutlierMethod>,

    /// Outlier threshold; None uses the method's own default.
    /// Default: None
    pub outlier_threshold: Option<f64>,

    /// Maximum gap for adjacent-sample compositing.
    /// Default: 0.5
    pub composite_max_gap: f64,

    /// Output directory for reports and exported tables.
    /// Default: "output"
    pub output_dir: PathBuf,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            primary_element: GradeColumn::Au,
            elements: GradeColumn::ALL.to_vec(),
            quality_filter: QUALITY_GOOD.to_string(),
            anomaly_threshold_multiplier: DEFAULT_ANOMALY_THRESHOLD_MULTIPLIER,
            summary_anomaly_multiplier: DEFAULT_SUMMARY_ANOMALY_MULTIPLIER,
            missing_strategy: None,
            outlier_method: None,
            outlier_threshold: None,
            composite_max_gap: DEFAULT_COMPOSITE_MAX_GAP,
            output_dir: PathBuf::from("output"),
        }
    }
}

impl AnalysisConfig {
    /// Create a new configuration builder.
    pub fn builder() -> AnalysisConfigBuilder {
        AnalysisConfigBuilder::default()
    }

    /// Threshold to use for the configured outlier method.
    pub fn effective_outlier_threshold(&self) -> Option<f64> {
        self.outlier_method
            .map(|m| self.outlier_threshold.unwrap_or_else(|| m.default_threshold()))
    }

    /// Validate the configuration and return errors if invalid.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        for (field, value) in [
            ("anomaly_threshold_multiplier", self.anomaly_threshold_multiplier),
            ("summary_anomaly_multiplier", self.summary_anomaly_multiplier),
        ] {
            if !value.is_finite() {
                return Err(ConfigValidationError::NonFinite {
                    field: field.to_string(),
                    value,
                });
            }
        }

        if let Some(threshold) = self.outlier_threshold
            && !(threshold.is_finite() && threshold >= 0.0)
        {
            return Err(ConfigValidationError::NegativeValue {
                field: "outlier_threshold".to_string(),
                value: threshold,
            });
        }

        if !(self.composite_max_gap.is_finite() && self.composite_max_gap >= 0.0) {
            return Err(ConfigValidationError::NegativeValue {
                field: "composite_max_gap".to_string(),
                value: self.composite_max_gap,
            });
        }

        if self.elements.is_empty() {
            return Err(ConfigValidationError::NoElements);
        }

        Ok(())
    }

    /// Parse a variant parameter document.
    ///
    /// ```json
    /// {"parameters": {"primary_element": "Au", "secondary_elements": ["Cu", "Ag"],
    ///                 "quality_filter": "Good", "anomaly_threshold_multiplier": 2.5}}
    /// ```
    pub fn from_variant_json(json: &str) -> Result<Self, ConfigValidationError> {
        let variant: VariantConfig = serde_json::from_str(json)
            .map_err(|e| ConfigValidationError::Malformed(e.to_string()))?;
        variant.into_config()
    }

    /// Read a variant parameter file from disk.
    pub fn from_variant_file(path: impl AsRef<Path>) -> Result<Self, ConfigValidationError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            ConfigValidationError::Malformed(format!("{}: {}", path.display(), e))
        })?;
        Self::from_variant_json(&content)
    }
}

/// Errors that can occur during configuration validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("Invalid value for '{field}': {value} (must be a finite number)")]
    NonFinite { field: String, value: f64 },

    #[error("Invalid value for '{field}': {value} (must be finite and non-negative)")]
    NegativeValue { field: String, value: f64 },

    #[error("Unknown element '{0}' (expected one of Au, Cu, Ag, Fe, S)")]
    UnknownElement(String),

    #[error("At least one element must be analysed")]
    NoElements,

    #[error("Malformed configuration: {0}")]
    Malformed(String),
}

/// Variant parameter file, as handed out per student variant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VariantConfig {
    pub parameters: VariantParameters,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VariantParameters {
    pub primary_element: String,
    #[serde(default)]
    pub secondary_elements: Vec<String>,
    pub quality_filter: String,
    pub anomaly_threshold_multiplier: f64,
    #[serde(default)]
    pub num_assays: Option<usize>,
}

impl VariantConfig {
    /// Map element symbols to grade columns and build a validated config.
    pub fn into_config(self) -> Result<AnalysisConfig, ConfigValidationError> {
        let params = self.parameters;
        let lookup = |symbol: &str| {
            GradeColumn::from_symbol(symbol)
                .ok_or_else(|| ConfigValidationError::UnknownElement(symbol.to_string()))
        };

        let primary = lookup(&params.primary_element)?;
        let mut elements = vec![primary];
        for symbol in &params.secondary_elements {
            let element = lookup(symbol)?;
            if !elements.contains(&element) {
                elements.push(element);
            }
        }

        AnalysisConfig::builder()
            .primary_element(primary)
            .elements(elements)
            .quality_filter(params.quality_filter)
            .anomaly_threshold_multiplier(params.anomaly_threshold_multiplier)
            .build()
    }
}

/// Builder for [`AnalysisConfig`] with fluent API.
#[derive(Debug, Default)]
pub struct AnalysisConfigBuilder {
    primary_element: Option<GradeColumn>,
    elements: Option<Vec<GradeColumn>>,
    quality_filter: Option<String>,
    anomaly_threshold_multiplier: Option<f64>,
    summary_anomaly_multiplier: Option<f64>,
    missing_strategy: Option<MissingValueStrategy>,
    outlier_method: Option<OutlierMethod>,
    outlier_threshold: Option<f64>,
    composite_max_gap: Option<f64>,
    output_dir: Option<PathBuf>,
}

impl AnalysisConfigBuilder {
    /// Set the primary element.
    pub fn primary_element(mut self, element: GradeColumn) -> Self {
        self.primary_element = Some(element);
        self
    }

    /// Set the elements covered by correlations and the summary report.
    pub fn elements(mut self, elements: Vec<GradeColumn>) -> Self {
        self.elements = Some(elements);
        self
    }

    /// Set the quality label to keep.
    pub fn quality_filter(mut self, quality: impl Into<String>) -> Self {
        self.quality_filter = Some(quality.into());
        self
    }

    /// Set the anomaly threshold multiplier (k in mean + k·std).
    pub fn anomaly_threshold_multiplier(mut self, k: f64) -> Self {
        self.anomaly_threshold_multiplier = Some(k);
        self
    }

    /// Override the summary report's anomaly multiplier.
    pub fn summary_anomaly_multiplier(mut self, k: f64) -> Self {
        self.summary_anomaly_multiplier = Some(k);
        self
    }

    /// Set the missing value strategy applied before export.
    pub fn missing_strategy(mut self, strategy: MissingValueStrategy) -> Self {
        self.missing_strategy = Some(strategy);
        self
    }

    /// Set the outlier method applied before export.
    pub fn outlier_method(mut self, method: OutlierMethod) -> Self {
        self.outlier_method = Some(method);
        self
    }

    /// Set the outlier threshold.
    ///
    /// The threshold means different things per method (IQR multiplier vs.
    /// standard deviations); it is not converted between them.
    pub fn outlier_threshold(mut self, threshold: f64) -> Self {
        self.outlier_threshold = Some(threshold);
        self
    }

    /// Set the maximum compositing gap in metres.
    pub fn composite_max_gap(mut self, gap: f64) -> Self {
        self.composite_max_gap = Some(gap);
        self
    }

    /// Set the output directory for reports and exported tables.
    pub fn output_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(path.into());
        self
    }

    /// Build the configuration.
    ///
    /// Returns a validated `AnalysisConfig` or an error if validation fails.
    pub fn build(self) -> Result<AnalysisConfig, ConfigValidationError> {
        let defaults = AnalysisConfig::default();
        let config = AnalysisConfig {
            primary_element: self.primary_element.unwrap_or(defaults.primary_element),
            elements: self.elements.unwrap_or(defaults.elements),
            quality_filter: self.quality_filter.unwrap_or(defaults.quality_filter),
            anomaly_threshold_multiplier: self
                .anomaly_threshold_multiplier
                .unwrap_or(defaults.anomaly_threshold_multiplier),
            summary_anomaly_multiplier: self
                .summary_anomaly_multiplier
                .unwrap_or(defaults.summary_anomaly_multiplier),
            missing_strategy: self.missing_strategy,
            outlier_method: self.outlier_method,
            outlier_threshold: self.outlier_threshold,
            composite_max_gap: self.composite_max_gap.unwrap_or(defaults.composite_max_gap),
            output_dir: self.output_dir.unwrap_or(defaults.output_dir),
        };

        config.validate()?;
        Ok(config)
    }
}
