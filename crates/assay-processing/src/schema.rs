//! The closed column schema of an assay table.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::AssayError;

/// Derived interval length column, added by
/// [`DataCleaner::calculate_sample_interval`](crate::cleaner::DataCleaner::calculate_sample_interval).
pub const INTERVAL_LENGTH: &str = "interval_length";

/// Composite group identifier added by compositing.
pub const COMPOSITE_ID: &str = "composite_id";
/// Total interval length of a composite group.
pub const COMPOSITE_LENGTH: &str = "composite_length";
/// Number of samples in a composite group.
pub const COMPOSITE_SAMPLES: &str = "composite_samples";

/// Known sample quality labels. Quality is free text; these are the labels
/// the lab produces.
pub const QUALITY_GOOD: &str = "Good";
pub const QUALITY_FAIR: &str = "Fair";
pub const QUALITY_REJECTED: &str = "Rejected";

/// Name of the composite grade column for an element column.
pub fn composite_grade_column(element: &str) -> String {
    format!("composite_{element}")
}

/// Every column an assay table is expected to carry, in file order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssayColumn {
    SampleId,
    HoleId,
    FromDepth,
    ToDepth,
    Lithology,
    Grade(GradeColumn),
    SampleQuality,
    AssayDate,
}

impl AssayColumn {
    pub const ALL: [AssayColumn; 12] = [
        AssayColumn::SampleId,
        AssayColumn::HoleId,
        AssayColumn::FromDepth,
        AssayColumn::ToDepth,
        AssayColumn::Lithology,
        AssayColumn::Grade(GradeColumn::Au),
        AssayColumn::Grade(GradeColumn::Cu),
        AssayColumn::Grade(GradeColumn::Ag),
        AssayColumn::Grade(GradeColumn::Fe),
        AssayColumn::Grade(GradeColumn::S),
        AssayColumn::SampleQuality,
        AssayColumn::AssayDate,
    ];

    /// Header name as it appears in the source file.
    pub fn name(self) -> &'static str {
        match self {
            Self::SampleId => "sample_id",
            Self::HoleId => "hole_id",
            Self::FromDepth => "from_depth",
            Self::ToDepth => "to_depth",
            Self::Lithology => "lithology",
            Self::Grade(grade) => grade.column_name(),
            Self::SampleQuality => "sample_quality",
            Self::AssayDate => "assay_date",
        }
    }

    /// Whether the column holds floating point values.
    pub fn is_numeric(self) -> bool {
        matches!(self, Self::FromDepth | Self::ToDepth | Self::Grade(_))
    }

    /// Names of the numeric columns (depths and grades).
    pub fn numeric_names() -> impl Iterator<Item = &'static str> {
        Self::ALL
            .into_iter()
            .filter(|c| c.is_numeric())
            .map(|c| c.name())
    }
}

impl fmt::Display for AssayColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Element grade columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum GradeColumn {
    #[serde(rename = "Au_ppm")]
    Au,
    #[serde(rename = "Cu_pct")]
    Cu,
    #[serde(rename = "Ag_ppm")]
    Ag,
    #[serde(rename = "Fe_pct")]
    Fe,
    #[serde(rename = "S_pct")]
    S,
}

impl GradeColumn {
    pub const ALL: [GradeColumn; 5] = [
        GradeColumn::Au,
        GradeColumn::Cu,
        GradeColumn::Ag,
        GradeColumn::Fe,
        GradeColumn::S,
    ];

    pub fn column_name(self) -> &'static str {
        match self {
            Self::Au => "Au_ppm",
            Self::Cu => "Cu_pct",
            Self::Ag => "Ag_ppm",
            Self::Fe => "Fe_pct",
            Self::S => "S_pct",
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Self::Au => "Au",
            Self::Cu => "Cu",
            Self::Ag => "Ag",
            Self::Fe => "Fe",
            Self::S => "S",
        }
    }

    /// Look up a grade column by element symbol (`"Au"`) or column name (`"Au_ppm"`).
    pub fn from_symbol(value: &str) -> Option<Self> {
        let value = value.trim();
        Self::ALL
            .into_iter()
            .find(|g| g.symbol().eq_ignore_ascii_case(value) || g.column_name() == value)
    }

    /// All grade column names in schema order.
    pub fn names() -> Vec<&'static str> {
        Self::ALL.iter().map(|g| g.column_name()).collect()
    }
}

impl fmt::Display for GradeColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column_name())
    }
}

impl FromStr for GradeColumn {
    type Err = AssayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_symbol(s)
            .ok_or_else(|| AssayError::InvalidArgument(format!("unknown element '{s}'")))
    }
}
