//! Data quality validation module.
//!
//! This module reports, without modifying anything, the conditions that make
//! an assay table suspect: missing values, duplicate sample ids, negative
//! grades, inverted depth intervals and rejected samples.

mod validator;

pub use validator::{QualityReport, QualityValidator};
