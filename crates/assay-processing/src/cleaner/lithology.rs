//! Lithology name normalisation.

use polars::prelude::*;

use crate::error::Result;
use crate::schema::AssayColumn;
use crate::table::AssayTable;

pub(super) fn standardize_lithology_names(table: &AssayTable) -> Result<AssayTable> {
    let name = AssayColumn::Lithology.name();
    let titled: Vec<Option<String>> = table
        .text_values(name)?
        .into_iter()
        .map(|v| v.map(|s| title_case(&s)))
        .collect();

    table.with_series(Series::new(name.into(), titled))
}

/// Uppercase the first letter of each whitespace-delimited word and lowercase
/// the rest. Whitespace is kept as is.
pub(crate) fn title_case(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut word_start = true;
    for ch in value.chars() {
        if ch.is_whitespace() {
            word_start = true;
            out.push(ch);
        } else if word_start {
            word_start = false;
            out.extend(ch.to_uppercase());
        } else {
            out.extend(ch.to_lowercase());
        }
    }
    out
}
