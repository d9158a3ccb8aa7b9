//! Depth intervals: filtering, lengths and adjacent-sample compositing.

use polars::prelude::*;
use std::cmp::Ordering;
use tracing::debug;

use crate::error::{AssayError, Result};
use crate::schema::{
    AssayColumn, COMPOSITE_ID, COMPOSITE_LENGTH, COMPOSITE_SAMPLES, INTERVAL_LENGTH,
    composite_grade_column,
};
use crate::table::AssayTable;

/// `to_depth - from_depth` per row, `None` where either depth is missing.
pub(crate) fn interval_lengths(table: &AssayTable) -> Result<Vec<Option<f64>>> {
    let from = table.numeric_values(AssayColumn::FromDepth.name())?;
    let to = table.numeric_values(AssayColumn::ToDepth.name())?;
    Ok(from
        .iter()
        .zip(&to)
        .map(|(f, t)| Some((*t)? - (*f)?))
        .collect())
}

pub(super) fn filter_by_depth_range(
    table: &AssayTable,
    min_depth: Option<f64>,
    max_depth: Option<f64>,
) -> Result<AssayTable> {
    for bound in [min_depth, max_depth].into_iter().flatten() {
        if bound.is_nan() {
            return Err(AssayError::InvalidArgument("depth bound is NaN".to_string()));
        }
    }

    let mut keep = vec![true; table.height()];
    if let Some(min_depth) = min_depth {
        let from = table.numeric_values(AssayColumn::FromDepth.name())?;
        for (flag, f) in keep.iter_mut().zip(from) {
            *flag &= f.is_some_and(|f| f >= min_depth);
        }
    }
    if let Some(max_depth) = max_depth {
        let to = table.numeric_values(AssayColumn::ToDepth.name())?;
        for (flag, t) in keep.iter_mut().zip(to) {
            *flag &= t.is_some_and(|t| t <= max_depth);
        }
    }

    let result = table.filter_rows(&keep)?;
    debug!(
        "Depth filter [{:?}, {:?}] kept {} of {} rows",
        min_depth,
        max_depth,
        result.height(),
        table.height()
    );
    Ok(result)
}

pub(super) fn calculate_sample_interval(table: &AssayTable) -> Result<AssayTable> {
    let lengths = interval_lengths(table)?;
    table.with_series(Series::new(INTERVAL_LENGTH.into(), lengths))
}

pub(super) fn merge_adjacent_samples(
    table: &AssayTable,
    element: &str,
    max_gap: f64,
) -> Result<AssayTable> {
    if !(max_gap.is_finite() && max_gap >= 0.0) {
        return Err(AssayError::InvalidArgument(format!(
            "maximum gap must be finite and non-negative, got {max_gap}"
        )));
    }

    let holes = table.text_values(AssayColumn::HoleId.name())?;
    let from = table.numeric_values(AssayColumn::FromDepth.name())?;
    let to = table.numeric_values(AssayColumn::ToDepth.name())?;
    let grades = table.numeric_values(element)?;

    let mut order: Vec<usize> = (0..table.height()).collect();
    order.sort_by(|&a, &b| {
        cmp_nulls_last(&holes[a], &holes[b], |x, y| x.cmp(y))
            .then_with(|| cmp_nulls_last(&from[a], &from[b], f64::total_cmp))
    });

    // Assign a 1-based group id to each row in sorted order
    let mut group_of = Vec::with_capacity(order.len());
    let mut group = 0u32;
    let mut prev: Option<usize> = None;
    for &row in &order {
        let adjacent = prev.is_some_and(|p| {
            holes[row].is_some()
                && holes[row] == holes[p]
                && match (to[p], from[row]) {
                    (Some(prev_to), Some(next_from)) => next_from - prev_to <= max_gap,
                    _ => false,
                }
        });
        if !adjacent {
            group += 1;
        }
        group_of.push(group);
        prev = Some(row);
    }

    // Per-group length, size and weighted grade
    let groups = group as usize;
    let mut length = vec![0.0f64; groups];
    let mut has_length = vec![false; groups];
    let mut samples = vec![0u32; groups];
    let mut weighted = vec![0.0f64; groups];
    let mut weight = vec![0.0f64; groups];

    for (&row, &g) in order.iter().zip(&group_of) {
        let g = g as usize - 1;
        samples[g] += 1;
        let interval = match (from[row], to[row]) {
            (Some(f), Some(t)) => Some((t - f).max(0.0)),
            _ => None,
        };
        if let Some(interval) = interval {
            length[g] += interval;
            has_length[g] = true;
            if let Some(grade) = grades[row] {
                weighted[g] += grade * interval;
                weight[g] += interval;
            }
        }
    }

    let composite_id: Vec<u32> = group_of.clone();
    let composite_length: Vec<Option<f64>> = group_of
        .iter()
        .map(|&g| has_length[g as usize - 1].then_some(length[g as usize - 1]))
        .collect();
    let composite_samples: Vec<u32> = group_of.iter().map(|&g| samples[g as usize - 1]).collect();
    let composite_grade: Vec<Option<f64>> = group_of
        .iter()
        .map(|&g| {
            let g = g as usize - 1;
            (weight[g] > 0.0).then(|| weighted[g] / weight[g])
        })
        .collect();

    let mut result = table.take_rows(&order)?;
    result = result.with_series(Series::new(COMPOSITE_ID.into(), composite_id))?;
    result = result.with_series(Series::new(COMPOSITE_LENGTH.into(), composite_length))?;
    result = result.with_series(Series::new(COMPOSITE_SAMPLES.into(), composite_samples))?;
    result = result.with_series(Series::new(
        composite_grade_column(element).as_str().into(),
        composite_grade,
    ))?;

    debug!(
        "Composited {} samples into {} groups for '{}' (max gap {})",
        table.height(),
        groups,
        element,
        max_gap
    );
    Ok(result)
}

fn cmp_nulls_last<T>(a: &Option<T>, b: &Option<T>, cmp: impl Fn(&T, &T) -> Ordering) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => cmp(x, y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}
