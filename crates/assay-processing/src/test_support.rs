//! Fixtures shared by unit tests.

use polars::prelude::*;

use crate::table::AssayTable;

/// Twenty intervals over two holes with a few unmeasured grades:
/// 12 `Good`, 5 `Fair` and 3 `Rejected` samples.
pub(crate) fn sample_frame() -> DataFrame {
    let sample_ids: Vec<String> = (1..=20).map(|i| format!("TEST-{i:04}")).collect();
    let holes: Vec<&str> = std::iter::repeat_n("DH-01", 10)
        .chain(std::iter::repeat_n("DH-02", 10))
        .collect();
    let from: Vec<f64> = (0..20).map(|i| ((i % 10) * 5) as f64).collect();
    let to: Vec<f64> = from.iter().map(|d| d + 5.0).collect();
    let lithology: Vec<&str> = std::iter::repeat_n("Granite", 8)
        .chain(std::iter::repeat_n("Basalt", 12))
        .collect();
    let quality: Vec<&str> = std::iter::repeat_n("Good", 12)
        .chain(std::iter::repeat_n("Fair", 5))
        .chain(std::iter::repeat_n("Rejected", 3))
        .collect();
    let dates: Vec<&str> = std::iter::repeat_n("2024-01-15", 20).collect();

    df![
        "sample_id" => sample_ids,
        "hole_id" => holes,
        "from_depth" => from,
        "to_depth" => to,
        "lithology" => lithology,
        "Au_ppm" => [Some(0.5), Some(1.2), Some(0.8), Some(2.5), None, Some(0.3), Some(5.5), Some(1.1), Some(0.9), Some(1.5),
                     Some(0.4), Some(0.6), Some(1.8), Some(0.7), Some(3.2), None, Some(0.5), Some(1.3), Some(0.8), Some(2.1)],
        "Cu_pct" => [Some(0.3), Some(0.8), Some(0.5), Some(1.2), Some(0.4), None, Some(2.1), Some(0.6), Some(0.7), Some(0.9),
                     Some(0.2), Some(0.4), Some(1.0), Some(0.3), Some(1.5), Some(0.6), None, Some(0.8), Some(0.5), Some(1.1)],
        "Ag_ppm" => [Some(2.5), Some(5.0), Some(3.5), Some(8.0), Some(2.0), Some(1.5), Some(12.0), Some(4.0), Some(3.0), Some(5.5),
                     Some(1.5), Some(2.0), Some(6.0), Some(2.5), Some(9.0), Some(3.5), Some(2.0), None, Some(3.5), Some(7.0)],
        "Fe_pct" => [5.0, 6.2, 5.5, 7.0, 4.8, 5.3, 8.0, 5.8, 6.0, 6.5,
                     4.5, 5.0, 6.8, 5.2, 7.5, 6.0, 5.5, 6.3, 5.8, 7.2],
        "S_pct" => [1.0, 1.5, 1.2, 2.0, 0.8, 1.1, 2.5, 1.3, 1.4, 1.6,
                    0.7, 0.9, 1.8, 1.0, 2.2, 1.4, 1.2, 1.5, 1.3, 1.9],
        "sample_quality" => quality,
        "assay_date" => dates,
    ]
    .expect("fixture frame")
}

pub(crate) fn sample_table() -> AssayTable {
    AssayTable::new(sample_frame())
}

/// Read a float cell, panicking on null.
pub(crate) fn f64_at(table: &AssayTable, column: &str, row: usize) -> f64 {
    table.numeric_values(column).unwrap()[row].expect("non-null cell")
}
