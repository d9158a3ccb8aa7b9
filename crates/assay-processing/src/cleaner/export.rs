//! Writing assay tables to CSV or an xlsx workbook.

use polars::prelude::*;
use std::fs::File;
use std::io::{BufWriter, Seek, Write};
use std::path::Path;
use std::str::FromStr;
use tracing::{error, info};
use ::zip::write::SimpleFileOptions;
use ::zip::{CompressionMethod, ZipWriter};

use crate::error::{AssayError, Result};
use crate::table::AssayTable;
use crate::utils::{f64_values, is_numeric_dtype, string_values};

/// Output container for an exported table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    /// Office Open XML workbook with a single sheet.
    Excel,
}

impl FromStr for ExportFormat {
    type Err = AssayError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "excel" | "xlsx" => Ok(Self::Excel),
            other => Err(AssayError::InvalidArgument(format!(
                "unsupported export format '{other}' (expected csv or excel)"
            ))),
        }
    }
}

/// Writes tables to disk.
pub struct Exporter;

impl Exporter {
    /// Export `table` to `path`, overwriting any existing file.
    ///
    /// Returns `Ok(false)` when the file could not be written so batch callers
    /// can carry on; an unsupported `format` is an error.
    pub fn export(table: &AssayTable, path: impl AsRef<Path>, format: &str) -> Result<bool> {
        let format: ExportFormat = format.parse()?;
        let path = path.as_ref();

        match Self::write(table, path, format) {
            Ok(()) => {
                info!(
                    "Exported {} rows to {} ({:?})",
                    table.height(),
                    path.display(),
                    format
                );
                Ok(true)
            }
            Err(e) => {
                error!("Failed to export to {}: {}", path.display(), e);
                Ok(false)
            }
        }
    }

    /// Export and propagate write failures.
    pub fn write(table: &AssayTable, path: &Path, format: ExportFormat) -> Result<()> {
        let file = File::create(path)?;
        match format {
            ExportFormat::Csv => {
                let mut writer = BufWriter::new(file);
                let mut df = table.frame().clone();
                CsvWriter::new(&mut writer)
                    .include_header(true)
                    .with_separator(b',')
                    .finish(&mut df)?;
                writer.flush()?;
            }
            ExportFormat::Excel => write_xlsx(table, file)?,
        }
        Ok(())
    }
}

const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/><Override PartName="/xl/worksheets/sheet1.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/></Types>"#;

const ROOT_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/></Relationships>"#;

const WORKBOOK: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><sheets><sheet name="Assays" sheetId="1" r:id="rId1"/></sheets></workbook>"#;

const WORKBOOK_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/></Relationships>"#;

/// Write a single-sheet workbook package.
fn write_xlsx<W: Write + Seek>(table: &AssayTable, out: W) -> Result<()> {
    let mut zip = ZipWriter::new(out);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    for (name, body) in [
        ("[Content_Types].xml", CONTENT_TYPES),
        ("_rels/.rels", ROOT_RELS),
        ("xl/workbook.xml", WORKBOOK),
        ("xl/_rels/workbook.xml.rels", WORKBOOK_RELS),
    ] {
        zip.start_file(name, options)?;
        zip.write_all(body.as_bytes())?;
    }

    zip.start_file("xl/worksheets/sheet1.xml", options)?;
    zip.write_all(sheet_xml(table)?.as_bytes())?;
    zip.finish()?;
    Ok(())
}

enum CellColumn {
    Number(Vec<Option<f64>>),
    Text(Vec<Option<String>>),
}

fn sheet_xml(table: &AssayTable) -> Result<String> {
    let frame = table.frame();
    let columns = frame
        .get_columns()
        .iter()
        .map(|c| {
            let series = c.as_materialized_series();
            Ok(if is_numeric_dtype(series.dtype()) {
                CellColumn::Number(f64_values(series)?)
            } else {
                CellColumn::Text(string_values(series)?)
            })
        })
        .collect::<PolarsResult<Vec<_>>>()?;

    let mut xml = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><sheetData>"#,
    );

    xml.push_str(r#"<row r="1">"#);
    for (col, name) in table.column_names().iter().enumerate() {
        push_text_cell(&mut xml, &cell_ref(col, 1), name);
    }
    xml.push_str("</row>");

    for row in 0..table.height() {
        let r = row + 2;
        xml.push_str(&format!(r#"<row r="{r}">"#));
        for (col, values) in columns.iter().enumerate() {
            let reference = cell_ref(col, r);
            match values {
                CellColumn::Number(v) => {
                    if let Some(x) = v[row].filter(|x| x.is_finite()) {
                        xml.push_str(&format!(r#"<c r="{reference}"><v>{x}</v></c>"#));
                    }
                }
                CellColumn::Text(v) => {
                    if let Some(s) = &v[row] {
                        push_text_cell(&mut xml, &reference, s);
                    }
                }
            }
        }
        xml.push_str("</row>");
    }

    xml.push_str("</sheetData></worksheet>");
    Ok(xml)
}

fn push_text_cell(xml: &mut String, reference: &str, text: &str) {
    xml.push_str(&format!(
        r#"<c r="{reference}" t="inlineStr"><is><t>{}</t></is></c>"#,
        quick_xml::escape::escape(text)
    ));
}

/// A1-style reference for a zero-based column and one-based row.
fn cell_ref(col: usize, row: usize) -> String {
    let mut letters = Vec::new();
    let mut n = col + 1;
    while n > 0 {
        let rem = (n - 1) % 26;
        letters.push(b'A' + rem as u8);
        n = (n - 1) / 26;
    }
    letters.reverse();
    format!("{}{}", String::from_utf8_lossy(&letters), row)
}
