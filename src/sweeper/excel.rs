//! Excel workbooks: reading the first worksheet and writing a single-sheet `.xlsx`.
//!
//! Reading goes through `calamine`, which understands both `.xlsx` and legacy
//! `.xls`. Writing produces the smallest valid SpreadsheetML package by hand:
//! a zip archive holding the content types, relationships, the workbook and one
//! worksheet whose text cells are stored inline (no shared string table).

use super::types::{ColumnKind, Table, datetime_dtype};
use crate::error::{Result, SweeperError};
use calamine::{Data, DataType as _, Reader as _, open_workbook_auto_from_rs};
use polars::prelude::{Column, DataFrame, DataType, NamedFrom as _, Series};
use std::fmt::Write as _;
use std::io::{Cursor, Write as _};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

pub const SHEET_NAME: &str = "Sheet1";

const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/><Override PartName="/xl/worksheets/sheet1.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/></Types>"#;

const ROOT_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/></Relationships>"#;

const WORKBOOK_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/></Relationships>"#;

const SHEET_NS: &str = "http://schemas.openxmlformats.org/spreadsheetml/2006/main";

/// Reads the first worksheet; the first row holds the column names.
///
/// # Errors
///
/// Returns [`SweeperError::Load`] for unreadable workbooks, workbooks without
/// worksheets and empty worksheets.
pub fn read_excel(bytes: &[u8]) -> Result<DataFrame> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))
        .map_err(|e| SweeperError::Load(format!("Failed to open Excel workbook: {e}")))?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| SweeperError::Load("Excel workbook has no worksheets".to_owned()))?
        .map_err(|e| SweeperError::Load(format!("Failed to read Excel worksheet: {e}")))?;

    let mut rows = range.rows();
    let header = rows
        .next()
        .ok_or_else(|| SweeperError::Load("Excel worksheet is empty".to_owned()))?;
    let names: Vec<String> = header
        .iter()
        .map(|cell| cell_text(cell).unwrap_or_default())
        .collect();
    let body: Vec<&[Data]> = rows.collect();

    let columns = names
        .iter()
        .enumerate()
        .map(|(idx, name)| {
            let cells: Vec<Option<&Data>> = body
                .iter()
                .map(|row| row.get(idx).filter(|cell| !cell.is_empty()))
                .collect();
            column_from_cells(name, &cells)
        })
        .collect::<Result<Vec<_>>>()?;

    DataFrame::new(columns).map_err(|e| SweeperError::Load(format!("Invalid Excel header: {e}")))
}

fn cell_text(cell: &Data) -> Option<String> {
    match cell {
        Data::Empty => None,
        Data::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// All-number columns become numeric (integers when every value is whole),
/// all-date columns become datetimes, anything else is kept as text.
fn column_from_cells(name: &str, cells: &[Option<&Data>]) -> Result<Column> {
    let present: Vec<&Data> = cells.iter().flatten().copied().collect();
    let all_numeric =
        !present.is_empty() && present.iter().all(|c| matches!(c, Data::Int(_) | Data::Float(_)));
    let all_dates = !present.is_empty()
        && present
            .iter()
            .all(|c| matches!(c, Data::DateTime(_) | Data::DateTimeIso(_)));

    let series = if all_numeric {
        let whole = present.iter().all(|c| match c {
            Data::Float(f) => f.fract() == 0.0 && f.abs() < 9.0e15,
            _ => true,
        });
        if whole {
            let values: Vec<Option<i64>> = cells
                .iter()
                .map(|cell| cell.and_then(|c| c.as_i64()))
                .collect();
            Series::new(name.into(), values)
        } else {
            let values: Vec<Option<f64>> = cells
                .iter()
                .map(|cell| cell.and_then(|c| c.as_f64()))
                .collect();
            Series::new(name.into(), values)
        }
    } else if all_dates {
        let values: Vec<Option<i64>> = cells
            .iter()
            .map(|cell| {
                cell.and_then(|c| c.as_datetime())
                    .map(|dt| dt.and_utc().timestamp_millis())
            })
            .collect();
        Series::new(name.into(), values).cast(&datetime_dtype())?
    } else {
        let values: Vec<Option<String>> = cells
            .iter()
            .map(|cell| cell.and_then(cell_text))
            .collect();
        Series::new(name.into(), values)
    };

    Ok(Column::from(series))
}

enum CellValues {
    Integers(Vec<Option<i64>>),
    Numbers(Vec<Option<f64>>),
    Strings(Vec<Option<String>>),
}

impl CellValues {
    fn from_table(table: &Table, name: &str, kind: ColumnKind) -> Result<Self> {
        let series = table.series(name)?;
        if kind == ColumnKind::Numeric && series.dtype().is_integer() {
            let integers = series.cast(&DataType::Int64)?;
            Ok(Self::Integers(integers.i64()?.into_iter().collect()))
        } else if kind == ColumnKind::Numeric {
            let floats = series.cast(&DataType::Float64)?;
            Ok(Self::Numbers(floats.f64()?.into_iter().collect()))
        } else {
            let strings = series.cast(&DataType::String)?;
            Ok(Self::Strings(
                strings
                    .str()?
                    .into_iter()
                    .map(|v| v.map(str::to_owned))
                    .collect(),
            ))
        }
    }
}

/// Serialises the table as a single-worksheet `.xlsx` package.
///
/// # Errors
///
/// Returns an error if column values cannot be extracted or the archive cannot
/// be assembled.
pub fn write_excel(table: &Table) -> Result<Vec<u8>> {
    let names = table.column_names();
    let columns = names
        .iter()
        .zip(table.kinds())
        .map(|(name, kind)| CellValues::from_table(table, name, *kind))
        .collect::<Result<Vec<_>>>()?;

    let sheet = sheet_xml(&names, &columns, table.height())
        .map_err(|e| SweeperError::DataProcessing(format!("Failed to render worksheet: {e}")))?;
    let workbook = workbook_xml();

    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    for (path, body) in [
        ("[Content_Types].xml", CONTENT_TYPES),
        ("_rels/.rels", ROOT_RELS),
        ("xl/workbook.xml", workbook.as_str()),
        ("xl/_rels/workbook.xml.rels", WORKBOOK_RELS),
        ("xl/worksheets/sheet1.xml", sheet.as_str()),
    ] {
        zip.start_file(path, options)
            .map_err(|e| SweeperError::DataProcessing(format!("Failed to write {path}: {e}")))?;
        zip.write_all(body.as_bytes())?;
    }

    let cursor = zip
        .finish()
        .map_err(|e| SweeperError::DataProcessing(format!("Failed to finish workbook: {e}")))?;
    Ok(cursor.into_inner())
}

fn workbook_xml() -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<workbook xmlns="{SHEET_NS}" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><sheets><sheet name="{SHEET_NAME}" sheetId="1" r:id="rId1"/></sheets></workbook>"#
    )
}

fn sheet_xml(
    names: &[String],
    columns: &[CellValues],
    height: usize,
) -> std::result::Result<String, std::fmt::Error> {
    let mut xml = String::new();
    write!(
        xml,
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<worksheet xmlns="{SHEET_NS}"><sheetData>"#
    )?;

    write!(xml, r#"<row r="1">"#)?;
    for (idx, name) in names.iter().enumerate() {
        write_text_cell(&mut xml, &cell_ref(idx, 1), name)?;
    }
    write!(xml, "</row>")?;

    for row in 0..height {
        let row_number = row + 2;
        write!(xml, r#"<row r="{row_number}">"#)?;
        for (idx, values) in columns.iter().enumerate() {
            let reference = cell_ref(idx, row_number);
            match values {
                CellValues::Integers(v) => {
                    if let Some(Some(n)) = v.get(row) {
                        write!(xml, r#"<c r="{reference}"><v>{n}</v></c>"#)?;
                    }
                }
                CellValues::Numbers(v) => match v.get(row).copied().flatten() {
                    Some(n) if n.is_finite() => {
                        write!(xml, r#"<c r="{reference}"><v>{n}</v></c>"#)?;
                    }
                    Some(n) => write_text_cell(&mut xml, &reference, &n.to_string())?,
                    None => {}
                },
                CellValues::Strings(v) => {
                    if let Some(Some(s)) = v.get(row) {
                        write_text_cell(&mut xml, &reference, s)?;
                    }
                }
            }
        }
        write!(xml, "</row>")?;
    }

    write!(xml, "</sheetData></worksheet>")?;
    Ok(xml)
}

fn write_text_cell(xml: &mut String, reference: &str, text: &str) -> std::fmt::Result {
    write!(
        xml,
        r#"<c r="{reference}" t="inlineStr"><is><t xml:space="preserve">{}</t></is></c>"#,
        quick_xml::escape::escape(text)
    )
}

/// A1-style reference for a zero-based column index and one-based row.
fn cell_ref(column: usize, row: usize) -> String {
    format!("{}{row}", column_letters(column))
}

fn column_letters(mut idx: usize) -> String {
    let mut letters = Vec::new();
    loop {
        letters.push(char::from(b'A' + (idx % 26) as u8));
        if idx < 26 {
            break;
        }
        idx = idx / 26 - 1;
    }
    letters.iter().rev().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;

    #[test]
    fn test_column_letters() {
        assert_eq!(column_letters(0), "A");
        assert_eq!(column_letters(25), "Z");
        assert_eq!(column_letters(26), "AA");
        assert_eq!(column_letters(27), "AB");
        assert_eq!(column_letters(701), "ZZ");
        assert_eq!(column_letters(702), "AAA");
    }

    #[test]
    fn test_text_cells_are_escaped() -> anyhow::Result<()> {
        let mut xml = String::new();
        write_text_cell(&mut xml, "A1", "R&D <team>")?;
        assert!(xml.contains("R&amp;D &lt;team&gt;"));
        Ok(())
    }

    #[test]
    fn test_integer_cells_keep_every_digit() -> anyhow::Result<()> {
        let names = vec!["id".to_owned(), "score".to_owned()];
        let columns = [
            CellValues::Integers(vec![Some(9_007_199_254_740_993), None]),
            CellValues::Numbers(vec![Some(0.5), Some(f64::NAN)]),
        ];
        let xml = sheet_xml(&names, &columns, 2)?;

        assert!(xml.contains(r#"<c r="A2"><v>9007199254740993</v></c>"#));
        assert!(!xml.contains(r#"r="A3""#));
        assert!(xml.contains(r#"<c r="B2"><v>0.5</v></c>"#));
        assert!(xml.contains(r#"<c r="B3" t="inlineStr"><is><t xml:space="preserve">NaN</t>"#));
        Ok(())
    }

    /// A workbook whose column B holds date-formatted serial numbers.
    fn workbook_with_dates() -> anyhow::Result<Vec<u8>> {
        let styles = format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<styleSheet xmlns="{SHEET_NS}"><cellXfs count="2"><xf numFmtId="0"/><xf numFmtId="14" applyNumberFormat="1"/></cellXfs></styleSheet>"#
        );
        let sheet = format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<worksheet xmlns="{SHEET_NS}"><sheetData><row r="1"><c r="A1" t="inlineStr"><is><t>id</t></is></c><c r="B1" t="inlineStr"><is><t>joined</t></is></c></row><row r="2"><c r="A2"><v>1</v></c><c r="B2" s="1"><v>45296</v></c></row><row r="3"><c r="A3"><v>2</v></c></row><row r="4"><c r="A4"><v>3</v></c><c r="B4" s="1"><v>45297</v></c></row></sheetData></worksheet>"#
        );
        let workbook = workbook_xml();

        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default();
        for (path, body) in [
            ("[Content_Types].xml", CONTENT_TYPES),
            ("_rels/.rels", ROOT_RELS),
            ("xl/workbook.xml", workbook.as_str()),
            ("xl/_rels/workbook.xml.rels", WORKBOOK_RELS),
            ("xl/styles.xml", styles.as_str()),
            ("xl/worksheets/sheet1.xml", sheet.as_str()),
        ] {
            zip.start_file(path, options)?;
            zip.write_all(body.as_bytes())?;
        }
        Ok(zip.finish()?.into_inner())
    }

    #[test]
    fn test_read_date_cells_as_datetime() -> anyhow::Result<()> {
        let df = read_excel(&workbook_with_dates()?)?;

        let joined = df.column("joined")?.as_materialized_series();
        assert_eq!(joined.dtype(), &datetime_dtype());
        let millis: Vec<Option<i64>> = joined.cast(&DataType::Int64)?.i64()?.into_iter().collect();
        // Excel serial 45296 is 2024-01-05.
        assert_eq!(
            millis,
            vec![Some(1_704_412_800_000), None, Some(1_704_499_200_000)]
        );
        assert_eq!(df.column("id")?.dtype(), &DataType::Int64);
        Ok(())
    }

    #[test]
    fn test_read_rejects_garbage() {
        let result = read_excel(b"definitely not a workbook");
        assert!(matches!(result, Err(SweeperError::Load(_))));
    }
}
