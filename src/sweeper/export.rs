use super::excel::write_excel;
use super::types::{ExportPayload, FileFormat, Table};
use crate::error::{Result, SweeperError};
use polars::prelude::*;

/// Serialises a table for download. Export never mutates the table.
///
/// - CSV: header row, no index column
/// - Excel: one worksheet with a header row
/// - JSON: array of row objects in column order, indented by two spaces
///
/// # Errors
///
/// Returns an error if the table cannot be written in the requested format.
pub fn export_table(table: &Table, format: FileFormat) -> Result<ExportPayload> {
    let bytes = match format {
        FileFormat::Csv => write_csv(table)?,
        FileFormat::Excel => write_excel(table)?,
        FileFormat::Json => write_json(table)?,
    };
    tracing::debug!(
        bytes = bytes.len(),
        format = format.as_str(),
        "exported table"
    );

    Ok(ExportPayload {
        bytes,
        file_name: format!("output.{}", format.extension()),
        media_type: format.media_type(),
    })
}

pub fn write_csv(table: &Table) -> Result<Vec<u8>> {
    let mut df = table.frame().clone();
    let mut buf = Vec::new();
    CsvWriter::new(&mut buf)
        .include_header(true)
        .finish(&mut df)
        .map_err(|e| SweeperError::DataProcessing(format!("Failed to write CSV: {e}")))?;
    Ok(buf)
}

pub fn write_json(table: &Table) -> Result<Vec<u8>> {
    let mut df = table.frame().clone();
    let mut compact = Vec::new();
    JsonWriter::new(&mut compact)
        .with_json_format(JsonFormat::Json)
        .finish(&mut df)
        .map_err(|e| SweeperError::DataProcessing(format!("Failed to write JSON: {e}")))?;

    // Re-indent; `preserve_order` keeps the keys in column order.
    serde_json::from_slice::<serde_json::Value>(&compact)
        .and_then(|rows| serde_json::to_vec_pretty(&rows))
        .map_err(|e| SweeperError::DataProcessing(format!("Failed to format JSON: {e}")))
}
