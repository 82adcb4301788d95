use super::excel::read_excel;
use super::types::{FileFormat, Table};
use crate::error::{Result, SweeperError};
use polars::prelude::*;
use std::io::Cursor;
use std::path::Path;

/// Parses raw upload bytes into a [`Table`].
///
/// # Errors
///
/// Returns [`SweeperError::Load`] when the bytes are malformed for `format` or
/// produce columns the table model cannot hold.
pub fn load_bytes(bytes: &[u8], format: FileFormat, infer_schema_length: usize) -> Result<Table> {
    let df = match format {
        FileFormat::Csv => read_csv(bytes, infer_schema_length)?,
        FileFormat::Excel => read_excel(bytes)?,
        FileFormat::Json => read_json(bytes)?,
    };
    tracing::debug!(
        rows = df.height(),
        columns = df.width(),
        format = format.as_str(),
        "parsed upload"
    );
    Table::from_frame(df)
}

/// Reads a file from disk, picking the format from its extension.
///
/// # Errors
///
/// Returns [`SweeperError::Load`] for unreadable files, unknown extensions or
/// malformed content.
pub fn load_file(path: &Path, infer_schema_length: usize) -> Result<Table> {
    let name = path.to_string_lossy();
    let format = FileFormat::from_file_name(&name)?;
    let bytes = std::fs::read(path)
        .map_err(|e| SweeperError::Load(format!("Failed to read {}: {e}", path.display())))?;
    load_bytes(&bytes, format, infer_schema_length)
}

pub fn read_csv(bytes: &[u8], infer_schema_length: usize) -> Result<DataFrame> {
    CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(infer_schema_length))
        .map_parse_options(|opts| opts.with_try_parse_dates(true))
        .into_reader_with_file_handle(Cursor::new(bytes.to_vec()))
        .finish()
        .map_err(|e| SweeperError::Load(format!("Failed to read CSV: {e}")))
}

/// Reads an array of row objects, or newline-delimited objects when the
/// payload is not a JSON array.
pub fn read_json(bytes: &[u8]) -> Result<DataFrame> {
    let first = bytes.iter().find(|b| !b.is_ascii_whitespace());
    let format = match first {
        Some(b'[') => JsonFormat::Json,
        Some(_) => JsonFormat::JsonLines,
        None => return Err(SweeperError::Load("JSON input is empty".to_owned())),
    };

    JsonReader::new(Cursor::new(bytes.to_vec()))
        .with_json_format(format)
        .finish()
        .map_err(|e| SweeperError::Load(format!("Failed to read JSON: {e}")))
}
