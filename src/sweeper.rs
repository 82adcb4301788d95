//! Table model and the operations that read or transform it.
//!
//! Every function here is pure with respect to its input: cleaning steps take
//! a `&Table` and return a new [`CleaningOutcome`], validators and exporters
//! only read. Session bookkeeping (current table, action log) lives in
//! [`crate::session`].

pub mod cleaning;
pub mod excel;
pub mod export;
pub mod io;
pub mod samples;
pub mod types;
pub mod validation;

pub use cleaning::{
    CleaningOutcome, convert_column, deduplicate, handle_missing, normalize_text, quick_clean,
};
pub use export::export_table;
pub use io::{load_bytes, load_file};
pub use samples::{SampleDataset, fetch_sample};
pub use types::{
    ColumnKind, ColumnProfile, ExportPayload, FileFormat, MissingStrategy, Table,
    TextNormalization, ValidationResult, ValidationRule,
};
pub use validation::{check_email, check_range};

#[cfg(test)]
mod tests;
