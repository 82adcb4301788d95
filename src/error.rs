//! Error types for data sweeper operations.
//!
//! Every session operation either commits its result or fails with one of the
//! variants below, leaving the session untouched. The variants map onto the
//! failure kinds a user can see:
//!
//! - [`SweeperError::Load`]: the source could not be read or parsed
//! - [`SweeperError::TypeMismatch`]: an operation was aimed at a column of the wrong kind
//! - [`SweeperError::Conversion`]: values could not be parsed into a target kind
//!
//! ```
//! use data_sweeper::error::SweeperError;
//!
//! fn describe(err: &SweeperError) -> &'static str {
//!     match err {
//!         SweeperError::Load(_) => "could not load the file",
//!         SweeperError::TypeMismatch { .. } => "wrong column type",
//!         SweeperError::Conversion { .. } => "values could not be converted",
//!         _ => "something else went wrong",
//!     }
//! }
//! ```
//!
//! The `ResultExt` trait adds `.context()` to any `Result` whose error converts
//! into [`SweeperError`]:
//!
//! ```no_run
//! use data_sweeper::error::ResultExt as _;
//!
//! fn read_upload(path: &str) -> data_sweeper::error::Result<Vec<u8>> {
//!     std::fs::read(path).context("Failed to read upload")
//! }
//! ```

use crate::sweeper::types::ColumnKind;
use std::fmt;

/// Main error type for data sweeper operations.
#[derive(Debug)]
pub enum SweeperError {
    /// Unreadable, malformed or unsupported source (file bytes or sample dataset)
    Load(String),

    /// Operation applied to a column whose kind it does not support
    TypeMismatch {
        column: String,
        kind: ColumnKind,
        operation: String,
    },

    /// One or more values in a column could not be parsed into the target kind
    Conversion {
        column: String,
        target: ColumnKind,
        value: String,
        failures: usize,
    },

    /// Column name not present in the current table
    UnknownColumn(String),

    /// No table has been loaded into the session yet
    NoTable,

    /// Column has no non-null values to derive a fill value from
    NoValues(String),

    /// A deduplication plan was confirmed after the table changed
    StalePlan,

    /// Caller supplied parameters that make no sense for the operation
    InvalidArgument(String),

    /// I/O errors (file operations)
    Io(std::io::Error),

    /// Data processing errors raised by the dataframe engine
    DataProcessing(String),

    /// Configuration errors
    Config(String),

    /// Generic error with context
    Other(String),
}

impl fmt::Display for SweeperError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Load(msg) => write!(f, "Load error: {msg}"),
            Self::TypeMismatch {
                column,
                kind,
                operation,
            } => write!(
                f,
                "Type mismatch: cannot apply {operation} to {kind} column `{column}`"
            ),
            Self::Conversion {
                column,
                target,
                value,
                failures,
            } => write!(
                f,
                "Conversion error: column `{column}` has {failures} value(s) that cannot be read as {target} (first: {value:?})"
            ),
            Self::UnknownColumn(name) => write!(f, "Unknown column `{name}`"),
            Self::NoTable => write!(f, "No data loaded"),
            Self::NoValues(name) => {
                write!(f, "Column `{name}` has no values to compute a fill value from")
            }
            Self::StalePlan => write!(
                f,
                "The data changed since duplicates were counted; count them again"
            ),
            Self::InvalidArgument(msg) => write!(f, "Invalid argument: {msg}"),
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::DataProcessing(msg) => write!(f, "Data processing error: {msg}"),
            Self::Config(msg) => write!(f, "Configuration error: {msg}"),
            Self::Other(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for SweeperError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for SweeperError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<anyhow::Error> for SweeperError {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err.to_string())
    }
}

impl From<serde_json::Error> for SweeperError {
    fn from(err: serde_json::Error) -> Self {
        Self::Config(format!("JSON error: {err}"))
    }
}

impl From<polars::error::PolarsError> for SweeperError {
    fn from(err: polars::error::PolarsError) -> Self {
        Self::DataProcessing(err.to_string())
    }
}

/// Result type alias for data sweeper operations.
pub type Result<T> = std::result::Result<T, SweeperError>;

/// Extension trait to add context to results.
pub trait ResultExt<T> {
    /// Add context to an error.
    fn context(self, msg: impl Into<String>) -> Result<T>;

    /// Add context using a closure (lazy evaluation).
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T, E> ResultExt<T> for std::result::Result<T, E>
where
    E: Into<SweeperError>,
{
    fn context(self, msg: impl Into<String>) -> Result<T> {
        self.map_err(|e| {
            let err: SweeperError = e.into();
            SweeperError::Other(format!("{}: {}", msg.into(), err))
        })
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| {
            let err: SweeperError = e.into();
            SweeperError::Other(format!("{}: {}", f(), err))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = SweeperError::UnknownColumn("age".to_owned());
        assert_eq!(err.to_string(), "Unknown column `age`");
    }

    #[test]
    fn test_type_mismatch_display() {
        let err = SweeperError::TypeMismatch {
            column: "name".to_owned(),
            kind: ColumnKind::Text,
            operation: "mean imputation".to_owned(),
        };
        assert_eq!(
            err.to_string(),
            "Type mismatch: cannot apply mean imputation to Text column `name`"
        );
    }

    #[test]
    fn test_error_conversion_to_string() {
        let err = SweeperError::NoTable;
        let s: String = err.into();
        assert_eq!(s, "No data loaded");
    }

    #[test]
    fn test_result_context() {
        let result: std::result::Result<(), std::io::Error> = Err(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "file.txt",
        ));

        let result: Result<()> = result.context("Failed to read file");
        assert!(result.is_err());
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("Failed to read file")
        );
    }
}
