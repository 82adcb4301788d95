//! Per-user session state: the current table and its action log.
//!
//! A [`Session`] is created empty, receives a table on the first successful
//! load and is then transformed one operation at a time. Every operation takes
//! the session by reference and either commits its whole result (plus exactly
//! one log entry) or returns an error and leaves the session as it was.
//!
//! ```
//! use data_sweeper::session::Session;
//! use data_sweeper::sweeper::{FileFormat, MissingStrategy};
//! use data_sweeper::config::SweeperConfig;
//!
//! # fn main() -> data_sweeper::error::Result<()> {
//! let mut session = Session::new(SweeperConfig::default());
//! session.load_bytes(b"name,age\nAda,36\nAda,36\nBob,\n", FileFormat::Csv, "people.csv")?;
//!
//! let plan = session.plan_deduplicate()?;
//! assert_eq!(plan.duplicates(), 1);
//! session.confirm_deduplicate(plan)?;
//!
//! session.handle_missing("age", MissingStrategy::Mean)?;
//! assert_eq!(session.log().len(), 3);
//! # Ok(())
//! # }
//! ```

use crate::config::SweeperConfig;
use crate::error::{Result, SweeperError};
use crate::sweeper::{
    CleaningOutcome, ColumnKind, ExportPayload, FileFormat, MissingStrategy, SampleDataset, Table,
    TextNormalization, ValidationResult, cleaning, export, io, samples, validation,
};
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One committed change, described for humans. Immutable once created.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub timestamp: DateTime<Local>,
    pub message: String,
}

impl LogEntry {
    /// `"YYYY-MM-DD HH:MM:SS - message"`
    pub fn render(&self) -> String {
        format!("{} - {}", self.timestamp.format(TIMESTAMP_FORMAT), self.message)
    }
}

/// Append-only record of every mutation in a session.
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct ActionLog {
    entries: Vec<LogEntry>,
}

impl ActionLog {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    pub fn push(&mut self, message: impl Into<String>) {
        self.entries.push(LogEntry {
            timestamp: Local::now(),
            message: message.into(),
        });
    }

    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    /// Up to `limit` entries, most recent first.
    pub fn recent(&self, limit: usize) -> impl Iterator<Item = &LogEntry> {
        self.entries.iter().rev().take(limit)
    }

    /// Display lines for the `limit` most recent entries, most recent first.
    pub fn render(&self, limit: usize) -> Vec<String> {
        self.recent(limit).map(LogEntry::render).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

/// Duplicate count computed ahead of deduplication, waiting for confirmation.
///
/// Only valid for the table it was computed from: any load or commit in
/// between makes [`Session::confirm_deduplicate`] reject it.
#[derive(Debug, Clone)]
pub struct DedupePlan {
    generation: u64,
    outcome: CleaningOutcome,
}

impl DedupePlan {
    pub fn duplicates(&self) -> usize {
        self.outcome.affected
    }

    /// Rows that would remain after confirming.
    pub fn remaining_rows(&self) -> usize {
        self.outcome.table.height()
    }
}

/// Per-column results of a batch type conversion. Failures never block siblings.
#[derive(Debug, Default)]
pub struct ConversionReport {
    pub results: Vec<(String, Result<ColumnKind>)>,
}

impl ConversionReport {
    pub fn converted(&self) -> usize {
        self.results.iter().filter(|(_, r)| r.is_ok()).count()
    }

    pub fn failures(&self) -> impl Iterator<Item = (&str, &SweeperError)> {
        self.results
            .iter()
            .filter_map(|(name, r)| r.as_ref().err().map(|e| (name.as_str(), e)))
    }

    pub fn is_success(&self) -> bool {
        self.results.iter().all(|(_, r)| r.is_ok())
    }
}

/// Explicit context object owning the current table and the action log.
#[derive(Debug)]
pub struct Session {
    config: SweeperConfig,
    table: Option<Table>,
    source: Option<String>,
    log: ActionLog,
    generation: u64,
}

impl Session {
    pub fn new(config: SweeperConfig) -> Self {
        Self {
            config,
            table: None,
            source: None,
            log: ActionLog::new(),
            generation: 0,
        }
    }

    pub fn config(&self) -> &SweeperConfig {
        &self.config
    }

    pub fn table(&self) -> Option<&Table> {
        self.table.as_ref()
    }

    /// Name of the file or sample the current table came from.
    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    pub fn log(&self) -> &ActionLog {
        &self.log
    }

    /// Action log lines as displayed: the configured number, most recent first.
    pub fn log_lines(&self) -> Vec<String> {
        self.log.render(self.config.log_display_limit)
    }

    fn current(&self) -> Result<&Table> {
        self.table.as_ref().ok_or(SweeperError::NoTable)
    }

    fn commit(&mut self, table: Table, message: String) {
        tracing::info!(
            rows = table.height(),
            columns = table.width(),
            "{message}"
        );
        self.table = Some(table);
        self.generation += 1;
        self.log.push(message);
    }

    fn replace(&mut self, table: Table, source: String) -> Result<&Table> {
        self.source = Some(source.clone());
        self.commit(table, format!("Loaded {source}"));
        self.current()
    }

    fn rejected<T>(operation: &str, result: Result<T>) -> Result<T> {
        if let Err(e) = &result {
            tracing::warn!(operation, error = %e, "operation rejected; session unchanged");
        }
        result
    }

    /// Replaces the current table with one parsed from uploaded bytes.
    ///
    /// # Errors
    ///
    /// Returns [`SweeperError::Load`] if the bytes cannot be parsed; the
    /// previous table stays in place.
    pub fn load_bytes(
        &mut self,
        bytes: &[u8],
        format: FileFormat,
        source: impl Into<String>,
    ) -> Result<&Table> {
        let table = Self::rejected(
            "load",
            io::load_bytes(bytes, format, self.config.infer_schema_length),
        )?;
        self.replace(table, source.into())
    }

    /// Replaces the current table with the contents of a file on disk.
    ///
    /// # Errors
    ///
    /// Returns [`SweeperError::Load`] for unreadable or malformed files.
    pub fn load_file(&mut self, path: &Path) -> Result<&Table> {
        let table = Self::rejected(
            "load",
            io::load_file(path, self.config.infer_schema_length),
        )?;
        let source = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        self.replace(table, source)
    }

    /// Replaces the current table with a downloaded sample dataset.
    ///
    /// # Errors
    ///
    /// Returns [`SweeperError::Load`] if the sample cannot be fetched or parsed.
    pub fn load_sample(&mut self, sample: SampleDataset) -> Result<&Table> {
        let table = Self::rejected("load", samples::fetch_sample(sample, &self.config))?;
        self.replace(table, sample.source_label())
    }

    /// Counts duplicate rows without changing anything.
    ///
    /// # Errors
    ///
    /// Returns [`SweeperError::NoTable`] before the first load.
    pub fn plan_deduplicate(&self) -> Result<DedupePlan> {
        let outcome = cleaning::deduplicate(self.current()?)?;
        tracing::debug!(duplicates = outcome.affected, "counted duplicate rows");
        Ok(DedupePlan {
            generation: self.generation,
            outcome,
        })
    }

    /// Commits a deduplication the user has confirmed. Returns the rows removed.
    ///
    /// # Errors
    ///
    /// Returns [`SweeperError::StalePlan`] if the table changed after the plan was made.
    pub fn confirm_deduplicate(&mut self, plan: DedupePlan) -> Result<usize> {
        if plan.generation != self.generation || self.table.is_none() {
            return Self::rejected("deduplicate", Err(SweeperError::StalePlan));
        }
        let removed = plan.outcome.affected;
        self.commit(plan.outcome.table, plan.outcome.message);
        Ok(removed)
    }

    /// Drops or fills the nulls of one column. Returns rows removed or values filled.
    ///
    /// # Errors
    ///
    /// See [`cleaning::handle_missing`]; also [`SweeperError::NoTable`].
    pub fn handle_missing(&mut self, column: &str, strategy: MissingStrategy) -> Result<usize> {
        let outcome = Self::rejected(
            "missing values",
            self.current()
                .and_then(|table| cleaning::handle_missing(table, column, strategy)),
        )?;
        Ok(self.apply(outcome))
    }

    /// Converts each requested column independently; each success is committed
    /// and logged on its own, each failure is reported without touching the table.
    pub fn convert_types(&mut self, requests: &[(String, ColumnKind)]) -> ConversionReport {
        let mut report = ConversionReport::default();
        for (column, target) in requests {
            let outcome = Self::rejected(
                "type conversion",
                self.current()
                    .and_then(|table| cleaning::convert_column(table, column, *target)),
            );
            let result = outcome.map(|outcome| {
                self.apply(outcome);
                *target
            });
            report.results.push((column.clone(), result));
        }
        report
    }

    /// Converts a single column.
    ///
    /// # Errors
    ///
    /// See [`cleaning::convert_column`]; also [`SweeperError::NoTable`].
    pub fn convert_type(&mut self, column: &str, target: ColumnKind) -> Result<()> {
        let outcome = Self::rejected(
            "type conversion",
            self.current()
                .and_then(|table| cleaning::convert_column(table, column, target)),
        )?;
        self.apply(outcome);
        Ok(())
    }

    /// Trims and/or title-cases a text column. Returns values changed.
    ///
    /// # Errors
    ///
    /// See [`cleaning::normalize_text`]; also [`SweeperError::NoTable`].
    pub fn normalize_text(
        &mut self,
        column: &str,
        normalization: TextNormalization,
    ) -> Result<usize> {
        let outcome = Self::rejected(
            "text normalization",
            self.current()
                .and_then(|table| cleaning::normalize_text(table, column, normalization)),
        )?;
        Ok(self.apply(outcome))
    }

    /// Drops incomplete rows, duplicates and surrounding whitespace in one step.
    ///
    /// # Errors
    ///
    /// Returns [`SweeperError::NoTable`] before the first load.
    pub fn quick_clean(&mut self) -> Result<usize> {
        let outcome = Self::rejected(
            "quick clean",
            self.current().and_then(cleaning::quick_clean),
        )?;
        Ok(self.apply(outcome))
    }

    fn apply(&mut self, outcome: CleaningOutcome) -> usize {
        let affected = outcome.affected;
        self.commit(outcome.table, outcome.message);
        affected
    }

    /// Email format check; read-only.
    ///
    /// # Errors
    ///
    /// See [`validation::check_email`]; also [`SweeperError::NoTable`].
    pub fn check_email(&self, column: &str) -> Result<ValidationResult> {
        validation::check_email(self.current()?, column)
    }

    /// Inclusive numeric range check; read-only.
    ///
    /// # Errors
    ///
    /// See [`validation::check_range`]; also [`SweeperError::NoTable`].
    pub fn check_range(&self, column: &str, min: f64, max: f64) -> Result<ValidationResult> {
        validation::check_range(self.current()?, column, min, max)
    }

    /// Serialises the current table; read-only.
    ///
    /// # Errors
    ///
    /// Returns [`SweeperError::NoTable`] before the first load, or a writer error.
    pub fn export(&self, format: FileFormat) -> Result<ExportPayload> {
        export::export_table(self.current()?, format)
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new(SweeperConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_entry_render_format() -> anyhow::Result<()> {
        let timestamp = DateTime::parse_from_rfc3339("2024-03-05T07:08:09+00:00")?
            .with_timezone(&Local);
        let entry = LogEntry {
            timestamp,
            message: "Removed 3 duplicate rows".to_owned(),
        };
        let expected = format!(
            "{} - Removed 3 duplicate rows",
            timestamp.format("%Y-%m-%d %H:%M:%S")
        );
        assert_eq!(entry.render(), expected);
        assert_eq!(entry.render().len(), "2024-03-05 07:08:09".len() + 3 + 24);
        Ok(())
    }

    #[test]
    fn test_recent_is_most_recent_first_and_capped() {
        let mut log = ActionLog::new();
        for i in 1..=12 {
            log.push(format!("step {i}"));
        }

        let shown: Vec<&str> = log.recent(10).map(|e| e.message.as_str()).collect();
        assert_eq!(shown.len(), 10);
        assert_eq!(shown.first().copied(), Some("step 12"));
        assert_eq!(shown.last().copied(), Some("step 3"));
        assert_eq!(log.len(), 12, "display never trims storage");
    }

    #[test]
    fn test_operations_need_a_table() {
        let mut session = Session::default();
        assert!(matches!(
            session.plan_deduplicate(),
            Err(SweeperError::NoTable)
        ));
        assert!(matches!(
            session.handle_missing("age", MissingStrategy::Mean),
            Err(SweeperError::NoTable)
        ));
        assert!(matches!(
            session.export(FileFormat::Csv),
            Err(SweeperError::NoTable)
        ));
        assert!(session.log().is_empty());
    }
}
