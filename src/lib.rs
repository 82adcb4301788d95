//! # Data Sweeper - load, clean, validate and export tabular data
//!
//! Data Sweeper takes a single table (CSV, Excel or JSON, or one of a few
//! sample datasets), lets a user clean it step by step, runs read-only quality
//! checks and serialises the result back to CSV, Excel or JSON. Every change is
//! recorded in a human-readable action log.
//!
//! ## Quick Start
//!
//! ```
//! use data_sweeper::session::Session;
//! use data_sweeper::sweeper::{FileFormat, MissingStrategy, TextNormalization};
//!
//! # fn main() -> data_sweeper::error::Result<()> {
//! let mut session = Session::default();
//! session.load_bytes(
//!     b"name,email,age\n alice ,alice@example.com,34\nbob,bob-at-example,\n",
//!     FileFormat::Csv,
//!     "people.csv",
//! )?;
//!
//! session.handle_missing("age", MissingStrategy::Median)?;
//! session.normalize_text("name", TextNormalization { trim: true, title_case: true })?;
//!
//! let emails = session.check_email("email")?;
//! assert_eq!(emails.violations, 1);
//!
//! let json = session.export(FileFormat::Json)?;
//! assert_eq!(json.file_name, "output.json");
//!
//! for line in session.log_lines() {
//!     println!("{line}"); // "2024-05-01 09:30:12 - Normalized `name`: ..."
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Core Modules
//!
//! - [`session`]: the current table plus its action log; every mutation goes through here
//! - [`sweeper`]: the table model and the pure operations on it
//!   - [`sweeper::cleaning`]: deduplicate, missing values, type conversion, text normalization
//!   - [`sweeper::validation`]: email format and numeric range checks
//!   - [`sweeper::io`] / [`sweeper::export`]: loading and serialising tables
//! - [`pipeline`]: cleaning plans saved as JSON and replayed headlessly
//! - [`config`]: runtime settings read from a JSON file
//! - [`error`]: [`error::SweeperError`] and the crate `Result`
//! - [`logging`]: diagnostic `tracing` setup
//!
//! ## All-or-nothing operations
//!
//! Cleaning functions take `&Table` and return a new table, so a failure can
//! never leave half-applied changes behind. [`session::Session`] only swaps in
//! the new table, and appends a log entry, once an operation has succeeded.

#![warn(clippy::all, rust_2018_idioms)]

pub mod config;
pub mod error;
pub mod logging;
pub mod pipeline;
pub mod session;
pub mod sweeper;
