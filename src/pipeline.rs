//! Cleaning plans: interactive operations captured as JSON and replayed headlessly.
//!
//! A plan records the same operations a user applies one by one in a session
//! (deduplicate, handle missing values, convert, normalize text, quick clean)
//! so they can be rerun against a new export of the same data.
//!
//! # Example
//!
//! ```
//! use data_sweeper::pipeline::{CleaningPlan, Step, run_plan};
//! use data_sweeper::session::Session;
//! use data_sweeper::sweeper::{FileFormat, MissingStrategy};
//!
//! # fn main() -> data_sweeper::error::Result<()> {
//! let plan = CleaningPlan::new("orders")
//!     .with_step(Step::Deduplicate)
//!     .with_step(Step::HandleMissing {
//!         column: "qty".to_owned(),
//!         strategy: MissingStrategy::Median,
//!     });
//!
//! let mut session = Session::default();
//! session.load_bytes(b"id,qty\n1,2\n1,2\n2,\n3,4\n", FileFormat::Csv, "orders.csv")?;
//!
//! let report = run_plan(&mut session, &plan)?;
//! assert_eq!(report.rows_after, 3);
//! assert!(report.warnings.is_empty());
//! # Ok(())
//! # }
//! ```
//!
//! Plans are plain JSON with steps tagged by `op`:
//!
//! ```json
//! {
//!   "version": "0.1",
//!   "name": "orders",
//!   "steps": [
//!     { "op": "deduplicate" },
//!     { "op": "handle_missing", "column": "qty", "strategy": "median" },
//!     { "op": "convert", "column": "placed", "to": "datetime" },
//!     { "op": "normalize_text", "column": "customer", "trim": true, "title_case": true }
//!   ]
//! }
//! ```

pub mod executor;
pub mod plan;
pub mod validation;

pub use executor::{RunReport, run_plan};
pub use plan::{CleaningPlan, PLAN_VERSION, Step};
pub use validation::{PlanIssue, validate_plan};
