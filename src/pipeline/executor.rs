//! Plan execution engine.
//!
//! Replays a cleaning plan against the session's current table, one step at a
//! time, and reports what happened.

use super::plan::{CleaningPlan, Step};
use super::validation::validate_plan;
use crate::error::{Result, SweeperError};
use crate::session::Session;

/// Report generated after a plan run
#[derive(Debug, Clone)]
pub struct RunReport {
    /// Number of rows before the first step
    pub rows_before: usize,

    /// Number of rows after the last step
    pub rows_after: usize,

    /// Number of steps successfully applied
    pub steps_applied: usize,

    /// One line per skipped step
    pub warnings: Vec<String>,

    pub duration: std::time::Duration,
}

impl RunReport {
    pub fn summary(&self) -> String {
        format!(
            "Plan completed: {} rows ({} → {}), {} steps applied, {} skipped, {:.2}s",
            if self.rows_after < self.rows_before {
                "removed"
            } else {
                "unchanged"
            },
            self.rows_before,
            self.rows_after,
            self.steps_applied,
            self.warnings.len(),
            self.duration.as_secs_f64()
        )
    }
}

/// Validates and then applies every step of `plan` to the session.
///
/// A step that fails is skipped with a warning and leaves the table as the
/// previous step left it; each applied step adds its own action log entry.
///
/// # Errors
///
/// Returns [`SweeperError::NoTable`] if nothing is loaded and
/// [`SweeperError::InvalidArgument`] if the plan does not validate.
pub fn run_plan(session: &mut Session, plan: &CleaningPlan) -> Result<RunReport> {
    let start = std::time::Instant::now();
    let table = session.table().ok_or(SweeperError::NoTable)?;

    let issues = validate_plan(plan, table);
    if !issues.is_empty() {
        return Err(SweeperError::InvalidArgument(format!(
            "Plan validation failed:\n{}",
            issues
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join("\n")
        )));
    }

    let rows_before = table.height();
    let mut steps_applied = 0;
    let mut warnings = Vec::new();

    tracing::info!(plan = %plan.name, steps = plan.steps.len(), "running cleaning plan");
    for (idx, step) in plan.steps.iter().enumerate() {
        match apply_step(session, step) {
            Ok(()) => steps_applied += 1,
            Err(e) => {
                tracing::warn!(step = idx + 1, op = %step.describe(), error = %e, "step skipped");
                warnings.push(format!("Step {}: {} (skipped)", idx + 1, e));
            }
        }
    }

    let rows_after = session.table().map_or(0, |t| t.height());
    Ok(RunReport {
        rows_before,
        rows_after,
        steps_applied,
        warnings,
        duration: start.elapsed(),
    })
}

fn apply_step(session: &mut Session, step: &Step) -> Result<()> {
    match step {
        Step::Deduplicate => {
            let plan = session.plan_deduplicate()?;
            session.confirm_deduplicate(plan)?;
        }
        Step::HandleMissing { column, strategy } => {
            session.handle_missing(column, *strategy)?;
        }
        Step::Convert { column, to } => session.convert_type(column, *to)?,
        Step::NormalizeText {
            column,
            trim,
            title_case,
        } => {
            session.normalize_text(column, Step::normalization(*trim, *title_case))?;
        }
        Step::QuickClean => {
            session.quick_clean()?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sweeper::{ColumnKind, FileFormat, MissingStrategy};

    fn session() -> anyhow::Result<Session> {
        let mut session = Session::default();
        session.load_bytes(
            b"name,age,score\n ada ,36,1\nBob,x,2\n ada ,36,1\nCy,,3\n",
            FileFormat::Csv,
            "people.csv",
        )?;
        Ok(session)
    }

    #[test]
    fn test_run_plan_applies_steps_in_order() -> anyhow::Result<()> {
        let mut session = session()?;
        let plan = CleaningPlan::new("tidy")
            .with_step(Step::Deduplicate)
            .with_step(Step::NormalizeText {
                column: "name".to_owned(),
                trim: true,
                title_case: true,
            })
            .with_step(Step::HandleMissing {
                column: "score".to_owned(),
                strategy: MissingStrategy::Mean,
            });

        let report = run_plan(&mut session, &plan)?;
        assert_eq!(report.rows_before, 4);
        assert_eq!(report.rows_after, 3);
        assert_eq!(report.steps_applied, 3);
        assert!(report.warnings.is_empty());
        assert!(report.summary().starts_with("Plan completed: removed rows (4 → 3)"));
        // Load plus one entry per step.
        assert_eq!(session.log().len(), 4);
        Ok(())
    }

    #[test]
    fn test_failing_step_is_skipped() -> anyhow::Result<()> {
        let mut session = session()?;
        let plan = CleaningPlan::new("convert")
            .with_step(Step::Convert {
                column: "age".to_owned(),
                to: ColumnKind::Numeric,
            })
            .with_step(Step::Deduplicate);

        let report = run_plan(&mut session, &plan)?;
        assert_eq!(report.steps_applied, 1);
        assert_eq!(report.warnings.len(), 1);
        assert!(report.warnings.first().is_some_and(|w| w.starts_with("Step 1: Conversion error")));
        assert_eq!(session.table().map(|t| t.kind_of("age").ok()), Some(Some(ColumnKind::Text)));
        Ok(())
    }

    #[test]
    fn test_invalid_plan_changes_nothing() -> anyhow::Result<()> {
        let mut session = session()?;
        let plan = CleaningPlan::new("bad").with_step(Step::HandleMissing {
            column: "missing".to_owned(),
            strategy: MissingStrategy::Mode,
        });

        let result = run_plan(&mut session, &plan);
        assert!(matches!(result, Err(SweeperError::InvalidArgument(_))));
        assert_eq!(session.log().len(), 1);
        Ok(())
    }

    #[test]
    fn test_run_plan_needs_a_table() {
        let mut session = Session::default();
        let result = run_plan(&mut session, &CleaningPlan::new("empty"));
        assert!(matches!(result, Err(SweeperError::NoTable)));
    }
}
