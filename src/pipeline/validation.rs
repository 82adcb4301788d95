//! Cleaning plan validation.
//!
//! Checks a plan against the table it will run on before anything is applied,
//! so that an obviously broken plan fails up front instead of step by step.

use super::plan::{CleaningPlan, PLAN_VERSION, Step};
use crate::sweeper::{ColumnKind, MissingStrategy, Table};
use std::collections::HashMap;

/// Problem found in a plan, optionally tied to one step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanIssue {
    pub step_index: Option<usize>,
    pub message: String,
}

impl PlanIssue {
    fn step(step_index: usize, message: impl Into<String>) -> Self {
        Self {
            step_index: Some(step_index),
            message: message.into(),
        }
    }

    fn plan(message: impl Into<String>) -> Self {
        Self {
            step_index: None,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for PlanIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(idx) = self.step_index {
            write!(f, "Step {}: {}", idx + 1, self.message)
        } else {
            write!(f, "Plan: {}", self.message)
        }
    }
}

/// Validates a plan against a table, following column kinds through every
/// conversion step. An empty result means the plan is runnable.
pub fn validate_plan(plan: &CleaningPlan, table: &Table) -> Vec<PlanIssue> {
    let mut issues = Vec::new();

    if plan.version != PLAN_VERSION {
        issues.push(PlanIssue::plan(format!(
            "Unsupported plan version '{}', expected '{PLAN_VERSION}'",
            plan.version
        )));
    }

    let mut kinds: HashMap<String, ColumnKind> = table
        .column_names()
        .into_iter()
        .zip(table.kinds().iter().copied())
        .collect();

    for (idx, step) in plan.steps.iter().enumerate() {
        let Some(column) = step.column() else {
            continue;
        };
        let Some(kind) = kinds.get(column).copied() else {
            issues.push(PlanIssue::step(idx, format!("Column `{column}` not found")));
            continue;
        };

        match step {
            Step::HandleMissing {
                strategy: strategy @ (MissingStrategy::Mean | MissingStrategy::Median),
                ..
            } if kind != ColumnKind::Numeric => {
                issues.push(PlanIssue::step(
                    idx,
                    format!(
                        "{} imputation needs a numeric column, `{column}` is {kind}",
                        strategy.as_str()
                    ),
                ));
            }
            Step::Convert { to, .. } => {
                kinds.insert(column.to_owned(), *to);
            }
            Step::NormalizeText {
                trim, title_case, ..
            } => {
                if !trim && !title_case {
                    issues.push(PlanIssue::step(
                        idx,
                        "normalize_text needs trim, title_case or both",
                    ));
                }
                if !kind.is_string_like() {
                    issues.push(PlanIssue::step(
                        idx,
                        format!("Text normalization needs a text column, `{column}` is {kind}"),
                    ));
                }
            }
            _ => {}
        }
    }

    issues
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::*;

    fn people() -> anyhow::Result<Table> {
        Ok(Table::from_frame(df!(
            "name" => ["Ada", "Bob"],
            "age" => ["36", "41"]
        )?)?)
    }

    #[test]
    fn test_valid_plan_has_no_issues() -> anyhow::Result<()> {
        let plan = CleaningPlan::new("ok")
            .with_step(Step::Convert {
                column: "age".to_owned(),
                to: ColumnKind::Numeric,
            })
            .with_step(Step::HandleMissing {
                column: "age".to_owned(),
                strategy: MissingStrategy::Mean,
            })
            .with_step(Step::Deduplicate);

        assert!(validate_plan(&plan, &people()?).is_empty());
        Ok(())
    }

    #[test]
    #[expect(clippy::indexing_slicing)]
    fn test_issues_are_reported_per_step() -> anyhow::Result<()> {
        let mut plan = CleaningPlan::new("broken")
            .with_step(Step::HandleMissing {
                column: "age".to_owned(),
                strategy: MissingStrategy::Median,
            })
            .with_step(Step::Convert {
                column: "salary".to_owned(),
                to: ColumnKind::Numeric,
            })
            .with_step(Step::NormalizeText {
                column: "name".to_owned(),
                trim: false,
                title_case: false,
            });
        plan.version = "9.9".to_owned();

        let issues = validate_plan(&plan, &people()?);
        let rendered: Vec<String> = issues.iter().map(ToString::to_string).collect();
        assert_eq!(rendered.len(), 4);
        assert!(rendered[0].starts_with("Plan: Unsupported plan version '9.9'"));
        assert!(rendered[1].starts_with("Step 1: median imputation"));
        assert_eq!(rendered[2], "Step 2: Column `salary` not found");
        assert!(rendered[3].starts_with("Step 3:"));
        Ok(())
    }
}
