//! Cleaning plan data structures.
//!
//! A plan is an ordered list of cleaning steps stored as JSON so that an
//! interactive session can be replayed headlessly against fresh data.

use crate::error::{Result, ResultExt as _};
use crate::sweeper::{ColumnKind, MissingStrategy, TextNormalization};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Current plan format version
pub const PLAN_VERSION: &str = "0.1";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CleaningPlan {
    /// Format version for future migrations
    pub version: String,

    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Applied in order
    pub steps: Vec<Step>,
}

impl CleaningPlan {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            version: PLAN_VERSION.to_owned(),
            name: name.into(),
            description: None,
            steps: Vec::new(),
        }
    }

    /// Appends a step, builder style.
    pub fn with_step(mut self, step: Step) -> Self {
        self.steps.push(step);
        self
    }

    /// Load a plan from a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read cleaning plan {}", path.display()))?;
        Self::from_json(&content)
    }

    /// Parse a plan from a JSON string
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("Failed to parse cleaning plan JSON")
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("Failed to serialize cleaning plan")
    }
}

/// One cleaning operation (tagged by `op`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Step {
    /// Remove exact duplicate rows, keeping first occurrences
    Deduplicate,

    HandleMissing {
        column: String,
        strategy: MissingStrategy,
    },

    /// Standardize a column to another kind
    Convert { column: String, to: ColumnKind },

    NormalizeText {
        column: String,
        #[serde(default)]
        trim: bool,
        #[serde(default)]
        title_case: bool,
    },

    /// Drop incomplete rows, drop duplicates, trim text
    QuickClean,
}

impl Step {
    /// Column the step targets, if any.
    pub fn column(&self) -> Option<&str> {
        match self {
            Self::HandleMissing { column, .. }
            | Self::Convert { column, .. }
            | Self::NormalizeText { column, .. } => Some(column.as_str()),
            Self::Deduplicate | Self::QuickClean => None,
        }
    }

    pub fn describe(&self) -> String {
        match self {
            Self::Deduplicate => "deduplicate".to_owned(),
            Self::HandleMissing { column, strategy } => {
                format!("handle missing values in `{column}` ({})", strategy.as_str())
            }
            Self::Convert { column, to } => format!("convert `{column}` to {to}"),
            Self::NormalizeText { column, .. } => format!("normalize text in `{column}`"),
            Self::QuickClean => "quick clean".to_owned(),
        }
    }

    pub(crate) fn normalization(trim: bool, title_case: bool) -> TextNormalization {
        TextNormalization { trim, title_case }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plan_serialization() -> anyhow::Result<()> {
        let plan = CleaningPlan::new("customers")
            .with_step(Step::Deduplicate)
            .with_step(Step::HandleMissing {
                column: "age".to_owned(),
                strategy: MissingStrategy::Median,
            })
            .with_step(Step::Convert {
                column: "joined".to_owned(),
                to: ColumnKind::Datetime,
            });

        let json = plan.to_json()?;
        assert!(json.contains("\"version\": \"0.1\""));
        assert!(json.contains("\"op\": \"handle_missing\""));
        assert!(json.contains("\"strategy\": \"median\""));
        assert!(json.contains("\"to\": \"datetime\""));

        let parsed = CleaningPlan::from_json(&json)?;
        assert_eq!(parsed, plan);
        Ok(())
    }

    #[test]
    fn test_normalize_flags_default_to_false() -> anyhow::Result<()> {
        let plan = CleaningPlan::from_json(
            r#"{
                "version": "0.1",
                "name": "tidy",
                "steps": [
                    { "op": "normalize_text", "column": "name", "trim": true },
                    { "op": "quick_clean" }
                ]
            }"#,
        )?;

        assert_eq!(
            plan.steps.first(),
            Some(&Step::NormalizeText {
                column: "name".to_owned(),
                trim: true,
                title_case: false,
            })
        );
        assert_eq!(plan.steps.get(1).and_then(Step::column), None);
        Ok(())
    }

    #[test]
    fn test_unknown_op_is_rejected() {
        let result = CleaningPlan::from_json(
            r#"{ "version": "0.1", "name": "x", "steps": [ { "op": "explode" } ] }"#,
        );
        assert!(result.is_err());
    }
}
