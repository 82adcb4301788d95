//! Read-only column checks. Nothing here mutates a table; every check
//! reports how many non-null values break the rule.

use super::types::{ColumnKind, Table, ValidationResult, ValidationRule};
use crate::error::{Result, SweeperError};
use polars::prelude::*;
use regex::Regex;
use std::sync::LazyLock;

/// Local part, `@`, dot-separated domain ending in a top-level label, no whitespace.
pub const EMAIL_PATTERN: &str = r"^[\w.+-]+@[\w-]+(\.[\w-]+)*\.\w+$";

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(EMAIL_PATTERN).expect("email pattern is valid"));

const MAX_SAMPLES: usize = 5;

pub fn is_email(value: &str) -> bool {
    EMAIL_RE.is_match(value)
}

/// Counts non-null values that do not look like an email address.
///
/// Empty strings are values, not nulls, and therefore count as violations.
///
/// # Errors
///
/// - [`SweeperError::UnknownColumn`] if the column does not exist
/// - [`SweeperError::TypeMismatch`] if the column is not text or categorical
pub fn check_email(table: &Table, column: &str) -> Result<ValidationResult> {
    let kind = table.kind_of(column)?;
    if !kind.is_string_like() {
        return Err(SweeperError::TypeMismatch {
            column: column.to_owned(),
            kind,
            operation: "email format check".to_owned(),
        });
    }

    let mut result = ValidationResult {
        column: column.to_owned(),
        rule: ValidationRule::Email,
        checked: 0,
        violations: 0,
        samples: Vec::new(),
    };

    for value in table.series(column)?.str()?.into_iter().flatten() {
        result.checked += 1;
        if !is_email(value) {
            record_violation(&mut result, value.to_owned());
        }
    }

    Ok(result)
}

/// Counts non-null values outside the inclusive range `[min, max]`. NaN is out of range.
///
/// # Errors
///
/// - [`SweeperError::InvalidArgument`] if `min > max` or a bound is NaN
/// - [`SweeperError::UnknownColumn`] if the column does not exist
/// - [`SweeperError::TypeMismatch`] if the column is not numeric
pub fn check_range(table: &Table, column: &str, min: f64, max: f64) -> Result<ValidationResult> {
    if min.is_nan() || max.is_nan() || min > max {
        return Err(SweeperError::InvalidArgument(format!(
            "range bounds must satisfy min <= max (got {min} and {max})"
        )));
    }

    let kind = table.kind_of(column)?;
    if kind != ColumnKind::Numeric {
        return Err(SweeperError::TypeMismatch {
            column: column.to_owned(),
            kind,
            operation: "range check".to_owned(),
        });
    }

    let mut result = ValidationResult {
        column: column.to_owned(),
        rule: ValidationRule::Range { min, max },
        checked: 0,
        violations: 0,
        samples: Vec::new(),
    };

    let floats = table.series(column)?.cast(&DataType::Float64)?;
    for value in floats.f64()?.into_iter().flatten() {
        result.checked += 1;
        if !(min..=max).contains(&value) {
            record_violation(&mut result, value.to_string());
        }
    }

    Ok(result)
}

fn record_violation(result: &mut ValidationResult, value: String) {
    result.violations += 1;
    if result.samples.len() < MAX_SAMPLES {
        result.samples.push(value);
    }
}
