use super::types::{ColumnKind, MissingStrategy, Table, TextNormalization, datetime_dtype};
use crate::error::{Result, SweeperError};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use polars::prelude::*;
use std::collections::HashMap;
use std::hash::Hash;

const DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"];
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%d/%m/%Y"];

/// Result of a cleaning step: the transformed table and a line for the action log.
#[derive(Clone, Debug)]
pub struct CleaningOutcome {
    pub table: Table,
    pub message: String,
    /// Rows removed or values changed, depending on the step
    pub affected: usize,
}

/// Removes rows identical to an earlier row, keeping first occurrences in order.
///
/// # Errors
///
/// Returns an error if the dataframe engine fails.
pub fn deduplicate(table: &Table) -> Result<CleaningOutcome> {
    let unique = table
        .frame()
        .clone()
        .lazy()
        .unique_stable(None, UniqueKeepStrategy::First)
        .collect()?;
    let removed = table.height() - unique.height();

    Ok(CleaningOutcome {
        table: table.with_rows(unique),
        message: format!("Removed {removed} duplicate rows"),
        affected: removed,
    })
}

/// Drops or fills the nulls of one column.
///
/// Fills widen numeric columns to `Float64`. Mean and median only apply to
/// numeric columns; mode applies to every kind.
///
/// # Errors
///
/// - [`SweeperError::UnknownColumn`] if the column does not exist
/// - [`SweeperError::TypeMismatch`] for mean/median on a non-numeric column
/// - [`SweeperError::NoValues`] when there is nothing to compute a fill value from
pub fn handle_missing(
    table: &Table,
    column: &str,
    strategy: MissingStrategy,
) -> Result<CleaningOutcome> {
    let kind = table.kind_of(column)?;
    let series = table.series(column)?;
    let nulls = series.null_count();

    if strategy == MissingStrategy::DropRows {
        let kept = table
            .frame()
            .clone()
            .lazy()
            .filter(col(column).is_not_null())
            .collect()?;
        let removed = table.height() - kept.height();
        return Ok(CleaningOutcome {
            table: table.with_rows(kept),
            message: format!("Dropped {removed} rows with missing values in `{column}`"),
            affected: removed,
        });
    }

    if matches!(strategy, MissingStrategy::Mean | MissingStrategy::Median)
        && kind != ColumnKind::Numeric
    {
        return Err(SweeperError::TypeMismatch {
            column: column.to_owned(),
            kind,
            operation: format!("{} imputation", strategy.as_str()),
        });
    }

    let no_values = || SweeperError::NoValues(column.to_owned());
    let (fill, shown) = match kind {
        ColumnKind::Numeric => {
            let floats = series.cast(&DataType::Float64)?;
            let value = match strategy {
                MissingStrategy::Mean => floats.mean(),
                MissingStrategy::Median => floats.median(),
                _ => first_mode(floats.f64()?.into_iter(), |v| v.to_bits()),
            }
            .ok_or_else(no_values)?;
            (
                col(column).cast(DataType::Float64).fill_null(lit(value)),
                format_number(value),
            )
        }
        ColumnKind::Text | ColumnKind::Categorical => {
            let value = first_mode(series.str()?.into_iter(), |v| (*v).to_owned())
                .map(str::to_owned)
                .ok_or_else(no_values)?;
            let shown = format!("'{value}'");
            (col(column).fill_null(lit(value)), shown)
        }
        ColumnKind::Datetime => {
            let millis = series.cast(&DataType::Int64)?;
            let value = first_mode(millis.i64()?.into_iter(), |v| *v).ok_or_else(no_values)?;
            (
                col(column)
                    .cast(DataType::Int64)
                    .fill_null(lit(value))
                    .cast(datetime_dtype()),
                format_millis(value),
            )
        }
    };

    let filled = eval_column(table, column, fill)?;
    let mut cleaned = table.clone();
    cleaned.replace_column(filled, kind)?;

    Ok(CleaningOutcome {
        table: cleaned,
        message: format!(
            "Filled {nulls} missing values in `{column}` with {} {shown}",
            strategy.as_str()
        ),
        affected: nulls,
    })
}

/// Evaluates `expr` over the table and returns the result named `column`.
fn eval_column(table: &Table, column: &str, expr: Expr) -> Result<Series> {
    let df = table
        .frame()
        .clone()
        .lazy()
        .select([expr.alias(column)])
        .collect()?;
    Ok(df.column(column)?.as_materialized_series().clone())
}

/// Number of positions where two columns differ, nulls compared as values.
fn count_changed(before: &Series, after: &Series) -> Result<usize> {
    Ok(before.not_equal_missing(after)?.num_trues())
}

/// Most frequent non-null value; on a tie the value whose first occurrence comes first.
pub fn first_mode<V, K, I>(values: I, key: impl Fn(&V) -> K) -> Option<V>
where
    I: IntoIterator<Item = Option<V>>,
    K: Eq + Hash,
{
    let mut positions: HashMap<K, usize> = HashMap::new();
    let mut tallies: Vec<(V, usize)> = Vec::new();

    for value in values.into_iter().flatten() {
        let k = key(&value);
        if let Some(&pos) = positions.get(&k) {
            if let Some(tally) = tallies.get_mut(pos) {
                tally.1 += 1;
            }
        } else {
            positions.insert(k, tallies.len());
            tallies.push((value, 1));
        }
    }

    let mut best: Option<(V, usize)> = None;
    for (value, count) in tallies {
        if best.as_ref().is_none_or(|(_, top)| count > *top) {
            best = Some((value, count));
        }
    }
    best.map(|(value, _)| value)
}

/// Converts one column to another kind, all or nothing.
///
/// # Errors
///
/// - [`SweeperError::UnknownColumn`] if the column does not exist
/// - [`SweeperError::Conversion`] naming the first value that cannot be parsed
pub fn convert_column(table: &Table, column: &str, target: ColumnKind) -> Result<CleaningOutcome> {
    let kind = table.kind_of(column)?;
    if kind == target {
        return Ok(CleaningOutcome {
            table: table.clone(),
            message: format!("`{column}` is already {target}; left unchanged"),
            affected: 0,
        });
    }

    let series = table.series(column)?;
    let converted = match target {
        ColumnKind::Text | ColumnKind::Categorical => {
            if kind.is_string_like() {
                series.clone()
            } else {
                series.cast(&DataType::String)?
            }
        }
        ColumnKind::Numeric => match kind {
            ColumnKind::Datetime => series.cast(&DataType::Int64)?,
            ColumnKind::Numeric => series.clone(),
            ColumnKind::Text | ColumnKind::Categorical => parse_numbers(column, series)?,
        },
        ColumnKind::Datetime => match kind {
            ColumnKind::Numeric => numbers_to_datetimes(column, series)?,
            ColumnKind::Datetime => series.clone(),
            ColumnKind::Text | ColumnKind::Categorical => parse_datetimes(column, series)?,
        },
    };

    let converted_values = converted.len() - converted.null_count();
    let mut cleaned = table.clone();
    cleaned.replace_column(converted, target)?;

    Ok(CleaningOutcome {
        table: cleaned,
        message: format!("Converted `{column}` from {kind} to {target}"),
        affected: converted_values,
    })
}

fn conversion_error(
    column: &str,
    target: ColumnKind,
    value: String,
    failures: usize,
) -> SweeperError {
    SweeperError::Conversion {
        column: column.to_owned(),
        target,
        value,
        failures,
    }
}

/// Parses text as integers when every value is one, otherwise as floats.
fn parse_numbers(column: &str, series: &Series) -> Result<Series> {
    let strings = series.str()?;
    let integers: Option<Vec<Option<i64>>> = strings
        .into_iter()
        .map(|value| match value {
            Some(raw) => raw.trim().parse::<i64>().ok().map(Some),
            None => Some(None),
        })
        .collect();
    if let Some(values) = integers {
        return Ok(Series::new(column.into(), values));
    }

    let mut failures = 0;
    let mut first_bad: Option<String> = None;

    let values: Vec<Option<f64>> = strings
        .into_iter()
        .map(|value| {
            let raw = value?;
            match raw.trim().parse::<f64>() {
                Ok(n) => Some(n),
                Err(_) => {
                    failures += 1;
                    first_bad.get_or_insert_with(|| raw.to_owned());
                    None
                }
            }
        })
        .collect();

    if let Some(value) = first_bad {
        return Err(conversion_error(column, ColumnKind::Numeric, value, failures));
    }
    Ok(Series::new(column.into(), values))
}

/// Reads numbers as epoch milliseconds. Fractions, NaN and values outside the
/// representable date range are rejected.
fn numbers_to_datetimes(column: &str, series: &Series) -> Result<Series> {
    let floats = series.cast(&DataType::Float64)?;
    let integers = series.cast(&DataType::Int64)?;
    let integral_dtype = series.dtype().is_integer();
    let mut failures = 0;
    let mut first_bad: Option<String> = None;

    let values: Vec<Option<i64>> = floats
        .f64()?
        .into_iter()
        .zip(integers.i64()?.into_iter())
        .map(|(float, integer)| {
            let float = float?;
            let millis = integer.filter(|ms| {
                float.fract() == 0.0 && DateTime::from_timestamp_millis(*ms).is_some()
            });
            if millis.is_none() {
                failures += 1;
                first_bad.get_or_insert_with(|| match integer {
                    Some(i) if integral_dtype => i.to_string(),
                    _ => float.to_string(),
                });
            }
            millis
        })
        .collect();

    if let Some(value) = first_bad {
        return Err(conversion_error(column, ColumnKind::Datetime, value, failures));
    }
    Ok(Series::new(column.into(), values).cast(&datetime_dtype())?)
}

fn parse_datetimes(column: &str, series: &Series) -> Result<Series> {
    let mut failures = 0;
    let mut first_bad: Option<String> = None;

    let values: Vec<Option<i64>> = series
        .str()?
        .into_iter()
        .map(|value| {
            let raw = value?;
            let parsed = parse_datetime_millis(raw);
            if parsed.is_none() {
                failures += 1;
                first_bad.get_or_insert_with(|| raw.to_owned());
            }
            parsed
        })
        .collect();

    if let Some(value) = first_bad {
        return Err(conversion_error(column, ColumnKind::Datetime, value, failures));
    }
    Ok(Series::new(column.into(), values).cast(&datetime_dtype())?)
}

/// Milliseconds since the Unix epoch for an RFC 3339 timestamp, an ISO-like
/// datetime or one of the accepted date layouts.
pub fn parse_datetime_millis(raw: &str) -> Option<i64> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.timestamp_millis());
    }
    if let Some(dt) = DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
    {
        return Some(dt.and_utc().timestamp_millis());
    }
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc().timestamp_millis())
}

/// Trims and/or title-cases a text or categorical column.
///
/// # Errors
///
/// - [`SweeperError::InvalidArgument`] when neither transformation is requested
/// - [`SweeperError::TypeMismatch`] for numeric and datetime columns
pub fn normalize_text(
    table: &Table,
    column: &str,
    normalization: TextNormalization,
) -> Result<CleaningOutcome> {
    if !normalization.trim && !normalization.title_case {
        return Err(SweeperError::InvalidArgument(
            "choose trimming, title case or both".to_owned(),
        ));
    }

    let kind = table.kind_of(column)?;
    if !kind.is_string_like() {
        return Err(SweeperError::TypeMismatch {
            column: column.to_owned(),
            kind,
            operation: "text normalization".to_owned(),
        });
    }

    let (normalized, changed) = normalize_column(table, column, normalization)?;
    let mut cleaned = table.clone();
    cleaned.replace_column(normalized, kind)?;

    Ok(CleaningOutcome {
        table: cleaned,
        message: format!(
            "Normalized `{column}`: {} ({changed} values changed)",
            normalization.describe()
        ),
        affected: changed,
    })
}

fn normalize_column(
    table: &Table,
    column: &str,
    normalization: TextNormalization,
) -> Result<(Series, usize)> {
    let original = table.series(column)?;
    let mut normalized = if normalization.trim {
        eval_column(table, column, col(column).str().strip_chars(lit(NULL)))?
    } else {
        original.clone()
    };

    // No title-case expression without polars' `nightly` feature.
    if normalization.title_case {
        let titled: StringChunked = normalized
            .str()?
            .into_iter()
            .map(|value| value.map(title_case))
            .collect();
        normalized = titled.with_name(column.into()).into_series();
    }

    let changed = count_changed(original, &normalized)?;
    Ok((normalized, changed))
}

/// Upper-cases a letter that follows a non-letter and lower-cases the rest.
pub fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut previous_is_letter = false;
    for ch in text.chars() {
        if ch.is_alphabetic() {
            if previous_is_letter {
                out.extend(ch.to_lowercase());
            } else {
                out.extend(ch.to_uppercase());
            }
            previous_is_letter = true;
        } else {
            out.push(ch);
            previous_is_letter = false;
        }
    }
    out
}

/// One-click clean: drop rows with any null, drop duplicates, trim every text column.
///
/// # Errors
///
/// Returns an error if the dataframe engine fails.
pub fn quick_clean(table: &Table) -> Result<CleaningOutcome> {
    let complete = table.frame().clone().lazy().drop_nulls(None).collect()?;
    let dropped = table.height() - complete.height();

    let deduped = deduplicate(&table.with_rows(complete))?;
    let mut cleaned = deduped.table;

    let trim = TextNormalization {
        trim: true,
        title_case: false,
    };
    let mut trimmed_values = 0;
    let text_columns: Vec<(String, ColumnKind)> = cleaned
        .column_names()
        .into_iter()
        .zip(cleaned.kinds().iter().copied())
        .filter(|(_, kind)| kind.is_string_like())
        .collect();
    for (name, kind) in &text_columns {
        let (series, changed) = normalize_column(&cleaned, name, trim)?;
        cleaned.replace_column(series, *kind)?;
        trimmed_values += changed;
    }

    Ok(CleaningOutcome {
        table: cleaned,
        message: format!(
            "Quick clean: dropped {dropped} rows with missing values, removed {} duplicate rows, trimmed {trimmed_values} values in {} text columns",
            deduped.affected,
            text_columns.len()
        ),
        affected: dropped + deduped.affected + trimmed_values,
    })
}

/// Rounds to two decimals and drops trailing zeros: `34.2`, `5`, `0.33`.
pub fn format_number(value: f64) -> String {
    let fixed = format!("{value:.2}");
    fixed
        .trim_end_matches('0')
        .trim_end_matches('.')
        .to_owned()
}

fn format_millis(millis: i64) -> String {
    DateTime::from_timestamp_millis(millis)
        .map(|dt| dt.naive_utc().format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| millis.to_string())
}
