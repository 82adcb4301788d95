#![expect(clippy::unwrap_used, clippy::indexing_slicing)]
use super::*;
use anyhow::Result;
use polars::prelude::*;

mod export;
mod io;

/// Builds a table from a frame literal, inferring kinds the way the loader does.
fn table(df: DataFrame) -> Result<Table> {
    Ok(Table::from_frame(df)?)
}

fn floats(table: &Table, column: &str) -> Result<Vec<Option<f64>>> {
    let series = table.series(column)?.cast(&DataType::Float64)?;
    Ok(series.f64()?.into_iter().collect())
}

fn strings(table: &Table, column: &str) -> Result<Vec<Option<String>>> {
    Ok(table
        .series(column)?
        .str()?
        .into_iter()
        .map(|v| v.map(str::to_owned))
        .collect())
}

#[test]
fn test_from_frame_kinds() -> Result<()> {
    let t = table(df!(
        "name" => ["Ada", "Bob"],
        "age" => [36i64, 41],
        "member" => [true, false]
    )?)?;

    assert_eq!(
        t.kinds(),
        &[ColumnKind::Text, ColumnKind::Numeric, ColumnKind::Categorical]
    );
    assert_eq!(t.series("member")?.dtype(), &DataType::String);
    assert_eq!(t.numeric_columns(), vec!["age".to_owned()]);
    assert!(matches!(
        t.kind_of("missing"),
        Err(crate::error::SweeperError::UnknownColumn(_))
    ));
    Ok(())
}

#[test]
fn test_profile_counts_nulls_and_distinct() -> Result<()> {
    let t = table(df!(
        "city" => [Some("Oslo"), None, Some("Oslo"), Some("Rome")]
    )?)?;

    let profile = t.profile()?;
    assert_eq!(profile.len(), 1);
    assert_eq!(profile[0].nulls, 1);
    // Null counts as its own distinct value.
    assert_eq!(profile[0].distinct, 3);
    Ok(())
}
