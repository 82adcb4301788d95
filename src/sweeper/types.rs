use crate::error::{Result, SweeperError};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Semantic type of a column, consulted by every operation to decide whether it applies.
#[derive(Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Hash, Debug)]
#[serde(rename_all = "lowercase")]
pub enum ColumnKind {
    Numeric,
    Text,
    Datetime,
    Categorical,
}

impl std::fmt::Display for ColumnKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ColumnKind {
    type Err = SweeperError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "numeric" | "number" => Ok(Self::Numeric),
            "text" | "string" => Ok(Self::Text),
            "datetime" | "date" => Ok(Self::Datetime),
            "categorical" | "category" => Ok(Self::Categorical),
            other => Err(SweeperError::InvalidArgument(format!(
                "unknown column type '{other}' (expected numeric, text, datetime or categorical)"
            ))),
        }
    }
}

impl ColumnKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Numeric => "Numeric",
            Self::Text => "Text",
            Self::Datetime => "Datetime",
            Self::Categorical => "Categorical",
        }
    }

    /// Text and categorical columns are both stored as strings.
    pub fn is_string_like(self) -> bool {
        matches!(self, Self::Text | Self::Categorical)
    }

    /// Infers the kind for a freshly loaded column, `None` for nested types.
    pub fn from_dtype(dtype: &DataType) -> Option<Self> {
        match dtype {
            d if d.is_primitive_numeric() => Some(Self::Numeric),
            DataType::String | DataType::Null => Some(Self::Text),
            DataType::Boolean => Some(Self::Categorical),
            DataType::Date | DataType::Datetime(_, _) => Some(Self::Datetime),
            _ => None,
        }
    }
}

/// Physical dtype used for datetime columns.
pub fn datetime_dtype() -> DataType {
    DataType::Datetime(TimeUnit::Milliseconds, None)
}

/// An in-memory table: a dataframe plus one declared kind per column.
///
/// Column order and names are those of the frame; `kinds[i]` describes column `i`.
#[derive(Clone, Debug)]
pub struct Table {
    df: DataFrame,
    kinds: Vec<ColumnKind>,
}

impl Table {
    /// Builds a table from a loaded frame, inferring kinds and normalising storage.
    ///
    /// # Errors
    ///
    /// Returns [`SweeperError::Load`] for blank column names or nested column types.
    pub fn from_frame(df: DataFrame) -> Result<Self> {
        let mut columns = Vec::with_capacity(df.width());
        let mut kinds = Vec::with_capacity(df.width());

        for column in df.get_columns() {
            if column.name().trim().is_empty() {
                return Err(SweeperError::Load("blank column name in header".to_owned()));
            }
            let kind = ColumnKind::from_dtype(column.dtype()).ok_or_else(|| {
                SweeperError::Load(format!(
                    "column `{}` has unsupported type {}",
                    column.name(),
                    column.dtype()
                ))
            })?;

            let stored = match kind {
                ColumnKind::Numeric => column.clone(),
                ColumnKind::Text | ColumnKind::Categorical => {
                    if column.dtype() == &DataType::String {
                        column.clone()
                    } else {
                        column.cast(&DataType::String)?
                    }
                }
                ColumnKind::Datetime => {
                    if column.dtype() == &datetime_dtype() {
                        column.clone()
                    } else {
                        column.cast(&datetime_dtype())?
                    }
                }
            };

            columns.push(stored);
            kinds.push(kind);
        }

        let df = DataFrame::new(columns).map_err(|e| SweeperError::Load(e.to_string()))?;
        Ok(Self { df, kinds })
    }

    pub(crate) fn from_parts(df: DataFrame, kinds: Vec<ColumnKind>) -> Self {
        debug_assert_eq!(df.width(), kinds.len(), "one kind per column");
        Self { df, kinds }
    }

    pub fn frame(&self) -> &DataFrame {
        &self.df
    }

    pub fn height(&self) -> usize {
        self.df.height()
    }

    pub fn width(&self) -> usize {
        self.df.width()
    }

    pub fn is_empty(&self) -> bool {
        self.df.height() == 0
    }

    pub fn column_names(&self) -> Vec<String> {
        self.df
            .get_column_names()
            .iter()
            .map(|name| name.to_string())
            .collect()
    }

    pub fn kinds(&self) -> &[ColumnKind] {
        &self.kinds
    }

    fn position(&self, name: &str) -> Result<usize> {
        self.df
            .get_column_index(name)
            .ok_or_else(|| SweeperError::UnknownColumn(name.to_owned()))
    }

    /// Declared kind of a column.
    ///
    /// # Errors
    ///
    /// Returns [`SweeperError::UnknownColumn`] if the column does not exist.
    pub fn kind_of(&self, name: &str) -> Result<ColumnKind> {
        let idx = self.position(name)?;
        self.kinds
            .get(idx)
            .copied()
            .ok_or_else(|| SweeperError::UnknownColumn(name.to_owned()))
    }

    /// Values of a column.
    ///
    /// # Errors
    ///
    /// Returns [`SweeperError::UnknownColumn`] if the column does not exist.
    pub fn series(&self, name: &str) -> Result<&Series> {
        self.df
            .column(name)
            .map(Column::as_materialized_series)
            .map_err(|_| SweeperError::UnknownColumn(name.to_owned()))
    }

    /// Names of the numeric columns, in table order.
    pub fn numeric_columns(&self) -> Vec<String> {
        self.df
            .get_column_names()
            .iter()
            .zip(&self.kinds)
            .filter(|(_, kind)| **kind == ColumnKind::Numeric)
            .map(|(name, _)| name.to_string())
            .collect()
    }

    /// First `rows` rows, for display.
    pub fn preview(&self, rows: usize) -> DataFrame {
        self.df.head(Some(rows))
    }

    /// Per-column overview: kind, missing values and distinct values.
    ///
    /// # Errors
    ///
    /// Returns an error if the dataframe engine cannot count distinct values.
    pub fn profile(&self) -> Result<Vec<ColumnProfile>> {
        self.df
            .get_columns()
            .iter()
            .zip(&self.kinds)
            .map(|(column, kind)| {
                let series = column.as_materialized_series();
                Ok(ColumnProfile {
                    name: column.name().to_string(),
                    kind: *kind,
                    nulls: series.null_count(),
                    distinct: series.n_unique()?,
                })
            })
            .collect()
    }

    /// Cell-for-cell equality including column names, order and kinds.
    pub fn equals(&self, other: &Self) -> bool {
        self.kinds == other.kinds && self.df.equals_missing(&other.df)
    }

    /// Replaces an existing column (matched by the series name) and its kind.
    pub(crate) fn replace_column(&mut self, series: Series, kind: ColumnKind) -> Result<()> {
        let idx = self.position(series.name().as_str())?;
        self.df.with_column(series)?;
        if let Some(slot) = self.kinds.get_mut(idx) {
            *slot = kind;
        }
        Ok(())
    }

    /// Same columns and kinds over a different set of rows.
    pub(crate) fn with_rows(&self, df: DataFrame) -> Self {
        Self::from_parts(df, self.kinds.clone())
    }
}

impl std::fmt::Display for Table {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.df)
    }
}

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub struct ColumnProfile {
    pub name: String,
    pub kind: ColumnKind,
    pub nulls: usize,
    pub distinct: usize,
}

/// How to treat missing values in one column.
#[derive(Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Debug)]
#[serde(rename_all = "snake_case")]
pub enum MissingStrategy {
    /// Remove every row where the column is null
    DropRows,
    Mean,
    Median,
    /// Most frequent value; ties go to the value seen first
    Mode,
}

impl MissingStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DropRows => "drop rows",
            Self::Mean => "mean",
            Self::Median => "median",
            Self::Mode => "mode",
        }
    }
}

impl FromStr for MissingStrategy {
    type Err = SweeperError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "drop" | "drop_rows" | "drop-rows" => Ok(Self::DropRows),
            "mean" => Ok(Self::Mean),
            "median" => Ok(Self::Median),
            "mode" => Ok(Self::Mode),
            other => Err(SweeperError::InvalidArgument(format!(
                "unknown missing-value strategy '{other}' (expected drop, mean, median or mode)"
            ))),
        }
    }
}

#[derive(Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Debug)]
pub struct TextNormalization {
    #[serde(default)]
    pub trim: bool,
    #[serde(default)]
    pub title_case: bool,
}

impl TextNormalization {
    pub fn describe(&self) -> &'static str {
        match (self.trim, self.title_case) {
            (true, true) => "trimmed whitespace and applied title case",
            (true, false) => "trimmed whitespace",
            (false, true) => "applied title case",
            (false, false) => "no changes",
        }
    }
}

/// Tabular file formats accepted by the loader and produced by the exporter.
#[derive(Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Debug)]
#[serde(rename_all = "lowercase")]
pub enum FileFormat {
    Csv,
    Excel,
    Json,
}

impl FileFormat {
    /// Picks a format from a file name's extension.
    ///
    /// # Errors
    ///
    /// Returns [`SweeperError::Load`] for unknown extensions.
    pub fn from_file_name(name: &str) -> Result<Self> {
        let ext = std::path::Path::new(name)
            .extension()
            .and_then(|s| s.to_str())
            .unwrap_or("")
            .to_lowercase();

        match ext.as_str() {
            "csv" => Ok(Self::Csv),
            "xlsx" | "xls" | "xlsm" => Ok(Self::Excel),
            "json" => Ok(Self::Json),
            _ => Err(SweeperError::Load(format!("Unsupported file extension: {ext}"))),
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Excel => "xlsx",
            Self::Json => "json",
        }
    }

    pub fn media_type(&self) -> &'static str {
        match self {
            Self::Csv => "text/csv",
            Self::Excel => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
            Self::Json => "application/json",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Csv => "CSV",
            Self::Excel => "Excel",
            Self::Json => "JSON",
        }
    }
}

impl FromStr for FileFormat {
    type Err = SweeperError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "excel" | "xlsx" => Ok(Self::Excel),
            "json" => Ok(Self::Json),
            other => Err(SweeperError::InvalidArgument(format!(
                "unknown format '{other}' (expected csv, excel or json)"
            ))),
        }
    }
}

/// Bytes ready to hand to a download, plus how to name and label them.
#[derive(Clone, Debug)]
pub struct ExportPayload {
    pub bytes: Vec<u8>,
    pub file_name: String,
    pub media_type: &'static str,
}

#[derive(Clone, Copy, Serialize, Deserialize, PartialEq, Debug)]
pub enum ValidationRule {
    Email,
    /// Inclusive bounds
    Range { min: f64, max: f64 },
}

impl std::fmt::Display for ValidationRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Email => write!(f, "email format"),
            Self::Range { min, max } => write!(f, "range [{min}, {max}]"),
        }
    }
}

/// Outcome of a read-only check over one column. Nulls are never counted.
#[derive(Clone, Serialize, Deserialize, Debug)]
pub struct ValidationResult {
    pub column: String,
    pub rule: ValidationRule,
    /// Non-null values inspected
    pub checked: usize,
    pub violations: usize,
    /// A few offending values, rendered as text
    pub samples: Vec<String>,
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        self.violations == 0
    }

    pub fn message(&self) -> String {
        if self.is_valid() {
            format!(
                "All {} values in `{}` pass the {} check",
                self.checked, self.column, self.rule
            )
        } else {
            format!(
                "{} of {} values in `{}` fail the {} check",
                self.violations, self.checked, self.column, self.rule
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_inference_from_dtype() {
        assert_eq!(
            ColumnKind::from_dtype(&DataType::Int64),
            Some(ColumnKind::Numeric)
        );
        assert_eq!(
            ColumnKind::from_dtype(&DataType::Float64),
            Some(ColumnKind::Numeric)
        );
        assert_eq!(
            ColumnKind::from_dtype(&DataType::String),
            Some(ColumnKind::Text)
        );
        assert_eq!(
            ColumnKind::from_dtype(&DataType::Boolean),
            Some(ColumnKind::Categorical)
        );
        assert_eq!(
            ColumnKind::from_dtype(&DataType::Date),
            Some(ColumnKind::Datetime)
        );
        assert_eq!(
            ColumnKind::from_dtype(&DataType::List(Box::new(DataType::Int64))),
            None
        );
    }

    #[test]
    fn test_table_from_frame_normalises_storage() -> anyhow::Result<()> {
        let df = df!(
            "id" => &[1i64, 2, 3],
            "name" => &["a", "b", "c"],
            "active" => &[true, false, true]
        )?;
        let table = Table::from_frame(df)?;

        assert_eq!(
            table.kinds(),
            &[ColumnKind::Numeric, ColumnKind::Text, ColumnKind::Categorical]
        );
        assert_eq!(table.series("active")?.dtype(), &DataType::String);
        assert_eq!(table.numeric_columns(), vec!["id".to_owned()]);
        assert!(matches!(
            table.kind_of("missing"),
            Err(SweeperError::UnknownColumn(_))
        ));
        Ok(())
    }

    #[test]
    fn test_profile_counts_nulls() -> anyhow::Result<()> {
        let df = df!("score" => &[Some(1.0), None, Some(1.0)])?;
        let table = Table::from_frame(df)?;
        let profile = table.profile()?;

        assert_eq!(profile.len(), 1);
        assert_eq!(profile[0].nulls, 1);
        assert_eq!(profile[0].kind, ColumnKind::Numeric);
        Ok(())
    }

    #[test]
    fn test_format_from_file_name() {
        assert_eq!(FileFormat::from_file_name("a.CSV").ok(), Some(FileFormat::Csv));
        assert_eq!(
            FileFormat::from_file_name("report.xlsx").ok(),
            Some(FileFormat::Excel)
        );
        assert_eq!(
            FileFormat::from_file_name("rows.json").ok(),
            Some(FileFormat::Json)
        );
        assert!(matches!(
            FileFormat::from_file_name("notes.txt"),
            Err(SweeperError::Load(_))
        ));
    }

    #[test]
    fn test_parse_user_choices() {
        assert_eq!("Numeric".parse::<ColumnKind>().ok(), Some(ColumnKind::Numeric));
        assert_eq!("drop".parse::<MissingStrategy>().ok(), Some(MissingStrategy::DropRows));
        assert!("average".parse::<MissingStrategy>().is_err());
    }
}
