use super::io::load_bytes;
use super::types::{FileFormat, Table};
use crate::config::SweeperConfig;
use crate::error::{Result, SweeperError};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;

/// Built-in datasets users can explore without uploading anything.
#[derive(Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Debug)]
#[serde(rename_all = "lowercase")]
pub enum SampleDataset {
    Iris,
    Titanic,
    Tips,
}

impl SampleDataset {
    pub const ALL: [Self; 3] = [Self::Iris, Self::Titanic, Self::Tips];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Iris => "iris",
            Self::Titanic => "titanic",
            Self::Tips => "tips",
        }
    }

    pub fn default_url(&self) -> &'static str {
        match self {
            Self::Iris => {
                "https://raw.githubusercontent.com/mwaskom/seaborn-data/master/iris.csv"
            }
            Self::Titanic => {
                "https://raw.githubusercontent.com/mwaskom/seaborn-data/master/titanic.csv"
            }
            Self::Tips => "https://raw.githubusercontent.com/mwaskom/seaborn-data/master/tips.csv",
        }
    }

    /// Label recorded in the action log.
    pub fn source_label(&self) -> String {
        format!("sample:{}", self.as_str())
    }
}

impl FromStr for SampleDataset {
    type Err = SweeperError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|sample| sample.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                SweeperError::InvalidArgument(format!(
                    "unknown sample '{s}' (expected iris, titanic or tips)"
                ))
            })
    }
}

/// Downloads a sample CSV and parses it. The connection is dropped before returning.
///
/// # Errors
///
/// Returns [`SweeperError::Load`] for network failures, HTTP error statuses and
/// malformed CSV.
pub fn fetch_sample(sample: SampleDataset, config: &SweeperConfig) -> Result<Table> {
    let url = config.samples.url_for(sample);
    tracing::info!(sample = sample.as_str(), url, "fetching sample dataset");

    let client = reqwest::blocking::Client::builder()
        .timeout(Duration::from_secs(config.sample_timeout_secs))
        .build()
        .map_err(|e| SweeperError::Load(format!("Failed to create HTTP client: {e}")))?;

    let bytes = client
        .get(url)
        .send()
        .and_then(reqwest::blocking::Response::error_for_status)
        .and_then(reqwest::blocking::Response::bytes)
        .map_err(|e| {
            SweeperError::Load(format!("Failed to fetch sample '{}': {e}", sample.as_str()))
        })?;

    load_bytes(&bytes, FileFormat::Csv, config.infer_schema_length)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_sample_names() {
        assert_eq!("Iris".parse::<SampleDataset>().ok(), Some(SampleDataset::Iris));
        assert_eq!(" tips ".parse::<SampleDataset>().ok(), Some(SampleDataset::Tips));
        assert!("penguins".parse::<SampleDataset>().is_err());
    }

    #[test]
    fn test_unreachable_sample_is_load_error() {
        let mut config = SweeperConfig::default();
        config.samples.titanic = "http://127.0.0.1:9/titanic.csv".to_owned();
        config.sample_timeout_secs = 2;

        let result = fetch_sample(SampleDataset::Titanic, &config);
        assert!(matches!(result, Err(SweeperError::Load(_))));
    }
}
