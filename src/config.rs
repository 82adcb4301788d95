use crate::error::{Result, SweeperError};
use crate::sweeper::samples::SampleDataset;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Download locations for the built-in sample datasets.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct SampleUrls {
    pub iris: String,
    pub titanic: String,
    pub tips: String,
}

impl Default for SampleUrls {
    fn default() -> Self {
        Self {
            iris: SampleDataset::Iris.default_url().to_owned(),
            titanic: SampleDataset::Titanic.default_url().to_owned(),
            tips: SampleDataset::Tips.default_url().to_owned(),
        }
    }
}

impl SampleUrls {
    pub fn url_for(&self, sample: SampleDataset) -> &str {
        match sample {
            SampleDataset::Iris => &self.iris,
            SampleDataset::Titanic => &self.titanic,
            SampleDataset::Tips => &self.tips,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct SweeperConfig {
    /// Number of action log entries shown, most recent first (default: 10)
    pub log_display_limit: usize,
    /// Rows shown in table previews (default: 5)
    pub preview_rows: usize,
    /// Rows scanned when inferring CSV column types (default: 10000)
    pub infer_schema_length: usize,
    /// Timeout for fetching a sample dataset, in seconds (default: 30)
    pub sample_timeout_secs: u64,
    pub samples: SampleUrls,
}

impl Default for SweeperConfig {
    fn default() -> Self {
        Self {
            log_display_limit: 10,
            preview_rows: 5,
            infer_schema_length: 10_000,
            sample_timeout_secs: 30,
            samples: SampleUrls::default(),
        }
    }
}

impl SweeperConfig {
    /// Reads a JSON config file; missing fields keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`SweeperError::Config`] if the file cannot be read or parsed, or
    /// if a limit is zero.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            SweeperError::Config(format!("Failed to read {}: {e}", path.display()))
        })?;
        Self::from_json(&content)
    }

    /// Parses a JSON config string.
    ///
    /// # Errors
    ///
    /// Returns [`SweeperError::Config`] for malformed JSON or zero limits.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.log_display_limit == 0 {
            return Err(SweeperError::Config(
                "log_display_limit must be at least 1".to_owned(),
            ));
        }
        if self.infer_schema_length == 0 {
            return Err(SweeperError::Config(
                "infer_schema_length must be at least 1".to_owned(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SweeperConfig::default();
        assert_eq!(config.log_display_limit, 10);
        assert_eq!(config.preview_rows, 5);
        assert_eq!(
            config.samples.url_for(SampleDataset::Tips),
            SampleDataset::Tips.default_url()
        );
    }

    #[test]
    fn test_partial_json_keeps_defaults() -> anyhow::Result<()> {
        let config = SweeperConfig::from_json(
            r#"{ "log_display_limit": 3, "samples": { "iris": "http://localhost/iris.csv" } }"#,
        )?;
        assert_eq!(config.log_display_limit, 3);
        assert_eq!(config.infer_schema_length, 10_000);
        assert_eq!(config.samples.iris, "http://localhost/iris.csv");
        assert_eq!(config.samples.titanic, SampleDataset::Titanic.default_url());
        Ok(())
    }

    #[test]
    fn test_zero_limit_rejected() {
        let result = SweeperConfig::from_json(r#"{ "log_display_limit": 0 }"#);
        assert!(matches!(result, Err(SweeperError::Config(_))));
    }

    #[test]
    fn test_from_file() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("sweeper.json");
        std::fs::write(&path, r#"{ "preview_rows": 20 }"#)?;

        let config = SweeperConfig::from_file(&path)?;
        assert_eq!(config.preview_rows, 20);
        assert!(SweeperConfig::from_file(dir.path().join("missing.json")).is_err());
        Ok(())
    }
}
