//! End-to-end run configuration.
//!
//! Loaded from TOML; every field has a default so a file only needs the
//! settings it changes:
//!
//! ```toml
//! data_path = "data/loans.csv"
//! test_fraction = 0.25
//!
//! [booster]
//! n_trees = 200
//! learning_rate = 0.1
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::{ConfigError, GBDTConfig};

/// Errors raised while loading or validating a [`PipelineConfig`].
#[derive(Debug, Error)]
pub enum PipelineConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("test_fraction must be in (0, 1), got {0}")]
    InvalidTestFraction(f64),

    #[error(transparent)]
    Booster(#[from] ConfigError),
}

/// Settings for one training run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Input CSV.
    pub data_path: PathBuf,
    /// Fitted pipeline artifact.
    pub model_path: PathBuf,
    /// Explainer artifact.
    pub explainer_path: PathBuf,
    /// Share of rows held out for evaluation.
    pub test_fraction: f64,
    /// Seed for the train/test split.
    pub seed: u64,
    /// Number of features listed in the global importance summary.
    pub top_k: usize,
    pub booster: GBDTConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from("loans.csv"),
            model_path: PathBuf::from("loan_model.bin"),
            explainer_path: PathBuf::from("loan_explainer.bin"),
            test_fraction: 0.2,
            seed: 42,
            top_k: 10,
            booster: GBDTConfig::default(),
        }
    }
}

impl PipelineConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(s: &str) -> Result<Self, PipelineConfigError> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, PipelineConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| PipelineConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    pub fn validate(&self) -> Result<(), PipelineConfigError> {
        if !(self.test_fraction > 0.0 && self.test_fraction < 1.0) {
            return Err(PipelineConfigError::InvalidTestFraction(self.test_fraction));
        }
        self.booster.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let config = PipelineConfig::from_toml_str("").unwrap();
        assert_eq!(config, PipelineConfig::default());
        assert_eq!(config.data_path, PathBuf::from("loans.csv"));
        assert_eq!(config.model_path, PathBuf::from("loan_model.bin"));
        assert_eq!(config.booster.n_trees, 100);
    }

    #[test]
    fn partial_booster_section() {
        let config = PipelineConfig::from_toml_str(
            r#"
            test_fraction = 0.3
            [booster]
            n_trees = 7
            "#,
        )
        .unwrap();
        assert_eq!(config.test_fraction, 0.3);
        assert_eq!(config.booster.n_trees, 7);
        assert_eq!(config.booster.max_depth, 6);
    }

    #[test]
    fn rejects_bad_values() {
        assert!(matches!(
            PipelineConfig::from_toml_str("test_fraction = 1.0"),
            Err(PipelineConfigError::InvalidTestFraction(_))
        ));
        assert!(matches!(
            PipelineConfig::from_toml_str("[booster]\nn_trees = 0"),
            Err(PipelineConfigError::Booster(ConfigError::InvalidNTrees))
        ));
        assert!(matches!(
            PipelineConfig::from_toml_str("seed = \"x\""),
            Err(PipelineConfigError::Parse(_))
        ));
    }

    #[test]
    fn missing_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            PipelineConfig::from_file(dir.path().join("none.toml")),
            Err(PipelineConfigError::Read { .. })
        ));
    }
}
