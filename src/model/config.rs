//! High-level GBDT configuration with builder pattern.
//!
//! [`GBDTConfig`] composes nested parameter groups and uses the `bon` crate
//! for builder generation, with validation at `build()`.
//!
//! # Example
//!
//! ```
//! use loanboost::model::{GBDTConfig, SamplingParams};
//!
//! // All defaults
//! let config = GBDTConfig::builder().build().unwrap();
//! assert_eq!(config.n_trees, 100);
//!
//! let config = GBDTConfig::builder()
//!     .n_trees(200)
//!     .learning_rate(0.1)
//!     .max_depth(4)
//!     .sampling(SamplingParams { subsample: 0.8, ..Default::default() })
//!     .build()
//!     .unwrap();
//! assert_eq!(config.max_depth, 4);
//! ```

use bon::Builder;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::repr::MAX_TREE_DEPTH;
use crate::training::{GBDTParams, GainParams, Verbosity};
use crate::utils::Parallelism;

// =============================================================================
// ConfigError
// =============================================================================

/// Errors that can occur during configuration validation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("learning_rate must be positive, got {0}")]
    InvalidLearningRate(f32),

    #[error("n_trees must be at least 1")]
    InvalidNTrees,

    #[error("max_depth must be at most {max}, got {value}")]
    InvalidMaxDepth { value: u32, max: usize },

    #[error("{field} must be in (0, 1], got {value}")]
    InvalidSamplingRatio { field: &'static str, value: f32 },

    #[error("{field} must be non-negative, got {value}")]
    InvalidRegularization { field: &'static str, value: f32 },
}

// =============================================================================
// Parameter groups
// =============================================================================

/// Regularization parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegularizationParams {
    /// L2 regularization term on leaf weights. Default: 1.0.
    pub lambda: f32,
    /// L1 regularization term on leaf weights. Default: 0.0.
    pub alpha: f32,
    /// Minimum sum of hessians required in a child. Default: 1.0.
    pub min_child_weight: f32,
    /// Minimum gain required to make a split. Default: 0.0.
    pub min_gain: f32,
}

impl Default for RegularizationParams {
    fn default() -> Self {
        Self {
            lambda: 1.0,
            alpha: 0.0,
            min_child_weight: 1.0,
            min_gain: 0.0,
        }
    }
}

impl RegularizationParams {
    fn validate(&self) -> Result<(), ConfigError> {
        let fields = [
            ("lambda", self.lambda),
            ("alpha", self.alpha),
            ("min_child_weight", self.min_child_weight),
            ("min_gain", self.min_gain),
        ];
        for (field, value) in fields {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::InvalidRegularization { field, value });
            }
        }
        Ok(())
    }

    fn to_gain_params(&self) -> GainParams {
        GainParams {
            reg_lambda: self.lambda as f64,
            reg_alpha: self.alpha as f64,
            min_gain: self.min_gain as f64,
            min_child_weight: self.min_child_weight as f64,
        }
    }
}

/// Row and column sampling. A rate of 1.0 means no sampling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplingParams {
    /// Row subsampling ratio per tree. Default: 1.0.
    pub subsample: f32,
    /// Column subsampling ratio per tree. Default: 1.0.
    pub colsample_bytree: f32,
}

impl Default for SamplingParams {
    fn default() -> Self {
        Self {
            subsample: 1.0,
            colsample_bytree: 1.0,
        }
    }
}

impl SamplingParams {
    fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [("subsample", self.subsample), ("colsample_bytree", self.colsample_bytree)] {
            if !(value > 0.0 && value <= 1.0) {
                return Err(ConfigError::InvalidSamplingRatio { field, value });
            }
        }
        Ok(())
    }

    fn rate(value: f32) -> Option<f32> {
        (value < 1.0).then_some(value)
    }
}

// =============================================================================
// GBDTConfig
// =============================================================================

/// Configuration for training the loan classifier.
///
/// Defaults follow XGBoost: 100 trees, learning rate 0.3, max depth 6,
/// λ = 1, α = 0, γ = 0, min child weight 1, seed 42.
#[derive(Debug, Clone, PartialEq, Builder, Serialize, Deserialize)]
#[builder(derive(Clone, Debug), finish_fn(vis = "", name = __build_internal))]
#[serde(default)]
pub struct GBDTConfig {
    // === Boosting parameters ===
    /// Number of boosting rounds. Default: 100.
    #[builder(default = 100)]
    pub n_trees: u32,

    /// Learning rate (shrinkage). Default: 0.3.
    #[builder(default = 0.3)]
    pub learning_rate: f32,

    // === Tree structure ===
    /// Maximum tree depth. Default: 6.
    #[builder(default = 6)]
    pub max_depth: u32,

    // === Nested parameter groups ===
    #[builder(default)]
    pub regularization: RegularizationParams,

    #[builder(default)]
    pub sampling: SamplingParams,

    // === Resource control ===
    /// Thread count: 0 = auto, 1 = sequential, n > 1 = exactly n.
    #[builder(default = 1)]
    pub n_threads: usize,

    // === Reproducibility ===
    /// Random seed. Default: 42.
    #[builder(default = 42)]
    pub seed: u64,

    // === Logging ===
    #[builder(default)]
    pub verbosity: Verbosity,
}

/// Custom finishing function that validates the config.
impl<S: g_b_d_t_config_builder::IsComplete> GBDTConfigBuilder<S> {
    /// Build and validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if any parameter is invalid:
    /// - `learning_rate <= 0`
    /// - `n_trees == 0`
    /// - `max_depth` above [`MAX_TREE_DEPTH`]
    /// - Sampling ratios outside (0, 1]
    /// - Negative regularization parameters
    pub fn build(self) -> Result<GBDTConfig, ConfigError> {
        let config = self.__build_internal();
        config.validate()?;
        Ok(config)
    }
}

impl Default for GBDTConfig {
    fn default() -> Self {
        Self {
            n_trees: 100,
            learning_rate: 0.3,
            max_depth: 6,
            regularization: RegularizationParams::default(),
            sampling: SamplingParams::default(),
            n_threads: 1,
            seed: 42,
            verbosity: Verbosity::default(),
        }
    }
}

impl GBDTConfig {
    /// Validate the configuration.
    ///
    /// Deserialized configs bypass the builder, so callers loading them
    /// should call this.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.learning_rate.is_finite() || self.learning_rate <= 0.0 {
            return Err(ConfigError::InvalidLearningRate(self.learning_rate));
        }
        if self.n_trees == 0 {
            return Err(ConfigError::InvalidNTrees);
        }
        if self.max_depth as usize > MAX_TREE_DEPTH {
            return Err(ConfigError::InvalidMaxDepth {
                value: self.max_depth,
                max: MAX_TREE_DEPTH,
            });
        }
        self.sampling.validate()?;
        self.regularization.validate()?;
        Ok(())
    }

    /// Convert to trainer parameters.
    pub(crate) fn to_trainer_params(&self, parallelism: Parallelism) -> GBDTParams {
        GBDTParams {
            n_trees: self.n_trees,
            learning_rate: self.learning_rate as f64,
            max_depth: self.max_depth,
            gain: self.regularization.to_gain_params(),
            subsample: SamplingParams::rate(self.sampling.subsample),
            colsample_bytree: SamplingParams::rate(self.sampling.colsample_bytree),
            parallelism,
            verbosity: self.verbosity,
            seed: self.seed,
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
