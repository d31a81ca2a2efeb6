//! High-level model wrappers.
//!
//! - [`Classifier`] / [`FittedClassifier`]: the seam the pipeline trains through
//! - [`GBDTClassifier`]: unfitted learner holding a [`GBDTConfig`]
//! - [`GBDTModel`]: fitted tree ensemble
//! - [`ModelMeta`]: introspection data
//!
//! # Example
//!
//! ```
//! use loanboost::model::{Classifier, FittedClassifier, GBDTClassifier, GBDTConfig};
//! use ndarray::array;
//!
//! let config = GBDTConfig::builder().n_trees(5).build().unwrap();
//! let x = array![[0.0f32], [0.0], [0.0], [0.0], [1.0], [1.0], [1.0], [1.0]];
//! let y = [0.0, 0.0, 0.0, 0.0, 1.0, 1.0, 1.0, 1.0];
//! let model = GBDTClassifier::new(config).fit(x.view(), &y).unwrap();
//! assert_eq!(model.predict(x.view()), y.to_vec());
//! ```

mod config;
mod gbdt;
mod meta;

use ndarray::ArrayView2;

use crate::training::TrainError;

pub use config::{ConfigError, GBDTConfig, RegularizationParams, SamplingParams};
pub use gbdt::GBDTModel;
pub use meta::ModelMeta;

/// Probability at or above which a sample is labelled positive.
pub const DECISION_THRESHOLD: f64 = 0.5;

/// A learner that can be fitted on encoded features and binary labels.
pub trait Classifier {
    type Fitted: FittedClassifier;

    fn fit(&self, features: ArrayView2<'_, f32>, labels: &[f32]) -> Result<Self::Fitted, TrainError>;
}

/// A fitted binary classifier.
pub trait FittedClassifier {
    /// Number of input columns expected.
    fn n_features(&self) -> usize;

    /// Positive-class probability per row.
    fn predict_proba(&self, features: ArrayView2<'_, f32>) -> Vec<f64>;

    /// Predicted label per row, 1.0 when probability ≥ [`DECISION_THRESHOLD`].
    fn predict(&self, features: ArrayView2<'_, f32>) -> Vec<f32> {
        self.predict_proba(features)
            .into_iter()
            .map(|p| if p >= DECISION_THRESHOLD { 1.0 } else { 0.0 })
            .collect()
    }
}

/// Unfitted gradient-boosted tree classifier.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GBDTClassifier {
    config: GBDTConfig,
}

impl GBDTClassifier {
    pub fn new(config: GBDTConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &GBDTConfig {
        &self.config
    }
}

impl Classifier for GBDTClassifier {
    type Fitted = GBDTModel;

    fn fit(&self, features: ArrayView2<'_, f32>, labels: &[f32]) -> Result<GBDTModel, TrainError> {
        GBDTModel::train(features, labels, &self.config)
    }
}
