//! GBDT model implementation.
//!
//! High-level wrapper around [`Forest`] with training and prediction.
//! Access components via [`forest()`](GBDTModel::forest) and
//! [`meta()`](GBDTModel::meta).

use ndarray::ArrayView2;

use crate::model::meta::ModelMeta;
use crate::repr::Forest;
use crate::training::{sigmoid, GBDTTrainer, LogisticLoss, TrainError};
use crate::utils::{run_with_threads, Parallelism};

use super::{FittedClassifier, GBDTConfig};

/// Fitted binary GBDT classifier.
#[derive(Debug, Clone, PartialEq)]
pub struct GBDTModel {
    forest: Forest,
    meta: ModelMeta,
}

impl GBDTModel {
    /// Create a model from a forest, deriving metadata from it.
    pub fn from_forest(forest: Forest) -> Self {
        let meta = ModelMeta {
            feature_names: None,
            n_features: forest.n_features(),
            n_trees: forest.n_trees(),
            base_score: forest.base_score(),
        };
        Self { forest, meta }
    }

    /// Create a model from all its parts.
    pub fn from_parts(forest: Forest, meta: ModelMeta) -> Self {
        Self { forest, meta }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn forest(&self) -> &Forest {
        &self.forest
    }

    pub fn meta(&self) -> &ModelMeta {
        &self.meta
    }

    /// Set feature names.
    pub fn with_feature_names(mut self, names: Vec<String>) -> Self {
        self.meta.feature_names = Some(names);
        self
    }

    /// Train a new model with logistic loss.
    ///
    /// # Arguments
    ///
    /// * `features` - Encoded feature matrix `[n_samples, n_features]`, NaN for missing
    /// * `targets` - Labels in {0, 1}
    /// * `config` - Training configuration
    pub fn train(
        features: ArrayView2<'_, f32>,
        targets: &[f32],
        config: &GBDTConfig,
    ) -> Result<Self, TrainError> {
        run_with_threads(config.n_threads, |parallelism| {
            Self::train_inner(features, targets, config, parallelism)
        })
    }

    fn train_inner(
        features: ArrayView2<'_, f32>,
        targets: &[f32],
        config: &GBDTConfig,
        parallelism: Parallelism,
    ) -> Result<Self, TrainError> {
        let trainer = GBDTTrainer::new(LogisticLoss, config.to_trainer_params(parallelism));
        let forest = trainer.train(features, targets)?;
        Ok(Self::from_forest(forest))
    }

    // =========================================================================
    // Prediction
    // =========================================================================

    /// Raw margins (log-odds).
    pub fn predict_margin(&self, features: ArrayView2<'_, f32>) -> Vec<f64> {
        self.forest.predict_margin(features)
    }
}

impl FittedClassifier for GBDTModel {
    fn n_features(&self) -> usize {
        self.forest.n_features()
    }

    fn predict_proba(&self, features: ArrayView2<'_, f32>) -> Vec<f64> {
        self.predict_margin(features).into_iter().map(sigmoid).collect()
    }
}
