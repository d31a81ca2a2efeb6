//! GBDT Trainer for gradient boosting.
//!
//! This module provides the main training loop for gradient boosted decision trees.
//! It orchestrates objective computation, tree growing, and prediction updates.
//!
//! # Example
//!
//! ```
//! use loanboost::training::{GBDTParams, GBDTTrainer, GainParams, LogisticLoss};
//! use ndarray::array;
//!
//! let params = GBDTParams {
//!     n_trees: 10,
//!     gain: GainParams { reg_lambda: 1.0, min_child_weight: 0.0, ..Default::default() },
//!     ..Default::default()
//! };
//! let x = array![[0.0f32], [1.0], [2.0], [3.0]];
//! let y = [0.0, 0.0, 1.0, 1.0];
//! let forest = GBDTTrainer::new(LogisticLoss, params).train(x.view(), &y).unwrap();
//! assert_eq!(forest.n_trees(), 10);
//! ```

use ndarray::ArrayView2;
use thiserror::Error;

use crate::repr::{Forest, Tree};
use crate::training::logger::{TrainingLogger, Verbosity};
use crate::training::objective::ObjectiveFn;
use crate::training::Gradients;
use crate::utils::Parallelism;

use super::grower::{GrowerParams, TreeGrower};
use super::sampling::{ColumnSampler, RowSampler};
use super::split::GainParams;

/// Training input rejected before any tree is grown.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TrainError {
    #[error("training data has no rows")]
    Empty,

    #[error("training data has no feature columns")]
    NoFeatures,

    #[error("{n_rows} feature rows but {n_targets} targets")]
    LengthMismatch { n_rows: usize, n_targets: usize },

    #[error("invalid target {value} at row {row} for {objective} objective")]
    InvalidTarget {
        row: usize,
        value: f32,
        objective: &'static str,
    },
}

// =============================================================================
// GBDTParams
// =============================================================================

/// Parameters for GBDT training.
///
/// Use struct construction with `..Default::default()` for convenient configuration.
#[derive(Clone, Debug)]
pub struct GBDTParams {
    // --- Boosting parameters ---
    /// Number of boosting rounds (trees to train).
    pub n_trees: u32,
    /// Learning rate (shrinkage).
    pub learning_rate: f64,

    // --- Tree structure ---
    /// Maximum tree depth.
    pub max_depth: u32,

    // --- Regularization ---
    /// Gain computation parameters (regularization, min child weight, etc.).
    pub gain: GainParams,

    // --- Sampling ---
    /// Fraction of rows per tree. `None` keeps every row.
    pub subsample: Option<f32>,
    /// Fraction of features per tree. `None` keeps every feature.
    pub colsample_bytree: Option<f32>,

    // --- Resource control ---
    /// Split search parallelism.
    pub parallelism: Parallelism,

    // --- Logging ---
    /// Verbosity level for training output.
    pub verbosity: Verbosity,

    // --- Reproducibility ---
    /// Random seed.
    pub seed: u64,
}

impl Default for GBDTParams {
    fn default() -> Self {
        Self {
            n_trees: 100,
            learning_rate: 0.3,
            max_depth: 6,
            gain: GainParams::default(),
            subsample: None,
            colsample_bytree: None,
            parallelism: Parallelism::Sequential,
            verbosity: Verbosity::default(),
            seed: 42,
        }
    }
}

impl GBDTParams {
    fn to_grower_params(&self) -> GrowerParams {
        GrowerParams {
            gain: self.gain.clone(),
            learning_rate: self.learning_rate,
            max_depth: self.max_depth,
        }
    }
}

// =============================================================================
// GBDTTrainer
// =============================================================================

/// Gradient boosting trainer for a single-output objective.
///
/// Coordinates the boosting loop:
/// 1. Initialize margins with the objective's base score
/// 2. For each round: compute gradients, grow a tree, update margins
/// 3. Return the forest
#[derive(Debug, Clone)]
pub struct GBDTTrainer<O: ObjectiveFn> {
    objective: O,
    params: GBDTParams,
}

impl<O: ObjectiveFn> GBDTTrainer<O> {
    pub fn new(objective: O, params: GBDTParams) -> Self {
        Self { objective, params }
    }

    pub fn params(&self) -> &GBDTParams {
        &self.params
    }

    pub fn objective(&self) -> &O {
        &self.objective
    }

    /// Train a forest on a sample-major feature matrix.
    ///
    /// Missing feature values are NaN.
    pub fn train(&self, x: ArrayView2<'_, f32>, targets: &[f32]) -> Result<Forest, TrainError> {
        let (n_rows, n_features) = x.dim();
        if n_rows == 0 {
            return Err(TrainError::Empty);
        }
        if n_features == 0 {
            return Err(TrainError::NoFeatures);
        }
        if targets.len() != n_rows {
            return Err(TrainError::LengthMismatch {
                n_rows,
                n_targets: targets.len(),
            });
        }
        if let Some((row, &value)) = targets
            .iter()
            .enumerate()
            .find(|(_, t)| !self.objective.is_valid_target(**t))
        {
            return Err(TrainError::InvalidTarget {
                row,
                value,
                objective: self.objective.name(),
            });
        }

        let mut logger = TrainingLogger::new(self.params.verbosity);
        logger.start_training(self.params.n_trees as usize, n_rows, n_features);
        if targets.iter().all(|&t| t == targets[0]) {
            logger.warn("all targets belong to one class, trees can only refine the base score");
        }

        let base_score = self.objective.compute_base_score(targets);
        logger.log_base_score(base_score);

        let grower = TreeGrower::new(self.params.to_grower_params(), self.params.parallelism);
        let mut row_sampler = RowSampler::new(n_rows, self.params.subsample, self.params.seed);
        let mut col_sampler =
            ColumnSampler::new(n_features, self.params.colsample_bytree, self.params.seed);

        let mut forest = Forest::new(n_features).with_base_score(base_score);
        let mut margins = vec![base_score; n_rows];
        let mut gradients = Gradients::new(n_rows);

        for round in 0..self.params.n_trees as usize {
            self.objective
                .compute_gradients(&margins, targets, &mut gradients);

            let rows = row_sampler.sample();
            let features = col_sampler.sample_for_tree();
            let tree = grower.grow(x, &gradients, rows, &features);

            update_margins(&tree, x, &mut margins);

            if logger.verbosity() >= Verbosity::Debug {
                logger.log_round(round, self.objective.loss(&margins, targets), tree.n_leaves());
            }
            forest.push_tree(tree);
        }

        logger.finish_training(forest.n_trees(), self.objective.loss(&margins, targets));
        Ok(forest)
    }
}

/// Add a tree's output to every row's margin.
fn update_margins(tree: &Tree, x: ArrayView2<'_, f32>, margins: &mut [f64]) {
    let mut scratch = Vec::new();
    for (row, margin) in x.rows().into_iter().zip(margins.iter_mut()) {
        let value = match row.as_slice() {
            Some(slice) => tree.predict_row(slice),
            None => {
                scratch.clear();
                scratch.extend(row.iter().copied());
                tree.predict_row(&scratch)
            }
        };
        *margin += value;
    }
}
