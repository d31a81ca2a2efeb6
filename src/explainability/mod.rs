//! Explainability module.
//!
//! Exact TreeSHAP attributions for the fitted forest, plus the summaries
//! built on them:
//! - [`Explanation`]: one prediction's contributions aligned to feature names
//! - [`LoanDecision`]: approval, confidence, risk level and top factors
//! - [`GlobalImportance`]: mean |SHAP| per feature over a set
//!
//! # Example
//!
//! ```
//! use loanboost::explainability::TreeExplainer;
//! use loanboost::repr::{Forest, MutableTree};
//!
//! let mut tree = MutableTree::new();
//! let root = tree.init_root(2.0);
//! let (l, r) = tree.apply_numeric_split(root, 0, 0.5, true, 1.0, 1.0, 1.0);
//! tree.make_leaf(l, -1.0);
//! tree.make_leaf(r, 1.0);
//! let mut forest = Forest::new(1);
//! forest.push_tree(tree.freeze());
//!
//! let explainer = TreeExplainer::new(forest, vec!["income".into()]).unwrap();
//! let explanation = explainer.explain_row(&[1.0]).unwrap();
//! assert_eq!(explanation.values(), &[1.0]);
//! assert_eq!(explanation.margin(), 1.0);
//! ```

mod decision;
mod explanation;
mod importance;
pub mod shap;

use thiserror::Error;

use crate::preprocess::PreprocessError;
use crate::repr::{ForestValidationError, NodeId};

pub use decision::{LOW_RISK_THRESHOLD, LoanDecision, RiskLevel};
pub use explanation::{Contribution, Effect, Explanation, NEUTRAL_THRESHOLD};
pub use importance::GlobalImportance;
pub use shap::{ShapValues, TreeExplainer};

/// Errors raised while building an explainer or explaining inputs.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExplainError {
    #[error(transparent)]
    Forest(#[from] ForestValidationError),

    #[error("tree {tree} node {node} has cover {cover}; TreeSHAP needs positive covers")]
    InvalidCover { tree: usize, node: NodeId, cover: f64 },

    #[error("forest has {expected} features but {got} names were given")]
    FeatureNames { expected: usize, got: usize },

    #[error("expected {expected} encoded features, got {got}")]
    FeatureMismatch { expected: usize, got: usize },

    #[error(transparent)]
    Preprocess(#[from] PreprocessError),
}
