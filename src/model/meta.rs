//! Model metadata.

use serde::{Deserialize, Serialize};

/// Introspection data about a fitted model.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelMeta {
    /// Encoded feature names, aligned with the model's input columns.
    pub feature_names: Option<Vec<String>>,
    /// Number of input features.
    pub n_features: usize,
    /// Number of trees.
    pub n_trees: usize,
    /// Initial margin (log-odds of the training positive rate).
    pub base_score: f64,
}

impl ModelMeta {
    /// Name of feature `index`, or `f{index}` when names are unknown.
    pub fn feature_name(&self, index: usize) -> String {
        self.feature_names
            .as_ref()
            .and_then(|names| names.get(index).cloned())
            .unwrap_or_else(|| format!("f{index}"))
    }
}
