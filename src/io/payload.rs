//! Serde payload types and conversions to and from the runtime model.
//!
//! Payload structs mirror runtime structs field by field. Conversions back
//! into runtime types re-validate, so a decoded payload never yields a
//! structurally broken tree.

use serde::{Deserialize, Serialize};

use crate::explainability::TreeExplainer;
use crate::model::{GBDTModel, ModelMeta};
use crate::preprocess::{FittedPreprocessor, LabelEncoder};
use crate::repr::{Forest, Tree};

use super::SerializationError;

// ============================================================================
// Forest
// ============================================================================

/// One tree as parallel arrays.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreePayload {
    pub split_indices: Vec<u32>,
    pub thresholds: Vec<f32>,
    pub left_children: Vec<u32>,
    pub right_children: Vec<u32>,
    pub default_left: Vec<bool>,
    pub is_leaf: Vec<bool>,
    pub leaf_values: Vec<f64>,
    pub gains: Vec<f64>,
    pub covers: Vec<f64>,
}

impl From<&Tree> for TreePayload {
    fn from(tree: &Tree) -> Self {
        Self {
            split_indices: tree.split_indices().to_vec(),
            thresholds: tree.split_thresholds().to_vec(),
            left_children: tree.left_children().to_vec(),
            right_children: tree.right_children().to_vec(),
            default_left: tree.default_lefts().to_vec(),
            is_leaf: tree.leaf_flags().to_vec(),
            leaf_values: tree.leaf_values().to_vec(),
            gains: tree.gains().to_vec(),
            covers: tree.covers().to_vec(),
        }
    }
}

impl From<TreePayload> for Tree {
    fn from(p: TreePayload) -> Self {
        Tree::new(
            p.split_indices,
            p.thresholds,
            p.left_children,
            p.right_children,
            p.default_left,
            p.is_leaf,
            p.leaf_values,
            p.gains,
            p.covers,
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForestPayload {
    pub n_features: u32,
    pub base_score: f64,
    pub trees: Vec<TreePayload>,
}

impl From<&Forest> for ForestPayload {
    fn from(forest: &Forest) -> Self {
        Self {
            n_features: forest.n_features() as u32,
            base_score: forest.base_score(),
            trees: forest.trees().map(TreePayload::from).collect(),
        }
    }
}

impl TryFrom<ForestPayload> for Forest {
    type Error = SerializationError;

    fn try_from(p: ForestPayload) -> Result<Self, Self::Error> {
        let mut forest = Forest::new(p.n_features as usize).with_base_score(p.base_score);
        for tree in p.trees {
            forest.push_tree(tree.into());
        }
        forest
            .validate()
            .map_err(|e| SerializationError::Corrupt(e.to_string()))?;
        Ok(forest)
    }
}

// ============================================================================
// Pipeline
// ============================================================================

/// Everything needed to score a raw record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelinePayload {
    pub preprocessor: FittedPreprocessor,
    pub labels: LabelEncoder,
    pub meta: ModelMeta,
    pub forest: ForestPayload,
}

impl PipelinePayload {
    pub fn new(preprocessor: &FittedPreprocessor, labels: &LabelEncoder, model: &GBDTModel) -> Self {
        let mut meta = model.meta().clone();
        meta.feature_names = Some(preprocessor.feature_names());
        Self {
            preprocessor: preprocessor.clone(),
            labels: labels.clone(),
            meta,
            forest: model.forest().into(),
        }
    }

    /// Rebuild the runtime parts, checking that each is consistent and that
    /// they agree on the feature count.
    pub fn into_parts(self) -> Result<(FittedPreprocessor, LabelEncoder, GBDTModel), SerializationError> {
        self.preprocessor
            .validate()
            .map_err(|e| SerializationError::Corrupt(e.to_string()))?;
        let forest = Forest::try_from(self.forest)?;
        let n_out = self.preprocessor.n_features_out();
        if forest.n_features() != n_out {
            return Err(SerializationError::Corrupt(format!(
                "forest expects {} features, preprocessor produces {n_out}",
                forest.n_features()
            )));
        }
        Ok((self.preprocessor, self.labels, GBDTModel::from_parts(forest, self.meta)))
    }
}

// ============================================================================
// Explainer
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExplainerPayload {
    pub feature_names: Vec<String>,
    pub base_value: f64,
    pub forest: ForestPayload,
}

impl From<&TreeExplainer> for ExplainerPayload {
    fn from(explainer: &TreeExplainer) -> Self {
        Self {
            feature_names: explainer.feature_names().to_vec(),
            base_value: explainer.base_value(),
            forest: explainer.forest().into(),
        }
    }
}

impl TryFrom<ExplainerPayload> for TreeExplainer {
    type Error = SerializationError;

    fn try_from(p: ExplainerPayload) -> Result<Self, Self::Error> {
        let forest = Forest::try_from(p.forest)?;
        let explainer = TreeExplainer::new(forest, p.feature_names)
            .map_err(|e| SerializationError::Corrupt(e.to_string()))?;
        let drift = (explainer.base_value() - p.base_value).abs();
        if drift > 1e-9 * p.base_value.abs().max(1.0) {
            return Err(SerializationError::Corrupt(format!(
                "stored base value {} disagrees with forest ({})",
                p.base_value,
                explainer.base_value()
            )));
        }
        Ok(explainer)
    }
}
