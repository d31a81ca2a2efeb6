//! Canonical forest representation (collection of trees).

use ndarray::ArrayView2;
use thiserror::Error;

use super::{Tree, TreeValidationError};

/// Forest validation failure, tagged with the offending tree.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("tree {tree}: {source}")]
pub struct ForestValidationError {
    pub tree: usize,
    #[source]
    pub source: TreeValidationError,
}

/// Additive ensemble of regression trees in margin (log-odds) space.
///
/// `margin(x) = base_score + Σ tree(x)`.
#[derive(Debug, Clone, PartialEq)]
pub struct Forest {
    trees: Vec<Tree>,
    base_score: f64,
    n_features: usize,
}

impl Forest {
    /// Create an empty forest over `n_features` input columns.
    pub fn new(n_features: usize) -> Self {
        Self {
            trees: Vec::new(),
            base_score: 0.0,
            n_features,
        }
    }

    /// Set the base score.
    pub fn with_base_score(mut self, base_score: f64) -> Self {
        self.base_score = base_score;
        self
    }

    /// Add a tree to the forest.
    pub fn push_tree(&mut self, tree: Tree) {
        self.trees.push(tree);
    }

    /// Number of trees.
    #[inline]
    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    /// Number of input features.
    #[inline]
    pub fn n_features(&self) -> usize {
        self.n_features
    }

    /// Base score (margin before any tree).
    #[inline]
    pub fn base_score(&self) -> f64 {
        self.base_score
    }

    /// Get a reference to a specific tree.
    #[inline]
    pub fn tree(&self, idx: usize) -> &Tree {
        &self.trees[idx]
    }

    /// Iterate over trees.
    pub fn trees(&self) -> impl Iterator<Item = &Tree> {
        self.trees.iter()
    }

    /// Raw margin for a single row.
    pub fn predict_margin_row(&self, features: &[f32]) -> f64 {
        self.base_score + self.trees.iter().map(|t| t.predict_row(features)).sum::<f64>()
    }

    /// Raw margins for a sample-major batch.
    pub fn predict_margin(&self, features: ArrayView2<'_, f32>) -> Vec<f64> {
        features
            .rows()
            .into_iter()
            .map(|row| match row.as_slice() {
                Some(slice) => self.predict_margin_row(slice),
                None => self.predict_margin_row(&row.to_vec()),
            })
            .collect()
    }

    /// Expected margin: base score plus each tree's cover-weighted mean.
    pub fn expected_value(&self) -> f64 {
        self.base_score + self.trees.iter().map(Tree::expected_value).sum::<f64>()
    }

    /// Validate every tree and its feature references.
    pub fn validate(&self) -> Result<(), ForestValidationError> {
        for (i, tree) in self.trees.iter().enumerate() {
            tree.validate()
                .and_then(|()| tree.validate_features(self.n_features))
                .map_err(|source| ForestValidationError { tree: i, source })?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repr::MutableTree;
    use ndarray::array;

    fn stump(threshold: f32, left: f64, right: f64) -> Tree {
        let mut t = MutableTree::new();
        let root = t.init_root(2.0);
        let (l, r) = t.apply_numeric_split(root, 0, threshold, true, 1.0, 1.0, 1.0);
        t.make_leaf(l, left);
        t.make_leaf(r, right);
        t.freeze()
    }

    #[test]
    fn margin_sums_trees_and_base() {
        let mut forest = Forest::new(1).with_base_score(0.5);
        forest.push_tree(stump(0.5, 1.0, 2.0));
        forest.push_tree(stump(0.5, 0.5, 1.5));
        assert_eq!(forest.predict_margin_row(&[0.3]), 2.0);
        assert_eq!(forest.predict_margin_row(&[0.7]), 4.0);
    }

    #[test]
    fn batch_matches_rows() {
        let mut forest = Forest::new(1);
        forest.push_tree(stump(0.5, -1.0, 1.0));
        let x = array![[0.0f32], [1.0], [f32::NAN]];
        assert_eq!(forest.predict_margin(x.view()), vec![-1.0, 1.0, -1.0]);
    }

    #[test]
    fn expected_value_includes_base() {
        let mut forest = Forest::new(1).with_base_score(1.0);
        forest.push_tree(stump(0.5, -1.0, 3.0));
        assert_eq!(forest.expected_value(), 2.0);
    }

    #[test]
    fn validate_reports_tree_index() {
        let mut forest = Forest::new(0);
        forest.push_tree(Tree::leaf(0.0, 1.0));
        forest.push_tree(stump(0.5, 0.0, 1.0));
        let err = forest.validate().unwrap_err();
        assert_eq!(err.tree, 1);
    }
}
