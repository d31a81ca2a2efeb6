//! TreeSHAP explainer for tree ensembles.
//!
//! Implements the path-dependent TreeSHAP algorithm from Lundberg et al.
//! (2020), "From local explanations to global understanding with
//! explainable AI for trees". Contributions are in margin (log-odds) space
//! and satisfy `base_value + Σφ = margin` for every row.

use ndarray::ArrayView2;

use crate::data::Record;
use crate::explainability::{ExplainError, Explanation};
use crate::preprocess::FittedPreprocessor;
use crate::repr::{Forest, NodeId, Tree};
use crate::utils::Parallelism;

use super::{PathState, ShapValues};

/// Exact SHAP values for a fitted forest, computed from node covers.
#[derive(Debug, Clone, PartialEq)]
pub struct TreeExplainer {
    forest: Forest,
    feature_names: Vec<String>,
    base_value: f64,
}

impl TreeExplainer {
    /// Create an explainer over `forest`.
    ///
    /// # Errors
    ///
    /// - the forest fails structural validation
    /// - a node has a non-positive or non-finite cover
    /// - `feature_names` does not have one name per forest feature
    pub fn new(forest: Forest, feature_names: Vec<String>) -> Result<Self, ExplainError> {
        forest.validate()?;
        if feature_names.len() != forest.n_features() {
            return Err(ExplainError::FeatureNames {
                expected: forest.n_features(),
                got: feature_names.len(),
            });
        }
        for (tree_idx, tree) in forest.trees().enumerate() {
            for node in 0..tree.n_nodes() as NodeId {
                let cover = tree.cover(node);
                if !(cover.is_finite() && cover > 0.0) {
                    return Err(ExplainError::InvalidCover {
                        tree: tree_idx,
                        node,
                        cover,
                    });
                }
            }
        }

        let base_value = forest.expected_value();
        Ok(Self {
            forest,
            feature_names,
            base_value,
        })
    }

    pub fn forest(&self) -> &Forest {
        &self.forest
    }

    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    /// Expected margin over the training distribution.
    pub fn base_value(&self) -> f64 {
        self.base_value
    }

    pub fn n_features(&self) -> usize {
        self.feature_names.len()
    }

    fn check_width(&self, got: usize) -> Result<(), ExplainError> {
        if got != self.n_features() {
            return Err(ExplainError::FeatureMismatch {
                expected: self.n_features(),
                got,
            });
        }
        Ok(())
    }

    /// SHAP values for one encoded row.
    pub fn contributions(&self, row: &[f32]) -> Result<Vec<f64>, ExplainError> {
        self.check_width(row.len())?;
        Ok(self.row_contributions(row))
    }

    fn row_contributions(&self, row: &[f32]) -> Vec<f64> {
        let mut phi = vec![0.0; self.n_features()];
        let root_path = PathState::default();
        for tree in self.forest.trees() {
            tree_shap(tree, row, &mut phi, 0, &root_path, 1.0, 1.0, None);
        }
        phi
    }

    /// SHAP values for a sample-major batch.
    pub fn shap_values(
        &self,
        features: ArrayView2<'_, f32>,
        parallelism: Parallelism,
    ) -> Result<ShapValues, ExplainError> {
        let (n_samples, n_features) = features.dim();
        self.check_width(n_features)?;

        let rows = parallelism.maybe_par_map(0..n_samples, |i| {
            let row = features.row(i);
            match row.as_slice() {
                Some(slice) => self.row_contributions(slice),
                None => self.row_contributions(&row.to_vec()),
            }
        });

        let mut shap = ShapValues::zeros(n_samples, n_features);
        for (i, phi) in rows.into_iter().enumerate() {
            shap.sample_mut(i).copy_from_slice(&phi);
            shap.set_base_value(i, self.base_value);
        }
        Ok(shap)
    }

    /// Explanation for one encoded row.
    pub fn explain_row(&self, row: &[f32]) -> Result<Explanation, ExplainError> {
        let values = self.contributions(row)?;
        Ok(Explanation::new(self.feature_names.clone(), values, self.base_value))
    }

    /// Explanations for a sample-major batch.
    pub fn explain_batch(
        &self,
        features: ArrayView2<'_, f32>,
        parallelism: Parallelism,
    ) -> Result<Vec<Explanation>, ExplainError> {
        let shap = self.shap_values(features, parallelism)?;
        Ok((0..shap.n_samples())
            .map(|i| Explanation::new(self.feature_names.clone(), shap.sample(i).to_vec(), self.base_value))
            .collect())
    }

    /// Explain one raw record using the frozen preprocessing state.
    pub fn explain_record(
        &self,
        preprocessor: &FittedPreprocessor,
        record: &Record,
    ) -> Result<Explanation, ExplainError> {
        let encoded = preprocessor.transform_records(std::slice::from_ref(record))?;
        let row = encoded.matrix.row(0);
        match row.as_slice() {
            Some(slice) => self.explain_row(slice),
            None => self.explain_row(&row.to_vec()),
        }
    }
}

/// Recursive TreeSHAP over one tree.
///
/// `zero_fraction`/`one_fraction` describe the edge into `node`, taken by
/// splitting on `feature` in the parent.
#[allow(clippy::too_many_arguments)]
fn tree_shap(
    tree: &Tree,
    row: &[f32],
    phi: &mut [f64],
    node: NodeId,
    parent_path: &PathState,
    zero_fraction: f64,
    one_fraction: f64,
    feature: Option<usize>,
) {
    let mut path = parent_path.clone();
    path.extend(zero_fraction, one_fraction, feature);

    if tree.is_leaf(node) {
        let leaf_value = tree.leaf_value(node);
        for i in 1..path.len() {
            let e = *path.element(i);
            if let Some(f) = e.feature {
                phi[f] += path.unwound_sum(i) * (e.one_fraction - e.zero_fraction) * leaf_value;
            }
        }
        return;
    }

    let split = tree.split_index(node) as usize;
    let hot = tree.next_node(node, row[split]);
    let cold = if hot == tree.left_child(node) {
        tree.right_child(node)
    } else {
        tree.left_child(node)
    };
    let cover = tree.cover(node);
    let hot_zero = tree.cover(hot) / cover;
    let cold_zero = tree.cover(cold) / cover;

    // A feature already on the path is undone and re-applied with the
    // combined fractions.
    let (mut incoming_zero, mut incoming_one) = (1.0, 1.0);
    if let Some(k) = path.position(split) {
        let e = *path.element(k);
        incoming_zero = e.zero_fraction;
        incoming_one = e.one_fraction;
        path.unwind(k);
    }

    tree_shap(
        tree,
        row,
        phi,
        hot,
        &path,
        hot_zero * incoming_zero,
        incoming_one,
        Some(split),
    );
    tree_shap(
        tree,
        row,
        phi,
        cold,
        &path,
        cold_zero * incoming_zero,
        0.0,
        Some(split),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repr::MutableTree;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    fn names(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("f{i}")).collect()
    }

    /// `x0 < 0.5 ? (x1 < 0.5 ? 1 : 2) : 4`, covers 2/1/1/2.
    fn tree_a() -> Tree {
        let mut t = MutableTree::new();
        let root = t.init_root(4.0);
        let (l, r) = t.apply_numeric_split(root, 0, 0.5, true, 1.0, 2.0, 2.0);
        let (ll, lr) = t.apply_numeric_split(l, 1, 0.5, true, 1.0, 1.0, 1.0);
        t.make_leaf(ll, 1.0);
        t.make_leaf(lr, 2.0);
        t.make_leaf(r, 4.0);
        t.freeze()
    }

    /// Splits on x0 twice along one path.
    fn tree_repeat() -> Tree {
        let mut t = MutableTree::new();
        let root = t.init_root(6.0);
        let (l, r) = t.apply_numeric_split(root, 0, 2.0, false, 1.0, 4.0, 2.0);
        let (ll, lr) = t.apply_numeric_split(l, 0, 1.0, true, 1.0, 1.0, 3.0);
        t.make_leaf(ll, -1.0);
        t.make_leaf(lr, 0.5);
        t.make_leaf(r, 3.0);
        t.freeze()
    }

    #[test]
    fn single_split_attribution() {
        let mut t = MutableTree::new();
        let root = t.init_root(4.0);
        let (l, r) = t.apply_numeric_split(root, 0, 0.5, true, 1.0, 1.0, 3.0);
        t.make_leaf(l, -2.0);
        t.make_leaf(r, 2.0);
        let mut forest = Forest::new(1);
        forest.push_tree(t.freeze());

        let explainer = TreeExplainer::new(forest, names(1)).unwrap();
        // E = (1*-2 + 3*2) / 4 = 1
        assert_abs_diff_eq!(explainer.base_value(), 1.0);
        let phi = explainer.contributions(&[0.0]).unwrap();
        assert_abs_diff_eq!(phi[0], -3.0, epsilon = 1e-12);
    }

    #[test]
    fn interaction_is_split_symmetrically() {
        let mut forest = Forest::new(2);
        forest.push_tree(tree_a());
        let explainer = TreeExplainer::new(forest, names(2)).unwrap();

        // f(0,1) = 2, E = 2.75. Brute-force Shapley:
        // v{} = 2.75, v{0} = 1.5, v{1} = 3.0 (x1 only matters left), v{0,1} = 2.
        // φ0 = ½[(1.5-2.75) + (2-3.0)] = -1.125, φ1 = ½[(3.0-2.75) + (2-1.5)] = 0.375
        let phi = explainer.contributions(&[0.0, 1.0]).unwrap();
        assert_abs_diff_eq!(phi[0], -1.125, epsilon = 1e-12);
        assert_abs_diff_eq!(phi[1], 0.375, epsilon = 1e-12);
    }

    #[test]
    fn additivity_holds_with_repeated_features_and_missing() {
        let mut forest = Forest::new(2).with_base_score(-0.3);
        forest.push_tree(tree_a());
        forest.push_tree(tree_repeat());
        let explainer = TreeExplainer::new(forest.clone(), names(2)).unwrap();

        let x = array![
            [0.0f32, 0.0],
            [0.7, 1.0],
            [1.5, 0.2],
            [3.0, f32::NAN],
            [f32::NAN, 0.9],
        ];
        let shap = explainer.shap_values(x.view(), Parallelism::Sequential).unwrap();
        let margins = forest.predict_margin(x.view());
        assert!(shap.verify(&margins, 1e-9));

        let par = explainer.shap_values(x.view(), Parallelism::Parallel).unwrap();
        assert_eq!(shap, par);
    }

    #[test]
    fn batch_explanations_match_rows() {
        let mut forest = Forest::new(2).with_base_score(0.2);
        forest.push_tree(tree_a());
        forest.push_tree(tree_repeat());
        let explainer = TreeExplainer::new(forest.clone(), names(2)).unwrap();

        let x = array![[0.0f32, 1.0], [1.5, f32::NAN], [2.5, 0.1]];
        let margins = forest.predict_margin(x.view());
        let batch = explainer.explain_batch(x.view(), Parallelism::Parallel).unwrap();
        assert_eq!(batch.len(), 3);
        for (i, explanation) in batch.iter().enumerate() {
            let row = x.row(i).to_vec();
            assert_eq!(*explanation, explainer.explain_row(&row).unwrap());
            assert_abs_diff_eq!(explanation.margin(), margins[i], epsilon = 1e-9);
        }

        let narrow = array![[0.0f32], [1.0]];
        assert!(matches!(
            explainer.explain_batch(narrow.view(), Parallelism::Sequential),
            Err(ExplainError::FeatureMismatch { expected: 2, got: 1 })
        ));
    }

    #[test]
    fn unused_feature_gets_zero() {
        let mut forest = Forest::new(3);
        forest.push_tree(tree_a());
        let explainer = TreeExplainer::new(forest, names(3)).unwrap();
        let phi = explainer.contributions(&[0.2, 0.8, 100.0]).unwrap();
        assert_eq!(phi[2], 0.0);
    }

    #[test]
    fn rejects_zero_cover() {
        let mut t = MutableTree::new();
        let root = t.init_root(1.0);
        let (l, r) = t.apply_numeric_split(root, 0, 0.5, true, 1.0, 0.0, 1.0);
        t.make_leaf(l, 1.0);
        t.make_leaf(r, 2.0);
        let mut forest = Forest::new(1);
        forest.push_tree(t.freeze());
        assert!(matches!(
            TreeExplainer::new(forest, names(1)),
            Err(ExplainError::InvalidCover { tree: 0, node: 1, .. })
        ));
    }

    #[test]
    fn rejects_width_mismatch() {
        let mut forest = Forest::new(2);
        forest.push_tree(tree_a());
        assert!(matches!(
            TreeExplainer::new(forest.clone(), names(3)),
            Err(ExplainError::FeatureNames { expected: 2, got: 3 })
        ));
        let explainer = TreeExplainer::new(forest, names(2)).unwrap();
        assert!(matches!(
            explainer.contributions(&[1.0]),
            Err(ExplainError::FeatureMismatch { expected: 2, got: 1 })
        ));
    }
}
