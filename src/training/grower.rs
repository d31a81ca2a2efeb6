//! Depth-wise tree grower.
//!
//! Grows one regression tree on the current gradients: nodes are expanded
//! breadth-first until `max_depth` is reached or no split improves the
//! objective. Node covers are hessian sums.

use std::collections::VecDeque;

use ndarray::ArrayView2;

use crate::repr::{MutableTree, NodeId, Tree};
use crate::training::Gradients;
use crate::utils::Parallelism;

use super::split::{GainParams, GreedySplitter};

/// Parameters for tree growth.
#[derive(Clone, Debug)]
pub struct GrowerParams {
    /// Gain computation and constraint parameters.
    pub gain: GainParams,
    /// Shrinkage applied to leaf values.
    pub learning_rate: f64,
    /// Maximum depth, root at depth 0.
    pub max_depth: u32,
}

impl Default for GrowerParams {
    fn default() -> Self {
        Self {
            gain: GainParams::default(),
            learning_rate: 0.3,
            max_depth: 6,
        }
    }
}

struct Pending {
    node: NodeId,
    depth: u32,
    rows: Vec<u32>,
}

/// Grows a single decision tree from gradient and hessian vectors.
pub struct TreeGrower {
    params: GrowerParams,
    splitter: GreedySplitter,
    parallelism: Parallelism,
}

impl TreeGrower {
    pub fn new(params: GrowerParams, parallelism: Parallelism) -> Self {
        let splitter = GreedySplitter::new(params.gain.clone());
        Self {
            params,
            splitter,
            parallelism,
        }
    }

    pub fn params(&self) -> &GrowerParams {
        &self.params
    }

    /// Grow a tree on `rows`, considering only `features`.
    pub fn grow(
        &self,
        x: ArrayView2<'_, f32>,
        gradients: &Gradients,
        rows: Vec<u32>,
        features: &[u32],
    ) -> Tree {
        let gain = &self.params.gain;
        let mut tree = MutableTree::new();
        let (_, h_root) = gradients.sum(&rows);
        let root = tree.init_root(h_root);

        let mut queue = VecDeque::new();
        queue.push_back(Pending {
            node: root,
            depth: 0,
            rows,
        });

        while let Some(Pending { node, depth, rows }) = queue.pop_front() {
            let split = if depth < self.params.max_depth {
                self.splitter
                    .find_split(x, gradients, &rows, features, self.parallelism)
            } else {
                None
            };

            let Some(split) = split else {
                let (g, h) = gradients.sum(&rows);
                tree.make_leaf(node, gain.compute_leaf_weight(g, h));
                continue;
            };

            let col = x.column(split.feature as usize);
            let (left_rows, right_rows): (Vec<u32>, Vec<u32>) = rows.into_iter().partition(|&r| {
                let v = col[r as usize];
                if v.is_nan() { split.default_left } else { v < split.threshold }
            });

            let (left, right) = tree.apply_numeric_split(
                node,
                split.feature,
                split.threshold,
                split.default_left,
                split.gain,
                split.hess_left,
                split.hess_right,
            );
            queue.push_back(Pending {
                node: left,
                depth: depth + 1,
                rows: left_rows,
            });
            queue.push_back(Pending {
                node: right,
                depth: depth + 1,
                rows: right_rows,
            });
        }

        tree.apply_learning_rate(self.params.learning_rate);
        tree.freeze()
    }
}
