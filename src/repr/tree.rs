//! Canonical tree representation (SoA) and mutable construction API.
//!
//! This module provides:
//! - [`Tree`]: Immutable SoA tree storage for traversal and explanation
//! - [`MutableTree`]: Builder for constructing trees during training
//!
//! Besides the split structure every node carries its cover (sum of
//! training hessians reaching it) and every split its gain. Covers drive
//! path-dependent TreeSHAP; gains drive split-gain importance.

// Allow many constructor arguments for creating trees with all their fields.
#![allow(clippy::too_many_arguments)]

use thiserror::Error;

use super::NodeId;

/// Deepest tree accepted by [`Tree::validate`].
///
/// Traversal for explanation recurses once per level.
pub const MAX_TREE_DEPTH: usize = 64;

// ============================================================================
// TreeValidationError
// ============================================================================

/// Structural validation errors for [`Tree`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TreeValidationError {
    /// Tree has no nodes.
    #[error("tree has no nodes")]
    EmptyTree,
    /// Node arrays have different lengths.
    #[error("`{field}` has {len} entries for {n_nodes} nodes")]
    LengthMismatch {
        field: &'static str,
        len: usize,
        n_nodes: usize,
    },
    /// A child pointer references an out-of-bounds node.
    #[error("node {node}: {side} child {child} out of bounds ({n_nodes} nodes)")]
    ChildOutOfBounds {
        node: NodeId,
        side: &'static str,
        child: NodeId,
        n_nodes: usize,
    },
    /// A node references itself as a child.
    #[error("node {node} references itself")]
    SelfLoop { node: NodeId },
    /// A node was reached by more than one path.
    #[error("node {node} reached twice")]
    DuplicateVisit { node: NodeId },
    /// A node exists in storage but is unreachable from the root.
    #[error("node {node} is unreachable")]
    UnreachableNode { node: NodeId },
    /// A split references a feature the forest does not have.
    #[error("node {node} splits on feature {feature}, model has {n_features}")]
    FeatureOutOfBounds {
        node: NodeId,
        feature: u32,
        n_features: usize,
    },
    /// A leaf lies deeper than [`MAX_TREE_DEPTH`].
    #[error("node {node} at depth {depth} exceeds the maximum depth {max}")]
    TooDeep { node: NodeId, depth: usize, max: usize },
    /// A value that must be finite is not.
    #[error("node {node}: {field} is not finite")]
    NonFinite { node: NodeId, field: &'static str },
}

// ============================================================================
// Tree
// ============================================================================

/// Structure-of-Arrays tree storage.
///
/// Child indices are local to this tree (0 = root). A row goes left when
/// `value < threshold`; a missing (`NaN`) value follows `default_left`.
#[derive(Debug, Clone, PartialEq)]
pub struct Tree {
    split_indices: Box<[u32]>,
    split_thresholds: Box<[f32]>,
    left_children: Box<[u32]>,
    right_children: Box<[u32]>,
    default_left: Box<[bool]>,
    is_leaf: Box<[bool]>,
    leaf_values: Box<[f64]>,
    gains: Box<[f64]>,
    covers: Box<[f64]>,
}

impl Tree {
    /// Create a tree from parallel arrays.
    ///
    /// Lengths are not checked here; call [`validate`](Self::validate) on
    /// trees that come from outside the trainer.
    pub fn new(
        split_indices: Vec<u32>,
        split_thresholds: Vec<f32>,
        left_children: Vec<u32>,
        right_children: Vec<u32>,
        default_left: Vec<bool>,
        is_leaf: Vec<bool>,
        leaf_values: Vec<f64>,
        gains: Vec<f64>,
        covers: Vec<f64>,
    ) -> Self {
        Self {
            split_indices: split_indices.into_boxed_slice(),
            split_thresholds: split_thresholds.into_boxed_slice(),
            left_children: left_children.into_boxed_slice(),
            right_children: right_children.into_boxed_slice(),
            default_left: default_left.into_boxed_slice(),
            is_leaf: is_leaf.into_boxed_slice(),
            leaf_values: leaf_values.into_boxed_slice(),
            gains: gains.into_boxed_slice(),
            covers: covers.into_boxed_slice(),
        }
    }

    /// A single-leaf tree.
    pub fn leaf(value: f64, cover: f64) -> Self {
        Self::new(
            vec![0],
            vec![0.0],
            vec![0],
            vec![0],
            vec![false],
            vec![true],
            vec![value],
            vec![0.0],
            vec![cover],
        )
    }

    /// Number of nodes in this tree.
    #[inline]
    pub fn n_nodes(&self) -> usize {
        self.is_leaf.len()
    }

    /// Number of leaves.
    pub fn n_leaves(&self) -> usize {
        self.is_leaf.iter().filter(|&&l| l).count()
    }

    /// Check if a node is a leaf.
    #[inline]
    pub fn is_leaf(&self, node: NodeId) -> bool {
        self.is_leaf[node as usize]
    }

    /// Split feature index for a node.
    #[inline]
    pub fn split_index(&self, node: NodeId) -> u32 {
        self.split_indices[node as usize]
    }

    /// Split threshold for a node.
    #[inline]
    pub fn split_threshold(&self, node: NodeId) -> f32 {
        self.split_thresholds[node as usize]
    }

    /// Left child index.
    #[inline]
    pub fn left_child(&self, node: NodeId) -> NodeId {
        self.left_children[node as usize]
    }

    /// Right child index.
    #[inline]
    pub fn right_child(&self, node: NodeId) -> NodeId {
        self.right_children[node as usize]
    }

    /// Default direction for missing values.
    #[inline]
    pub fn default_left(&self, node: NodeId) -> bool {
        self.default_left[node as usize]
    }

    /// Leaf value for a node.
    #[inline]
    pub fn leaf_value(&self, node: NodeId) -> f64 {
        self.leaf_values[node as usize]
    }

    /// Split gain for a node (0 for leaves).
    #[inline]
    pub fn gain(&self, node: NodeId) -> f64 {
        self.gains[node as usize]
    }

    /// Cover (hessian sum) of a node.
    #[inline]
    pub fn cover(&self, node: NodeId) -> f64 {
        self.covers[node as usize]
    }

    /// Child a feature value routes to.
    #[inline]
    pub fn next_node(&self, node: NodeId, fvalue: f32) -> NodeId {
        let go_left = if fvalue.is_nan() {
            self.default_left(node)
        } else {
            fvalue < self.split_threshold(node)
        };
        if go_left {
            self.left_child(node)
        } else {
            self.right_child(node)
        }
    }

    /// Leaf reached by a row.
    pub fn leaf_for_row(&self, features: &[f32]) -> NodeId {
        let mut idx: NodeId = 0;
        while !self.is_leaf(idx) {
            let feat_idx = self.split_index(idx) as usize;
            let fvalue = features.get(feat_idx).copied().unwrap_or(f32::NAN);
            idx = self.next_node(idx, fvalue);
        }
        idx
    }

    /// Leaf value reached by a row.
    #[inline]
    pub fn predict_row(&self, features: &[f32]) -> f64 {
        self.leaf_value(self.leaf_for_row(features))
    }

    /// Cover-weighted mean leaf value, i.e. the tree's expected output.
    ///
    /// Each split weights its children by `child cover / node cover`, the
    /// same weighting TreeSHAP uses for features off the explained path.
    pub fn expected_value(&self) -> f64 {
        // Post-order walk: a node's value is known once both children are.
        let mut values = vec![0.0f64; self.n_nodes()];
        let mut stack = vec![(0 as NodeId, false)];
        while let Some((node, children_done)) = stack.pop() {
            let idx = node as usize;
            if self.is_leaf(node) {
                values[idx] = self.leaf_value(node);
                continue;
            }
            let (l, r) = (self.left_child(node), self.right_child(node));
            if !children_done {
                stack.push((node, true));
                stack.push((r, false));
                stack.push((l, false));
                continue;
            }
            let (vl, vr) = (values[l as usize], values[r as usize]);
            let cover = self.cover(node);
            values[idx] = if cover <= 0.0 {
                0.5 * (vl + vr)
            } else {
                (self.cover(l) * vl + self.cover(r) * vr) / cover
            };
        }
        values[0]
    }

    /// Depth of the deepest leaf (a single leaf has depth 0).
    pub fn max_depth(&self) -> usize {
        let mut max = 0;
        let mut stack = vec![(0 as NodeId, 0usize)];
        while let Some((node, depth)) = stack.pop() {
            if self.is_leaf(node) {
                max = max.max(depth);
            } else {
                stack.push((self.left_child(node), depth + 1));
                stack.push((self.right_child(node), depth + 1));
            }
        }
        max
    }

    /// Validate structural invariants.
    ///
    /// Checks array lengths, child bounds, that every node is reached exactly
    /// once from the root within [`MAX_TREE_DEPTH`] levels, and that values
    /// and covers are finite.
    pub fn validate(&self) -> Result<(), TreeValidationError> {
        let n_nodes = self.n_nodes();
        if n_nodes == 0 {
            return Err(TreeValidationError::EmptyTree);
        }

        let lens = [
            ("split_indices", self.split_indices.len()),
            ("split_thresholds", self.split_thresholds.len()),
            ("left_children", self.left_children.len()),
            ("right_children", self.right_children.len()),
            ("default_left", self.default_left.len()),
            ("leaf_values", self.leaf_values.len()),
            ("gains", self.gains.len()),
            ("covers", self.covers.len()),
        ];
        for (field, len) in lens {
            if len != n_nodes {
                return Err(TreeValidationError::LengthMismatch {
                    field,
                    len,
                    n_nodes,
                });
            }
        }

        let mut visited = vec![false; n_nodes];
        let mut stack: Vec<(NodeId, usize)> = vec![(0, 0)];
        while let Some((node, depth)) = stack.pop() {
            let idx = node as usize;
            if visited[idx] {
                return Err(TreeValidationError::DuplicateVisit { node });
            }
            visited[idx] = true;
            if depth > MAX_TREE_DEPTH {
                return Err(TreeValidationError::TooDeep {
                    node,
                    depth,
                    max: MAX_TREE_DEPTH,
                });
            }

            if !self.covers[idx].is_finite() {
                return Err(TreeValidationError::NonFinite {
                    node,
                    field: "cover",
                });
            }

            if self.is_leaf(node) {
                if !self.leaf_values[idx].is_finite() {
                    return Err(TreeValidationError::NonFinite {
                        node,
                        field: "leaf value",
                    });
                }
                continue;
            }

            let left = self.left_child(node);
            let right = self.right_child(node);
            if left == node || right == node {
                return Err(TreeValidationError::SelfLoop { node });
            }
            for (side, child) in [("left", left), ("right", right)] {
                if child as usize >= n_nodes {
                    return Err(TreeValidationError::ChildOutOfBounds {
                        node,
                        side,
                        child,
                        n_nodes,
                    });
                }
            }
            stack.push((right, depth + 1));
            stack.push((left, depth + 1));
        }

        if let Some(node) = visited.iter().position(|v| !v) {
            return Err(TreeValidationError::UnreachableNode { node: node as u32 });
        }

        Ok(())
    }

    /// Check that split features index into `n_features` columns.
    pub fn validate_features(&self, n_features: usize) -> Result<(), TreeValidationError> {
        for node in 0..self.n_nodes() as NodeId {
            if self.is_leaf(node) {
                continue;
            }
            let feature = self.split_index(node);
            if feature as usize >= n_features {
                return Err(TreeValidationError::FeatureOutOfBounds {
                    node,
                    feature,
                    n_features,
                });
            }
        }
        Ok(())
    }

    // Raw array access for serialization.

    pub(crate) fn split_indices(&self) -> &[u32] {
        &self.split_indices
    }

    pub(crate) fn split_thresholds(&self) -> &[f32] {
        &self.split_thresholds
    }

    pub(crate) fn left_children(&self) -> &[u32] {
        &self.left_children
    }

    pub(crate) fn right_children(&self) -> &[u32] {
        &self.right_children
    }

    pub(crate) fn default_lefts(&self) -> &[bool] {
        &self.default_left
    }

    pub(crate) fn leaf_flags(&self) -> &[bool] {
        &self.is_leaf
    }

    pub(crate) fn leaf_values(&self) -> &[f64] {
        &self.leaf_values
    }

    pub(crate) fn gains(&self) -> &[f64] {
        &self.gains
    }

    pub(crate) fn covers(&self) -> &[f64] {
        &self.covers
    }
}

// =============================================================================
// MutableTree (training-time construction)
// =============================================================================

/// Mutable tree for use during training.
///
/// Nodes are allocated as placeholders and filled in once their split or
/// leaf value is known. Children are always allocated after their parent.
#[derive(Debug, Clone, Default)]
pub struct MutableTree {
    split_indices: Vec<u32>,
    split_thresholds: Vec<f32>,
    left_children: Vec<u32>,
    right_children: Vec<u32>,
    default_left: Vec<bool>,
    is_leaf: Vec<bool>,
    leaf_values: Vec<f64>,
    gains: Vec<f64>,
    covers: Vec<f64>,
}

impl MutableTree {
    /// Create a new mutable tree.
    pub fn new() -> Self {
        Self::default()
    }

    /// Initialize the root node as a placeholder with the given cover.
    ///
    /// Returns the root node ID (always 0).
    pub fn init_root(&mut self, cover: f64) -> NodeId {
        self.reset();
        self.allocate_node(cover)
    }

    /// Apply a numeric split to a node, allocating child nodes.
    ///
    /// Returns `(left_id, right_id)`.
    pub fn apply_numeric_split(
        &mut self,
        node: NodeId,
        feature: u32,
        threshold: f32,
        default_left: bool,
        gain: f64,
        left_cover: f64,
        right_cover: f64,
    ) -> (NodeId, NodeId) {
        let left_id = self.allocate_node(left_cover);
        let right_id = self.allocate_node(right_cover);

        let idx = node as usize;
        self.split_indices[idx] = feature;
        self.split_thresholds[idx] = threshold;
        self.left_children[idx] = left_id;
        self.right_children[idx] = right_id;
        self.default_left[idx] = default_left;
        self.is_leaf[idx] = false;
        self.gains[idx] = gain;

        (left_id, right_id)
    }

    /// Set a node as a leaf with the given value.
    pub fn make_leaf(&mut self, node: NodeId, value: f64) {
        let idx = node as usize;
        self.is_leaf[idx] = true;
        self.leaf_values[idx] = value;
        self.gains[idx] = 0.0;
    }

    /// Apply learning rate to all leaf values.
    pub fn apply_learning_rate(&mut self, learning_rate: f64) {
        for (is_leaf, value) in self.is_leaf.iter().zip(self.leaf_values.iter_mut()) {
            if *is_leaf {
                *value *= learning_rate;
            }
        }
    }

    /// Current number of allocated nodes.
    #[inline]
    pub fn n_nodes(&self) -> usize {
        self.split_indices.len()
    }

    /// Reset the tree for reuse.
    pub fn reset(&mut self) {
        self.split_indices.clear();
        self.split_thresholds.clear();
        self.left_children.clear();
        self.right_children.clear();
        self.default_left.clear();
        self.is_leaf.clear();
        self.leaf_values.clear();
        self.gains.clear();
        self.covers.clear();
    }

    /// Finalize the tree and return immutable storage.
    ///
    /// Internal covers are recomputed as the sum of their children so that
    /// child cover ratios at every split sum to exactly one.
    pub fn freeze(mut self) -> Tree {
        for idx in (0..self.n_nodes()).rev() {
            if !self.is_leaf[idx] {
                let l = self.left_children[idx] as usize;
                let r = self.right_children[idx] as usize;
                self.covers[idx] = self.covers[l] + self.covers[r];
            }
        }

        Tree::new(
            self.split_indices,
            self.split_thresholds,
            self.left_children,
            self.right_children,
            self.default_left,
            self.is_leaf,
            self.leaf_values,
            self.gains,
            self.covers,
        )
    }

    fn allocate_node(&mut self, cover: f64) -> NodeId {
        let id = self.split_indices.len() as NodeId;
        self.split_indices.push(0);
        self.split_thresholds.push(0.0);
        self.left_children.push(0);
        self.right_children.push(0);
        self.default_left.push(false);
        // Placeholders are leaves until split.
        self.is_leaf.push(true);
        self.leaf_values.push(0.0);
        self.gains.push(0.0);
        self.covers.push(cover);
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// `x0 < 0.5 ? (x1 < 2.0 ? 1 : 2) : 3`, missing x0 goes right.
    fn two_level_tree() -> Tree {
        let mut t = MutableTree::new();
        let root = t.init_root(10.0);
        let (l, r) = t.apply_numeric_split(root, 0, 0.5, false, 4.0, 6.0, 4.0);
        let (ll, lr) = t.apply_numeric_split(l, 1, 2.0, true, 1.5, 2.0, 4.0);
        t.make_leaf(ll, 1.0);
        t.make_leaf(lr, 2.0);
        t.make_leaf(r, 3.0);
        t.freeze()
    }

    #[test]
    fn predict_follows_thresholds() {
        let tree = two_level_tree();
        assert_eq!(tree.predict_row(&[0.1, 1.0]), 1.0);
        assert_eq!(tree.predict_row(&[0.1, 2.0]), 2.0);
        assert_eq!(tree.predict_row(&[0.5, 0.0]), 3.0);
    }

    #[test]
    fn missing_values_follow_default_direction() {
        let tree = two_level_tree();
        assert_eq!(tree.predict_row(&[f32::NAN, 0.0]), 3.0);
        assert_eq!(tree.predict_row(&[0.0, f32::NAN]), 1.0);
    }

    #[test]
    fn freeze_sums_child_covers() {
        let tree = two_level_tree();
        assert_eq!(tree.cover(0), 10.0);
        assert_eq!(tree.cover(1), 6.0);
        assert_eq!(tree.n_leaves(), 3);
        assert_eq!(tree.max_depth(), 2);
    }

    #[test]
    fn expected_value_is_cover_weighted() {
        let tree = two_level_tree();
        let expected = (1.0 * 2.0 + 2.0 * 4.0 + 3.0 * 4.0) / 10.0;
        assert!((tree.expected_value() - expected).abs() < 1e-12);
    }

    #[test]
    fn learning_rate_scales_leaves_only() {
        let mut t = MutableTree::new();
        let root = t.init_root(2.0);
        let (l, r) = t.apply_numeric_split(root, 0, 0.0, true, 1.0, 1.0, 1.0);
        t.make_leaf(l, 2.0);
        t.make_leaf(r, -4.0);
        t.apply_learning_rate(0.5);
        let tree = t.freeze();
        assert_eq!(tree.leaf_value(1), 1.0);
        assert_eq!(tree.leaf_value(2), -2.0);
        assert_eq!(tree.gain(0), 1.0);
    }

    #[test]
    fn validate_detects_bad_child() {
        let tree = Tree::new(
            vec![0, 0, 0],
            vec![0.5, 0.0, 0.0],
            vec![1, 0, 0],
            vec![7, 0, 0],
            vec![false; 3],
            vec![false, true, true],
            vec![0.0, 1.0, 2.0],
            vec![0.0; 3],
            vec![2.0, 1.0, 1.0],
        );
        assert!(matches!(
            tree.validate(),
            Err(TreeValidationError::ChildOutOfBounds { side: "right", .. })
        ));
        assert!(two_level_tree().validate().is_ok());
    }

    #[test]
    fn validate_features_bounds() {
        let tree = two_level_tree();
        assert!(tree.validate_features(2).is_ok());
        assert!(matches!(
            tree.validate_features(1),
            Err(TreeValidationError::FeatureOutOfBounds { feature: 1, .. })
        ));
    }

    /// A left-leaning chain with `depth` splits.
    fn chain(depth: usize) -> Tree {
        let mut t = MutableTree::new();
        let mut node = t.init_root(depth as f64 + 1.0);
        for level in 0..depth {
            let rest = (depth - level) as f64;
            let (l, r) = t.apply_numeric_split(node, 0, level as f32, true, 0.0, rest, 1.0);
            t.make_leaf(r, 1.0);
            node = l;
        }
        t.make_leaf(node, 0.0);
        t.freeze()
    }

    #[test]
    fn validate_bounds_depth() {
        let deepest = chain(MAX_TREE_DEPTH);
        assert!(deepest.validate().is_ok());
        assert_eq!(deepest.max_depth(), MAX_TREE_DEPTH);

        assert!(matches!(
            chain(MAX_TREE_DEPTH + 1).validate(),
            Err(TreeValidationError::TooDeep { depth, .. }) if depth == MAX_TREE_DEPTH + 1
        ));
    }

    #[test]
    fn expected_value_of_chain() {
        // Every right leaf has cover 1 and value 1, the final left leaf value 0.
        let tree = chain(3);
        assert!((tree.expected_value() - 0.75).abs() < 1e-12);
    }
}
