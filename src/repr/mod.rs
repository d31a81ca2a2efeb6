//! Trained model representation.
//!
//! - [`Tree`]: SoA decision tree with per-node covers and split gains
//! - [`MutableTree`]: training-time builder that freezes into a [`Tree`]
//! - [`Forest`]: additive ensemble of trees plus a base score

mod forest;
mod tree;

pub use forest::{Forest, ForestValidationError};
pub use tree::{MAX_TREE_DEPTH, MutableTree, Tree, TreeValidationError};

/// Index of a node within a single tree (0 = root).
pub type NodeId = u32;
