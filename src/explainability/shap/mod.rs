//! SHAP (SHapley Additive exPlanations) value computation.
//!
//! This module provides the exact TreeSHAP implementation for the
//! gradient-boosted forest.

mod path;
mod tree_explainer;
mod values;

pub use path::{PathElement, PathState};
pub use tree_explainer::TreeExplainer;
pub use values::ShapValues;
