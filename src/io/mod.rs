//! Artifact persistence.
//!
//! Two artifacts come out of a training run, each loadable on its own:
//!
//! - the fitted pipeline (imputation statistics, encoder vocabulary, label
//!   classes and forest), see [`FittedPipeline::save`](crate::FittedPipeline::save)
//! - the explainer (forest, feature names, base value), see [`save_explainer`]
//!
//! Both share the container format in [`native`].

mod artifact;
pub mod native;
pub mod payload;

pub use artifact::{load_explainer, read_artifact, save_explainer, write_artifact};
pub use native::{ArtifactKind, FormatHeader, SerializationError};
