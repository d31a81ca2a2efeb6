//! Crate-level error type.
//!
//! Each layer has its own `thiserror` enum; [`Error`] wraps them so the
//! end-to-end entry points can propagate any of them with `?`.

use thiserror::Error;

use crate::data::{DataError, SchemaError};
use crate::explainability::ExplainError;
use crate::io::SerializationError;
use crate::metrics::MetricsError;
use crate::model::ConfigError;
use crate::pipeline::PipelineConfigError;
use crate::preprocess::PreprocessError;
use crate::training::TrainError;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Data(#[from] DataError),

    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    Preprocess(#[from] PreprocessError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    PipelineConfig(#[from] PipelineConfigError),

    #[error("training failed: {0}")]
    Train(#[from] TrainError),

    #[error("evaluation failed: {0}")]
    Metrics(#[from] MetricsError),

    #[error("explanation failed: {0}")]
    Explain(#[from] ExplainError),

    #[error(transparent)]
    Serialization(#[from] SerializationError),

    /// Encoded widths of two components disagree.
    #[error("model expects {expected} features, preprocessor produces {got}")]
    FeatureMismatch { expected: usize, got: usize },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
