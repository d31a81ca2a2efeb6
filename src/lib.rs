//! loanboost: loan approval modelling with gradient boosted trees.
//!
//! A single training procedure turns a table of loan applications into a
//! fitted, self-contained pipeline:
//!
//! 1. [`data`] reads the CSV table into a typed [`Dataset`]
//! 2. [`preprocess`] imputes missing values and one-hot encodes categories
//! 3. [`training`] / [`model`] fit a gradient boosted tree classifier
//! 4. [`metrics`] evaluates it on a stratified held-out split
//! 5. [`io`] persists the pipeline and its explainer
//! 6. [`explainability`] attributes every prediction to encoded features
//!
//! # Key Types
//!
//! - [`LoanPipeline`] - Unfitted imputer + encoder + classifier
//! - [`FittedPipeline`] - Frozen preprocessing state and fitted model
//! - [`GBDTConfig`] - Booster configuration builder
//! - [`TreeExplainer`] / [`Explanation`] - Exact TreeSHAP attributions
//! - [`PipelineConfig`] - End-to-end run configuration
//!
//! # Training
//!
//! Use [`pipeline::run_training`] for the full procedure, or
//! [`LoanPipeline::fit`] to fit on a dataset you already hold.

// Re-export approx traits for users who want to compare attributions
pub use approx;

pub mod data;
pub mod error;
pub mod explainability;
pub mod io;
pub mod logging;
pub mod metrics;
pub mod model;
pub mod pipeline;
pub mod preprocess;
pub mod repr;
pub mod training;
pub mod utils;

// =============================================================================
// Convenience Re-exports
// =============================================================================

pub use error::{Error, Result};

// Data handling
pub use data::{DataError, Dataset, DatasetSchema, Record, SchemaError, Value};

// Preprocessing
pub use preprocess::{FittedPreprocessor, ImputationError, LabelEncoder, Preprocessor};

// Models
pub use model::{Classifier, FittedClassifier, GBDTClassifier, GBDTConfig, GBDTModel};

// Explanations
pub use explainability::{Explanation, LoanDecision, ShapValues, TreeExplainer};

// Pipeline
pub use pipeline::{FittedPipeline, LoanPipeline, PipelineConfig, TrainingReport};

// Shared utilities
pub use utils::Parallelism;
