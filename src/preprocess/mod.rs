//! Preprocessing: imputation and categorical encoding.
//!
//! Every step follows the same two-phase shape:
//!
//! - a [`Transformer`] holds configuration and learns state from a table;
//! - its [`FittedTransformer`] holds the frozen state and applies it.
//!
//! Fitted state is plain data (`serde`-serializable), so the exact same
//! statistics run at training and at inference time.

mod encoder;
mod imputer;
mod label;
mod preprocessor;

pub use encoder::{EncodedFeatures, FeatureOrigin, FittedEncoder, OneHotEncoder, UnseenCategory};
pub use imputer::{ImputationError, ImputationStats, Imputer};
pub use label::LabelEncoder;
pub use preprocessor::{FittedPreprocessor, Preprocessor};

use thiserror::Error;

use crate::data::{Dataset, SchemaError};

/// A preprocessing step that learns state from a table.
pub trait Transformer {
    /// The frozen, fitted form of this step.
    type Fitted: FittedTransformer;

    /// Learn state from the table.
    fn fit(&self, data: &Dataset) -> Result<Self::Fitted, PreprocessError>;

    /// Fit, then transform the same table.
    fn fit_transform(
        &self,
        data: &Dataset,
    ) -> Result<(Self::Fitted, <Self::Fitted as FittedTransformer>::Output), PreprocessError> {
        let fitted = self.fit(data)?;
        let out = fitted.transform(data)?;
        Ok((fitted, out))
    }
}

/// A fitted preprocessing step.
pub trait FittedTransformer {
    /// Result of transforming a table.
    type Output;

    /// Apply the frozen state to a table.
    fn transform(&self, data: &Dataset) -> Result<Self::Output, PreprocessError>;
}

/// Errors raised while fitting or applying preprocessing.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum PreprocessError {
    /// The table does not carry the columns the step was fit on.
    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// A statistic could not be computed.
    #[error(transparent)]
    Imputation(#[from] ImputationError),

    /// Fitted state does not agree with itself or with its schema.
    #[error("inconsistent preprocessing state: {0}")]
    InvalidState(String),

    /// A cell is still missing where a value is required.
    #[error("column `{column}` still has missing values at row {row}")]
    UnexpectedMissing { column: String, row: usize },
}
