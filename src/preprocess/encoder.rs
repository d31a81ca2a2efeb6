//! One-hot encoding with a dropped reference level.
//!
//! Numeric columns pass through unchanged and come first. Each categorical
//! column with `k` fit-time categories expands into `k - 1` indicator
//! columns; the first category (in sorted order) is the reference level and
//! encodes as all zeros. Categories never seen at fit time also encode as all
//! zeros and are reported as [`UnseenCategory`].

use std::collections::BTreeSet;

use ndarray::Array2;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{FittedTransformer, PreprocessError, Transformer};
use crate::data::{Dataset, DatasetSchema, SchemaError};

/// One-hot encoder configuration.
#[derive(Clone, Copy, Debug, Default)]
pub struct OneHotEncoder;

impl OneHotEncoder {
    pub fn new() -> Self {
        Self
    }
}

/// A categorical value that was not in the fit-time vocabulary.
///
/// Non-fatal: the value encodes as the all-zero indicator block.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unseen category `{value}` in column `{column}` (row {row})")]
pub struct UnseenCategory {
    pub column: String,
    pub value: String,
    pub row: usize,
}

/// Frozen encoder vocabulary.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FittedEncoder {
    numeric: Vec<String>,
    /// `(column, sorted categories)`; index 0 is the reference level.
    categorical: Vec<(String, Vec<String>)>,
}

/// Where an encoded column comes from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FeatureOrigin {
    /// Source column.
    pub column: String,
    /// Indicated category, `None` for numeric pass-through.
    pub category: Option<String>,
}

/// Encoded feature matrix.
#[derive(Clone, Debug)]
pub struct EncodedFeatures {
    /// Sample-major `[n_rows, n_features]` matrix.
    pub matrix: Array2<f32>,
    /// Column names, aligned with the matrix columns.
    pub feature_names: Vec<String>,
    /// Unseen categories met while encoding.
    pub unseen: Vec<UnseenCategory>,
}

impl EncodedFeatures {
    #[inline]
    pub fn n_rows(&self) -> usize {
        self.matrix.nrows()
    }

    #[inline]
    pub fn n_features(&self) -> usize {
        self.matrix.ncols()
    }
}

impl FittedEncoder {
    /// Check the vocabulary against a feature schema.
    ///
    /// Columns must match the schema in order and every category list must be
    /// strictly ascending, since encoding looks values up by binary search.
    pub fn validate(&self, schema: &DatasetSchema) -> Result<(), PreprocessError> {
        if self.numeric != schema.numeric {
            return Err(PreprocessError::InvalidState(
                "encoder numeric columns differ from the schema".into(),
            ));
        }
        let columns: Vec<&String> = self.categorical.iter().map(|(c, _)| c).collect();
        if !columns.iter().copied().eq(schema.categorical.iter()) {
            return Err(PreprocessError::InvalidState(
                "encoder categorical columns differ from the schema".into(),
            ));
        }
        for (column, cats) in &self.categorical {
            if cats.windows(2).any(|w| w[0] >= w[1]) {
                return Err(PreprocessError::InvalidState(format!(
                    "categories of `{column}` are not sorted and unique"
                )));
            }
        }
        Ok(())
    }

    /// Sorted fit-time categories of a column.
    pub fn categories(&self, column: &str) -> Option<&[String]> {
        self.categorical
            .iter()
            .find(|(c, _)| c == column)
            .map(|(_, cats)| cats.as_slice())
    }

    /// Number of encoded output columns.
    pub fn n_features_out(&self) -> usize {
        self.numeric.len()
            + self
                .categorical
                .iter()
                .map(|(_, cats)| cats.len().saturating_sub(1))
                .sum::<usize>()
    }

    /// Encoded column names: `num__<col>` then `cat__<col>_<category>`.
    pub fn feature_names(&self) -> Vec<String> {
        self.origins()
            .into_iter()
            .map(|o| match o.category {
                None => format!("num__{}", o.column),
                Some(cat) => format!("cat__{}_{}", o.column, cat),
            })
            .collect()
    }

    /// Source column (and category) of every encoded column.
    pub fn origins(&self) -> Vec<FeatureOrigin> {
        let mut out = Vec::with_capacity(self.n_features_out());
        out.extend(self.numeric.iter().map(|c| FeatureOrigin {
            column: c.clone(),
            category: None,
        }));
        for (col, cats) in &self.categorical {
            out.extend(cats.iter().skip(1).map(|cat| FeatureOrigin {
                column: col.clone(),
                category: Some(cat.clone()),
            }));
        }
        out
    }
}

impl Transformer for OneHotEncoder {
    type Fitted = FittedEncoder;

    fn fit(&self, data: &Dataset) -> Result<FittedEncoder, PreprocessError> {
        let schema = data.schema();
        let categorical = schema
            .categorical
            .iter()
            .map(|name| {
                let col = data
                    .categorical_column(name)
                    .ok_or_else(|| SchemaError::MissingColumn {
                        column: name.clone(),
                    })?;
                let cats: BTreeSet<String> = col.iter().flatten().cloned().collect();
                Ok((name.clone(), cats.into_iter().collect()))
            })
            .collect::<Result<Vec<_>, PreprocessError>>()?;

        let fitted = FittedEncoder {
            numeric: schema.numeric.clone(),
            categorical,
        };
        tracing::debug!(features_out = fitted.n_features_out(), "fitted one-hot encoder");
        Ok(fitted)
    }
}

impl FittedTransformer for FittedEncoder {
    type Output = EncodedFeatures;

    fn transform(&self, data: &Dataset) -> Result<EncodedFeatures, PreprocessError> {
        let n_rows = data.n_rows();
        let mut matrix = Array2::<f32>::zeros((n_rows, self.n_features_out()));
        let mut unseen = Vec::new();
        let mut offset = 0usize;

        for name in &self.numeric {
            let col = data
                .numeric_column(name)
                .ok_or_else(|| SchemaError::MissingColumn {
                    column: name.clone(),
                })?;
            for (row, value) in col.iter().enumerate() {
                matrix[[row, offset]] = value.map_or(f32::NAN, |v| v as f32);
            }
            offset += 1;
        }

        for (name, cats) in &self.categorical {
            let col = data
                .categorical_column(name)
                .ok_or_else(|| SchemaError::MissingColumn {
                    column: name.clone(),
                })?;
            for (row, value) in col.iter().enumerate() {
                let Some(value) = value else { continue };
                match cats.binary_search(value) {
                    Ok(0) => {}
                    Ok(k) => matrix[[row, offset + k - 1]] = 1.0,
                    Err(_) => {
                        tracing::warn!(
                            column = %name,
                            value = %value,
                            row,
                            "unseen category encoded as all zeros"
                        );
                        unseen.push(UnseenCategory {
                            column: name.clone(),
                            value: value.clone(),
                            row,
                        });
                    }
                }
            }
            offset += cats.len().saturating_sub(1);
        }

        Ok(EncodedFeatures {
            matrix,
            feature_names: self.feature_names(),
            unseen,
        })
    }
}
