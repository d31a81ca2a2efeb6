//! Median / mode imputation.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{FittedTransformer, PreprocessError, Transformer};
use crate::data::{Dataset, DatasetSchema, SchemaError};

/// A statistic could not be computed for a column.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ImputationError {
    /// Every cell of the column is missing.
    #[error("column `{column}` has no observed values to impute from")]
    EmptyColumn { column: String },
}

/// Fills missing numeric cells with the column median and missing
/// categorical cells with the column mode.
#[derive(Clone, Copy, Debug, Default)]
pub struct Imputer;

impl Imputer {
    pub fn new() -> Self {
        Self
    }
}

/// Frozen per-column fill values.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ImputationStats {
    /// `(column, median)` in schema order.
    pub numeric: Vec<(String, f64)>,
    /// `(column, mode)` in schema order.
    pub categorical: Vec<(String, String)>,
}

impl ImputationStats {
    /// Median of a numeric column.
    pub fn median(&self, column: &str) -> Option<f64> {
        self.numeric
            .iter()
            .find(|(c, _)| c == column)
            .map(|(_, v)| *v)
    }

    /// Mode of a categorical column.
    pub fn mode(&self, column: &str) -> Option<&str> {
        self.categorical
            .iter()
            .find(|(c, _)| c == column)
            .map(|(_, v)| v.as_str())
    }

    /// Check that there is one fill value per schema column, in order.
    pub fn validate(&self, schema: &DatasetSchema) -> Result<(), PreprocessError> {
        if !self.numeric.iter().map(|(c, _)| c).eq(schema.numeric.iter()) {
            return Err(PreprocessError::InvalidState(
                "medians do not cover the numeric columns".into(),
            ));
        }
        if !self.categorical.iter().map(|(c, _)| c).eq(schema.categorical.iter()) {
            return Err(PreprocessError::InvalidState(
                "modes do not cover the categorical columns".into(),
            ));
        }
        Ok(())
    }
}

/// Median of the observed values; mean of the middle pair for even counts.
pub(crate) fn median(values: &[Option<f64>]) -> Option<f64> {
    let mut observed: Vec<f64> = values.iter().flatten().copied().collect();
    if observed.is_empty() {
        return None;
    }
    observed.sort_by(f64::total_cmp);
    let n = observed.len();
    if n % 2 == 0 {
        Some((observed[n / 2 - 1] + observed[n / 2]) / 2.0)
    } else {
        Some(observed[n / 2])
    }
}

/// Most frequent observed value; ties go to the lexicographically smallest.
pub(crate) fn mode(values: &[Option<String>]) -> Option<String> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for v in values.iter().flatten() {
        *counts.entry(v.as_str()).or_default() += 1;
    }
    let mut best: Option<(&str, usize)> = None;
    // BTreeMap iterates in ascending key order, strict `>` keeps the first.
    for (value, count) in counts {
        match best {
            Some((_, c)) if count <= c => {}
            _ => best = Some((value, count)),
        }
    }
    best.map(|(v, _)| v.to_string())
}

impl Transformer for Imputer {
    type Fitted = ImputationStats;

    fn fit(&self, data: &Dataset) -> Result<ImputationStats, PreprocessError> {
        let schema = data.schema();

        let numeric = schema
            .numeric
            .iter()
            .map(|name| {
                let col = data
                    .numeric_column(name)
                    .ok_or_else(|| SchemaError::MissingColumn {
                        column: name.clone(),
                    })?;
                let value = median(col).ok_or_else(|| ImputationError::EmptyColumn {
                    column: name.clone(),
                })?;
                Ok((name.clone(), value))
            })
            .collect::<Result<Vec<_>, PreprocessError>>()?;

        let categorical = schema
            .categorical
            .iter()
            .map(|name| {
                let col = data
                    .categorical_column(name)
                    .ok_or_else(|| SchemaError::MissingColumn {
                        column: name.clone(),
                    })?;
                let value = mode(col).ok_or_else(|| ImputationError::EmptyColumn {
                    column: name.clone(),
                })?;
                Ok((name.clone(), value))
            })
            .collect::<Result<Vec<_>, PreprocessError>>()?;

        tracing::debug!(
            numeric = numeric.len(),
            categorical = categorical.len(),
            "fitted imputation statistics"
        );

        Ok(ImputationStats {
            numeric,
            categorical,
        })
    }
}

impl FittedTransformer for ImputationStats {
    type Output = Dataset;

    fn transform(&self, data: &Dataset) -> Result<Dataset, PreprocessError> {
        let mut out = data.clone();

        for (name, fill) in &self.numeric {
            let col = out
                .numeric_column_mut(name)
                .ok_or_else(|| SchemaError::MissingColumn {
                    column: name.clone(),
                })?;
            for cell in col.iter_mut().filter(|c| c.is_none()) {
                *cell = Some(*fill);
            }
        }

        for (name, fill) in &self.categorical {
            let col = out
                .categorical_column_mut(name)
                .ok_or_else(|| SchemaError::MissingColumn {
                    column: name.clone(),
                })?;
            for cell in col.iter_mut().filter(|c| c.is_none()) {
                *cell = Some(fill.clone());
            }
        }

        Ok(out)
    }
}
