//! Binary label encoding.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::data::SchemaError;

/// Maps the two label values to `0.0` / `1.0` by sorted order.
///
/// For the loan table this maps `N` to 0 and `Y` to 1.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelEncoder {
    classes: [String; 2],
}

impl LabelEncoder {
    /// Learn the two classes from a label column.
    ///
    /// A missing cell, or anything other than exactly two distinct values,
    /// is a [`SchemaError`].
    pub fn fit(labels: &[Option<String>]) -> Result<Self, SchemaError> {
        let mut classes = BTreeSet::new();
        for (row, label) in labels.iter().enumerate() {
            let label = label.as_ref().ok_or(SchemaError::MissingLabel { row })?;
            classes.insert(label.clone());
        }
        let mut classes = classes.into_iter();
        match (classes.next(), classes.next(), classes.next()) {
            (Some(negative), Some(positive), None) => Ok(Self {
                classes: [negative, positive],
            }),
            (a, b, c) => Err(SchemaError::LabelClasses {
                found: a.into_iter().chain(b).chain(c).chain(classes).collect(),
            }),
        }
    }

    /// Build from an explicit `(negative, positive)` pair.
    pub fn from_classes(negative: impl Into<String>, positive: impl Into<String>) -> Self {
        Self {
            classes: [negative.into(), positive.into()],
        }
    }

    /// Class names, negative first.
    pub fn classes(&self) -> &[String; 2] {
        &self.classes
    }

    /// Name of the positive (approved) class.
    pub fn positive(&self) -> &str {
        &self.classes[1]
    }

    /// Encode one label.
    pub fn encode(&self, label: &str) -> Result<f32, SchemaError> {
        self.classes
            .iter()
            .position(|c| c == label)
            .map(|i| i as f32)
            .ok_or_else(|| SchemaError::UnknownLabel {
                value: label.to_string(),
            })
    }

    /// Encode a label column.
    pub fn transform(&self, labels: &[Option<String>]) -> Result<Vec<f32>, SchemaError> {
        labels
            .iter()
            .enumerate()
            .map(|(row, label)| {
                let label = label.as_deref().ok_or(SchemaError::MissingLabel { row })?;
                self.encode(label)
            })
            .collect()
    }

    /// Class name for an encoded label (`>= 0.5` is positive).
    pub fn decode(&self, encoded: f32) -> &str {
        if encoded >= 0.5 {
            &self.classes[1]
        } else {
            &self.classes[0]
        }
    }
}
