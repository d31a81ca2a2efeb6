//! A single loan application.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::{DatasetSchema, FeatureKind, SchemaError, is_missing_token};

/// One cell of a record.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Value {
    /// Numeric value.
    Number(f64),
    /// Categorical value.
    Category(String),
    /// Present but empty; imputed downstream.
    Missing,
}

impl Value {
    /// Returns true for [`Value::Missing`].
    #[inline]
    pub fn is_missing(&self) -> bool {
        matches!(self, Value::Missing)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(v) => write!(f, "{v}"),
            Value::Category(c) => f.write_str(c),
            Value::Missing => f.write_str("NaN"),
        }
    }
}

/// A named set of field values for one application.
///
/// A field that is absent is a schema violation; a field set to
/// [`Value::Missing`] is a missing cell and gets imputed.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Record {
    values: BTreeMap<String, Value>,
}

impl Record {
    /// Create an empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a numeric field.
    pub fn with_number(mut self, field: impl Into<String>, value: f64) -> Self {
        self.values.insert(field.into(), Value::Number(value));
        self
    }

    /// Set a categorical field.
    pub fn with_category(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.values
            .insert(field.into(), Value::Category(value.into()));
        self
    }

    /// Mark a field as present but missing.
    pub fn with_missing(mut self, field: impl Into<String>) -> Self {
        self.values.insert(field.into(), Value::Missing);
        self
    }

    /// Set a field to an arbitrary value.
    pub fn set(&mut self, field: impl Into<String>, value: Value) {
        self.values.insert(field.into(), value);
    }

    /// Look up a field.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.values.get(field)
    }

    /// Number of fields set.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true if no field is set.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterate fields in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Numeric value of a feature field, `None` when missing.
    pub(crate) fn numeric_field(&self, field: &str) -> Result<Option<f64>, SchemaError> {
        match self.values.get(field) {
            None => Err(SchemaError::MissingField {
                field: field.to_string(),
            }),
            Some(Value::Number(v)) if v.is_nan() => Ok(None),
            Some(Value::Number(v)) => Ok(Some(*v)),
            Some(Value::Missing) => Ok(None),
            Some(Value::Category(_)) => Err(SchemaError::WrongValueKind {
                field: field.to_string(),
                expected: "numeric",
            }),
        }
    }

    /// Categorical value of a feature field, `None` when missing.
    pub(crate) fn categorical_field(&self, field: &str) -> Result<Option<String>, SchemaError> {
        match self.values.get(field) {
            None => Err(SchemaError::MissingField {
                field: field.to_string(),
            }),
            Some(Value::Category(c)) => Ok(Some(c.clone())),
            Some(Value::Missing) => Ok(None),
            // Categories like `Dependents = 1` are often typed as numbers
            Some(Value::Number(v)) if v.is_nan() => Ok(None),
            Some(Value::Number(v)) => Ok(Some(v.to_string())),
        }
    }

    /// Parse `Field=value` pairs using the schema to type each field.
    ///
    /// Empty values and the usual missing tokens (`NA`, `NaN`, `null`) become
    /// [`Value::Missing`]. Fields outside the schema are rejected.
    pub fn parse_pairs<'a, I>(schema: &DatasetSchema, pairs: I) -> Result<Self, SchemaError>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut record = Record::new();
        for pair in pairs {
            let (field, raw) = pair.split_once('=').ok_or_else(|| SchemaError::MissingField {
                field: pair.to_string(),
            })?;
            let field = field.trim();
            let raw = raw.trim();
            let kind = schema
                .kind_of(field)
                .ok_or_else(|| SchemaError::MissingColumn {
                    column: field.to_string(),
                })?;
            let value = if is_missing_token(raw) {
                Value::Missing
            } else {
                match kind {
                    FeatureKind::Numeric => {
                        let v = raw.parse::<f64>().map_err(|_| SchemaError::InvalidNumber {
                            column: field.to_string(),
                            row: 0,
                            value: raw.to_string(),
                        })?;
                        Value::Number(v)
                    }
                    FeatureKind::Categorical => Value::Category(raw.to_string()),
                }
            };
            record.set(field, value);
        }
        Ok(record)
    }
}
