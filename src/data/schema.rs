//! Column roles for loan tables.
//!
//! A [`DatasetSchema`] names which columns are numeric features, which are
//! categorical features, and which (optional) columns carry the label and the
//! row identifier. The identifier never reaches the model.

use serde::{Deserialize, Serialize};

use super::SchemaError;

/// Logical type of a feature column.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureKind {
    /// Continuous value, missing cells are imputed with the median.
    Numeric,
    /// Free-form category, missing cells are imputed with the mode.
    Categorical,
}

impl FeatureKind {
    /// Returns true if this is a categorical feature.
    #[inline]
    pub fn is_categorical(self) -> bool {
        matches!(self, FeatureKind::Categorical)
    }

    /// Returns true if this is a numeric feature.
    #[inline]
    pub fn is_numeric(self) -> bool {
        matches!(self, FeatureKind::Numeric)
    }
}

/// Schema describing the columns of a loan table.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetSchema {
    /// Numeric feature columns, in feature order.
    pub numeric: Vec<String>,
    /// Categorical feature columns, in feature order.
    pub categorical: Vec<String>,
    /// Binary outcome column. Absent at inference time.
    #[serde(default)]
    pub label: Option<String>,
    /// Row identifier, carried along but excluded from modelling.
    #[serde(default)]
    pub id: Option<String>,
}

impl Default for DatasetSchema {
    fn default() -> Self {
        Self::loans()
    }
}

impl DatasetSchema {
    /// Create a schema from explicit column lists.
    pub fn new(numeric: Vec<String>, categorical: Vec<String>) -> Self {
        Self {
            numeric,
            categorical,
            label: None,
            id: None,
        }
    }

    /// The standard loan application table.
    pub fn loans() -> Self {
        let numeric = [
            "ApplicantIncome",
            "CoapplicantIncome",
            "LoanAmount",
            "Loan_Amount_Term",
            "Credit_History",
        ];
        let categorical = [
            "Gender",
            "Married",
            "Dependents",
            "Education",
            "Self_Employed",
            "Property_Area",
        ];
        Self {
            numeric: numeric.iter().map(|s| s.to_string()).collect(),
            categorical: categorical.iter().map(|s| s.to_string()).collect(),
            label: Some("Loan_Status".to_string()),
            id: Some("Loan_ID".to_string()),
        }
    }

    /// Set the label column.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Set the identifier column.
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// The same feature columns without label or identifier.
    ///
    /// This is the shape of a record presented for inference.
    pub fn features_only(&self) -> Self {
        Self {
            numeric: self.numeric.clone(),
            categorical: self.categorical.clone(),
            label: None,
            id: None,
        }
    }

    /// Number of feature columns (numeric + categorical).
    #[inline]
    pub fn n_features(&self) -> usize {
        self.numeric.len() + self.categorical.len()
    }

    /// Iterate feature columns with their kind: numeric first, then categorical.
    pub fn features(&self) -> impl Iterator<Item = (&str, FeatureKind)> {
        self.numeric
            .iter()
            .map(|c| (c.as_str(), FeatureKind::Numeric))
            .chain(
                self.categorical
                    .iter()
                    .map(|c| (c.as_str(), FeatureKind::Categorical)),
            )
    }

    /// Kind of a feature column, if the schema declares it.
    pub fn kind_of(&self, column: &str) -> Option<FeatureKind> {
        self.features()
            .find(|(name, _)| *name == column)
            .map(|(_, kind)| kind)
    }

    /// Every column the schema requires, in table order: id, features, label.
    pub fn required_columns(&self) -> Vec<&str> {
        let mut columns = Vec::with_capacity(self.n_features() + 2);
        if let Some(id) = &self.id {
            columns.push(id.as_str());
        }
        columns.extend(self.features().map(|(name, _)| name));
        if let Some(label) = &self.label {
            columns.push(label.as_str());
        }
        columns
    }

    /// Check that no column is declared twice.
    pub fn validate(&self) -> Result<(), SchemaError> {
        let columns = self.required_columns();
        for (i, column) in columns.iter().enumerate() {
            if columns[..i].contains(column) {
                return Err(SchemaError::DuplicateColumn {
                    column: column.to_string(),
                });
            }
        }
        if self.n_features() == 0 {
            return Err(SchemaError::NoFeatures);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loans_schema_orders_numeric_first() {
        let schema = DatasetSchema::loans();
        let names: Vec<_> = schema.features().map(|(n, _)| n).collect();
        assert_eq!(names[0], "ApplicantIncome");
        assert_eq!(names[5], "Gender");
        assert_eq!(schema.n_features(), 11);
        assert!(schema.validate().is_ok());
    }

    #[test]
    fn required_columns_include_id_and_label() {
        let schema = DatasetSchema::loans();
        let cols = schema.required_columns();
        assert_eq!(cols.first(), Some(&"Loan_ID"));
        assert_eq!(cols.last(), Some(&"Loan_Status"));
        assert_eq!(cols.len(), 13);
    }

    #[test]
    fn features_only_drops_label_and_id() {
        let schema = DatasetSchema::loans().features_only();
        assert!(schema.label.is_none());
        assert!(schema.id.is_none());
        assert_eq!(schema.required_columns().len(), 11);
    }

    #[test]
    fn duplicate_column_is_rejected() {
        let schema = DatasetSchema::new(vec!["a".into()], vec!["a".into()]);
        assert!(matches!(
            schema.validate(),
            Err(SchemaError::DuplicateColumn { .. })
        ));
    }

    #[test]
    fn kind_lookup() {
        let schema = DatasetSchema::loans();
        assert_eq!(schema.kind_of("LoanAmount"), Some(FeatureKind::Numeric));
        assert_eq!(schema.kind_of("Gender"), Some(FeatureKind::Categorical));
        assert_eq!(schema.kind_of("Loan_ID"), None);
    }
}
