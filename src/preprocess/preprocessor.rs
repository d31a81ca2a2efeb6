//! Imputation followed by one-hot encoding.

use serde::{Deserialize, Serialize};

use super::{
    EncodedFeatures, FittedEncoder, FittedTransformer, ImputationStats, Imputer, OneHotEncoder,
    PreprocessError, Transformer,
};
use crate::data::{Dataset, DatasetSchema, Record};

/// Column transformer for loan tables: median/mode imputation, then
/// numeric pass-through plus one-hot categorical encoding.
#[derive(Clone, Copy, Debug, Default)]
pub struct Preprocessor {
    imputer: Imputer,
    encoder: OneHotEncoder,
}

impl Preprocessor {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Frozen preprocessing state: feature schema, fill values, vocabulary.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FittedPreprocessor {
    schema: DatasetSchema,
    imputation: ImputationStats,
    encoder: FittedEncoder,
}

impl FittedPreprocessor {
    /// Check that fill values and vocabulary both match the feature schema.
    pub fn validate(&self) -> Result<(), PreprocessError> {
        self.imputation.validate(&self.schema)?;
        self.encoder.validate(&self.schema)
    }

    /// Feature schema records must match.
    pub fn schema(&self) -> &DatasetSchema {
        &self.schema
    }

    /// Frozen imputation statistics.
    pub fn imputation(&self) -> &ImputationStats {
        &self.imputation
    }

    /// Frozen encoder vocabulary.
    pub fn encoder(&self) -> &FittedEncoder {
        &self.encoder
    }

    /// Encoded feature names.
    pub fn feature_names(&self) -> Vec<String> {
        self.encoder.feature_names()
    }

    /// Number of encoded features.
    pub fn n_features_out(&self) -> usize {
        self.encoder.n_features_out()
    }

    /// Apply imputation only.
    pub fn impute(&self, data: &Dataset) -> Result<Dataset, PreprocessError> {
        self.imputation.transform(data)
    }

    /// Encode single records.
    ///
    /// Every record must carry every feature field the pipeline was fit on.
    pub fn transform_records(&self, records: &[Record]) -> Result<EncodedFeatures, PreprocessError> {
        let data = Dataset::from_records(&self.schema, records)?;
        self.transform(&data)
    }
}

impl Transformer for Preprocessor {
    type Fitted = FittedPreprocessor;

    fn fit(&self, data: &Dataset) -> Result<FittedPreprocessor, PreprocessError> {
        let imputation = self.imputer.fit(data)?;
        let imputed = imputation.transform(data)?;
        let encoder = self.encoder.fit(&imputed)?;
        Ok(FittedPreprocessor {
            schema: data.schema().features_only(),
            imputation,
            encoder,
        })
    }
}

impl FittedTransformer for FittedPreprocessor {
    type Output = EncodedFeatures;

    fn transform(&self, data: &Dataset) -> Result<EncodedFeatures, PreprocessError> {
        let imputed = self.imputation.transform(data)?;
        self.encoder.transform(&imputed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{SchemaError, Value};

    fn table() -> Dataset {
        let schema = DatasetSchema::new(vec!["LoanAmount".into()], vec!["Gender".into()]);
        Dataset::from_columns(
            schema,
            vec![vec![Some(100.0), None, Some(150.0)]],
            vec![vec![Some("Male".into()), Some("Female".into()), None]],
            None,
            None,
        )
        .unwrap()
    }

    #[test]
    fn imputes_then_encodes() {
        let (pre, out) = Preprocessor::new().fit_transform(&table()).unwrap();
        assert_eq!(pre.feature_names(), vec!["num__LoanAmount", "cat__Gender_Male"]);
        // Row 1 LoanAmount -> median 125; row 2 Gender -> mode tie -> "Female".
        assert_eq!(out.matrix.row(1).to_vec(), vec![125.0, 0.0]);
        assert_eq!(out.matrix.row(2).to_vec(), vec![150.0, 0.0]);
    }

    #[test]
    fn record_inference_matches_table_inference() {
        let data = table();
        let pre = Preprocessor::new().fit(&data).unwrap();
        let records: Vec<_> = (0..data.n_rows()).map(|r| data.record(r)).collect();
        let a = pre.transform(&data).unwrap();
        let b = pre.transform_records(&records).unwrap();
        assert_eq!(a.matrix, b.matrix);
    }

    #[test]
    fn record_missing_field_is_schema_error() {
        let pre = Preprocessor::new().fit(&table()).unwrap();
        let mut record = Record::new();
        record.set("LoanAmount", Value::Number(90.0));
        let err = pre.transform_records(&[record]).unwrap_err();
        assert_eq!(
            err,
            PreprocessError::Schema(SchemaError::MissingField {
                field: "Gender".into()
            })
        );
    }
}
