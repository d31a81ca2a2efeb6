//! Preprocessing and classification composed into one fitted unit.
//!
//! [`LoanPipeline`] holds the unfitted steps. [`LoanPipeline::fit`] learns
//! imputation statistics, encoder vocabulary and label classes from a table,
//! trains the classifier on the encoded matrix and returns a
//! [`FittedPipeline`]. The fitted pipeline is immutable; every inference path
//! reuses the frozen state, never a refit.
//!
//! [`run_training`] wraps the full procedure: load, split, fit, evaluate,
//! persist and explain.

mod config;
mod run;

use std::path::Path;

use ndarray::Array2;
use tracing::info;

use crate::data::{Dataset, Record, SchemaError};
use crate::error::{Error, Result};
use crate::explainability::{Explanation, LoanDecision, ShapValues, TreeExplainer};
use crate::io::payload::PipelinePayload;
use crate::io::{ArtifactKind, read_artifact, write_artifact};
use crate::metrics::ClassificationReport;
use crate::model::{Classifier, FittedClassifier, GBDTClassifier, GBDTConfig, GBDTModel};
use crate::preprocess::{
    EncodedFeatures, FittedPreprocessor, FittedTransformer, LabelEncoder, Preprocessor, Transformer,
};
use crate::utils::Parallelism;

pub use config::{PipelineConfig, PipelineConfigError};
pub use run::{TrainingReport, run_training};

// =============================================================================
// LoanPipeline
// =============================================================================

/// Unfitted pipeline: imputation, one-hot encoding, classifier.
#[derive(Debug, Clone, Default)]
pub struct LoanPipeline<C: Classifier = GBDTClassifier> {
    preprocessor: Preprocessor,
    classifier: C,
}

impl LoanPipeline<GBDTClassifier> {
    /// Pipeline around a gradient boosted tree classifier.
    pub fn new(config: GBDTConfig) -> Self {
        Self::with_classifier(GBDTClassifier::new(config))
    }
}

impl<C: Classifier> LoanPipeline<C> {
    pub fn with_classifier(classifier: C) -> Self {
        Self {
            preprocessor: Preprocessor::new(),
            classifier,
        }
    }

    pub fn classifier(&self) -> &C {
        &self.classifier
    }

    /// Fit every step on a labelled table.
    ///
    /// The label classes are learned from the same table.
    pub fn fit(&self, data: &Dataset) -> Result<FittedPipeline<C::Fitted>> {
        let labels = LabelEncoder::fit(data.labels().ok_or(SchemaError::NoLabel)?)?;
        self.fit_with_labels(data, labels)
    }

    /// Fit every step using a label encoder learned elsewhere.
    ///
    /// Used when labels are encoded on the full table before splitting, so
    /// both halves share one class mapping.
    pub fn fit_with_labels(
        &self,
        data: &Dataset,
        labels: LabelEncoder,
    ) -> Result<FittedPipeline<C::Fitted>> {
        data.ensure_not_empty()?;
        let targets = labels.transform(data.labels().ok_or(SchemaError::NoLabel)?)?;

        let (preprocessor, encoded) = self.preprocessor.fit_transform(data)?;
        info!(
            rows = encoded.n_rows(),
            features = encoded.n_features(),
            "fitted preprocessing"
        );

        let model = self.classifier.fit(encoded.matrix.view(), &targets)?;
        FittedPipeline::from_parts(preprocessor, labels, model)
    }
}

// =============================================================================
// FittedPipeline
// =============================================================================

/// Frozen preprocessing state, label classes and fitted classifier.
#[derive(Debug, Clone, PartialEq)]
pub struct FittedPipeline<M = GBDTModel> {
    preprocessor: FittedPreprocessor,
    labels: LabelEncoder,
    model: M,
}

impl<M: FittedClassifier> FittedPipeline<M> {
    /// Assemble a pipeline, checking the model consumes what the
    /// preprocessor produces.
    pub fn from_parts(preprocessor: FittedPreprocessor, labels: LabelEncoder, model: M) -> Result<Self> {
        if model.n_features() != preprocessor.n_features_out() {
            return Err(Error::FeatureMismatch {
                expected: model.n_features(),
                got: preprocessor.n_features_out(),
            });
        }
        Ok(Self {
            preprocessor,
            labels,
            model,
        })
    }

    pub fn preprocessor(&self) -> &FittedPreprocessor {
        &self.preprocessor
    }

    pub fn labels(&self) -> &LabelEncoder {
        &self.labels
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    /// Encoded feature names, in matrix column order.
    pub fn feature_names(&self) -> Vec<String> {
        self.preprocessor.feature_names()
    }

    /// Impute and encode a table with the frozen state.
    pub fn transform(&self, data: &Dataset) -> Result<EncodedFeatures> {
        Ok(self.preprocessor.transform(data)?)
    }

    /// Approval probability per row.
    pub fn predict_proba(&self, data: &Dataset) -> Result<Vec<f64>> {
        let encoded = self.transform(data)?;
        Ok(self.model.predict_proba(encoded.matrix.view()))
    }

    /// Encoded label (0.0 / 1.0) per row.
    pub fn predict(&self, data: &Dataset) -> Result<Vec<f32>> {
        let encoded = self.transform(data)?;
        Ok(self.model.predict(encoded.matrix.view()))
    }

    /// Original label per row (e.g. `"Y"` / `"N"`).
    pub fn predict_labels(&self, data: &Dataset) -> Result<Vec<String>> {
        Ok(self
            .predict(data)?
            .into_iter()
            .map(|y| self.labels.decode(y).to_string())
            .collect())
    }

    /// Approval probability of a single record.
    pub fn predict_record(&self, record: &Record) -> Result<f64> {
        let encoded = self.encode_record(record)?;
        Ok(self.model.predict_proba(encoded.view())[0])
    }

    /// Accuracy, per-class report and confusion matrix on a labelled table.
    pub fn evaluate(&self, data: &Dataset) -> Result<ClassificationReport> {
        let y_true = self
            .labels
            .transform(data.labels().ok_or(SchemaError::NoLabel)?)?;
        let y_pred = self.predict(data)?;
        Ok(ClassificationReport::new(&y_true, &y_pred, self.labels.classes().clone())?)
    }

    fn encode_record(&self, record: &Record) -> Result<Array2<f32>> {
        Ok(self
            .preprocessor
            .transform_records(std::slice::from_ref(record))?
            .matrix)
    }
}

impl FittedPipeline<GBDTModel> {
    /// TreeSHAP explainer over the fitted forest.
    pub fn explainer(&self) -> Result<TreeExplainer> {
        Ok(TreeExplainer::new(
            self.model.forest().clone(),
            self.feature_names(),
        )?)
    }

    /// SHAP values for every row of a table.
    pub fn shap_values(&self, data: &Dataset, parallelism: Parallelism) -> Result<ShapValues> {
        let encoded = self.transform(data)?;
        Ok(self.explainer()?.shap_values(encoded.matrix.view(), parallelism)?)
    }

    /// Explanation of one raw record.
    ///
    /// Builds an explainer on every call; hold a [`TreeExplainer`] when
    /// explaining many records.
    pub fn explain_record(&self, record: &Record) -> Result<Explanation> {
        Ok(self.explainer()?.explain_record(&self.preprocessor, record)?)
    }

    /// Decision summary of one raw record with its `top_k` factors.
    pub fn decide(&self, record: &Record, top_k: usize) -> Result<LoanDecision> {
        let explanation = self.explain_record(record)?;
        Ok(LoanDecision::from_explanation(&explanation, top_k))
    }

    /// Persist the pipeline as one artifact.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let payload = PipelinePayload::new(&self.preprocessor, &self.labels, &self.model);
        write_artifact(
            path.as_ref(),
            ArtifactKind::Pipeline,
            self.preprocessor.n_features_out() as u32,
            &payload,
        )?;
        Ok(())
    }

    /// Load a pipeline saved by [`save`](Self::save).
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let payload: PipelinePayload = read_artifact(path.as_ref(), ArtifactKind::Pipeline)?;
        let (preprocessor, labels, model) = payload.into_parts()?;
        Self::from_parts(preprocessor, labels, model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::DatasetSchema;

    fn table(n: usize) -> Dataset {
        let schema = DatasetSchema::new(
            vec!["Credit_History".into()],
            vec!["Property_Area".into()],
        )
        .with_label("Loan_Status");
        let credit: Vec<Option<f64>> = (0..n).map(|i| Some((i % 2) as f64)).collect();
        let area: Vec<Option<String>> = (0..n)
            .map(|i| Some(if i % 3 == 0 { "Urban" } else { "Rural" }.to_string()))
            .collect();
        let labels: Vec<Option<String>> = (0..n)
            .map(|i| Some(if i % 2 == 1 { "Y" } else { "N" }.to_string()))
            .collect();
        Dataset::from_columns(schema, vec![credit], vec![area], Some(labels), None).unwrap()
    }

    fn config() -> GBDTConfig {
        GBDTConfig::builder().n_trees(5).build().unwrap()
    }

    #[test]
    fn fit_predict_evaluate() {
        let data = table(20);
        let fitted = LoanPipeline::new(config()).fit(&data).unwrap();
        assert_eq!(fitted.feature_names(), vec!["num__Credit_History", "cat__Property_Area_Urban"]);

        let labels = fitted.predict_labels(&data).unwrap();
        assert_eq!(labels[0], "N");
        assert_eq!(labels[1], "Y");

        let report = fitted.evaluate(&data).unwrap();
        assert_eq!(report.accuracy, 1.0);
    }

    #[test]
    fn record_paths_agree_with_table_paths() {
        let data = table(20);
        let fitted = LoanPipeline::new(config()).fit(&data).unwrap();
        let proba = fitted.predict_proba(&data).unwrap();
        let record = data.record(3);
        approx::assert_abs_diff_eq!(fitted.predict_record(&record).unwrap(), proba[3]);

        let explanation = fitted.explain_record(&record).unwrap();
        approx::assert_abs_diff_eq!(explanation.probability(), proba[3], epsilon = 1e-9);

        let decision = fitted.decide(&record, 1).unwrap();
        assert!(decision.approved);
        assert_eq!(decision.factors[0].feature, "num__Credit_History");
    }

    #[test]
    fn fitted_artifacts_are_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<FittedPipeline>();
        assert_send_sync::<crate::explainability::TreeExplainer>();
    }

    #[test]
    fn unlabelled_table_cannot_be_fit() {
        let schema = DatasetSchema::new(vec!["x".into()], vec![]);
        let data = Dataset::from_columns(schema, vec![vec![Some(1.0)]], vec![], None, None).unwrap();
        assert!(matches!(
            LoanPipeline::new(config()).fit(&data),
            Err(Error::Schema(SchemaError::NoLabel))
        ));
    }

    #[test]
    fn save_and_load() {
        let fitted = LoanPipeline::new(config()).fit(&table(12)).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.bin");
        fitted.save(&path).unwrap();

        let loaded = FittedPipeline::load(&path).unwrap();
        assert_eq!(loaded.preprocessor(), fitted.preprocessor());
        assert_eq!(loaded.labels(), fitted.labels());
        assert_eq!(loaded.model().forest(), fitted.model().forest());
        assert_eq!(loaded.model().meta().feature_name(1), "cat__Property_Area_Urban");
    }
}
