//! The end-to-end training run.

use std::fmt;

use tracing::info;

use crate::data::{DatasetSchema, MissingCounts, SchemaError, load_csv, stratified_split};
use crate::error::Result;
use crate::explainability::GlobalImportance;
use crate::io::save_explainer;
use crate::metrics::ClassificationReport;
use crate::preprocess::LabelEncoder;
use crate::utils::Parallelism;

use super::{FittedPipeline, LoanPipeline, PipelineConfig};

/// What a training run observed and produced.
#[derive(Debug, Clone)]
pub struct TrainingReport {
    pub n_rows: usize,
    pub n_train: usize,
    pub n_test: usize,
    pub missing_before: MissingCounts,
    pub missing_after: MissingCounts,
    pub evaluation: ClassificationReport,
    pub importance: GlobalImportance,
    /// Rows listed by the importance summary.
    pub top_k: usize,
    pub pipeline: FittedPipeline,
}

/// Load, split, fit, evaluate, persist and explain.
///
/// Steps run in order and any failure aborts the run. Both artifacts are
/// written only after fitting and explainer construction have succeeded.
pub fn run_training(config: &PipelineConfig) -> Result<TrainingReport> {
    config.validate()?;

    let schema = DatasetSchema::loans();
    let data = load_csv(&config.data_path, &schema)?;
    data.ensure_not_empty()?;
    let missing_before = data.missing_counts();

    let labels = LabelEncoder::fit(data.labels().ok_or(SchemaError::NoLabel)?)?;
    let targets = labels.transform(data.labels().ok_or(SchemaError::NoLabel)?)?;
    let split = stratified_split(&targets, config.test_fraction, config.seed)?;
    let train = data.select_rows(&split.train);
    let test = data.select_rows(&split.test);
    info!(train = train.n_rows(), test = test.n_rows(), "split dataset");

    let pipeline = LoanPipeline::new(config.booster.clone()).fit_with_labels(&train, labels)?;
    let missing_after = pipeline.preprocessor().impute(&data)?.missing_counts();

    let evaluation = pipeline.evaluate(&test)?;
    info!(accuracy = evaluation.accuracy, "evaluated on held-out split");

    let explainer = pipeline.explainer()?;
    pipeline.save(&config.model_path)?;
    save_explainer(&explainer, &config.explainer_path)?;
    info!(
        model = %config.model_path.display(),
        explainer = %config.explainer_path.display(),
        "saved artifacts"
    );

    let encoded = pipeline.transform(&test)?;
    let parallelism = Parallelism::from_threads(config.booster.n_threads);
    let shap = explainer.shap_values(encoded.matrix.view(), parallelism)?;
    let importance = GlobalImportance::from_shap(&shap, explainer.feature_names());

    Ok(TrainingReport {
        n_rows: data.n_rows(),
        n_train: train.n_rows(),
        n_test: test.n_rows(),
        missing_before,
        missing_after,
        evaluation,
        importance,
        top_k: config.top_k,
        pipeline,
    })
}

impl fmt::Display for TrainingReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Missing values before handling:")?;
        write!(f, "{}", self.missing_before)?;
        writeln!(f)?;
        writeln!(f, "Missing values after handling:")?;
        write!(f, "{}", self.missing_after)?;
        writeln!(f)?;
        writeln!(
            f,
            "Model Evaluation on Test Set ({} train / {} test rows):",
            self.n_train, self.n_test
        )?;
        writeln!(f, "Accuracy: {:.4}", self.evaluation.accuracy)?;
        writeln!(f)?;
        writeln!(f, "Classification Report:")?;
        write!(f, "{}", self.evaluation)?;
        writeln!(f)?;
        writeln!(f, "Confusion Matrix:")?;
        write!(f, "{}", self.evaluation.confusion)?;
        writeln!(f)?;
        writeln!(f, "Top features (mean |SHAP|):")?;
        write!(f, "{}", self.importance.truncated(self.top_k))
    }
}
