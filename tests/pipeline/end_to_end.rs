//! Loading, imputation, fitting and evaluation on synthetic loan tables.

use loanboost::data::{DatasetSchema, read_csv, stratified_split};
use loanboost::preprocess::{FittedTransformer, Imputer, LabelEncoder, Transformer};
use loanboost::{LoanPipeline, PipelineConfig};

use crate::common::{self, LabelRule};

#[test]
fn four_row_imputation_scenario() {
    let csv = format!(
        "{}\n\
         LP001,Male,No,0,Graduate,No,5849,0,100,360,1,Urban,Y\n\
         LP002,Female,Yes,1,Graduate,No,4583,1508,,360,1,Rural,N\n\
         LP003,,Yes,0,Graduate,Yes,3000,0,150,360,1,Urban,Y\n\
         LP004,Male,Yes,0,Not Graduate,No,2583,2358,200,360,1,Urban,Y\n",
        common::HEADER
    );
    let data = read_csv(csv.as_bytes(), &DatasetSchema::loans()).unwrap();
    let before = data.missing_counts();
    assert_eq!(before.get("LoanAmount"), Some(1));
    assert_eq!(before.get("Gender"), Some(1));
    assert_eq!(before.total(), 2);

    let stats = Imputer::new().fit(&data).unwrap();
    let imputed = stats.transform(&data).unwrap();
    assert_eq!(imputed.numeric_column("LoanAmount").unwrap()[1], Some(125.0));
    assert_eq!(imputed.categorical_column("Gender").unwrap()[2].as_deref(), Some("Male"));
    assert_eq!(imputed.missing_counts().total(), 0);
}

#[test]
fn separable_data_scores_perfectly() {
    let data = common::loans(200, 3, LabelRule::CreditHistory, false);
    let labels = LabelEncoder::fit(data.labels().unwrap()).unwrap();
    let y = labels.transform(data.labels().unwrap()).unwrap();
    let split = stratified_split(&y, 0.2, 42).unwrap();
    let train = data.select_rows(&split.train);
    let test = data.select_rows(&split.test);

    let fitted = LoanPipeline::new(common::quick_config(10))
        .fit_with_labels(&train, labels)
        .unwrap();
    let report = fitted.evaluate(&test).unwrap();
    assert_eq!(report.accuracy, 1.0);
    assert_eq!(report.confusion.total(), 40);
    assert_eq!(report.confusion.false_positives() + report.confusion.false_negatives(), 0);
}

#[test]
fn fitting_is_deterministic() {
    let data = common::loans(150, 11, LabelRule::Noisy, true);
    let pipeline = LoanPipeline::new(common::quick_config(15));
    let a = pipeline.fit(&data).unwrap();
    let b = pipeline.fit(&data).unwrap();
    assert_eq!(a, b);
    assert_eq!(a.predict_proba(&data).unwrap(), b.predict_proba(&data).unwrap());
}

#[test]
fn unseen_category_does_not_fail_inference() {
    let data = common::loans(80, 5, LabelRule::Noisy, false);
    let fitted = LoanPipeline::new(common::quick_config(5)).fit(&data).unwrap();

    let mut record = data.record(0);
    record.set("Property_Area", loanboost::Value::Category("Countryside".into()));
    let p = fitted.predict_record(&record).unwrap();
    assert!((0.0..=1.0).contains(&p));

    // All area indicators are zero, like the reference level.
    let encoded = fitted.preprocessor().transform_records(&[record]).unwrap();
    assert_eq!(encoded.unseen.len(), 1);
    let names = fitted.feature_names();
    for (j, name) in names.iter().enumerate() {
        if name.starts_with("cat__Property_Area_") {
            assert_eq!(encoded.matrix[[0, j]], 0.0);
        }
    }
}

#[test]
fn record_missing_a_field_is_a_schema_error() {
    let data = common::loans(60, 9, LabelRule::Noisy, false);
    let fitted = LoanPipeline::new(common::quick_config(3)).fit(&data).unwrap();
    let record = loanboost::Record::new().with_number("ApplicantIncome", 4000.0);
    assert!(matches!(
        fitted.predict_record(&record),
        Err(loanboost::Error::Preprocess(_))
    ));
}

#[test]
fn full_run_writes_artifacts_and_reports() {
    let dir = tempfile::tempdir().unwrap();
    let csv = common::loans_csv(250, 21, LabelRule::Noisy, true);
    let config = PipelineConfig {
        data_path: common::write_csv(dir.path(), "loans.csv", &csv),
        model_path: dir.path().join("loan_model.bin"),
        explainer_path: dir.path().join("loan_explainer.bin"),
        top_k: 5,
        booster: common::quick_config(20),
        ..PipelineConfig::default()
    };

    let report = loanboost::pipeline::run_training(&config).unwrap();
    assert_eq!(report.n_rows, 250);
    assert_eq!(report.n_test, 50);
    assert_eq!(report.n_train, 200);
    assert!(report.missing_before.total() > 0);
    assert_eq!(report.missing_after.total(), 0);
    assert!(config.model_path.exists());
    assert!(config.explainer_path.exists());

    // Credit history drives the label, so it should lead the ranking.
    assert_eq!(report.importance.entries()[0].0, "num__Credit_History");

    let text = report.to_string();
    assert!(text.contains("Missing values before handling:"));
    assert!(text.contains("Accuracy:"));
    assert!(text.contains("weighted avg"));
}

#[test]
fn failed_run_persists_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let csv = format!("{}\nLP001,Male,No,0,Graduate,No,100,0,,360,1,Urban,Y\n", common::HEADER);
    let config = PipelineConfig {
        data_path: common::write_csv(dir.path(), "one.csv", &csv),
        model_path: dir.path().join("m.bin"),
        explainer_path: dir.path().join("e.bin"),
        ..PipelineConfig::default()
    };
    assert!(loanboost::pipeline::run_training(&config).is_err());
    assert!(!config.model_path.exists());
    assert!(!config.explainer_path.exists());
}
