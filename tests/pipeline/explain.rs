//! TreeSHAP explanations of fitted pipelines.

use approx::assert_abs_diff_eq;

use loanboost::explainability::{GlobalImportance, LoanDecision, RiskLevel};
use loanboost::{LoanPipeline, Parallelism};

use crate::common::{self, LabelRule};

#[test]
fn shap_values_sum_to_margin() {
    let data = common::loans(200, 17, LabelRule::Noisy, true);
    let fitted = LoanPipeline::new(common::quick_config(30)).fit(&data).unwrap();

    let encoded = fitted.transform(&data).unwrap();
    let margins = fitted.model().predict_margin(encoded.matrix.view());
    let shap = fitted.shap_values(&data, Parallelism::Sequential).unwrap();

    assert_eq!(shap.n_samples(), 200);
    assert_eq!(shap.n_features(), fitted.feature_names().len());
    assert!(shap.verify(&margins, 1e-6));
}

#[test]
fn parallel_matches_sequential() {
    let data = common::loans(120, 2, LabelRule::Noisy, true);
    let fitted = LoanPipeline::new(common::quick_config(10)).fit(&data).unwrap();
    let seq = fitted.shap_values(&data, Parallelism::Sequential).unwrap();
    let par = fitted.shap_values(&data, Parallelism::Parallel).unwrap();
    assert_eq!(seq, par);
}

#[test]
fn single_record_uses_frozen_preprocessing() {
    let data = common::loans(150, 4, LabelRule::Noisy, true);
    let fitted = LoanPipeline::new(common::quick_config(20)).fit(&data).unwrap();
    let proba = fitted.predict_proba(&data).unwrap();

    // Rows with missing cells go through the same fill values as the batch.
    for row in [0, 7, 42, 149] {
        let record = data.record(row);
        let explanation = fitted.explain_record(&record).unwrap();
        assert_eq!(explanation.feature_names(), fitted.feature_names().as_slice());
        assert_abs_diff_eq!(explanation.probability(), proba[row], epsilon = 1e-9);
    }
}

#[test]
fn decision_summary_follows_probability() {
    let data = common::loans(150, 8, LabelRule::CreditHistory, false);
    let fitted = LoanPipeline::new(common::quick_config(20)).fit(&data).unwrap();

    let credit = data.numeric_column("Credit_History").unwrap();
    let good = credit.iter().position(|c| *c == Some(1.0)).unwrap();
    let bad = credit.iter().position(|c| *c == Some(0.0)).unwrap();

    let approved: LoanDecision = fitted.decide(&data.record(good), 3).unwrap();
    assert!(approved.approved);
    assert_eq!(approved.risk, RiskLevel::Low);
    assert!(approved.confidence > 80.0);
    assert_eq!(approved.factors.len(), 3);
    assert_eq!(approved.factors[0].feature, "num__Credit_History");

    let rejected = fitted.decide(&data.record(bad), 3).unwrap();
    assert!(!rejected.approved);
    assert_eq!(rejected.risk, RiskLevel::High);
    assert!(rejected.to_string().contains("REJECTED"));
}

#[test]
fn global_importance_ranks_every_feature() {
    let data = common::loans(200, 6, LabelRule::Noisy, false);
    let fitted = LoanPipeline::new(common::quick_config(15)).fit(&data).unwrap();
    let shap = fitted.shap_values(&data, Parallelism::Sequential).unwrap();
    let importance = GlobalImportance::from_shap(&shap, &fitted.feature_names());

    let entries = importance.entries();
    assert_eq!(entries.len(), fitted.feature_names().len());
    assert!(entries.windows(2).all(|w| w[0].1 >= w[1].1));
    assert_eq!(entries[0].0, "num__Credit_History");
}
