//! Saving and loading both artifacts, and rejecting damaged ones.

use std::fs;

use loanboost::io::payload::PipelinePayload;
use loanboost::io::{ArtifactKind, SerializationError, load_explainer, save_explainer, write_artifact};
use loanboost::{Error, FittedPipeline, LoanPipeline};

use crate::common::{self, LabelRule};

fn fitted() -> FittedPipeline {
    let data = common::loans(120, 13, LabelRule::Noisy, true);
    LoanPipeline::new(common::quick_config(12)).fit(&data).unwrap()
}

fn serialization_error(result: loanboost::Result<FittedPipeline>) -> SerializationError {
    match result {
        Err(Error::Serialization(e)) => e,
        other => panic!("expected a serialization error, got {other:?}"),
    }
}

#[test]
fn pipeline_round_trip_predicts_identically() {
    let data = common::loans(60, 99, LabelRule::Noisy, true);
    let pipeline = fitted();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("loan_model.bin");
    pipeline.save(&path).unwrap();

    let loaded = FittedPipeline::load(&path).unwrap();
    assert_eq!(loaded.preprocessor(), pipeline.preprocessor());
    assert_eq!(loaded.labels(), pipeline.labels());
    assert_eq!(loaded.model().forest(), pipeline.model().forest());
    assert_eq!(loaded.predict_proba(&data).unwrap(), pipeline.predict_proba(&data).unwrap());
}

#[test]
fn explainer_round_trip_is_independent_of_pipeline() {
    let pipeline = fitted();
    let explainer = pipeline.explainer().unwrap();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("loan_explainer.bin");
    save_explainer(&explainer, &path).unwrap();

    let loaded = load_explainer(&path).unwrap();
    assert_eq!(loaded, explainer);
    assert_eq!(loaded.base_value(), explainer.base_value());
}

#[test]
fn corrupted_payload_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("m.bin");
    fitted().save(&path).unwrap();

    let mut bytes = fs::read(&path).unwrap();
    let mid = bytes.len() / 2;
    bytes[mid] ^= 0x5A;
    fs::write(&path, &bytes).unwrap();

    assert!(matches!(
        serialization_error(FittedPipeline::load(&path)),
        SerializationError::ChecksumMismatch { .. }
    ));
}

#[test]
fn truncated_file_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("m.bin");
    fitted().save(&path).unwrap();

    let bytes = fs::read(&path).unwrap();
    fs::write(&path, &bytes[..bytes.len() - 7]).unwrap();
    assert!(matches!(
        serialization_error(FittedPipeline::load(&path)),
        SerializationError::Truncated { .. }
    ));
}

#[test]
fn wrong_artifact_kind_is_rejected() {
    let pipeline = fitted();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("e.bin");
    save_explainer(&pipeline.explainer().unwrap(), &path).unwrap();

    assert!(matches!(
        serialization_error(FittedPipeline::load(&path)),
        SerializationError::KindMismatch { .. }
    ));
}

#[test]
fn foreign_file_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = common::write_csv(dir.path(), "loans.csv", &common::loans_csv(5, 1, LabelRule::Noisy, false));
    assert!(matches!(
        serialization_error(FittedPipeline::load(&path)),
        SerializationError::NotAnArtifact
    ));
}

#[test]
fn inconsistent_vocabulary_with_valid_checksum_is_rejected() {
    let pipeline = fitted();
    let payload = PipelinePayload::new(pipeline.preprocessor(), pipeline.labels(), pipeline.model());

    // Unsorted categories would break lookups at encode time.
    let mut value = serde_json::to_value(&payload.preprocessor).unwrap();
    let cats = value["encoder"]["categorical"][0][1].as_array_mut().unwrap();
    assert!(cats.len() > 1);
    cats.reverse();
    let tampered = PipelinePayload {
        preprocessor: serde_json::from_value(value).unwrap(),
        ..payload
    };

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("m.bin");
    let n_features = pipeline.feature_names().len() as u32;
    write_artifact(&path, ArtifactKind::Pipeline, n_features, &tampered).unwrap();
    assert!(matches!(
        serialization_error(FittedPipeline::load(&path)),
        SerializationError::Corrupt(_)
    ));
}
