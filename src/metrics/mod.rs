//! Held-out evaluation of binary predictions.

mod classification;

pub use classification::{
    accuracy_score, ClassMetrics, ClassificationReport, ConfusionMatrix, MetricsError,
};
