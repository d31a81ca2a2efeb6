//! Accuracy, per-class precision/recall/F1 and the confusion matrix.
//!
//! Labels are `0.0` (negative) and `1.0` (positive). Any ratio with a zero
//! denominator is reported as `0.0`.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MetricsError {
    #[error("{n_true} true labels but {n_pred} predictions")]
    LengthMismatch { n_true: usize, n_pred: usize },

    #[error("no labels to evaluate")]
    Empty,

    #[error("label {value} at index {index} is not 0 or 1")]
    NonBinary { index: usize, value: String },
}

fn check(y_true: &[f32], y_pred: &[f32]) -> Result<(), MetricsError> {
    if y_true.len() != y_pred.len() {
        return Err(MetricsError::LengthMismatch {
            n_true: y_true.len(),
            n_pred: y_pred.len(),
        });
    }
    if y_true.is_empty() {
        return Err(MetricsError::Empty);
    }
    for (index, &v) in y_true.iter().chain(y_pred).enumerate() {
        if v != 0.0 && v != 1.0 {
            return Err(MetricsError::NonBinary {
                index: index % y_true.len(),
                value: v.to_string(),
            });
        }
    }
    Ok(())
}

#[inline]
fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 { 0.0 } else { num as f64 / den as f64 }
}

/// `correct / total`.
pub fn accuracy_score(y_true: &[f32], y_pred: &[f32]) -> Result<f64, MetricsError> {
    check(y_true, y_pred)?;
    let correct = y_true.iter().zip(y_pred).filter(|(t, p)| t == p).count();
    Ok(ratio(correct, y_true.len()))
}

// =============================================================================
// ConfusionMatrix
// =============================================================================

/// 2×2 confusion matrix; rows are true classes, columns predicted classes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfusionMatrix {
    pub counts: [[usize; 2]; 2],
}

impl ConfusionMatrix {
    pub fn from_labels(y_true: &[f32], y_pred: &[f32]) -> Result<Self, MetricsError> {
        check(y_true, y_pred)?;
        let mut counts = [[0usize; 2]; 2];
        for (&t, &p) in y_true.iter().zip(y_pred) {
            counts[t as usize][p as usize] += 1;
        }
        Ok(Self { counts })
    }

    pub fn true_negatives(&self) -> usize {
        self.counts[0][0]
    }

    pub fn false_positives(&self) -> usize {
        self.counts[0][1]
    }

    pub fn false_negatives(&self) -> usize {
        self.counts[1][0]
    }

    pub fn true_positives(&self) -> usize {
        self.counts[1][1]
    }

    pub fn total(&self) -> usize {
        self.counts.iter().flatten().sum()
    }

    /// Metrics treating `class` as the positive label.
    pub fn class_metrics(&self, class: usize) -> ClassMetrics {
        let other = 1 - class;
        let tp = self.counts[class][class];
        let fp = self.counts[other][class];
        let fn_ = self.counts[class][other];
        let precision = ratio(tp, tp + fp);
        let recall = ratio(tp, tp + fn_);
        let f1 = if precision + recall == 0.0 {
            0.0
        } else {
            2.0 * precision * recall / (precision + recall)
        };
        ClassMetrics {
            precision,
            recall,
            f1,
            support: tp + fn_,
        }
    }
}

impl fmt::Display for ConfusionMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = self
            .counts
            .iter()
            .flatten()
            .map(|c| c.to_string().len())
            .max()
            .unwrap_or(1);
        let [a, b] = self.counts;
        writeln!(f, "[[{:>w$} {:>w$}]", a[0], a[1], w = width)?;
        writeln!(f, " [{:>w$} {:>w$}]]", b[0], b[1], w = width)
    }
}

// =============================================================================
// ClassificationReport
// =============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ClassMetrics {
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub support: usize,
}

/// Per-class metrics with macro and weighted averages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationReport {
    /// Display names for classes 0 and 1.
    pub class_names: [String; 2],
    pub classes: [ClassMetrics; 2],
    pub accuracy: f64,
    pub macro_avg: ClassMetrics,
    pub weighted_avg: ClassMetrics,
    pub confusion: ConfusionMatrix,
}

impl ClassificationReport {
    pub fn new(y_true: &[f32], y_pred: &[f32], class_names: [String; 2]) -> Result<Self, MetricsError> {
        let confusion = ConfusionMatrix::from_labels(y_true, y_pred)?;
        let classes = [confusion.class_metrics(0), confusion.class_metrics(1)];
        let total = confusion.total();
        let accuracy = ratio(confusion.true_positives() + confusion.true_negatives(), total);

        let macro_avg = ClassMetrics {
            precision: (classes[0].precision + classes[1].precision) / 2.0,
            recall: (classes[0].recall + classes[1].recall) / 2.0,
            f1: (classes[0].f1 + classes[1].f1) / 2.0,
            support: total,
        };
        let weight = |m: fn(&ClassMetrics) -> f64| {
            if total == 0 {
                return 0.0;
            }
            classes.iter().map(|c| m(c) * c.support as f64).sum::<f64>() / total as f64
        };
        let weighted_avg = ClassMetrics {
            precision: weight(|c: &ClassMetrics| c.precision),
            recall: weight(|c: &ClassMetrics| c.recall),
            f1: weight(|c: &ClassMetrics| c.f1),
            support: total,
        };

        Ok(Self {
            class_names,
            classes,
            accuracy,
            macro_avg,
            weighted_avg,
            confusion,
        })
    }
}

impl fmt::Display for ClassificationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = self
            .class_names
            .iter()
            .map(String::len)
            .chain(["weighted avg".len()])
            .max()
            .unwrap_or(12);
        let row = |f: &mut fmt::Formatter<'_>, name: &str, m: &ClassMetrics| {
            writeln!(
                f,
                "{name:>width$} {:>9.2} {:>9.2} {:>9.2} {:>9}",
                m.precision, m.recall, m.f1, m.support
            )
        };

        writeln!(f, "{:>width$} {:>9} {:>9} {:>9} {:>9}", "", "precision", "recall", "f1-score", "support")?;
        writeln!(f)?;
        for (name, m) in self.class_names.iter().zip(&self.classes) {
            row(f, name, m)?;
        }
        writeln!(f)?;
        writeln!(
            f,
            "{:>width$} {:>9} {:>9} {:>9.2} {:>9}",
            "accuracy",
            "",
            "",
            self.accuracy,
            self.confusion.total()
        )?;
        row(f, "macro avg", &self.macro_avg)?;
        row(f, "weighted avg", &self.weighted_avg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn names() -> [String; 2] {
        ["N".to_string(), "Y".to_string()]
    }

    #[test]
    fn accuracy_is_exact_ratio() {
        let y_true = [1.0, 0.0, 1.0, 1.0, 0.0, 1.0, 0.0];
        let y_pred = [1.0, 1.0, 1.0, 0.0, 0.0, 1.0, 0.0];
        assert_eq!(accuracy_score(&y_true, &y_pred).unwrap(), 5.0 / 7.0);
    }

    #[test]
    fn confusion_counts() {
        let cm = ConfusionMatrix::from_labels(&[1.0, 0.0, 1.0, 0.0], &[1.0, 1.0, 0.0, 0.0]).unwrap();
        assert_eq!(cm.true_positives(), 1);
        assert_eq!(cm.false_positives(), 1);
        assert_eq!(cm.false_negatives(), 1);
        assert_eq!(cm.true_negatives(), 1);
        assert_eq!(cm.to_string(), "[[1 1]\n [1 1]]\n");
    }

    #[test]
    fn report_matches_hand_computation() {
        // TP=3 FP=1 FN=1 TN=2
        let y_true = [1.0, 1.0, 1.0, 1.0, 0.0, 0.0, 0.0];
        let y_pred = [1.0, 1.0, 1.0, 0.0, 1.0, 0.0, 0.0];
        let report = ClassificationReport::new(&y_true, &y_pred, names()).unwrap();
        let pos = report.classes[1];
        assert_abs_diff_eq!(pos.precision, 0.75);
        assert_abs_diff_eq!(pos.recall, 0.75);
        assert_abs_diff_eq!(pos.f1, 0.75);
        assert_eq!(pos.support, 4);
        let neg = report.classes[0];
        assert_abs_diff_eq!(neg.precision, 2.0 / 3.0);
        assert_abs_diff_eq!(neg.recall, 2.0 / 3.0);
        assert_abs_diff_eq!(report.accuracy, 5.0 / 7.0);
        assert_abs_diff_eq!(
            report.weighted_avg.f1,
            (0.75 * 4.0 + 2.0 / 3.0 * 3.0) / 7.0,
            epsilon = 1e-12
        );
    }

    #[test]
    fn zero_denominators_yield_zero() {
        // Never predicts positive.
        let report = ClassificationReport::new(&[1.0, 0.0], &[0.0, 0.0], names()).unwrap();
        assert_eq!(report.classes[1].precision, 0.0);
        assert_eq!(report.classes[1].f1, 0.0);
        assert_eq!(report.classes[0].recall, 1.0);
    }

    #[test]
    fn rejects_bad_inputs() {
        assert_eq!(accuracy_score(&[], &[]), Err(MetricsError::Empty));
        assert!(matches!(
            accuracy_score(&[1.0], &[1.0, 0.0]),
            Err(MetricsError::LengthMismatch { .. })
        ));
        assert!(matches!(
            accuracy_score(&[2.0], &[1.0]),
            Err(MetricsError::NonBinary { .. })
        ));
    }

    #[test]
    fn report_renders_table() {
        let report = ClassificationReport::new(&[1.0, 0.0], &[1.0, 0.0], names()).unwrap();
        let text = report.to_string();
        assert!(text.contains("precision"));
        assert!(text.contains("weighted avg"));
        assert!(text.contains("accuracy"));
        assert!(text.lines().any(|l| l.trim_start().starts_with("Y ")));
    }
}
