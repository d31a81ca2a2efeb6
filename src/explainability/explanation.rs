//! Per-instance explanation aligned to encoded feature names.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::training::sigmoid;

/// Contributions below this magnitude are reported as neutral.
pub const NEUTRAL_THRESHOLD: f64 = 1e-3;

/// Direction in which a feature pushed the approval score.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Effect {
    Positive,
    Negative,
    Neutral,
}

impl Effect {
    pub fn of(value: f64) -> Self {
        if value.abs() < NEUTRAL_THRESHOLD {
            Effect::Neutral
        } else if value > 0.0 {
            Effect::Positive
        } else {
            Effect::Negative
        }
    }
}

impl fmt::Display for Effect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Effect::Positive => "positive",
            Effect::Negative => "negative",
            Effect::Neutral => "neutral",
        })
    }
}

/// One named contribution.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Contribution {
    pub feature: String,
    pub value: f64,
    pub effect: Effect,
}

/// SHAP explanation of one prediction in margin space.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Explanation {
    feature_names: Vec<String>,
    values: Vec<f64>,
    base_value: f64,
}

impl Explanation {
    pub(crate) fn new(feature_names: Vec<String>, values: Vec<f64>, base_value: f64) -> Self {
        debug_assert_eq!(feature_names.len(), values.len());
        Self {
            feature_names,
            values,
            base_value,
        }
    }

    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    /// Contributions, positionally aligned with [`feature_names`](Self::feature_names).
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn base_value(&self) -> f64 {
        self.base_value
    }

    /// Contribution of a named feature.
    pub fn get(&self, feature: &str) -> Option<f64> {
        self.feature_names
            .iter()
            .position(|n| n == feature)
            .map(|i| self.values[i])
    }

    /// `base_value + Σφ`, the model's raw margin.
    pub fn margin(&self) -> f64 {
        self.base_value + self.values.iter().sum::<f64>()
    }

    /// Approval probability implied by the margin.
    pub fn probability(&self) -> f64 {
        sigmoid(self.margin())
    }

    /// The `k` largest contributions by magnitude, ties by feature order.
    pub fn top_k(&self, k: usize) -> Vec<Contribution> {
        let mut order: Vec<usize> = (0..self.values.len()).collect();
        order.sort_by(|&a, &b| {
            self.values[b]
                .abs()
                .total_cmp(&self.values[a].abs())
                .then(a.cmp(&b))
        });
        order
            .into_iter()
            .take(k)
            .map(|i| Contribution {
                feature: self.feature_names[i].clone(),
                value: self.values[i],
                effect: Effect::of(self.values[i]),
            })
            .collect()
    }

    /// Pretty JSON dump.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

impl fmt::Display for Explanation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = self.feature_names.iter().map(String::len).max().unwrap_or(0);
        writeln!(f, "{:<width$}  {:>10.6}", "base value", self.base_value, width = width.max(10))?;
        for (name, value) in self.feature_names.iter().zip(&self.values) {
            writeln!(f, "{:<width$}  {:>+10.6}", name, value, width = width.max(10))?;
        }
        write!(f, "{:<width$}  {:>10.6}", "margin", self.margin(), width = width.max(10))
    }
}
