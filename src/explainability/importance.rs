//! Global feature importance as mean absolute SHAP value.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::ShapValues;

/// Features ranked by mean |φ| over an explained set.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GlobalImportance {
    /// `(feature, mean |φ|)`, descending; ties keep feature order.
    entries: Vec<(String, f64)>,
}

impl GlobalImportance {
    pub fn from_shap(shap: &ShapValues, feature_names: &[String]) -> Self {
        let mut entries: Vec<(String, f64)> = feature_names
            .iter()
            .cloned()
            .zip(shap.mean_abs())
            .collect();
        // Stable sort keeps feature order among ties.
        entries.sort_by(|a, b| b.1.total_cmp(&a.1));
        Self { entries }
    }

    pub fn entries(&self) -> &[(String, f64)] {
        &self.entries
    }

    pub fn top_k(&self, k: usize) -> &[(String, f64)] {
        &self.entries[..k.min(self.entries.len())]
    }

    /// The first `k` entries as their own ranking.
    pub fn truncated(&self, k: usize) -> Self {
        Self {
            entries: self.top_k(k).to_vec(),
        }
    }

    pub fn get(&self, feature: &str) -> Option<f64> {
        self.entries.iter().find(|(n, _)| n == feature).map(|(_, v)| *v)
    }
}

impl fmt::Display for GlobalImportance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = self.entries.iter().map(|(n, _)| n.len()).max().unwrap_or(0);
        for (rank, (name, value)) in self.entries.iter().enumerate() {
            writeln!(f, "{:>3}. {:<width$}  {:.6}", rank + 1, name, value)?;
        }
        Ok(())
    }
}
