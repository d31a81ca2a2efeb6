//! SHAP values container.
//!
//! Stores SHAP values for a batch of samples with proper indexing
//! and verification utilities.

use serde::{Deserialize, Serialize};

/// Container for SHAP values of a single-output model.
///
/// Layout is `[samples × (features + 1)]`, the last column of every row
/// holding the base value.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ShapValues {
    values: Vec<f64>,
    n_samples: usize,
    n_features: usize,
}

impl ShapValues {
    /// Create a container initialized to zeros.
    pub fn zeros(n_samples: usize, n_features: usize) -> Self {
        Self {
            values: vec![0.0; n_samples * (n_features + 1)],
            n_samples,
            n_features,
        }
    }

    #[inline]
    pub fn n_samples(&self) -> usize {
        self.n_samples
    }

    /// Number of features (not including base value).
    #[inline]
    pub fn n_features(&self) -> usize {
        self.n_features
    }

    #[inline]
    fn index(&self, sample: usize, feature: usize) -> usize {
        sample * (self.n_features + 1) + feature
    }

    #[inline]
    pub fn get(&self, sample: usize, feature: usize) -> f64 {
        self.values[self.index(sample, feature)]
    }

    #[inline]
    pub fn add(&mut self, sample: usize, feature: usize, delta: f64) {
        let idx = self.index(sample, feature);
        self.values[idx] += delta;
    }

    #[inline]
    pub fn base_value(&self, sample: usize) -> f64 {
        self.get(sample, self.n_features)
    }

    #[inline]
    pub fn set_base_value(&mut self, sample: usize, value: f64) {
        let idx = self.index(sample, self.n_features);
        self.values[idx] = value;
    }

    /// Feature contributions of one sample, without the base value.
    pub fn sample(&self, sample: usize) -> &[f64] {
        let start = self.index(sample, 0);
        &self.values[start..start + self.n_features]
    }

    /// Mutable feature contributions of one sample.
    pub(crate) fn sample_mut(&mut self, sample: usize) -> &mut [f64] {
        let start = self.index(sample, 0);
        let n = self.n_features;
        &mut self.values[start..start + n]
    }

    /// Base value plus every contribution of `sample`.
    pub fn prediction(&self, sample: usize) -> f64 {
        self.base_value(sample) + self.sample(sample).iter().sum::<f64>()
    }

    /// Check `base + Σφ ≈ prediction` for every sample.
    pub fn verify(&self, predictions: &[f64], tolerance: f64) -> bool {
        predictions.len() == self.n_samples
            && predictions
                .iter()
                .enumerate()
                .all(|(i, &p)| (self.prediction(i) - p).abs() <= tolerance)
    }

    /// Mean absolute contribution per feature.
    pub fn mean_abs(&self) -> Vec<f64> {
        let mut means = vec![0.0; self.n_features];
        if self.n_samples == 0 {
            return means;
        }
        for s in 0..self.n_samples {
            for (m, v) in means.iter_mut().zip(self.sample(s)) {
                *m += v.abs();
            }
        }
        let n = self.n_samples as f64;
        means.iter_mut().for_each(|m| *m /= n);
        means
    }
}
