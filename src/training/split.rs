//! Gain computation and exact greedy split finding.

use ndarray::ArrayView2;

use super::Gradients;
use crate::utils::Parallelism;

/// Splits must improve the objective by more than this.
const MIN_SPLIT_GAIN: f64 = 1e-6;

// =============================================================================
// Gain Parameters
// =============================================================================

/// Parameters for split gain computation and leaf weight calculation.
///
/// These parameters are static for the lifetime of training and control
/// regularization and splitting constraints.
#[derive(Clone, Debug, PartialEq)]
pub struct GainParams {
    /// L2 regularization (lambda).
    pub reg_lambda: f64,
    /// L1 regularization (alpha).
    pub reg_alpha: f64,
    /// Minimum split gain (gamma).
    pub min_gain: f64,
    /// Minimum sum of hessians per child.
    pub min_child_weight: f64,
}

impl Default for GainParams {
    fn default() -> Self {
        Self {
            reg_lambda: 1.0,
            reg_alpha: 0.0,
            min_gain: 0.0,
            min_child_weight: 1.0,
        }
    }
}

impl GainParams {
    /// L1 soft-threshold applied to a gradient sum.
    #[inline]
    fn threshold_l1(&self, g: f64) -> f64 {
        if self.reg_alpha <= 0.0 {
            g
        } else if g > self.reg_alpha {
            g - self.reg_alpha
        } else if g < -self.reg_alpha {
            g + self.reg_alpha
        } else {
            0.0
        }
    }

    /// Structure score of a node: `T(G)² / (H + λ)`.
    #[inline]
    fn score(&self, g: f64, h: f64) -> f64 {
        let t = self.threshold_l1(g);
        t * t / (h + self.reg_lambda)
    }

    /// Compute the split gain using XGBoost formula.
    ///
    /// ```text
    /// gain = 0.5 * [G_L²/(H_L + λ) + G_R²/(H_R + λ) - G_P²/(H_P + λ)] - γ
    /// ```
    ///
    /// With `α > 0` every `G` is soft-thresholded first.
    #[inline]
    pub fn compute_gain(
        &self,
        grad_left: f64,
        hess_left: f64,
        grad_right: f64,
        hess_right: f64,
        grad_parent: f64,
        hess_parent: f64,
    ) -> f64 {
        0.5 * (self.score(grad_left, hess_left) + self.score(grad_right, hess_right)
            - self.score(grad_parent, hess_parent))
            - self.min_gain
    }

    /// Optimal leaf weight `-T(G) / (H + λ)`.
    #[inline]
    pub fn compute_leaf_weight(&self, grad: f64, hess: f64) -> f64 {
        let denom = hess + self.reg_lambda;
        if denom <= 0.0 {
            return 0.0;
        }
        -self.threshold_l1(grad) / denom
    }

    /// Check if a split satisfies minimum constraints.
    #[inline]
    pub fn is_valid_split(&self, hess_left: f64, hess_right: f64, count_left: usize, count_right: usize) -> bool {
        count_left > 0
            && count_right > 0
            && hess_left >= self.min_child_weight
            && hess_right >= self.min_child_weight
    }
}

// =============================================================================
// SplitInfo
// =============================================================================

/// Best split found for a node.
#[derive(Clone, Debug, PartialEq)]
pub struct SplitInfo {
    pub feature: u32,
    /// Rows with `value < threshold` go left.
    pub threshold: f32,
    /// Direction of missing values.
    pub default_left: bool,
    pub gain: f64,
    pub hess_left: f64,
    pub hess_right: f64,
}

impl SplitInfo {
    /// Higher gain wins; ties go to the lower feature index.
    fn better_than(&self, other: &SplitInfo) -> bool {
        self.gain > other.gain || (self.gain == other.gain && self.feature < other.feature)
    }
}

fn pick_best(a: Option<SplitInfo>, b: Option<SplitInfo>) -> Option<SplitInfo> {
    match (a, b) {
        (Some(a), Some(b)) => Some(if b.better_than(&a) { b } else { a }),
        (a, b) => a.or(b),
    }
}

// =============================================================================
// Exact greedy splitter
// =============================================================================

/// Enumerates every distinct threshold of every candidate feature.
///
/// For each feature, present values are sorted and scanned once; missing
/// values are tried on both sides and the better side becomes the default
/// direction. Thresholds sit halfway between consecutive distinct values.
#[derive(Clone, Debug)]
pub struct GreedySplitter {
    params: GainParams,
}

impl GreedySplitter {
    pub fn new(params: GainParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &GainParams {
        &self.params
    }

    /// Best split of `rows` over `features`, if any improves the objective.
    pub fn find_split(
        &self,
        x: ArrayView2<'_, f32>,
        gradients: &Gradients,
        rows: &[u32],
        features: &[u32],
        parallelism: Parallelism,
    ) -> Option<SplitInfo> {
        let (g_total, h_total) = gradients.sum(rows);
        let per_feature = parallelism.maybe_par_map(features.to_vec(), |feature| {
            self.find_feature_split(x, gradients, rows, feature, g_total, h_total)
        });
        per_feature.into_iter().fold(None, pick_best)
    }

    fn find_feature_split(
        &self,
        x: ArrayView2<'_, f32>,
        gradients: &Gradients,
        rows: &[u32],
        feature: u32,
        g_total: f64,
        h_total: f64,
    ) -> Option<SplitInfo> {
        let col = x.column(feature as usize);

        let mut present: Vec<(f32, u32)> = Vec::with_capacity(rows.len());
        let (mut g_miss, mut h_miss, mut n_miss) = (0.0f64, 0.0f64, 0usize);
        for &r in rows {
            let v = col[r as usize];
            if v.is_nan() {
                let p = gradients.get(r as usize);
                g_miss += p.grad as f64;
                h_miss += p.hess as f64;
                n_miss += 1;
            } else {
                present.push((v, r));
            }
        }
        if present.len() < 2 {
            return None;
        }
        present.sort_by(|a, b| a.0.total_cmp(&b.0));

        let params = &self.params;
        let mut best: Option<SplitInfo> = None;
        let (mut g_left, mut h_left) = (0.0f64, 0.0f64);
        let n_present = present.len();

        for i in 0..n_present - 1 {
            let p = gradients.get(present[i].1 as usize);
            g_left += p.grad as f64;
            h_left += p.hess as f64;

            let (v, next) = (present[i].0, present[i + 1].0);
            if v == next {
                continue;
            }
            let n_left = i + 1;
            let n_right = n_present - n_left;

            // Missing values to the right.
            let (gl, hl) = (g_left, h_left);
            let (gr, hr) = (g_total - g_left, h_total - h_left);
            let right = params
                .is_valid_split(hl, hr, n_left, n_right + n_miss)
                .then(|| (params.compute_gain(gl, hl, gr, hr, g_total, h_total), hl, hr));

            // Missing values to the left.
            let left = if n_miss > 0 {
                let (gl, hl) = (g_left + g_miss, h_left + h_miss);
                let (gr, hr) = (g_total - gl, h_total - hl);
                params
                    .is_valid_split(hl, hr, n_left + n_miss, n_right)
                    .then(|| (params.compute_gain(gl, hl, gr, hr, g_total, h_total), hl, hr))
            } else {
                None
            };

            let candidate = match (left, right) {
                (Some(l), Some(r)) if l.0 > r.0 => Some((l, true)),
                (_, Some(r)) => Some((r, false)),
                (Some(l), None) => Some((l, true)),
                (None, None) => None,
            };
            let Some(((gain, hl, hr), missing_left)) = candidate else {
                continue;
            };
            if gain <= MIN_SPLIT_GAIN {
                continue;
            }

            // Without training-time missing values, unseen missing values
            // follow the heavier child.
            let default_left = if n_miss > 0 { missing_left } else { hl >= hr };

            let split = SplitInfo {
                feature,
                threshold: midpoint(v, next),
                default_left,
                gain,
                hess_left: hl,
                hess_right: hr,
            };
            if best.as_ref().is_none_or(|b| split.gain > b.gain) {
                best = Some(split);
            }
        }

        best
    }
}

/// Threshold strictly above `lo` and at most `hi`.
#[inline]
fn midpoint(lo: f32, hi: f32) -> f32 {
    let mid = ((lo as f64 + hi as f64) / 2.0) as f32;
    if mid > lo && mid <= hi { mid } else { hi }
}
