//! Objective (loss) functions.
//!
//! Only binary logistic loss is needed for loan approval; the
//! [`ObjectiveFn`] trait keeps the trainer independent of it.

use super::Gradients;

/// A twice-differentiable loss in margin space.
pub trait ObjectiveFn: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Optimal constant margin before any tree is added.
    fn compute_base_score(&self, targets: &[f32]) -> f64;

    /// Fill per-sample gradients and hessians for the current margins.
    fn compute_gradients(&self, margins: &[f64], targets: &[f32], gradients: &mut Gradients);

    /// Mean loss over all samples.
    fn loss(&self, margins: &[f64], targets: &[f32]) -> f64;

    /// Check a target value is admissible.
    fn is_valid_target(&self, target: f32) -> bool;
}

/// Logistic loss (log loss / binary cross-entropy) for binary classification.
///
/// Expects labels in {0, 1} and outputs log-odds.
/// - Loss: `-y*log(σ(m)) - (1-y)*log(1-σ(m))` where σ is sigmoid
/// - Gradient: `σ(m) - y`
/// - Hessian: `σ(m) * (1 - σ(m))`, floored at `1e-6`
#[derive(Debug, Clone, Copy, Default)]
pub struct LogisticLoss;

/// Numerically safe sigmoid.
#[inline]
pub fn sigmoid(x: f64) -> f64 {
    if x >= 0.0 {
        1.0 / (1.0 + (-x).exp())
    } else {
        let e = x.exp();
        e / (1.0 + e)
    }
}

impl ObjectiveFn for LogisticLoss {
    fn name(&self) -> &'static str {
        "logistic"
    }

    fn compute_base_score(&self, targets: &[f32]) -> f64 {
        if targets.is_empty() {
            return 0.0;
        }
        let pos: f64 = targets.iter().map(|&t| t as f64).sum();
        let p = (pos / targets.len() as f64).clamp(1e-7, 1.0 - 1e-7);
        (p / (1.0 - p)).ln()
    }

    fn compute_gradients(&self, margins: &[f64], targets: &[f32], gradients: &mut Gradients) {
        debug_assert_eq!(margins.len(), targets.len());
        const HESS_MIN: f64 = 1e-6;

        for (i, pair) in gradients.pairs_mut().iter_mut().enumerate() {
            let p = sigmoid(margins[i]);
            pair.grad = (p - targets[i] as f64) as f32;
            pair.hess = (p * (1.0 - p)).max(HESS_MIN) as f32;
        }
    }

    fn loss(&self, margins: &[f64], targets: &[f32]) -> f64 {
        if margins.is_empty() {
            return 0.0;
        }
        const EPS: f64 = 1e-15;
        let total: f64 = margins
            .iter()
            .zip(targets)
            .map(|(&m, &y)| {
                let p = sigmoid(m).clamp(EPS, 1.0 - EPS);
                let y = y as f64;
                -(y * p.ln() + (1.0 - y) * (1.0 - p).ln())
            })
            .sum();
        total / margins.len() as f64
    }

    fn is_valid_target(&self, target: f32) -> bool {
        target == 0.0 || target == 1.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn logistic_gradient_at_zero() {
        let obj = LogisticLoss;
        let mut grads = Gradients::new(2);
        obj.compute_gradients(&[0.0, 0.0], &[1.0, 0.0], &mut grads);
        assert_abs_diff_eq!(grads.get(0).grad, -0.5, epsilon = 1e-6);
        assert_abs_diff_eq!(grads.get(1).grad, 0.5, epsilon = 1e-6);
        assert_abs_diff_eq!(grads.get(0).hess, 0.25, epsilon = 1e-6);
    }

    #[test]
    fn hessian_is_floored() {
        let obj = LogisticLoss;
        let mut grads = Gradients::new(1);
        obj.compute_gradients(&[60.0], &[1.0], &mut grads);
        assert!(grads.get(0).hess >= 1e-6);
    }

    #[test]
    fn base_score_is_log_odds() {
        let obj = LogisticLoss;
        let base = obj.compute_base_score(&[1.0, 1.0, 1.0, 0.0]);
        assert_abs_diff_eq!(base, 3.0f64.ln(), epsilon = 1e-12);
        // Single-class targets stay finite.
        assert!(obj.compute_base_score(&[1.0, 1.0]).is_finite());
    }

    #[test]
    fn sigmoid_is_stable() {
        assert_abs_diff_eq!(sigmoid(0.0), 0.5);
        assert!(sigmoid(-800.0) >= 0.0);
        assert!(sigmoid(800.0) <= 1.0);
    }

    #[test]
    fn loss_decreases_toward_target() {
        let obj = LogisticLoss;
        let far = obj.loss(&[-2.0], &[1.0]);
        let near = obj.loss(&[2.0], &[1.0]);
        assert!(near < far);
    }
}
