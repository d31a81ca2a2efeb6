//! Human-facing summary of a single loan decision.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::{Contribution, Explanation};
use crate::model::DECISION_THRESHOLD;

/// Risk bucket derived from the approval probability.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

/// Approval probability above which an approved loan is low risk.
pub const LOW_RISK_THRESHOLD: f64 = 0.8;

impl RiskLevel {
    /// Rejected loans are `High`; approved ones are `Low` above
    /// [`LOW_RISK_THRESHOLD`] and `Medium` otherwise.
    pub fn from_probability(p: f64) -> Self {
        if p < DECISION_THRESHOLD {
            RiskLevel::High
        } else if p > LOW_RISK_THRESHOLD {
            RiskLevel::Low
        } else {
            RiskLevel::Medium
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RiskLevel::Low => "Low",
            RiskLevel::Medium => "Medium",
            RiskLevel::High => "High",
        })
    }
}

/// Approval outcome with confidence, risk and the factors behind it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LoanDecision {
    pub approved: bool,
    /// Probability of approval.
    pub probability: f64,
    /// Probability of the predicted outcome, in percent.
    pub confidence: f64,
    pub risk: RiskLevel,
    /// Largest contributions, strongest first.
    pub factors: Vec<Contribution>,
}

impl LoanDecision {
    pub fn from_explanation(explanation: &Explanation, top_k: usize) -> Self {
        let probability = explanation.probability();
        let approved = probability >= DECISION_THRESHOLD;
        let confidence = 100.0 * if approved { probability } else { 1.0 - probability };
        Self {
            approved,
            probability,
            confidence,
            risk: RiskLevel::from_probability(probability),
            factors: explanation.top_k(top_k),
        }
    }
}

impl fmt::Display for LoanDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let outcome = if self.approved { "APPROVED" } else { "REJECTED" };
        writeln!(f, "Decision:   {outcome}")?;
        writeln!(f, "Confidence: {:.1}%", self.confidence)?;
        writeln!(f, "Risk level: {}", self.risk)?;
        if self.factors.is_empty() {
            return Ok(());
        }
        writeln!(f, "Key factors:")?;
        let width = self.factors.iter().map(|c| c.feature.len()).max().unwrap_or(0);
        for c in &self.factors {
            writeln!(f, "  {:<width$}  {:>+9.4}  ({})", c.feature, c.value, c.effect)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::explainability::Effect;
    use approx::assert_abs_diff_eq;
    use rstest::rstest;

    #[rstest]
    #[case(0.95, RiskLevel::Low)]
    #[case(0.8001, RiskLevel::Low)]
    #[case(0.8, RiskLevel::Medium)]
    #[case(0.5, RiskLevel::Medium)]
    #[case(0.4999, RiskLevel::High)]
    #[case(0.45, RiskLevel::High)]
    #[case(0.1, RiskLevel::High)]
    fn risk_buckets(#[case] p: f64, #[case] expected: RiskLevel) {
        assert_eq!(RiskLevel::from_probability(p), expected);
    }

    #[test]
    fn rejected_confidence_uses_complement() {
        // margin = ln(1/4) → p = 0.2
        let e = Explanation::new(vec!["a".into(), "b".into()], vec![-1.0, 0.0], 1.0 + 0.25f64.ln());
        let d = LoanDecision::from_explanation(&e, 5);
        assert!(!d.approved);
        assert_abs_diff_eq!(d.probability, 0.2, epsilon = 1e-12);
        assert_abs_diff_eq!(d.confidence, 80.0, epsilon = 1e-9);
        assert_eq!(d.risk, RiskLevel::High);
        assert_eq!(d.factors.len(), 2);
        assert_eq!(d.factors[0].effect, Effect::Negative);
        assert_eq!(d.factors[1].effect, Effect::Neutral);
        assert!(d.to_string().contains("REJECTED"));
    }

    #[test]
    fn approved_loan_is_never_high_risk() {
        // margin = ln(3) → p = 0.75
        let e = Explanation::new(vec!["a".into()], vec![0.5], 3f64.ln() - 0.5);
        let d = LoanDecision::from_explanation(&e, 1);
        assert!(d.approved);
        assert_eq!(d.risk, RiskLevel::Medium);
    }
}
