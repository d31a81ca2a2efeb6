//! Gradient / hessian storage for single-output boosting.

/// One (gradient, hessian) pair.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct GradsTuple {
    pub grad: f32,
    pub hess: f32,
}

/// Per-sample gradient pairs for the current boosting round.
///
/// # Example
///
/// ```
/// use loanboost::training::Gradients;
///
/// let mut buffer = Gradients::new(100);
/// buffer.set(0, -0.5, 0.25);
/// assert_eq!(buffer.get(0).grad, -0.5);
/// ```
#[derive(Debug, Clone)]
pub struct Gradients {
    pairs: Vec<GradsTuple>,
}

impl Gradients {
    /// Create a zeroed buffer for `n_samples` samples.
    pub fn new(n_samples: usize) -> Self {
        Self {
            pairs: vec![GradsTuple::default(); n_samples],
        }
    }

    /// Number of samples in the buffer.
    #[inline]
    pub fn n_samples(&self) -> usize {
        self.pairs.len()
    }

    #[inline]
    pub fn get(&self, sample: usize) -> GradsTuple {
        self.pairs[sample]
    }

    #[inline]
    pub fn set(&mut self, sample: usize, grad: f32, hess: f32) {
        self.pairs[sample] = GradsTuple { grad, hess };
    }

    /// All pairs.
    #[inline]
    pub fn pairs(&self) -> &[GradsTuple] {
        &self.pairs
    }

    /// All pairs, mutable.
    #[inline]
    pub fn pairs_mut(&mut self) -> &mut [GradsTuple] {
        &mut self.pairs
    }

    /// Sum of gradients and hessians over a subset of rows (f64 accumulation).
    pub fn sum(&self, rows: &[u32]) -> (f64, f64) {
        rows.iter().fold((0.0, 0.0), |(g, h), &r| {
            let p = self.pairs[r as usize];
            (g + p.grad as f64, h + p.hess as f64)
        })
    }
}
