//! Row and column sampling for boosting rounds.
//!
//! Both samplers draw from a seeded `Xoshiro256PlusPlus` stream so the same
//! seed reproduces the same forest. Selected indices are returned sorted.

use rand::seq::index;
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256PlusPlus;

/// Number of items kept for a ratio, at least one.
fn sample_size(n: usize, ratio: f32) -> usize {
    ((n as f64 * ratio as f64).ceil() as usize).clamp(1, n.max(1))
}

fn draw_sorted(rng: &mut Xoshiro256PlusPlus, n: usize, k: usize) -> Vec<u32> {
    if n == 0 {
        return Vec::new();
    }
    let mut picked: Vec<u32> = index::sample(rng, n, k).into_iter().map(|i| i as u32).collect();
    picked.sort_unstable();
    picked
}

// ============================================================================
// RowSampler
// ============================================================================

/// Picks the rows each tree is grown on (`subsample`).
#[derive(Debug, Clone)]
pub struct RowSampler {
    n_rows: usize,
    subsample: Option<f32>,
    rng: Xoshiro256PlusPlus,
}

impl RowSampler {
    /// `subsample` of `None` or `>= 1.0` keeps every row.
    pub fn new(n_rows: usize, subsample: Option<f32>, seed: u64) -> Self {
        Self {
            n_rows,
            subsample: subsample.filter(|&r| r < 1.0),
            rng: Xoshiro256PlusPlus::seed_from_u64(seed),
        }
    }

    #[inline]
    pub fn is_enabled(&self) -> bool {
        self.subsample.is_some()
    }

    /// Rows for the next round.
    pub fn sample(&mut self) -> Vec<u32> {
        match self.subsample {
            None => (0..self.n_rows as u32).collect(),
            Some(ratio) => {
                let k = sample_size(self.n_rows, ratio);
                draw_sorted(&mut self.rng, self.n_rows, k)
            }
        }
    }
}

// ============================================================================
// ColumnSampler
// ============================================================================

/// Picks the features each tree may split on (`colsample_bytree`).
#[derive(Debug, Clone)]
pub struct ColumnSampler {
    n_features: usize,
    colsample_bytree: Option<f32>,
    rng: Xoshiro256PlusPlus,
}

impl ColumnSampler {
    pub fn new(n_features: usize, colsample_bytree: Option<f32>, seed: u64) -> Self {
        // Separate stream from the row sampler.
        let seed = seed.wrapping_add(0x9E37_79B9_7F4A_7C15);
        Self {
            n_features,
            colsample_bytree: colsample_bytree.filter(|&r| r < 1.0),
            rng: Xoshiro256PlusPlus::seed_from_u64(seed),
        }
    }

    #[inline]
    pub fn is_enabled(&self) -> bool {
        self.colsample_bytree.is_some()
    }

    /// Features for the next tree.
    pub fn sample_for_tree(&mut self) -> Vec<u32> {
        match self.colsample_bytree {
            None => (0..self.n_features as u32).collect(),
            Some(ratio) => {
                let k = sample_size(self.n_features, ratio);
                draw_sorted(&mut self.rng, self.n_features, k)
            }
        }
    }
}
