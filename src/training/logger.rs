//! Training progress logging with verbosity levels.
//!
//! Output goes through `tracing`; [`Verbosity`] decides which events the
//! trainer emits at all, independent of the subscriber's filter.

use std::time::Instant;

use serde::{Deserialize, Serialize};

/// How chatty training is.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verbosity {
    /// No output.
    Silent,
    /// Warnings only.
    #[default]
    Warning,
    /// Start/finish summaries.
    Info,
    /// Per-round loss.
    Debug,
}

/// Emits training events according to a [`Verbosity`].
#[derive(Debug)]
pub struct TrainingLogger {
    verbosity: Verbosity,
    started: Option<Instant>,
    n_rounds: usize,
}

impl TrainingLogger {
    pub fn new(verbosity: Verbosity) -> Self {
        Self {
            verbosity,
            started: None,
            n_rounds: 0,
        }
    }

    pub fn verbosity(&self) -> Verbosity {
        self.verbosity
    }

    pub fn start_training(&mut self, n_rounds: usize, n_rows: usize, n_features: usize) {
        self.started = Some(Instant::now());
        self.n_rounds = n_rounds;
        if self.verbosity >= Verbosity::Info {
            tracing::info!(n_rounds, n_rows, n_features, "training started");
        }
    }

    pub fn log_base_score(&self, base_score: f64) {
        if self.verbosity >= Verbosity::Info {
            tracing::info!(base_score, "initial margin");
        }
    }

    pub fn log_round(&self, round: usize, loss: f64, n_leaves: usize) {
        if self.verbosity >= Verbosity::Debug {
            tracing::debug!(round, total = self.n_rounds, loss, n_leaves, "boosting round");
        }
    }

    pub fn warn(&self, message: &str) {
        if self.verbosity >= Verbosity::Warning {
            tracing::warn!("{message}");
        }
    }

    pub fn finish_training(&self, n_trees: usize, final_loss: f64) {
        if self.verbosity >= Verbosity::Info {
            let elapsed_ms = self.started.map(|t| t.elapsed().as_millis() as u64).unwrap_or(0);
            tracing::info!(n_trees, final_loss, elapsed_ms, "training finished");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbosity_ordering() {
        assert!(Verbosity::Debug > Verbosity::Info);
        assert!(Verbosity::Info > Verbosity::Warning);
        assert!(Verbosity::Warning > Verbosity::Silent);
        assert_eq!(Verbosity::default(), Verbosity::Warning);
    }

    #[test]
    fn verbosity_from_toml_string() {
        #[derive(Deserialize)]
        struct W {
            v: Verbosity,
        }
        let w: W = toml::from_str("v = \"debug\"").unwrap();
        assert_eq!(w.v, Verbosity::Debug);
    }
}
