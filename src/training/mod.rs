//! Gradient boosting training.
//!
//! - [`GBDTTrainer`]: the boosting loop over an [`ObjectiveFn`]
//! - [`TreeGrower`]: depth-wise growth with exact greedy splits
//! - [`TrainingLogger`]: structured logging with verbosity levels

mod gradients;
mod grower;
mod logger;
mod objective;
mod sampling;
mod split;
mod trainer;

pub use gradients::{Gradients, GradsTuple};
pub use grower::{GrowerParams, TreeGrower};
pub use logger::{TrainingLogger, Verbosity};
pub use objective::{sigmoid, LogisticLoss, ObjectiveFn};
pub use sampling::{ColumnSampler, RowSampler};
pub use split::{GainParams, GreedySplitter, SplitInfo};
pub use trainer::{GBDTParams, GBDTTrainer, TrainError};
