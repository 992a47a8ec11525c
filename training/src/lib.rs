//! Training infrastructure for the digit classifier.
//!
//! This crate wires the pieces of one training run together:
//! - Mini-batch sampling with per-epoch shuffling (`Batcher`)
//! - Softmax cross-entropy loss with score gradients (`loss`)
//! - The Adam update rule (`Adam`)
//! - The fixed-epoch training loop (`Trainer`)
//! - Argmax accuracy reporting (`evaluate`, `check_accuracy`)

// Modules
mod batcher;
mod evaluate;
mod loss;
mod optimizer;
mod trainer;

pub use batcher::Batcher;
pub use evaluate::{check_accuracy, evaluate, Evaluation};
pub use loss::{cross_entropy, softmax_rows};
pub use optimizer::Adam;
pub use trainer::{Trainer, TrainingConfig, TrainingError};
