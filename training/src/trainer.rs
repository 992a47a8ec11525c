//! The fixed-epoch training loop.

use crate::batcher::Batcher;
use crate::loss::cross_entropy;
use crate::optimizer::Adam;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use mlp::{Mlp, Mode};
use mnist::{MnistData, NUM_CLASSES, PIXELS_PER_IMAGE};
use rand::rngs::StdRng;
use rand::SeedableRng;
use thiserror::Error;

/// Errors surfaced by the training and evaluation paths.
#[derive(Debug, Error)]
pub enum TrainingError {
    /// A batch size of zero cannot partition a dataset
    #[error("Batch size must be nonzero")]
    ZeroBatchSize,
    /// Accuracy over zero samples is undefined
    #[error("Cannot evaluate an empty split")]
    EmptySplit,
    /// Forward or backward pass failure, e.g. an input width mismatch
    #[error(transparent)]
    Model(#[from] anyhow::Error),
}

/// Hyperparameters for one training run.
///
/// Passed explicitly into [`Trainer::new`]; there is no process-wide state.
#[derive(Debug, Clone)]
pub struct TrainingConfig {
    /// Number of nodes in the hidden layer
    pub hidden_size: usize,
    /// Fixed learning rate for the Adam update rule
    pub learning_rate: f64,
    /// Size of each training batch
    pub batch_size: usize,
    /// Number of passes over the full training split
    pub epochs: u32,
    /// Seed for parameter initialization and epoch shuffling
    pub seed: u64,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            hidden_size: 50,
            learning_rate: 0.001,
            batch_size: 64,
            epochs: 1,
            seed: 42,
        }
    }
}

/// Drives the forward/backward/update cycle over mini-batches.
///
/// The trainer owns the model, the optimizer, and the seeded RNG, so two
/// trainers built from the same configuration produce identical runs on the
/// same data.
pub struct Trainer {
    model: Mlp,
    optimizer: Adam,
    config: TrainingConfig,
    rng: StdRng,
    epoch_losses: Vec<f64>,
}

impl Trainer {
    /// Creates a trainer with a freshly initialized network.
    ///
    /// # Arguments
    /// * `config` - Training configuration parameters
    #[must_use]
    pub fn new(config: TrainingConfig) -> Self {
        let mut rng = StdRng::seed_from_u64(config.seed);
        let model = Mlp::new(&mut rng, PIXELS_PER_IMAGE, config.hidden_size, NUM_CLASSES);
        let optimizer = Adam::new(config.learning_rate);

        Self {
            model,
            optimizer,
            config,
            rng,
            epoch_losses: Vec::new(),
        }
    }

    #[must_use]
    pub fn model(&self) -> &Mlp {
        &self.model
    }

    pub fn model_mut(&mut self) -> &mut Mlp {
        &mut self.model
    }

    /// Average training loss recorded for each completed epoch
    #[must_use]
    pub fn epoch_losses(&self) -> &[f64] {
        &self.epoch_losses
    }

    /// Trains the network on `data` for the configured number of epochs.
    ///
    /// Each epoch reshuffles the split, then for every batch runs a
    /// `Train`-mode forward pass, computes the cross-entropy loss and its
    /// score gradients, backpropagates to parameter gradients, and applies
    /// one Adam step in place. There is no early stopping and no convergence
    /// check; the loop always runs to the configured epoch count.
    ///
    /// # Errors
    /// Returns `TrainingError::ZeroBatchSize` for a zero batch size, or a
    /// model error if a batch has the wrong width.
    pub fn train(&mut self, data: &MnistData) -> Result<(), TrainingError> {
        let mut batcher = Batcher::new(data, self.config.batch_size)?;

        let multi_progress = MultiProgress::new();
        let epoch_style = create_progress_style(
            "{spinner:.green} [{elapsed_precise}] {bar:40.cyan/blue} {pos:>7}/{len:7} Epoch {msg}",
        );
        let batch_style = create_progress_style(
            "{spinner:.yellow} [{elapsed_precise}] {bar:40.yellow/blue} {pos:>7}/{len:7} Batch {msg}",
        );

        let epoch_progress = multi_progress.add(ProgressBar::new(u64::from(self.config.epochs)));
        let batch_progress = multi_progress.add(ProgressBar::new(0));
        epoch_progress.set_style(epoch_style);
        batch_progress.set_style(batch_style);

        println!(
            "\nStarting training with batch size {}",
            self.config.batch_size
        );

        for epoch in 1..=self.config.epochs {
            batch_progress.set_length(batcher.num_batches() as u64);
            batch_progress.set_position(0);
            batch_progress.set_message(format!("in Epoch {epoch}"));

            let mut epoch_loss = 0.0;
            let mut batches = 0usize;

            for (images, labels) in batcher.shuffled(&mut self.rng) {
                let scores = self.model.forward(&images, Mode::Train)?;
                let (loss, grad_scores) = cross_entropy(&scores, &labels);
                let grads = self.model.backward(&images, &grad_scores)?;
                self.optimizer.step(self.model.parameters_mut(), grads.as_refs());

                epoch_loss += loss;
                batches += 1;
                batch_progress.inc(1);
            }

            let avg_loss = if batches == 0 {
                0.0
            } else {
                epoch_loss / batches as f64
            };
            self.epoch_losses.push(avg_loss);

            epoch_progress.set_message(format!("- Loss: {avg_loss:.4}"));
            epoch_progress.inc(1);
        }

        epoch_progress.finish_with_message("Training completed!");
        batch_progress.finish_and_clear();

        Ok(())
    }
}

/// Creates a progress bar style with the specified template.
fn create_progress_style(template: &str) -> ProgressStyle {
    ProgressStyle::with_template(template)
        .expect("Progress bar template must be valid")
        .progress_chars("##-")
}
