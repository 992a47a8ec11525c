//! Groups a dataset split into mini-batches for iteration.

use crate::trainer::TrainingError;
use matrix::Matrix;
use mnist::{MnistData, PIXELS_PER_IMAGE};
use rand::seq::SliceRandom;
use rand::Rng;

/// Produces a restartable, per-epoch sequence of mini-batches over one
/// dataset split.
///
/// Each call to [`Batcher::shuffled`] reshuffles the index permutation and
/// yields every sample exactly once, so an epoch is a pass over the full
/// split sampled without replacement. The final batch of an epoch may be
/// smaller than the configured batch size.
pub struct Batcher<'a> {
    data: &'a MnistData,
    batch_size: usize,
    indices: Vec<usize>,
}

impl<'a> Batcher<'a> {
    /// Creates a batcher over `data`.
    ///
    /// # Errors
    /// Returns `TrainingError::ZeroBatchSize` if `batch_size` is zero.
    pub fn new(data: &'a MnistData, batch_size: usize) -> Result<Self, TrainingError> {
        if batch_size == 0 {
            return Err(TrainingError::ZeroBatchSize);
        }
        Ok(Self {
            data,
            batch_size,
            indices: (0..data.len()).collect(),
        })
    }

    /// Number of batches in one epoch.
    #[must_use]
    pub fn num_batches(&self) -> usize {
        self.data.len().div_ceil(self.batch_size)
    }

    /// Reshuffles the sample order and yields one epoch of
    /// `(images, labels)` batches.
    pub fn shuffled<'s, R: Rng>(
        &'s mut self,
        rng: &mut R,
    ) -> impl Iterator<Item = (Matrix, Vec<u8>)> + 's {
        self.indices.shuffle(rng);
        let data: &'s MnistData = self.data;
        self.indices
            .chunks(self.batch_size)
            .map(move |chunk| assemble(data, chunk))
    }

    /// Yields one epoch of batches in dataset order, for evaluation.
    pub fn ordered<'s>(&'s self) -> impl Iterator<Item = (Matrix, Vec<u8>)> + 's {
        let data: &'s MnistData = self.data;
        let batch_size = self.batch_size;
        (0..data.len()).step_by(batch_size).map(move |start| {
            let end = (start + batch_size).min(data.len());
            let chunk: Vec<usize> = (start..end).collect();
            assemble(data, &chunk)
        })
    }
}

/// Copies the samples at `indices` into one batch matrix and label vector.
fn assemble(data: &MnistData, indices: &[usize]) -> (Matrix, Vec<u8>) {
    let mut pixels = Vec::with_capacity(indices.len() * PIXELS_PER_IMAGE);
    let mut labels = Vec::with_capacity(indices.len());

    for &index in indices {
        let (image, label) = data.get(index).expect("Batch indices stay in range");
        pixels.extend_from_slice(image);
        labels.push(label);
    }

    (Matrix::new(indices.len(), PIXELS_PER_IMAGE, pixels), labels)
}
