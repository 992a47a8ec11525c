//! Argmax accuracy over a dataset split.

use crate::batcher::Batcher;
use crate::trainer::TrainingError;
use matrix::Matrix;
use mlp::{Mlp, Mode};
use mnist::{MnistData, Split};
use std::fmt;

/// Counts from scoring one dataset split.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Evaluation {
    /// Samples whose predicted class matched the label
    pub correct: usize,
    /// Samples scored
    pub total: usize,
}

impl Evaluation {
    /// Accuracy as a percentage in `[0, 100]`.
    #[must_use]
    pub fn percent(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.correct as f64 / self.total as f64 * 100.0
    }
}

impl fmt::Display for Evaluation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Got {} / {} with accuracy {:.2}",
            self.correct,
            self.total,
            self.percent()
        )
    }
}

/// Gets the predicted class index for every row of a score matrix.
fn argmax_rows(scores: &Matrix) -> Vec<usize> {
    (0..scores.rows())
        .map(|i| {
            scores
                .row(i)
                .iter()
                .enumerate()
                .max_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap())
                .map(|(index, _)| index)
                .unwrap()
        })
        .collect()
}

/// Scores every batch of `data` once in `Eval` mode and counts correct
/// argmax predictions.
///
/// The model is not mutated in any way that affects its outputs, so calling
/// this twice without an intervening training step yields identical counts.
///
/// # Errors
/// Returns `TrainingError::EmptySplit` for a zero-sample split; accuracy
/// over nothing is undefined and must not divide by zero.
pub fn evaluate(
    model: &mut Mlp,
    data: &MnistData,
    batch_size: usize,
) -> Result<Evaluation, TrainingError> {
    if data.is_empty() {
        return Err(TrainingError::EmptySplit);
    }

    let batcher = Batcher::new(data, batch_size)?;
    let mut correct = 0;
    let mut total = 0;

    for (images, labels) in batcher.ordered() {
        let scores = model.forward(&images, Mode::Eval)?;
        for (prediction, &label) in argmax_rows(&scores).iter().zip(&labels) {
            if *prediction == label as usize {
                correct += 1;
            }
            total += 1;
        }
    }

    Ok(Evaluation { correct, total })
}

/// Prints which split is being checked and its accuracy line, then returns
/// the counts.
pub fn check_accuracy(
    model: &mut Mlp,
    data: &MnistData,
    split: Split,
    batch_size: usize,
) -> Result<Evaluation, TrainingError> {
    match split {
        Split::Train => println!("Checking accuracy on training data"),
        Split::Test => println!("Checking accuracy on test data"),
    }

    let evaluation = evaluate(model, data, batch_size)?;
    println!("{evaluation}");

    Ok(evaluation)
}
