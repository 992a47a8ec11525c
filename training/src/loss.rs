//! Softmax cross-entropy loss over a batch of class scores.

use matrix::Matrix;

/// Applies a numerically stable softmax to every row of `scores`.
///
/// Each row is shifted by its maximum before exponentiation so large logits
/// cannot overflow.
#[must_use]
pub fn softmax_rows(scores: &Matrix) -> Matrix {
    let mut data = Vec::with_capacity(scores.rows() * scores.cols());

    for i in 0..scores.rows() {
        let row = scores.row(i);
        let max = row.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let exps: Vec<f64> = row.iter().map(|&x| (x - max).exp()).collect();
        let sum: f64 = exps.iter().sum();
        data.extend(exps.iter().map(|&e| e / sum));
    }

    Matrix::new(scores.rows(), scores.cols(), data)
}

/// Mean cross-entropy between class scores and integer labels.
///
/// # Arguments
/// * `scores` - One row of logits per sample
/// * `labels` - One digit label per row of `scores`
///
/// # Returns
/// The scalar loss averaged over the batch, and the gradient of that loss
/// with respect to the scores: `(softmax(scores) - onehot(labels)) / rows`.
/// The gradient is what the model's backward pass consumes.
#[must_use]
pub fn cross_entropy(scores: &Matrix, labels: &[u8]) -> (f64, Matrix) {
    assert_eq!(
        scores.rows(),
        labels.len(),
        "Score rows must match label count"
    );
    assert!(!labels.is_empty(), "Cross-entropy needs at least one sample");

    let batch = labels.len() as f64;
    let probabilities = softmax_rows(scores);

    let mut loss = 0.0;
    let mut grad = probabilities.data().to_vec();
    for (i, &label) in labels.iter().enumerate() {
        let p = probabilities.get(i, label as usize);
        loss -= p.max(1e-12).ln();
        grad[i * scores.cols() + label as usize] -= 1.0;
    }

    let grad_scores = Matrix::new(scores.rows(), scores.cols(), grad).scale(1.0 / batch);
    (loss / batch, grad_scores)
}
