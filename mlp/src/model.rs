use anyhow::{anyhow, Result};
use matrix::Matrix;
use rand::Rng;

/// Execution mode consumed by the forward pass.
///
/// `Train` caches the intermediate activations that [`Mlp::backward`] needs;
/// `Eval` is pure inference and leaves no cached state behind, so evaluating
/// the same batch repeatedly always produces identical scores.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mode {
    Train,
    Eval,
}

/// A two-layer fully-connected network mapping flattened images to class
/// scores.
///
/// The forward pass computes `relu(X·W1 + b1)·W2 + b2` over a batch matrix
/// whose rows are samples. The output is a row of unnormalized logits per
/// sample; softmax is the loss function's concern, not the model's.
///
/// # Examples
///
/// ```
/// use matrix::Matrix;
/// use mlp::{Mlp, Mode};
/// use rand::{rngs::StdRng, SeedableRng};
///
/// let mut rng = StdRng::seed_from_u64(0);
/// let mut model = Mlp::new(&mut rng, 4, 8, 3);
///
/// let batch = Matrix::zeros(2, 4);
/// let scores = model.forward(&batch, Mode::Eval).unwrap();
/// assert_eq!((scores.rows(), scores.cols()), (2, 3));
/// ```
pub struct Mlp {
    /// First layer weights, `input_size x hidden_size`
    w1: Matrix,
    /// First layer bias, `1 x hidden_size`
    b1: Matrix,
    /// Second layer weights, `hidden_size x num_classes`
    w2: Matrix,
    /// Second layer bias, `1 x num_classes`
    b2: Matrix,
    /// Activations cached by the last `Train`-mode forward pass
    cache: Option<ForwardCache>,
}

struct ForwardCache {
    /// Hidden pre-activations `X·W1 + b1`, kept for the ReLU derivative
    pre_activation: Matrix,
    /// Hidden activations `relu(pre_activation)`
    hidden: Matrix,
}

/// Parameter gradients produced by one backward pass, in the same shapes as
/// the parameters they belong to.
pub struct Gradients {
    pub w1: Matrix,
    pub b1: Matrix,
    pub w2: Matrix,
    pub b2: Matrix,
}

impl Gradients {
    /// Gradients in parameter order, matching [`Mlp::parameters_mut`].
    #[must_use]
    pub fn as_refs(&self) -> [&Matrix; 4] {
        [&self.w1, &self.b1, &self.w2, &self.b2]
    }
}

impl Mlp {
    /// Creates a network with uniformly initialized weights and zero biases.
    ///
    /// Weights are drawn from `-1/sqrt(fan_in)..1/sqrt(fan_in)` using the
    /// caller's RNG, so a seeded RNG gives reproducible parameters.
    pub fn new<R: Rng>(
        rng: &mut R,
        input_size: usize,
        hidden_size: usize,
        num_classes: usize,
    ) -> Self {
        let w1_limit = 1.0 / (input_size as f64).sqrt();
        let w2_limit = 1.0 / (hidden_size as f64).sqrt();

        Self {
            w1: Matrix::random_uniform(input_size, hidden_size, w1_limit, rng),
            b1: Matrix::zeros(1, hidden_size),
            w2: Matrix::random_uniform(hidden_size, num_classes, w2_limit, rng),
            b2: Matrix::zeros(1, num_classes),
            cache: None,
        }
    }

    /// Assembles a network from existing parameters.
    ///
    /// Panics if the shapes do not describe a consistent two-layer network.
    #[must_use]
    pub fn from_parts(w1: Matrix, b1: Matrix, w2: Matrix, b2: Matrix) -> Self {
        assert_eq!(b1.rows(), 1, "b1 must be a row vector");
        assert_eq!(b2.rows(), 1, "b2 must be a row vector");
        assert_eq!(w1.cols(), b1.cols(), "w1 and b1 widths must match");
        assert_eq!(w1.cols(), w2.rows(), "hidden sizes of w1 and w2 must match");
        assert_eq!(w2.cols(), b2.cols(), "w2 and b2 widths must match");

        Self {
            w1,
            b1,
            w2,
            b2,
            cache: None,
        }
    }

    #[must_use]
    pub fn input_size(&self) -> usize {
        self.w1.rows()
    }

    #[must_use]
    pub fn num_classes(&self) -> usize {
        self.w2.cols()
    }

    /// Computes class scores for a batch of flattened inputs.
    ///
    /// # Arguments
    /// * `input` - Batch matrix, one sample per row
    /// * `mode` - `Train` to cache activations for `backward`, `Eval` for
    ///   pure inference
    ///
    /// # Returns
    /// A `input.rows() x num_classes` matrix of logits.
    ///
    /// # Errors
    /// Returns an error if the input width does not match the configured
    /// feature count. Callers treat this as fatal.
    pub fn forward(&mut self, input: &Matrix, mode: Mode) -> Result<Matrix> {
        if input.cols() != self.input_size() {
            return Err(anyhow!(
                "Invalid input width: expected {}, got {}",
                self.input_size(),
                input.cols()
            ));
        }

        let pre_activation = input.dot_multiply(&self.w1).add_row_vector(&self.b1);
        let hidden = pre_activation.map(|x| x.max(0.0));
        let scores = hidden.dot_multiply(&self.w2).add_row_vector(&self.b2);

        self.cache = match mode {
            Mode::Train => Some(ForwardCache {
                pre_activation,
                hidden,
            }),
            Mode::Eval => None,
        };

        Ok(scores)
    }

    /// Computes parameter gradients from the score gradients of the last
    /// `Train`-mode forward pass.
    ///
    /// # Arguments
    /// * `input` - The same batch that was passed to `forward`
    /// * `grad_scores` - Gradient of the loss with respect to the scores
    ///
    /// # Errors
    /// Returns an error if no `Train`-mode forward pass preceded this call.
    pub fn backward(&self, input: &Matrix, grad_scores: &Matrix) -> Result<Gradients> {
        let cache = self
            .cache
            .as_ref()
            .ok_or_else(|| anyhow!("backward requires a preceding Train-mode forward pass"))?;

        let grad_w2 = cache.hidden.transpose().dot_multiply(grad_scores);
        let grad_b2 = grad_scores.column_sums();

        let grad_hidden = grad_scores.dot_multiply(&self.w2.transpose());
        let relu_mask = cache
            .pre_activation
            .map(|x| if x > 0.0 { 1.0 } else { 0.0 });
        let grad_pre = grad_hidden.elementwise_multiply(&relu_mask);

        let grad_w1 = input.transpose().dot_multiply(&grad_pre);
        let grad_b1 = grad_pre.column_sums();

        Ok(Gradients {
            w1: grad_w1,
            b1: grad_b1,
            w2: grad_w2,
            b2: grad_b2,
        })
    }

    /// Mutable references to all parameters, in the order matching
    /// [`Gradients::as_refs`]. Used by the optimizer for in-place updates.
    pub fn parameters_mut(&mut self) -> [&mut Matrix; 4] {
        [&mut self.w1, &mut self.b1, &mut self.w2, &mut self.b2]
    }

    /// Immutable view of all parameters, in the same order.
    #[must_use]
    pub fn parameters(&self) -> [&Matrix; 4] {
        [&self.w1, &self.b1, &self.w2, &self.b2]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use matrix::matrix;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn create_test_model() -> Mlp {
        let mut rng = StdRng::seed_from_u64(3);
        Mlp::new(&mut rng, 4, 6, 3)
    }

    #[test]
    fn test_forward_shape() -> Result<()> {
        let mut model = create_test_model();
        let batch = Matrix::zeros(5, 4);

        let scores = model.forward(&batch, Mode::Eval)?;

        assert_eq!(scores.rows(), 5);
        assert_eq!(scores.cols(), 3);
        Ok(())
    }

    #[test]
    fn test_forward_rejects_wrong_width() {
        let mut model = create_test_model();
        let batch = Matrix::zeros(2, 7);

        let result = model.forward(&batch, Mode::Eval);
        assert!(result.is_err());
    }

    #[test]
    fn test_forward_is_deterministic() -> Result<()> {
        let mut model = create_test_model();
        let batch = Matrix::new(2, 4, vec![0.5, -0.2, 0.1, 0.9, 1.0, 0.0, -0.4, 0.3]);

        let first = model.forward(&batch, Mode::Eval)?;
        for _ in 0..5 {
            let scores = model.forward(&batch, Mode::Eval)?;
            assert_eq!(scores, first);
        }
        Ok(())
    }

    #[test]
    fn test_train_and_eval_modes_agree_on_scores() -> Result<()> {
        let mut model = create_test_model();
        let batch = Matrix::new(2, 4, vec![0.5, -0.2, 0.1, 0.9, 1.0, 0.0, -0.4, 0.3]);

        let train_scores = model.forward(&batch, Mode::Train)?;
        let eval_scores = model.forward(&batch, Mode::Eval)?;

        assert_eq!(train_scores, eval_scores);
        Ok(())
    }

    #[test]
    fn test_backward_requires_train_mode() -> Result<()> {
        let mut model = create_test_model();
        let batch = Matrix::zeros(2, 4);
        let grad_scores = Matrix::zeros(2, 3);

        // Never ran forward at all
        assert!(model.backward(&batch, &grad_scores).is_err());

        // An eval pass clears any cached activations
        model.forward(&batch, Mode::Train)?;
        model.forward(&batch, Mode::Eval)?;
        assert!(model.backward(&batch, &grad_scores).is_err());

        Ok(())
    }

    #[test]
    fn test_backward_gradient_shapes() -> Result<()> {
        let mut model = create_test_model();
        let batch = Matrix::new(2, 4, vec![0.5, -0.2, 0.1, 0.9, 1.0, 0.0, -0.4, 0.3]);

        model.forward(&batch, Mode::Train)?;
        let grad_scores = Matrix::new(2, 3, vec![0.1; 6]);
        let grads = model.backward(&batch, &grad_scores)?;

        assert_eq!((grads.w1.rows(), grads.w1.cols()), (4, 6));
        assert_eq!((grads.b1.rows(), grads.b1.cols()), (1, 6));
        assert_eq!((grads.w2.rows(), grads.w2.cols()), (6, 3));
        assert_eq!((grads.b2.rows(), grads.b2.cols()), (1, 3));
        Ok(())
    }

    #[test]
    fn test_from_parts_computes_expected_scores() -> Result<()> {
        // Identity-ish network small enough to verify by hand:
        // hidden = relu(x * w1 + b1), scores = hidden * w2 + b2
        let w1 = matrix![
            1.0, 0.0;
            0.0, -1.0
        ];
        let b1 = matrix![0.0, 0.0];
        let w2 = matrix![
            2.0;
            3.0
        ];
        let b2 = matrix![1.0];
        let mut model = Mlp::from_parts(w1, b1, w2, b2);

        // Row 1: x*w1 = [1, -2], relu -> [1, 0], scores = 1*2 + 0*3 + 1 = 3
        // Row 2: x*w1 = [-1, -2], relu -> [0, 0], scores = 0 + 1 = 1
        let batch = matrix![
            1.0, 2.0;
            -1.0, 2.0
        ];
        let scores = model.forward(&batch, Mode::Eval)?;

        assert_eq!(scores.get(0, 0), 3.0);
        assert_eq!(scores.get(1, 0), 1.0);
        Ok(())
    }

    #[test]
    #[should_panic(expected = "hidden sizes of w1 and w2 must match")]
    fn test_from_parts_rejects_mismatched_shapes() {
        let _ = Mlp::from_parts(
            Matrix::zeros(4, 6),
            Matrix::zeros(1, 6),
            Matrix::zeros(5, 3),
            Matrix::zeros(1, 3),
        );
    }
}
