//! Adam parameter updates.

use matrix::Matrix;

/// The Adam update rule with bias-corrected first and second moments.
///
/// One state slot is kept per parameter matrix; slots are sized lazily on the
/// first step. The learning rate is fixed for the lifetime of the optimizer.
pub struct Adam {
    learning_rate: f64,
    beta1: f64,
    beta2: f64,
    epsilon: f64,
    step_count: i32,
    slots: Vec<Slot>,
}

/// First and second moment estimates for one parameter matrix
struct Slot {
    m: Matrix,
    v: Matrix,
}

impl Adam {
    /// Creates an optimizer with the conventional coefficients
    /// (beta1 = 0.9, beta2 = 0.999, epsilon = 1e-8).
    #[must_use]
    pub fn new(learning_rate: f64) -> Self {
        Self::with_coefficients(learning_rate, 0.9, 0.999, 1e-8)
    }

    #[must_use]
    pub fn with_coefficients(learning_rate: f64, beta1: f64, beta2: f64, epsilon: f64) -> Self {
        Self {
            learning_rate,
            beta1,
            beta2,
            epsilon,
            step_count: 0,
            slots: Vec::new(),
        }
    }

    /// Applies one update to every parameter in place.
    ///
    /// `params` and `grads` must line up pairwise, in the order the model's
    /// `parameters_mut` and `Gradients::as_refs` produce them.
    pub fn step(&mut self, params: [&mut Matrix; 4], grads: [&Matrix; 4]) {
        if self.slots.is_empty() {
            self.slots = params
                .iter()
                .map(|param| Slot {
                    m: Matrix::zeros(param.rows(), param.cols()),
                    v: Matrix::zeros(param.rows(), param.cols()),
                })
                .collect();
        }

        self.step_count += 1;
        let correction1 = 1.0 - self.beta1.powi(self.step_count);
        let correction2 = 1.0 - self.beta2.powi(self.step_count);

        for ((param, grad), slot) in params.into_iter().zip(grads).zip(self.slots.iter_mut()) {
            slot.m = slot
                .m
                .scale(self.beta1)
                .add(&grad.scale(1.0 - self.beta1));
            slot.v = slot
                .v
                .scale(self.beta2)
                .add(&grad.elementwise_multiply(grad).scale(1.0 - self.beta2));

            let m_hat = slot.m.scale(1.0 / correction1);
            let v_hat = slot.v.scale(1.0 / correction2);

            let denominator = v_hat.map(|x| x.sqrt() + self.epsilon);
            let update = m_hat
                .elementwise_divide(&denominator)
                .scale(self.learning_rate);

            *param = param.subtract(&update);
        }
    }
}
