use serde::{Serialize, Deserialize};

use crate::math::matrix::Matrix;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActivationFunction {
    ReLU,
    /// Softmax is a row-wise activation; `apply()` handles it at the matrix
    /// level. It is only ever used on the output layer together with
    /// cross-entropy loss.
    Softmax,
}

impl ActivationFunction {
    /// Applies the activation to a batch of pre-activations (one sample per row).
    pub fn apply(&self, z: &Matrix) -> Matrix {
        match self {
            ActivationFunction::ReLU => relu(z),
            ActivationFunction::Softmax => softmax(z),
        }
    }

    /// Element-wise derivative, evaluated on the cached pre-activation.
    ///
    /// For `Softmax` the loss already hands back the combined
    /// softmax + cross-entropy gradient w.r.t. the logits, so this returns
    /// `1.0` and the Hadamard product in `Layer::compute_gradients()` passes
    /// that delta through unchanged.
    pub fn derivative(&self, z: &Matrix) -> Matrix {
        match self {
            ActivationFunction::ReLU => relu_grad(z),
            ActivationFunction::Softmax => z.map(|_| 1.0),
        }
    }
}

/// `max(0, x)` element-wise.
pub fn relu(x: &Matrix) -> Matrix {
    x.max_scalar(0.0)
}

/// `1 if x > 0 else 0` element-wise.
pub fn relu_grad(x: &Matrix) -> Matrix {
    x.greater_than(0.0)
}

/// Row-wise softmax.
///
/// Each row is shifted by its maximum before exponentiating, so every
/// exponent is `<= 0` and nothing overflows however large the logits are.
pub fn softmax(x: &Matrix) -> Matrix {
    let row_max = x.rowwise_max();
    let mut exp = x.clone();
    for i in 0..exp.rows {
        let m = row_max.data[i];
        for j in 0..exp.cols {
            let v = (exp.get(i, j) - m).exp();
            exp.set(i, j, v);
        }
    }

    let row_sum = exp.rowwise_sum();
    for i in 0..exp.rows {
        let s = row_sum.data[i];
        for j in 0..exp.cols {
            let v = exp.get(i, j) / s;
            exp.set(i, j, v);
        }
    }
    exp
}
