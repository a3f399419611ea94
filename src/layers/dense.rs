use rand::Rng;
use serde::{Serialize, Deserialize};

use crate::{activation::activation::ActivationFunction, error::Result, math::matrix::Matrix};

/// Fully connected layer: `a = activation(input · W + b)`.
///
/// `weights` is `input_size × size`, `biases` is `1 × size`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Layer {
    pub size: usize,
    pub weights: Matrix,
    pub biases: Matrix,
    pub activator: ActivationFunction,
}

/// Values a forward pass keeps around for the backward pass.
#[derive(Debug, Clone)]
pub struct LayerCache {
    /// Pre-activation `z = input · W + b`.
    pub pre: Matrix,
    /// Activation `a = f(z)`.
    pub post: Matrix,
}

/// Gradients of the batch loss w.r.t. one layer's parameters.
#[derive(Debug, Clone)]
pub struct LayerGradients {
    pub weights: Matrix,
    pub biases: Matrix,
}

impl Layer {
    /// He-initialized weights, zero biases.
    pub fn new<R: Rng + ?Sized>(
        size: usize,
        input_size: usize,
        activation: ActivationFunction,
        rng: &mut R,
    ) -> Layer {
        Layer {
            size,
            weights: Matrix::he(input_size, size, rng),
            biases: Matrix::zeros(1, size),
            activator: activation,
        }
    }

    /// Wraps existing parameters, checking that they agree with each other.
    pub fn from_parameters(
        weights: Matrix,
        biases: Matrix,
        activation: ActivationFunction,
    ) -> Result<Layer> {
        if biases.rows != 1 || biases.cols != weights.cols {
            return Err(crate::Error::ShapeMismatch {
                op: "layer parameters",
                left: weights.shape(),
                right: biases.shape(),
            });
        }
        Ok(Layer { size: weights.cols, weights, biases, activator: activation })
    }

    pub fn input_size(&self) -> usize {
        self.weights.rows
    }

    /// Batched forward pass; `input` is `m × input_size`.
    pub fn feed_from(&self, input: &Matrix) -> Result<LayerCache> {
        let pre = input.matmul(&self.weights)?.add_row_broadcast(&self.biases)?;
        let post = self.activator.apply(&pre);
        Ok(LayerCache { pre, post })
    }

    /// Computes parameter gradients for this layer.
    ///
    /// `upstream` is ∂L/∂a for this layer's output, `inputs` is the batch this
    /// layer was fed and `cache` is what `feed_from` returned for it.
    /// Returns the gradients together with δ = ∂L/∂z, which the caller
    /// propagates to the previous layer as `δ · Wᵗ`.
    pub fn compute_gradients(
        &self,
        upstream: &Matrix,
        inputs: &Matrix,
        cache: &LayerCache,
    ) -> Result<(LayerGradients, Matrix)> {
        // Use pre-activation z so that derivative(z) = σ'(z) is computed correctly
        let act_derivative = self.activator.derivative(&cache.pre);
        let delta = upstream.hadamard(&act_derivative)?;

        let grads = LayerGradients {
            weights: inputs.transpose().matmul(&delta)?,
            biases: delta.column_sum(),
        };
        Ok((grads, delta))
    }

    /// Applies pre-computed gradients scaled by lr, in place.
    pub fn apply_gradients(&mut self, grads: &LayerGradients, lr: f64) -> Result<()> {
        self.weights.sub_scaled_assign(&grads.weights, lr)?;
        self.biases.sub_scaled_assign(&grads.biases, lr)
    }
}
