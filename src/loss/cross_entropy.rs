use crate::error::{Error, Result};
use crate::math::matrix::Matrix;

/// Categorical cross-entropy loss for use with a Softmax output layer.
pub struct CrossEntropyLoss;

/// Small epsilon added inside log() so a probability that underflowed to zero
/// does not produce `-inf`.
const EPS: f64 = 1e-9;

impl CrossEntropyLoss {
    /// Mean cross-entropy over the batch:
    ///   L = -mean(log(predicted[i, label_i] + eps))
    ///
    /// `predicted` — softmax probabilities, shape `m × n_classes`
    /// `labels`    — true class index per row, length `m`
    pub fn loss(predicted: &Matrix, labels: &[u8]) -> Result<f64> {
        check_labels(predicted, labels)?;
        if labels.is_empty() {
            return Ok(0.0);
        }
        let total: f64 = labels.iter().enumerate()
            .map(|(i, &y)| -(predicted.get(i, y as usize) + EPS).ln())
            .sum();
        Ok(total / labels.len() as f64)
    }

    /// Gradient of the mean loss w.r.t. the pre-softmax logits.
    ///
    /// With Softmax and cross-entropy composed the gradient simplifies to
    ///   ∂L/∂z = (predicted - one_hot(labels)) / m
    ///
    /// This is the initial delta of the backward pass; the Softmax layer's own
    /// derivative is the identity so it is not applied twice.
    pub fn derivative(predicted: &Matrix, labels: &[u8]) -> Result<Matrix> {
        check_labels(predicted, labels)?;
        let m = labels.len().max(1) as f64;
        let mut delta = predicted.clone();
        for (i, &y) in labels.iter().enumerate() {
            let v = delta.get(i, y as usize) - 1.0;
            delta.set(i, y as usize, v);
        }
        Ok(delta.scale(1.0 / m))
    }
}

fn check_labels(predicted: &Matrix, labels: &[u8]) -> Result<()> {
    if predicted.rows != labels.len() {
        return Err(Error::ShapeMismatch {
            op: "cross_entropy",
            left: predicted.shape(),
            right: (labels.len(), 1),
        });
    }
    if let Some(&bad) = labels.iter().find(|&&y| y as usize >= predicted.cols) {
        return Err(Error::Dataset(format!(
            "label {} is out of range for {} classes",
            bad, predicted.cols
        )));
    }
    Ok(())
}
