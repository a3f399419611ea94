use crate::dataset::LabeledSet;
use crate::error::Result;
use crate::network::Network;

/// Rows per forward pass, to bound the size of intermediate activations.
const EVAL_CHUNK: usize = 1000;

/// Fraction of examples whose argmax prediction equals the label, in [0, 1].
pub fn accuracy(network: &Network, data: &LabeledSet) -> Result<f64> {
    if data.is_empty() {
        return Ok(0.0);
    }

    let mut correct = 0usize;
    for (start, chunk_labels) in (0..data.len()).step_by(EVAL_CHUNK).zip(data.labels.chunks(EVAL_CHUNK)) {
        let x = data.images.slice_rows(start, start + chunk_labels.len());
        let predicted = network.forward(&x)?.argmax_rows();
        correct += predicted.iter().zip(chunk_labels)
            .filter(|&(&p, &y)| p == y as usize)
            .count();
    }
    Ok(correct as f64 / data.len() as f64)
}
