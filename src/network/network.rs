use std::path::Path;

use rand::Rng;

use crate::error::{Error, Result};
use crate::layers::dense::{Layer, LayerCache, LayerGradients};
use crate::math::matrix::Matrix;
use crate::network::archive::ModelArchive;
use crate::network::prediction::Prediction;
use crate::network::spec::Topology;

/// The three-layer MLP and its six parameter arrays.
///
/// Layers are private so that the only ways to change weights are
/// construction, loading an archive and `apply_gradients`. A `Network` that
/// is not being trained can be shared freely (e.g. behind an `Arc`) because
/// the forward pass takes `&self`.
#[derive(Debug, Clone, PartialEq)]
pub struct Network {
    topology: Topology,
    layers: Vec<Layer>,
}

/// Everything the forward pass produced, kept for the backward pass.
#[derive(Debug, Clone)]
pub struct ForwardCache {
    pub layers: Vec<LayerCache>,
}

impl ForwardCache {
    /// Softmax probabilities of the output layer.
    pub fn output(&self) -> &Matrix {
        // A network always has three layers.
        &self.layers[self.layers.len() - 1].post
    }
}

impl Network {
    /// He-initialized weights and zero biases for every layer.
    pub fn new<R: Rng + ?Sized>(topology: Topology, rng: &mut R) -> Network {
        let layers = topology.layers().into_iter()
            .map(|spec| Layer::new(spec.size, spec.input_size, spec.activation, rng))
            .collect();
        Network { topology, layers }
    }

    /// Builds a network from explicit `(W, b)` pairs, input layer first.
    /// Shapes must match `topology` exactly.
    pub fn from_parameters(topology: Topology, params: [(Matrix, Matrix); 3]) -> Result<Network> {
        let mut layers = Vec::with_capacity(3);
        for (spec, (w, b)) in topology.layers().into_iter().zip(params) {
            if w.shape() != (spec.input_size, spec.size) || b.shape() != (1, spec.size) {
                return Err(Error::ShapeMismatch {
                    op: "network parameters",
                    left: w.shape(),
                    right: b.shape(),
                });
            }
            layers.push(Layer::from_parameters(w, b, spec.activation)?);
        }
        Ok(Network { topology, layers })
    }

    pub fn topology(&self) -> Topology {
        self.topology
    }

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    /// Batched forward pass; `input` is `m × topology.input`, the result is
    /// `m × topology.output` with every row a probability distribution.
    pub fn forward(&self, input: &Matrix) -> Result<Matrix> {
        let mut current = input.clone();
        for layer in &self.layers {
            current = layer.feed_from(&current)?.post;
        }
        Ok(current)
    }

    /// Forward pass that also retains `Z1, A1, Z2, A2, Z3` (and the output).
    pub fn forward_cached(&self, input: &Matrix) -> Result<ForwardCache> {
        let mut caches: Vec<LayerCache> = Vec::with_capacity(self.layers.len());
        for layer in &self.layers {
            let cache = match caches.last() {
                Some(prev) => layer.feed_from(&prev.post)?,
                None => layer.feed_from(input)?,
            };
            caches.push(cache);
        }
        Ok(ForwardCache { layers: caches })
    }

    /// Backpropagates `output_delta` (∂L/∂Z of the output layer) through
    /// every layer in reverse. Returns gradients ordered input layer first.
    pub fn backward(
        &self,
        input: &Matrix,
        cache: &ForwardCache,
        output_delta: &Matrix,
    ) -> Result<Vec<LayerGradients>> {
        let mut grads: Vec<LayerGradients> = Vec::with_capacity(self.layers.len());
        let mut upstream = output_delta.clone();

        for i in (0..self.layers.len()).rev() {
            let layer_input = if i == 0 { input } else { &cache.layers[i - 1].post };
            let (layer_grads, delta) = self.layers[i].compute_gradients(
                &upstream,
                layer_input,
                &cache.layers[i],
            )?;
            if i > 0 {
                // Propagate δ_i through the weights to get ∂L/∂A_{i-1}
                upstream = delta.matmul(&self.layers[i].weights.transpose())?;
            }
            grads.push(layer_grads);
        }

        grads.reverse();
        Ok(grads)
    }

    /// Applies one SGD step to every layer.
    pub fn apply_gradients(&mut self, grads: &[LayerGradients], lr: f64) -> Result<()> {
        for (layer, g) in self.layers.iter_mut().zip(grads) {
            layer.apply_gradients(g, lr)?;
        }
        Ok(())
    }

    /// Classifies a single `1 × input` row.
    pub fn predict(&self, input: &Matrix) -> Result<Prediction> {
        if input.rows != 1 {
            return Err(Error::ShapeMismatch {
                op: "predict",
                left: input.shape(),
                right: (1, self.topology.input),
            });
        }
        let probs = self.forward(input)?;
        Ok(Prediction::from_probabilities(probs.data))
    }

    /// The six named parameter arrays.
    pub fn to_archive(&self) -> ModelArchive {
        let mut archive = ModelArchive::default();
        for (i, layer) in self.layers.iter().enumerate() {
            archive.insert(format!("W{}", i + 1), layer.weights.clone());
            archive.insert(format!("b{}", i + 1), layer.biases.clone());
        }
        archive
    }

    /// Rebuilds a network from an archive, validating every shape against
    /// `topology`. Missing or mis-shaped entries are `CorruptModel`.
    pub fn from_archive(archive: &ModelArchive, topology: Topology) -> Result<Network> {
        let specs = topology.layers();
        let mut params: Vec<(Matrix, Matrix)> = Vec::with_capacity(3);
        for (i, spec) in specs.iter().enumerate() {
            let w = archive.expect_entry(&format!("W{}", i + 1), (spec.input_size, spec.size))?;
            let b = archive.expect_entry(&format!("b{}", i + 1), (1, spec.size))?;
            params.push((w.clone(), b.clone()));
        }
        let params: [(Matrix, Matrix); 3] = params.try_into()
            .map_err(|_| Error::CorruptModel("expected exactly three layers".to_owned()))?;
        Network::from_parameters(topology, params)
    }

    /// Writes the six parameter arrays to `path` (gzip if it ends in `.gz`).
    pub fn save_archive<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        self.to_archive().save(path)
    }

    /// Loads a digit-topology network from an archive previously written by
    /// `save_archive`.
    pub fn load_archive<P: AsRef<Path>>(path: P) -> Result<Network> {
        Network::load_archive_with(path, Topology::DIGITS)
    }

    pub fn load_archive_with<P: AsRef<Path>>(path: P, topology: Topology) -> Result<Network> {
        let archive = ModelArchive::load(path)?;
        Network::from_archive(&archive, topology)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loss::CrossEntropyLoss;
    use rand::{rngs::StdRng, SeedableRng};

    const SMALL: Topology = Topology::new(4, 5, 3, 2);

    fn batch() -> Matrix {
        Matrix::from_rows(vec![
            vec![0.1, 0.9, 0.3, 0.0],
            vec![0.8, 0.2, 0.5, 1.0],
            vec![0.0, 0.0, 0.7, 0.4],
        ])
        .unwrap()
    }

    #[test]
    fn new_network_has_zero_biases_and_right_shapes() {
        let net = Network::new(Topology::DIGITS, &mut StdRng::seed_from_u64(3));
        let shapes: Vec<_> = net.layers().iter().map(|l| (l.weights.shape(), l.biases.shape())).collect();
        assert_eq!(shapes, vec![((784, 256), (1, 256)), ((256, 128), (1, 128)), ((128, 10), (1, 10))]);
        assert!(net.layers().iter().all(|l| l.biases.data.iter().all(|&b| b == 0.0)));
    }

    #[test]
    fn backward_matches_finite_differences() {
        let mut rng = StdRng::seed_from_u64(11);
        let net = Network::new(SMALL, &mut rng);
        let x = batch();
        let labels = [1u8, 0, 1];

        let cache = net.forward_cached(&x).unwrap();
        let delta = CrossEntropyLoss::derivative(cache.output(), &labels).unwrap();
        let grads = net.backward(&x, &cache, &delta).unwrap();

        let h = 1e-6;
        for (li, (r, c)) in [(0usize, (2usize, 1usize)), (1, (4, 2)), (2, (1, 0))] {
            let mut plus = net.clone();
            let mut minus = net.clone();
            let w = plus.layers[li].weights.get(r, c);
            plus.layers[li].weights.set(r, c, w + h);
            minus.layers[li].weights.set(r, c, w - h);
            let lp = CrossEntropyLoss::loss(&plus.forward(&x).unwrap(), &labels).unwrap();
            let lm = CrossEntropyLoss::loss(&minus.forward(&x).unwrap(), &labels).unwrap();
            let numeric = (lp - lm) / (2.0 * h);
            let analytic = grads[li].weights.get(r, c);
            assert!((numeric - analytic).abs() < 1e-5, "layer {}: {} vs {}", li, numeric, analytic);
        }
    }

    #[test]
    fn predict_rejects_batches() {
        let net = Network::new(SMALL, &mut StdRng::seed_from_u64(1));
        assert!(matches!(net.predict(&batch()), Err(Error::ShapeMismatch { .. })));
    }
}
