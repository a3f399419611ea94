use crate::{error::Result, layers::dense::LayerGradients, network::network::Network};

/// Plain stochastic gradient descent: no momentum, no weight decay.
pub struct Sgd {
    pub learning_rate: f64,
}

impl Sgd {
    pub fn new(learning_rate: f64) -> Sgd {
        Sgd { learning_rate }
    }

    /// Applies one update `θ -= lr · ∇θ` to every layer, in place.
    /// `grads` is ordered input layer first, as `Network::backward` returns it.
    pub fn step(&self, network: &mut Network, grads: &[LayerGradients]) -> Result<()> {
        network.apply_gradients(grads, self.learning_rate)
    }
}
