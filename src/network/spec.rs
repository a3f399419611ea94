use serde::{Serialize, Deserialize};

use crate::activation::activation::ActivationFunction;

/// Layer widths of the fixed three-layer MLP.
///
/// The architecture is always `input → hidden1 (ReLU) → hidden2 (ReLU) →
/// output (Softmax)`; only the widths vary. Production code uses
/// [`Topology::DIGITS`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Topology {
    pub input: usize,
    pub hidden1: usize,
    pub hidden2: usize,
    pub output: usize,
}

/// Describes one layer of a [`Topology`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayerSpec {
    pub size: usize,
    pub input_size: usize,
    pub activation: ActivationFunction,
}

impl Topology {
    /// 28×28 pixels → 256 → 128 → 10 digit classes.
    pub const DIGITS: Topology = Topology {
        input: 784,
        hidden1: 256,
        hidden2: 128,
        output: 10,
    };

    pub const fn new(input: usize, hidden1: usize, hidden2: usize, output: usize) -> Topology {
        Topology { input, hidden1, hidden2, output }
    }

    /// Ordered layer descriptions (input → output).
    pub fn layers(&self) -> [LayerSpec; 3] {
        [
            LayerSpec { size: self.hidden1, input_size: self.input, activation: ActivationFunction::ReLU },
            LayerSpec { size: self.hidden2, input_size: self.hidden1, activation: ActivationFunction::ReLU },
            LayerSpec { size: self.output, input_size: self.hidden2, activation: ActivationFunction::Softmax },
        ]
    }
}

impl Default for Topology {
    fn default() -> Self {
        Topology::DIGITS
    }
}
