pub mod error;
pub mod math;
pub mod activation;
pub mod layers;
pub mod network;
pub mod loss;
pub mod optim;
pub mod train;
pub mod dataset;
pub mod preprocess;

// Convenience re-exports
pub use error::{Error, Result};
pub use math::matrix::Matrix;
pub use activation::activation::ActivationFunction;
pub use layers::dense::Layer;
pub use network::{ModelArchive, Network, Prediction, Topology};
pub use loss::CrossEntropyLoss;
pub use optim::sgd::Sgd;
pub use dataset::{LabeledSet, Split};
pub use preprocess::{classify_image, preprocess, Preprocessed};
pub use train::{train_loop, train_network, EpochStats, TrainConfig};
