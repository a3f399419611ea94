pub mod archive;
pub mod network;
pub mod npz;
pub mod prediction;
pub mod spec;

pub use archive::ModelArchive;
pub use network::{ForwardCache, Network};
pub use prediction::Prediction;
pub use spec::{LayerSpec, Topology};
