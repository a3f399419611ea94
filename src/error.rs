use thiserror::Error;

/// Every failure the library can report.
///
/// `ShapeMismatch` is an internal invariant violation (a programming defect),
/// `Decode` is the only error a client can cause through the inference path,
/// `CorruptModel` and `Dataset` are fatal at startup / before training.
#[derive(Debug, Error)]
pub enum Error {
    #[error("shape mismatch in {op}: left is {}x{}, right is {}x{}", .left.0, .left.1, .right.0, .right.1)]
    ShapeMismatch {
        op: &'static str,
        left: (usize, usize),
        right: (usize, usize),
    },

    #[error("could not decode image: {0}")]
    Decode(#[from] image::ImageError),

    #[error("corrupt model archive: {0}")]
    CorruptModel(String),

    #[error("invalid dataset: {0}")]
    Dataset(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
