//! Turns an arbitrary uploaded image into the `1 × 784` tensor the network
//! was trained on.
//!
//! Steps: decode to grayscale, 5×5 Gaussian blur, Otsu threshold (inverted,
//! so dark ink is foreground), crop to the foreground bounding box, scale to
//! 20×20, pad to 28×28, divide by 255 and flatten. Every step must stay
//! exactly as it is: the network only ever saw inputs produced this way.
//!
//! Polarity is fixed to dark-on-light. A bright digit on a black canvas is
//! read the other way round: the dark background becomes the foreground and
//! the bounding box spans the whole image.

pub mod filters;
pub mod frame;

use image::GrayImage;

use crate::error::Result;
use crate::math::matrix::Matrix;
use crate::network::{Network, Prediction};

pub use filters::{binarize_inverted, gaussian_blur_5x5, otsu_threshold};
pub use frame::{foreground_bounds, frame_digit, to_input_row, BoundingBox};

/// Result of preprocessing one image.
#[derive(Debug, Clone, PartialEq)]
pub enum Preprocessed {
    /// `1 × 784` input row with values in [0, 1].
    Digit(Matrix),
    /// No foreground pixels were found.
    Empty,
}

/// Decodes `bytes` (png, jpeg, bmp or gif) and preprocesses the result.
/// Undecodable input is `Error::Decode`.
pub fn preprocess(bytes: &[u8]) -> Result<Preprocessed> {
    let gray = image::load_from_memory(bytes)?.to_luma8();
    Ok(preprocess_gray(&gray))
}

/// Preprocesses an already decoded grayscale image.
pub fn preprocess_gray(gray: &GrayImage) -> Preprocessed {
    let blurred = gaussian_blur_5x5(gray);

    let threshold = match otsu_threshold(&blurred) {
        Some(t) => t,
        None => {
            log::debug!("uniform {}x{} image, no foreground", gray.width(), gray.height());
            return Preprocessed::Empty;
        }
    };
    let binary = binarize_inverted(&blurred, threshold);

    let bounds = match foreground_bounds(&binary) {
        Some(b) => b,
        None => return Preprocessed::Empty,
    };
    log::debug!("otsu threshold {}, foreground box {:?}", threshold, bounds);

    Preprocessed::Digit(to_input_row(&frame_digit(&binary, bounds)))
}

/// Full inference path: bytes → preprocessing → forward pass.
///
/// An image without foreground yields `Prediction::no_digit()`, not an error.
pub fn classify_image(network: &Network, bytes: &[u8]) -> Result<Prediction> {
    match preprocess(bytes)? {
        Preprocessed::Digit(input) => network.predict(&input),
        Preprocessed::Empty => Ok(Prediction::no_digit()),
    }
}
