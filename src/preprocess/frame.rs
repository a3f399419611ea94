use image::imageops::{self, FilterType};
use image::GrayImage;

use crate::math::matrix::Matrix;

/// Side of the square the digit is scaled into.
pub const DIGIT_SIZE: u32 = 20;
/// Blank margin added on every side of the scaled digit.
pub const PADDING: u32 = 4;
/// Final frame side, matching the 28×28 training images.
pub const FRAME_SIZE: u32 = DIGIT_SIZE + 2 * PADDING;

/// Tight axis-aligned box around the foreground, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundingBox {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Smallest box containing every non-zero pixel, or `None` if there are none.
/// Disconnected strokes all end up inside the one box.
pub fn foreground_bounds(binary: &GrayImage) -> Option<BoundingBox> {
    let mut bounds: Option<(u32, u32, u32, u32)> = None;
    for (x, y, p) in binary.enumerate_pixels() {
        if p.0[0] == 0 {
            continue;
        }
        bounds = Some(match bounds {
            None => (x, y, x, y),
            Some((x0, y0, x1, y1)) => (x0.min(x), y0.min(y), x1.max(x), y1.max(y)),
        });
    }
    bounds.map(|(x0, y0, x1, y1)| BoundingBox {
        x: x0,
        y: y0,
        width: x1 - x0 + 1,
        height: y1 - y0 + 1,
    })
}

/// Crops to `bounds`, scales to 20×20 and pads with 4 px of zero, giving a
/// 28×28 frame with the digit centered the way the training set is.
pub fn frame_digit(binary: &GrayImage, bounds: BoundingBox) -> GrayImage {
    let cropped = imageops::crop_imm(binary, bounds.x, bounds.y, bounds.width, bounds.height).to_image();
    let scaled = imageops::resize(&cropped, DIGIT_SIZE, DIGIT_SIZE, FilterType::Triangle);

    let mut framed = GrayImage::new(FRAME_SIZE, FRAME_SIZE);
    imageops::replace(&mut framed, &scaled, PADDING as i64, PADDING as i64);
    framed
}

/// Divides by 255 and flattens row-major into a `1 × (w·h)` tensor.
pub fn to_input_row(img: &GrayImage) -> Matrix {
    let data: Vec<f64> = img.pixels().map(|p| p.0[0] as f64 / 255.0).collect();
    Matrix { rows: 1, cols: data.len(), data }
}
