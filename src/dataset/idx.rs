//! IDX binary format as used by MNIST.
//!
//! # IDX3 image file layout
//! ```text
//! bytes  0-1:   0x00 0x00   (reserved, must be zero)
//! byte   2:     0x08        (dtype = uint8)
//! byte   3:     0x03        (number of dimensions = 3)
//! bytes  4-7:   N           (number of images, big-endian u32)
//! bytes  8-11:  rows        (image height in pixels, big-endian u32)
//! bytes 12-15:  cols        (image width in pixels, big-endian u32)
//! bytes 16..:   N * rows * cols bytes, row-major, uint8
//! ```
//!
//! # IDX1 label file layout
//! ```text
//! bytes  0-1:   0x00 0x00   (reserved, must be zero)
//! byte   2:     0x08        (dtype = uint8)
//! byte   3:     0x01        (number of dimensions = 1)
//! bytes  4-7:   N           (number of labels, big-endian u32)
//! bytes  8..:   N bytes, each a class index
//! ```

use crate::error::{Error, Result};
use crate::math::matrix::Matrix;

const IMAGE_HEADER: usize = 16;
const LABEL_HEADER: usize = 8;

/// Decoded IDX3 file: `count` images of `rows × cols` raw bytes.
#[derive(Debug, Clone)]
pub struct IdxImages {
    pub count: usize,
    pub rows: usize,
    pub cols: usize,
    pub pixels: Vec<u8>,
}

impl IdxImages {
    /// One row per image, pixels divided by 255 so values lie in [0, 1].
    pub fn to_matrix(&self) -> Matrix {
        Matrix {
            rows: self.count,
            cols: self.rows * self.cols,
            data: self.pixels.iter().map(|&px| px as f64 / 255.0).collect(),
        }
    }
}

fn check_magic(bytes: &[u8], what: &str, dims: u8) -> Result<()> {
    if bytes[0] != 0x00 || bytes[1] != 0x00 {
        return Err(Error::Dataset(format!(
            "IDX {} file: bytes 0-1 must be 0x00 0x00 (reserved), got 0x{:02X} 0x{:02X}",
            what, bytes[0], bytes[1]
        )));
    }
    if bytes[2] != 0x08 {
        return Err(Error::Dataset(format!(
            "IDX {} file: byte 2 (dtype) must be 0x08 (uint8), got 0x{:02X}",
            what, bytes[2]
        )));
    }
    if bytes[3] != dims {
        return Err(Error::Dataset(format!(
            "IDX {} file: byte 3 (dimensions) must be {}, got {}",
            what, dims, bytes[3]
        )));
    }
    Ok(())
}

fn be_u32(bytes: &[u8], at: usize) -> usize {
    u32::from_be_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]]) as usize
}

/// Parses an IDX3 image file, validating the header against the file length.
pub fn parse_images(bytes: &[u8]) -> Result<IdxImages> {
    if bytes.len() < IMAGE_HEADER {
        return Err(Error::Dataset(format!(
            "IDX image file too short: expected at least {} header bytes, got {}",
            IMAGE_HEADER, bytes.len()
        )));
    }
    check_magic(bytes, "image", 0x03)?;

    let count = be_u32(bytes, 4);
    let rows = be_u32(bytes, 8);
    let cols = be_u32(bytes, 12);

    let needed = rows.checked_mul(cols)
        .and_then(|n| n.checked_mul(count))
        .and_then(|n| n.checked_add(IMAGE_HEADER))
        .ok_or_else(|| Error::Dataset(format!(
            "IDX image file: {} images of {}x{} overflows usize", count, rows, cols
        )))?;

    if bytes.len() < needed {
        return Err(Error::Dataset(format!(
            "IDX image file too short: header declares {} images of {}x{} pixels \
             ({} bytes needed), but file is only {} bytes",
            count, rows, cols, needed, bytes.len()
        )));
    }

    Ok(IdxImages {
        count,
        rows,
        cols,
        pixels: bytes[IMAGE_HEADER..needed].to_vec(),
    })
}

/// Parses an IDX1 label file.
pub fn parse_labels(bytes: &[u8]) -> Result<Vec<u8>> {
    if bytes.len() < LABEL_HEADER {
        return Err(Error::Dataset(format!(
            "IDX label file too short: expected at least {} header bytes, got {}",
            LABEL_HEADER, bytes.len()
        )));
    }
    check_magic(bytes, "label", 0x01)?;

    let count = be_u32(bytes, 4);
    let needed = LABEL_HEADER + count;
    if bytes.len() < needed {
        return Err(Error::Dataset(format!(
            "IDX label file too short: header declares {} labels but file is only {} bytes",
            count, bytes.len()
        )));
    }
    Ok(bytes[LABEL_HEADER..needed].to_vec())
}

#[cfg(test)]
pub(crate) fn encode_images(count: usize, rows: usize, cols: usize, pixels: &[u8]) -> Vec<u8> {
    let mut out = vec![0x00, 0x00, 0x08, 0x03];
    for v in [count, rows, cols] {
        out.extend_from_slice(&(v as u32).to_be_bytes());
    }
    out.extend_from_slice(pixels);
    out
}

#[cfg(test)]
pub(crate) fn encode_labels(labels: &[u8]) -> Vec<u8> {
    let mut out = vec![0x00, 0x00, 0x08, 0x01];
    out.extend_from_slice(&(labels.len() as u32).to_be_bytes());
    out.extend_from_slice(labels);
    out
}
