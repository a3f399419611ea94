//! NumPy `.npz` archives: a zip of `<name>.npy` members.
//!
//! Reads version 1.0 to 3.0 `.npy` headers holding little-endian `f8` or `f4`
//! data in C or Fortran order, with shapes `(n,)` (read as `1 x n`) or
//! `(rows, cols)`. Writes version 1.0 `<f8` in C order.

use std::io::{Read, Seek, Write};

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::error::{Error, Result};
use crate::math::matrix::Matrix;

const MAGIC: &[u8] = b"\x93NUMPY";

fn corrupt(msg: impl Into<String>) -> Error {
    Error::CorruptModel(msg.into())
}

/// Reads every `.npy` member of the archive as a named matrix.
pub fn read_npz<R: Read + Seek>(reader: R) -> Result<Vec<(String, Matrix)>> {
    let mut archive = ZipArchive::new(reader).map_err(|e| corrupt(format!("npz: {}", e)))?;
    let mut arrays = Vec::with_capacity(archive.len());
    for i in 0..archive.len() {
        let mut member = archive.by_index(i).map_err(|e| corrupt(format!("npz: {}", e)))?;
        let name = member.name().to_owned();
        let Some(stem) = name.strip_suffix(".npy") else {
            continue;
        };
        let stem = stem.to_owned();
        let mut bytes = Vec::with_capacity(member.size() as usize);
        member.read_to_end(&mut bytes)?;
        let matrix = parse_npy(&bytes).map_err(|e| match e {
            Error::CorruptModel(msg) => corrupt(format!("array '{}': {}", stem, msg)),
            other => other,
        })?;
        arrays.push((stem, matrix));
    }
    Ok(arrays)
}

/// Writes the arrays as an uncompressed `.npz`, the layout `np.savez` produces.
pub fn write_npz<'a, W, I>(writer: W, arrays: I) -> Result<()>
where
    W: Write + Seek,
    I: IntoIterator<Item = (&'a str, &'a Matrix)>,
{
    let mut zip = ZipWriter::new(writer);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
    for (name, matrix) in arrays {
        zip.start_file(format!("{}.npy", name), options)
            .map_err(|e| Error::Io(std::io::Error::new(std::io::ErrorKind::Other, e)))?;
        zip.write_all(&encode_npy(matrix))?;
    }
    zip.finish()
        .map_err(|e| Error::Io(std::io::Error::new(std::io::ErrorKind::Other, e)))?;
    Ok(())
}

pub fn parse_npy(bytes: &[u8]) -> Result<Matrix> {
    if bytes.len() < 10 || &bytes[..6] != MAGIC {
        return Err(corrupt("not an .npy array"));
    }
    let (header_len, header_start) = match bytes[6] {
        1 => (u16::from_le_bytes([bytes[8], bytes[9]]) as usize, 10),
        2 | 3 => {
            if bytes.len() < 12 {
                return Err(corrupt("truncated .npy header"));
            }
            (u32::from_le_bytes([bytes[8], bytes[9], bytes[10], bytes[11]]) as usize, 12)
        }
        v => return Err(corrupt(format!("unsupported .npy version {}", v))),
    };
    let data_start = header_start + header_len;
    if bytes.len() < data_start {
        return Err(corrupt("truncated .npy header"));
    }
    let header = std::str::from_utf8(&bytes[header_start..data_start])
        .map_err(|_| corrupt("non-UTF-8 .npy header"))?;

    let descr = header_value(header, "descr")
        .map(|v| v.trim_matches(|c| c == '\'' || c == '"'))
        .ok_or_else(|| corrupt("missing descr"))?;
    let fortran = match header_value(header, "fortran_order") {
        Some("True") => true,
        Some("False") => false,
        _ => return Err(corrupt("missing fortran_order")),
    };
    let (rows, cols) = parse_shape(header)?;

    let body = &bytes[data_start..];
    let values: Vec<f64> = match descr {
        "<f8" => read_floats(body, rows * cols, 8, |c| {
            f64::from_le_bytes([c[0], c[1], c[2], c[3], c[4], c[5], c[6], c[7]])
        })?,
        "<f4" => read_floats(body, rows * cols, 4, |c| {
            f32::from_le_bytes([c[0], c[1], c[2], c[3]]) as f64
        })?,
        other => return Err(corrupt(format!("unsupported dtype {}", other))),
    };

    let matrix = Matrix::from_vec(if fortran { cols } else { rows }, if fortran { rows } else { cols }, values)?;
    Ok(if fortran { matrix.transpose() } else { matrix })
}

pub fn encode_npy(matrix: &Matrix) -> Vec<u8> {
    let mut header = format!(
        "{{'descr': '<f8', 'fortran_order': False, 'shape': ({}, {}), }}",
        matrix.rows, matrix.cols
    );
    // magic + version + length + header + newline is padded to 64 bytes
    let unpadded = MAGIC.len() + 4 + header.len() + 1;
    header.push_str(&" ".repeat((64 - unpadded % 64) % 64));
    header.push('\n');

    let mut out = Vec::with_capacity(MAGIC.len() + 4 + header.len() + matrix.data.len() * 8);
    out.extend_from_slice(MAGIC);
    out.extend_from_slice(&[1, 0]);
    out.extend_from_slice(&(header.len() as u16).to_le_bytes());
    out.extend_from_slice(header.as_bytes());
    for v in &matrix.data {
        out.extend_from_slice(&v.to_le_bytes());
    }
    out
}

/// Raw text of `'key': value` up to the next top-level comma or brace.
fn header_value<'h>(header: &'h str, key: &str) -> Option<&'h str> {
    let start = header.find(&format!("'{}'", key))? + key.len() + 2;
    let rest = header[start..].trim_start().strip_prefix(':')?.trim_start();
    let end = if rest.starts_with('(') {
        rest.find(')')? + 1
    } else {
        rest.find(|c| c == ',' || c == '}')?
    };
    Some(rest[..end].trim())
}

fn parse_shape(header: &str) -> Result<(usize, usize)> {
    let shape = header_value(header, "shape").ok_or_else(|| corrupt("missing shape"))?;
    let dims = shape
        .trim_start_matches('(')
        .trim_end_matches(')')
        .split(',')
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .map(|d| d.parse::<usize>().map_err(|_| corrupt(format!("bad shape {}", shape))))
        .collect::<Result<Vec<_>>>()?;
    match dims.as_slice() {
        [n] => Ok((1, *n)),
        [r, c] => Ok((*r, *c)),
        _ => Err(corrupt(format!("expected a 1-D or 2-D array, got shape {}", shape))),
    }
}

fn read_floats(body: &[u8], count: usize, width: usize, decode: impl Fn(&[u8]) -> f64) -> Result<Vec<f64>> {
    if body.len() != count * width {
        return Err(corrupt(format!(
            "holds {} bytes, shape needs {}",
            body.len(),
            count * width
        )));
    }
    Ok(body.chunks_exact(width).map(decode).collect())
}
