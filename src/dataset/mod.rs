pub mod idx;
pub mod labeled_set;

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use flate2::read::GzDecoder;

use crate::error::{Error, Result};

pub use labeled_set::LabeledSet;

/// Which half of the MNIST distribution to load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Split {
    Train,
    Test,
}

impl Split {
    /// Standard MNIST file stems: `(images, labels)`.
    pub fn file_stems(&self) -> (&'static str, &'static str) {
        match self {
            Split::Train => ("train-images-idx3-ubyte", "train-labels-idx1-ubyte"),
            Split::Test => ("t10k-images-idx3-ubyte", "t10k-labels-idx1-ubyte"),
        }
    }
}

/// Reads a whole file, gunzipping it when it carries the gzip magic bytes.
pub fn read_maybe_gz<P: AsRef<Path>>(path: P) -> Result<Vec<u8>> {
    let path = path.as_ref();
    let mut raw = Vec::new();
    BufReader::new(File::open(path)?).read_to_end(&mut raw)?;

    if raw.starts_with(&[0x1f, 0x8b]) {
        let mut out = Vec::new();
        GzDecoder::new(&raw[..]).read_to_end(&mut out)?;
        Ok(out)
    } else {
        Ok(raw)
    }
}

/// Builds a labeled set from in-memory IDX image + label files.
pub fn from_idx_bytes(image_bytes: &[u8], label_bytes: &[u8]) -> Result<LabeledSet> {
    let images = idx::parse_images(image_bytes)?;
    let labels = idx::parse_labels(label_bytes)?;
    if images.count != labels.len() {
        return Err(Error::Dataset(format!(
            "image file declares {} items but label file declares {}",
            images.count,
            labels.len()
        )));
    }
    LabeledSet::new(images.to_matrix(), labels)
}

/// Loads an image/label file pair from disk (plain or gzip).
pub fn load_idx_pair<P: AsRef<Path>, Q: AsRef<Path>>(images: P, labels: Q) -> Result<LabeledSet> {
    let set = from_idx_bytes(&read_maybe_gz(images)?, &read_maybe_gz(labels)?)?;
    log::info!("loaded {} examples of {} values", set.len(), set.input_size());
    Ok(set)
}

/// Loads one MNIST split from `dir`, preferring `<stem>.gz` over `<stem>`.
pub fn load_split<P: AsRef<Path>>(dir: P, split: Split) -> Result<LabeledSet> {
    let (image_stem, label_stem) = split.file_stems();
    let images = locate(dir.as_ref(), image_stem)?;
    let labels = locate(dir.as_ref(), label_stem)?;
    log::debug!("reading {:?} split from {} and {}", split, images.display(), labels.display());
    load_idx_pair(images, labels)
}

fn locate(dir: &Path, stem: &str) -> Result<PathBuf> {
    let gz = dir.join(format!("{}.gz", stem));
    if gz.exists() {
        return Ok(gz);
    }
    let plain = dir.join(stem);
    if plain.exists() {
        return Ok(plain);
    }
    Err(Error::Dataset(format!(
        "neither {} nor {} exists",
        gz.display(),
        plain.display()
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    use flate2::{write::GzEncoder, Compression};

    #[test]
    fn load_split_reads_gzipped_files() {
        let dir = tempfile::tempdir().unwrap();
        let (image_stem, label_stem) = Split::Test.file_stems();

        let images = idx::encode_images(2, 2, 2, &[0, 255, 0, 255, 255, 0, 255, 0]);
        let mut enc = GzEncoder::new(File::create(dir.path().join(format!("{}.gz", image_stem))).unwrap(), Compression::fast());
        enc.write_all(&images).unwrap();
        enc.finish().unwrap();
        std::fs::write(dir.path().join(label_stem), idx::encode_labels(&[3, 8])).unwrap();

        let set = load_split(dir.path(), Split::Test).unwrap();
        assert_eq!(set.labels, vec![3, 8]);
        assert_eq!(set.images.shape(), (2, 4));
        assert_eq!(set.images.row(1), &[1.0, 0.0, 1.0, 0.0]);
    }

    #[test]
    fn missing_files_are_a_dataset_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(load_split(dir.path(), Split::Train), Err(Error::Dataset(_))));
    }

    #[test]
    fn count_mismatch_is_rejected() {
        let images = idx::encode_images(2, 1, 1, &[0, 0]);
        let labels = idx::encode_labels(&[1]);
        assert!(from_idx_bytes(&images, &labels).is_err());
    }
}
