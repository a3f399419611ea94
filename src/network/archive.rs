use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use flate2::{read::GzDecoder, write::GzEncoder, Compression};
use serde::{Serialize, Deserialize};

use crate::error::{Error, Result};
use crate::math::matrix::Matrix;
use crate::network::npz;

/// Named-array container: the only artifact shared by training and serving.
///
/// On disk it is a JSON object mapping each name (`W1`, `b1`, ... `b3`) to
/// `{ "rows", "cols", "data" }`. Paths ending in `.gz` are gzip-compressed;
/// paths ending in `.npz` use the NumPy archive layout instead.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModelArchive {
    entries: BTreeMap<String, Matrix>,
}

impl ModelArchive {
    pub fn insert(&mut self, name: impl Into<String>, array: Matrix) {
        self.entries.insert(name.into(), array);
    }

    pub fn get(&self, name: &str) -> Option<&Matrix> {
        self.entries.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Returns the named array if it exists, has `shape` and a consistent
    /// buffer; otherwise `CorruptModel`.
    pub fn expect_entry(&self, name: &str, shape: (usize, usize)) -> Result<&Matrix> {
        let array = self.entries.get(name)
            .ok_or_else(|| Error::CorruptModel(format!("missing array '{}'", name)))?;
        if array.shape() != shape {
            return Err(Error::CorruptModel(format!(
                "array '{}' has shape {}x{}, expected {}x{}",
                name, array.rows, array.cols, shape.0, shape.1
            )));
        }
        if array.data.len() != array.rows * array.cols {
            return Err(Error::CorruptModel(format!(
                "array '{}' declares {}x{} but holds {} values",
                name, array.rows, array.cols, array.data.len()
            )));
        }
        Ok(array)
    }

    /// Fails with `CorruptModel` naming the first array that holds a NaN or
    /// infinite value, since JSON has no encoding for them.
    pub fn check_finite(&self) -> Result<()> {
        for (name, array) in &self.entries {
            if let Some(i) = array.data.iter().position(|v| !v.is_finite()) {
                return Err(Error::CorruptModel(format!(
                    "array '{}' holds non-finite value {} at ({}, {})",
                    name,
                    array.data[i],
                    i / array.cols.max(1),
                    i % array.cols.max(1)
                )));
            }
        }
        Ok(())
    }

    pub fn to_writer<W: Write>(&self, writer: W) -> Result<()> {
        self.check_finite()?;
        serde_json::to_writer(writer, self)
            .map_err(|e| Error::Io(std::io::Error::new(std::io::ErrorKind::Other, e)))
    }

    /// Parse failures are reported as `CorruptModel`.
    pub fn from_reader<R: Read>(reader: R) -> Result<ModelArchive> {
        serde_json::from_reader(reader)
            .map_err(|e| Error::CorruptModel(e.to_string()))
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        self.check_finite()?;
        let writer = BufWriter::new(File::create(path)?);
        if has_extension(path, "npz") {
            let mut writer = writer;
            npz::write_npz(&mut writer, self.entries.iter().map(|(n, m)| (n.as_str(), m)))?;
            writer.flush()?;
        } else if has_extension(path, "gz") {
            let mut encoder = GzEncoder::new(writer, Compression::default());
            self.to_writer(&mut encoder)?;
            encoder.finish()?.flush()?;
        } else {
            let mut writer = writer;
            self.to_writer(&mut writer)?;
            writer.flush()?;
        }
        log::debug!("wrote model archive {} ({} arrays)", path.display(), self.entries.len());
        Ok(())
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<ModelArchive> {
        let path = path.as_ref();
        let reader = BufReader::new(File::open(path)?);
        let archive = if has_extension(path, "npz") {
            let mut archive = ModelArchive::default();
            for (name, array) in npz::read_npz(reader)? {
                archive.insert(name, array);
            }
            archive
        } else if has_extension(path, "gz") {
            ModelArchive::from_reader(GzDecoder::new(reader))?
        } else {
            ModelArchive::from_reader(reader)?
        };
        log::debug!("read model archive {} ({} arrays)", path.display(), archive.entries.len());
        Ok(archive)
    }
}

fn has_extension(path: &Path, ext: &str) -> bool {
    path.extension().and_then(|e| e.to_str()) == Some(ext)
}
