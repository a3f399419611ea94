use rand::seq::SliceRandom;
use rand::Rng;

use crate::error::{Error, Result};
use crate::math::matrix::Matrix;

/// Flattened images (one per row, values in [0, 1]) and their class labels.
#[derive(Debug, Clone, PartialEq)]
pub struct LabeledSet {
    pub images: Matrix,
    pub labels: Vec<u8>,
}

impl LabeledSet {
    /// Fails if the number of image rows and labels disagree.
    pub fn new(images: Matrix, labels: Vec<u8>) -> Result<LabeledSet> {
        if images.rows != labels.len() {
            return Err(Error::Dataset(format!(
                "{} images but {} labels",
                images.rows,
                labels.len()
            )));
        }
        Ok(LabeledSet { images, labels })
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn input_size(&self) -> usize {
        self.images.cols
    }

    /// Reorders images and labels with the same random permutation.
    pub fn shuffle<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        let mut indices: Vec<usize> = (0..self.len()).collect();
        indices.shuffle(rng);
        self.images = self.images.select_rows(&indices);
        self.labels = indices.iter().map(|&i| self.labels[i]).collect();
    }

    /// Checks the set can train a network with `input_size` inputs and
    /// `classes` outputs.
    pub fn validate(&self, input_size: usize, classes: usize) -> Result<()> {
        if self.is_empty() {
            return Err(Error::Dataset("training set is empty".to_owned()));
        }
        if self.input_size() != input_size {
            return Err(Error::Dataset(format!(
                "examples have {} values, network expects {}",
                self.input_size(),
                input_size
            )));
        }
        if let Some((i, &y)) = self.labels.iter().enumerate().find(|&(_, &y)| y as usize >= classes) {
            return Err(Error::Dataset(format!(
                "label at index {} is {}, out of range for {} classes",
                i, y, classes
            )));
        }
        Ok(())
    }
}
