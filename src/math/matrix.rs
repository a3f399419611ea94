use rand::Rng;
use serde::{Serialize, Deserialize};
use std::f64::consts::PI;

use crate::error::{Error, Result};

/// Dense row-major 2-D array of `f64`.
///
/// Every binary operation checks shapes and returns `Error::ShapeMismatch`
/// instead of panicking. Operations allocate a fresh result; the only
/// in-place mutation is `sub_scaled_assign`, used by the SGD update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Matrix {
    pub rows: usize,
    pub cols: usize,
    pub data: Vec<f64>,
}

impl Matrix {
    pub fn zeros(rows: usize, cols: usize) -> Matrix {
        Matrix {
            rows,
            cols,
            data: vec![0.0; rows * cols],
        }
    }

    /// Wraps a flat row-major buffer. Fails if `data.len() != rows * cols`.
    pub fn from_vec(rows: usize, cols: usize, data: Vec<f64>) -> Result<Matrix> {
        if data.len() != rows * cols {
            return Err(Error::ShapeMismatch {
                op: "from_vec",
                left: (rows, cols),
                right: (1, data.len()),
            });
        }
        Ok(Matrix { rows, cols, data })
    }

    /// Builds a matrix from nested rows. All rows must have the same length.
    pub fn from_rows(rows: Vec<Vec<f64>>) -> Result<Matrix> {
        let n_rows = rows.len();
        let n_cols = rows.first().map_or(0, |r| r.len());
        let mut data = Vec::with_capacity(n_rows * n_cols);
        for row in rows {
            if row.len() != n_cols {
                return Err(Error::ShapeMismatch {
                    op: "from_rows",
                    left: (n_rows, n_cols),
                    right: (1, row.len()),
                });
            }
            data.extend(row);
        }
        Ok(Matrix { rows: n_rows, cols: n_cols, data })
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.data[row * self.cols + col]
    }

    pub fn set(&mut self, row: usize, col: usize, value: f64) {
        self.data[row * self.cols + col] = value;
    }

    pub fn row(&self, row: usize) -> &[f64] {
        &self.data[row * self.cols..(row + 1) * self.cols]
    }

    /// Samples a single value from N(0, 1) using the Box-Muller transform.
    fn sample_standard_normal<R: Rng + ?Sized>(rng: &mut R) -> f64 {
        // Both uniforms in (0, 1] so ln() never sees zero.
        let u1: f64 = 1.0 - rng.gen::<f64>();
        let u2: f64 = 1.0 - rng.gen::<f64>();
        (-2.0 * u1.ln()).sqrt() * (2.0 * PI * u2).cos()
    }

    /// He initialization: samples from N(0, sqrt(2 / rows)).
    ///
    /// Weights are stored `in_dim × out_dim`, so `rows` is the fan-in of the
    /// layer. The variance 2/fan_in compensates for ReLU zeroing half of its
    /// inputs on average.
    pub fn he<R: Rng + ?Sized>(rows: usize, cols: usize, rng: &mut R) -> Matrix {
        let std_dev = (2.0 / rows as f64).sqrt();
        let data = (0..rows * cols)
            .map(|_| Matrix::sample_standard_normal(rng) * std_dev)
            .collect();
        Matrix { rows, cols, data }
    }

    pub fn transpose(&self) -> Matrix {
        let mut res = Matrix::zeros(self.cols, self.rows);
        for i in 0..self.rows {
            for j in 0..self.cols {
                res.data[j * self.rows + i] = self.data[i * self.cols + j];
            }
        }
        res
    }

    pub fn map<F>(&self, functor: F) -> Matrix
    where
        F: Fn(f64) -> f64,
    {
        Matrix {
            rows: self.rows,
            cols: self.cols,
            data: self.data.iter().map(|&x| functor(x)).collect(),
        }
    }

    /// Standard dense product. Requires `self.cols == rhs.rows`.
    pub fn matmul(&self, rhs: &Matrix) -> Result<Matrix> {
        if self.cols != rhs.rows {
            return Err(self.mismatch("matmul", rhs));
        }

        let mut res = Matrix::zeros(self.rows, rhs.cols);
        // i-k-j order keeps the inner loop on contiguous memory of both rhs and res.
        for i in 0..self.rows {
            let out = &mut res.data[i * rhs.cols..(i + 1) * rhs.cols];
            for k in 0..self.cols {
                let a = self.data[i * self.cols + k];
                if a == 0.0 {
                    continue;
                }
                let rhs_row = &rhs.data[k * rhs.cols..(k + 1) * rhs.cols];
                for (o, &b) in out.iter_mut().zip(rhs_row) {
                    *o += a * b;
                }
            }
        }
        Ok(res)
    }

    /// Adds a `1 × cols` row vector to every row.
    pub fn add_row_broadcast(&self, bias: &Matrix) -> Result<Matrix> {
        if bias.rows != 1 || bias.cols != self.cols {
            return Err(self.mismatch("add_row_broadcast", bias));
        }
        let mut res = self.clone();
        for row in res.data.chunks_exact_mut(self.cols.max(1)) {
            for (x, &b) in row.iter_mut().zip(&bias.data) {
                *x += b;
            }
        }
        Ok(res)
    }

    pub fn sub(&self, rhs: &Matrix) -> Result<Matrix> {
        self.zip_with("sub", rhs, |a, b| a - b)
    }

    /// Element-wise (Hadamard) product.
    pub fn hadamard(&self, rhs: &Matrix) -> Result<Matrix> {
        self.zip_with("hadamard", rhs, |a, b| a * b)
    }

    pub fn scale(&self, factor: f64) -> Matrix {
        self.map(|x| x * factor)
    }

    /// Element-wise `max(x, scalar)`.
    pub fn max_scalar(&self, scalar: f64) -> Matrix {
        self.map(|x| x.max(scalar))
    }

    /// Element-wise `1.0 if x > scalar else 0.0`.
    pub fn greater_than(&self, scalar: f64) -> Matrix {
        self.map(|x| if x > scalar { 1.0 } else { 0.0 })
    }

    /// Maximum of each row, as a `rows × 1` column.
    pub fn rowwise_max(&self) -> Matrix {
        let data = self.data
            .chunks_exact(self.cols.max(1))
            .take(self.rows)
            .map(|row| row.iter().copied().fold(f64::NEG_INFINITY, f64::max))
            .collect();
        Matrix { rows: self.rows, cols: 1, data }
    }

    /// Sum of each row, as a `rows × 1` column.
    pub fn rowwise_sum(&self) -> Matrix {
        let data = self.data
            .chunks_exact(self.cols.max(1))
            .take(self.rows)
            .map(|row| row.iter().sum())
            .collect();
        Matrix { rows: self.rows, cols: 1, data }
    }

    /// Sum of each column, as a `1 × cols` row (bias gradients).
    pub fn column_sum(&self) -> Matrix {
        let mut res = Matrix::zeros(1, self.cols);
        for row in self.data.chunks_exact(self.cols.max(1)) {
            for (acc, &x) in res.data.iter_mut().zip(row) {
                *acc += x;
            }
        }
        res
    }

    /// Column index of the largest value in each row. Ties go to the lowest index.
    pub fn argmax_rows(&self) -> Vec<usize> {
        (0..self.rows)
            .map(|i| {
                let mut best = 0;
                for (j, &x) in self.row(i).iter().enumerate() {
                    if x > self.row(i)[best] {
                        best = j;
                    }
                }
                best
            })
            .collect()
    }

    /// Gathers the listed rows, in order, into a new matrix.
    pub fn select_rows(&self, indices: &[usize]) -> Matrix {
        let mut data = Vec::with_capacity(indices.len() * self.cols);
        for &i in indices {
            data.extend_from_slice(self.row(i));
        }
        Matrix { rows: indices.len(), cols: self.cols, data }
    }

    /// Copies rows `start..end` (end clamped to `rows`).
    pub fn slice_rows(&self, start: usize, end: usize) -> Matrix {
        let end = end.min(self.rows);
        let start = start.min(end);
        Matrix {
            rows: end - start,
            cols: self.cols,
            data: self.data[start * self.cols..end * self.cols].to_vec(),
        }
    }

    /// `self -= factor * rhs`, in place.
    pub fn sub_scaled_assign(&mut self, rhs: &Matrix, factor: f64) -> Result<()> {
        if self.shape() != rhs.shape() {
            return Err(self.mismatch("sub_scaled_assign", rhs));
        }
        for (x, &g) in self.data.iter_mut().zip(&rhs.data) {
            *x -= factor * g;
        }
        Ok(())
    }

    fn zip_with<F>(&self, op: &'static str, rhs: &Matrix, f: F) -> Result<Matrix>
    where
        F: Fn(f64, f64) -> f64,
    {
        if self.shape() != rhs.shape() {
            return Err(self.mismatch(op, rhs));
        }
        Ok(Matrix {
            rows: self.rows,
            cols: self.cols,
            data: self.data.iter().zip(&rhs.data).map(|(&a, &b)| f(a, b)).collect(),
        })
    }

    fn mismatch(&self, op: &'static str, rhs: &Matrix) -> Error {
        Error::ShapeMismatch { op, left: self.shape(), right: rhs.shape() }
    }
}

impl Default for Matrix {
    fn default() -> Self {
        Matrix { rows: 0, cols: 0, data: vec![] }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn he_has_expected_spread() {
        let mut rng = StdRng::seed_from_u64(7);
        let w = Matrix::he(200, 100, &mut rng);
        let n = w.data.len() as f64;
        let mean = w.data.iter().sum::<f64>() / n;
        let var = w.data.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n;
        assert!(mean.abs() < 0.01);
        assert!((var - 2.0 / 200.0).abs() < 0.001);
    }

    #[test]
    fn he_is_reproducible_with_same_seed() {
        let a = Matrix::he(4, 3, &mut StdRng::seed_from_u64(1));
        let b = Matrix::he(4, 3, &mut StdRng::seed_from_u64(1));
        assert_eq!(a, b);
    }

    #[test]
    fn transpose_swaps_indices() {
        let m = Matrix::from_rows(vec![vec![1.0, 2.0, 3.0], vec![4.0, 5.0, 6.0]]).unwrap();
        let t = m.transpose();
        assert_eq!(t.shape(), (3, 2));
        assert_eq!(t.get(2, 1), 6.0);
        assert_eq!(t.get(0, 1), 4.0);
    }

    #[test]
    fn slice_rows_clamps_to_bounds() {
        let m = Matrix::from_rows(vec![vec![1.0], vec![2.0], vec![3.0]]).unwrap();
        let s = m.slice_rows(2, 10);
        assert_eq!(s.shape(), (1, 1));
        assert_eq!(s.data, vec![3.0]);
    }
}
