//! Backend-free matrix.
use crate::MimicError;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::convert::TryFrom;

/// Row-major matrix of `f32`.
///
/// A batch of observations or actions is stored with one item per row.
/// Decoding fails if `data` does not fit `shape`.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(try_from = "RawMat")]
pub struct Mat {
    /// Elements in row-major order.
    pub data: Vec<f32>,

    /// `[rows, cols]`.
    pub shape: [usize; 2],
}

#[derive(Deserialize)]
struct RawMat {
    data: Vec<f32>,
    shape: [usize; 2],
}

impl TryFrom<RawMat> for Mat {
    type Error = anyhow::Error;

    fn try_from(raw: RawMat) -> Result<Self> {
        Self::new(raw.data, raw.shape)
    }
}

impl Mat {
    /// Constructs a matrix, checking that `data` fits `shape`.
    pub fn new(data: Vec<f32>, shape: [usize; 2]) -> Result<Self> {
        if data.len() != shape[0] * shape[1] {
            return Err(MimicError::ShapeMismatch(format!(
                "{} elements for shape {:?}",
                data.len(),
                shape
            ))
            .into());
        }
        Ok(Self { data, shape })
    }

    /// Matrix filled with zeros.
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self {
            data: vec![0f32; rows * cols],
            shape: [rows, cols],
        }
    }

    /// Stacks rows of equal length.
    ///
    /// Panics if the rows have different lengths.
    pub fn from_rows(rows: &[Vec<f32>]) -> Self {
        let cols = rows.first().map(|r| r.len()).unwrap_or(0);
        let mut data = Vec::with_capacity(rows.len() * cols);
        for row in rows.iter() {
            assert_eq!(row.len(), cols, "Rows of different lengths");
            data.extend_from_slice(row);
        }
        Self {
            data,
            shape: [rows.len(), cols],
        }
    }

    /// The number of rows.
    pub fn rows(&self) -> usize {
        self.shape[0]
    }

    /// The number of columns.
    pub fn cols(&self) -> usize {
        self.shape[1]
    }

    /// Iterates over rows.
    pub fn iter_rows(&self) -> impl Iterator<Item = &[f32]> {
        // chunks() panics on zero
        let c = self.cols().max(1);
        self.data.chunks(c).take(self.rows())
    }

    /// `self (m x l) * x (l x n)`.
    pub fn matmul(&self, x: &Mat) -> Result<Self> {
        let (m, l, n) = (self.rows(), self.cols(), x.cols());
        if x.rows() != l {
            return Err(MimicError::ShapeMismatch(format!(
                "matmul of {:?} and {:?}",
                self.shape, x.shape
            ))
            .into());
        }
        let mut data = vec![0f32; m * n];
        for i in 0..m {
            for k in 0..l {
                let a = self.data[i * l + k];
                for j in 0..n {
                    data[i * n + j] += a * x.data[k * n + j];
                }
            }
        }
        Ok(Self {
            data,
            shape: [m, n],
        })
    }

    /// Adds `bias` to every row.
    pub fn add_row(&self, bias: &[f32]) -> Result<Self> {
        if bias.len() != self.cols() {
            return Err(MimicError::ShapeMismatch(format!(
                "bias of length {} for shape {:?}",
                bias.len(),
                self.shape
            ))
            .into());
        }
        let c = self.cols();
        let data = self
            .data
            .iter()
            .enumerate()
            .map(|(i, v)| v + bias[i % c])
            .collect();
        Ok(Self {
            data,
            shape: self.shape,
        })
    }

    /// Applies `f` elementwise.
    pub fn map(&self, f: impl Fn(f32) -> f32) -> Self {
        Self {
            data: self.data.iter().map(|v| f(*v)).collect(),
            shape: self.shape,
        }
    }

    /// Rectified linear unit.
    pub fn relu(&self) -> Self {
        self.map(|v| if v < 0. { 0. } else { v })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matmul() -> Result<()> {
        let x = Mat::from_rows(&[vec![1.0, 2., 3.], vec![4., 5., 6.]]);
        let y = Mat::new(vec![7., 8., 9., 10., 11., 12.], [3, 2])?;
        let z = x.matmul(&y)?;
        assert_eq!(z.shape, [2, 2]);
        assert_eq!(z.data, vec![58., 64., 139., 154.]);
        Ok(())
    }

    #[test]
    fn test_shape_errors() {
        assert!(Mat::new(vec![1.0; 5], [2, 3]).is_err());
        let x = Mat::zeros(2, 3);
        assert!(x.matmul(&Mat::zeros(2, 3)).is_err());
        assert!(x.add_row(&[1.0, 2.0]).is_err());
    }

    #[test]
    fn test_decode_checks_shape() -> Result<()> {
        let x = Mat::zeros(2, 3);
        let bytes = bincode::serialize(&x)?;
        assert_eq!(bincode::deserialize::<Mat>(&bytes)?, x);

        let mut bad = x.clone();
        bad.data.pop();
        let bytes = bincode::serialize(&bad)?;
        assert!(bincode::deserialize::<Mat>(&bytes).is_err());
        Ok(())
    }

    #[test]
    fn test_add_row_relu() -> Result<()> {
        let x = Mat::from_rows(&[vec![-1.0, 2.0], vec![3.0, -4.0]]);
        let y = x.add_row(&[0.5, 0.5])?.relu();
        assert_eq!(y.data, vec![0.0, 2.5, 3.5, 0.0]);
        assert_eq!(y.iter_rows().count(), 2);
        Ok(())
    }
}
