use serde::{Serialize, Deserialize};
use std::ops::{Add, Mul};

/// Row-major dense matrix of `f64`.
///
/// This is also the on-disk representation of weights and biases inside a
/// full JSON model, so the field names are part of the model format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Matrix{
    pub rows: usize,
    pub cols: usize,
    pub data: Vec<Vec<f64>>
}

impl Matrix{
    pub fn zeros(rows: usize, cols: usize) -> Matrix {
        Matrix{
            rows,
            cols,
            data: vec![vec![0.0; cols]; rows]
        }
    }

    /// Builds a `rows × cols` matrix from `f(row, col)`.
    pub fn from_fn<F>(rows: usize, cols: usize, f: F) -> Matrix
    where
        F: Fn(usize, usize) -> f64,
    {
        Matrix {
            rows,
            cols,
            data: (0..rows).map(|r| (0..cols).map(|c| f(r, c)).collect()).collect()
        }
    }

    pub fn map<F>(&self, functor: F) -> Matrix
    where
        F: Fn(f64) -> f64,
    {
        Matrix::from_data(
            self.data
                .iter()
                .map(|row| row.iter().map(|&x| functor(x)).collect())
                .collect()
        )
    }

    pub fn from_data(data: Vec<Vec<f64>>) -> Matrix {
        Matrix {
            rows: data.len(),
            cols: data.first().map_or(0, Vec::len),
            data
        }
    }

    /// True when `data` really is `rows × cols`. Deserialized matrices are
    /// not guaranteed to be, so models check this before use.
    pub fn is_rectangular(&self) -> bool {
        self.data.len() == self.rows && self.data.iter().all(|row| row.len() == self.cols)
    }

    /// Row-major flattening, converted to `f32`.
    pub fn to_f32_vec(&self) -> Vec<f32> {
        self.data.iter().flat_map(|row| row.iter().map(|&x| x as f32)).collect()
    }
}

impl Default for Matrix {
    fn default() -> Self {
        Matrix { rows: 0, cols: 0, data: vec![] }
    }
}

impl<'a> Add<&'a Matrix> for &'a Matrix {
    type Output = Matrix;

    fn add(self, rhs: &'a Matrix) -> Self::Output {
        if self.rows != rhs.rows || self.cols != rhs.cols {
            panic!("Matrices are of incorrect sizes")
        }

        let data = self.data.iter().zip(rhs.data.iter())
            .map(|(a, b)| a.iter().zip(b.iter()).map(|(x, y)| x + y).collect())
            .collect();
        Matrix { rows: self.rows, cols: self.cols, data }
    }
}

impl<'a> Mul<&'a Matrix> for &'a Matrix {
    type Output = Matrix;

    fn mul(self, rhs: &'a Matrix) -> Self::Output {
        if self.cols != rhs.rows {
            panic!("Matrices are of incorrect sizes")
        }

        let mut res = Matrix::zeros(self.rows, rhs.cols);

        for i in 0..res.rows {
            for k in 0..self.cols {
                let lhs = self.data[i][k];
                if lhs == 0.0 {
                    continue;
                }
                for j in 0..res.cols {
                    res.data[i][j] += lhs * rhs.data[k][j];
                }
            }
        }

        res
    }
}
