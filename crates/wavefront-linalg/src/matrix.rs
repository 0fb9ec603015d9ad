use std::ops::{Index, IndexMut};

/// Owned dense matrix of `f64` values in row-major order.
///
/// This is the collaborator type consumed and produced by [`crate::svd`]. It
/// deliberately exposes only the construction, indexing and composition
/// helpers the decomposition and its callers need; it is not a general
/// linear-algebra surface.
#[derive(Debug, Clone, PartialEq)]
pub struct Matrix {
    rows: usize,
    cols: usize,
    data: Vec<f64>,
}

impl Matrix {
    /// Create a `rows` x `cols` matrix filled with zeros.
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            data: vec![0.0; rows * cols],
        }
    }

    /// Create the `size` x `size` identity matrix.
    pub fn identity(size: usize) -> Self {
        let mut out = Self::zeros(size, size);
        for i in 0..size {
            out[(i, i)] = 1.0;
        }
        out
    }

    /// Create a matrix from fixed-width rows.
    ///
    /// Example:
    ///
    /// ```
    /// use wavefront_linalg::matrix::Matrix;
    ///
    /// let a = Matrix::from_rows(&[[1.0, 2.0], [3.0, 4.0]]);
    /// assert_eq!(a[(1, 0)], 3.0);
    /// ```
    pub fn from_rows<const N: usize>(rows: &[[f64; N]]) -> Self {
        let mut out = Self::zeros(rows.len(), N);
        for (i, row) in rows.iter().enumerate() {
            out.data[i * N..(i + 1) * N].copy_from_slice(row);
        }
        out
    }

    /// Create a matrix whose entries are produced by `f(row, col)`.
    pub fn from_fn<F>(rows: usize, cols: usize, mut f: F) -> Self
    where
        F: FnMut(usize, usize) -> f64,
    {
        let mut out = Self::zeros(rows, cols);
        for i in 0..rows {
            for j in 0..cols {
                out[(i, j)] = f(i, j);
            }
        }
        out
    }

    /// Number of rows.
    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Number of columns.
    #[inline]
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// The underlying row-major storage.
    #[inline]
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    /// Transposed copy of the matrix.
    pub fn transpose(&self) -> Matrix {
        Matrix::from_fn(self.cols, self.rows, |i, j| self[(j, i)])
    }

    /// Matrix product `self * other`.
    ///
    /// PRECONDITION: `self.cols() == other.rows()`.
    pub fn matmul(&self, other: &Matrix) -> Matrix {
        assert_eq!(self.cols, other.rows);

        let mut out = Matrix::zeros(self.rows, other.cols);
        for i in 0..self.rows {
            for k in 0..self.cols {
                let lhs = self[(i, k)];
                for j in 0..other.cols {
                    out[(i, j)] += lhs * other[(k, j)];
                }
            }
        }
        out
    }

    /// Largest entry-wise absolute difference between `self` and `other`.
    ///
    /// PRECONDITION: both matrices have the same shape.
    pub fn max_abs_diff(&self, other: &Matrix) -> f64 {
        assert_eq!(self.rows, other.rows);
        assert_eq!(self.cols, other.cols);

        self.data
            .iter()
            .zip(other.data.iter())
            .map(|(a, b)| (a - b).abs())
            .fold(0.0, f64::max)
    }
}

impl Index<(usize, usize)> for Matrix {
    type Output = f64;

    #[inline]
    fn index(&self, (row, col): (usize, usize)) -> &f64 {
        &self.data[row * self.cols + col]
    }
}

impl IndexMut<(usize, usize)> for Matrix {
    #[inline]
    fn index_mut(&mut self, (row, col): (usize, usize)) -> &mut f64 {
        &mut self.data[row * self.cols + col]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_rows_and_index() {
        let a = Matrix::from_rows(&[[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]]);
        assert_eq!(a.rows(), 2);
        assert_eq!(a.cols(), 3);
        assert_eq!(a[(0, 2)], 3.0);
        assert_eq!(a[(1, 1)], 5.0);
    }

    #[test]
    fn test_identity() {
        let eye = Matrix::identity(3);
        for i in 0..3 {
            for j in 0..3 {
                assert_eq!(eye[(i, j)], if i == j { 1.0 } else { 0.0 });
            }
        }
    }

    #[test]
    fn test_transpose() {
        let a = Matrix::from_rows(&[[1.0, 2.0], [3.0, 4.0], [5.0, 6.0]]);
        let at = a.transpose();
        assert_eq!(at.rows(), 2);
        assert_eq!(at.cols(), 3);
        assert_eq!(at[(0, 2)], 5.0);
        assert_eq!(at[(1, 0)], 2.0);
    }

    #[test]
    fn test_matmul() {
        let a = Matrix::from_rows(&[[1.0, 2.0], [3.0, 4.0]]);
        let b = Matrix::from_rows(&[[5.0, 6.0], [7.0, 8.0]]);
        let c = a.matmul(&b);
        assert_eq!(c[(0, 0)], 19.0);
        assert_eq!(c[(0, 1)], 22.0);
        assert_eq!(c[(1, 0)], 43.0);
        assert_eq!(c[(1, 1)], 50.0);
    }

    #[test]
    fn test_matmul_identity() {
        let a = Matrix::from_rows(&[[1.0, 2.0], [3.0, 4.0], [5.0, 6.0]]);
        let product = a.matmul(&Matrix::identity(2));
        assert_eq!(product, a);
    }

    #[test]
    fn test_max_abs_diff() {
        let a = Matrix::from_rows(&[[1.0, 2.0], [3.0, 4.0]]);
        let b = Matrix::from_rows(&[[1.0, 2.5], [2.0, 4.0]]);
        assert_eq!(a.max_abs_diff(&b), 1.0);
        assert_eq!(a.max_abs_diff(&a), 0.0);
    }
}
