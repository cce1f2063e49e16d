//! Dense matrix primitives backing the regression and optimizer routines.
//!
//! Everything here operates on owned row-major buffers. The flattened
//! index arithmetic lives behind the `Index` impls so callers never
//! compute `dim * i + j` themselves.

use std::fmt;
use std::ops::{Index, IndexMut};

#[cfg(feature = "serde1")]
use serde::{Deserialize, Serialize};

/// Dense square matrix stored in row-major order.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde1", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde1", serde(rename_all = "snake_case"))]
pub struct Matrix {
    dim: usize,
    data: Vec<f64>,
}

impl Matrix {
    /// Create a new matrix of all zeros
    #[must_use]
    pub fn zeros(dim: usize) -> Self {
        Self {
            dim,
            data: vec![0.0; dim * dim],
        }
    }

    /// Create the identity matrix
    #[must_use]
    pub fn identity(dim: usize) -> Self {
        Self::from_fn(dim, |i, j| if i == j { 1.0 } else { 0.0 })
    }

    /// Create a new matrix from a flattened row-major slice
    pub fn from_row_slice(dim: usize, slice: &[f64]) -> Result<Self, MatrixError> {
        if slice.len() == dim * dim {
            Ok(Self {
                dim,
                data: slice.to_vec(),
            })
        } else {
            Err(MatrixError::ImproperSize {
                expected: dim * dim,
                given: slice.len(),
            })
        }
    }

    /// Create a new matrix by evaluating `f` at each `(row, col)` pair
    pub fn from_fn<F>(dim: usize, mut f: F) -> Self
    where
        F: FnMut(usize, usize) -> f64,
    {
        let mut data = Vec::with_capacity(dim * dim);
        for i in 0..dim {
            for j in 0..dim {
                data.push(f(i, j));
            }
        }
        Self { dim, data }
    }

    /// Outer product `v·vᵗ` of a vector with itself
    #[must_use]
    pub fn outer(v: &[f64]) -> Self {
        Self::from_fn(v.len(), |i, j| v[i] * v[j])
    }

    /// Number of rows (equal to the number of columns)
    #[must_use]
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// A single row as a slice
    #[must_use]
    pub fn row(&self, i: usize) -> &[f64] {
        &self.data[self.dim * i..self.dim * (i + 1)]
    }

    /// Sum of the diagonal entries
    #[must_use]
    pub fn trace(&self) -> f64 {
        (0..self.dim).map(|i| self[(i, i)]).sum()
    }

    /// The transpose as a new matrix
    #[must_use]
    pub fn transpose(&self) -> Self {
        Self::from_fn(self.dim, |i, j| self[(j, i)])
    }

    /// Matrix-vector product
    pub fn mul_vec(&self, v: &[f64]) -> Vec<f64> {
        assert_eq!(
            v.len(),
            self.dim,
            "vector length must match the matrix dimension"
        );
        (0..self.dim).map(|i| dot(self.row(i), v)).collect()
    }

    /// Dense matrix product `self · other`
    pub fn matmul(&self, other: &Matrix) -> Result<Matrix, MatrixError> {
        if self.dim != other.dim {
            return Err(MatrixError::ShapeMismatch {
                left: self.dim,
                right: other.dim,
            });
        }
        let n = self.dim;
        let mut z = Matrix::zeros(n);
        for i in 0..n {
            for k in 0..n {
                let x_ik = self[(i, k)];
                for j in 0..n {
                    z[(i, j)] += x_ik * other[(k, j)];
                }
            }
        }
        Ok(z)
    }

    /// Entrywise difference `self - other`
    pub fn sub(&self, other: &Matrix) -> Result<Matrix, MatrixError> {
        if self.dim != other.dim {
            return Err(MatrixError::ShapeMismatch {
                left: self.dim,
                right: other.dim,
            });
        }
        let data = self
            .data
            .iter()
            .zip(other.data.iter())
            .map(|(a, b)| a - b)
            .collect();
        Ok(Matrix {
            dim: self.dim,
            data,
        })
    }

    /// Check if this is relatively eq to another matrix
    #[must_use]
    pub fn relative_eq(&self, other: &Matrix, rel: f64, abs: f64) -> bool {
        self.dim == other.dim
            && self
                .data
                .iter()
                .zip(other.data.iter())
                .all(|(a, b)| close(*a, *b, rel, abs))
    }

    /// Factor a symmetric positive-definite matrix into `L·Lᵗ` with `L`
    /// lower triangular.
    ///
    /// Proceeds column by column: the pivot `L[j,j]` is the square root
    /// of `A[j,j]` minus the squared entries already placed in row `j`,
    /// and the entries below it follow by substitution. A pivot that is
    /// not strictly positive means the input is not positive-definite,
    /// and the factorization is abandoned with
    /// [`MatrixError::NotPositiveDefinite`] rather than letting a NaN
    /// square root leak into downstream results.
    pub fn cholesky(&self) -> Result<Cholesky, MatrixError> {
        let n = self.dim;
        let mut l = Matrix::zeros(n);
        for j in 0..n {
            let mut s = 0.0;
            for k in 0..j {
                s += l[(j, k)] * l[(j, k)];
            }
            let d = self[(j, j)] - s;
            if d <= 0.0 || d.is_nan() {
                return Err(MatrixError::NotPositiveDefinite { column: j });
            }
            let l_jj = d.sqrt();
            l[(j, j)] = l_jj;
            for i in (j + 1)..n {
                let mut s = 0.0;
                for k in 0..j {
                    s += l[(i, k)] * l[(j, k)];
                }
                l[(i, j)] = (self[(i, j)] - s) / l_jj;
            }
        }
        Ok(Cholesky { l })
    }
}

impl Index<(usize, usize)> for Matrix {
    type Output = f64;

    fn index(&self, (i, j): (usize, usize)) -> &Self::Output {
        &self.data[self.dim * i + j]
    }
}

impl IndexMut<(usize, usize)> for Matrix {
    fn index_mut(&mut self, (i, j): (usize, usize)) -> &mut Self::Output {
        &mut self.data[self.dim * i + j]
    }
}

impl fmt::Display for Matrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for i in 0..self.dim {
            for j in 0..self.dim {
                write!(f, "{:>14.6}", self[(i, j)])?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// Lower-triangular Cholesky factor of a symmetric positive-definite
/// matrix.
///
/// Built by [`Matrix::cholesky`] and never mutated afterward. All solves
/// against the factored matrix reuse the one `O(n³)` factorization.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde1", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde1", serde(rename_all = "snake_case"))]
pub struct Cholesky {
    l: Matrix,
}

impl Cholesky {
    /// The lower-triangular factor `L`
    #[must_use]
    pub fn lower(&self) -> &Matrix {
        &self.l
    }

    /// Solve `L·y = b` by forward substitution
    pub fn solve_forward(&self, b: &[f64]) -> Vec<f64> {
        let n = self.l.dim();
        assert_eq!(b.len(), n, "rhs length must match the factor dimension");
        let mut y = vec![0.0; n];
        for j in 0..n {
            let mut s = 0.0;
            for k in 0..j {
                s += self.l[(j, k)] * y[k];
            }
            y[j] = (b[j] - s) / self.l[(j, j)];
        }
        y
    }

    /// Solve `Lᵗ·x = y` by backward substitution
    pub fn solve_backward(&self, y: &[f64]) -> Vec<f64> {
        let n = self.l.dim();
        assert_eq!(y.len(), n, "rhs length must match the factor dimension");
        let mut x = vec![0.0; n];
        for j in (0..n).rev() {
            let mut s = 0.0;
            for k in (j + 1)..n {
                s += self.l[(k, j)] * x[k];
            }
            x[j] = (y[j] - s) / self.l[(j, j)];
        }
        x
    }

    /// Solve `(L·Lᵗ)·x = b`
    pub fn solve(&self, b: &[f64]) -> Vec<f64> {
        self.solve_backward(&self.solve_forward(b))
    }

    /// The full inverse of the factored matrix, one basis-vector solve
    /// per column. Costs `O(n³)`.
    #[must_use]
    pub fn inverse(&self) -> Matrix {
        let n = self.l.dim();
        let mut inv = Matrix::zeros(n);
        let mut e = vec![0.0; n];
        for i in 0..n {
            e[i] = 1.0;
            let col = self.solve(&e);
            for (r, v) in col.iter().enumerate() {
                inv[(r, i)] = *v;
            }
            e[i] = 0.0;
        }
        inv
    }

    /// Log determinant of the factored matrix
    #[must_use]
    pub fn ln_det(&self) -> f64 {
        2.0 * (0..self.l.dim())
            .map(|j| self.l[(j, j)].ln())
            .sum::<f64>()
    }
}

/// Inner product of two equal-length vectors
pub fn dot(x: &[f64], y: &[f64]) -> f64 {
    assert_eq!(x.len(), y.len(), "dot requires equal-length vectors");
    x.iter().zip(y.iter()).map(|(a, b)| a * b).sum()
}

fn close(a: f64, b: f64, rel: f64, abs: f64) -> bool {
    let diff = (a - b).abs();
    diff <= abs || diff <= rel * a.abs().max(b.abs())
}

/// Error from a dense matrix operation
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde1", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde1", serde(rename_all = "snake_case"))]
pub enum MatrixError {
    /// The flattened buffer length does not match the requested dimension
    ImproperSize {
        /// Number of entries required by the dimension
        expected: usize,
        /// Number of entries given
        given: usize,
    },
    /// The operands have different dimensions
    ShapeMismatch {
        /// Dimension of the left operand
        left: usize,
        /// Dimension of the right operand
        right: usize,
    },
    /// A diagonal pivot was not strictly positive during factorization
    NotPositiveDefinite {
        /// Column at which the factorization failed
        column: usize,
    },
}

impl std::error::Error for MatrixError {}

impl fmt::Display for MatrixError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ImproperSize { expected, given } => write!(
                f,
                "Improper buffer length for dimension: expected {}, given {}",
                expected, given
            ),
            Self::ShapeMismatch { left, right } => write!(
                f,
                "Operand dimensions do not match: {} vs {}",
                left, right
            ),
            Self::NotPositiveDefinite { column } => write!(
                f,
                "Matrix is not positive-definite (factorization failed at column {})",
                column
            ),
        }
    }
}
