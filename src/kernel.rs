//! Squared-exponential covariance over scalar inputs.

use std::fmt;

#[cfg(feature = "serde1")]
use serde::{Deserialize, Serialize};

use crate::matrix::Matrix;

/// Squared-exponential (RBF) kernel over scalar inputs.
///
/// ```math
///     k(x_1, x_2) = \exp\left(-(x_1 - x_2)^2 \cdot t\right)
/// ```
///
/// The precision `t` is the canonical parameterization. The equivalent
/// bandwidth form `exp(-(x_1 - x_2)^2 / h)` has `h = 1/t`; use
/// [`RbfKernel::from_bandwidth`] to convert at the boundary instead of
/// carrying both conventions through the math.
///
/// # Parameters
/// * `precision` - Inverse squared length scale.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde1", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde1", serde(rename_all = "snake_case"))]
pub struct RbfKernel {
    precision: f64,
}

impl RbfKernel {
    /// Create a new rbf kernel with the given precision
    pub fn new(precision: f64) -> Result<Self, KernelError> {
        if precision <= 0.0 {
            Err(KernelError::ParameterOutOfBounds {
                name: "precision".to_string(),
                given: precision,
                bounds: (0.0, f64::INFINITY),
            })
        } else {
            Ok(Self { precision })
        }
    }

    /// Create a new `RbfKernel` without checking the parameter
    #[must_use]
    pub fn new_unchecked(precision: f64) -> Self {
        Self { precision }
    }

    /// Create the kernel from the bandwidth form `exp(-d²/h)`,
    /// converting the bandwidth into the canonical precision `t = 1/h`
    pub fn from_bandwidth(bandwidth: f64) -> Result<Self, KernelError> {
        if bandwidth <= 0.0 {
            Err(KernelError::ParameterOutOfBounds {
                name: "bandwidth".to_string(),
                given: bandwidth,
                bounds: (0.0, f64::INFINITY),
            })
        } else {
            Ok(Self {
                precision: bandwidth.recip(),
            })
        }
    }

    /// The precision `t`
    #[must_use]
    pub fn precision(&self) -> f64 {
        self.precision
    }

    /// The bandwidth `h = 1/t`
    #[must_use]
    pub fn bandwidth(&self) -> f64 {
        self.precision.recip()
    }

    /// Covariance between two scalar inputs
    #[must_use]
    pub fn covariance(&self, x1: f64, x2: f64) -> f64 {
        let d = x1 - x2;
        (-d * d * self.precision).exp()
    }

    /// Derivative of the covariance with respect to the precision,
    /// `-d²·exp(-d²·t)`
    #[must_use]
    pub fn grad_precision(&self, x1: f64, x2: f64) -> f64 {
        let d = x1 - x2;
        let d2 = d * d;
        -d2 * (-d2 * self.precision).exp()
    }

    /// The regularized Gram matrix over the training inputs,
    /// `C[i,j] = k(x[i], x[j]) + (i == j)/beta`.
    ///
    /// The diagonal noise term keeps the matrix positive-definite even
    /// when two training inputs coincide.
    #[must_use]
    pub fn gram(&self, x: &[f64], beta: f64) -> Matrix {
        let n = x.len();
        let mut c = Matrix::zeros(n);
        for i in 0..n {
            for j in 0..i {
                let cov = self.covariance(x[i], x[j]);
                c[(i, j)] = cov;
                c[(j, i)] = cov;
            }
            c[(i, i)] = self.covariance(x[i], x[i]) + beta.recip();
        }
        c
    }

    /// The regularized Gram matrix together with its entrywise
    /// derivative with respect to the precision.
    ///
    /// The derivative vanishes on the diagonal since the distance there
    /// is zero.
    #[must_use]
    pub fn gram_with_gradient(&self, x: &[f64], beta: f64) -> (Matrix, Matrix) {
        let n = x.len();
        let mut c = Matrix::zeros(n);
        let mut grad = Matrix::zeros(n);
        for i in 0..n {
            for j in 0..i {
                let cov = self.covariance(x[i], x[j]);
                c[(i, j)] = cov;
                c[(j, i)] = cov;

                let dc = self.grad_precision(x[i], x[j]);
                grad[(i, j)] = dc;
                grad[(j, i)] = dc;
            }
            c[(i, i)] = self.covariance(x[i], x[i]) + beta.recip();
        }
        (c, grad)
    }

    /// Covariance between every training input and one query point
    #[must_use]
    pub fn cross_covariance(&self, x: &[f64], xt: f64) -> Vec<f64> {
        x.iter().map(|&xi| self.covariance(xi, xt)).collect()
    }
}

impl Default for RbfKernel {
    fn default() -> Self {
        Self { precision: 1.0 }
    }
}

/// Errors from kernel construction
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde1", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde1", serde(rename_all = "snake_case"))]
pub enum KernelError {
    /// Parameter out of bounds
    ParameterOutOfBounds {
        /// Name of parameter
        name: String,
        /// Value given
        given: f64,
        /// Lower and upper bounds on value
        bounds: (f64, f64),
    },
}

impl std::error::Error for KernelError {}

impl fmt::Display for KernelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ParameterOutOfBounds {
                name,
                given,
                bounds,
            } => write!(
                f,
                "Parameter {} is out of bounds ({}, {}), given: {}",
                name, bounds.0, bounds.1, given
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn covariance_is_one_at_zero_distance() {
        let kernel = RbfKernel::default();
        assert::close(kernel.covariance(2.5, 2.5), 1.0, 1E-12);
    }

    #[test]
    fn covariance_is_symmetric() {
        let kernel = RbfKernel::new(0.7).unwrap();
        assert::close(
            kernel.covariance(0.3, 1.9),
            kernel.covariance(1.9, 0.3),
            1E-12,
        );
    }

    #[test]
    fn covariance_known_value() {
        // t = 1, d = 1 => exp(-1)
        let kernel = RbfKernel::default();
        assert::close(kernel.covariance(0.0, 1.0), (-1.0_f64).exp(), 1E-12);
    }

    #[test]
    fn bandwidth_is_reciprocal_precision() {
        let from_h = RbfKernel::from_bandwidth(4.0).unwrap();
        let from_t = RbfKernel::new(0.25).unwrap();
        assert_eq!(from_h, from_t);
        assert::close(from_h.bandwidth(), 4.0, 1E-12);
    }

    #[test]
    fn rejects_non_positive_parameters() {
        assert!(RbfKernel::new(0.0).is_err());
        assert!(RbfKernel::new(-1.0).is_err());
        assert!(RbfKernel::from_bandwidth(0.0).is_err());
    }

    #[test]
    fn grad_precision_matches_finite_difference() {
        let t = 0.8;
        let eps = 1E-6;
        let (x1, x2) = (0.4, 1.7);
        let hi = RbfKernel::new(t + eps).unwrap().covariance(x1, x2);
        let lo = RbfKernel::new(t - eps).unwrap().covariance(x1, x2);
        let fd = (hi - lo) / (2.0 * eps);
        let grad = RbfKernel::new(t).unwrap().grad_precision(x1, x2);
        assert::close(grad, fd, 1E-8);
    }

    #[test]
    fn gram_known_values() {
        let kernel = RbfKernel::default();
        let c = kernel.gram(&[0.0, 1.0], 2.0);
        assert::close(c[(0, 0)], 1.5, 1E-12);
        assert::close(c[(1, 1)], 1.5, 1E-12);
        assert::close(c[(0, 1)], (-1.0_f64).exp(), 1E-12);
        assert::close(c[(1, 0)], (-1.0_f64).exp(), 1E-12);
    }

    #[test]
    fn gram_gradient_vanishes_on_diagonal() {
        let kernel = RbfKernel::default();
        let (c, grad) = kernel.gram_with_gradient(&[0.0, 1.0, 2.0], 30.0);
        for i in 0..3 {
            assert::close(grad[(i, i)], 0.0, 1E-12);
        }
        // the covariance part matches the plain assembly
        assert!(c.relative_eq(&kernel.gram(&[0.0, 1.0, 2.0], 30.0), 1E-12, 1E-12));
        assert::close(grad[(0, 1)], -(-1.0_f64).exp(), 1E-12);
    }

    #[test]
    fn gram_with_duplicate_inputs_stays_positive_definite() {
        let kernel = RbfKernel::default();
        let c = kernel.gram(&[1.0, 1.0, 1.0], 30.0);
        assert!(c.cholesky().is_ok());
    }
}
