//! Gaussian process regression over one-dimensional inputs.

use std::fmt;

use itertools::izip;
use rand::Rng;
use rand_distr::StandardNormal;

#[cfg(feature = "serde1")]
use serde::{Deserialize, Serialize};

use crate::consts::HALF_LN_2PI;
use crate::kernel::{KernelError, RbfKernel};
use crate::matrix::{dot, Cholesky, MatrixError};

/// A Gaussian process trained on a fixed set of observations.
///
/// Training factors the regularized Gram matrix exactly once; every
/// query against the trained process reuses that factorization, so a
/// prediction at `m` points costs `O(m·n²)` after the `O(n³)` setup.
///
/// # Example
///
/// ```
/// use gpreg::{GaussianProcess, RbfKernel};
///
/// let x: Vec<f64> = vec![-4.0, -3.0, -2.0, -1.0, 1.0];
/// let y: Vec<f64> = x.iter().map(|x| x.sin()).collect();
///
/// let gp = GaussianProcess::train(RbfKernel::default(), &x, &y, 30.0)?;
/// let post = gp.predict(&[-2.5, 0.0]);
/// assert_eq!(post.len(), 2);
/// # Ok::<(), gpreg::GpError>(())
/// ```
#[derive(Clone, Debug)]
pub struct GaussianProcess<'a> {
    /// Covariance kernel
    kernel: RbfKernel,
    /// Observation-noise precision
    beta: f64,
    /// x values used in training
    x_train: &'a [f64],
    /// y values used in training
    y_train: &'a [f64],
    /// Cholesky factor of the regularized Gram matrix
    chol: Cholesky,
    /// Weight vector, the solution of `C·a = y`
    alpha: Vec<f64>,
}

impl<'a> GaussianProcess<'a> {
    /// Train a Gaussian process on the given data points
    ///
    /// # Arguments
    /// * `kernel` - Kernel to use to determine covariance
    /// * `x_train` - Values to use for input into `f`
    /// * `y_train` - Known values for `f(x)`
    /// * `beta` - Observation-noise precision; the noise variance
    ///   `1/beta` is added to the Gram diagonal
    pub fn train(
        kernel: RbfKernel,
        x_train: &'a [f64],
        y_train: &'a [f64],
        beta: f64,
    ) -> Result<Self, GpError> {
        validate_training_set(x_train, y_train, beta)?;

        let c = kernel.gram(x_train, beta);
        let chol = c.cholesky()?;
        let alpha = chol.solve(y_train);

        Ok(GaussianProcess {
            kernel,
            beta,
            x_train,
            y_train,
            chol,
            alpha,
        })
    }

    /// Posterior mean and variance at each query point.
    ///
    /// An empty query set yields an empty posterior.
    #[must_use]
    pub fn predict(&self, xt: &[f64]) -> Posterior {
        let mut mean = Vec::with_capacity(xt.len());
        let mut var = Vec::with_capacity(xt.len());
        for &xq in xt {
            let k = self.kernel.cross_covariance(self.x_train, xq);
            let v = self.chol.solve_forward(&k);
            mean.push(dot(&k, &self.alpha));
            var.push(
                self.kernel.covariance(xq, xq) + self.beta.recip()
                    - dot(&v, &v),
            );
        }
        Posterior { mean, var }
    }

    /// Log marginal likelihood of the training data under the current
    /// kernel
    #[must_use]
    pub fn ln_m(&self) -> f64 {
        let n = self.x_train.len() as f64;
        -0.5 * dot(self.y_train, &self.alpha) - 0.5 * self.chol.ln_det()
            - n * HALF_LN_2PI
    }

    /// Return the kernel being used in this GP
    #[must_use]
    pub fn kernel(&self) -> &RbfKernel {
        &self.kernel
    }

    /// The observation-noise precision
    #[must_use]
    pub fn beta(&self) -> f64 {
        self.beta
    }

    /// The weight vector `a`, the solution of `C·a = y`
    #[must_use]
    pub fn weights(&self) -> &[f64] {
        &self.alpha
    }

    /// The Cholesky factor of the regularized Gram matrix
    #[must_use]
    pub fn factor(&self) -> &Cholesky {
        &self.chol
    }
}

/// Posterior mean and variance at a set of query points.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde1", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde1", serde(rename_all = "snake_case"))]
pub struct Posterior {
    /// Posterior mean at each query point
    pub mean: Vec<f64>,
    /// Posterior variance at each query point
    pub var: Vec<f64>,
}

impl Posterior {
    /// Number of query points
    #[must_use]
    pub fn len(&self) -> usize {
        self.mean.len()
    }

    /// Whether the query set was empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.mean.is_empty()
    }

    /// Draw one value from the posterior marginal at each query point.
    ///
    /// Floating-point error can push a variance marginally below zero;
    /// such values are treated as zero spread.
    pub fn draw<R: Rng>(&self, rng: &mut R) -> Vec<f64> {
        izip!(&self.mean, &self.var)
            .map(|(&mu, &var)| {
                let z: f64 = rng.sample(StandardNormal);
                mu + var.max(0.0).sqrt() * z
            })
            .collect()
    }

    /// Return a number of draws from the posterior marginals
    pub fn sample<R: Rng>(&self, size: usize, rng: &mut R) -> Vec<Vec<f64>> {
        (0..size).map(|_| self.draw(rng)).collect()
    }
}

/// Posterior mean and variance at `xt`, with the kernel given in the
/// bandwidth form `exp(-d²/h)`.
///
/// Conventional defaults are
/// [`DEFAULT_BANDWIDTH`](crate::consts::DEFAULT_BANDWIDTH) and
/// [`DEFAULT_NOISE_PRECISION`](crate::consts::DEFAULT_NOISE_PRECISION).
pub fn regress(
    x: &[f64],
    y: &[f64],
    xt: &[f64],
    bandwidth: f64,
    beta: f64,
) -> Result<Posterior, GpError> {
    let kernel = RbfKernel::from_bandwidth(bandwidth)?;
    Ok(GaussianProcess::train(kernel, x, y, beta)?.predict(xt))
}

/// Posterior mean and variance at `xt`, with the kernel given in the
/// canonical precision form `exp(-d²·t)`.
///
/// Conventional defaults are
/// [`DEFAULT_PRECISION`](crate::consts::DEFAULT_PRECISION) and
/// [`DEFAULT_NOISE_PRECISION`](crate::consts::DEFAULT_NOISE_PRECISION).
pub fn predict(
    x: &[f64],
    y: &[f64],
    xt: &[f64],
    precision: f64,
    beta: f64,
) -> Result<Posterior, GpError> {
    let kernel = RbfKernel::new(precision)?;
    Ok(GaussianProcess::train(kernel, x, y, beta)?.predict(xt))
}

pub(crate) fn validate_training_set(
    x: &[f64],
    y: &[f64],
    beta: f64,
) -> Result<(), GpError> {
    if x.len() != y.len() {
        return Err(GpError::MismatchedInputs {
            x_len: x.len(),
            y_len: y.len(),
        });
    }
    if x.is_empty() {
        return Err(GpError::EmptyTrainingSet);
    }
    if beta <= 0.0 {
        return Err(GpError::NoisePrecisionOutOfBounds { given: beta });
    }
    Ok(())
}

/// Errors from training or querying a Gaussian process
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde1", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde1", serde(rename_all = "snake_case"))]
pub enum GpError {
    /// Training inputs and outputs have different lengths
    MismatchedInputs {
        /// Number of training inputs
        x_len: usize,
        /// Number of training outputs
        y_len: usize,
    },
    /// At least one training point is required
    EmptyTrainingSet,
    /// The noise precision must be positive
    NoisePrecisionOutOfBounds {
        /// Value given
        given: f64,
    },
    /// An invalid kernel parameter
    Kernel(KernelError),
    /// A dense linear-algebra operation failed
    Matrix(MatrixError),
}

impl std::error::Error for GpError {}

impl fmt::Display for GpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MismatchedInputs { x_len, y_len } => write!(
                f,
                "x and y must be the same length, given x: {}, y: {}",
                x_len, y_len
            ),
            Self::EmptyTrainingSet => {
                write!(f, "At least one training point is required")
            }
            Self::NoisePrecisionOutOfBounds { given } => write!(
                f,
                "Noise precision must be positive, given: {}",
                given
            ),
            Self::Kernel(e) => write!(f, "Invalid kernel: {}", e),
            Self::Matrix(e) => write!(f, "Linear algebra failure: {}", e),
        }
    }
}

impl From<KernelError> for GpError {
    fn from(e: KernelError) -> Self {
        Self::Kernel(e)
    }
}

impl From<MatrixError> for GpError {
    fn from(e: MatrixError) -> Self {
        Self::Matrix(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn predict_with_no_queries_is_empty() {
        let post = predict(&[0.0, 1.0], &[1.0, 2.0], &[], 1.0, 30.0).unwrap();
        assert!(post.is_empty());
        assert_eq!(post.len(), 0);
    }

    #[test]
    fn predict_three_point_scenario() {
        let x = [0.0, 1.0, 2.0];
        let y = [0.0, 1.0, 0.0];
        let post = predict(&x, &y, &[0.5, 1.5], 1.0, 30.0).unwrap();

        assert_eq!(post.len(), 2);
        for (mu, var) in post.mean.iter().zip(post.var.iter()) {
            assert!(mu.is_finite());
            assert!(var.is_finite());
            // the posterior variance never drops below the noise floor
            assert!(*var >= 30.0_f64.recip() - 1E-9);
        }
    }

    #[test]
    fn predict_interpolates_with_vanishing_noise() {
        let x = [0.0, 1.0, 2.0];
        let y = [0.0, 1.0, 0.0];
        let post = predict(&x, &y, &x, 1.0, 1E12).unwrap();

        for (mu, yi) in post.mean.iter().zip(y.iter()) {
            assert::close(*mu, *yi, 1E-6);
        }
        for var in &post.var {
            assert::close(*var, 0.0, 1E-6);
        }
    }

    #[test]
    fn predict_is_idempotent() {
        let x = [0.0, 1.0, 2.0, 3.0];
        let y = [0.5, -0.5, 1.5, 0.0];
        let xt = [0.25, 1.25, 2.25];
        let a = predict(&x, &y, &xt, 2.0, 30.0).unwrap();
        let b = predict(&x, &y, &xt, 2.0, 30.0).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn regress_matches_predict_at_reciprocal_parameter() {
        let x = [0.0, 1.0, 2.0];
        let y = [0.0, 1.0, 0.0];
        let xt = [0.5, 1.5];
        let from_h = regress(&x, &y, &xt, 2.0, 30.0).unwrap();
        let from_t = predict(&x, &y, &xt, 0.5, 30.0).unwrap();
        assert_eq!(from_h, from_t);
    }

    #[test]
    fn train_rejects_mismatched_inputs() {
        let res = GaussianProcess::train(
            RbfKernel::default(),
            &[0.0, 1.0],
            &[0.0],
            30.0,
        );
        assert_eq!(
            res.err(),
            Some(GpError::MismatchedInputs { x_len: 2, y_len: 1 })
        );
    }

    #[test]
    fn train_rejects_empty_training_set() {
        let res = GaussianProcess::train(RbfKernel::default(), &[], &[], 30.0);
        assert_eq!(res.err(), Some(GpError::EmptyTrainingSet));
    }

    #[test]
    fn train_rejects_non_positive_noise_precision() {
        let res =
            GaussianProcess::train(RbfKernel::default(), &[0.0], &[1.0], 0.0);
        assert_eq!(
            res.err(),
            Some(GpError::NoisePrecisionOutOfBounds { given: 0.0 })
        );
    }

    #[test]
    fn one_factorization_many_queries() {
        let x: [f64; 5] = [-4.0, -3.0, -2.0, -1.0, 1.0];
        let y: Vec<f64> = x.iter().map(|x| x.sin()).collect();
        let gp =
            GaussianProcess::train(RbfKernel::default(), &x, &y, 30.0).unwrap();

        let first = gp.predict(&[0.0]);
        let second = gp.predict(&[0.0, -2.5]);
        assert_eq!(first.mean[0], second.mean[0]);
        assert_eq!(first.var[0], second.var[0]);
    }

    #[test]
    fn ln_m_single_point() {
        // C = [[2]], a = y/2, so
        // ln m = -1/4 - ln(2)/2 - 0.5 ln(2 pi)
        let gp = GaussianProcess::train(
            RbfKernel::default(),
            &[0.0],
            &[1.0],
            1.0,
        )
        .unwrap();
        let expected = -0.25 - 0.5 * 2.0_f64.ln() - HALF_LN_2PI;
        assert::close(gp.ln_m(), expected, 1E-12);
    }

    #[test]
    fn draw_collapses_to_mean_at_zero_variance() {
        let post = Posterior {
            mean: vec![1.0, -2.0],
            var: vec![0.0, 0.0],
        };
        let mut rng = StdRng::seed_from_u64(0x1234);
        assert_eq!(post.draw(&mut rng), vec![1.0, -2.0]);
    }

    #[test]
    fn sample_returns_requested_size() {
        let x = [0.0, 1.0, 2.0];
        let y = [0.0, 1.0, 0.0];
        let post = predict(&x, &y, &[0.5, 1.5], 1.0, 30.0).unwrap();
        let mut rng = StdRng::seed_from_u64(0xABCD);
        let draws = post.sample(7, &mut rng);
        assert_eq!(draws.len(), 7);
        assert!(draws.iter().all(|d| d.len() == 2));
        assert!(draws.iter().flatten().all(|v| v.is_finite()));
    }
}
