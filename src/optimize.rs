//! Fixed-step gradient ascent on the kernel precision.

#[cfg(feature = "serde1")]
use serde::{Deserialize, Serialize};

use crate::consts::{DEFAULT_ITERATIONS, DEFAULT_LEARNING_RATE};
use crate::gp::{validate_training_set, GpError};
use crate::kernel::RbfKernel;
use crate::matrix::Matrix;

/// Settings for the gradient ascent in [`optimize`]
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde1", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde1", serde(rename_all = "snake_case"))]
pub struct OptimizeParams {
    /// Number of ascent steps to take
    pub iterations: usize,
    /// Step size applied to the gradient
    pub learning_rate: f64,
}

impl OptimizeParams {
    /// Set the number of ascent steps
    #[must_use]
    pub fn with_iterations(self, iterations: usize) -> Self {
        Self { iterations, ..self }
    }

    /// Set the step size
    #[must_use]
    pub fn with_learning_rate(self, learning_rate: f64) -> Self {
        Self {
            learning_rate,
            ..self
        }
    }
}

impl Default for OptimizeParams {
    fn default() -> Self {
        Self {
            iterations: DEFAULT_ITERATIONS,
            learning_rate: DEFAULT_LEARNING_RATE,
        }
    }
}

/// Refine the kernel precision by gradient ascent on the log marginal
/// likelihood of the training data.
///
/// The precision starts at `1.0` and takes a fixed number of steps of
/// the form
///
/// ```math
///     t \leftarrow t + \eta \cdot \mathrm{tr}\left((a a^T - C^{-1})
///         \frac{\partial C}{\partial t}\right)
/// ```
///
/// where `a` solves `C·a = y`. There is no convergence check, no early
/// stopping, and no bound on `t`: a step size too large for the data
/// can drive the ascent somewhere the covariance matrix loses positive
/// definiteness, at which point the factorization on the next
/// iteration reports the failure.
///
/// With `iterations = 0` the initial value `1.0` is returned untouched.
pub fn optimize(
    x: &[f64],
    y: &[f64],
    beta: f64,
    params: &OptimizeParams,
) -> Result<f64, GpError> {
    validate_training_set(x, y, beta)?;

    let mut t = 1.0;
    for _ in 0..params.iterations {
        let kernel = RbfKernel::new_unchecked(t);
        let (c, dc) = kernel.gram_with_gradient(x, beta);

        let chol = c.cholesky()?;
        let alpha = chol.solve(y);

        let grad_dir =
            Matrix::outer(&alpha).sub(&chol.inverse())?.matmul(&dc)?;
        t += params.learning_rate * grad_dir.trace();
    }
    Ok(t)
}
