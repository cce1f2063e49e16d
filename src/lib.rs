//! Gaussian process regression over one-dimensional inputs.
//!
//! This crate fits a zero-mean Gaussian process with a
//! squared-exponential kernel to scalar observations and returns the
//! posterior mean and variance at arbitrary query points. The kernel
//! precision can be tuned by a fixed-step gradient ascent on the log
//! marginal likelihood. All of the dense linear algebra (Cholesky
//! factorization, triangular solves, inversion by repeated solves) is
//! done in-crate on plain `f64` buffers.
//!
//! # Quick start
//!
//! ```
//! use gpreg::consts::{DEFAULT_BANDWIDTH, DEFAULT_NOISE_PRECISION};
//! use gpreg::regress;
//!
//! let x: Vec<f64> = vec![0.0, 1.0, 2.0, 3.0, 4.0];
//! let y: Vec<f64> = x.iter().map(|x| x.sin()).collect();
//!
//! let post = regress(
//!     &x,
//!     &y,
//!     &[0.5, 1.5, 2.5],
//!     DEFAULT_BANDWIDTH,
//!     DEFAULT_NOISE_PRECISION,
//! )?;
//!
//! assert_eq!(post.len(), 3);
//! assert!(post.var.iter().all(|v| *v >= 0.0));
//! # Ok::<(), gpreg::GpError>(())
//! ```
//!
//! Training and prediction can also be split apart, so that one
//! factorization of the covariance matrix serves any number of
//! queries; see [`GaussianProcess`]. [`optimize`] refines the kernel
//! precision on the training data before fitting.
//!
//! # Feature flags
//!
//! - `serde1`: enable serialization/deserialization of the public value
//!   and error types via serde.

pub mod consts;
pub mod gp;
pub mod kernel;
pub mod matrix;
pub mod optimize;

pub use gp::{predict, regress, GaussianProcess, GpError, Posterior};
pub use kernel::{KernelError, RbfKernel};
pub use matrix::{dot, Cholesky, Matrix, MatrixError};
pub use optimize::{optimize, OptimizeParams};
