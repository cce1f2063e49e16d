//! Mathematical and default-parameter constants

/// 0.5 ln(2π)
pub const HALF_LN_2PI: f64 = 0.918_938_533_204_672_7;
/// Default bandwidth `h` for [`regress`](crate::regress)
pub const DEFAULT_BANDWIDTH: f64 = 3.0;
/// Default precision `t` for [`predict`](crate::predict)
pub const DEFAULT_PRECISION: f64 = 3.0;
/// Default observation-noise precision `beta`
pub const DEFAULT_NOISE_PRECISION: f64 = 30.0;
/// Default number of gradient-ascent steps for [`optimize`](crate::optimize)
pub const DEFAULT_ITERATIONS: usize = 100;
/// Default gradient-ascent step size for [`optimize`](crate::optimize)
pub const DEFAULT_LEARNING_RATE: f64 = 0.05;
