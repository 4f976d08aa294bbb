#![deny(missing_docs)]
//! Statistics used by the survival reports.
//!
//! - [`descriptive`]: count, mean, sample standard deviation and range
//! - [`special`]: log-gamma, incomplete beta and gamma functions, tail probabilities
//! - [`ttest`]: Welch's unequal-variance two-sample t-test
//! - [`logistic`]: binary logistic regression fitted by Newton-Raphson (IRLS)
//! - [`significance`]: significance stars and fixed-precision rounding
//!
//! ```
//! use prox_stats::descriptive::Summary;
//!
//! let summary = Summary::new([2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]).unwrap();
//! assert_eq!(summary.mean, 5.0);
//! assert_eq!(summary.min, 2.0);
//! ```

pub mod descriptive;
pub mod logistic;
pub mod significance;
pub mod special;
pub mod ttest;

pub use descriptive::Summary;
pub use logistic::{LogisticFit, LogisticOptions, Term};
pub use significance::{round_to, stars};
pub use ttest::{welch_t_test, WelchTest};

/// Error codes reported through `ProxError::Stats`.
pub mod codes {
    /// A group had too few observations.
    pub const INSUFFICIENT_SAMPLES: &str = "stats_insufficient_samples";
    /// Both groups have zero variance.
    pub const ZERO_VARIANCE: &str = "stats_zero_variance";
    /// The response takes a single value.
    pub const CONSTANT_RESPONSE: &str = "stats_constant_response";
    /// The information matrix cannot be inverted.
    pub const SINGULAR_MATRIX: &str = "stats_singular_matrix";
    /// Newton iterations did not converge.
    pub const NOT_CONVERGED: &str = "stats_not_converged";
}
