//! Welch's two-sample t-test.

use serde::{Deserialize, Serialize};

use prox_core::{ErrorInfo, ProxError};

use crate::codes::{INSUFFICIENT_SAMPLES, ZERO_VARIANCE};
use crate::descriptive::sample_variance;
use crate::special::student_t_two_sided;

/// Result of a two-sided Welch test of `mean(a) == mean(b)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WelchTest {
    /// Size of the first group.
    pub n_a: usize,
    /// Size of the second group.
    pub n_b: usize,
    /// t statistic; positive when the first group has the larger mean.
    pub t: f64,
    /// Welch-Satterthwaite degrees of freedom.
    pub df: f64,
    /// Two-sided p-value.
    pub p: f64,
}

/// Runs Welch's t-test on two independent samples.
///
/// Both groups need at least two observations, and at least one of them
/// must have non-zero variance.
pub fn welch_t_test(a: &[f64], b: &[f64]) -> Result<WelchTest, ProxError> {
    let (Some(var_a), Some(var_b)) = (sample_variance(a), sample_variance(b)) else {
        return Err(ProxError::Stats(
            ErrorInfo::new(INSUFFICIENT_SAMPLES, "each group needs at least two observations")
                .with_context("n_a", a.len().to_string())
                .with_context("n_b", b.len().to_string()),
        ));
    };
    let (n_a, n_b) = (a.len() as f64, b.len() as f64);
    let se_a = var_a / n_a;
    let se_b = var_b / n_b;
    let se = se_a + se_b;
    if se <= 0.0 {
        return Err(ProxError::Stats(ErrorInfo::new(
            ZERO_VARIANCE,
            "both groups are constant",
        )));
    }
    let mean_a = a.iter().sum::<f64>() / n_a;
    let mean_b = b.iter().sum::<f64>() / n_b;
    let t = (mean_a - mean_b) / se.sqrt();
    let df = se * se / (se_a * se_a / (n_a - 1.0) + se_b * se_b / (n_b - 1.0));
    Ok(WelchTest {
        n_a: a.len(),
        n_b: b.len(),
        t,
        df,
        p: student_t_two_sided(t, df),
    })
}
