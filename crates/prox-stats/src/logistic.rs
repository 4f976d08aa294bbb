//! Binary logistic regression by Newton-Raphson maximum likelihood.
//!
//! The model always carries an intercept, reported as the term `const`.
//! Each Newton step solves `H Δ = Xᵀ(y − p)` with `H = Xᵀ W X` and
//! `W = diag(p (1 − p))` through a Cholesky factor of `H`; iteration stops once the largest coefficient
//! update drops below the tolerance. Standard errors come from the inverse
//! information matrix at the optimum and p-values from the normal
//! approximation to the Wald statistic.

use nalgebra::{Cholesky, DMatrix, DVector, Dyn};
use serde::{Deserialize, Serialize};

use prox_core::{ErrorInfo, ProxError};

use crate::codes::{CONSTANT_RESPONSE, INSUFFICIENT_SAMPLES, NOT_CONVERGED, SINGULAR_MATRIX};
use crate::special::normal_two_sided;

/// Name of the intercept term.
pub const INTERCEPT: &str = "const";

/// Newton iteration controls.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LogisticOptions {
    /// Iteration cap.
    #[serde(default = "LogisticOptions::default_max_iterations")]
    pub max_iterations: usize,
    /// Convergence threshold on the largest absolute coefficient update.
    #[serde(default = "LogisticOptions::default_tolerance")]
    pub tolerance: f64,
}

impl LogisticOptions {
    fn default_max_iterations() -> usize {
        35
    }

    fn default_tolerance() -> f64 {
        1e-8
    }
}

impl Default for LogisticOptions {
    fn default() -> Self {
        Self {
            max_iterations: Self::default_max_iterations(),
            tolerance: Self::default_tolerance(),
        }
    }
}

/// One fitted coefficient.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Term {
    /// Predictor name, or [`INTERCEPT`].
    pub name: String,
    /// Maximum likelihood estimate.
    pub coefficient: f64,
    /// Asymptotic standard error.
    pub std_error: f64,
    /// Wald statistic `coefficient / std_error`.
    pub z: f64,
    /// Two-sided Wald p-value.
    pub p: f64,
}

/// A fitted model with its goodness-of-fit measures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticFit {
    /// Intercept followed by the predictors in input order.
    pub terms: Vec<Term>,
    /// Newton iterations performed.
    pub iterations: usize,
    /// Log-likelihood at the optimum.
    pub log_likelihood: f64,
    /// Log-likelihood of the intercept-only model.
    pub null_log_likelihood: f64,
    /// McFadden pseudo R²: `1 − ll / ll_null`.
    pub mcfadden_r2: f64,
    /// Share of observations classified correctly at the 0.5 threshold.
    pub accuracy: f64,
    /// Number of observations.
    pub n: usize,
}

impl LogisticFit {
    /// Fits `label ~ 1 + predictors`.
    ///
    /// `rows[i]` holds the predictor values of observation `i` in the order of
    /// `names`. Fails when there are no more observations than parameters, the
    /// response is constant, the information matrix is singular, or Newton
    /// iterations do not converge (for instance under perfect separation).
    pub fn fit(
        names: &[&str],
        rows: &[Vec<f64>],
        labels: &[bool],
        options: &LogisticOptions,
    ) -> Result<Self, ProxError> {
        let k = names.len() + 1;
        let n = rows.len().min(labels.len());
        if n <= k {
            return Err(ProxError::Stats(
                ErrorInfo::new(INSUFFICIENT_SAMPLES, "too few observations for the model")
                    .with_context("observations", n.to_string())
                    .with_context("parameters", k.to_string()),
            ));
        }
        let positives = labels[..n].iter().filter(|label| **label).count();
        if positives == 0 || positives == n {
            return Err(ProxError::Stats(ErrorInfo::new(
                CONSTANT_RESPONSE,
                "response takes a single value",
            )));
        }

        let design = DMatrix::from_fn(n, k, |i, j| {
            if j == 0 {
                1.0
            } else {
                rows[i].get(j - 1).copied().unwrap_or(0.0)
            }
        });
        let y = DVector::from_iterator(n, labels[..n].iter().map(|&label| f64::from(u8::from(label))));

        let mut beta = DVector::zeros(k);
        let mut iterations = 0;
        let mut converged = false;
        while iterations < options.max_iterations {
            iterations += 1;
            let (gradient, information) = score_and_information(&design, &y, &beta);
            let step = factor(information).ok_or_else(singular)?.solve(&gradient);
            beta += &step;
            let largest = step.amax();
            if !largest.is_finite() || beta.iter().any(|b| !b.is_finite()) {
                break;
            }
            if largest < options.tolerance {
                converged = true;
                break;
            }
        }
        if !converged {
            return Err(ProxError::Stats(
                ErrorInfo::new(NOT_CONVERGED, "maximum likelihood did not converge")
                    .with_context("iterations", iterations.to_string())
                    .with_hint("check for perfect separation between the groups"),
            ));
        }

        let (_, information) = score_and_information(&design, &y, &beta);
        let covariance = factor(information).ok_or_else(singular)?.inverse();
        let terms = std::iter::once(INTERCEPT)
            .chain(names.iter().copied())
            .zip(beta.iter())
            .enumerate()
            .map(|(i, (name, &coefficient))| {
                let std_error = covariance[(i, i)].max(0.0).sqrt();
                let z = coefficient / std_error;
                Term {
                    name: name.to_string(),
                    coefficient,
                    std_error,
                    z,
                    p: normal_two_sided(z),
                }
            })
            .collect();

        let eta = &design * &beta;
        let mut log_likelihood = 0.0;
        let mut correct = 0usize;
        for (&eta, &target) in eta.iter().zip(y.iter()) {
            log_likelihood += target * eta - softplus(eta);
            if (sigmoid(eta) >= 0.5) == (target == 1.0) {
                correct += 1;
            }
        }
        let rate = positives as f64 / n as f64;
        let null_log_likelihood = n as f64 * (rate * rate.ln() + (1.0 - rate) * (1.0 - rate).ln());

        Ok(Self {
            terms,
            iterations,
            log_likelihood,
            null_log_likelihood,
            mcfadden_r2: 1.0 - log_likelihood / null_log_likelihood,
            accuracy: correct as f64 / n as f64,
            n,
        })
    }

    /// Looks up a term by name.
    pub fn term(&self, name: &str) -> Option<&Term> {
        self.terms.iter().find(|term| term.name == name)
    }

    /// Predicted probability of a positive label for one observation.
    pub fn predict(&self, row: &[f64]) -> f64 {
        let eta = self.terms.iter().enumerate().fold(0.0, |acc, (i, term)| {
            let x = if i == 0 { 1.0 } else { row.get(i - 1).copied().unwrap_or(0.0) };
            acc + term.coefficient * x
        });
        sigmoid(eta)
    }
}

fn singular() -> ProxError {
    ProxError::Stats(ErrorInfo::new(
        SINGULAR_MATRIX,
        "information matrix is singular",
    ))
}

fn sigmoid(eta: f64) -> f64 {
    if eta >= 0.0 {
        1.0 / (1.0 + (-eta).exp())
    } else {
        let e = eta.exp();
        e / (1.0 + e)
    }
}

/// `ln(1 + e^eta)` without overflow.
fn softplus(eta: f64) -> f64 {
    if eta > 0.0 {
        eta + (-eta).exp().ln_1p()
    } else {
        eta.exp().ln_1p()
    }
}

fn score_and_information(
    design: &DMatrix<f64>,
    y: &DVector<f64>,
    beta: &DVector<f64>,
) -> (DVector<f64>, DMatrix<f64>) {
    let p = (design * beta).map(sigmoid);
    let gradient = design.tr_mul(&(y - &p));
    let mut weighted = design.clone();
    for (i, &p) in p.iter().enumerate() {
        weighted.row_mut(i).scale_mut(p * (1.0 - p));
    }
    (gradient, design.tr_mul(&weighted))
}

/// Cholesky factor of the information matrix; `None` when it is not
/// numerically positive definite.
fn factor(information: DMatrix<f64>) -> Option<Cholesky<f64, Dyn>> {
    let scale = information.diagonal().amax();
    if !scale.is_finite() || scale <= 0.0 {
        return None;
    }
    let cholesky = information.cholesky()?;
    let smallest = cholesky.l_dirty().diagonal().iter().fold(f64::INFINITY, |acc, d| acc.min(d * d));
    (smallest > scale * 1e-13).then_some(cholesky)
}
