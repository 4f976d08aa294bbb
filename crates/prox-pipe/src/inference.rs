use prox_core::{ADJACENT_COUNT, AVG_NEAREST_DISTANCE};
use prox_stats::{round_to, stars, welch_t_test, LogisticFit, LogisticOptions};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::aggregate::{IndustryFrame, Metric};

/// Fewest complete rows accepted by the logistic model.
pub const MIN_LOGISTIC_ROWS: usize = 10;

/// Row of `ttest_<metric>.csv`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TTestRow {
    /// Industry name.
    pub industry: String,
    /// Survivors with a metric value.
    pub n_alive: usize,
    /// Closed businesses with a metric value.
    pub n_dead: usize,
    /// Welch t statistic, survivors minus closed.
    pub t: f64,
    /// Two-sided p-value.
    pub p: f64,
    /// Significance stars.
    pub significance: String,
}

/// Row of `logistic_summary.csv`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticRow {
    /// Industry name.
    pub industry: String,
    /// Coefficient of the average nearest distance.
    pub coef_distance: f64,
    /// Wald p-value of the distance coefficient.
    pub p_distance: f64,
    /// Stars for the distance coefficient.
    pub significance_distance: String,
    /// Coefficient of the adjacent count.
    pub coef_adjacency: f64,
    /// Wald p-value of the adjacency coefficient.
    pub p_adjacency: f64,
    /// Stars for the adjacency coefficient.
    pub significance_adjacency: String,
    /// Classification accuracy at 0.5.
    pub accuracy: f64,
    /// McFadden pseudo R².
    pub mcfadden_r2: f64,
    /// Rows used in the fit.
    pub n: usize,
}

/// Welch test of `metric` between survivors and closed businesses per industry.
///
/// Industries where either group has fewer than two values are left out.
pub fn welch_by_industry(frames: &[IndustryFrame], metric: Metric) -> Vec<TTestRow> {
    frames
        .iter()
        .filter_map(|frame| {
            let mut alive = Vec::new();
            let mut dead = Vec::new();
            for (label, value) in frame.survival.iter().zip(frame.metric(metric)) {
                match (label, value) {
                    (Some(true), Some(value)) => alive.push(*value),
                    (Some(false), Some(value)) => dead.push(*value),
                    _ => {}
                }
            }
            if alive.len() < 2 || dead.len() < 2 {
                debug!(industry = %frame.industry, metric = metric.slug(), "t-test skipped, group too small");
                return None;
            }
            match welch_t_test(&alive, &dead) {
                Ok(test) => Some(TTestRow {
                    industry: frame.industry.clone(),
                    n_alive: test.n_a,
                    n_dead: test.n_b,
                    t: round_to(test.t, 3),
                    p: round_to(test.p, 5),
                    significance: stars(test.p).to_string(),
                }),
                Err(err) => {
                    warn!(industry = %frame.industry, metric = metric.slug(), error = %err, "t-test skipped");
                    None
                }
            }
        })
        .collect()
}

/// Fits `survival ~ 1 + avg_nearest_distance + adjacent_count` per industry.
///
/// Rows missing any of the three values are dropped. Industries with fewer
/// than [`MIN_LOGISTIC_ROWS`] complete rows, a constant label, or a fit that
/// fails are left out.
pub fn logistic_by_industry(frames: &[IndustryFrame], options: &LogisticOptions) -> Vec<LogisticRow> {
    frames
        .iter()
        .filter_map(|frame| {
            let mut rows = Vec::new();
            let mut labels = Vec::new();
            for ((label, distance), count) in frame.survival.iter().zip(&frame.distance).zip(&frame.adjacency) {
                if let (Some(label), Some(distance), Some(count)) = (label, distance, count) {
                    rows.push(vec![*distance, *count]);
                    labels.push(*label);
                }
            }
            let positives = labels.iter().filter(|label| **label).count();
            if rows.len() < MIN_LOGISTIC_ROWS || positives == 0 || positives == labels.len() {
                debug!(industry = %frame.industry, rows = rows.len(), "logistic fit skipped");
                return None;
            }
            let fit = match LogisticFit::fit(&[AVG_NEAREST_DISTANCE, ADJACENT_COUNT], &rows, &labels, options) {
                Ok(fit) => fit,
                Err(err) => {
                    warn!(industry = %frame.industry, error = %err, "logistic fit skipped");
                    return None;
                }
            };
            let distance = fit.term(AVG_NEAREST_DISTANCE)?;
            let adjacency = fit.term(ADJACENT_COUNT)?;
            Some(LogisticRow {
                industry: frame.industry.clone(),
                coef_distance: round_to(distance.coefficient, 4),
                p_distance: round_to(distance.p, 5),
                significance_distance: stars(distance.p).to_string(),
                coef_adjacency: round_to(adjacency.coefficient, 4),
                p_adjacency: round_to(adjacency.p, 5),
                significance_adjacency: stars(adjacency.p).to_string(),
                accuracy: round_to(fit.accuracy, 3),
                mcfadden_r2: round_to(fit.mcfadden_r2, 4),
                n: fit.n,
            })
        })
        .collect()
}
