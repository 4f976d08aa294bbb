use prox_stats::{round_to, Summary};
use serde::{Deserialize, Serialize};

use crate::aggregate::{IndustryFrame, Metric};

/// Row of `industry_counts.csv`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndustryCount {
    /// Industry name.
    pub industry: String,
    /// Businesses in the industry table.
    pub rows: usize,
    /// Share of all businesses, in percent, rounded to two places.
    pub percentage: f64,
}

/// Row of `survival_by_<metric>.csv`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurvivalRow {
    /// Industry name.
    pub industry: String,
    /// Businesses in the industry table.
    pub total: usize,
    /// Businesses labelled as survivors.
    pub survived: usize,
    /// `100 − survival %`.
    pub closure_rate: f64,
    /// Mean of the metric.
    pub mean: Option<f64>,
    /// Sample standard deviation of the metric.
    pub std: Option<f64>,
    /// Largest value of the metric.
    pub max: Option<f64>,
    /// Smallest value of the metric.
    pub min: Option<f64>,
}

/// Businesses per industry and their share of the total.
pub fn industry_counts(frames: &[IndustryFrame]) -> Vec<IndustryCount> {
    let total: usize = frames.iter().map(IndustryFrame::rows).sum();
    frames
        .iter()
        .map(|frame| IndustryCount {
            industry: frame.industry.clone(),
            rows: frame.rows(),
            percentage: if total == 0 {
                0.0
            } else {
                round_to(frame.rows() as f64 / total as f64 * 100.0, 2)
            },
        })
        .collect()
}

/// Closure rate and the spread of `metric` per industry, rounded to two places.
pub fn survival_by_metric(frames: &[IndustryFrame], metric: Metric) -> Vec<SurvivalRow> {
    frames
        .iter()
        .map(|frame| {
            let total = frame.rows();
            let survived = frame.survival.iter().filter(|label| **label == Some(true)).count();
            let survival_rate = if total == 0 {
                0.0
            } else {
                survived as f64 / total as f64 * 100.0
            };
            let summary = Summary::new(frame.metric(metric).iter().flatten().copied());
            let round = |value: f64| round_to(value, 2);
            SurvivalRow {
                industry: frame.industry.clone(),
                total,
                survived,
                closure_rate: round(100.0 - survival_rate),
                mean: summary.as_ref().map(|s| round(s.mean)),
                std: summary.as_ref().and_then(|s| s.std_dev).map(round),
                max: summary.as_ref().map(|s| round(s.max)),
                min: summary.as_ref().map(|s| round(s.min)),
            }
        })
        .collect()
}
