//! Presentation helpers shared by the inferential reports.

/// Significance stars for a p-value: `***` below 0.001, `**` below 0.01,
/// `*` below 0.05, empty otherwise (including NaN).
///
/// ```
/// # use prox_stats::stars;
/// assert_eq!(stars(0.0004), "***");
/// assert_eq!(stars(0.01), "*");
/// assert_eq!(stars(0.2), "");
/// ```
pub fn stars(p: f64) -> &'static str {
    if p < 0.001 {
        "***"
    } else if p < 0.01 {
        "**"
    } else if p < 0.05 {
        "*"
    } else {
        ""
    }
}

/// Rounds half away from zero to `digits` decimal places.
pub fn round_to(value: f64, digits: u32) -> f64 {
    let scale = 10f64.powi(digits as i32);
    (value * scale).round() / scale
}
