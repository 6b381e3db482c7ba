//! Strength of field from driver ratings.

use std::f64::consts::LN_2;

const BR: f64 = 1600.0 / LN_2;

/// Exponential strength-of-field over positive ratings
///
/// `SOF = BR * ln(n / sum(exp(-ir / BR)))` with `BR = 1600 / ln 2`.
/// Returns `None` when no rating is usable.
pub fn strength_of_field(ratings: &[i32]) -> Option<f64> {
    let (n, sum) = ratings
        .iter()
        .filter(|&&ir| ir > 0)
        .fold((0usize, 0.0f64), |(n, sum), &ir| {
            (n + 1, sum + (-(ir as f64) / BR).exp())
        });
    if n == 0 || sum <= 0.0 {
        return None;
    }
    Some(BR * (n as f64 / sum).ln())
}
