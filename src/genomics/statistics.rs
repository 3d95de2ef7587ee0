//! Numeric helpers shared by the caller and the estimators.

/// Stand-in for `log(0)` that keeps log-space arithmetic finite.
pub const LOG_ZERO: f64 = -1e100;

/// Upper bound reported for Phred-scaled p-values.
pub const MAX_PHRED: f64 = 255.0;

/// Median of a list of qualities already sorted in ascending order.
///
/// Odd lengths yield the middle element, even lengths the mean of the two
/// central elements. Returns `None` for an empty list.
pub fn sorted_median(sorted: &[u8]) -> Option<f64> {
    debug_assert!(sorted.windows(2).all(|pair| pair[0] <= pair[1]));
    if sorted.is_empty() {
        return None;
    }

    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] as f64 + sorted[mid] as f64) / 2.0)
    } else {
        Some(sorted[mid] as f64)
    }
}

/// Convert a Phred quality into an error probability.
#[inline]
pub fn phred_to_error_prob(quality: u8) -> f64 {
    10f64.powf(-(quality as f64) / 10.0)
}

/// Phred-scale a p-value, capped at [`MAX_PHRED`].
pub fn pvalue_to_phred(pvalue: f64) -> f64 {
    if pvalue <= 0.0 {
        return MAX_PHRED;
    }
    (-10.0 * pvalue.log10()).clamp(0.0, MAX_PHRED)
}

/// `log(exp(log_a) + exp(log_b))` without leaving log space.
#[inline]
pub fn log_sum(log_a: f64, log_b: f64) -> f64 {
    if log_a > log_b {
        log_a + (log_b - log_a).exp().ln_1p()
    } else {
        log_b + (log_a - log_b).exp().ln_1p()
    }
}

/// Log-space sum of `log_probs[start..]`.
pub fn log_tail_sum(log_probs: &[f64], start: usize) -> f64 {
    log_probs[start..]
        .iter()
        .copied()
        .reduce(log_sum)
        .unwrap_or(LOG_ZERO)
}
