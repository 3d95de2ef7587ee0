//! Significance estimation for non-consensus base counts.
//!
//! The column caller only sees the [`SignificanceEstimator`] trait. The
//! bundled [`PoissonBinomialEstimator`] treats every quality in the column as
//! an independent error probability and asks how likely it is to see at
//! least the observed number of non-consensus bases by sequencing error
//! alone.

use thiserror::Error;
use tracing::trace;

use crate::genomics::statistics::{log_sum, log_tail_sum, phred_to_error_prob, LOG_ZERO};

/// Sentinel p-value for counts that were never evaluated because they
/// cannot be significant.
pub const UNCOMPUTED_PVALUE: f64 = f64::MAX;

/// Errors reported by significance estimators.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum EstimatorError {
    /// A non-consensus count exceeds the number of observations in the column.
    #[error("non-consensus count {count} exceeds the {depth} observations in the column")]
    CountExceedsDepth {
        /// Largest count requested.
        count: u32,
        /// Number of qualities supplied.
        depth: usize,
    },
    /// Estimator-specific failure.
    #[error("estimator failure: {0}")]
    Failed(String),
}

/// Turns column quality evidence into one p-value per non-consensus count.
pub trait SignificanceEstimator: Send + Sync {
    /// Estimate p-values for `noncons_counts` under the error model defined
    /// by `sorted_qualities`.
    ///
    /// The result has the same length and order as `noncons_counts`.
    fn estimate(
        &self,
        sorted_qualities: &[u8],
        noncons_counts: &[u32],
        bonf_factor: u64,
        sig_thresh: f64,
    ) -> Result<Vec<f64>, EstimatorError>;
}

impl<F> SignificanceEstimator for F
where
    F: Fn(&[u8], &[u32], u64, f64) -> Result<Vec<f64>, EstimatorError> + Send + Sync,
{
    fn estimate(
        &self,
        sorted_qualities: &[u8],
        noncons_counts: &[u32],
        bonf_factor: u64,
        sig_thresh: f64,
    ) -> Result<Vec<f64>, EstimatorError> {
        self(sorted_qualities, noncons_counts, bonf_factor, sig_thresh)
    }
}

/// Poisson-binomial tail test over per-base error probabilities.
#[derive(Debug, Clone, Copy, Default)]
pub struct PoissonBinomialEstimator;

impl PoissonBinomialEstimator {
    /// Create a new estimator.
    pub fn new() -> Self {
        Self
    }
}

impl SignificanceEstimator for PoissonBinomialEstimator {
    fn estimate(
        &self,
        sorted_qualities: &[u8],
        noncons_counts: &[u32],
        bonf_factor: u64,
        sig_thresh: f64,
    ) -> Result<Vec<f64>, EstimatorError> {
        let mut pvalues = vec![UNCOMPUTED_PVALUE; noncons_counts.len()];

        let max_count = noncons_counts.iter().copied().max().unwrap_or(0);
        if max_count == 0 {
            return Ok(pvalues);
        }
        if max_count as usize > sorted_qualities.len() {
            return Err(EstimatorError::CountExceedsDepth {
                count: max_count,
                depth: sorted_qualities.len(),
            });
        }

        let err_probs: Vec<f64> = sorted_qualities
            .iter()
            .map(|&quality| phred_to_error_prob(quality))
            .collect();

        let Some(log_probs) =
            pruned_error_distribution(&err_probs, max_count as usize, bonf_factor, sig_thresh)
        else {
            trace!(max_count, "largest non-consensus count is not significant");
            return Ok(pvalues);
        };

        for (pvalue, &count) in pvalues.iter_mut().zip(noncons_counts) {
            if count > 0 {
                *pvalue = log_tail_sum(&log_probs, count as usize).exp();
            }
        }
        Ok(pvalues)
    }
}

fn log_probs(p: f64) -> (f64, f64) {
    let log_p = if p.abs() < f64::EPSILON {
        f64::EPSILON.ln()
    } else {
        p.ln()
    };
    let log_1_p = if (p - 1.0).abs() < f64::EPSILON {
        (-p + f64::EPSILON).ln_1p()
    } else {
        (-p).ln_1p()
    };
    (log_p, log_1_p)
}

/// Log-space distribution of the number of errors among `err_probs`,
/// truncated at `k`.
///
/// Entries `0..k` hold `log P(X = i)`, entry `k` holds `log P(X >= k)`.
/// Returns `None` as soon as `P(X >= k)` is known to be insignificant after
/// correction; the tail only grows as more observations are added.
fn pruned_error_distribution(
    err_probs: &[f64],
    k: usize,
    bonf_factor: u64,
    sig_thresh: f64,
) -> Option<Vec<f64>> {
    debug_assert!(k >= 1);

    let mut prev = vec![LOG_ZERO; k + 1];
    let mut cur = vec![LOG_ZERO; k + 1];
    prev[0] = 0.0;

    for (idx, &p) in err_probs.iter().enumerate() {
        let n = idx + 1;
        let (log_p, log_1_p) = log_probs(p);

        for i in (1..=n.min(k - 1)).rev() {
            cur[i] = log_sum(prev[i] + log_1_p, prev[i - 1] + log_p);
        }
        cur[0] = prev[0] + log_1_p;

        if n == k {
            cur[k] = prev[k - 1] + log_p;
        } else if n > k {
            cur[k] = log_sum(prev[k], prev[k - 1] + log_p);
            if cur[k].exp() * bonf_factor as f64 >= sig_thresh {
                return None;
            }
        }

        std::mem::swap(&mut prev, &mut cur);
    }

    if prev[k].exp() * bonf_factor as f64 >= sig_thresh {
        return None;
    }
    Some(prev)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn binomial_tail(n: u64, p: f64, k: u64) -> f64 {
        let mut tail = 0.0;
        for i in k..=n {
            let mut coeff = 1.0f64;
            for j in 0..i {
                coeff *= (n - j) as f64 / (j + 1) as f64;
            }
            tail += coeff * p.powi(i as i32) * (1.0 - p).powi((n - i) as i32);
        }
        tail
    }

    #[test]
    fn uniform_qualities_match_binomial_tail() {
        // Q20 -> error probability 0.01
        let quals = vec![20u8; 50];
        let pvalues = PoissonBinomialEstimator::new()
            .estimate(&quals, &[4, 3, 0], 1, 1.0)
            .unwrap();

        assert!((pvalues[0] - binomial_tail(50, 0.01, 4)).abs() < 1e-9);
        assert!((pvalues[1] - binomial_tail(50, 0.01, 3)).abs() < 1e-9);
        assert_eq!(pvalues[2], UNCOMPUTED_PVALUE);
        assert!(pvalues[0] < pvalues[1]);
    }

    #[test]
    fn insignificant_max_count_leaves_all_uncomputed() {
        // Q3 errors are common, one mismatch in many bases is expected.
        let quals = vec![3u8; 40];
        let pvalues = PoissonBinomialEstimator::new()
            .estimate(&quals, &[1, 1, 0], 1, 0.05)
            .unwrap();
        assert!(pvalues.iter().all(|&p| p == UNCOMPUTED_PVALUE));
    }

    #[test]
    fn high_quality_mismatches_are_significant() {
        let mut quals = vec![35u8; 98];
        quals.extend([30, 30]);
        quals.sort_unstable();
        let pvalues = PoissonBinomialEstimator::new()
            .estimate(&quals, &[0, 2, 0], 1, 0.05)
            .unwrap();
        assert!(pvalues[1] < 0.05);
        assert_eq!(pvalues[0], UNCOMPUTED_PVALUE);
    }

    #[test]
    fn no_counts_yield_uncomputed() {
        let pvalues = PoissonBinomialEstimator::new()
            .estimate(&[30, 30], &[0, 0, 0], 1, 0.05)
            .unwrap();
        assert_eq!(pvalues, vec![UNCOMPUTED_PVALUE; 3]);
    }

    #[test]
    fn count_larger_than_depth_is_rejected() {
        let err = PoissonBinomialEstimator::new()
            .estimate(&[30], &[2, 0, 0], 1, 0.05)
            .unwrap_err();
        assert_eq!(err, EstimatorError::CountExceedsDepth { count: 2, depth: 1 });
    }

    #[test]
    fn closures_act_as_estimators() {
        let stub = |_: &[u8], counts: &[u32], _: u64, _: f64| Ok::<_, EstimatorError>(vec![0.5; counts.len()]);
        assert_eq!(stub.estimate(&[], &[1, 2, 3], 1, 0.05).unwrap(), vec![0.5; 3]);
    }
}
