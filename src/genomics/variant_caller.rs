use thiserror::Error;
use tracing::debug;

use crate::genomics::statistics::sorted_median;
use crate::genomics::{
    BaseQualityHistogram, CallerConfig, EstimatorError, NonConsensusQuality, Nucleotide,
    SignificanceEstimator, NUM_BASES,
};

/// Input rejected before any statistics were computed.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValidationError {
    /// Histogram does not carry exactly four base keys.
    #[error("expected exactly four bases as histogram keys, found {0}")]
    BaseCount(usize),
    /// Histogram key is not one of A, C, G or T.
    #[error("only A, C, G or T are allowed as histogram keys, not {0:?}")]
    InvalidBase(char),
    /// Histogram key appears twice.
    #[error("base {0} appears more than once in histogram")]
    DuplicateBase(Nucleotide),
    /// Histogram stores a zero count.
    #[error("count for base {base} at quality {quality} must be positive")]
    ZeroCount {
        /// Base carrying the zero count.
        base: Nucleotide,
        /// Quality bin carrying the zero count.
        quality: u8,
    },
    /// Reference base is not one of A, C, G or T.
    #[error("reference base must be one of A, C, G or T, not {0:?}")]
    InvalidReferenceBase(char),
    /// Configuration value out of range.
    #[error("invalid caller configuration: {0}")]
    InvalidConfig(String),
}

/// Errors from calling variants in a column.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum VariantCallerError {
    /// Malformed input.
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// Failure propagated from the significance estimator.
    #[error("significance estimation failed: {0}")]
    Estimator(#[from] EstimatorError),
    /// Estimator returned a different number of p-values than counts supplied.
    #[error("estimator returned {actual} p-values for {expected} alternate bases")]
    PValueCountMismatch {
        /// Number of alternate bases passed in.
        expected: usize,
        /// Number of p-values returned.
        actual: usize,
    },
    /// Median imputation requested but no consensus quality survived filtering.
    #[error("no consensus qualities left at column {column} to take a median of")]
    NoConsensusQualities {
        /// Column coordinate.
        column: u32,
    },
}

/// Evidence shared by all calls at one column, plus the call's own p-value.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct VariantInfo {
    /// Observations retained after quality filtering.
    pub coverage: u32,
    /// Filtered counts per base in A, C, G, T order, consensus base included.
    pub base_counts: [u32; NUM_BASES],
    /// P-value of this alternate base.
    pub pvalue: f64,
}

impl VariantInfo {
    /// Filtered count for `base`.
    pub fn base_count(&self, base: Nucleotide) -> u32 {
        self.base_counts[base.index()]
    }
}

/// Statistically significant non-reference base at one column.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct VariantCall {
    /// Column coordinate (0-based).
    pub column: u32,
    /// Reference (consensus) base.
    pub reference: Nucleotide,
    /// Alternate base.
    pub alternate: Nucleotide,
    /// Alternate count over filtered coverage.
    pub frequency: f64,
    /// Supporting evidence.
    pub info: VariantInfo,
}

/// Filtered evidence for one non-reference base, kept in estimator order.
#[derive(Debug, Clone, Copy)]
struct AltObservation {
    base: Nucleotide,
    count: u32,
}

/// Quality-aware caller deciding which non-reference bases in a column are
/// real variants rather than sequencing noise.
///
/// Holds no mutable state; one instance can serve any number of columns,
/// concurrently if the estimator allows.
#[derive(Debug, Clone)]
pub struct ColumnVariantCaller<E> {
    config: CallerConfig,
    estimator: E,
}

impl<E: SignificanceEstimator> ColumnVariantCaller<E> {
    /// Create a caller from a validated configuration and an estimator.
    pub fn new(config: CallerConfig, estimator: E) -> Self {
        debug!(
            noncons_default_qual = %config.noncons_default_qual(),
            noncons_filter_qual = config.noncons_filter_qual(),
            ign_bases_below_q = config.ign_bases_below_q(),
            bonf_factor = config.bonf_factor(),
            sig_thresh = config.sig_thresh(),
            "new column variant caller"
        );
        Self { config, estimator }
    }

    /// Configuration in use.
    pub fn config(&self) -> &CallerConfig {
        &self.config
    }

    /// Call variants at one column.
    ///
    /// Returns an empty list when no non-consensus observation survives
    /// quality filtering, or when none is significant.
    pub fn call(
        &self,
        column: u32,
        histogram: &BaseQualityHistogram,
        ref_base: u8,
    ) -> Result<Vec<VariantCall>, VariantCallerError> {
        let reference = Nucleotide::from_ascii(ref_base)
            .ok_or(ValidationError::InvalidReferenceBase(ref_base as char))?;

        let noncons_filter = self.config.effective_noncons_filter_qual();
        let alternates: Vec<AltObservation> = reference
            .alternates()
            .map(|base| AltObservation {
                base,
                count: histogram.count_at_or_above(base, noncons_filter),
            })
            .collect();
        let noncons_total = alternates
            .iter()
            .fold(0u32, |total, alt| total.saturating_add(alt.count));

        if noncons_total == 0 {
            debug!(column, "consensus bases only, early exit");
            return Ok(Vec::new());
        }

        let mut qualities =
            histogram.qualities_at_or_above(reference, self.config.ign_bases_below_q());
        let cons_count = qualities.len() as u32;

        let imputed = match self.config.noncons_default_qual() {
            NonConsensusQuality::Fixed(quality) => quality,
            NonConsensusQuality::ConsensusMedian => sorted_median(&qualities)
                .map(|m| m.trunc() as u8)
                .ok_or(VariantCallerError::NoConsensusQualities { column })?,
        };
        qualities.extend(std::iter::repeat(imputed).take(noncons_total as usize));
        qualities.sort_unstable();

        let counts: Vec<u32> = alternates.iter().map(|alt| alt.count).collect();
        let pvalues = self.estimator.estimate(
            &qualities,
            &counts,
            self.config.bonf_factor(),
            self.config.sig_thresh(),
        )?;
        if pvalues.len() != alternates.len() {
            return Err(VariantCallerError::PValueCountMismatch {
                expected: alternates.len(),
                actual: pvalues.len(),
            });
        }

        let coverage = noncons_total.saturating_add(cons_count);
        let mut base_counts = [0u32; NUM_BASES];
        base_counts[reference.index()] = cons_count;
        for alt in &alternates {
            base_counts[alt.base.index()] = alt.count;
        }

        let calls: Vec<VariantCall> = alternates
            .iter()
            .zip(pvalues)
            .filter(|&(_, pvalue)| self.config.is_significant(pvalue))
            .map(|(alt, pvalue)| VariantCall {
                column,
                reference,
                alternate: alt.base,
                frequency: alt.count as f64 / coverage as f64,
                info: VariantInfo {
                    coverage,
                    base_counts,
                    pvalue,
                },
            })
            .collect();

        debug!(
            column,
            coverage,
            imputed_quality = imputed,
            num_calls = calls.len(),
            "column evaluated"
        );
        Ok(calls)
    }
}
