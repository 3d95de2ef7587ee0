use std::fmt;
use std::str::FromStr;

use crate::genomics::ValidationError;

/// Default quality assumed for non-consensus bases.
pub const DEFAULT_NONCONS_DEFAULT_QUAL: u8 = 20;
/// Default minimum quality for a non-consensus base to be counted.
pub const DEFAULT_NONCONS_FILTER_QUAL: u8 = 20;
/// Default minimum quality for any base to be counted.
pub const DEFAULT_IGN_BASES_BELOW_Q: u8 = 3;
/// Default significance threshold.
pub const DEFAULT_SIG_THRESH: f64 = 0.05;

/// Quality imputed for every retained non-consensus observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NonConsensusQuality {
    /// Use this fixed Phred quality.
    Fixed(u8),
    /// Use the truncated median of the retained consensus qualities.
    ConsensusMedian,
}

impl fmt::Display for NonConsensusQuality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NonConsensusQuality::Fixed(quality) => write!(f, "{quality}"),
            NonConsensusQuality::ConsensusMedian => write!(f, "median"),
        }
    }
}

impl FromStr for NonConsensusQuality {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.eq_ignore_ascii_case("median") {
            return Ok(NonConsensusQuality::ConsensusMedian);
        }
        trimmed
            .parse::<u8>()
            .map(NonConsensusQuality::Fixed)
            .map_err(|_| {
                ValidationError::InvalidConfig(format!(
                    "non-consensus default quality must be 'median' or an integer in 0..=255, got '{s}'"
                ))
            })
    }
}

/// Immutable configuration of a column variant caller.
#[derive(Debug, Clone, PartialEq)]
pub struct CallerConfig {
    noncons_default_qual: NonConsensusQuality,
    noncons_filter_qual: u8,
    ign_bases_below_q: u8,
    bonf_factor: u64,
    sig_thresh: f64,
}

impl Default for CallerConfig {
    fn default() -> Self {
        Self {
            noncons_default_qual: NonConsensusQuality::Fixed(DEFAULT_NONCONS_DEFAULT_QUAL),
            noncons_filter_qual: DEFAULT_NONCONS_FILTER_QUAL,
            ign_bases_below_q: DEFAULT_IGN_BASES_BELOW_Q,
            bonf_factor: 1,
            sig_thresh: DEFAULT_SIG_THRESH,
        }
    }
}

impl CallerConfig {
    /// Construct a validated configuration.
    ///
    /// `bonf_factor` must be positive and `sig_thresh` must lie strictly
    /// between 0 and 1.
    pub fn new(
        noncons_default_qual: NonConsensusQuality,
        noncons_filter_qual: u8,
        ign_bases_below_q: u8,
        bonf_factor: u64,
        sig_thresh: f64,
    ) -> Result<Self, ValidationError> {
        if bonf_factor == 0 {
            return Err(ValidationError::InvalidConfig(
                "Bonferroni factor must be > 0".to_string(),
            ));
        }
        if !sig_thresh.is_finite() || sig_thresh <= 0.0 || sig_thresh >= 1.0 {
            return Err(ValidationError::InvalidConfig(format!(
                "significance threshold must be in (0, 1), got {sig_thresh}"
            )));
        }

        Ok(Self {
            noncons_default_qual,
            noncons_filter_qual,
            ign_bases_below_q,
            bonf_factor,
            sig_thresh,
        })
    }

    /// Imputation policy for non-consensus qualities.
    pub fn noncons_default_qual(&self) -> NonConsensusQuality {
        self.noncons_default_qual
    }

    /// Minimum quality for a non-consensus observation.
    pub fn noncons_filter_qual(&self) -> u8 {
        self.noncons_filter_qual
    }

    /// Minimum quality for any observation.
    pub fn ign_bases_below_q(&self) -> u8 {
        self.ign_bases_below_q
    }

    /// Multiple-testing correction factor.
    pub fn bonf_factor(&self) -> u64 {
        self.bonf_factor
    }

    /// Significance threshold applied to corrected p-values.
    pub fn sig_thresh(&self) -> f64 {
        self.sig_thresh
    }

    /// Filter actually applied to non-consensus observations.
    pub fn effective_noncons_filter_qual(&self) -> u8 {
        self.noncons_filter_qual.max(self.ign_bases_below_q)
    }

    /// Whether a raw p-value survives Bonferroni correction.
    pub fn is_significant(&self, pvalue: f64) -> bool {
        pvalue * (self.bonf_factor as f64) < self.sig_thresh
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("median", NonConsensusQuality::ConsensusMedian ; "median keyword")]
    #[test_case("MEDIAN", NonConsensusQuality::ConsensusMedian ; "case insensitive")]
    #[test_case("30", NonConsensusQuality::Fixed(30) ; "fixed quality")]
    #[test_case(" 0 ", NonConsensusQuality::Fixed(0) ; "zero with whitespace")]
    fn parses_noncons_quality(input: &str, expected: NonConsensusQuality) {
        assert_eq!(input.parse::<NonConsensusQuality>().unwrap(), expected);
    }

    #[test_case("-1" ; "negative")]
    #[test_case("256" ; "too large")]
    #[test_case("mean" ; "unknown keyword")]
    fn rejects_bad_noncons_quality(input: &str) {
        assert!(matches!(
            input.parse::<NonConsensusQuality>(),
            Err(ValidationError::InvalidConfig(_))
        ));
    }

    #[test_case(0, 0.05 ; "zero bonferroni factor")]
    #[test_case(1, 0.0 ; "zero threshold")]
    #[test_case(1, 1.0 ; "threshold of one")]
    #[test_case(1, f64::NAN ; "nan threshold")]
    fn rejects_invalid_config(bonf_factor: u64, sig_thresh: f64) {
        let result = CallerConfig::new(
            NonConsensusQuality::Fixed(20),
            20,
            3,
            bonf_factor,
            sig_thresh,
        );
        assert!(matches!(result, Err(ValidationError::InvalidConfig(_))));
    }

    #[test]
    fn effective_filter_is_the_stricter_one() {
        let config =
            CallerConfig::new(NonConsensusQuality::ConsensusMedian, 10, 25, 1, 0.05).unwrap();
        assert_eq!(config.effective_noncons_filter_qual(), 25);

        let config = CallerConfig::default();
        assert_eq!(config.effective_noncons_filter_qual(), 20);
    }

    #[test]
    fn significance_is_strict_and_corrected() {
        let config = CallerConfig::new(NonConsensusQuality::Fixed(20), 0, 0, 10, 0.05).unwrap();
        assert!(config.is_significant(0.004));
        assert!(!config.is_significant(0.006));
        assert!(!config.is_significant(f64::MAX));
    }
}
