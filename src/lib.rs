//! # Quality-aware SNV calling per pileup column
//!
//! Given the bases and quality scores observed at one genomic position and
//! the reference base, decide which non-reference bases are real variants
//! rather than sequencing errors.
//!
//! ## Core Algorithm
//!
//! 1. **Quality filtering**: drop observations below the configured thresholds
//! 2. **Quality array**: consensus qualities plus an imputed quality per
//!    non-consensus observation
//! 3. **Significance**: p-value per alternate base from a pluggable estimator
//! 4. **Correction**: report bases with `p * bonf_factor < sig_thresh`
//!
//! ## Usage Example
//!
//! ```
//! use qualsnv::genomics::{
//!     BaseQualityHistogram, CallerConfig, ColumnVariantCaller, Nucleotide,
//!     PoissonBinomialEstimator,
//! };
//!
//! let mut histogram = BaseQualityHistogram::new();
//! histogram.add(Nucleotide::A, 35, 90);
//! histogram.add(Nucleotide::C, 35, 10);
//!
//! let caller = ColumnVariantCaller::new(CallerConfig::default(), PoissonBinomialEstimator::new());
//! let calls = caller.call(1234, &histogram, b'A')?;
//! assert_eq!(calls.len(), 1);
//! assert_eq!(calls[0].alternate, Nucleotide::C);
//! # Ok::<(), qualsnv::genomics::VariantCallerError>(())
//! ```

#![warn(missing_docs, missing_debug_implementations)]

pub mod genomics; // Column histograms, caller, estimators and I/O

pub use genomics::{
    BaseQualityHistogram, CallerConfig, ColumnVariantCaller, NonConsensusQuality, Nucleotide,
    PoissonBinomialEstimator, SignificanceEstimator, ValidationError, VariantCall,
    VariantCallerError,
};
