//! Per-column variant calling over base/quality pileup histograms.
//!
//! The pieces fit together as follows: a [`BaseQualityHistogram`] describes
//! one column, a [`ColumnVariantCaller`] filters it under a [`CallerConfig`]
//! and asks a [`SignificanceEstimator`] which non-reference bases exceed
//! sequencing noise, and the resulting [`VariantCall`]s can be written out
//! with [`VcfWriter`].

mod config;
mod estimator;
mod io;
mod pileup;
pub mod statistics;
mod types;
mod variant_caller;
mod vcf;

pub use config::{
    CallerConfig, NonConsensusQuality, DEFAULT_IGN_BASES_BELOW_Q, DEFAULT_NONCONS_DEFAULT_QUAL,
    DEFAULT_NONCONS_FILTER_QUAL, DEFAULT_SIG_THRESH,
};
pub use estimator::{
    EstimatorError, PoissonBinomialEstimator, SignificanceEstimator, UNCOMPUTED_PVALUE,
};
pub use io::{
    parse_histogram_line, pileup_bam, read_histogram_table, read_reference, HistogramRecord,
    MAX_PILEUP_DEPTH, MISSING_QUALITY,
};
pub use pileup::{BaseQualityHistogram, PileupColumn};
pub use types::{Nucleotide, NUM_BASES};
pub use variant_caller::{
    ColumnVariantCaller, ValidationError, VariantCall, VariantCallerError, VariantInfo,
};
pub use vcf::{render_vcf, write_vcf, VcfWriter};
