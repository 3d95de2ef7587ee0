use std::collections::BTreeMap;

use crate::genomics::{Nucleotide, ValidationError, NUM_BASES};

/// Per-base histogram of quality scores observed at one pileup column.
///
/// Holds exactly one quality→count map for each of A, C, G and T. Every
/// stored count is positive; an unobserved base has an empty map.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BaseQualityHistogram {
    quals: [BTreeMap<u8, u32>; NUM_BASES],
}

impl BaseQualityHistogram {
    /// Construct an empty histogram.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a histogram from symbol-keyed maps, validating its shape.
    ///
    /// Exactly four distinct keys from `A`, `C`, `G`, `T` are required and
    /// every count must be positive.
    pub fn from_symbols<I>(entries: I) -> Result<Self, ValidationError>
    where
        I: IntoIterator<Item = (char, BTreeMap<u8, u32>)>,
    {
        let mut histogram = Self::new();
        let mut seen = [false; NUM_BASES];
        let mut num_keys = 0usize;

        for (symbol, quals) in entries {
            num_keys += 1;
            let base = Nucleotide::from_char(symbol).ok_or(ValidationError::InvalidBase(symbol))?;
            if seen[base.index()] {
                return Err(ValidationError::DuplicateBase(base));
            }
            seen[base.index()] = true;

            for (&quality, &count) in &quals {
                if count == 0 {
                    return Err(ValidationError::ZeroCount { base, quality });
                }
            }
            histogram.quals[base.index()] = quals;
        }

        if num_keys != NUM_BASES {
            return Err(ValidationError::BaseCount(num_keys));
        }
        Ok(histogram)
    }

    /// Record a single observation.
    pub fn observe(&mut self, base: Nucleotide, quality: u8) {
        self.add(base, quality, 1);
    }

    /// Record `count` observations of `base` at `quality`. Zero counts are ignored.
    ///
    /// Counts saturate at `u32::MAX`.
    pub fn add(&mut self, base: Nucleotide, quality: u8, count: u32) {
        if count == 0 {
            return;
        }
        let slot = self.quals[base.index()].entry(quality).or_insert(0);
        *slot = slot.saturating_add(count);
    }

    /// Combine two histograms of the same column.
    pub fn merge(&self, other: &Self) -> Self {
        let mut merged = self.clone();
        for base in Nucleotide::ALL {
            for (&quality, &count) in other.qualities(base) {
                merged.add(base, quality, count);
            }
        }
        merged
    }

    /// Quality→count map for `base`, ascending by quality.
    pub fn qualities(&self, base: Nucleotide) -> &BTreeMap<u8, u32> {
        &self.quals[base.index()]
    }

    /// Number of observations of `base` with quality of at least `min_quality`,
    /// saturating at `u32::MAX`.
    pub fn count_at_or_above(&self, base: Nucleotide, min_quality: u8) -> u32 {
        self.quals[base.index()]
            .range(min_quality..)
            .fold(0u32, |total, (_, &count)| total.saturating_add(count))
    }

    /// Expand observations of `base` at or above `min_quality` into a flat,
    /// ascending list with one entry per observation.
    pub fn qualities_at_or_above(&self, base: Nucleotide, min_quality: u8) -> Vec<u8> {
        let mut expanded = Vec::with_capacity(self.count_at_or_above(base, min_quality) as usize);
        for (&quality, &count) in self.quals[base.index()].range(min_quality..) {
            expanded.extend(std::iter::repeat(quality).take(count as usize));
        }
        expanded
    }

    /// Total observations over all bases, unfiltered.
    pub fn depth(&self) -> u32 {
        Nucleotide::ALL
            .into_iter()
            .fold(0u32, |total, base| {
                total.saturating_add(self.count_at_or_above(base, 0))
            })
    }

    /// Whether no base was observed.
    pub fn is_empty(&self) -> bool {
        self.quals.iter().all(BTreeMap::is_empty)
    }
}

/// Histogram paired with the 0-based coordinate of its column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PileupColumn {
    /// Genomic coordinate (0-based).
    pub position: u32,
    /// Observed bases and qualities.
    pub histogram: BaseQualityHistogram,
}

impl PileupColumn {
    /// Pair a position with its histogram.
    pub fn new(position: u32, histogram: BaseQualityHistogram) -> Self {
        Self {
            position,
            histogram,
        }
    }
}
