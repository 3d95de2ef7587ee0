use proptest::prelude::*;
use qualsnv::genomics::{
    BaseQualityHistogram, CallerConfig, ColumnVariantCaller, NonConsensusQuality, Nucleotide,
    PoissonBinomialEstimator,
};

fn nucleotide() -> impl Strategy<Value = Nucleotide> {
    prop_oneof![
        Just(Nucleotide::A),
        Just(Nucleotide::C),
        Just(Nucleotide::G),
        Just(Nucleotide::T),
    ]
}

fn histogram() -> impl Strategy<Value = BaseQualityHistogram> {
    proptest::collection::vec((nucleotide(), 0u8..45, 1u32..30), 0..24).prop_map(|entries| {
        let mut histogram = BaseQualityHistogram::new();
        for (base, quality, count) in entries {
            histogram.add(base, quality, count);
        }
        histogram
    })
}

fn config(sig_thresh: f64, noncons_filter_qual: u8) -> CallerConfig {
    CallerConfig::new(NonConsensusQuality::Fixed(20), noncons_filter_qual, 3, 1, sig_thresh)
        .expect("valid configuration")
}

proptest! {
    #[test]
    fn reference_only_columns_yield_nothing(
        reference in nucleotide(),
        quals in proptest::collection::vec((0u8..60, 1u32..50), 0..8),
    ) {
        let mut histogram = BaseQualityHistogram::new();
        for (quality, count) in quals {
            histogram.add(reference, quality, count);
        }
        let caller = ColumnVariantCaller::new(config(0.5, 0), PoissonBinomialEstimator::new());
        let calls = caller.call(0, &histogram, reference.as_ascii()).unwrap();
        prop_assert!(calls.is_empty());
    }

    #[test]
    fn frequencies_are_consistent_with_reported_coverage(
        reference in nucleotide(),
        histogram in histogram(),
    ) {
        let caller = ColumnVariantCaller::new(config(0.5, 0), PoissonBinomialEstimator::new());
        for call in caller.call(11, &histogram, reference.as_ascii()).unwrap() {
            prop_assert!((0.0..=1.0).contains(&call.frequency));
            let total: u32 = call.info.base_counts.iter().sum();
            prop_assert_eq!(total, call.info.coverage);
            let alt_count = call.info.base_count(call.alternate) as f64;
            prop_assert!((call.frequency - alt_count / call.info.coverage as f64).abs() < 1e-12);
            prop_assert!(call.alternate != reference);
            prop_assert!(call.info.pvalue < 0.5);
        }
    }

    #[test]
    fn raising_the_threshold_never_removes_calls(
        reference in nucleotide(),
        histogram in histogram(),
        low in 0.001f64..0.2,
        delta in 0.0f64..0.7,
    ) {
        let high = low + delta;
        let strict = ColumnVariantCaller::new(config(low, 0), PoissonBinomialEstimator::new());
        let lenient = ColumnVariantCaller::new(config(high, 0), PoissonBinomialEstimator::new());

        let strict_alts: Vec<_> = strict
            .call(0, &histogram, reference.as_ascii())
            .unwrap()
            .into_iter()
            .map(|call| call.alternate)
            .collect();
        let lenient_alts: Vec<_> = lenient
            .call(0, &histogram, reference.as_ascii())
            .unwrap()
            .into_iter()
            .map(|call| call.alternate)
            .collect();

        for alt in strict_alts {
            prop_assert!(lenient_alts.contains(&alt));
        }
    }

    #[test]
    fn filter_above_every_noncons_quality_empties_the_column(
        reference in nucleotide(),
        histogram in histogram(),
    ) {
        let max_noncons = reference
            .alternates()
            .filter_map(|base| histogram.qualities(base).keys().next_back().copied())
            .max();
        let filter = max_noncons.map_or(0, |q| q.saturating_add(1));
        prop_assume!(max_noncons.map_or(true, |q| q < u8::MAX));

        let caller = ColumnVariantCaller::new(config(0.9, filter), PoissonBinomialEstimator::new());
        prop_assert!(caller.call(0, &histogram, reference.as_ascii()).unwrap().is_empty());
    }
}
