//! Column calling benchmarks

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use qualsnv::genomics::{
    BaseQualityHistogram, CallerConfig, ColumnVariantCaller, NonConsensusQuality, Nucleotide,
    PoissonBinomialEstimator,
};

fn deep_column(depth: u32, alt_fraction: f64) -> BaseQualityHistogram {
    let alt = (depth as f64 * alt_fraction) as u32;
    let mut histogram = BaseQualityHistogram::new();
    for quality in 20..40u8 {
        histogram.add(Nucleotide::A, quality, (depth - alt) / 20);
        histogram.add(Nucleotide::G, quality, alt / 20);
    }
    histogram
}

fn benchmark_columns(c: &mut Criterion) {
    let caller = ColumnVariantCaller::new(CallerConfig::default(), PoissonBinomialEstimator::new());
    let median_caller = ColumnVariantCaller::new(
        CallerConfig::new(NonConsensusQuality::ConsensusMedian, 20, 3, 1, 0.05)
            .expect("valid configuration"),
        PoissonBinomialEstimator::new(),
    );

    let noise = deep_column(10_000, 0.002);
    let variant = deep_column(10_000, 0.05);

    c.bench_function("call_noise_depth=10000", |b| {
        b.iter(|| caller.call(black_box(0), black_box(&noise), b'A'))
    });
    c.bench_function("call_variant_depth=10000", |b| {
        b.iter(|| caller.call(black_box(0), black_box(&variant), b'A'))
    });
    c.bench_function("call_variant_median_depth=10000", |b| {
        b.iter(|| median_caller.call(black_box(0), black_box(&variant), b'A'))
    });
}

criterion_group!(benches, benchmark_columns);
criterion_main!(benches);
