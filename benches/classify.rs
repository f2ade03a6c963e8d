//! Benchmarks for the identification pipeline.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rand::{Rng, SeedableRng};

use langprobe::classify::{Classifier, ClassifierConfig};
use langprobe::identify::{IdentifyOptions, identify};
use langprobe::ngram::NgramExtractor;
use langprobe::normalize::Normalizer;
use langprobe::profile::{LoadOptions, ProfileRecord, ProfileStore, TableBackend};

const TEXT: &str = "The quick brown fox jumps over the lazy dog while five boxing wizards \
    jump quickly and a sphinx of black quartz judges every vow in the fog";

/// `languages` profiles with random weights over every a-z n-gram up to order 2
/// and a random subset of trigrams.
fn random_store(languages: usize, backend: TableBackend) -> ProfileStore {
    let mut rng = rand::rngs::StdRng::seed_from_u64(0);
    let letters: Vec<char> = ('a'..='z').collect();

    let records = (0..languages)
        .map(|i| {
            let mut ngrams = std::collections::BTreeMap::new();
            for &a in &letters {
                ngrams.insert(a.to_string(), rng.gen_range(-6.0..-2.0));
                for &b in &letters {
                    ngrams.insert(format!("{a}{b}"), rng.gen_range(-9.0..-4.0));
                    if rng.gen_bool(0.2) {
                        let c = letters[rng.gen_range(0..letters.len())];
                        ngrams.insert(format!("{a}{b}{c}"), rng.gen_range(-11.0..-6.0));
                    }
                }
            }
            ProfileRecord {
                language: format!("l{i:02}"),
                ngrams,
                unseen_log_prob: -13.0,
                prior_log: None,
            }
        })
        .collect();

    ProfileStore::from_records(
        records,
        &LoadOptions {
            backend,
            ..Default::default()
        },
    )
    .unwrap()
}

fn bench_extract(c: &mut Criterion) {
    let normalizer = Normalizer::default();
    let extractor = NgramExtractor::default();

    c.bench_function("normalize_extract", |bench| {
        bench.iter(|| {
            let normalized = normalizer.normalize(black_box(TEXT));
            black_box(extractor.extract(&normalized).unwrap())
        })
    });
}

fn bench_classify(c: &mut Criterion) {
    let store = random_store(20, TableBackend::Hash);
    let normalized = Normalizer::default().normalize(TEXT);
    let sample = NgramExtractor::default().extract(&normalized).unwrap();

    let parallel = Classifier::default();
    let sequential = Classifier::new(ClassifierConfig {
        parallel_trials: false,
        ..Default::default()
    });

    c.bench_function("classify_20_langs_parallel", |bench| {
        bench.iter(|| black_box(parallel.classify(&sample, &store, 7, 42).unwrap()))
    });
    c.bench_function("classify_20_langs_sequential", |bench| {
        bench.iter(|| black_box(sequential.classify(&sample, &store, 7, 42).unwrap()))
    });
}

fn bench_identify_backends(c: &mut Criterion) {
    let options = IdentifyOptions::default().with_seed(42);

    for backend in [TableBackend::Hash, TableBackend::Sorted] {
        let store = random_store(20, backend);
        c.bench_function(&format!("identify_20_langs_{backend}"), |bench| {
            bench.iter(|| black_box(identify(&store, black_box(TEXT), &options).unwrap()))
        });
    }
}

criterion_group!(benches, bench_extract, bench_classify, bench_identify_backends);
criterion_main!(benches);
