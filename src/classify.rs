//! Bayesian classifier core.
//!
//! For every supported language the classifier accumulates the weighted
//! log-likelihood of the observed n-gram sample, starting from the
//! language's log prior. Working in log space replaces a long product of
//! small probabilities with a sum; the accumulators are additionally
//! rescaled (max subtracted) every `renorm_interval` n-grams so magnitudes
//! stay bounded on very long inputs.
//!
//! A character takes part in one n-gram per active order, so the weighted
//! evidence is divided by the sum of the active order weights; each
//! character contributes about one unit of log-likelihood however many
//! orders are active.
//!
//! Each classification runs several independent *trials*. A trial presents
//! the n-grams in its own seeded random order, so the rescaling points fall
//! at different places and rounding differs slightly between trials; the
//! final posterior is the arithmetic mean of the per-trial softmax outputs.
//!
//! Trial `t` of a call with seed `s` always uses the RNG stream derived from
//! `(s, t)`, so running trials on the rayon pool gives bit-identical results
//! to running them sequentially.

use std::collections::HashMap;

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::{ClassifyError, ClassifyResult};
use crate::ngram::{MAX_ORDER, NgramSample};
use crate::profile::ProfileStore;

/// Per-order evidence weights. Higher orders collide less across languages
/// and carry more weight.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrderWeights {
    pub unigram: f64,
    pub bigram: f64,
    pub trigram: f64,
}

impl Default for OrderWeights {
    fn default() -> Self {
        Self {
            unigram: 1.0,
            bigram: 2.0,
            trigram: 3.0,
        }
    }
}

impl OrderWeights {
    /// Weight for an n-gram of `order`.
    pub fn weight(&self, order: u8) -> f64 {
        match order {
            1 => self.unigram,
            2 => self.bigram,
            _ => self.trigram,
        }
    }

    /// Sum of the weights of `orders`.
    pub fn total(&self, orders: &[u8]) -> f64 {
        orders.iter().map(|&k| self.weight(k)).sum()
    }
}

/// Lowest probability a trial assigns to any language. Keeps a language
/// without matching n-grams unlikely instead of impossible.
pub const PROBABILITY_FLOOR: f64 = f64::MIN_POSITIVE;

/// Classifier settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Rescale accumulators after this many n-grams.
    pub renorm_interval: usize,
    /// Run trials on the rayon thread pool.
    pub parallel_trials: bool,
    /// Stop a trial early, at a rescaling point, once its leading
    /// probability exceeds this value. Disabled when `None`.
    pub convergence_threshold: Option<f64>,
    pub order_weights: OrderWeights,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            order_weights: OrderWeights::default(),
            renorm_interval: 5,
            parallel_trials: true,
            convergence_threshold: None,
        }
    }
}

/// One trial's probability vector, aligned with the store's language order.
#[derive(Debug, Clone, PartialEq)]
pub struct TrialEstimate {
    probabilities: Vec<f64>,
    /// N-grams consumed before the trial finished.
    consumed: usize,
}

impl TrialEstimate {
    pub fn probabilities(&self) -> &[f64] {
        &self.probabilities
    }

    pub fn consumed(&self) -> usize {
        self.consumed
    }
}

/// Mean of all trial estimates: language code → probability.
#[derive(Debug, Clone, PartialEq)]
pub struct Posterior {
    entries: Vec<(String, f64)>,
    trials: usize,
    sample_size: usize,
}

impl Posterior {
    /// Build a posterior directly, e.g. for ranking precomputed scores.
    pub fn new(entries: Vec<(String, f64)>, trials: usize, sample_size: usize) -> Self {
        Self {
            entries,
            trials,
            sample_size,
        }
    }

    /// `(language, probability)` pairs in store order.
    pub fn entries(&self) -> &[(String, f64)] {
        &self.entries
    }

    pub fn probability(&self, language: &str) -> Option<f64> {
        self.entries
            .iter()
            .find(|(code, _)| code == language)
            .map(|(_, p)| *p)
    }

    pub fn trials(&self) -> usize {
        self.trials
    }

    pub fn sample_size(&self) -> usize {
        self.sample_size
    }
}

/// Scaled log-probability of every distinct sample n-gram under every
/// language, plus the distinct-row index of each sample position. Rows are
/// stored once per distinct n-gram text.
struct Evidence {
    values: Vec<f64>,
    rows: Vec<u32>,
    languages: usize,
}

impl Evidence {
    fn build(
        sample: &NgramSample,
        store: &ProfileStore,
        weights: &OrderWeights,
        scale: f64,
    ) -> Self {
        let languages = store.len();
        let mut ids: HashMap<&str, u32> = HashMap::new();
        let mut values = Vec::new();
        let mut rows = Vec::with_capacity(sample.len());

        for ngram in sample {
            let next = ids.len() as u32;
            let id = *ids.entry(ngram.text.as_str()).or_insert_with(|| {
                let weight = scale * weights.weight(ngram.order);
                values.extend(
                    store
                        .profiles()
                        .iter()
                        .map(|profile| weight * profile.log_prob(&ngram.text)),
                );
                next
            });
            rows.push(id);
        }

        Self {
            values,
            rows,
            languages,
        }
    }

    /// Evidence of the n-gram at sample position `position`.
    fn row(&self, position: usize) -> &[f64] {
        let start = self.rows[position] as usize * self.languages;
        &self.values[start..start + self.languages]
    }

    fn rows(&self) -> usize {
        self.rows.len()
    }

    fn distinct(&self) -> usize {
        self.values.len() / self.languages.max(1)
    }
}

/// Multi-trial Bayesian language classifier.
#[derive(Debug, Clone)]
pub struct Classifier {
    config: ClassifierConfig,
    /// Orders the sample is extracted at; their weights normalize evidence.
    orders: Vec<u8>,
}

impl Default for Classifier {
    fn default() -> Self {
        Self::new(ClassifierConfig::default())
    }
}

impl Classifier {
    pub fn new(config: ClassifierConfig) -> Self {
        Self {
            config,
            orders: (1..=MAX_ORDER).collect(),
        }
    }

    /// Normalize evidence over `orders` instead of every order. Use the
    /// extractor's orders so the scale matches what a sample can contain.
    pub fn with_orders(mut self, orders: &[u8]) -> Self {
        let orders: Vec<u8> = orders
            .iter()
            .copied()
            .filter(|k| (1..=MAX_ORDER).contains(k))
            .collect();
        if !orders.is_empty() {
            self.orders = orders;
        }
        self
    }

    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }

    /// Orders the evidence is normalized over.
    pub fn orders(&self) -> &[u8] {
        &self.orders
    }

    fn evidence_scale(&self) -> f64 {
        self.config.order_weights.total(&self.orders).recip()
    }

    /// Compute the posterior over `store`'s languages for `sample`.
    ///
    /// Runs `trial_count` (at least one) seeded trials and averages them.
    pub fn classify(
        &self,
        sample: &NgramSample,
        store: &ProfileStore,
        trial_count: usize,
        seed: u64,
    ) -> ClassifyResult<Posterior> {
        if sample.is_empty() {
            return Err(ClassifyError::InsufficientSignal {
                significant_chars: 0,
                min_required: 1,
            });
        }
        if store.is_empty() {
            return Err(ClassifyError::NoSupportedLanguages);
        }

        let trials = trial_count.max(1);
        let evidence = Evidence::build(
            sample,
            store,
            &self.config.order_weights,
            self.evidence_scale(),
        );
        let priors: Vec<f64> = store.profiles().iter().map(|p| p.prior_log()).collect();

        let run = |trial: usize| self.run_trial(&evidence, &priors, trial_seed(seed, trial));
        let estimates: Vec<TrialEstimate> = if self.config.parallel_trials && trials > 1 {
            (0..trials)
                .into_par_iter()
                .map(run)
                .collect::<ClassifyResult<_>>()?
        } else {
            (0..trials).map(run).collect::<ClassifyResult<_>>()?
        };

        let mut mean = vec![0.0; store.len()];
        for estimate in &estimates {
            for (m, p) in mean.iter_mut().zip(&estimate.probabilities) {
                *m += p;
            }
        }
        for m in &mut mean {
            *m /= trials as f64;
        }

        tracing::debug!(
            ngrams = sample.len(),
            distinct = evidence.distinct(),
            languages = store.len(),
            trials,
            seed,
            "classified n-gram sample"
        );

        let entries = store
            .languages()
            .map(str::to_string)
            .zip(mean)
            .collect();
        Ok(Posterior::new(entries, trials, sample.len()))
    }

    /// One randomized pass over the evidence.
    fn run_trial(
        &self,
        evidence: &Evidence,
        priors: &[f64],
        seed: u64,
    ) -> ClassifyResult<TrialEstimate> {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut order: Vec<usize> = (0..evidence.rows()).collect();
        order.shuffle(&mut rng);

        let interval = self.config.renorm_interval.max(1);
        let mut acc = priors.to_vec();
        let mut consumed = 0;

        for &row in &order {
            for (a, e) in acc.iter_mut().zip(evidence.row(row)) {
                *a += e;
            }
            consumed += 1;

            if consumed % interval == 0 {
                renormalize(&mut acc)?;
                if let Some(threshold) = self.config.convergence_threshold {
                    // After rescaling the leader sits at exp(0) = 1.
                    let mass: f64 = acc.iter().map(|a| a.exp()).sum();
                    if mass.recip() > threshold {
                        break;
                    }
                }
            }
        }

        let probabilities = softmax(&acc)?;
        Ok(TrialEstimate {
            probabilities,
            consumed,
        })
    }
}

/// Derive an independent RNG seed for `trial` from the call seed
/// (splitmix64 finalizer).
pub fn trial_seed(seed: u64, trial: usize) -> u64 {
    let mut z = seed ^ (trial as u64).wrapping_add(1).wrapping_mul(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// Subtract the maximum from every accumulator.
fn renormalize(acc: &mut [f64]) -> ClassifyResult<()> {
    let max = acc.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if !max.is_finite() {
        return Err(internal(format!("accumulator maximum is {max}")));
    }
    for a in acc.iter_mut() {
        *a -= max;
    }
    Ok(())
}

/// Numerically stable softmax. Outputs are floored at [`PROBABILITY_FLOOR`]
/// before the final normalization, so none is zero even when `exp`
/// underflows.
pub fn softmax(scores: &[f64]) -> ClassifyResult<Vec<f64>> {
    let max = scores.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if !max.is_finite() {
        return Err(internal(format!("softmax input maximum is {max}")));
    }
    let exps: Vec<f64> = scores.iter().map(|s| (s - max).exp()).collect();
    let sum: f64 = exps.iter().sum();
    let floored: Vec<f64> = exps
        .into_iter()
        .map(|e| (e / sum).max(PROBABILITY_FLOOR))
        .collect();
    let total: f64 = floored.iter().sum();
    let probs: Vec<f64> = floored.into_iter().map(|p| p / total).collect();
    if probs.iter().any(|p| !p.is_finite()) {
        return Err(internal("softmax produced a non-finite probability".to_string()));
    }
    Ok(probs)
}

fn internal(message: String) -> ClassifyError {
    tracing::error!(%message, "numeric fault during classification");
    ClassifyError::Internal { message }
}
