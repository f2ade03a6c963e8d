//! Identification facade: the single entry point callers use.
//!
//! [`Identifier`] owns the pipeline stages and a shared, immutable
//! [`ProfileStore`]. It is `Send + Sync`; one instance can serve any number
//! of concurrent requests.
//!
//! ```no_run
//! use std::sync::Arc;
//! use langprobe::config::EngineConfig;
//! use langprobe::identify::{IdentifyOptions, Identifier};
//! use langprobe::profile::{LoadOptions, ProfileSource, ProfileStore};
//!
//! let store = ProfileStore::load(
//!     &ProfileSource::Bundle("profiles.json".into()),
//!     &LoadOptions::default(),
//! )
//! .unwrap();
//! let identifier = Identifier::new(Arc::new(store), EngineConfig::default()).unwrap();
//! let estimate = identifier
//!     .identify("The quick brown fox", &IdentifyOptions::default().with_seed(7))
//!     .unwrap();
//! println!("{estimate}");
//! ```

use std::sync::Arc;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::classify::Classifier;
use crate::config::EngineConfig;
use crate::error::{ClassifyError, ConfigError, LangResult};
use crate::ngram::NgramExtractor;
use crate::normalize::Normalizer;
use crate::profile::ProfileStore;
use crate::rank::{LanguageEstimate, RankPolicy, Ranker};

/// Per-call options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IdentifyOptions {
    /// Randomized trials to average.
    pub trial_count: usize,
    /// RNG seed. A fresh random seed is drawn per call when `None`.
    pub seed: Option<u64>,
    /// Keep at most this many languages. `None` keeps all.
    pub top_n: Option<usize>,
    pub confidence_threshold: f64,
    pub confidence_margin: f64,
    /// Drop languages below this probability from the output.
    pub min_probability: f64,
}

impl Default for IdentifyOptions {
    fn default() -> Self {
        let policy = RankPolicy::default();
        Self {
            trial_count: 7,
            seed: None,
            top_n: policy.top_n,
            confidence_threshold: policy.confidence_threshold,
            confidence_margin: policy.confidence_margin,
            min_probability: policy.min_probability,
        }
    }
}

impl IdentifyOptions {
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_top_n(mut self, top_n: usize) -> Self {
        self.top_n = Some(top_n);
        self
    }

    pub fn with_trials(mut self, trial_count: usize) -> Self {
        self.trial_count = trial_count;
        self
    }

    /// Reject option values the pipeline cannot honour.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |message: String| Err(ConfigError::Invalid { message });
        if self.trial_count == 0 {
            return invalid("trial_count must be >= 1".into());
        }
        if self.top_n == Some(0) {
            return invalid("top_n must be >= 1 when set".into());
        }
        for (name, value) in [
            ("confidence_threshold", self.confidence_threshold),
            ("confidence_margin", self.confidence_margin),
            ("min_probability", self.min_probability),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return invalid(format!("{name} must be within [0, 1], got {value}"));
            }
        }
        Ok(())
    }

    fn rank_policy(&self) -> RankPolicy {
        RankPolicy {
            top_n: self.top_n,
            confidence_threshold: self.confidence_threshold,
            confidence_margin: self.confidence_margin,
            min_probability: self.min_probability,
        }
    }
}

/// Pipeline stages shared by [`Identifier`] and [`identify`].
#[derive(Debug, Clone, Default)]
struct Pipeline {
    normalizer: Normalizer,
    extractor: NgramExtractor,
    classifier: Classifier,
}

impl Pipeline {
    fn from_config(config: &EngineConfig) -> Self {
        let extractor = NgramExtractor::new(&config.extractor);
        let classifier = Classifier::new(config.classifier.clone()).with_orders(extractor.orders());
        Self {
            normalizer: Normalizer::new(config.normalizer.clone()),
            extractor,
            classifier,
        }
    }

    fn run(
        &self,
        store: &ProfileStore,
        text: &str,
        options: &IdentifyOptions,
    ) -> LangResult<LanguageEstimate> {
        options.validate()?;
        if store.is_empty() {
            return Err(ClassifyError::NoSupportedLanguages.into());
        }

        let normalized = self.normalizer.normalize(text);
        let sample = self.extractor.extract(&normalized)?;
        let seed = options.seed.unwrap_or_else(rand::random);
        tracing::debug!(
            chars = normalized.significant_chars(),
            ngrams = sample.len(),
            seed,
            "identifying text"
        );

        let posterior = self
            .classifier
            .classify(&sample, store, options.trial_count, seed)?;
        Ok(Ranker::new(options.rank_policy()).rank(&posterior))
    }
}

/// Language identifier bound to a profile store.
#[derive(Debug, Clone)]
pub struct Identifier {
    store: Arc<ProfileStore>,
    pipeline: Pipeline,
    defaults: IdentifyOptions,
}

impl Identifier {
    /// Create an identifier with validated configuration.
    pub fn new(store: Arc<ProfileStore>, config: EngineConfig) -> LangResult<Self> {
        config.validate()?;
        if store.is_empty() {
            return Err(ClassifyError::NoSupportedLanguages.into());
        }
        tracing::info!(
            languages = store.len(),
            trials = config.defaults.trial_count,
            orders = ?config.extractor.orders,
            "initializing language identifier"
        );
        Ok(Self {
            pipeline: Pipeline::from_config(&config),
            defaults: config.defaults,
            store,
        })
    }

    pub fn store(&self) -> &Arc<ProfileStore> {
        &self.store
    }

    /// Options used by [`Self::identify_default`] and [`Self::detect`].
    pub fn defaults(&self) -> &IdentifyOptions {
        &self.defaults
    }

    /// Rank the supported languages for `text`.
    pub fn identify(&self, text: &str, options: &IdentifyOptions) -> LangResult<LanguageEstimate> {
        self.pipeline.run(&self.store, text, options)
    }

    /// [`Self::identify`] with the configured default options.
    pub fn identify_default(&self, text: &str) -> LangResult<LanguageEstimate> {
        self.identify(text, &self.defaults)
    }

    /// The single most likely language code for `text`.
    pub fn detect(&self, text: &str) -> LangResult<String> {
        let options = IdentifyOptions {
            top_n: Some(1),
            min_probability: 0.0,
            ..self.defaults.clone()
        };
        let estimate = self.identify(text, &options)?;
        estimate
            .languages
            .into_iter()
            .next()
            .map(|l| l.language)
            .ok_or_else(|| ClassifyError::NoSupportedLanguages.into())
    }

    /// Identify many texts in parallel. Results are in input order.
    pub fn identify_batch(
        &self,
        texts: &[&str],
        options: &IdentifyOptions,
    ) -> Vec<LangResult<LanguageEstimate>> {
        texts
            .par_iter()
            .map(|text| self.identify(text, options))
            .collect()
    }
}

/// Identify `text` against `store` using the default pipeline configuration.
pub fn identify(
    store: &ProfileStore,
    text: &str,
    options: &IdentifyOptions,
) -> LangResult<LanguageEstimate> {
    Pipeline::default().run(store, text, options)
}
