// thiserror's #[error("...{field}...")] format strings reference struct fields,
// but the compiler doesn't see through the derive macro and reports false positives.
#![allow(unused_assignments)]

//! # langprobe
//!
//! Statistical natural-language identification over character n-grams.
//!
//! ## Architecture
//!
//! ```text
//! raw text ──→ Normalizer ──→ NgramExtractor ──→ Classifier ──→ Ranker ──→ LanguageEstimate
//!                                                    │
//!                                              ProfileStore (immutable, shared)
//! ```
//!
//! - **Profiles** (`profile`): per-language n-gram log-probability tables, loaded once
//! - **Normalizer** (`normalize`): keeps only language-bearing characters
//! - **Extractor** (`ngram`): overlapping character n-grams of order 1–3
//! - **Classifier** (`classify`): log-space Bayesian scoring averaged over seeded trials
//! - **Ranker** (`rank`): sorted probabilities plus a confident/ambiguous verdict
//!
//! ## Library usage
//!
//! ```no_run
//! use std::sync::Arc;
//! use langprobe::config::EngineConfig;
//! use langprobe::identify::{IdentifyOptions, Identifier};
//! use langprobe::profile::{ProfileSource, ProfileStore};
//!
//! let config = EngineConfig::default();
//! let store = ProfileStore::load(&ProfileSource::Directory("profiles/".into()), &config.profiles).unwrap();
//! let identifier = Identifier::new(Arc::new(store), config).unwrap();
//! let estimate = identifier.identify("Le renard brun rapide saute", &IdentifyOptions::default()).unwrap();
//! assert_eq!(estimate.top().unwrap().language, "fr");
//! ```

pub mod classify;
pub mod config;
pub mod error;
pub mod identify;
pub mod ngram;
pub mod normalize;
pub mod profile;
pub mod rank;
pub mod script;

pub use error::{LangError, LangResult};
pub use identify::{IdentifyOptions, Identifier, identify};
pub use rank::{Confidence, LanguageEstimate, LanguageProbability};
