//! Language profile store.
//!
//! A [`ProfileStore`] holds one immutable [`LanguageProfile`] per supported
//! language. It is loaded once, validated as a whole, and then shared
//! read-only (typically behind an `Arc`) by every classification call.
//! There is no way to add or remove a language after construction, which is
//! what makes concurrent reads safe without locking.
//!
//! ## Loading
//!
//! ```no_run
//! use langprobe::profile::{LoadOptions, ProfileSource, ProfileStore};
//!
//! let store = ProfileStore::load(
//!     &ProfileSource::Directory("profiles/".into()),
//!     &LoadOptions::default(),
//! )
//! .unwrap();
//! println!("{} languages", store.len());
//! ```

pub mod format;
pub mod table;

use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{ProfileError, ProfileResult};
use crate::ngram::MAX_ORDER;

pub use format::{FORMAT_VERSION, FrequencyProfile, ProfileBundle, ProfileRecord};
pub use table::{HashTable, NgramLookup, SortedTable, TableBackend};

/// Where to load profiles from.
#[derive(Debug, Clone)]
pub enum ProfileSource {
    /// A JSON bundle file.
    Bundle(PathBuf),
    /// A directory of per-language JSON files.
    Directory(PathBuf),
    /// A bincode bundle produced by [`ProfileStore::save_binary`].
    Binary(PathBuf),
    /// Records already in memory.
    Records(Vec<ProfileRecord>),
}

impl fmt::Display for ProfileSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProfileSource::Bundle(p) => write!(f, "bundle {}", p.display()),
            ProfileSource::Directory(p) => write!(f, "directory {}", p.display()),
            ProfileSource::Binary(p) => write!(f, "binary {}", p.display()),
            ProfileSource::Records(r) => write!(f, "{} in-memory record(s)", r.len()),
        }
    }
}

/// Options controlling how profiles are loaded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoadOptions {
    /// Lookup table implementation.
    pub backend: TableBackend,
    /// Fraction of one observation assigned to unseen n-grams when converting
    /// frequency profiles.
    pub frequency_alpha: f64,
    /// Keep only these languages. Every entry must exist in the source.
    pub languages: Option<Vec<String>>,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            backend: TableBackend::Hash,
            frequency_alpha: 0.5,
            languages: None,
        }
    }
}

/// One language's statistical fingerprint.
#[derive(Debug)]
pub struct LanguageProfile {
    language_code: String,
    table: Box<dyn NgramLookup>,
    unseen_log_prob: f64,
    prior_log: f64,
}

impl LanguageProfile {
    /// Validate a record and build its lookup table.
    fn from_record(
        record: ProfileRecord,
        uniform_prior: f64,
        backend: TableBackend,
    ) -> ProfileResult<Self> {
        let language = record.language;

        if record.ngrams.is_empty() {
            return Err(ProfileError::MissingTable { language });
        }
        check_log_prob(&language, "unseen_log_prob", record.unseen_log_prob)?;
        let prior_log = record.prior_log.unwrap_or(uniform_prior);
        check_log_prob(&language, "prior_log", prior_log)?;

        for (ngram, &log_prob) in &record.ngrams {
            let order = ngram.chars().count();
            if order == 0 || order > MAX_ORDER as usize {
                return Err(ProfileError::InvalidNgram {
                    language,
                    ngram: ngram.clone(),
                });
            }
            check_log_prob(&language, &format!("ngram \"{ngram}\""), log_prob)?;
        }

        Ok(Self {
            table: backend.build(record.ngrams),
            language_code: language,
            unseen_log_prob: record.unseen_log_prob,
            prior_log,
        })
    }

    pub fn language_code(&self) -> &str {
        &self.language_code
    }

    /// Log-probability of `ngram`, falling back to the smoothing constant.
    pub fn log_prob(&self, ngram: &str) -> f64 {
        self.table.lookup(ngram).unwrap_or(self.unseen_log_prob)
    }

    /// The raw lookup table.
    pub fn table(&self) -> &dyn NgramLookup {
        self.table.as_ref()
    }

    pub fn unseen_log_prob(&self) -> f64 {
        self.unseen_log_prob
    }

    pub fn prior_log(&self) -> f64 {
        self.prior_log
    }

    pub fn ngram_count(&self) -> usize {
        self.table.len()
    }

    /// Export back to a record with an explicit prior.
    pub fn to_record(&self) -> ProfileRecord {
        ProfileRecord {
            language: self.language_code.clone(),
            ngrams: self
                .table
                .entries()
                .map(|(k, v)| (k.to_string(), v))
                .collect::<BTreeMap<_, _>>(),
            unseen_log_prob: self.unseen_log_prob,
            prior_log: Some(self.prior_log),
        }
    }
}

fn check_log_prob(language: &str, field: &str, value: f64) -> ProfileResult<()> {
    if !value.is_finite() {
        return Err(ProfileError::NonFinite {
            language: language.to_string(),
            field: field.to_string(),
        });
    }
    if value > 0.0 {
        return Err(ProfileError::PositiveLogProb {
            language: language.to_string(),
            field: field.to_string(),
            value,
        });
    }
    Ok(())
}

/// Immutable set of language profiles, ordered by language code.
#[derive(Debug)]
pub struct ProfileStore {
    profiles: Vec<LanguageProfile>,
    index: HashMap<String, usize>,
}

impl ProfileStore {
    /// Load and validate every profile from `source`.
    ///
    /// Fails if any profile is malformed, a language appears twice, or no
    /// profile remains after applying the language allow-list.
    pub fn load(source: &ProfileSource, options: &LoadOptions) -> ProfileResult<Self> {
        let records = match source {
            ProfileSource::Bundle(path) => format::read_bundle_json(path)?,
            ProfileSource::Directory(path) => {
                format::read_profile_dir(path, options.frequency_alpha)?
            }
            ProfileSource::Binary(path) => format::read_bundle_binary(path)?,
            ProfileSource::Records(records) => records.clone(),
        };
        let store = Self::from_records(records, options)?;
        tracing::info!(
            languages = store.len(),
            backend = %options.backend,
            source = %source,
            "loaded profile store"
        );
        Ok(store)
    }

    /// Build a store from in-memory records.
    pub fn from_records(records: Vec<ProfileRecord>, options: &LoadOptions) -> ProfileResult<Self> {
        let mut seen = HashSet::new();
        for record in &records {
            if !seen.insert(record.language.as_str()) {
                return Err(ProfileError::DuplicateLanguage {
                    language: record.language.clone(),
                });
            }
        }

        let records = match &options.languages {
            Some(allowed) => {
                if let Some(missing) = allowed.iter().find(|code| !seen.contains(code.as_str())) {
                    return Err(ProfileError::UnknownLanguage {
                        language: missing.clone(),
                    });
                }
                records
                    .into_iter()
                    .filter(|r| allowed.contains(&r.language))
                    .collect::<Vec<_>>()
            }
            None => records,
        };

        if records.is_empty() {
            return Err(ProfileError::NoProfiles);
        }

        let uniform_prior = -(records.len() as f64).ln();
        let mut profiles = records
            .into_iter()
            .map(|record| LanguageProfile::from_record(record, uniform_prior, options.backend))
            .collect::<ProfileResult<Vec<_>>>()?;
        profiles.sort_by(|a, b| a.language_code.cmp(&b.language_code));

        let index = profiles
            .iter()
            .enumerate()
            .map(|(i, p)| (p.language_code.clone(), i))
            .collect();

        Ok(Self { profiles, index })
    }

    #[cfg(test)]
    pub(crate) fn empty() -> Self {
        Self {
            profiles: Vec::new(),
            index: HashMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }

    /// Profiles in ascending language-code order.
    pub fn profiles(&self) -> &[LanguageProfile] {
        &self.profiles
    }

    /// Supported language codes, ascending.
    pub fn languages(&self) -> impl Iterator<Item = &str> {
        self.profiles.iter().map(|p| p.language_code.as_str())
    }

    /// Position of `code` in [`Self::profiles`].
    pub fn index_of(&self, code: &str) -> Option<usize> {
        self.index.get(code).copied()
    }

    pub fn try_get(&self, code: &str) -> Option<&LanguageProfile> {
        self.index_of(code).map(|i| &self.profiles[i])
    }

    /// Look up a profile that is known to exist.
    ///
    /// # Panics
    ///
    /// Panics if `code` is not a supported language. Callers iterate the
    /// store's own language set, so a miss is a programming error.
    pub fn get(&self, code: &str) -> &LanguageProfile {
        self.try_get(code)
            .unwrap_or_else(|| panic!("language \"{code}\" is not in the profile store"))
    }

    /// Export all profiles as a versioned bundle.
    pub fn to_bundle(&self) -> ProfileBundle {
        ProfileBundle::new(self.profiles.iter().map(LanguageProfile::to_record).collect())
    }

    /// Write the store as a bincode bundle.
    pub fn save_binary(&self, path: &std::path::Path) -> ProfileResult<()> {
        format::write_bundle_binary(&self.to_bundle(), path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(language: &str, ngrams: &[(&str, f64)]) -> ProfileRecord {
        ProfileRecord {
            language: language.to_string(),
            ngrams: ngrams.iter().map(|(k, v)| (k.to_string(), *v)).collect(),
            unseen_log_prob: -10.0,
            prior_log: None,
        }
    }

    fn store(records: Vec<ProfileRecord>) -> ProfileResult<ProfileStore> {
        ProfileStore::from_records(records, &LoadOptions::default())
    }

    #[test]
    fn profiles_are_sorted_with_uniform_prior() {
        let s = store(vec![
            record("fr", &[("e", -2.0)]),
            record("en", &[("t", -2.0)]),
        ])
        .unwrap();
        assert_eq!(s.languages().collect::<Vec<_>>(), vec!["en", "fr"]);
        let expected = -(2.0f64).ln();
        assert!((s.get("fr").prior_log() - expected).abs() < 1e-12);
        assert_eq!(s.index_of("fr"), Some(1));
    }

    #[test]
    fn lookup_falls_back_to_unseen() {
        let s = store(vec![record("en", &[("th", -3.0)])]).unwrap();
        let en = s.get("en");
        assert_eq!(en.log_prob("th"), -3.0);
        assert_eq!(en.log_prob("zz"), -10.0);
    }

    #[test]
    fn rejects_duplicates() {
        let err = store(vec![record("en", &[("a", -1.0)]), record("en", &[("b", -1.0)])])
            .unwrap_err();
        assert!(matches!(err, ProfileError::DuplicateLanguage { language } if language == "en"));
    }

    #[test]
    fn rejects_empty_store() {
        assert!(matches!(store(vec![]), Err(ProfileError::NoProfiles)));
    }

    #[test]
    fn rejects_missing_table() {
        let err = store(vec![record("en", &[])]).unwrap_err();
        assert!(matches!(err, ProfileError::MissingTable { .. }));
    }

    #[test]
    fn rejects_non_finite_and_positive_values() {
        let err = store(vec![record("en", &[("a", f64::NAN)])]).unwrap_err();
        assert!(matches!(err, ProfileError::NonFinite { .. }));

        let err = store(vec![record("en", &[("a", 0.5)])]).unwrap_err();
        assert!(matches!(err, ProfileError::PositiveLogProb { .. }));

        let mut bad_unseen = record("en", &[("a", -1.0)]);
        bad_unseen.unseen_log_prob = f64::NEG_INFINITY;
        assert!(matches!(
            store(vec![bad_unseen]),
            Err(ProfileError::NonFinite { .. })
        ));
    }

    #[test]
    fn rejects_overlong_ngrams() {
        let err = store(vec![record("en", &[("abcd", -1.0)])]).unwrap_err();
        assert!(matches!(err, ProfileError::InvalidNgram { .. }));
    }

    #[test]
    fn allow_list_filters_and_validates() {
        let records = vec![
            record("en", &[("a", -1.0)]),
            record("fr", &[("a", -1.0)]),
            record("es", &[("a", -1.0)]),
        ];
        let options = LoadOptions {
            languages: Some(vec!["fr".into(), "en".into()]),
            ..Default::default()
        };
        let s = ProfileStore::from_records(records.clone(), &options).unwrap();
        assert_eq!(s.languages().collect::<Vec<_>>(), vec!["en", "fr"]);

        let options = LoadOptions {
            languages: Some(vec!["de".into()]),
            ..Default::default()
        };
        assert!(matches!(
            ProfileStore::from_records(records, &options),
            Err(ProfileError::UnknownLanguage { .. })
        ));
    }

    #[test]
    #[should_panic(expected = "not in the profile store")]
    fn get_unknown_language_panics() {
        let s = store(vec![record("en", &[("a", -1.0)])]).unwrap();
        s.get("xx");
    }

    #[test]
    fn sorted_backend_behaves_like_hash() {
        let records = vec![record("en", &[("a", -1.0), ("ab", -2.0)])];
        let options = LoadOptions {
            backend: TableBackend::Sorted,
            ..Default::default()
        };
        let s = ProfileStore::from_records(records, &options).unwrap();
        assert_eq!(s.get("en").log_prob("ab"), -2.0);
        assert_eq!(s.get("en").log_prob("b"), -10.0);
    }

    #[test]
    fn bundle_export_round_trips_through_store() {
        let s = store(vec![record("en", &[("a", -1.0), ("th", -4.0)])]).unwrap();
        let bundle = s.to_bundle();
        assert_eq!(bundle.format_version, FORMAT_VERSION);
        let reloaded = ProfileStore::from_records(bundle.profiles, &LoadOptions::default()).unwrap();
        assert_eq!(reloaded.get("en").log_prob("th"), -4.0);
        assert_eq!(reloaded.get("en").prior_log(), 0.0);
    }
}
