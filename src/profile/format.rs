//! On-disk profile artifact formats.
//!
//! Three encodings are accepted:
//!
//! - **Bundle** (JSON): `{ "format_version": 1, "profiles": [ProfileRecord, ...] }`
//! - **Record / frequency files** (JSON, one per language): either a
//!   [`ProfileRecord`] or a langdetect-style [`FrequencyProfile`] holding raw
//!   n-gram counts, converted to log-probabilities at load time.
//! - **Binary bundle**: the same [`ProfileBundle`] encoded with bincode, for
//!   fast startup.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ProfileError, ProfileResult};
use crate::ngram::MAX_ORDER;

/// Current artifact format version.
pub const FORMAT_VERSION: u32 = 1;

/// A single language profile as stored in an artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileRecord {
    /// Language code, e.g. `"en"`.
    pub language: String,
    /// N-gram (order 1..=3) → log-probability.
    #[serde(default)]
    pub ngrams: BTreeMap<String, f64>,
    /// Log-probability used for n-grams absent from `ngrams`.
    pub unseen_log_prob: f64,
    /// Log prior. Uniform across the store when absent.
    #[serde(default)]
    pub prior_log: Option<f64>,
}

/// A versioned collection of profile records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileBundle {
    pub format_version: u32,
    pub profiles: Vec<ProfileRecord>,
}

impl ProfileBundle {
    pub fn new(profiles: Vec<ProfileRecord>) -> Self {
        Self {
            format_version: FORMAT_VERSION,
            profiles,
        }
    }

    fn check_version(&self) -> ProfileResult<()> {
        if self.format_version != FORMAT_VERSION {
            return Err(ProfileError::UnsupportedVersion {
                found: self.format_version,
                expected: FORMAT_VERSION,
            });
        }
        Ok(())
    }
}

/// langdetect-style frequency profile: raw n-gram counts plus the total
/// number of n-grams observed at each order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrequencyProfile {
    pub name: String,
    pub freq: HashMap<String, u64>,
    pub n_words: Vec<u64>,
}

impl FrequencyProfile {
    /// Convert counts to log-probabilities.
    ///
    /// Each n-gram of order `k` gets `ln(count / n_words[k-1])`. The smoothing
    /// constant is `ln(alpha / max(n_words))`, i.e. the mass of a fraction
    /// of one observation at the best-sampled order.
    pub fn into_record(self, alpha: f64, origin: &str) -> ProfileResult<ProfileRecord> {
        let max_total = self.n_words.iter().copied().max().unwrap_or(0);
        if max_total == 0 {
            return Err(ProfileError::Parse {
                path: origin.to_string(),
                message: format!("frequency profile \"{}\" has no n-gram totals", self.name),
            });
        }

        let mut ngrams = BTreeMap::new();
        for (ngram, count) in self.freq {
            let order = ngram.chars().count();
            if order == 0 || order > MAX_ORDER as usize {
                return Err(ProfileError::InvalidNgram {
                    language: self.name,
                    ngram,
                });
            }
            let total = self.n_words.get(order - 1).copied().unwrap_or(0);
            if total == 0 {
                return Err(ProfileError::Parse {
                    path: origin.to_string(),
                    message: format!(
                        "frequency profile \"{}\" has counts for order {order} but no total",
                        self.name
                    ),
                });
            }
            ngrams.insert(ngram, (count as f64 / total as f64).ln());
        }

        Ok(ProfileRecord {
            language: self.name,
            ngrams,
            unseen_log_prob: (alpha / max_total as f64).ln(),
            prior_log: None,
        })
    }
}

/// Any single-language JSON file.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ProfileFile {
    Record(ProfileRecord),
    Frequency(FrequencyProfile),
}

fn read_file(path: &Path) -> ProfileResult<Vec<u8>> {
    std::fs::read(path).map_err(|source| ProfileError::Io {
        path: path.display().to_string(),
        source,
    })
}

fn parse_error(path: &Path, err: impl std::fmt::Display) -> ProfileError {
    ProfileError::Parse {
        path: path.display().to_string(),
        message: err.to_string(),
    }
}

/// Parse a JSON bundle from a string. `origin` names the source in errors.
pub fn parse_bundle_json(json: &str, origin: &Path) -> ProfileResult<Vec<ProfileRecord>> {
    let bundle: ProfileBundle = serde_json::from_str(json).map_err(|e| parse_error(origin, e))?;
    bundle.check_version()?;
    Ok(bundle.profiles)
}

/// Read a JSON bundle file.
pub fn read_bundle_json(path: &Path) -> ProfileResult<Vec<ProfileRecord>> {
    let bytes = read_file(path)?;
    let json = std::str::from_utf8(&bytes).map_err(|e| parse_error(path, e))?;
    parse_bundle_json(json, path)
}

/// Read a bincode bundle file.
pub fn read_bundle_binary(path: &Path) -> ProfileResult<Vec<ProfileRecord>> {
    let bytes = read_file(path)?;
    let bundle: ProfileBundle = bincode::deserialize(&bytes).map_err(|e| parse_error(path, e))?;
    bundle.check_version()?;
    Ok(bundle.profiles)
}

/// Write a bundle as bincode.
pub fn write_bundle_binary(bundle: &ProfileBundle, path: &Path) -> ProfileResult<()> {
    let bytes = bincode::serialize(bundle).map_err(|e| parse_error(path, e))?;
    std::fs::write(path, bytes).map_err(|source| ProfileError::Io {
        path: path.display().to_string(),
        source,
    })
}

/// Read a single-language JSON file (record or frequency profile).
pub fn read_profile_file(path: &Path, frequency_alpha: f64) -> ProfileResult<ProfileRecord> {
    let bytes = read_file(path)?;
    let file: ProfileFile = serde_json::from_slice(&bytes).map_err(|e| parse_error(path, e))?;
    match file {
        ProfileFile::Record(record) => Ok(record),
        ProfileFile::Frequency(freq) => {
            freq.into_record(frequency_alpha, &path.display().to_string())
        }
    }
}

/// Read every `*.json` file in `dir`, in file-name order.
pub fn read_profile_dir(dir: &Path, frequency_alpha: f64) -> ProfileResult<Vec<ProfileRecord>> {
    let entries = std::fs::read_dir(dir).map_err(|source| ProfileError::Io {
        path: dir.display().to_string(),
        source,
    })?;

    let mut paths = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| ProfileError::Io {
            path: dir.display().to_string(),
            source,
        })?;
        let path = entry.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "json") {
            paths.push(path);
        } else {
            tracing::warn!(path = %path.display(), "skipping non-profile entry");
        }
    }
    paths.sort();

    paths
        .iter()
        .map(|path| read_profile_file(path, frequency_alpha))
        .collect()
}
