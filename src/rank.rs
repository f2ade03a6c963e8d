//! Ranking and result packaging.
//!
//! Turns a [`Posterior`] into the caller-facing [`LanguageEstimate`]:
//! languages sorted by probability (ties broken by language code), an
//! ambiguity verdict computed over the full posterior, then the optional
//! probability cutoff and top-N truncation. Ambiguity is informational and
//! never turns a result into an error.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::classify::Posterior;

/// Ranking and confidence policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RankPolicy {
    /// Keep at most this many languages. `None` keeps all.
    pub top_n: Option<usize>,
    /// The leader must exceed this probability to be confident.
    pub confidence_threshold: f64,
    /// ... and beat the runner-up by more than this margin.
    pub confidence_margin: f64,
    /// Drop languages below this probability from the output.
    pub min_probability: f64,
}

impl Default for RankPolicy {
    fn default() -> Self {
        Self {
            top_n: None,
            confidence_threshold: 0.5,
            confidence_margin: 0.1,
            min_probability: 0.0,
        }
    }
}

/// Overall confidence of an estimate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    Confident,
    Ambiguous,
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Confidence::Confident => write!(f, "confident"),
            Confidence::Ambiguous => write!(f, "ambiguous"),
        }
    }
}

/// A language and its posterior probability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LanguageProbability {
    pub language: String,
    pub probability: f64,
}

impl fmt::Display for LanguageProbability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{:.6}", self.language, self.probability)
    }
}

/// Final ranked answer for one text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LanguageEstimate {
    /// Languages by descending probability.
    pub languages: Vec<LanguageProbability>,
    /// True when the leader is not clearly ahead.
    pub ambiguous: bool,
    pub confidence: Confidence,
    /// Number of trials averaged.
    pub trials: usize,
    /// Number of n-grams in the sample.
    pub sample_size: usize,
}

impl LanguageEstimate {
    /// The most likely language, if any survived the cutoff.
    pub fn top(&self) -> Option<&LanguageProbability> {
        self.languages.first()
    }

    pub fn probability(&self, language: &str) -> Option<f64> {
        self.languages
            .iter()
            .find(|l| l.language == language)
            .map(|l| l.probability)
    }

    pub fn total_probability(&self) -> f64 {
        self.languages.iter().map(|l| l.probability).sum()
    }

    pub fn is_ambiguous(&self) -> bool {
        self.ambiguous
    }
}

impl fmt::Display for LanguageEstimate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.languages.iter().map(ToString::to_string).collect();
        write!(f, "[{}] ({})", parts.join(", "), self.confidence)
    }
}

/// Applies a [`RankPolicy`] to posteriors.
#[derive(Debug, Clone, Default)]
pub struct Ranker {
    policy: RankPolicy,
}

impl Ranker {
    pub fn new(policy: RankPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &RankPolicy {
        &self.policy
    }

    /// Rank `posterior` into a [`LanguageEstimate`].
    pub fn rank(&self, posterior: &Posterior) -> LanguageEstimate {
        let mut languages: Vec<LanguageProbability> = posterior
            .entries()
            .iter()
            .map(|(language, probability)| LanguageProbability {
                language: language.clone(),
                probability: probability.clamp(0.0, 1.0),
            })
            .collect();
        languages.sort_by(|a, b| {
            b.probability
                .total_cmp(&a.probability)
                .then_with(|| a.language.cmp(&b.language))
        });

        let confidence = self.confidence_of(&languages);

        languages.retain(|l| l.probability >= self.policy.min_probability);
        if let Some(n) = self.policy.top_n {
            languages.truncate(n);
        }

        LanguageEstimate {
            languages,
            ambiguous: confidence == Confidence::Ambiguous,
            confidence,
            trials: posterior.trials(),
            sample_size: posterior.sample_size(),
        }
    }

    fn confidence_of(&self, ranked: &[LanguageProbability]) -> Confidence {
        let Some(top) = ranked.first() else {
            return Confidence::Ambiguous;
        };
        let runner_up = ranked.get(1).map_or(0.0, |l| l.probability);
        if top.probability > self.policy.confidence_threshold
            && top.probability - runner_up > self.policy.confidence_margin
        {
            Confidence::Confident
        } else {
            Confidence::Ambiguous
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn posterior(entries: &[(&str, f64)]) -> Posterior {
        Posterior::new(
            entries.iter().map(|(l, p)| (l.to_string(), *p)).collect(),
            7,
            10,
        )
    }

    fn codes(estimate: &LanguageEstimate) -> Vec<&str> {
        estimate.languages.iter().map(|l| l.language.as_str()).collect()
    }

    #[test]
    fn sorts_descending() {
        let est = Ranker::default().rank(&posterior(&[("en", 0.1), ("fr", 0.7), ("es", 0.2)]));
        assert_eq!(codes(&est), vec!["fr", "es", "en"]);
        assert_eq!(est.top().unwrap().language, "fr");
        assert!(!est.ambiguous);
        assert_eq!(est.confidence, Confidence::Confident);
    }

    #[test]
    fn ties_break_by_language_code() {
        let est = Ranker::default().rank(&posterior(&[("zz", 0.4), ("aa", 0.4), ("mm", 0.2)]));
        assert_eq!(codes(&est), vec!["aa", "zz", "mm"]);
        assert!(est.ambiguous);
    }

    #[test]
    fn low_top_probability_is_ambiguous() {
        let est = Ranker::default().rank(&posterior(&[("en", 0.45), ("fr", 0.30), ("es", 0.25)]));
        assert!(est.is_ambiguous());
        assert_eq!(est.top().unwrap().language, "en");
    }

    #[test]
    fn narrow_margin_is_ambiguous() {
        let est = Ranker::default().rank(&posterior(&[("en", 0.54), ("fr", 0.46)]));
        assert!(est.ambiguous);
    }

    #[test]
    fn single_language_compares_against_zero() {
        let est = Ranker::default().rank(&posterior(&[("en", 1.0)]));
        assert!(!est.ambiguous);
    }

    #[test]
    fn truncation_does_not_change_ambiguity() {
        let ranker = Ranker::new(RankPolicy {
            top_n: Some(1),
            ..Default::default()
        });
        let est = ranker.rank(&posterior(&[("en", 0.52), ("fr", 0.48)]));
        assert_eq!(codes(&est), vec!["en"]);
        assert!(est.ambiguous);
    }

    #[test]
    fn cutoff_drops_residual_mass() {
        let ranker = Ranker::new(RankPolicy {
            min_probability: 0.1,
            ..Default::default()
        });
        let est = ranker.rank(&posterior(&[("en", 0.85), ("fr", 0.1), ("es", 0.05)]));
        assert_eq!(codes(&est), vec!["en", "fr"]);
        assert!(est.total_probability() <= 1.0);
        assert_eq!(est.probability("es"), None);
    }

    #[test]
    fn thresholds_are_configurable() {
        let strict = Ranker::new(RankPolicy {
            confidence_threshold: 0.9,
            ..Default::default()
        });
        assert!(strict.rank(&posterior(&[("en", 0.8), ("fr", 0.2)])).ambiguous);
        assert!(!Ranker::default().rank(&posterior(&[("en", 0.8), ("fr", 0.2)])).ambiguous);
    }

    #[test]
    fn display_lists_languages() {
        let est = Ranker::default().rank(&posterior(&[("en", 0.75), ("fr", 0.25)]));
        assert_eq!(est.to_string(), "[en:0.750000, fr:0.250000] (confident)");
    }
}
