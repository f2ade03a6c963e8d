//! Engine configuration, loadable from TOML.
//!
//! Every table and field is optional; omitted values take their defaults.
//!
//! ```toml
//! [profiles]
//! backend = "sorted"
//! languages = ["en", "fr", "es"]
//!
//! [normalizer]
//! max_text_length = 5000
//! allowed_scripts = ["latin"]
//!
//! [extractor]
//! orders = [1, 2, 3]
//!
//! [classifier]
//! renorm_interval = 5
//! order_weights = { unigram = 1.0, bigram = 2.0, trigram = 3.0 }
//!
//! [defaults]
//! trial_count = 7
//! confidence_threshold = 0.5
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::classify::ClassifierConfig;
use crate::error::ConfigError;
use crate::identify::IdentifyOptions;
use crate::ngram::{ExtractorConfig, MAX_ORDER};
use crate::normalize::NormalizerConfig;
use crate::profile::LoadOptions;

/// Complete engine configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub profiles: LoadOptions,
    pub normalizer: NormalizerConfig,
    pub extractor: ExtractorConfig,
    pub classifier: ClassifierConfig,
    /// Options applied when a caller does not pass its own.
    pub defaults: IdentifyOptions,
}

impl EngineConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(toml_str: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(toml_str).map_err(|e| ConfigError::Parse {
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse, and validate a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Serialize to TOML.
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Parse {
            message: e.to_string(),
        })
    }

    /// Check cross-field constraints.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |message: String| Err(ConfigError::Invalid { message });

        let alpha = self.profiles.frequency_alpha;
        if !(alpha.is_finite() && alpha > 0.0) {
            return invalid(format!("profiles.frequency_alpha must be > 0, got {alpha}"));
        }

        if self.normalizer.max_text_length == 0 {
            return invalid("normalizer.max_text_length must be > 0".into());
        }

        if self.extractor.orders.is_empty() {
            return invalid("extractor.orders must name at least one order".into());
        }
        if let Some(bad) = self
            .extractor
            .orders
            .iter()
            .find(|&&k| k == 0 || k > MAX_ORDER)
        {
            return invalid(format!(
                "extractor.orders entries must be within 1..={MAX_ORDER}, got {bad}"
            ));
        }

        let weights = self.classifier.order_weights;
        for (name, w) in [
            ("unigram", weights.unigram),
            ("bigram", weights.bigram),
            ("trigram", weights.trigram),
        ] {
            if !(w.is_finite() && w > 0.0) {
                return invalid(format!("classifier.order_weights.{name} must be > 0, got {w}"));
            }
        }
        if self.classifier.renorm_interval == 0 {
            return invalid("classifier.renorm_interval must be >= 1".into());
        }
        if let Some(t) = self.classifier.convergence_threshold {
            if !(t > 0.0 && t < 1.0) {
                return invalid(format!(
                    "classifier.convergence_threshold must be within (0, 1), got {t}"
                ));
            }
        }

        self.defaults.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::TableBackend;
    use crate::script::Script;

    #[test]
    fn empty_document_gives_defaults() {
        let config = EngineConfig::from_toml_str("").unwrap();
        assert_eq!(config, EngineConfig::default());
        assert_eq!(config.defaults.trial_count, 7);
        assert_eq!(config.extractor.orders, vec![1, 2, 3]);
    }

    #[test]
    fn parses_partial_tables() {
        let config = EngineConfig::from_toml_str(
            r#"
            [profiles]
            backend = "sorted"
            languages = ["en", "fr"]

            [normalizer]
            allowed_scripts = ["latin", "cyrillic"]

            [classifier]
            renorm_interval = 3
            order_weights = { trigram = 4.0 }

            [defaults]
            trial_count = 11
            seed = 99
            "#,
        )
        .unwrap();
        assert_eq!(config.profiles.backend, TableBackend::Sorted);
        assert_eq!(
            config.normalizer.allowed_scripts,
            Some(vec![Script::Latin, Script::Cyrillic])
        );
        assert!(config.normalizer.fold_case);
        assert_eq!(config.classifier.renorm_interval, 3);
        assert_eq!(config.classifier.order_weights.trigram, 4.0);
        assert_eq!(config.classifier.order_weights.unigram, 1.0);
        assert_eq!(config.defaults.trial_count, 11);
        assert_eq!(config.defaults.seed, Some(99));
    }

    #[test]
    fn rejects_invalid_values() {
        for doc in [
            "[defaults]\ntrial_count = 0",
            "[defaults]\nconfidence_threshold = 1.5",
            "[extractor]\norders = [4]",
            "[extractor]\norders = []",
            "[classifier]\nrenorm_interval = 0",
            "[classifier]\norder_weights = { bigram = -1.0 }",
            "[classifier]\nconvergence_threshold = 1.0",
            "[normalizer]\nmax_text_length = 0",
            "[profiles]\nfrequency_alpha = 0.0",
        ] {
            assert!(
                matches!(
                    EngineConfig::from_toml_str(doc),
                    Err(ConfigError::Invalid { .. })
                ),
                "accepted {doc:?}"
            );
        }
    }

    #[test]
    fn malformed_toml_is_parse_error() {
        assert!(matches!(
            EngineConfig::from_toml_str("[defaults\ntrial_count = "),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn toml_round_trip() {
        let mut config = EngineConfig::default();
        config.defaults.top_n = Some(3);
        let text = config.to_toml_string().unwrap();
        assert_eq!(EngineConfig::from_toml_str(&text).unwrap(), config);
    }

    #[test]
    fn reads_from_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("langprobe.toml");
        std::fs::write(&path, "[defaults]\ntrial_count = 3\n").unwrap();
        assert_eq!(EngineConfig::from_file(&path).unwrap().defaults.trial_count, 3);
        assert!(matches!(
            EngineConfig::from_file(&dir.path().join("missing.toml")),
            Err(ConfigError::Io { .. })
        ));
    }
}
