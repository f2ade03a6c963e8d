//! Rich diagnostic error types for the langprobe engine.
//!
//! Each subsystem defines its own error type with miette `#[diagnostic]` derives,
//! providing error codes, help text, and source chains so callers can tell
//! user-correctable input problems apart from operator-correctable setup problems.

use miette::Diagnostic;
use thiserror::Error;

/// Top-level error type for the langprobe engine.
///
/// Each variant wraps a subsystem-specific error, preserving the full diagnostic
/// chain (error codes, help text) through to the caller.
#[derive(Debug, Error, Diagnostic)]
pub enum LangError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Profile(#[from] ProfileError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Classify(#[from] ClassifyError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Config(#[from] ConfigError),
}

impl LangError {
    /// Whether the failure is caused by the submitted text rather than by
    /// the engine's setup. Only these errors should be reported back to the
    /// end user as "bad input".
    pub fn is_user_error(&self) -> bool {
        matches!(self, LangError::Classify(ClassifyError::InsufficientSignal { .. }))
    }
}

// ---------------------------------------------------------------------------
// Profile errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum ProfileError {
    #[error("I/O error reading profile artifact {path}: {source}")]
    #[diagnostic(
        code(langprobe::profile::io),
        help(
            "The profile artifact could not be read. Check that the path exists \
             and is readable by the current user."
        )
    )]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to decode profile artifact {path}: {message}")]
    #[diagnostic(
        code(langprobe::profile::parse),
        help(
            "The artifact is not a valid profile bundle, profile record, or \
             frequency profile. Check the JSON syntax, or re-run `langprobe compile` \
             if this is a binary artifact from an older version."
        )
    )]
    Parse { path: String, message: String },

    #[error("unsupported profile format version {found} (expected {expected})")]
    #[diagnostic(
        code(langprobe::profile::version),
        help("Regenerate the artifact with a matching version of the profile tooling.")
    )]
    UnsupportedVersion { found: u32, expected: u32 },

    #[error("profile \"{language}\" has no n-gram table")]
    #[diagnostic(
        code(langprobe::profile::missing_table),
        help("Every profile needs a non-empty table of n-gram log-probabilities.")
    )]
    MissingTable { language: String },

    #[error("profile \"{language}\" has a non-finite value for {field}")]
    #[diagnostic(
        code(langprobe::profile::non_finite),
        help(
            "Log-probabilities, priors, and smoothing constants must be finite numbers. \
             A NaN or infinity usually means a zero count was logged during export."
        )
    )]
    NonFinite { language: String, field: String },

    #[error("profile \"{language}\" has a positive log-probability {value} for {field}")]
    #[diagnostic(
        code(langprobe::profile::positive_log_prob),
        help("Log-probabilities must be <= 0. Check that the artifact stores ln(p), not p or counts.")
    )]
    PositiveLogProb {
        language: String,
        field: String,
        value: f64,
    },

    #[error("profile \"{language}\" contains an invalid n-gram \"{ngram}\"")]
    #[diagnostic(
        code(langprobe::profile::invalid_ngram),
        help("N-grams must be 1 to 3 characters long.")
    )]
    InvalidNgram { language: String, ngram: String },

    #[error("duplicate profile for language \"{language}\"")]
    #[diagnostic(
        code(langprobe::profile::duplicate),
        help(
            "Each language code may appear only once across the loaded artifacts. \
             Remove one of the conflicting profiles."
        )
    )]
    DuplicateLanguage { language: String },

    #[error("no language profiles were loaded")]
    #[diagnostic(
        code(langprobe::profile::empty),
        help(
            "The profile source contained no usable profiles. Point --profiles at a \
             bundle file or a directory of per-language JSON files."
        )
    )]
    NoProfiles,

    #[error("requested language \"{language}\" is not present in the profile source")]
    #[diagnostic(
        code(langprobe::profile::unknown_language),
        help("Remove it from the language allow-list, or add a profile for it.")
    )]
    UnknownLanguage { language: String },
}

// ---------------------------------------------------------------------------
// Classification errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum ClassifyError {
    #[error(
        "insufficient signal: {significant_chars} significant character(s) after normalization, \
         need at least {min_required}"
    )]
    #[diagnostic(
        code(langprobe::classify::insufficient_signal),
        help(
            "The text is too short or contains no letters once digits, punctuation, \
             and URLs are removed. Provide more text; retrying the same input \
             yields the same result."
        )
    )]
    InsufficientSignal {
        significant_chars: usize,
        min_required: usize,
    },

    #[error("no supported languages: the profile store is empty")]
    #[diagnostic(
        code(langprobe::classify::no_languages),
        help(
            "This indicates a startup defect: the profile store should have been \
             rejected at load time. Check how the store was constructed."
        )
    )]
    NoSupportedLanguages,

    #[error("internal classification fault: {message}")]
    #[diagnostic(
        code(langprobe::classify::internal),
        help(
            "A numeric invariant was violated during inference. This is a bug; \
             please report it together with the input and profile artifact."
        )
    )]
    Internal { message: String },
}

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    #[error("I/O error reading config {path}: {source}")]
    #[diagnostic(
        code(langprobe::config::io),
        help("Check that the configuration file exists and is readable.")
    )]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {message}")]
    #[diagnostic(
        code(langprobe::config::parse),
        help(
            "The configuration must be valid TOML. Recognised tables are [profiles], \
             [normalizer], [extractor], [classifier] and [defaults]; all are optional."
        )
    )]
    Parse { message: String },

    #[error("invalid configuration: {message}")]
    #[diagnostic(
        code(langprobe::config::invalid),
        help("Check the EngineConfig fields. {message}")
    )]
    Invalid { message: String },
}

/// Result type for profile loading.
pub type ProfileResult<T> = std::result::Result<T, ProfileError>;

/// Result type for classification steps.
pub type ClassifyResult<T> = std::result::Result<T, ClassifyError>;

/// Convenience alias for functions returning langprobe results.
pub type LangResult<T> = std::result::Result<T, LangError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profile_error_converts_to_lang_error() {
        let err = ProfileError::DuplicateLanguage {
            language: "en".into(),
        };
        let lang: LangError = err.into();
        assert!(matches!(
            lang,
            LangError::Profile(ProfileError::DuplicateLanguage { .. })
        ));
        assert!(!lang.is_user_error());
    }

    #[test]
    fn insufficient_signal_is_user_error() {
        let lang: LangError = ClassifyError::InsufficientSignal {
            significant_chars: 0,
            min_required: 1,
        }
        .into();
        assert!(lang.is_user_error());

        let lang: LangError = ClassifyError::NoSupportedLanguages.into();
        assert!(!lang.is_user_error());
    }

    #[test]
    fn error_display_messages_are_descriptive() {
        let err = ProfileError::PositiveLogProb {
            language: "fr".into(),
            field: "ngram \"le\"".into(),
            value: 0.25,
        };
        let msg = format!("{err}");
        assert!(msg.contains("fr"));
        assert!(msg.contains("0.25"));
    }
}
