//! Text normalization: reduce raw input to the characters that carry
//! language signal.
//!
//! The normalizer runs a fixed pipeline:
//!
//! 1. Truncate to `max_text_length` characters and apply Unicode NFC.
//! 2. Remove URLs and e-mail addresses.
//! 3. Keep letters only. Digits, punctuation, symbols, and control
//!    characters become word separators, whitespace runs collapse to a
//!    single space, and leading/trailing whitespace is dropped. Combining
//!    marks (viramas, tone marks) stay attached to the letter they follow.
//! 4. Fold case for cased scripts.
//! 5. Optionally restrict to a set of scripts, and drop Latin letters that
//!    are a small minority in otherwise non-Latin text.
//!
//! An empty result is a valid value; callers check [`NormalizedText::is_empty`]
//! before extraction.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

use crate::script::{Script, ScriptCounts};

static RE_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:https?|ftp)://[^\s]+|\bwww\.[^\s]+").unwrap()
});

static RE_MAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[A-Za-z0-9._%+-]+@[A-Za-z0-9-]+(?:\.[A-Za-z0-9-]+)+").unwrap()
});

/// Normalizer settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizerConfig {
    /// Input beyond this many characters is ignored.
    pub max_text_length: usize,
    /// Lowercase letters of cased scripts.
    pub fold_case: bool,
    /// Remove URLs and e-mail addresses before filtering.
    pub strip_urls: bool,
    /// Keep only letters of these scripts. `None` keeps every script.
    pub allowed_scripts: Option<Vec<Script>>,
    /// Drop Latin letters when non-Latin letters outnumber them 2:1.
    pub strip_minority_latin: bool,
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        Self {
            max_text_length: 10_000,
            fold_case: true,
            strip_urls: true,
            allowed_scripts: None,
            strip_minority_latin: true,
        }
    }
}

/// Text reduced to its language-bearing characters.
///
/// Words are separated by exactly one ASCII space; there is no leading or
/// trailing space.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NormalizedText {
    text: String,
    significant_chars: usize,
}

impl NormalizedText {
    /// The normalized character sequence.
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Number of significant (non-space) characters.
    pub fn significant_chars(&self) -> usize {
        self.significant_chars
    }

    pub fn is_empty(&self) -> bool {
        self.significant_chars == 0
    }
}

impl std::fmt::Display for NormalizedText {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.text)
    }
}

/// Applies [`NormalizerConfig`] to raw text.
#[derive(Debug, Clone, Default)]
pub struct Normalizer {
    config: NormalizerConfig,
}

impl Normalizer {
    pub fn new(config: NormalizerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &NormalizerConfig {
        &self.config
    }

    /// Normalize `raw` into its language-bearing characters.
    pub fn normalize(&self, raw: &str) -> NormalizedText {
        let truncated: String = raw
            .chars()
            .take(self.config.max_text_length)
            .nfc()
            .collect();

        let cleaned = if self.config.strip_urls {
            let no_urls = RE_URL.replace_all(&truncated, " ");
            RE_MAIL.replace_all(&no_urls, " ").into_owned()
        } else {
            truncated
        };

        let drop_latin =
            self.config.strip_minority_latin && ScriptCounts::of(&cleaned).latin_is_minority();

        let mut text = String::with_capacity(cleaned.len());
        let mut significant_chars = 0;
        let mut pending_space = false;
        // Whether the previous character was a kept letter a mark can join.
        let mut in_word = false;

        for c in cleaned.chars() {
            let Some(script) = Script::of(c) else {
                if is_combining_mark(c) {
                    if in_word {
                        text.push(c);
                        significant_chars += 1;
                    }
                    continue;
                }
                pending_space = true;
                in_word = false;
                continue;
            };
            if !self.keeps(script, drop_latin) {
                pending_space = true;
                in_word = false;
                continue;
            }

            if pending_space && !text.is_empty() {
                text.push(' ');
            }
            pending_space = false;
            in_word = true;

            if self.config.fold_case && script.is_cased() {
                significant_chars += push_lowercase(&mut text, c);
            } else {
                text.push(c);
                significant_chars += 1;
            }
        }

        NormalizedText {
            text,
            significant_chars,
        }
    }

    fn keeps(&self, script: Script, drop_latin: bool) -> bool {
        if drop_latin && script == Script::Latin {
            return false;
        }
        match &self.config.allowed_scripts {
            Some(allowed) => allowed.contains(&script),
            None => true,
        }
    }
}

/// Append the lowercase form of `c`, returning the characters written.
fn push_lowercase(text: &mut String, c: char) -> usize {
    // U+0130 lowercases to "i" + U+0307; the dot is already part of "i".
    if c == '\u{0130}' {
        text.push('i');
        return 1;
    }
    let mut written = 0;
    for lower in c.to_lowercase() {
        text.push(lower);
        written += 1;
    }
    written
}
