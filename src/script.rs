//! Unicode script classification for letters.
//!
//! Codepoint ranges identify the writing system of each alphabetic
//! character. The normalizer uses this to filter text down to the scripts
//! a caller cares about, and to drop stray Latin letters (brand names,
//! inline identifiers) from text that is predominantly in another script.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Writing system of a single letter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Script {
    Latin,
    Greek,
    Cyrillic,
    Armenian,
    Hebrew,
    Arabic,
    Devanagari,
    Bengali,
    Thai,
    Georgian,
    Hangul,
    Hiragana,
    Katakana,
    Han,
    /// Any other alphabetic character.
    Other,
}

impl Script {
    /// Classify an alphabetic character. Returns `None` for non-letters.
    pub fn of(c: char) -> Option<Script> {
        if !c.is_alphabetic() {
            return None;
        }
        let script = match c {
            // Latin (Basic + Latin-1 + Extended-A/B + IPA + Extended Additional)
            '\u{0041}'..='\u{024F}' | '\u{0250}'..='\u{02AF}' | '\u{1E00}'..='\u{1EFF}' => {
                Script::Latin
            }
            // Greek + Greek Extended
            '\u{0370}'..='\u{03FF}' | '\u{1F00}'..='\u{1FFF}' => Script::Greek,
            // Cyrillic + Supplement + Extended-A/B
            '\u{0400}'..='\u{052F}' | '\u{2DE0}'..='\u{2DFF}' | '\u{A640}'..='\u{A69F}' => {
                Script::Cyrillic
            }
            '\u{0530}'..='\u{058F}' => Script::Armenian,
            '\u{0590}'..='\u{05FF}' => Script::Hebrew,
            // Arabic + Supplement + Extended-A + Presentation Forms
            '\u{0600}'..='\u{06FF}'
            | '\u{0750}'..='\u{077F}'
            | '\u{08A0}'..='\u{08FF}'
            | '\u{FB50}'..='\u{FDFF}'
            | '\u{FE70}'..='\u{FEFF}' => Script::Arabic,
            '\u{0900}'..='\u{097F}' => Script::Devanagari,
            '\u{0980}'..='\u{09FF}' => Script::Bengali,
            '\u{0E00}'..='\u{0E7F}' => Script::Thai,
            '\u{10A0}'..='\u{10FF}' => Script::Georgian,
            '\u{1100}'..='\u{11FF}' | '\u{3130}'..='\u{318F}' | '\u{AC00}'..='\u{D7AF}' => {
                Script::Hangul
            }
            '\u{3040}'..='\u{309F}' => Script::Hiragana,
            '\u{30A0}'..='\u{30FF}' | '\u{31F0}'..='\u{31FF}' => Script::Katakana,
            '\u{3400}'..='\u{4DBF}' | '\u{4E00}'..='\u{9FFF}' | '\u{F900}'..='\u{FAFF}' => {
                Script::Han
            }
            _ => Script::Other,
        };
        Some(script)
    }

    /// Whether upper/lower case distinctions exist in this script.
    pub fn is_cased(self) -> bool {
        matches!(
            self,
            Script::Latin | Script::Greek | Script::Cyrillic | Script::Armenian | Script::Georgian
        )
    }

    /// Lowercase name, as used in configuration files.
    pub fn name(self) -> &'static str {
        match self {
            Script::Latin => "latin",
            Script::Greek => "greek",
            Script::Cyrillic => "cyrillic",
            Script::Armenian => "armenian",
            Script::Hebrew => "hebrew",
            Script::Arabic => "arabic",
            Script::Devanagari => "devanagari",
            Script::Bengali => "bengali",
            Script::Thai => "thai",
            Script::Georgian => "georgian",
            Script::Hangul => "hangul",
            Script::Hiragana => "hiragana",
            Script::Katakana => "katakana",
            Script::Han => "han",
            Script::Other => "other",
        }
    }
}

impl fmt::Display for Script {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Script {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let script = match s.trim().to_lowercase().as_str() {
            "latin" => Script::Latin,
            "greek" => Script::Greek,
            "cyrillic" => Script::Cyrillic,
            "armenian" => Script::Armenian,
            "hebrew" => Script::Hebrew,
            "arabic" => Script::Arabic,
            "devanagari" => Script::Devanagari,
            "bengali" => Script::Bengali,
            "thai" => Script::Thai,
            "georgian" => Script::Georgian,
            "hangul" => Script::Hangul,
            "hiragana" => Script::Hiragana,
            "katakana" => Script::Katakana,
            "han" => Script::Han,
            "other" => Script::Other,
            other => return Err(format!("unknown script \"{other}\"")),
        };
        Ok(script)
    }
}

/// Letter counts per script class over a text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScriptCounts {
    pub latin: usize,
    pub non_latin: usize,
}

impl ScriptCounts {
    /// Count Latin and non-Latin letters in `text`.
    pub fn of(text: &str) -> Self {
        let mut counts = Self::default();
        for c in text.chars() {
            match Script::of(c) {
                Some(Script::Latin) => counts.latin += 1,
                Some(_) => counts.non_latin += 1,
                None => {}
            }
        }
        counts
    }

    /// True when non-Latin letters outnumber Latin ones at least two to one,
    /// i.e. Latin letters are incidental noise in the text.
    pub fn latin_is_minority(&self) -> bool {
        self.latin > 0 && self.latin * 2 < self.non_latin
    }
}
