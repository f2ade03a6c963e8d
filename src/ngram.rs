//! Character n-gram extraction.
//!
//! Slides a window of `k` characters (stride 1) over normalized text for
//! each configured order `k`. Spaces only mark word boundaries: an n-gram
//! may start or end on a space but never contain one in its interior, and
//! a window made only of spaces is never emitted. Short inputs simply yield
//! no n-grams at the orders they cannot fill; nothing is padded.

use serde::{Deserialize, Serialize};

use crate::error::{ClassifyError, ClassifyResult};
use crate::normalize::NormalizedText;

/// Highest supported n-gram order.
pub const MAX_ORDER: u8 = 3;

/// A single extracted n-gram.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Ngram {
    /// Window length in characters (1..=3).
    pub order: u8,
    /// The n-gram characters.
    pub text: String,
    /// Character offset of the window start in the normalized text.
    pub position: usize,
}

impl Ngram {
    pub fn new(order: u8, text: impl Into<String>, position: usize) -> Self {
        Self {
            order,
            text: text.into(),
            position,
        }
    }
}

/// Ordered, non-deduplicated sequence of n-grams from one text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NgramSample {
    ngrams: Vec<Ngram>,
}

impl NgramSample {
    pub fn new(ngrams: Vec<Ngram>) -> Self {
        Self { ngrams }
    }

    pub fn len(&self) -> usize {
        self.ngrams.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ngrams.is_empty()
    }

    pub fn as_slice(&self) -> &[Ngram] {
        &self.ngrams
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Ngram> {
        self.ngrams.iter()
    }

    /// Number of n-grams of the given order.
    pub fn count_of_order(&self, order: u8) -> usize {
        self.ngrams.iter().filter(|g| g.order == order).count()
    }
}

impl<'a> IntoIterator for &'a NgramSample {
    type Item = &'a Ngram;
    type IntoIter = std::slice::Iter<'a, Ngram>;

    fn into_iter(self) -> Self::IntoIter {
        self.ngrams.iter()
    }
}

/// Extractor settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractorConfig {
    /// N-gram orders to emit, each in `1..=MAX_ORDER`.
    pub orders: Vec<u8>,
    /// Minimum significant characters required before extraction proceeds.
    pub min_significant_chars: usize,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            orders: vec![1, 2, 3],
            min_significant_chars: 1,
        }
    }
}

/// Turns [`NormalizedText`] into an [`NgramSample`].
#[derive(Debug, Clone)]
pub struct NgramExtractor {
    orders: Vec<u8>,
    min_significant_chars: usize,
}

impl Default for NgramExtractor {
    fn default() -> Self {
        Self::new(&ExtractorConfig::default())
    }
}

impl NgramExtractor {
    pub fn new(config: &ExtractorConfig) -> Self {
        let mut orders: Vec<u8> = config
            .orders
            .iter()
            .copied()
            .filter(|&k| (1..=MAX_ORDER).contains(&k))
            .collect();
        orders.sort_unstable();
        orders.dedup();
        Self {
            orders,
            min_significant_chars: config.min_significant_chars.max(1),
        }
    }

    /// The orders this extractor emits, ascending.
    pub fn orders(&self) -> &[u8] {
        &self.orders
    }

    /// Extract n-grams from `text`.
    ///
    /// Fails with [`ClassifyError::InsufficientSignal`] if the text is below
    /// the minimum length or no window of any configured order fits.
    pub fn extract(&self, text: &NormalizedText) -> ClassifyResult<NgramSample> {
        let insufficient = || ClassifyError::InsufficientSignal {
            significant_chars: text.significant_chars(),
            min_required: self.min_significant_chars,
        };

        if text.significant_chars() < self.min_significant_chars {
            return Err(insufficient());
        }

        let chars: Vec<char> = text.as_str().chars().collect();
        let mut ngrams = Vec::with_capacity(chars.len() * self.orders.len());

        for position in 0..chars.len() {
            for &order in &self.orders {
                let k = order as usize;
                let Some(window) = chars.get(position..position + k) else {
                    continue;
                };
                if is_valid_window(window) {
                    ngrams.push(Ngram::new(order, window.iter().collect::<String>(), position));
                }
            }
        }

        if ngrams.is_empty() {
            return Err(insufficient());
        }

        tracing::trace!(
            ngrams = ngrams.len(),
            chars = chars.len(),
            "extracted n-gram sample"
        );
        Ok(NgramSample::new(ngrams))
    }
}

/// A window is usable when it holds at least one letter and spaces appear
/// only at its edges.
fn is_valid_window(window: &[char]) -> bool {
    if window.iter().all(|&c| c == ' ') {
        return false;
    }
    match window.len() {
        0..=2 => true,
        n => !window[1..n - 1].contains(&' '),
    }
}
