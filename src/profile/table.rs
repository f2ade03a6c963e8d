//! N-gram lookup tables.
//!
//! The classifier only ever asks "what is the log-probability of this
//! n-gram?", so the backing representation sits behind [`NgramLookup`].
//! Two backends ship: a hash map (fast point lookups) and a sorted slice
//! (compact, cache-friendly, ordered iteration).

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Read-only n-gram → log-probability table.
pub trait NgramLookup: Send + Sync + fmt::Debug {
    /// Log-probability of `ngram`, or `None` if the table has no entry.
    fn lookup(&self, ngram: &str) -> Option<f64>;

    /// Number of entries.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All entries, in backend-specific order.
    fn entries(&self) -> Box<dyn Iterator<Item = (&str, f64)> + '_>;
}

/// Which [`NgramLookup`] implementation to build at load time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TableBackend {
    #[default]
    Hash,
    Sorted,
}

impl TableBackend {
    /// Build a table of this kind from `(ngram, log_prob)` pairs.
    pub fn build(self, entries: impl IntoIterator<Item = (String, f64)>) -> Box<dyn NgramLookup> {
        match self {
            TableBackend::Hash => Box::new(HashTable::from_entries(entries)),
            TableBackend::Sorted => Box::new(SortedTable::from_entries(entries)),
        }
    }
}

impl fmt::Display for TableBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TableBackend::Hash => write!(f, "hash"),
            TableBackend::Sorted => write!(f, "sorted"),
        }
    }
}

/// Hash-map backed table.
#[derive(Debug, Clone, Default)]
pub struct HashTable {
    map: HashMap<Box<str>, f64>,
}

impl HashTable {
    pub fn from_entries(entries: impl IntoIterator<Item = (String, f64)>) -> Self {
        Self {
            map: entries
                .into_iter()
                .map(|(k, v)| (k.into_boxed_str(), v))
                .collect(),
        }
    }
}

impl NgramLookup for HashTable {
    fn lookup(&self, ngram: &str) -> Option<f64> {
        self.map.get(ngram).copied()
    }

    fn len(&self) -> usize {
        self.map.len()
    }

    fn entries(&self) -> Box<dyn Iterator<Item = (&str, f64)> + '_> {
        Box::new(self.map.iter().map(|(k, &v)| (&**k, v)))
    }
}

/// Sorted-slice table with binary search lookups.
#[derive(Debug, Clone, Default)]
pub struct SortedTable {
    entries: Box<[(Box<str>, f64)]>,
}

impl SortedTable {
    /// Build from pairs. Later duplicates of the same key are dropped.
    pub fn from_entries(entries: impl IntoIterator<Item = (String, f64)>) -> Self {
        let mut entries: Vec<(Box<str>, f64)> = entries
            .into_iter()
            .map(|(k, v)| (k.into_boxed_str(), v))
            .collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        entries.dedup_by(|later, earlier| later.0 == earlier.0);
        Self {
            entries: entries.into_boxed_slice(),
        }
    }
}

impl NgramLookup for SortedTable {
    fn lookup(&self, ngram: &str) -> Option<f64> {
        self.entries
            .binary_search_by(|(k, _)| (**k).cmp(ngram))
            .ok()
            .map(|i| self.entries[i].1)
    }

    fn len(&self) -> usize {
        self.entries.len()
    }

    fn entries(&self) -> Box<dyn Iterator<Item = (&str, f64)> + '_> {
        Box::new(self.entries.iter().map(|(k, v)| (&**k, *v)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs() -> Vec<(String, f64)> {
        vec![
            ("th".to_string(), -2.0),
            ("a".to_string(), -1.5),
            ("the".to_string(), -3.0),
            ("é".to_string(), -4.0),
        ]
    }

    #[test]
    fn backends_agree() {
        let hash = TableBackend::Hash.build(pairs());
        let sorted = TableBackend::Sorted.build(pairs());
        for key in ["th", "a", "the", "é", "zz", ""] {
            assert_eq!(hash.lookup(key), sorted.lookup(key), "key {key:?}");
        }
        assert_eq!(hash.len(), 4);
        assert_eq!(sorted.len(), 4);
    }

    #[test]
    fn sorted_entries_are_ordered() {
        let table = SortedTable::from_entries(pairs());
        let keys: Vec<&str> = table.entries().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["a", "th", "the", "é"]);
    }

    #[test]
    fn sorted_table_drops_duplicate_keys() {
        let table = SortedTable::from_entries(vec![
            ("a".to_string(), -1.0),
            ("a".to_string(), -2.0),
        ]);
        assert_eq!(table.len(), 1);
        assert_eq!(table.lookup("a"), Some(-1.0));
    }

    #[test]
    fn missing_key_is_none() {
        let table = HashTable::from_entries(pairs());
        assert_eq!(table.lookup("xyz"), None);
        assert!(!table.is_empty());
    }
}
