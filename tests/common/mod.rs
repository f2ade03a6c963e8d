#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;

use langprobe::config::EngineConfig;
use langprobe::identify::Identifier;
use langprobe::ngram::NgramExtractor;
use langprobe::normalize::Normalizer;
use langprobe::profile::{FrequencyProfile, LoadOptions, ProfileRecord, ProfileStore};

pub const ENGLISH: &str = "The quick brown fox jumps over the lazy dog. \
    Pack my box with five dozen liquor jugs. How vexingly quick daft zebras jump! \
    Sphinx of black quartz, judge my vow. The five boxing wizards jump quickly. \
    Jackdaws love my big sphinx of quartz. A wizard's job is to vex chumps quickly in fog.";

pub const FRENCH: &str = "Le renard brun rapide saute par-dessus le chien paresseux. \
    Portez ce vieux whisky au juge blond qui fume. \
    Voix ambiguë d'un cœur qui au zéphyr préfère les jattes de kiwis. \
    Le cœur déçu mais l'âme plutôt naïve, Louÿs rêva de crapaüter en canoë au delà des îles.";

pub const SPANISH: &str = "El veloz murciélago hindú comía feliz cardillo y kiwi. \
    La cigüeña tocaba el saxofón detrás del palenque de paja. \
    El rápido zorro marrón salta sobre el perro perezoso. \
    Quiere la boca exhausta vid, kiwi, piña y fugaz jamón. \
    Jovencillo emponzoñado de whisky, qué figurota exhibes.";

/// Count the n-grams of `corpus` the way the pipeline extracts them.
pub fn frequency_profile(language: &str, corpus: &str) -> FrequencyProfile {
    let normalized = Normalizer::default().normalize(corpus);
    let sample = NgramExtractor::default()
        .extract(&normalized)
        .expect("corpus has signal");

    let mut freq: HashMap<String, u64> = HashMap::new();
    let mut n_words = vec![0u64; 3];
    for ngram in &sample {
        *freq.entry(ngram.text.clone()).or_default() += 1;
        n_words[ngram.order as usize - 1] += 1;
    }
    FrequencyProfile {
        name: language.to_string(),
        freq,
        n_words,
    }
}

/// en / fr / es records trained on one paragraph of pangrams each.
pub fn pangram_records() -> Vec<ProfileRecord> {
    [("en", ENGLISH), ("fr", FRENCH), ("es", SPANISH)]
        .into_iter()
        .map(|(code, corpus)| {
            frequency_profile(code, corpus)
                .into_record(0.5, "corpus")
                .expect("valid frequency profile")
        })
        .collect()
}

pub fn pangram_store() -> ProfileStore {
    ProfileStore::from_records(pangram_records(), &LoadOptions::default()).unwrap()
}

pub fn pangram_identifier() -> Identifier {
    Identifier::new(Arc::new(pangram_store()), EngineConfig::default()).unwrap()
}

pub fn record(language: &str, ngrams: &[(&str, f64)], unseen_log_prob: f64) -> ProfileRecord {
    ProfileRecord {
        language: language.to_string(),
        ngrams: ngrams.iter().map(|(k, v)| (k.to_string(), *v)).collect(),
        unseen_log_prob,
        prior_log: None,
    }
}

/// Three languages where `fr` and `es` score "la" identically.
pub fn shared_article_store() -> ProfileStore {
    let shared = [("l", -2.5), ("a", -2.0), ("la", -3.0)];
    let mut fr = shared.to_vec();
    fr.extend([("e", -2.0), ("le", -3.0)]);
    let mut es = shared.to_vec();
    es.extend([("o", -2.0), ("el", -3.0)]);

    ProfileStore::from_records(
        vec![
            record("en", &[("t", -2.0), ("h", -2.5), ("th", -3.0)], -9.0),
            record("es", &es, -9.0),
            record("fr", &fr, -9.0),
        ],
        &LoadOptions::default(),
    )
    .unwrap()
}
