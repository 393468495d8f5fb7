//! Candidate reader: from surface words to readings.
//!
//! Each token entering the engine carries a set of candidate
//! [`Reading`]s — `(terminal category, feature vector)` pairs. They come from
//! three sources, unioned:
//!
//! 1. the **morphological analyzer** (open classes): a collaborator behind
//!    the [`MorphAnalyzer`] trait, free to return several readings for an
//!    ambiguous form, or none at all for unknown words;
//! 2. the **closed dictionary**: an explicit category → word-form mapping.
//!    A hit yields a wildcard-feature reading for the category, *in addition
//!    to* whatever the analyzer said. Lookup is by lowercased surface and by
//!    the lemma of every analyzer reading, so inflected forms still hit
//!    lemma-keyed dictionaries;
//! 3. **literal terminals** declared in the grammar (`'of'`): an exact
//!    lowercased surface match yields a wildcard reading for the quoted
//!    symbol.
//!
//! A token with no readings is not an error; it is a stream position where
//! no match can start or continue.

use crate::features::FeatureVector;
use crate::tokenizer::SurfaceWord;
use crate::{Reading, Token};
use std::collections::{HashMap, HashSet};

/// Morphological analysis collaborator.
///
/// Implementations must be pure: same surface in, same readings out. The
/// engine calls this once per token before parsing begins.
pub trait MorphAnalyzer: Send + Sync {
    /// Candidate readings for one surface word; empty for unknown words.
    fn analyze(&self, surface: &str) -> Vec<Reading>;
}

/// Table-backed analyzer, keyed by lowercased surface form.
///
/// This is the fixture implementation used in tests and by the demo binary;
/// production callers wrap a real morphology library behind the same trait.
#[derive(Debug, Default, Clone)]
pub struct StaticAnalyzer {
    table: HashMap<String, Vec<Reading>>,
}

impl StaticAnalyzer {
    pub fn new() -> Self {
        StaticAnalyzer::default()
    }

    /// Register one candidate reading for `surface`.
    pub fn add(&mut self, surface: &str, reading: Reading) -> &mut Self {
        self.table.entry(surface.to_lowercase()).or_default().push(reading);
        self
    }
}

impl MorphAnalyzer for StaticAnalyzer {
    fn analyze(&self, surface: &str) -> Vec<Reading> {
        self.table.get(&surface.to_lowercase()).cloned().unwrap_or_default()
    }
}

/// Closed dictionary: category name → explicit set of word forms.
#[derive(Debug, Default, Clone)]
pub struct Dictionary {
    categories: Vec<(String, Vec<String>)>,
}

impl Dictionary {
    pub fn new() -> Self {
        Dictionary::default()
    }

    /// Add word forms under `category`. A word may belong to several
    /// categories; every matching category contributes a reading.
    pub fn add<I, S>(&mut self, category: &str, words: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.categories
            .push((category.to_string(), words.into_iter().map(Into::into).collect()));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }
}

/// Combines dictionary, analyzer and grammar literals into per-token readings.
pub(crate) struct CandidateReader {
    /// Lemma/surface form → dictionary categories.
    by_word: HashMap<String, Vec<String>>,
    /// Lowercased literal surfaces declared in the grammar.
    literals: HashSet<String>,
    analyzer: Box<dyn MorphAnalyzer>,
}

impl CandidateReader {
    /// Build a reader; dictionary entries are normalized to lemmas through
    /// the analyzer so inflected dictionary words still match.
    pub(crate) fn new(
        dictionary: &Dictionary,
        literals: HashSet<String>,
        analyzer: Box<dyn MorphAnalyzer>,
    ) -> Self {
        let mut by_word: HashMap<String, Vec<String>> = HashMap::new();
        for (category, words) in &dictionary.categories {
            for word in words {
                let lower = word.to_lowercase();
                let key = analyzer
                    .analyze(&lower)
                    .first()
                    .map(|r| r.lemma.clone())
                    .unwrap_or(lower);
                let categories = by_word.entry(key).or_default();
                if !categories.contains(category) {
                    categories.push(category.clone());
                }
            }
        }
        CandidateReader { by_word, literals, analyzer }
    }

    /// All candidate readings for one surface word.
    pub(crate) fn readings_for(&self, surface: &str) -> Vec<Reading> {
        let lower = surface.to_lowercase();
        let mut readings = self.analyzer.analyze(surface);

        // Dictionary hits: by surface and by every analyzer lemma.
        let mut categories: Vec<&String> = Vec::new();
        if let Some(found) = self.by_word.get(&lower) {
            categories.extend(found);
        }
        for reading in readings.clone() {
            if let Some(found) = self.by_word.get(&reading.lemma) {
                categories.extend(found);
            }
        }
        for category in categories {
            readings.push(Reading {
                symbol: category.clone(),
                lemma: lower.clone(),
                features: FeatureVector::wildcard(),
            });
        }

        if self.literals.contains(&lower) {
            readings.push(Reading {
                symbol: format!("'{lower}'"),
                lemma: lower.clone(),
                features: FeatureVector::wildcard(),
            });
        }

        let mut seen = HashSet::new();
        readings.retain(|r| seen.insert(r.clone()));
        readings
    }

    /// Attach readings to split surface words, producing engine tokens.
    pub(crate) fn annotate(&self, words: Vec<SurfaceWord>) -> Vec<Token> {
        words
            .into_iter()
            .map(|w| {
                let readings = self.readings_for(&w.surface);
                Token { surface: w.surface, range: Some(w.range), readings }
            })
            .collect()
    }
}
