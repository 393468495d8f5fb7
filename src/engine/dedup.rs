//! Deduplication keys for the search driver.
//!
//! Restarting the engine from every offset re-derives some matches: a match
//! found from offset 3 is found again verbatim when the automaton tolerates
//! the restart. Without a stable key the driver would report it twice and
//! downstream consumers would have to compare whole matches.
//!
//! ## What counts as "the same match"
//!
//! The key combines the token-index span with, per word, the terminal
//! symbol, the lemma, and the committed feature vector. This is deliberately
//! conservative: two matches over the same span that committed to different
//! readings (say, a form read as feminine in one and masculine in the other)
//! are distinct results and both survive.

use crate::features::FeatureVector;
use crate::Match;

/// Lightweight key identifying one exact match.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) struct MatchKey {
    pub(crate) start: usize,
    pub(crate) end: usize,
    pub(crate) words: Vec<WordKey>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) struct WordKey {
    symbol: String,
    lemma: String,
    features: FeatureVector,
}

impl MatchKey {
    pub(crate) fn from_match(m: &Match) -> Self {
        MatchKey {
            start: m.start,
            end: m.end,
            words: m
                .words
                .iter()
                .map(|w| WordKey {
                    symbol: w.symbol.clone(),
                    lemma: w.lemma.clone(),
                    features: w.features.clone(),
                })
                .collect(),
        }
    }
}
