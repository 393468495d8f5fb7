//! Match search driver.
//!
//! The engine itself answers "what matches start at offset `i`". The driver
//! turns that into document search: it restarts the engine at offsets 0, 1,
//! 2, ... and streams results lazily, one fully-run offset at a time, so a
//! consumer that stops after the first match never pays for the rest of the
//! stream.
//!
//! Overlapping matches from different offsets are all reported; the driver
//! never skips ahead past a match. Exact duplicates (same span, same
//! committed readings) are suppressed via [`MatchKey`]. An offset whose step
//! budget runs out yields [`SearchIncomplete`] in-stream and the driver
//! moves on to the next offset.

use super::dedup::MatchKey;
use super::metrics::OffsetMetrics;
use super::parser::Engine;
use crate::{Match, Options, SearchIncomplete, Token};
use std::collections::{HashSet, VecDeque};

/// Lazy iterator over matches anywhere in a token stream.
///
/// Created by [`GlrParser::search`](crate::GlrParser::search). Yields
/// `Ok(Match)` in discovery order (offset-major) and `Err(SearchIncomplete)`
/// for offsets that exhausted their step budget.
pub struct Search<'a> {
    engine: &'a Engine,
    tokens: &'a [Token],
    options: Options,
    next_start: usize,
    pending: VecDeque<Result<Match, SearchIncomplete>>,
    seen: HashSet<MatchKey>,
}

impl<'a> Search<'a> {
    pub(crate) fn new(engine: &'a Engine, tokens: &'a [Token], options: Options) -> Self {
        Search {
            engine,
            tokens,
            options,
            next_start: 0,
            pending: VecDeque::new(),
            seen: HashSet::new(),
        }
    }

    /// Run the engine from one offset, queueing its (deduplicated) output.
    /// Returns how many matches were suppressed as duplicates.
    fn run_next_offset(&mut self, metrics: &mut OffsetMetrics) -> usize {
        let start = self.next_start;
        self.next_start += 1;

        let mut deduped = 0;
        match self.engine.run_at(self.tokens, start, &self.options, metrics) {
            Ok(matches) => {
                for m in matches {
                    if self.seen.insert(MatchKey::from_match(&m)) {
                        self.pending.push_back(Ok(m));
                    } else {
                        deduped += 1;
                    }
                }
            }
            Err(incomplete) => self.pending.push_back(Err(incomplete)),
        }
        deduped
    }

    pub(crate) fn has_more_offsets(&self) -> bool {
        self.next_start < self.tokens.len()
    }

    pub(crate) fn step_offset(&mut self, metrics: &mut OffsetMetrics) -> usize {
        self.run_next_offset(metrics)
    }

    pub(crate) fn take_pending(&mut self) -> VecDeque<Result<Match, SearchIncomplete>> {
        std::mem::take(&mut self.pending)
    }
}

impl Iterator for Search<'_> {
    type Item = Result<Match, SearchIncomplete>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(item) = self.pending.pop_front() {
                return Some(item);
            }
            if self.next_start >= self.tokens.len() {
                return None;
            }
            let mut metrics = OffsetMetrics::default();
            self.run_next_offset(&mut metrics);
        }
    }
}
