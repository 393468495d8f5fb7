//! GLR execution engine.
//!
//! This module is the operational core: one [`Engine::run_at`] call plays
//! the compiled automaton over the token stream from a single start offset,
//! keeping every viable interpretation alive on the graph-structured stack.
//!
//! ## Pass structure per token position
//!
//! ```text
//! (R) reduce closure    -> once per distinct reading symbol, then for "$"
//! (A) accept harvest    -> heads in an accepting state emit a Match
//! (S) shift             -> fork one head per (reading, shift action)
//!     merge             -> forks agreeing on (state, derivation) collapse
//! ```
//!
//! Reductions run to a fixpoint before anything shifts: a reduce can expose
//! another reduce, and merging can graft a new history onto a head whose
//! reductions then have to be replayed. The end-of-stream symbol joins every
//! position's lookaheads so that matches ending mid-stream complete without
//! consuming the rest of the input.
//!
//! Every node-action application counts against [`Options::max_steps`];
//! pathological grammars (cyclic unary rules, dense ambiguity) abort the
//! offset with [`SearchIncomplete`] instead of spinning.
//!
//! ## Debugging
//!
//! Setting `SYNTAGMA_DEBUG=1` prints shift/reduce/accept decisions per
//! position.

use super::gss::{Deriv, GssNode, Leaf, merge, merge_into};
use super::metrics::OffsetMetrics;
use super::tables::{Action, Tables};
use crate::grammar::{END, Grammar};
use crate::{Match, MatchedWord, Options, SearchIncomplete, Token};
use std::rc::Rc;
use std::time::Instant;

/// Compiled grammar plus its action tables, immutable after construction.
#[derive(Debug)]
pub(crate) struct Engine {
    grammar: Grammar,
    tables: Tables,
}

impl Engine {
    pub(crate) fn new(grammar: Grammar) -> Self {
        let tables = Tables::compile(&grammar);
        Engine { grammar, tables }
    }

    pub(crate) fn grammar(&self) -> &Grammar {
        &self.grammar
    }

    /// Run the automaton over `tokens` starting at token index `start`,
    /// collecting every match that begins there.
    pub(crate) fn run_at(
        &self,
        tokens: &[Token],
        start: usize,
        options: &Options,
        metrics: &mut OffsetMetrics,
    ) -> Result<Vec<Match>, SearchIncomplete> {
        let debug = std::env::var_os("SYNTAGMA_DEBUG").is_some();
        let run_start = Instant::now();
        metrics.start = start;

        let mut steps = 0usize;
        let mut matches: Vec<Match> = Vec::new();
        let mut current: Vec<Rc<GssNode>> = vec![GssNode::start()];

        for position in start..=tokens.len() {
            metrics.peak_heads = metrics.peak_heads.max(current.len());

            // (R) Reduce closure, once per lookahead the next token can
            // offer, then under the end marker.
            let mut lookaheads: Vec<&str> = Vec::new();
            if let Some(token) = tokens.get(position) {
                for reading in &token.readings {
                    if self.grammar.is_terminal(&reading.symbol)
                        && !lookaheads.contains(&reading.symbol.as_str())
                    {
                        lookaheads.push(&reading.symbol);
                    }
                }
            }
            lookaheads.push(END);

            for lookahead in lookaheads {
                let mut queue: Vec<Rc<GssNode>> = current.clone();
                while let Some(head) = queue.pop() {
                    for action in self.tables.actions(head.state, lookahead) {
                        let Action::Reduce(rule) = action else { continue };
                        steps += 1;
                        if steps > options.max_steps {
                            metrics.steps = steps;
                            metrics.duration = run_start.elapsed();
                            return Err(SearchIncomplete { start, steps });
                        }

                        let produced = head.reduce(&self.tables, &self.grammar, *rule);
                        if debug && !produced.is_empty() {
                            eprintln!(
                                "[reduce] pos={position} lookahead={lookahead} rule={rule} heads={}",
                                produced.len(),
                            );
                        }
                        let (added, grew) = merge_into(&mut current, produced);
                        queue.extend(added);
                        if grew {
                            // An existing head gained a history; replay its
                            // reductions under this lookahead.
                            queue = current.clone();
                        }
                    }
                }
            }

            // (A) Accept harvest. Heads live for exactly one position, so
            // each accepting derivation is seen once.
            for head in &current {
                if !self.tables.actions(head.state, END).contains(&Action::Accept) {
                    continue;
                }
                let Some(entry) = &head.entry else { continue };
                if debug {
                    eprintln!(
                        "[accept] pos={position} span={}..{} rule={:?}",
                        entry.start, entry.end, entry.rule,
                    );
                }
                matches.push(match_from(entry));
            }

            // (S) Shift every compatible reading of the next token.
            let Some(token) = tokens.get(position) else { break };
            let mut shifted: Vec<Rc<GssNode>> = Vec::new();
            for reading in &token.readings {
                let mut leaf: Option<Rc<Deriv>> = None;
                for head in &current {
                    for action in self.tables.actions(head.state, &reading.symbol) {
                        let Action::Shift(state) = action else { continue };
                        steps += 1;
                        if steps > options.max_steps {
                            metrics.steps = steps;
                            metrics.duration = run_start.elapsed();
                            return Err(SearchIncomplete { start, steps });
                        }

                        let leaf = leaf.get_or_insert_with(|| {
                            Rc::new(Deriv {
                                symbol: reading.symbol.clone(),
                                rule: None,
                                leaf: Some(Leaf {
                                    surface: token.surface.clone(),
                                    range: token.range,
                                    reading: reading.clone(),
                                }),
                                features: reading.features.clone(),
                                start: position,
                                end: position + 1,
                                children: Vec::new(),
                            })
                        });
                        shifted.push(head.shift(Rc::clone(leaf), *state));
                    }
                }
                if debug && leaf.is_some() {
                    eprintln!("[shift] pos={position} symbol={} surface={}", reading.symbol, token.surface);
                }
            }

            current = merge(shifted);
            if current.is_empty() {
                // Every fork died; nothing starting at `start` reaches
                // further into the stream.
                break;
            }
        }

        metrics.steps = steps;
        metrics.produced = matches.len();
        metrics.duration = run_start.elapsed();
        Ok(matches)
    }
}

/// Resolve an accepted derivation into a reported match.
fn match_from(entry: &Rc<Deriv>) -> Match {
    let mut leaves = Vec::new();
    entry.collect_leaves(&mut leaves);
    Match {
        start: entry.start,
        end: entry.end,
        words: leaves
            .into_iter()
            .map(|leaf| MatchedWord {
                surface: leaf.surface.clone(),
                symbol: leaf.reading.symbol.clone(),
                lemma: leaf.reading.lemma.clone(),
                features: leaf.reading.features.clone(),
                range: leaf.range,
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::{Attr, FeatureVector};
    use crate::reader::read_grammar;
    use crate::{Reading, Token};

    fn token(surface: &str, readings: Vec<Reading>) -> Token {
        Token { surface: surface.to_string(), range: None, readings }
    }

    fn reading(symbol: &str, lemma: &str, features: FeatureVector) -> Reading {
        Reading { symbol: symbol.to_string(), lemma: lemma.to_string(), features }
    }

    fn run(engine: &Engine, tokens: &[Token], start: usize) -> Vec<Match> {
        let mut metrics = OffsetMetrics::default();
        engine.run_at(tokens, start, &Options::default(), &mut metrics).unwrap()
    }

    #[test]
    fn matches_agreeing_pair_and_skips_disagreeing() {
        let grammar = read_grammar("S = adj<agr-gnc=1> noun", "S").unwrap();
        let engine = Engine::new(grammar);

        let fem = FeatureVector::wildcard().set(Attr::Gender, "femn").set(Attr::Number, "sing");
        let masc = FeatureVector::wildcard().set(Attr::Gender, "masc").set(Attr::Number, "sing");

        let agreeing = vec![
            token("beautiful", vec![reading("adj", "beautiful", fem.clone())]),
            token("jacket", vec![reading("noun", "jacket", fem.clone())]),
        ];
        let matches = run(&engine, &agreeing, 0);
        assert_eq!(matches.len(), 1);
        assert_eq!((matches[0].start, matches[0].end), (0, 2));
        assert_eq!(matches[0].words[0].symbol, "adj");
        assert_eq!(matches[0].words[1].symbol, "noun");

        let disagreeing = vec![
            token("beautiful", vec![reading("adj", "beautiful", masc)]),
            token("jacket", vec![reading("noun", "jacket", fem)]),
        ];
        assert!(run(&engine, &disagreeing, 0).is_empty());
    }

    #[test]
    fn ambiguous_reading_forks_and_agreeing_fork_survives() {
        let grammar = read_grammar("S = adj<agr-gnc=1> noun", "S").unwrap();
        let engine = Engine::new(grammar);

        // The adjective form is ambiguous between feminine and masculine.
        let fem = FeatureVector::wildcard().set(Attr::Gender, "femn");
        let masc = FeatureVector::wildcard().set(Attr::Gender, "masc");
        let tokens = vec![
            token(
                "ambiguous",
                vec![
                    reading("adj", "ambiguous", masc),
                    reading("adj", "ambiguous", fem.clone()),
                ],
            ),
            token("jacket", vec![reading("noun", "jacket", fem)]),
        ];

        let matches = run(&engine, &tokens, 0);
        assert_eq!(matches.len(), 1, "only the feminine fork reduces");
        assert_eq!(matches[0].words[0].features.get(Attr::Gender), Some("femn"));
    }

    #[test]
    fn mid_stream_accept_does_not_need_stream_end() {
        let grammar = read_grammar("S = noun", "S").unwrap();
        let engine = Engine::new(grammar);

        let tokens = vec![
            token("jacket", vec![reading("noun", "jacket", FeatureVector::wildcard())]),
            token("whatever", Vec::new()),
        ];
        let matches = run(&engine, &tokens, 0);
        assert_eq!(matches.len(), 1);
        assert_eq!((matches[0].start, matches[0].end), (0, 1));
    }

    #[test]
    fn nested_nonterminal_carries_bindings_to_outer_group() {
        // NP's bindings must flow up so S can check them against the verb.
        let grammar = read_grammar(
            "
            NP = adj<agr-gnc=1> noun
            S = NP<agr-n=1> verb
            ",
            "S",
        )
        .unwrap();
        let engine = Engine::new(grammar);

        let sing = FeatureVector::wildcard().set(Attr::Gender, "femn").set(Attr::Number, "sing");
        let plural_verb = FeatureVector::wildcard().set(Attr::Number, "plur");
        let sing_verb = FeatureVector::wildcard().set(Attr::Number, "sing");

        let tokens = |verb: FeatureVector| {
            vec![
                token("beautiful", vec![reading("adj", "beautiful", sing.clone())]),
                token("jacket", vec![reading("noun", "jacket", sing.clone())]),
                token("fits", vec![reading("verb", "fit", verb)]),
            ]
        };

        assert_eq!(run(&engine, &tokens(sing_verb), 0).len(), 1);
        assert!(run(&engine, &tokens(plural_verb), 0).is_empty());
    }

    #[test]
    fn distinct_reading_assignments_yield_distinct_matches() {
        let grammar = read_grammar("S = word", "S").unwrap();
        let engine = Engine::new(grammar);

        let a = FeatureVector::wildcard().set(Attr::Case, "nomn");
        let b = FeatureVector::wildcard().set(Attr::Case, "accs");
        let tokens = vec![token("form", vec![reading("word", "form", a), reading("word", "form", b)])];

        let matches = run(&engine, &tokens, 0);
        assert_eq!(matches.len(), 2);
        assert_ne!(matches[0].words[0].features, matches[1].words[0].features);
    }

    #[test]
    fn step_budget_aborts_with_incomplete() {
        let grammar = read_grammar("S = noun noun noun", "S").unwrap();
        let engine = Engine::new(grammar);
        let noun = |s: &str| token(s, vec![reading("noun", s, FeatureVector::wildcard())]);
        let tokens = vec![noun("a"), noun("b"), noun("c")];

        let mut metrics = OffsetMetrics::default();
        let err = engine
            .run_at(&tokens, 0, &Options { max_steps: 2 }, &mut metrics)
            .unwrap_err();
        assert_eq!(err.start, 0);
        assert!(err.steps > 2);
    }

    #[test]
    fn token_without_grammar_readings_ends_the_run() {
        let grammar = read_grammar("S = noun noun", "S").unwrap();
        let engine = Engine::new(grammar);
        let tokens = vec![
            token("jacket", vec![reading("noun", "jacket", FeatureVector::wildcard())]),
            token("zzz", Vec::new()),
            token("coat", vec![reading("noun", "coat", FeatureVector::wildcard())]),
        ];
        assert!(run(&engine, &tokens, 0).is_empty());
    }
}
