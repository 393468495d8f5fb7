//! Grammar compilation: LR(0) item automaton with a candidate-action table.
//!
//! This is a conventional LR(0) construction with one deliberate deviation:
//! shift/reduce and reduce/reduce conflicts are *kept*. A state's entry for a
//! lookahead symbol is a `Vec<Action>`, and the runtime (`parser.rs`) forks
//! the graph-structured stack on every applicable action. Ambiguity is a
//! property of the grammar, not an error.
//!
//! Construction steps:
//!
//! ```text
//! Grammar ──▶ state graph        (items, closure, transition sets)
//!         ──▶ FOLLOW sets        (starters / followers per nonterminal)
//!         ──▶ action-goto table  (one symbol -> Vec<Action> row per state)
//! ```
//!
//! Reduce actions are registered under every follower of the rule's
//! left-hand side *and* under `$`, so a completed pattern can close both
//! mid-stream and at end-of-stream. The augmented rule's completed item
//! becomes `Accept` under `$`.
//!
//! Agreement groups are not consulted here: they depend on run-time reading
//! bindings and are checked during reduction (`gss.rs`).

use crate::grammar::{AUGMENTED, END, Grammar};
use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};

/// One dotted rule position `#rule.dot`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub(crate) struct Item {
    pub rule: usize,
    pub dot: usize,
}

/// A candidate action for one (state, lookahead) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Action {
    Shift(usize),
    Goto(usize),
    Reduce(usize),
    Accept,
}

/// Intermediate automaton state.
#[derive(Debug)]
struct State {
    itemset: Vec<Item>,
    /// lookahead symbol -> successor state indices.
    follow: Vec<(String, BTreeSet<usize>)>,
}

impl State {
    fn follow_entry(&mut self, lookahead: &str) -> &mut BTreeSet<usize> {
        if let Some(pos) = self.follow.iter().position(|(s, _)| s == lookahead) {
            return &mut self.follow[pos].1;
        }
        self.follow.push((lookahead.to_string(), BTreeSet::new()));
        &mut self.follow.last_mut().unwrap().1
    }
}

/// Compiled action-goto table: one `symbol -> Vec<Action>` row per state.
#[derive(Debug)]
pub(crate) struct Tables {
    rows: Vec<HashMap<String, Vec<Action>>>,
}

impl Tables {
    pub(crate) fn compile(grammar: &Grammar) -> Tables {
        let states = state_graph(grammar);
        let followers = Followers::compute(grammar);

        let mut rows = Vec::with_capacity(states.len());
        for state in &states {
            let mut row: HashMap<String, Vec<Action>> = HashMap::new();

            // Reduces and accept.
            for item in &state.itemset {
                let rule = &grammar.rules[item.rule];
                if item.dot != rule.rhs.len() {
                    continue;
                }
                if rule.lhs == AUGMENTED {
                    row.entry(END.to_string()).or_default().push(Action::Accept);
                } else {
                    for follower in followers.of(&rule.lhs) {
                        row.entry(follower.clone()).or_default().push(Action::Reduce(item.rule));
                    }
                    row.entry(END.to_string()).or_default().push(Action::Reduce(item.rule));
                }
            }

            // Shifts and gotos.
            for (lookahead, targets) in &state.follow {
                for &target in targets {
                    let action = if grammar.is_nonterminal(lookahead) {
                        Action::Goto(target)
                    } else {
                        Action::Shift(target)
                    };
                    row.entry(lookahead.clone()).or_default().push(action);
                }
            }

            rows.push(row);
        }

        Tables { rows }
    }

    pub(crate) fn actions(&self, state: usize, symbol: &str) -> &[Action] {
        self.rows[state].get(symbol).map(Vec::as_slice).unwrap_or(&[])
    }

    #[cfg(test)]
    pub(crate) fn state_count(&self) -> usize {
        self.rows.len()
    }
}

/// Breadth-first construction of the item-set graph.
fn state_graph(grammar: &Grammar) -> Vec<State> {
    let mut states: Vec<State> = Vec::new();
    let mut by_itemset: HashMap<Vec<Item>, usize> = HashMap::new();

    let first = unique_sorted(closure(&[Item { rule: 0, dot: 0 }], grammar));
    let mut queue: VecDeque<(Option<(usize, String)>, Vec<Item>)> = VecDeque::new();
    queue.push_back((None, first));

    while let Some((origin, itemset)) = queue.pop_front() {
        if let Some(&existing) = by_itemset.get(&itemset) {
            // Known state, just record the transition into it.
            if let Some((parent, lookahead)) = origin {
                states[parent].follow_entry(&lookahead).insert(existing);
            }
            continue;
        }

        let index = states.len();
        by_itemset.insert(itemset.clone(), index);
        states.push(State { itemset, follow: Vec::new() });
        if let Some((parent, lookahead)) = origin {
            states[parent].follow_entry(&lookahead).insert(index);
        }

        for (lookahead, successor) in transitions(&states[index].itemset, grammar) {
            queue.push_back((Some((index, lookahead)), unique_sorted(successor)));
        }
    }

    states
}

/// Epsilon-closure of an item set.
fn closure(itemset: &[Item], grammar: &Grammar) -> Vec<Item> {
    let mut result: Vec<Item> = Vec::new();
    let mut to_process: Vec<Item> = itemset.to_vec();
    let mut visited: HashSet<&str> = HashSet::new();

    while !to_process.is_empty() {
        result.extend(to_process.iter().copied());

        let mut nested: Vec<Item> = Vec::new();
        for (_, lookahead) in iterate_lookaheads(&to_process, grammar) {
            if grammar.is_nonterminal(lookahead) && visited.insert(lookahead) {
                for &rule in grammar.rules_for_symbol(lookahead) {
                    nested.push(Item { rule, dot: 0 });
                }
            }
        }
        to_process = nested;
    }

    result
}

/// `(item, symbol after the dot)` pairs; completed items are skipped.
fn iterate_lookaheads<'g>(itemset: &[Item], grammar: &'g Grammar) -> Vec<(Item, &'g str)> {
    itemset
        .iter()
        .filter_map(|item| {
            grammar.rules[item.rule].rhs.get(item.dot).map(|symbol| (*item, symbol.as_str()))
        })
        .collect()
}

/// All transitions from an item set, keyed by lookahead, in discovery order.
fn transitions(itemset: &[Item], grammar: &Grammar) -> Vec<(String, Vec<Item>)> {
    let mut result: Vec<(String, Vec<Item>)> = Vec::new();
    for (item, lookahead) in iterate_lookaheads(itemset, grammar) {
        let advanced = closure(&[Item { rule: item.rule, dot: item.dot + 1 }], grammar);
        match result.iter_mut().find(|(s, _)| s == lookahead) {
            Some((_, items)) => items.extend(advanced),
            None => result.push((lookahead.to_string(), advanced)),
        }
    }
    result
}

fn unique_sorted(items: Vec<Item>) -> Vec<Item> {
    let set: BTreeSet<Item> = items.into_iter().collect();
    set.into_iter().collect()
}

/// FOLLOW sets per nonterminal, via the starters/followers recursion.
struct Followers {
    followers: HashMap<String, BTreeSet<String>>,
}

impl Followers {
    fn compute(grammar: &Grammar) -> Followers {
        let mut starters: HashMap<String, BTreeSet<String>> = HashMap::new();
        for symbol in grammar.nonterminals() {
            let mut seen = HashSet::new();
            starters.insert(symbol.to_string(), Self::starters_of(symbol, grammar, &mut seen));
        }

        let mut followers: HashMap<String, BTreeSet<String>> = HashMap::new();
        for symbol in grammar.nonterminals() {
            let mut seen = HashSet::new();
            followers
                .insert(symbol.to_string(), Self::followers_of(symbol, grammar, &starters, &mut seen));
        }

        Followers { followers }
    }

    fn of(&self, symbol: &str) -> impl Iterator<Item = &String> {
        self.followers.get(symbol).into_iter().flatten()
    }

    /// Terminals that can start a derivation of `symbol`.
    fn starters_of(symbol: &str, grammar: &Grammar, seen: &mut HashSet<String>) -> BTreeSet<String> {
        let mut result = BTreeSet::new();
        if !seen.insert(symbol.to_string()) {
            return result;
        }
        for &rule in grammar.rules_for_symbol(symbol) {
            let first = &grammar.rules[rule].rhs[0];
            if grammar.is_nonterminal(first) {
                if first != symbol {
                    result.extend(Self::starters_of(first, grammar, seen));
                }
            } else {
                result.insert(first.clone());
            }
        }
        result
    }

    /// Terminals that can follow `symbol` in some sentential form.
    fn followers_of(
        symbol: &str,
        grammar: &Grammar,
        starters: &HashMap<String, BTreeSet<String>>,
        seen: &mut HashSet<String>,
    ) -> BTreeSet<String> {
        let mut result = BTreeSet::new();
        if !seen.insert(symbol.to_string()) {
            return result;
        }
        for rule in &grammar.rules {
            for (index, rhs_symbol) in rule.rhs.iter().enumerate() {
                if rhs_symbol != symbol {
                    continue;
                }
                match rule.rhs.get(index + 1) {
                    None => {
                        if rule.lhs != symbol {
                            result.extend(Self::followers_of(&rule.lhs, grammar, starters, seen));
                        }
                    }
                    Some(next) => {
                        if grammar.is_nonterminal(next) {
                            result.extend(starters.get(next).into_iter().flatten().cloned());
                        } else {
                            result.insert(next.clone());
                        }
                    }
                }
            }
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::GrammarRule;

    fn grammar(rules: &[(&str, &[&str])], start: &str) -> Grammar {
        let rules = rules
            .iter()
            .map(|(lhs, rhs)| GrammarRule::new(*lhs, rhs.iter().map(|s| s.to_string()).collect()))
            .collect();
        Grammar::new(rules, start).unwrap()
    }

    #[test]
    fn single_terminal_grammar_has_shift_then_accept() {
        let g = grammar(&[("S", &["noun"])], "S");
        let tables = Tables::compile(&g);

        let shifts = tables.actions(0, "noun");
        assert_eq!(shifts.len(), 1);
        let Action::Shift(after_noun) = shifts[0] else { panic!("expected shift") };

        // After the noun: reduce S = noun under `$`.
        assert!(tables.actions(after_noun, END).iter().any(|a| matches!(a, Action::Reduce(1))));

        // After the goto on S: accept under `$`.
        let gotos = tables.actions(0, "S");
        let Action::Goto(after_s) = gotos[0] else { panic!("expected goto") };
        assert!(tables.actions(after_s, END).contains(&Action::Accept));
    }

    #[test]
    fn reduce_reduce_conflict_is_retained() {
        let g = grammar(&[("S", &["A"]), ("S", &["B"]), ("A", &["x"]), ("B", &["x"])], "S");
        let tables = Tables::compile(&g);

        let Action::Shift(after_x) = tables.actions(0, "x")[0] else { panic!("expected shift") };
        let reduces: Vec<_> = tables
            .actions(after_x, END)
            .iter()
            .filter(|a| matches!(a, Action::Reduce(_)))
            .collect();
        assert_eq!(reduces.len(), 2, "both reductions of x must be kept");
    }

    #[test]
    fn left_recursion_produces_mid_stream_reduce() {
        // S = S x | x : after one x the parser may reduce and keep shifting.
        let g = grammar(&[("S", &["S", "x"]), ("S", &["x"])], "S");
        let tables = Tables::compile(&g);

        let Action::Shift(after_x) = tables.actions(0, "x")[0] else { panic!("expected shift") };
        // Reduce must be registered under the follower `x`, not only `$`.
        assert!(tables.actions(after_x, "x").iter().any(|a| matches!(a, Action::Reduce(2))));
        assert!(tables.actions(after_x, END).iter().any(|a| matches!(a, Action::Reduce(2))));
    }

    #[test]
    fn state_graph_is_shared_between_alternatives() {
        let g = grammar(&[("S", &["a", "b"]), ("S", &["a", "c"])], "S");
        let tables = Tables::compile(&g);
        // `a` shifts into one shared state: 0, after-a, after-ab, after-ac,
        // after-S = 5 states total, not a tree of duplicates.
        assert_eq!(tables.state_count(), 5);
    }
}
