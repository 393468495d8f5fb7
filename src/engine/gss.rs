//! Graph-structured stack and derivation nodes.
//!
//! A deterministic LR parser keeps one stack; a GLR parser keeps many, and
//! they share history. Each [`GssNode`] owns a state id, the derivation it
//! was pushed for, and a set of back-edges to predecessor nodes. Forks that
//! converge on the same (state, derivation) pair are merged by grafting
//! back-edges onto the first head, which bounds the live-fork count by
//! states x positions instead of the number of derivations.
//!
//! ```text
//!        ┌── adj.3 ──┐
//! 0 ─────┤           ├── NOUN.5     (two histories, one merged head)
//!        └── num.3 ──┘
//! ```
//!
//! Agreement checking happens here, at reduce time: popping a rule's
//! right-hand side exposes the feature vectors bound along one history, and
//! every agreement group of the rule must unify over its family before the
//! reduced head is pushed. A failed unification silently prunes that path;
//! the surviving head carries the merged bindings upward so nested
//! nonterminals can participate in outer groups.

use crate::engine::tables::{Action, Tables};
use crate::features::FeatureVector;
use crate::grammar::Grammar;
use crate::{Range, Reading};
use std::cell::RefCell;
use std::rc::Rc;

/// One derivation node: a shifted leaf or a reduced subtree.
///
/// `start`/`end` are token indices (end exclusive). Equality is structural;
/// the stack merge below relies on it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) struct Deriv {
    pub symbol: String,
    /// Producing rule for reduced nodes, `None` for leaves.
    pub rule: Option<usize>,
    /// The consumed word and chosen reading, for leaves.
    pub leaf: Option<Leaf>,
    /// Feature bindings established along this derivation.
    pub features: FeatureVector,
    pub start: usize,
    pub end: usize,
    pub children: Vec<Rc<Deriv>>,
}

/// Surface word plus the reading a fork committed to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) struct Leaf {
    pub surface: String,
    pub range: Option<Range>,
    pub reading: Reading,
}

impl Deriv {
    /// In-order leaves of this derivation.
    pub(crate) fn collect_leaves<'d>(self: &'d Rc<Self>, out: &mut Vec<&'d Leaf>) {
        if let Some(leaf) = &self.leaf {
            out.push(leaf);
        }
        for child in &self.children {
            child.collect_leaves(out);
        }
    }
}

/// One head (or interior node) of the graph-structured stack.
///
/// `prev` is grown in place when a later fork converges on this node, so
/// nodes already stacked on top keep seeing every history.
#[derive(Debug)]
pub(crate) struct GssNode {
    pub state: usize,
    /// Derivation pushed to reach this node; `None` only for the start node.
    pub entry: Option<Rc<Deriv>>,
    pub prev: RefCell<Vec<Rc<GssNode>>>,
}

impl GssNode {
    pub(crate) fn start() -> Rc<GssNode> {
        Rc::new(GssNode { state: 0, entry: None, prev: RefCell::new(Vec::new()) })
    }

    /// All histories of length `depth` ending at this node.
    ///
    /// Each path is ordered oldest-first: `path[0]` is the node the reduced
    /// head will hang off, the rest carry the popped derivations.
    pub(crate) fn pop(self: &Rc<Self>, depth: usize) -> Vec<Vec<Rc<GssNode>>> {
        if depth == 0 {
            return vec![vec![Rc::clone(self)]];
        }
        let mut result = Vec::new();
        for prev in self.prev.borrow().iter() {
            for mut path in prev.pop(depth - 1) {
                path.push(Rc::clone(self));
                result.push(path);
            }
        }
        result
    }

    /// Push a shifted leaf on top of this node.
    pub(crate) fn shift(self: &Rc<Self>, leaf: Rc<Deriv>, state: usize) -> Rc<GssNode> {
        Rc::new(GssNode { state, entry: Some(leaf), prev: RefCell::new(vec![Rc::clone(self)]) })
    }

    /// Reduce by `rule_index`, returning the new heads (one per surviving
    /// history x goto target). Histories whose bindings fail an agreement
    /// group are pruned here.
    pub(crate) fn reduce(
        self: &Rc<Self>,
        tables: &Tables,
        grammar: &Grammar,
        rule_index: usize,
    ) -> Vec<Rc<GssNode>> {
        let rule = &grammar.rules[rule_index];
        let mut result = Vec::new();

        'path: for path in self.pop(rule.rhs.len()) {
            let base = &path[0];
            let children: Vec<Rc<Deriv>> =
                path[1..].iter().filter_map(|node| node.entry.clone()).collect();
            if children.len() != rule.rhs.len() {
                // A path through the start node is shorter than the rule.
                continue;
            }

            // Agreement unification, one group at a time.
            let mut group_bindings: Vec<FeatureVector> = Vec::new();
            for group in &rule.groups {
                let mut unified = FeatureVector::wildcard();
                for &member in &group.members {
                    match unified.unify(&children[member].features, group.family) {
                        Some(next) => unified = next,
                        None => continue 'path,
                    }
                }
                group_bindings.push(unified);
            }
            let features = FeatureVector::merge_agreeing(&group_bindings);

            let deriv = Rc::new(Deriv {
                symbol: rule.lhs.clone(),
                rule: Some(rule_index),
                leaf: None,
                features,
                start: children.first().map(|c| c.start).unwrap_or(0),
                end: children.last().map(|c| c.end).unwrap_or(0),
                children,
            });

            for action in tables.actions(base.state, &rule.lhs) {
                if let Action::Goto(state) = action {
                    result.push(Rc::new(GssNode {
                        state: *state,
                        entry: Some(Rc::clone(&deriv)),
                        prev: RefCell::new(vec![Rc::clone(base)]),
                    }));
                }
            }
        }

        result
    }
}

/// Fold `incoming` into `heads`: a head agreeing with an existing one on
/// (state, derivation) donates its back-edges instead of joining the set.
///
/// Returns the heads that were genuinely new, and whether any existing head
/// gained an edge (its pending reduces must be replayed).
pub(crate) fn merge_into(
    heads: &mut Vec<Rc<GssNode>>,
    incoming: Vec<Rc<GssNode>>,
) -> (Vec<Rc<GssNode>>, bool) {
    let mut added = Vec::new();
    let mut grew = false;

    for head in incoming {
        match heads.iter().find(|h| h.state == head.state && h.entry == head.entry) {
            Some(existing) => {
                let mut prev = existing.prev.borrow_mut();
                for p in head.prev.borrow().iter() {
                    if !prev.iter().any(|q| Rc::ptr_eq(q, p)) {
                        prev.push(Rc::clone(p));
                        grew = true;
                    }
                }
            }
            None => {
                heads.push(Rc::clone(&head));
                added.push(head);
            }
        }
    }

    (added, grew)
}

/// Merge a fresh batch of heads among themselves.
pub(crate) fn merge(heads: Vec<Rc<GssNode>>) -> Vec<Rc<GssNode>> {
    let mut result = Vec::new();
    merge_into(&mut result, heads);
    result
}
