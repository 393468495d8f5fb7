//! Grammar model and structural validation.
//!
//! A `Grammar` is a set of productions plus a start symbol. Nothing here is
//! deterministic-parser shaped: alternatives, left recursion and outright
//! ambiguity are all fine, the table compiler (`engine/tables.rs`) keeps
//! every conflicting action and the runtime forks on them.
//!
//! Two conventions are inherited from classic GLR table construction:
//!
//! - rule 0 is always the augmented production `@ -> START`;
//! - `$` marks end-of-stream in the action table.
//!
//! Symbols are plain strings. Any symbol that appears as some rule's
//! left-hand side is a nonterminal; everything else is a terminal (a lexical
//! category such as `adj`, a dictionary class such as `CLOTHES`, or a quoted
//! literal such as `'of'`).
//!
//! ## Agreement groups
//!
//! A production may constrain several of its right-hand-side occurrences to
//! share morphological features. `S = adj<agr-gnc=1> CLOTHES` pairs the
//! adjective with the following dictionary word over gender+number+case.
//! Group resolution rules live in [`GrammarRule::with_annotations`]: an id
//! shared by two or more occurrences names the group directly; an id on a
//! single occurrence is the relative offset of the partner occurrence.

use crate::features::AttrFamily;
use std::collections::{HashMap, HashSet};
use std::fmt;

/// Left-hand side of the augmented start rule.
pub(crate) const AUGMENTED: &str = "@";
/// End-of-stream marker in the action table.
pub(crate) const END: &str = "$";

/// Fatal errors raised while constructing a parser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompileError {
    /// The start symbol (or a symbol required to be a nonterminal) has no
    /// defining rule.
    UndefinedNonterminal(String),
    /// A rule's left-hand side can never be reached from the start symbol.
    UnreachableRule(String),
    /// An `<agr-...>` annotation is unknown, out of range, or inconsistent.
    MalformedAgreementAnnotation(String),
    /// The grammar notation text could not be read.
    GrammarSyntax(String),
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompileError::UndefinedNonterminal(symbol) => {
                write!(f, "undefined nonterminal: {symbol}")
            }
            CompileError::UnreachableRule(symbol) => {
                write!(f, "rule for {symbol} is unreachable from the start symbol")
            }
            CompileError::MalformedAgreementAnnotation(msg) => {
                write!(f, "malformed agreement annotation: {msg}")
            }
            CompileError::GrammarSyntax(msg) => write!(f, "grammar syntax error: {msg}"),
        }
    }
}

impl std::error::Error for CompileError {}

/// One agreement constraint inside a single production.
///
/// `members` are indices into the owning rule's right-hand side. Every
/// member's bound feature vector must unify with the others over `family`
/// for a reduction by that rule to survive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgreementGroup {
    pub id: i64,
    pub family: AttrFamily,
    pub members: Vec<usize>,
}

/// A raw `<agr-FAM=N>` annotation on one right-hand-side occurrence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SymbolAnnotation {
    pub family: AttrFamily,
    pub id: i64,
}

/// One production: `lhs = rhs[0] rhs[1] ...` plus agreement groups.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrammarRule {
    pub lhs: String,
    pub rhs: Vec<String>,
    pub groups: Vec<AgreementGroup>,
}

impl GrammarRule {
    /// A production without agreement constraints.
    pub fn new(lhs: impl Into<String>, rhs: Vec<String>) -> Self {
        GrammarRule { lhs: lhs.into(), rhs, groups: Vec::new() }
    }

    /// Build a production from annotated symbols, resolving agreement groups.
    ///
    /// An id carried by two or more occurrences forms that group literally
    /// (all families must match). An id carried by exactly one occurrence at
    /// index `i` is the original notation's relative offset: the group is
    /// `{i, i + id}`.
    pub fn with_annotations(
        lhs: impl Into<String>,
        symbols: Vec<(String, Option<SymbolAnnotation>)>,
    ) -> Result<Self, CompileError> {
        let lhs = lhs.into();
        let rhs: Vec<String> = symbols.iter().map(|(s, _)| s.clone()).collect();

        // Collect occurrences per group id, preserving annotation order.
        let mut order: Vec<i64> = Vec::new();
        let mut occurrences: HashMap<i64, (AttrFamily, Vec<usize>)> = HashMap::new();
        for (idx, (_, annotation)) in symbols.iter().enumerate() {
            let Some(annotation) = annotation else { continue };
            match occurrences.entry(annotation.id) {
                std::collections::hash_map::Entry::Vacant(e) => {
                    order.push(annotation.id);
                    e.insert((annotation.family, vec![idx]));
                }
                std::collections::hash_map::Entry::Occupied(mut e) => {
                    let (family, members) = e.get_mut();
                    if *family != annotation.family {
                        return Err(CompileError::MalformedAgreementAnnotation(format!(
                            "group {} of rule {} mixes families {} and {}",
                            annotation.id,
                            lhs,
                            family.letters(),
                            annotation.family.letters(),
                        )));
                    }
                    members.push(idx);
                }
            }
        }

        let mut groups = Vec::new();
        for id in order {
            let (family, mut members) = occurrences.remove(&id).unwrap();
            if members.len() == 1 {
                // Offset notation: pair the occurrence with a neighbor.
                let here = members[0] as i64;
                let partner = here + id;
                if partner < 0 || partner as usize >= rhs.len() || partner == here {
                    return Err(CompileError::MalformedAgreementAnnotation(format!(
                        "offset {} from symbol {} of rule {} points outside the production",
                        id,
                        here + 1,
                        lhs,
                    )));
                }
                members.push(partner as usize);
                members.sort_unstable();
            }
            groups.push(AgreementGroup { id, family, members });
        }

        Ok(GrammarRule { lhs, rhs, groups })
    }
}

/// A validated rule set with the augmented start rule at index 0.
#[derive(Debug, Clone)]
pub struct Grammar {
    pub rules: Vec<GrammarRule>,
    pub start: String,
    nonterminals: HashSet<String>,
    terminals: HashSet<String>,
    rules_for_symbol: HashMap<String, Vec<usize>>,
}

impl Grammar {
    /// Validate `rules` and wrap them with the augmented `@ -> start` rule.
    pub fn new(rules: Vec<GrammarRule>, start: impl Into<String>) -> Result<Self, CompileError> {
        let start = start.into();

        let mut all = Vec::with_capacity(rules.len() + 1);
        all.push(GrammarRule::new(AUGMENTED, vec![start.clone()]));
        all.extend(rules);

        let mut rules_for_symbol: HashMap<String, Vec<usize>> = HashMap::new();
        for (index, rule) in all.iter().enumerate() {
            rules_for_symbol.entry(rule.lhs.clone()).or_default().push(index);
        }

        let nonterminals: HashSet<String> = all.iter().map(|r| r.lhs.clone()).collect();
        let mut terminals: HashSet<String> = HashSet::new();
        for rule in &all {
            for symbol in &rule.rhs {
                if !nonterminals.contains(symbol) {
                    terminals.insert(symbol.clone());
                }
            }
        }

        let grammar = Grammar { rules: all, start, nonterminals, terminals, rules_for_symbol };
        grammar.validate()?;
        Ok(grammar)
    }

    fn validate(&self) -> Result<(), CompileError> {
        if !self.rules_for_symbol.contains_key(&self.start) {
            return Err(CompileError::UndefinedNonterminal(self.start.clone()));
        }

        for rule in self.rules.iter().skip(1) {
            if rule.rhs.is_empty() {
                return Err(CompileError::GrammarSyntax(format!(
                    "empty right-hand side in rule for {} (epsilon rules are not supported)",
                    rule.lhs,
                )));
            }
            for group in &rule.groups {
                for member in &group.members {
                    if *member >= rule.rhs.len() {
                        return Err(CompileError::MalformedAgreementAnnotation(format!(
                            "group {} of rule {} references symbol {} past the production",
                            group.id,
                            rule.lhs,
                            member + 1,
                        )));
                    }
                }
                if group.members.len() < 2 {
                    return Err(CompileError::MalformedAgreementAnnotation(format!(
                        "group {} of rule {} has a single member",
                        group.id, rule.lhs,
                    )));
                }
            }
        }

        // Reachability sweep from the start symbol.
        let mut reachable: HashSet<&str> = HashSet::new();
        let mut queue: Vec<&str> = vec![self.start.as_str()];
        while let Some(symbol) = queue.pop() {
            if !reachable.insert(symbol) {
                continue;
            }
            if let Some(indexes) = self.rules_for_symbol.get(symbol) {
                for &index in indexes {
                    for rhs_symbol in &self.rules[index].rhs {
                        if self.nonterminals.contains(rhs_symbol) {
                            queue.push(rhs_symbol.as_str());
                        }
                    }
                }
            }
        }
        for rule in self.rules.iter().skip(1) {
            if !reachable.contains(rule.lhs.as_str()) {
                return Err(CompileError::UnreachableRule(rule.lhs.clone()));
            }
        }

        Ok(())
    }

    pub fn is_nonterminal(&self, symbol: &str) -> bool {
        self.nonterminals.contains(symbol)
    }

    pub fn is_terminal(&self, symbol: &str) -> bool {
        self.terminals.contains(symbol)
    }

    pub(crate) fn rules_for_symbol(&self, symbol: &str) -> &[usize] {
        self.rules_for_symbol.get(symbol).map(Vec::as_slice).unwrap_or(&[])
    }

    pub(crate) fn nonterminals(&self) -> impl Iterator<Item = &str> {
        self.nonterminals.iter().map(String::as_str)
    }

    /// Quoted literal terminals (`'word'`), lowercased content without quotes.
    pub(crate) fn literal_terminals(&self) -> HashSet<String> {
        self.terminals
            .iter()
            .filter_map(|t| t.strip_prefix('\'').and_then(|t| t.strip_suffix('\'')))
            .map(|t| t.to_lowercase())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(lhs: &str, rhs: &[&str]) -> GrammarRule {
        GrammarRule::new(lhs, rhs.iter().map(|s| s.to_string()).collect())
    }

    #[test]
    fn augments_and_classifies_symbols() {
        let grammar = Grammar::new(vec![rule("S", &["adj", "NOUN"])], "S").unwrap();
        assert_eq!(grammar.rules[0].lhs, AUGMENTED);
        assert_eq!(grammar.rules[0].rhs, vec!["S".to_string()]);
        assert!(grammar.is_nonterminal("S"));
        assert!(grammar.is_terminal("adj"));
        assert!(grammar.is_terminal("NOUN"));
    }

    #[test]
    fn missing_start_rule_is_undefined_nonterminal() {
        let err = Grammar::new(vec![rule("NP", &["adj", "noun"])], "S").unwrap_err();
        assert_eq!(err, CompileError::UndefinedNonterminal("S".into()));
    }

    #[test]
    fn unreachable_rule_is_rejected() {
        let rules = vec![rule("S", &["adj", "noun"]), rule("ORPHAN", &["verb"])];
        let err = Grammar::new(rules, "S").unwrap_err();
        assert_eq!(err, CompileError::UnreachableRule("ORPHAN".into()));
    }

    #[test]
    fn empty_rhs_is_rejected() {
        let err = Grammar::new(vec![rule("S", &[])], "S").unwrap_err();
        assert!(matches!(err, CompileError::GrammarSyntax(_)));
    }

    #[test]
    fn offset_annotation_forms_pair_group() {
        let annotation = SymbolAnnotation { family: AttrFamily::all(), id: 1 };
        let symbols = vec![("adj".to_string(), Some(annotation)), ("NOUN".to_string(), None)];
        let rule = GrammarRule::with_annotations("S", symbols).unwrap();
        assert_eq!(rule.groups.len(), 1);
        assert_eq!(rule.groups[0].members, vec![0, 1]);
    }

    #[test]
    fn negative_offset_points_backwards() {
        let annotation = SymbolAnnotation { family: AttrFamily::all(), id: -1 };
        let symbols = vec![("NOUN".to_string(), None), ("adj".to_string(), Some(annotation))];
        let rule = GrammarRule::with_annotations("S", symbols).unwrap();
        assert_eq!(rule.groups[0].members, vec![0, 1]);
    }

    #[test]
    fn shared_id_forms_explicit_group() {
        let annotation = SymbolAnnotation { family: AttrFamily::all(), id: 7 };
        let symbols = vec![
            ("adj".to_string(), Some(annotation)),
            ("'of'".to_string(), None),
            ("noun".to_string(), Some(annotation)),
        ];
        let rule = GrammarRule::with_annotations("S", symbols).unwrap();
        assert_eq!(rule.groups[0].members, vec![0, 2]);
    }

    #[test]
    fn out_of_range_offset_is_malformed() {
        let annotation = SymbolAnnotation { family: AttrFamily::all(), id: 5 };
        let symbols = vec![("adj".to_string(), Some(annotation)), ("noun".to_string(), None)];
        let err = GrammarRule::with_annotations("S", symbols).unwrap_err();
        assert!(matches!(err, CompileError::MalformedAgreementAnnotation(_)));
    }

    #[test]
    fn mixed_families_in_one_group_are_malformed() {
        let gnc = SymbolAnnotation { family: AttrFamily::all(), id: 1 };
        let nc = SymbolAnnotation { family: AttrFamily::NUMBER | AttrFamily::CASE, id: 1 };
        let symbols = vec![("adj".to_string(), Some(gnc)), ("noun".to_string(), Some(nc))];
        let err = GrammarRule::with_annotations("S", symbols).unwrap_err();
        assert!(matches!(err, CompileError::MalformedAgreementAnnotation(_)));
    }

    #[test]
    fn literal_terminals_are_collected() {
        let grammar = Grammar::new(vec![rule("S", &["noun", "'of'", "noun"])], "S").unwrap();
        let literals = grammar.literal_terminals();
        assert!(literals.contains("of"));
        assert_eq!(literals.len(), 1);
    }
}
