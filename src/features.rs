//! Morphological feature model.
//!
//! Every reading of a word carries a `FeatureVector`: a *partial* assignment
//! of values to morphological attributes (gender, number, case). Unset
//! attributes are wildcards. Agreement checking is plain unification:
//!
//! - two vectors unify iff no attribute present in *both* disagrees;
//! - unification can be restricted to an `AttrFamily` so that a rule can
//!   demand, say, gender+number agreement while ignoring case.
//!
//! The family letters mirror the grammar annotation notation: `agr-gnc`,
//! `agr-nc`, `agr-gn`, `agr-gc`, `agr-c` and any other combination of the
//! letters `g`, `n`, `c`.

use std::collections::BTreeMap;
use std::fmt;

/// A morphological attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Attr {
    Gender,
    Number,
    Case,
}

impl Attr {
    pub const ALL: [Attr; 3] = [Attr::Gender, Attr::Number, Attr::Case];

    fn family_bit(self) -> AttrFamily {
        match self {
            Attr::Gender => AttrFamily::GENDER,
            Attr::Number => AttrFamily::NUMBER,
            Attr::Case => AttrFamily::CASE,
        }
    }

    fn letter(self) -> char {
        match self {
            Attr::Gender => 'g',
            Attr::Number => 'n',
            Attr::Case => 'c',
        }
    }
}

bitflags::bitflags! {
    /// A set of attributes an agreement group ranges over.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct AttrFamily: u8 {
        const GENDER = 1 << 0;
        const NUMBER = 1 << 1;
        const CASE   = 1 << 2;
    }
}

impl AttrFamily {
    /// Parse the letters of an `agr-*` annotation, e.g. `"gnc"` or `"nc"`.
    ///
    /// Returns `None` on an empty or unknown letter sequence.
    pub fn parse(letters: &str) -> Option<AttrFamily> {
        if letters.is_empty() {
            return None;
        }
        let mut family = AttrFamily::empty();
        for ch in letters.chars() {
            family |= match ch {
                'g' => AttrFamily::GENDER,
                'n' => AttrFamily::NUMBER,
                'c' => AttrFamily::CASE,
                _ => return None,
            };
        }
        Some(family)
    }

    pub fn contains_attr(&self, attr: Attr) -> bool {
        self.contains(attr.family_bit())
    }

    /// The annotation letters for this family, in `g`/`n`/`c` order.
    pub fn letters(&self) -> String {
        Attr::ALL.iter().filter(|a| self.contains_attr(**a)).map(|a| a.letter()).collect()
    }
}

/// Partial attribute assignment; unset attributes are unconstrained.
///
/// Values are free-form lowercase tags as produced by the morphological
/// analyzer ("femn", "sing", "nomn", ...). The engine never interprets them,
/// it only compares them for equality.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct FeatureVector {
    values: BTreeMap<Attr, String>,
}

impl FeatureVector {
    /// The all-wildcard vector (used for closed-dictionary readings).
    pub fn wildcard() -> Self {
        FeatureVector::default()
    }

    pub fn set(mut self, attr: Attr, value: impl Into<String>) -> Self {
        self.values.insert(attr, value.into());
        self
    }

    pub fn get(&self, attr: Attr) -> Option<&str> {
        self.values.get(&attr).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Attr, &str)> {
        self.values.iter().map(|(a, v)| (*a, v.as_str()))
    }

    /// Unify two vectors over `family`.
    ///
    /// Succeeds iff no attribute of the family present in both vectors
    /// disagrees; the result carries the union of the family attributes set
    /// on either side. Attributes outside the family are dropped, they are
    /// not part of the agreement being established.
    pub fn unify(&self, other: &FeatureVector, family: AttrFamily) -> Option<FeatureVector> {
        let mut out = BTreeMap::new();
        for attr in Attr::ALL {
            if !family.contains_attr(attr) {
                continue;
            }
            match (self.get(attr), other.get(attr)) {
                (Some(a), Some(b)) if a != b => return None,
                (Some(v), _) | (_, Some(v)) => {
                    out.insert(attr, v.to_string());
                }
                (None, None) => {}
            }
        }
        Some(FeatureVector { values: out })
    }

    /// Fold-merge keeping only attributes all inputs agree on.
    ///
    /// Used to compute the bindings a reduced nonterminal carries upward:
    /// attributes on which two independent agreement groups disagree stay
    /// unset instead of failing the reduction.
    pub fn merge_agreeing(vectors: &[FeatureVector]) -> FeatureVector {
        let mut out: BTreeMap<Attr, String> = BTreeMap::new();
        let mut poisoned: Vec<Attr> = Vec::new();
        for vector in vectors {
            for (attr, value) in vector.iter() {
                if poisoned.contains(&attr) {
                    continue;
                }
                match out.get(&attr) {
                    None => {
                        out.insert(attr, value.to_string());
                    }
                    Some(existing) if existing == value => {}
                    Some(_) => {
                        out.remove(&attr);
                        poisoned.push(attr);
                    }
                }
            }
        }
        FeatureVector { values: out }
    }
}

impl fmt::Display for FeatureVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.values.is_empty() {
            return write!(f, "*");
        }
        let mut first = true;
        for (attr, value) in &self.values {
            if !first {
                write!(f, ",")?;
            }
            first = false;
            write!(f, "{}={}", attr.letter(), value)?;
        }
        Ok(())
    }
}
