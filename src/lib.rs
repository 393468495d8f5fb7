//! Grammar-driven pattern search over morphologically ambiguous text.
//!
//! `syntagma` finds occurrences of a declared grammatical pattern in
//! free-form text where each word can be read several ways (the same surface
//! form may be feminine or masculine, nominative or accusative) and the
//! pattern constrains readings to agree:
//!
//! ```text
//! S = adj<agr-gnc=1> CLOTHES
//! ```
//!
//! matches an adjective followed by a clothing word, but only when some
//! reading of each agrees in gender, number and case. The engine is a GLR
//! parser: grammar conflicts and reading ambiguity fork a graph-structured
//! stack instead of failing, and disagreeing forks are pruned at reduce
//! time.
//!
//! The usual entry point is [`GlrParser`]:
//!
//! ```no_run
//! use syntagma::{Dictionary, GlrParser, StaticAnalyzer};
//!
//! let mut dictionary = Dictionary::new();
//! dictionary.add("CLOTHES", ["jacket", "coat"]);
//! let parser = GlrParser::from_text(
//!     "S = adj<agr-gnc=1> CLOTHES",
//!     "S",
//!     &dictionary,
//!     Box::new(StaticAnalyzer::new()),
//! )?;
//! let tokens = parser.read_tokens("a beautiful jacket");
//! for result in parser.search(&tokens) {
//!     let m = result?;
//!     println!("{}..{}", m.start, m.end);
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

extern crate self as syntagma;

#[macro_use]
mod macros;
mod api;
mod engine;
mod features;
mod grammar;
mod lexer;
mod reader;
mod tokenizer;

pub use api::{GlrParser, Options};
pub use engine::{OffsetMetrics, Search, SearchMetrics, SearchReport};
pub use features::{Attr, AttrFamily, FeatureVector};
pub use grammar::{AgreementGroup, CompileError, Grammar, GrammarRule, SymbolAnnotation};
pub use lexer::{Dictionary, MorphAnalyzer, StaticAnalyzer};
pub use reader::read_grammar;
pub use tokenizer::{SurfaceWord, split};

// --- Core data model ---------------------------------------------------------

/// Byte span into the original input text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Range {
    /// Start byte index (inclusive).
    pub start: usize,
    /// End byte index (exclusive).
    pub end: usize,
}

/// One candidate interpretation of a surface word: a terminal category, the
/// dictionary form, and the morphological features of this interpretation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Reading {
    /// Grammar terminal this reading can fill (`adj`, `noun`, `CLOTHES`, `'of'`).
    pub symbol: String,
    /// Dictionary (lemma) form of the word under this reading.
    pub lemma: String,
    pub features: FeatureVector,
}

/// One input unit: a surface word with its candidate readings.
///
/// Immutable once built; an empty `readings` list is a normal stream
/// position where no match can start or continue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub surface: String,
    /// Span in the original text, when the token came from it.
    pub range: Option<Range>,
    pub readings: Vec<Reading>,
}

/// One word of a reported match, with the reading the engine committed to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchedWord {
    pub surface: String,
    /// Terminal symbol this word filled in the pattern.
    pub symbol: String,
    pub lemma: String,
    pub features: FeatureVector,
    pub range: Option<Range>,
}

/// A recognized occurrence of the pattern.
///
/// `start`/`end` are token indices (end exclusive); byte spans live on the
/// individual words.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Match {
    pub start: usize,
    pub end: usize,
    /// Matched words in pattern order.
    pub words: Vec<MatchedWord>,
}

/// A search offset whose step budget ran out before the run completed.
///
/// Yielded in-stream by [`Search`]; partial results from the aborted offset
/// are discarded, other offsets are unaffected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchIncomplete {
    /// Token index the aborted run started from.
    pub start: usize,
    /// Steps consumed when the budget was exceeded.
    pub steps: usize,
}

impl std::fmt::Display for SearchIncomplete {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "search from token {} aborted after {} steps", self.start, self.steps)
    }
}

impl std::error::Error for SearchIncomplete {}
