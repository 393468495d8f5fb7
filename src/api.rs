//! Public parsing surface.
//!
//! [`GlrParser`] bundles a compiled grammar with the candidate reader built
//! from its dictionary, analyzer and literal terminals. Construction does
//! all the fallible work (notation reading, grammar validation, table
//! compilation); a built parser is immutable and `&self`-only, so one
//! instance can serve concurrent searches.

use crate::engine::{Engine, OffsetMetrics, Search, SearchMetrics, SearchReport};
use crate::grammar::{CompileError, Grammar};
use crate::lexer::CandidateReader;
use crate::{Dictionary, MorphAnalyzer, Token, reader, tokenizer};
use std::time::Instant;

/// Search behavior knobs.
#[derive(Debug, Clone, Copy)]
pub struct Options {
    /// Node-action applications allowed per start offset before the run is
    /// abandoned with [`SearchIncomplete`](crate::SearchIncomplete).
    pub max_steps: usize,
}

impl Default for Options {
    fn default() -> Self {
        Options { max_steps: 200_000 }
    }
}

/// A compiled pattern searcher.
pub struct GlrParser {
    engine: Engine,
    reader: CandidateReader,
}

impl GlrParser {
    /// Build a parser from an already-validated [`Grammar`].
    pub fn new(grammar: Grammar, dictionary: &Dictionary, analyzer: Box<dyn MorphAnalyzer>) -> Self {
        let reader = CandidateReader::new(dictionary, grammar.literal_terminals(), analyzer);
        GlrParser { engine: Engine::new(grammar), reader }
    }

    /// Build a parser from grammar notation text.
    ///
    /// ```no_run
    /// # use syntagma::{Dictionary, GlrParser, StaticAnalyzer};
    /// let mut dictionary = Dictionary::new();
    /// dictionary.add("CLOTHES", ["jacket", "coat"]);
    /// let parser = GlrParser::from_text(
    ///     "S = adj<agr-gnc=1> CLOTHES",
    ///     "S",
    ///     &dictionary,
    ///     Box::new(StaticAnalyzer::new()),
    /// )?;
    /// # Ok::<(), syntagma::CompileError>(())
    /// ```
    pub fn from_text(
        grammar_src: &str,
        start: &str,
        dictionary: &Dictionary,
        analyzer: Box<dyn MorphAnalyzer>,
    ) -> Result<Self, CompileError> {
        Ok(Self::new(reader::read_grammar(grammar_src, start)?, dictionary, analyzer))
    }

    pub fn grammar(&self) -> &Grammar {
        self.engine.grammar()
    }

    /// Split `text` into words and attach candidate readings.
    ///
    /// Tokenization stays a caller concern for pre-tokenized input; this
    /// wires the bundled regex splitter through the candidate reader.
    pub fn read_tokens(&self, text: &str) -> Vec<Token> {
        self.reader.annotate(tokenizer::split(text))
    }

    /// Lazily search `tokens` with the default step budget.
    pub fn search<'a>(&'a self, tokens: &'a [Token]) -> Search<'a> {
        self.search_with(tokens, Options::default())
    }

    /// Lazily search `tokens` with an explicit step budget.
    pub fn search_with<'a>(&'a self, tokens: &'a [Token], options: Options) -> Search<'a> {
        Search::new(&self.engine, tokens, options)
    }

    /// Eagerly search `tokens`, returning matches together with per-offset
    /// metrics. The lazy [`search`](Self::search) path does not pay for any
    /// of this bookkeeping.
    pub fn search_report(&self, tokens: &[Token], options: Options) -> SearchReport {
        let total_start = Instant::now();
        let mut search = Search::new(&self.engine, tokens, options);
        let mut metrics = SearchMetrics::default();
        let mut matches = Vec::new();
        let mut incomplete = Vec::new();

        while search.has_more_offsets() {
            let mut offset = OffsetMetrics::default();
            metrics.deduped += search.step_offset(&mut offset);
            metrics.offsets.push(offset);
            for item in search.take_pending() {
                match item {
                    Ok(m) => matches.push(m),
                    Err(e) => incomplete.push(e),
                }
            }
        }

        metrics.total = total_start.elapsed();
        SearchReport { matches, incomplete, metrics }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::{Attr, FeatureVector};
    use crate::{Match, Reading, StaticAnalyzer};

    fn features(pairs: &[(Attr, &str)]) -> FeatureVector {
        pairs.iter().fold(FeatureVector::wildcard(), |fv, (a, v)| fv.set(*a, *v))
    }

    fn reading(symbol: &str, lemma: &str, pairs: &[(Attr, &str)]) -> Reading {
        Reading { symbol: symbol.to_string(), lemma: lemma.to_string(), features: features(pairs) }
    }

    /// Analyzer fixture for a small wardrobe domain: "beautiful" is
    /// ambiguous between a feminine and a masculine reading, the nouns are
    /// not.
    fn wardrobe_analyzer() -> StaticAnalyzer {
        let mut analyzer = StaticAnalyzer::new();
        analyzer
            .add("beautiful", reading("adj", "beautiful", &[(Attr::Gender, "femn"), (Attr::Number, "sing")]))
            .add("beautiful", reading("adj", "beautiful", &[(Attr::Gender, "masc"), (Attr::Number, "sing")]))
            .add("jacket", reading("noun", "jacket", &[(Attr::Gender, "femn"), (Attr::Number, "sing")]))
            .add("scarf", reading("noun", "scarf", &[(Attr::Gender, "masc"), (Attr::Number, "sing")]))
            .add("green", reading("adj", "green", &[(Attr::Gender, "masc"), (Attr::Number, "sing")]));
        analyzer
    }

    fn wardrobe_parser(grammar: &str) -> GlrParser {
        let mut dictionary = Dictionary::new();
        dictionary.add("CLOTHES", ["jacket", "scarf"]);
        GlrParser::from_text(grammar, "S", &dictionary, Box::new(wardrobe_analyzer())).unwrap()
    }

    fn matches(parser: &GlrParser, text: &str) -> Vec<Match> {
        let tokens = parser.read_tokens(text);
        parser.search(&tokens).map(|r| r.unwrap()).collect()
    }

    #[test]
    fn agreeing_pair_matches_through_the_whole_pipeline() {
        let parser = wardrobe_parser("S = adj<agr-gnc=1> noun");

        let found = matches(&parser, "a beautiful jacket");
        assert_eq!(found.len(), 1);
        let m = &found[0];
        assert_eq!((m.start, m.end), (1, 3));
        assert_eq!(m.words[0].surface, "beautiful");
        assert_eq!(m.words[0].features.get(Attr::Gender), Some("femn"));
        assert_eq!(m.words[1].lemma, "jacket");

        // Byte spans point back into the original text.
        let range = m.words[0].range.unwrap();
        assert_eq!(&"a beautiful jacket"[range.start..range.end], "beautiful");
    }

    #[test]
    fn disagreeing_pair_does_not_match() {
        let parser = wardrobe_parser("S = adj<agr-gnc=1> noun");
        assert!(matches(&parser, "green jacket").is_empty());
        assert_eq!(matches(&parser, "green scarf").len(), 1);
    }

    #[test]
    fn dictionary_category_matches_with_wildcard_agreement() {
        let parser = wardrobe_parser("S = adj<agr-gnc=1> CLOTHES");

        // CLOTHES readings carry wildcard features, so either gender of the
        // ambiguous adjective agrees; both commitments are reported.
        let found = matches(&parser, "beautiful jacket");
        assert_eq!(found.len(), 2);
        assert!(found.iter().all(|m| m.words[1].symbol == "CLOTHES"));
    }

    #[test]
    fn literal_terminal_matches_exact_surface() {
        let mut analyzer = StaticAnalyzer::new();
        analyzer
            .add("coat", reading("noun", "coat", &[]))
            .add("arms", reading("noun", "arms", &[]));
        let parser =
            GlrParser::from_text("S = noun 'of' noun", "S", &Dictionary::new(), Box::new(analyzer))
                .unwrap();

        let found = matches(&parser, "coat of arms");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].words[1].symbol, "'of'");
    }

    #[test]
    fn unknown_words_are_skipped_not_fatal() {
        let parser = wardrobe_parser("S = adj<agr-gnc=1> noun");
        let found = matches(&parser, "qwzx beautiful jacket qwzx");
        assert_eq!(found.len(), 1);
        assert_eq!((found[0].start, found[0].end), (1, 3));
    }

    #[test]
    fn report_agrees_with_lazy_search() {
        let parser = wardrobe_parser("S = adj<agr-gnc=1> noun");
        let tokens = parser.read_tokens("a beautiful jacket and a green scarf");

        let lazy: Vec<Match> = parser.search(&tokens).map(|r| r.unwrap()).collect();
        let report = parser.search_report(&tokens, Options::default());

        assert_eq!(report.matches, lazy);
        assert!(report.incomplete.is_empty());
        assert_eq!(report.metrics.offsets.len(), tokens.len());
    }

    #[test]
    fn tiny_budget_reports_incomplete_offsets() {
        let parser = wardrobe_parser("S = adj<agr-gnc=1> noun");
        let tokens = parser.read_tokens("beautiful jacket");

        let report = parser.search_report(&tokens, Options { max_steps: 1 });
        assert!(report.matches.is_empty());
        assert!(!report.incomplete.is_empty());
        assert_eq!(report.incomplete[0].start, 0);
    }

    #[test]
    fn parser_is_shareable_across_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<GlrParser>();
    }
}
