//! Grammar notation reader.
//!
//! Turns the declarative rule notation into a [`Grammar`]:
//!
//! ```text
//! S = adj<agr-gnc=1> CLOTHES
//! S = CLOTHES adj<agr-gnc=-1>
//! NP = adj<agr-gnc=1> noun | noun 'of' noun
//! ```
//!
//! One rule per line, `|` separates alternatives, `#` starts a comment.
//! A symbol is a word (`adj`, `CLOTHES`), optionally annotated with an
//! agreement label `<agr-FAM=N>`, or a quoted literal (`'of'`) matching an
//! exact surface word. Group resolution itself lives in
//! [`GrammarRule::with_annotations`]; this module only reads text.

use crate::features::AttrFamily;
use crate::grammar::{CompileError, Grammar, GrammarRule, SymbolAnnotation};

/// Read grammar notation into a validated [`Grammar`].
pub fn read_grammar(src: &str, start: &str) -> Result<Grammar, CompileError> {
    let mut rules = Vec::new();

    for (lineno, raw_line) in src.lines().enumerate() {
        let line = raw_line.split('#').next().unwrap_or("").trim();
        if line.is_empty() {
            continue;
        }

        let Some((lhs, body)) = line.split_once('=') else {
            return Err(CompileError::GrammarSyntax(format!(
                "line {}: expected `LHS = ...`, got `{line}`",
                lineno + 1,
            )));
        };
        let lhs = lhs.trim();
        if !regex!(r"^[\p{L}\p{N}_]+$").is_match(lhs) {
            return Err(CompileError::GrammarSyntax(format!(
                "line {}: invalid rule name `{lhs}`",
                lineno + 1,
            )));
        }

        for alternative in body.split('|') {
            let symbols = scan_symbols(alternative, lineno + 1)?;
            if symbols.is_empty() {
                return Err(CompileError::GrammarSyntax(format!(
                    "line {}: empty alternative in rule for {lhs}",
                    lineno + 1,
                )));
            }
            rules.push(GrammarRule::with_annotations(lhs, symbols)?);
        }
    }

    Grammar::new(rules, start)
}

/// Scan one alternative into `(symbol, annotation)` pairs.
fn scan_symbols(
    alternative: &str,
    lineno: usize,
) -> Result<Vec<(String, Option<SymbolAnnotation>)>, CompileError> {
    let symbol_re = regex!(r#"^(?:'([^']+)'|"([^"]+)"|([\p{L}\p{N}_]+)(<[^>]*>)?)"#);
    let mut symbols = Vec::new();
    let mut rest = alternative.trim_start();

    while !rest.is_empty() {
        let Some(caps) = symbol_re.captures(rest) else {
            return Err(CompileError::GrammarSyntax(format!(
                "line {lineno}: unexpected input at `{rest}`",
            )));
        };

        if let Some(literal) = caps.get(1).or_else(|| caps.get(2)) {
            // Quoted literal: a terminal matching one exact surface word.
            symbols.push((format!("'{}'", literal.as_str().trim().to_lowercase()), None));
        } else {
            let word = caps.get(3).map(|m| m.as_str().to_string()).unwrap_or_default();
            let annotation = match caps.get(4) {
                Some(label) => Some(parse_annotation(label.as_str(), lineno)?),
                None => None,
            };
            symbols.push((word, annotation));
        }

        rest = rest[caps.get(0).map(|m| m.end()).unwrap_or(0)..].trim_start();
    }

    Ok(symbols)
}

/// Parse one `<agr-FAM=N>` label.
fn parse_annotation(label: &str, lineno: usize) -> Result<SymbolAnnotation, CompileError> {
    let inner = label.trim_start_matches('<').trim_end_matches('>').trim();
    let Some(caps) = regex!(r"^agr-([a-z]+)\s*=\s*(-?\d+)$").captures(inner) else {
        return Err(CompileError::MalformedAgreementAnnotation(format!(
            "line {lineno}: unrecognized label `<{inner}>`",
        )));
    };
    let family = AttrFamily::parse(&caps[1]).ok_or_else(|| {
        CompileError::MalformedAgreementAnnotation(format!(
            "line {lineno}: unknown attribute family `{}`",
            &caps[1],
        ))
    })?;
    let id: i64 = caps[2].parse().map_err(|_| {
        CompileError::MalformedAgreementAnnotation(format!(
            "line {lineno}: bad group id in `<{inner}>`",
        ))
    })?;
    Ok(SymbolAnnotation { family, id })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::AttrFamily;

    #[test]
    fn reads_annotated_rules() {
        let grammar = read_grammar(
            "
            S = adj<agr-gnc=1> CLOTHES
            S = CLOTHES adj<agr-gnc=-1>
            ",
            "S",
        )
        .unwrap();
        // Rule 0 is the augmented start rule.
        assert_eq!(grammar.rules.len(), 3);
        let forward = &grammar.rules[1];
        assert_eq!(forward.rhs, vec!["adj".to_string(), "CLOTHES".to_string()]);
        assert_eq!(forward.groups[0].family, AttrFamily::all());
        assert_eq!(forward.groups[0].members, vec![0, 1]);
        let backward = &grammar.rules[2];
        assert_eq!(backward.groups[0].members, vec![0, 1]);
    }

    #[test]
    fn reads_alternatives_and_literals() {
        let grammar = read_grammar("NP = adj noun | noun 'of' noun", "NP").unwrap();
        assert_eq!(grammar.rules.len(), 3);
        assert_eq!(grammar.rules[2].rhs, vec!["noun".to_string(), "'of'".to_string(), "noun".to_string()]);
        assert!(grammar.literal_terminals().contains("of"));
    }

    #[test]
    fn skips_comments_and_blank_lines() {
        let grammar = read_grammar("# adjective-noun pairs\n\nS = adj noun # inline\n", "S").unwrap();
        assert_eq!(grammar.rules.len(), 2);
    }

    #[test]
    fn rejects_unknown_label() {
        let err = read_grammar("S = adj<gram=sing> noun", "S").unwrap_err();
        assert!(matches!(err, CompileError::MalformedAgreementAnnotation(_)));
    }

    #[test]
    fn rejects_unknown_family() {
        let err = read_grammar("S = adj<agr-xyz=1> noun", "S").unwrap_err();
        assert!(matches!(err, CompileError::MalformedAgreementAnnotation(_)));
    }

    #[test]
    fn rejects_missing_separator() {
        let err = read_grammar("S adj noun", "S").unwrap_err();
        assert!(matches!(err, CompileError::GrammarSyntax(_)));
    }

    #[test]
    fn rejects_stray_punctuation() {
        let err = read_grammar("S = adj ; noun", "S").unwrap_err();
        assert!(matches!(err, CompileError::GrammarSyntax(_)));
    }
}
