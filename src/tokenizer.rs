//! Word splitting.
//!
//! Sentence segmentation proper is an external concern; this module bundles
//! the one splitter every caller ends up needing: a regex scan producing
//! surface words with their byte spans. Punctuation is dropped, hyphenated
//! compounds stay together.

use crate::Range;

/// One surface word with its byte span in the original text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SurfaceWord {
    pub surface: String,
    pub range: Range,
}

/// Split `text` into surface words in order of appearance.
pub fn split(text: &str) -> Vec<SurfaceWord> {
    regex!(r"[\p{L}\p{N}_]+(?:-[\p{L}\p{N}_]+)*")
        .find_iter(text)
        .map(|m| SurfaceWord {
            surface: m.as_str().to_string(),
            range: Range { start: m.start(), end: m.end() },
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_words_with_spans() {
        let words = split("a beautiful jacket, and a coat.");
        let surfaces: Vec<&str> = words.iter().map(|w| w.surface.as_str()).collect();
        assert_eq!(surfaces, vec!["a", "beautiful", "jacket", "and", "a", "coat"]);
        assert_eq!(words[1].range, Range { start: 2, end: 11 });
        assert_eq!(&"a beautiful jacket, and a coat."[words[2].range.start..words[2].range.end], "jacket");
    }

    #[test]
    fn keeps_hyphenated_compounds() {
        let words = split("well-known fact");
        assert_eq!(words[0].surface, "well-known");
    }

    #[test]
    fn empty_input_yields_no_words() {
        assert!(split("").is_empty());
        assert!(split(" ,.;! ").is_empty());
    }
}
