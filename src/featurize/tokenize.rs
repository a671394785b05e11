use std::sync::LazyLock;

use regex::Regex;

use super::FeaturizerOptions;

static WORD_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\w+(?:'\w+)*").expect("word regex must compile"));

const TEXT_START: char = '\u{2}';
const TEXT_END: char = '\u{3}';

/// Expand a text into its word and character n-gram terms, duplicates kept.
pub(crate) fn extract_terms(text: &str, options: &FeaturizerOptions) -> Vec<String> {
    let normalized = if options.lowercase {
        text.to_lowercase()
    } else {
        text.to_string()
    };

    let mut terms = Vec::new();
    let words: Vec<&str> = WORD_PATTERN
        .find_iter(&normalized)
        .map(|m| m.as_str())
        .collect();
    for n in 1..=options.word_ngram_length {
        for gram in words.windows(n) {
            terms.push(format!("w:{}", gram.join(" ")));
        }
    }

    let n = options.char_ngram_length;
    if n > 0 {
        let mut chars = vec![TEXT_START];
        chars.extend(normalized.split_whitespace().collect::<Vec<_>>().join(" ").chars());
        chars.push(TEXT_END);
        for gram in chars.windows(n) {
            let mut term = String::with_capacity(2 + n);
            term.push_str("c:");
            term.extend(gram.iter());
            terms.push(term);
        }
    }
    terms
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words_only(word_ngram_length: usize) -> FeaturizerOptions {
        FeaturizerOptions {
            word_ngram_length,
            char_ngram_length: 0,
            ..FeaturizerOptions::default()
        }
    }

    #[test]
    fn words_are_lowercased_and_keep_apostrophes() {
        let terms = extract_terms("Contoso's 11 is WONDERFUL!", &words_only(1));
        assert_eq!(terms, vec!["w:contoso's", "w:11", "w:is", "w:wonderful"]);
    }

    #[test]
    fn inner_apostrophes_stay_inside_one_word() {
        let terms = extract_terms("rock'n'roll isn't 'quoted'", &words_only(1));
        assert_eq!(terms, vec!["w:rock'n'roll", "w:isn't", "w:quoted"]);
    }

    #[test]
    fn bigrams_follow_unigrams() {
        let terms = extract_terms("very bad movie", &words_only(2));
        assert_eq!(
            terms,
            vec!["w:very", "w:bad", "w:movie", "w:very bad", "w:bad movie"]
        );
    }

    #[test]
    fn char_grams_include_boundary_markers() {
        let options = FeaturizerOptions {
            word_ngram_length: 1,
            char_ngram_length: 3,
            ..FeaturizerOptions::default()
        };
        let terms = extract_terms("ok  go", &options);
        let chars: Vec<&String> = terms.iter().filter(|t| t.starts_with("c:")).collect();
        assert_eq!(chars.first().map(|t| t.as_str()), Some("c:\u{2}ok"));
        assert_eq!(chars.last().map(|t| t.as_str()), Some("c:go\u{3}"));
        assert!(chars.iter().any(|t| t.as_str() == "c:k g"));
    }
}
