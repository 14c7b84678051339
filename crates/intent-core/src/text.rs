//! Tokenization shared by the Bayes scorer and the heuristic embedder.

const STOPWORDS: &[&str] = &[
    "a", "about", "all", "an", "and", "any", "are", "as", "at", "be", "by", "can", "could", "do",
    "for", "from", "have", "how", "i", "if", "in", "into", "is", "it", "its", "let", "lets", "me",
    "my", "of", "on", "or", "our", "please", "should", "so", "some", "that", "the", "then",
    "this", "to", "up", "us", "want", "was", "we", "what", "when", "which", "will", "with",
    "would", "you", "your",
];

fn is_stopword(word: &str) -> bool {
    STOPWORDS.binary_search(&word).is_ok()
}

/// Light suffix stripping so that "plans", "planned" and "planning" share a
/// stem. Only needs to be consistent, not linguistically correct.
pub fn stem(word: &str) -> String {
    let mut w = word;
    if w.len() >= 6 && w.ends_with("ing") {
        w = &w[..w.len() - 3];
    } else if w.len() >= 5 && w.ends_with("ed") {
        w = &w[..w.len() - 2];
    } else if w.len() >= 5 && w.ends_with("es") {
        w = &w[..w.len() - 2];
    } else if w.len() >= 4 && w.ends_with('s') && !w.ends_with("ss") {
        w = &w[..w.len() - 1];
    }
    if w.len() >= 4 && w.ends_with('e') {
        w = &w[..w.len() - 1];
    }
    let bytes = w.as_bytes();
    if bytes.len() >= 3 {
        let last = bytes[bytes.len() - 1];
        if last.is_ascii_alphabetic()
            && last == bytes[bytes.len() - 2]
            && !b"aeiouslz".contains(&last)
        {
            w = &w[..w.len() - 1];
        }
    }
    w.to_string()
}

/// Case-fold, split on anything that is not alphanumeric, drop stopwords and
/// one-character tokens, then stem.
pub fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| t.chars().count() >= 2 && !is_stopword(t))
        .map(stem)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stopwords_are_sorted_for_binary_search() {
        let mut sorted = STOPWORDS.to_vec();
        sorted.sort_unstable();
        assert_eq!(sorted, STOPWORDS);
    }

    #[test]
    fn tokenize_folds_case_and_splits_punctuation() {
        assert_eq!(
            tokenize("Plan the NEXT phase, please!"),
            vec!["plan", "next", "phas"]
        );
    }

    #[test]
    fn inflections_share_a_stem() {
        for w in ["plan", "plans", "planned", "planning"] {
            assert_eq!(stem(w), "plan", "{w}");
        }
        assert_eq!(stem("execute"), stem("executing"));
        assert_eq!(stem("phase"), stem("phases"));
        assert_eq!(stem("debugging"), "debug");
        assert_eq!(stem("progress"), "progress");
    }

    #[test]
    fn empty_and_symbol_only_input_has_no_tokens() {
        assert!(tokenize("").is_empty());
        assert!(tokenize("  -- ?? ").is_empty());
    }
}
