//! Word tokenizer shared by indexing and querying.
//!
//! # Invariants
//! - Tokens are lowercase and non-empty.
//! - Any run of non-word characters (whitespace, punctuation) separates tokens.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeSet;

static NON_WORD_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\W+").expect("valid non-word regex"));

/// Splits `text` into lowercase word tokens, preserving order and repeats.
pub fn tokenize(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    NON_WORD_RE
        .split(&lowered)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .collect()
}

/// Distinct tokens of `text`, sorted.
pub fn unique_tokens(text: &str) -> BTreeSet<String> {
    tokenize(text).into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::{tokenize, unique_tokens};

    #[test]
    fn splits_on_punctuation_and_whitespace() {
        assert_eq!(
            tokenize("Morning Anxiety, feeling-overwhelmed!"),
            vec!["morning", "anxiety", "feeling", "overwhelmed"]
        );
    }

    #[test]
    fn empty_and_blank_input_yield_no_tokens() {
        assert!(tokenize("").is_empty());
        assert!(tokenize("   \t\n").is_empty());
        assert!(tokenize("?!, ...").is_empty());
    }

    #[test]
    fn keeps_digits_and_underscores_inside_words() {
        assert_eq!(tokenize("day_2 of 30"), vec!["day_2", "of", "30"]);
    }

    #[test]
    fn unique_tokens_deduplicates() {
        let tokens = unique_tokens("Calm calm CALM breath");
        assert_eq!(tokens.len(), 2);
        assert!(tokens.contains("calm"));
        assert!(tokens.contains("breath"));
    }
}
