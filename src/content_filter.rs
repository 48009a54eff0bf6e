/// Chirp body filtering
///
/// Whole-word, case-insensitive masking of a fixed denylist. Words are split on
/// single spaces only, so a denylisted word with punctuation attached
/// ("fornax,") is left alone.

use lazy_static::lazy_static;
use std::collections::HashSet;

/// Longest accepted chirp body, in characters
pub const MAX_CHIRP_LENGTH: usize = 140;

const MASK: &str = "****";

lazy_static! {
    static ref PROFANE_WORDS: HashSet<&'static str> =
        ["kerfuffle", "sharbert", "fornax"].into_iter().collect();
}

/// Replace every denylisted word with `****`, keeping all other words as-is.
pub fn clean_body(body: &str) -> String {
    body.split(' ')
        .map(|word| {
            if PROFANE_WORDS.contains(word.to_lowercase().as_str()) {
                MASK
            } else {
                word
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// True when `body` fits in a chirp
pub fn within_length_limit(body: &str) -> bool {
    body.chars().count() <= MAX_CHIRP_LENGTH
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_masks_denylisted_words_case_insensitively() {
        assert_eq!(
            clean_body("I had a kerfuffle with Fornax"),
            "I had a **** with ****"
        );
        assert_eq!(clean_body("SHARBERT"), "****");
    }

    #[test]
    fn test_leaves_clean_text_untouched() {
        let body = "I really need a kerfuffle-free day";
        assert_eq!(clean_body(body), body);
    }

    #[test]
    fn test_punctuation_attached_words_are_not_masked() {
        assert_eq!(clean_body("fornax, kerfuffle!"), "fornax, kerfuffle!");
    }

    #[test]
    fn test_spacing_is_preserved() {
        assert_eq!(clean_body("a  sharbert  b"), "a  ****  b");
        assert_eq!(clean_body(""), "");
    }

    #[test]
    fn test_length_limit_counts_characters() {
        assert!(within_length_limit(&"a".repeat(MAX_CHIRP_LENGTH)));
        assert!(!within_length_limit(&"a".repeat(MAX_CHIRP_LENGTH + 1)));
        // Multi-byte characters count once each.
        assert!(within_length_limit(&"é".repeat(MAX_CHIRP_LENGTH)));
    }
}
