//! Unsupported-language fallback support.
//!
//! When the generator rejects a chunk's language, the rewrite client asks it
//! to identify the non-English tokens, substitutes each with a unique quoted
//! single-character placeholder, retries the rewrite on the substituted
//! text, and reverses the substitution on the result. This module holds the
//! token filtering, substitution, and reversal; the driving loop lives in
//! [`crate::rewrite`].

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

/// System instruction for the auxiliary identification call.
pub const IDENTIFY_INSTRUCTION: &str = "List every word in the user's text that is not an English word. \
     Respond with only the words themselves, separated by commas. \
     If every word is English, respond with an empty message.";

/// Frequent English words that are never substitution candidates.
///
/// A small head-of-frequency list is enough: the point is to keep the
/// identification call's false positives from mangling ordinary prose.
static COMMON_WORDS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    [
        "the", "be", "to", "of", "and", "a", "in", "that", "have", "i", "it", "for", "not", "on", "with", "he", "as",
        "you", "do", "at", "this", "but", "his", "by", "from", "they", "we", "say", "her", "she", "or", "an", "will",
        "my", "one", "all", "would", "there", "their", "what", "so", "up", "out", "if", "about", "who", "get", "which",
        "go", "me", "when", "make", "can", "like", "time", "no", "just", "him", "know", "take", "people", "into",
        "year", "your", "good", "some", "could", "them", "see", "other", "than", "then", "now", "look", "only", "come",
        "its", "over", "think", "also", "back", "after", "use", "two", "how", "our", "work", "first", "well", "way",
        "even", "new", "want", "because", "any", "these", "give", "day", "most", "us",
    ]
    .into_iter()
    .collect()
});

/// Placeholder characters, assigned to tokens in order.
const PLACEHOLDER_ALPHABET: &str = "abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// A reversible token-to-placeholder mapping for one chunk.
#[derive(Debug, Clone, Default)]
pub struct TokenSubstitution {
    pairs: Vec<(String, char)>,
}

impl TokenSubstitution {
    /// Whether any token was substituted.
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Number of substituted tokens.
    pub fn len(&self) -> usize {
        self.pairs.len()
    }
}

/// Whether a word looks like a proper name.
///
/// Proper names stay untouched: the generator usually passes them through,
/// and replacing them loses information the reader needs.
pub fn is_proper_name(word: &str) -> bool {
    let starts_with_capital = Regex::new(r"^[A-Z][a-z]+$").unwrap();
    let has_internal_caps = Regex::new(r"^[A-Z][a-z]+[A-Z][a-z]+$").unwrap();
    let is_acronym = Regex::new(r"^[A-Z]{2,}$").unwrap();

    starts_with_capital.is_match(word) || has_internal_caps.is_match(word) || is_acronym.is_match(word)
}

/// Parse the identification call's response into candidate tokens.
///
/// The response format is loosely specified, so split on commas, whitespace
/// and newlines, and trim surrounding punctuation.
pub fn parse_identified(response: &str) -> Vec<String> {
    response
        .split(|c: char| c == ',' || c.is_whitespace())
        .map(|t| t.trim_matches(|c: char| !c.is_alphanumeric()).to_string())
        .filter(|t| !t.is_empty())
        .collect()
}

/// Filter identified tokens down to actual substitution candidates.
///
/// Drops single characters, plain numbers, proper names, common English
/// words, and duplicates.
pub fn filter_candidates(tokens: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    tokens
        .into_iter()
        .filter(|t| t.chars().count() > 1)
        .filter(|t| !t.chars().all(|c| c.is_ascii_digit()))
        .filter(|t| !is_proper_name(t))
        .filter(|t| !COMMON_WORDS.contains(t.to_lowercase().as_str()))
        .filter(|t| seen.insert(t.clone()))
        .collect()
}

/// Substitute each token with a unique quoted single-character placeholder.
///
/// Tokens beyond the placeholder alphabet are left in place; the retried
/// generation simply sees them unchanged.
pub fn substitute(text: &str, tokens: &[String]) -> (String, TokenSubstitution) {
    let mut result = text.to_string();
    let mut pairs = Vec::new();

    for (token, placeholder) in tokens.iter().zip(PLACEHOLDER_ALPHABET.chars()) {
        let pattern = Regex::new(&format!(r"\b{}\b", regex::escape(token)));
        let Ok(pattern) = pattern else { continue };

        let replacement = format!("\"{}\"", placeholder);
        let replaced = pattern.replace_all(&result, replacement.as_str());
        if replaced != result {
            result = replaced.into_owned();
            pairs.push((token.clone(), placeholder));
        }
    }

    (result, TokenSubstitution { pairs })
}

/// Reverse a substitution on generated output.
pub fn restore(text: &str, substitution: &TokenSubstitution) -> String {
    let mut result = text.to_string();
    for (token, placeholder) in &substitution.pairs {
        let quoted = format!("\"{}\"", placeholder);
        result = result.replace(&quoted, token);
    }
    result
}
