use lazy_static::lazy_static;
use regex::Regex;
use unicode_normalization::UnicodeNormalization;

lazy_static! {
    static ref WORD_RE: Regex = Regex::new(r"(?u)[\p{L}\p{N}]+").expect("valid regex");
}

/// Split free text into lowercase alphanumeric terms after NFKC normalization.
/// No stopword removal or stemming happens here; terms must already match the
/// normalized vocabulary to carry weight.
pub fn query_terms(text: &str) -> Vec<String> {
    let normalized = text.nfkc().collect::<String>().to_lowercase();
    WORD_RE
        .find_iter(&normalized)
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Words of a document body as used for snippet windows: whitespace separated, untouched.
pub fn words(text: &str) -> Vec<&str> {
    text.split_whitespace().collect()
}
