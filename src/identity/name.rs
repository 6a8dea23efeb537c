//! Full-name rules
//!
//! A name is two or more whitespace-separated words made of letters only,
//! where letters include the Turkish extended Latin set. Names are looked up
//! case-insensitively but always displayed as typed.

use regex::Regex;
use std::sync::LazyLock;

static FULL_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-zÇĞİÖŞÜçğıöşü]+(\s+[A-Za-zÇĞİÖŞÜçğıöşü]+)+$")
        .expect("full-name pattern is valid")
});

/// Message shown when a name fails [`is_valid_full_name`]
pub const INVALID_NAME_MESSAGE: &str =
    "Please enter your full name (letters only, at least two words).";

/// Whether `name` (after trimming) is an acceptable full name
pub fn is_valid_full_name(name: &str) -> bool {
    FULL_NAME.is_match(name.trim())
}

/// Display form of a name: surrounding whitespace removed, casing kept
pub fn display_name(name: &str) -> String {
    name.trim().to_string()
}

/// Lookup key for a name.
///
/// Trims, collapses inner whitespace runs and lowercases. Both capital `I`
/// and `İ` lower to `i`; a lowercase dotless `ı` is its own letter, so
/// `Yılmaz` and `Yilmaz` are different names.
pub fn normalize_name(name: &str) -> String {
    name.split_whitespace()
        .map(fold_word)
        .collect::<Vec<_>>()
        .join(" ")
}

fn fold_word(word: &str) -> String {
    word.chars()
        .flat_map(|c| match c {
            'I' | 'İ' => 'i'.to_lowercase(),
            other => other.to_lowercase(),
        })
        // A decomposed `İ` arrives as I + U+0307; drop the combining dot
        .filter(|c| *c != '\u{0307}')
        .collect()
}
