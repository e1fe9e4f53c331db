//! Small string helpers shared by the record model and the analysis layer.

use std::collections::HashSet;
use std::hash::Hash;

use unicode_normalization::UnicodeNormalization;

/// Normalize a string for case- and accent-insensitive comparisons.
///
/// The text is lowercased and decomposed (NFKD) so that accents become
/// combining marks, which are then dropped together with any punctuation other
/// than `.` and `-`.
pub fn norm(s: &str) -> String {
    let lowered = s.to_lowercase();
    let stripped: String = lowered
        .nfkd()
        .filter(|ch| is_ascii_word(*ch) || ch.is_whitespace() || *ch == '.' || *ch == '-')
        .collect();
    stripped.trim().to_string()
}

/// Replace every run of whitespace with a single space.
pub fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// De-duplicate while keeping the order of first appearance.
pub fn uniq<T, I>(items: I) -> Vec<T>
where
    T: Eq + Hash + Clone,
    I: IntoIterator<Item = T>,
{
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|item| seen.insert(item.clone()))
        .collect()
}

fn is_ascii_word(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '_'
}
