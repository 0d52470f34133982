//! Comment text normalization

/// Remove every whitespace character from `text`
///
/// Runs of spaces, tabs, newlines and Unicode spaces such as U+3000 collapse
/// to nothing rather than to a single space.
pub fn normalize(text: &str) -> String {
    text.chars().filter(|c| !c.is_whitespace()).collect()
}
