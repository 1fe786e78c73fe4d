//! Query matching against extracted complex titles

/// Returns true if the query occurs in the title, ignoring case
///
/// The query is trimmed; comparison lowercases both sides with Unicode rules,
/// so Cyrillic titles match regardless of case. No tokenization or fuzzy
/// matching is done.
///
/// An empty (or whitespace-only) query matches every title.
///
/// # Example
///
/// ```
/// use zhk_scout::crawler::matches;
///
/// assert!(matches("ЖК Солнечный", "солнечный"));
/// assert!(!matches("ЖК Солнечный", "лунный"));
/// ```
pub fn matches(title: &str, query: &str) -> bool {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return true;
    }
    title.to_lowercase().contains(&needle)
}
