//! Utility functions and helpers

/// Derive a session title from question text.
///
/// Keeps the first `max_chars` characters and appends `...` when the
/// question was longer. Operates on characters, not bytes, so multi-byte
/// input cannot split a code point.
pub fn truncate_title(question: &str, max_chars: usize) -> String {
    let mut title: String = question.chars().take(max_chars).collect();
    if question.chars().count() > max_chars {
        title.push_str("...");
    }
    title
}
