//! Small text helpers shared across the pipeline.
//!
//! Word counts are whitespace-token counts; quote stripping removes
//! exactly one layer of straight or curly quotes (model output loves to
//! wrap headlines in them); truncation is char-based so multi-byte text
//! never splits.

/// Count whitespace-delimited tokens.
#[must_use]
pub fn word_count(s: &str) -> usize {
    s.split_whitespace().count()
}

/// Quote characters stripped from titles and ledes.
const QUOTE_CHARS: [char; 6] = ['"', '\'', '\u{201c}', '\u{201d}', '\u{2018}', '\u{2019}'];

/// Strip exactly one layer of leading/trailing quotes plus whitespace.
///
/// Straight and curly quotes both count; markdown formatting is left
/// alone. The inner text is trimmed again so `"  title  "` comes back as
/// `title`.
#[must_use]
pub fn strip_quotes(s: &str) -> &str {
    let trimmed = s.trim();
    let mut inner = trimmed;
    if let Some(rest) = inner.strip_prefix(QUOTE_CHARS) {
        inner = rest;
    }
    if let Some(rest) = inner.strip_suffix(QUOTE_CHARS) {
        inner = rest;
    }
    // Only one layer: a doubly-quoted string keeps its inner quotes.
    inner.trim()
}

/// Truncate to at most `max_chars` characters (not bytes).
#[must_use]
pub fn truncate_chars(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
