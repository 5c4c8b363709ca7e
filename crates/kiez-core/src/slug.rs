//! URL-safe slug generation.
//!
//! Classic web slugs: lowercase ASCII Latin with hyphens. Cyrillic is
//! transliterated letter-by-letter through a fixed mapping table and
//! common Latin diacritics are folded to their base letter before
//! everything else non-alphanumeric collapses to single hyphens.

use std::collections::HashSet;

/// Letter-by-letter Cyrillic transliteration table (lowercase input).
const CYRILLIC_TRANSLIT: [(char, &str); 33] = [
    ('а', "a"),
    ('б', "b"),
    ('в', "v"),
    ('г', "g"),
    ('д', "d"),
    ('е', "e"),
    ('ё', "yo"),
    ('ж', "zh"),
    ('з', "z"),
    ('и', "i"),
    ('й', "y"),
    ('к', "k"),
    ('л', "l"),
    ('м', "m"),
    ('н', "n"),
    ('о', "o"),
    ('п', "p"),
    ('р', "r"),
    ('с', "s"),
    ('т', "t"),
    ('у', "u"),
    ('ф', "f"),
    ('х', "kh"),
    ('ц', "ts"),
    ('ч', "ch"),
    ('ш', "sh"),
    ('щ', "shch"),
    ('ъ', ""),
    ('ы', "y"),
    ('ь', ""),
    ('э', "e"),
    ('ю', "yu"),
    ('я', "ya"),
];

/// Fold a lowercase Latin character with a diacritic to its base letter.
///
/// Covers the Latin-1 range that shows up in venue and artist names;
/// anything else non-ASCII is dropped by [`slugify`].
fn fold_latin(ch: char) -> Option<char> {
    let folded = match ch {
        'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' => 'a',
        'ç' => 'c',
        'è' | 'é' | 'ê' | 'ë' => 'e',
        'ì' | 'í' | 'î' | 'ï' => 'i',
        'ñ' => 'n',
        'ò' | 'ó' | 'ô' | 'õ' | 'ö' | 'ø' => 'o',
        'ù' | 'ú' | 'û' | 'ü' => 'u',
        'ý' | 'ÿ' => 'y',
        _ => return None,
    };
    Some(folded)
}

fn transliterate(ch: char) -> Option<&'static str> {
    CYRILLIC_TRANSLIT
        .iter()
        .find(|(c, _)| *c == ch)
        .map(|(_, s)| *s)
}

/// Generate a slug from a title.
///
/// Lowercases, transliterates Cyrillic, folds common Latin diacritics,
/// collapses every remaining non-alphanumeric run to a single hyphen, and
/// trims leading/trailing hyphens. Empty input yields empty output — the
/// caller must fall back to an id-based slug (see [`unique_slug`]).
#[must_use]
pub fn slugify(title: &str) -> String {
    let mut out = String::with_capacity(title.len());
    let mut pending_hyphen = false;

    for ch in title.to_lowercase().chars() {
        let mapped: Option<String> = if ch.is_ascii_alphanumeric() {
            Some(ch.to_string())
        } else if let Some(tr) = transliterate(ch) {
            // Hard/soft signs map to the empty string; they vanish
            // without forcing a hyphen.
            if tr.is_empty() {
                continue;
            }
            Some(tr.to_owned())
        } else {
            fold_latin(ch).map(|c| c.to_string())
        };

        match mapped {
            Some(s) => {
                if pending_hyphen && !out.is_empty() {
                    out.push('-');
                }
                pending_hyphen = false;
                out.push_str(&s);
            }
            None => pending_hyphen = true,
        }
    }

    out
}

/// Make `base` unique within `existing`, falling back to an id-based slug.
///
/// An empty `base` becomes `"<prefix>-<fallback_id>"`. A taken slug gets
/// `-2`, `-3`, … appended until an unused one is found.
#[must_use]
pub fn unique_slug(
    base: &str,
    prefix: &str,
    fallback_id: &str,
    existing: &HashSet<String>,
) -> String {
    let base = if base.is_empty() {
        format!("{prefix}-{fallback_id}")
    } else {
        base.to_owned()
    };

    if !existing.contains(&base) {
        return base;
    }
    let mut n = 2usize;
    loop {
        let candidate = format!("{base}-{n}");
        if !existing.contains(&candidate) {
            return candidate;
        }
        n += 1;
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
