//! Slug normalisation shared by posts, tags, categories and profiles.

use unicode_normalization::UnicodeNormalization;

/// Converts a human-readable title into a URL-safe slug.
///
/// The text is NFKD-decomposed and reduced to ASCII, so accented letters keep
/// their base letter (`ç` becomes `c`) while characters without an ASCII
/// decomposition are dropped. Anything that is not alphanumeric, `_`, `-` or
/// whitespace is removed, runs of whitespace and hyphens collapse into one `-`,
/// and leading or trailing `-`/`_` are stripped.
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut pending_separator = false;

    for c in text.nfkd().filter(char::is_ascii) {
        if c.is_ascii_alphanumeric() || c == '_' {
            if pending_separator && !slug.is_empty() {
                slug.push('-');
            }
            pending_separator = false;
            slug.push(c.to_ascii_lowercase());
        } else if c == '-' || c.is_ascii_whitespace() {
            pending_separator = true;
        }
    }

    slug.trim_matches(|c| c == '-' || c == '_').to_owned()
}
