//! Slug and identifier derivation
//!
//! Identifiers double as filenames: `YYYY-MM-DD-<slug>.md`.

use chrono::NaiveDate;

/// Extension shared by every record file
pub const RECORD_EXTENSION: &str = "md";

const FALLBACK_SLUG: &str = "untitled";

// ASCII `\s`: space, \t, \n, \v, \f, \r
fn is_slug_whitespace(ch: char) -> bool {
    matches!(ch, ' ' | '\t' | '\n' | '\u{0B}' | '\u{0C}' | '\r')
}

/// Generate slug from title
///
/// - Lowercase
/// - Drop everything except `a-z`, `0-9`, whitespace and `-`
/// - Collapse whitespace runs into a single dash
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut in_whitespace = false;

    for ch in title.chars().flat_map(char::to_lowercase) {
        if is_slug_whitespace(ch) {
            if !in_whitespace {
                slug.push('-');
                in_whitespace = true;
            }
            continue;
        }

        if ch.is_ascii_lowercase() || ch.is_ascii_digit() || ch == '-' {
            slug.push(ch);
            in_whitespace = false;
        }
    }

    slug
}

/// Build the record identifier for a title created on `date`.
///
/// Format: `YYYY-MM-DD-{slug}.md`
pub fn derive_identifier(title: &str, date: NaiveDate) -> String {
    let slug = slugify(title.trim());
    let slug = if slug.is_empty() { FALLBACK_SLUG } else { slug.as_str() };

    format!("{}-{}.{}", date.format("%Y-%m-%d"), slug, RECORD_EXTENSION)
}

/// Append a numeric suffix to an identifier's stem: `a.md` -> `a-2.md`
pub fn disambiguate(identifier: &str, attempt: usize) -> String {
    let (stem, ext) = split_extension(identifier);
    match ext {
        Some(ext) => format!("{stem}-{attempt}.{ext}"),
        None => format!("{stem}-{attempt}"),
    }
}

/// Split `name.ext` into (`name`, Some(`ext`)). Dotfiles have no extension.
pub fn split_extension(name: &str) -> (&str, Option<&str>) {
    match name.rfind('.') {
        Some(idx) if idx > 0 => (&name[..idx], Some(&name[idx + 1..])),
        _ => (name, None),
    }
}

/// Identifier without its extension
pub fn identifier_stem(identifier: &str) -> &str {
    split_extension(identifier).0
}
