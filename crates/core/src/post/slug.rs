//! Slug checks.
//!
//! A slug is used verbatim as a URL path segment, so it may only contain
//! RFC 3986 unreserved characters: ASCII letters and digits, `-`, `.`, `_`
//! and `~`. The dot segments `.` and `..` are rejected because they would
//! be normalized away by clients.

fn is_unreserved(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || matches!(ch, '-' | '.' | '_' | '~')
}

/// Whether `slug` can be placed in a URL path segment without escaping.
pub fn is_url_safe(slug: &str) -> bool {
    !slug.is_empty() && slug != "." && slug != ".." && slug.chars().all(is_unreserved)
}
