//! Text normalization helpers shared across the extraction pipeline.
//!
//! Two leaf utilities live here:
//! - [`norm`]: whitespace collapsing, applied to every piece of text pulled
//!   out of a document before it is compared or stored
//! - [`slugify`]: filesystem-safe identifiers derived from titles, with a
//!   content-hash fallback for titles that normalize to nothing

use once_cell::sync::Lazy;
use regex::Regex;

static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());
static NON_SLUG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^a-z0-9]+").unwrap());

/// Collapse every whitespace run to a single space and trim the ends.
///
/// Cell texts, anchor texts, and captions all pass through here so that
/// comparisons (header duplicates, denylist words) see a canonical form.
pub fn norm(s: &str) -> String {
    WHITESPACE_RE.replace_all(s.trim(), " ").into_owned()
}

/// Convert a title to a URL- and filesystem-safe slug.
///
/// Lowercases, replaces non-alphanumeric runs with hyphens, trims hyphens,
/// and caps the result at 80 characters. A title that slugifies to nothing
/// (symbols only, non-latin script) falls back to the first 10 hex characters
/// of the MD5 of the original text, so the slug is never empty.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(slugify("Saiu o edital!  HEX 2026"), "saiu-o-edital-hex-2026");
/// ```
pub fn slugify(s: &str) -> String {
    let lowered = norm(s).to_lowercase();
    let base: String = NON_SLUG_RE
        .replace_all(&lowered, "-")
        .trim_matches('-')
        .chars()
        .take(80)
        .collect();
    if base.is_empty() {
        let digest = format!("{:x}", md5::compute(s.as_bytes()));
        digest[..10].to_string()
    } else {
        base
    }
}
