//! Official-link validation.
//!
//! Each accepted announcement must point at the organizing body's own page.
//! The portal links it with a stock phrase ("página oficial da banca
//! organizadora / instituição / processo seletivo / seleção"), so validation
//! gates on the anchor text first and only then checks the target host.
//! Host-based heuristics alone would accept generic "leia mais" and social
//! share links that also point off-site.

use crate::utils::norm;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{Html, Selector};
use tracing::debug;
use url::Url;

/// Controlled phrase set, diacritic-tolerant (the portal is not consistent
/// about accents) and case-insensitive.
static ANCHOR_TEXT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)p[aá]gina oficial da (banca organizadora|institui[cç][aã]o|processo seletivo|sele[cç][aã]o)",
    )
    .unwrap()
});

static SELECTOR_ANCHOR: Lazy<Selector> = Lazy::new(|| Selector::parse("a[href]").unwrap());

/// Hosts that are never an organizing body.
const SOCIAL_HOSTS: [&str; 8] = [
    "facebook.com",
    "twitter.com",
    "t.me",
    "linkedin.com",
    "instagram.com",
    "wa.me",
    "tiktok.com",
    "x.com",
];

/// Find the validated external official link, if any.
///
/// Returns the first anchor (document order) whose visible text matches the
/// controlled phrase set and whose href resolves to a host that is non-empty,
/// not the source site's own, and not a known social-media host.
pub fn official_link(doc: &Html, base: &Url, site_host: &str) -> Option<String> {
    for anchor in doc.select(&SELECTOR_ANCHOR) {
        let text = norm(&anchor.text().collect::<String>());
        if !ANCHOR_TEXT_RE.is_match(&text) {
            continue;
        }
        let Some(href) = anchor.value().attr("href") else {
            continue;
        };
        let Ok(resolved) = base.join(href) else {
            continue;
        };
        let host = resolved.host_str().unwrap_or("").to_lowercase();
        if host.is_empty()
            || host.contains(site_host)
            || SOCIAL_HOSTS.iter().any(|s| host.contains(s))
        {
            debug!(%host, "Anchor text matched but host rejected");
            continue;
        }
        return Some(resolved.to_string());
    }
    None
}
