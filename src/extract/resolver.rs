//! Name and acronym resolution.
//!
//! Announcements open with a sentence like "O Hospital das Clínicas (HC-UFMG)
//! publicou...". This module harvests those "Nome (SIGLA)" pairs from the
//! first paragraphs, reconciles them against the OCR banner candidate, and
//! decides the human-facing `display_title` plus the `instituicao` acronym.
//!
//! The OCR signal only disambiguates between textually harvested pairs; it is
//! never a source of truth by itself, because banner OCR is noisy while
//! parenthesized acronyms in body text are reliable.

use crate::models::NamePair;
use crate::utils::norm;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{Html, Selector};
use tracing::debug;

/// "Nome (SIGLA)": an uppercase-initial phrase of 3-120 non-parenthesis
/// characters followed by a parenthesized 2-10 letter acronym, optionally
/// hyphen-joined.
static NAME_SIGLA_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?P<nome>[A-ZÁÀÂÃÉÊÍÓÔÕÚÇ][^()]{2,120})\s*\(\s*(?P<sigla>[A-Z]{2,10}(?:-[A-Z]{2,10})*)\s*\)",
    )
    .unwrap()
});

/// Acronym grammar used to vet the OCR candidate.
static SIGLA_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Z]{2,10}(?:-[A-Z]{2,10})*$").unwrap());

/// Canonical section title: "Resumo [Edital] <entity> [<year>]", anchored.
static SECTION_TITLE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^\s*resumo\s+(?:edital\s+)?(?P<entity>.+?)(?:\s+\d{4})?\s*$").unwrap()
});

static AVISO_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^\s*aviso\s*$").unwrap());

static SELECTOR_ARTICLE_P: Lazy<Selector> =
    Lazy::new(|| Selector::parse("article p").unwrap());
static SELECTOR_P: Lazy<Selector> = Lazy::new(|| Selector::parse("p").unwrap());
static SELECTOR_BOLD: Lazy<Selector> = Lazy::new(|| Selector::parse("strong, b").unwrap());

/// Paragraphs scanned for "Nome (SIGLA)" pairs.
const PAIR_PARAGRAPHS: usize = 4;
/// Paragraphs scanned for the bold-span fallback.
const FALLBACK_PARAGRAPHS: usize = 6;

/// The resolved naming decision for one article.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Resolution {
    pub display_title: Option<String>,
    pub instituicao: Option<String>,
}

/// Does the text satisfy the acronym grammar (case-insensitive)?
pub fn looks_like_sigla(s: &str) -> bool {
    SIGLA_RE.is_match(&s.to_uppercase())
}

/// Extract the canonical entity name from a section title of the form
/// "Resumo [Edital] <entity> [<year>]", with internal whitespace collapsed.
pub fn canonical_entity(section_title: &str) -> Option<String> {
    SECTION_TITLE_RE
        .captures(section_title)
        .map(|c| norm(&c["entity"]))
        .filter(|e| !e.is_empty())
}

/// Harvest "Nome (SIGLA)" pairs from the first paragraphs of the article
/// body, in document order.
///
/// Within each paragraph, the concatenation of bold/strong spans is preferred
/// over the full paragraph text when present: institution names on this
/// portal are almost always bolded, and restricting to the bold text avoids
/// matches spilling across sentence boundaries.
pub fn harvest_pairs(doc: &Html) -> Vec<NamePair> {
    let mut pairs = Vec::new();

    for p in paragraphs(doc).into_iter().take(PAIR_PARAGRAPHS) {
        let bold_text = p
            .select(&SELECTOR_BOLD)
            .map(|el| el.text().collect::<String>())
            .collect::<Vec<_>>()
            .join(" ");
        let text = if norm(&bold_text).is_empty() {
            norm(&p.text().collect::<String>())
        } else {
            norm(&bold_text)
        };

        for caps in NAME_SIGLA_RE.captures_iter(&text) {
            let nome = norm(&caps["nome"]);
            let sigla = norm(&caps["sigla"]);
            let sigla_len = sigla.chars().count();
            if (2..=10).contains(&sigla_len) && nome.chars().count() >= 4 {
                pairs.push(NamePair { nome, sigla });
            }
        }
    }

    debug!(count = pairs.len(), "Harvested Nome (SIGLA) pairs");
    pairs
}

/// Decide `display_title` and `instituicao` for an article.
///
/// Priority for `display_title`:
/// 1. the canonical entity from the first section's title;
/// 2. the reconciled pair as "Nome (SIGLA)", or the bold-span fallback when
///    no pair was harvested;
/// 3. the raw article title.
///
/// `instituicao` is the reconciled pair's acronym; it stays unset when no
/// pair was harvested, even if OCR produced a candidate.
pub fn resolve(
    doc: &Html,
    ocr_candidate: Option<&str>,
    first_section_title: &str,
    raw_title: &str,
) -> Resolution {
    let pairs = harvest_pairs(doc);
    let picked = pick_pair(&pairs, ocr_candidate);

    let fallback = if picked.is_none() {
        first_bold_span(doc)
    } else {
        None
    };

    let display_title = canonical_entity(first_section_title)
        .or_else(|| picked.map(NamePair::display))
        .or(fallback)
        .or_else(|| Some(norm(raw_title)));

    Resolution {
        display_title,
        instituicao: picked.map(|p| p.sigla.clone()),
    }
}

/// Select the pair whose sigla equals the OCR candidate (case-insensitive),
/// when the candidate satisfies the acronym grammar; otherwise the first
/// pair in document order.
fn pick_pair<'a>(pairs: &'a [NamePair], ocr_candidate: Option<&str>) -> Option<&'a NamePair> {
    let ocr_sigla = ocr_candidate
        .filter(|c| looks_like_sigla(c))
        .map(str::to_uppercase);

    if let Some(sigla) = ocr_sigla {
        if let Some(hit) = pairs.iter().find(|p| p.sigla.to_uppercase() == sigla) {
            debug!(%sigla, "OCR candidate matched a harvested pair");
            return Some(hit);
        }
    }
    pairs.first()
}

/// First bold/strong span within the opening paragraphs whose normalized
/// text has at least 3 characters and is not the "Aviso" placeholder.
fn first_bold_span(doc: &Html) -> Option<String> {
    for p in paragraphs(doc).into_iter().take(FALLBACK_PARAGRAPHS) {
        for el in p.select(&SELECTOR_BOLD) {
            let text = norm(&el.text().collect::<String>());
            if text.chars().count() >= 3 && !AVISO_RE.is_match(&text) {
                return Some(text);
            }
        }
    }
    None
}

/// Paragraph-level nodes of the article body: `article p` when the article
/// element exists, else every `p` in the document.
fn paragraphs(doc: &Html) -> Vec<scraper::ElementRef<'_>> {
    let scoped: Vec<_> = doc.select(&SELECTOR_ARTICLE_P).collect();
    if scoped.is_empty() {
        doc.select(&SELECTOR_P).collect()
    } else {
        scoped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(html: &str) -> Html {
        Html::parse_document(html)
    }

    #[test]
    fn test_looks_like_sigla() {
        assert!(looks_like_sigla("HEX"));
        assert!(looks_like_sigla("hc-ufmg"));
        assert!(looks_like_sigla("SES-DF"));
        assert!(!looks_like_sigla("H"));
        assert!(!looks_like_sigla("HOSPITAL EXEMPLO"));
        assert!(!looks_like_sigla("ABCDEFGHIJK"));
        assert!(!looks_like_sigla(""));
    }

    #[test]
    fn test_canonical_entity_strips_year() {
        assert_eq!(
            canonical_entity("Resumo Edital Hospital Exemplo 2026"),
            Some("Hospital Exemplo".to_string())
        );
        assert_eq!(
            canonical_entity("Resumo Edital Hospital Exemplo"),
            Some("Hospital Exemplo".to_string())
        );
        assert_eq!(
            canonical_entity("resumo   Hospital   Exemplo"),
            Some("Hospital Exemplo".to_string())
        );
    }

    #[test]
    fn test_canonical_entity_rejects_other_titles() {
        assert_eq!(canonical_entity("Cronograma HEX"), None);
        assert_eq!(canonical_entity("Aviso"), None);
        // Anchored: "Resumo" must lead the title.
        assert_eq!(canonical_entity("Veja o Resumo Edital HEX"), None);
    }

    #[test]
    fn test_harvest_prefers_bold_text() {
        let html = r#"
            <article>
                <p>
                    Texto solto Errado Nome (XX) fora do negrito.
                    <strong>Hospital Exemplo (HEX)</strong>
                </p>
            </article>
        "#;
        let pairs = harvest_pairs(&doc(html));
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].nome, "Hospital Exemplo");
        assert_eq!(pairs[0].sigla, "HEX");
    }

    #[test]
    fn test_harvest_falls_back_to_paragraph_text() {
        let html = r#"
            <article>
                <p>O Hospital das Clínicas (HC-UFMG) divulgou o edital.</p>
            </article>
        "#;
        let pairs = harvest_pairs(&doc(html));
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].sigla, "HC-UFMG");
    }

    #[test]
    fn test_harvest_limited_to_opening_paragraphs() {
        let mut html = String::from("<article>");
        for _ in 0..4 {
            html.push_str("<p>parágrafo sem par.</p>");
        }
        html.push_str("<p><strong>Hospital Tardio (HT)</strong></p></article>");
        assert!(harvest_pairs(&doc(&html)).is_empty());
    }

    #[test]
    fn test_resolve_ocr_disambiguates_among_pairs() {
        let html = r#"
            <article>
                <p><strong>Secretaria de Saúde (SES) e Hospital Exemplo (HEX)</strong></p>
            </article>
        "#;
        let parsed = doc(html);

        // Without OCR: first pair wins.
        let res = resolve(&parsed, None, "Cronograma", "titulo cru");
        assert_eq!(res.display_title.as_deref(), Some("Secretaria de Saúde (SES)"));
        assert_eq!(res.instituicao.as_deref(), Some("SES"));

        // OCR candidate steers selection to the matching pair.
        let res = resolve(&parsed, Some("hex"), "Cronograma", "titulo cru");
        assert_eq!(res.display_title.as_deref(), Some("Hospital Exemplo (HEX)"));
        assert_eq!(res.instituicao.as_deref(), Some("HEX"));
    }

    #[test]
    fn test_resolve_ignores_non_sigla_ocr() {
        let html = r#"
            <article><p><strong>Hospital Exemplo (HEX)</strong></p></article>
        "#;
        let res = resolve(&doc(html), Some("HOSPITAL EXEMPLO"), "Cronograma", "cru");
        assert_eq!(res.instituicao.as_deref(), Some("HEX"));
    }

    #[test]
    fn test_resolve_section_title_canonicalization_wins() {
        let html = r#"
            <article><p><strong>Hospital Exemplo (HEX)</strong></p></article>
        "#;
        let res = resolve(&doc(html), None, "Resumo Edital Hospital Exemplo 2026", "cru");
        assert_eq!(res.display_title.as_deref(), Some("Hospital Exemplo"));
        // The acronym still comes from the harvested pair.
        assert_eq!(res.instituicao.as_deref(), Some("HEX"));
    }

    #[test]
    fn test_resolve_bold_fallback_when_no_pairs() {
        let html = r#"
            <article>
                <p><strong>Aviso</strong></p>
                <p><b>Hospital Sem Sigla</b> publicou o edital.</p>
            </article>
        "#;
        let res = resolve(&doc(html), None, "Cronograma", "cru");
        assert_eq!(res.display_title.as_deref(), Some("Hospital Sem Sigla"));
        assert!(res.instituicao.is_none());
    }

    #[test]
    fn test_resolve_raw_title_is_last_resort() {
        let html = "<article><p>sem negrito, sem par.</p></article>";
        let res = resolve(&doc(html), Some("HEX"), "Cronograma", "Saiu o edital!");
        assert_eq!(res.display_title.as_deref(), Some("Saiu o edital!"));
        // OCR alone never populates instituicao.
        assert!(res.instituicao.is_none());
    }
}
