//! Content extraction pipeline for one article document.
//!
//! The chain runs Segmenter → Resolver → Link Validator over an
//! already-parsed document and assembles an [`Announcement`], or rejects the
//! document with a [`Rejection`] reason. Fetching, OCR scheduling, and
//! persistence live elsewhere; this module is pure with respect to I/O.
//!
//! # Acceptance contract
//!
//! The strict contract applies: a document is accepted only when it yields at
//! least one qualifying table section **and** a validated external official
//! link. An OCR banner match alone never accepts a document; OCR is
//! enrichment only.
//!
//! Acceptance is split from assembly ([`screen`] then [`assemble`]) so the
//! caller can run both rejection gates before paying for banner download and
//! OCR. Rejected documents never trigger either.

pub mod document;
pub mod links;
pub mod meta;
pub mod resolver;
pub mod sections;

use crate::models::{Announcement, RowPair, Section};
use crate::utils::slugify;
use scraper::Html;
use thiserror::Error;
use tracing::debug;
use url::Url;

/// Why a document produced no announcement. Not an error: rejected documents
/// are logged and skipped, never abort the batch.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum Rejection {
    /// No table matched the summary-table shape.
    #[error("sem tabelas no padrão: {title}")]
    NoSections {
        /// Article title, for the skip log line.
        title: String,
    },
    /// No anchor passed official-link validation.
    #[error("link da banca ausente: {title}")]
    NoOfficialLink {
        /// Article title, for the skip log line.
        title: String,
    },
}

/// A document that passed both rejection gates and is ready for (possibly
/// OCR-enriched) assembly.
#[derive(Debug)]
pub struct AcceptedDocument {
    title: String,
    secoes: Vec<Section>,
    link_banca: String,
}

/// Run both rejection gates over one parsed article document.
///
/// No enrichment happens here; a rejected document costs nothing beyond the
/// table scan and the anchor scan.
pub fn screen(doc: &Html, url: &Url, site_host: &str) -> Result<AcceptedDocument, Rejection> {
    let title = meta::page_title(doc, url);

    let secoes = sections::segment(doc);
    if secoes.is_empty() {
        return Err(Rejection::NoSections { title });
    }

    let Some(link_banca) = links::official_link(doc, url, site_host) else {
        return Err(Rejection::NoOfficialLink { title });
    };

    Ok(AcceptedDocument { title, secoes, link_banca })
}

/// Assemble the final [`Announcement`] for an already-accepted document.
///
/// `ocr_candidate` is the banner label computed after acceptance (the OCR
/// extractor runs outside this function because it needs the image fetcher);
/// `captured_at` is the extraction timestamp recorded on the record.
pub fn assemble(
    doc: &Html,
    url: &Url,
    accepted: AcceptedDocument,
    ocr_candidate: Option<&str>,
    captured_at: String,
) -> Announcement {
    let AcceptedDocument { title, secoes, link_banca } = accepted;

    let resolution = resolver::resolve(doc, ocr_candidate, &secoes[0].titulo, &title);
    let dados = primary_rows(&secoes[0]);
    debug!(
        sections = secoes.len(),
        display_title = ?resolution.display_title,
        "Assembled announcement"
    );

    Announcement {
        slug: slugify(&title),
        nome: title,
        display_title: resolution.display_title,
        instituicao: resolution.instituicao,
        link: url.to_string(),
        imagem: meta::image_url(doc, url),
        dados,
        secoes,
        link_banca: Some(link_banca),
        posted_at: meta::posted_at(doc),
        captured_at,
    }
}

/// [`screen`] and [`assemble`] in one call, for callers that already hold the
/// OCR candidate.
pub fn extract_announcement(
    doc: &Html,
    url: &Url,
    site_host: &str,
    ocr_candidate: Option<&str>,
    captured_at: String,
) -> Result<Announcement, Rejection> {
    let accepted = screen(doc, url, site_host)?;
    Ok(assemble(doc, url, accepted, ocr_candidate, captured_at))
}

/// Legacy projection: the first section as label/value pairs, only when it is
/// exactly two columns wide.
fn primary_rows(first: &Section) -> Vec<RowPair> {
    if first.column_count() != 2 {
        return Vec::new();
    }
    first
        .linhas
        .iter()
        .map(|row| RowPair {
            etapa: row[0].clone(),
            data: row[1].clone(),
        })
        .collect()
}
