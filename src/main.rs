//! # edital_watch
//!
//! Tracks medical-residency "edital" announcements on the Estratégia MED
//! portal and maintains a deduplicated JSON history of their summary tables.
//!
//! ## Features
//!
//! - Indexes the portal's news listing and fetches each announcement post
//! - Extracts every qualifying summary table as a titled section, attributing
//!   titles by backward-scanning the document for the nearest bold caption
//! - Resolves a human-facing display title and institutional acronym from
//!   "Nome (SIGLA)" pairs in the opening paragraphs, with the banner OCR
//!   candidate as a tie-breaker
//! - Validates the external link to the organizing body's official page
//! - Merges each run into `data/editais.json` keyed by article URL, without
//!   losing fields captured by earlier runs
//!
//! ## Usage
//!
//! ```sh
//! edital_watch --output data/editais.json --limit 30
//! ```
//!
//! ## Architecture
//!
//! One pass is a pipeline:
//! 1. **Indexing**: discover announcement URLs from the listing page
//! 2. **Extraction**: per article, segment tables, resolve names, validate
//!    the official link, and OCR the banner of accepted posts (sequential,
//!    with a politeness delay)
//! 3. **Merge**: one atomic, null-preserving upsert of the batch into the
//!    existing store, sorted descending by publication time
//!
//! No failure is fatal to the run; the worst outcome is an unchanged store.

use clap::Parser;
use scraper::Html;
use std::error::Error;
use std::time::Duration;
use tracing::{debug, error, info, instrument, warn};
use tracing_subscriber::{fmt as tfmt, EnvFilter};
use url::Url;

mod cli;
mod extract;
mod models;
mod ocr;
mod scrapers;
mod store;
mod utils;

use chrono::Utc;
use cli::Cli;
use models::Announcement;
use ocr::OcrEngine;
use scrapers::portal::{PortalClient, PortalConfig};

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("edital_watch starting up");

    let args = Cli::parse();
    debug!(?args.output, ?args.list_url, args.limit, "Parsed CLI arguments");

    let config = PortalConfig {
        site_host: PortalConfig::host_of(&args.list_url)?,
        list_url: args.list_url,
        user_agent: args.user_agent,
        limit: args.limit,
        delay: Duration::from_millis(args.delay_ms),
        timeout: Duration::from_secs(30),
    };
    let portal = PortalClient::new(config)?;

    let ocr = if args.no_ocr {
        info!("OCR disabled by flag");
        OcrEngine::disabled()
    } else {
        OcrEngine::detect()
    };

    // ---- Index the listing ----
    let urls = match portal.index_articles().await {
        Ok(urls) => urls,
        Err(e) => {
            // The store is still rewritten below, so a dead listing page
            // leaves the history exactly as it was.
            error!(error = %e, "Listing index failed; no articles this run");
            Vec::new()
        }
    };

    // ---- Process articles sequentially, with a politeness delay ----
    let mut new_items: Vec<Announcement> = Vec::new();
    for (i, url) in urls.iter().enumerate() {
        if i > 0 {
            tokio::time::sleep(portal.config().delay).await;
        }
        match process_article(&portal, &ocr, url).await {
            Ok(Some(announcement)) => {
                info!(
                    title = %announcement.nome,
                    sections = announcement.secoes.len(),
                    institution = ?announcement.instituicao,
                    "Captured announcement"
                );
                new_items.push(announcement);
            }
            Ok(None) => {}
            Err(e) => {
                warn!(%url, error = %e, "Article fetch failed; skipping");
            }
        }
    }
    info!(
        checked = urls.len(),
        captured = new_items.len(),
        "Extraction pass complete"
    );

    // ---- One atomic merge, then write the store back ----
    let existing = store::load_store(&args.output).await;
    let merged = store::merge(existing, new_items);
    store::write_store(&args.output, &merged).await?;

    let elapsed = start_time.elapsed();
    info!(?elapsed, records = merged.len(), "Execution complete");
    Ok(())
}

/// Fetch and extract one article.
///
/// `Ok(None)` means the document was fetched but rejected (no summary
/// tables, or no validated official link); the reason is logged here so the
/// caller only handles fetch errors. Banner download and OCR run only for
/// documents that passed both gates, since most listed posts are rejected.
async fn process_article(
    portal: &PortalClient,
    ocr: &OcrEngine,
    url: &str,
) -> Result<Option<Announcement>, Box<dyn Error>> {
    let parsed_url = Url::parse(url)?;
    let body = portal.fetch_article(url).await?;
    let doc = Html::parse_document(&body);

    let accepted = match extract::screen(&doc, &parsed_url, &portal.config().site_host) {
        Ok(accepted) => accepted,
        Err(rejection) => {
            info!(%url, reason = %rejection, "Discarded article");
            return Ok(None);
        }
    };

    // Accepted: the banner OCR candidate feeds name resolution.
    let mut ocr_candidate = None;
    if let Some(image_url) = extract::meta::image_url(&doc, &parsed_url) {
        if let Some(bytes) = portal.fetch_image_bytes(&image_url).await {
            ocr_candidate = ocr.candidate(&bytes);
        }
    }

    let captured_at = Utc::now().to_rfc3339();
    Ok(Some(extract::assemble(
        &doc,
        &parsed_url,
        accepted,
        ocr_candidate.as_deref(),
        captured_at,
    )))
}
