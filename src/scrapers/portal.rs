//! Estratégia MED portal scraper.
//!
//! Indexes the first page of the portal's news listing and fetches article
//! bodies and banner images. Announcement posts live under
//! `/portal/noticias/`, so indexing simply keeps every listing anchor whose
//! href contains that path, canonicalized (query and fragment stripped) and
//! deduplicated in listing order.

use once_cell::sync::Lazy;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT_LANGUAGE};
use scraper::{Html, Selector};
use std::collections::HashSet;
use std::error::Error;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};
use url::Url;

static SELECTOR_ANCHOR: Lazy<Selector> = Lazy::new(|| Selector::parse("a[href]").unwrap());

/// Default news listing page.
pub const DEFAULT_LIST_URL: &str = "https://med.estrategia.com/portal/noticias/";
/// Path marker that identifies announcement posts in the listing.
const ARTICLE_PATH: &str = "/portal/noticias/";

/// Request policy and site coordinates, passed in at construction; the
/// scraper holds no global state.
#[derive(Debug, Clone)]
pub struct PortalConfig {
    /// Listing page to index.
    pub list_url: String,
    /// Host treated as "the source site" by official-link validation.
    pub site_host: String,
    /// User-Agent header sent with every request.
    pub user_agent: String,
    /// Maximum number of listed articles to check per run.
    pub limit: usize,
    /// Politeness delay between article fetches.
    pub delay: Duration,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl PortalConfig {
    /// Derive the site host from a listing URL, e.g.
    /// `https://med.estrategia.com/portal/noticias/` → `med.estrategia.com`.
    pub fn host_of(list_url: &str) -> Result<String, Box<dyn Error>> {
        let url = Url::parse(list_url)?;
        url.host_str()
            .map(|h| h.to_lowercase())
            .ok_or_else(|| format!("listing URL has no host: {list_url}").into())
    }
}

/// HTTP client for the portal: shared connection pool, fixed user agent,
/// pt-BR accept-language (the portal serves regional variants).
pub struct PortalClient {
    client: reqwest::Client,
    config: PortalConfig,
}

impl PortalClient {
    pub fn new(config: PortalConfig) -> Result<Self, Box<dyn Error>> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("pt-BR,pt;q=0.9"));
        let client = reqwest::Client::builder()
            .user_agent(&config.user_agent)
            .default_headers(headers)
            .timeout(config.timeout)
            .build()?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &PortalConfig {
        &self.config
    }

    /// Index the listing page and return up to `limit` canonical article
    /// URLs, deduplicated in listing order.
    #[instrument(level = "info", skip_all, fields(list_url = %self.config.list_url))]
    pub async fn index_articles(&self) -> Result<Vec<String>, Box<dyn Error>> {
        let base = Url::parse(&self.config.list_url)?;
        let body = self.get_text(&self.config.list_url).await?;

        let urls = index_from_html(&body, &base, self.config.limit);
        info!(count = urls.len(), "Indexed announcement URLs");
        debug!(?urls, "Portal URLs");
        Ok(urls)
    }

    /// Fetch one article body. Non-2xx statuses are errors; the caller skips
    /// the article and continues the batch.
    #[instrument(level = "debug", skip_all, fields(%url))]
    pub async fn fetch_article(&self, url: &str) -> Result<String, Box<dyn Error>> {
        self.get_text(url).await
    }

    /// Fetch banner image bytes. OCR is advisory, so every failure here is
    /// logged and collapsed to `None`.
    #[instrument(level = "debug", skip_all, fields(%url))]
    pub async fn fetch_image_bytes(&self, url: &str) -> Option<Vec<u8>> {
        let response = match self.client.get(url).send().await {
            Ok(r) => r,
            Err(e) => {
                warn!(error = %e, "Image fetch failed");
                return None;
            }
        };
        let response = match response.error_for_status() {
            Ok(r) => r,
            Err(e) => {
                warn!(error = %e, "Image fetch returned an error status");
                return None;
            }
        };
        match response.bytes().await {
            Ok(bytes) => Some(bytes.to_vec()),
            Err(e) => {
                warn!(error = %e, "Image body read failed");
                None
            }
        }
    }

    async fn get_text(&self, url: &str) -> Result<String, Box<dyn Error>> {
        let response = self.client.get(url).send().await?.error_for_status()?;
        Ok(response.text().await?)
    }
}

/// Pure listing parse, split out from the fetch for testability.
fn index_from_html(body: &str, base: &Url, limit: usize) -> Vec<String> {
    let doc = Html::parse_document(body);
    let mut seen = HashSet::new();
    let mut urls = Vec::new();

    for anchor in doc.select(&SELECTOR_ANCHOR) {
        if urls.len() >= limit {
            break;
        }
        let Some(href) = anchor.value().attr("href") else {
            continue;
        };
        if !href.contains(ARTICLE_PATH) {
            continue;
        }
        let Ok(mut resolved) = base.join(href) else {
            continue;
        };
        resolved.set_query(None);
        resolved.set_fragment(None);
        if !matches!(resolved.scheme(), "http" | "https") {
            continue;
        }
        let canonical = resolved.to_string();
        if seen.insert(canonical.clone()) {
            urls.push(canonical);
        }
    }

    urls
}
