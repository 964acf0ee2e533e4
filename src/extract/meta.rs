//! Article-level metadata: title, banner image, publication time.
//!
//! Each value falls through a small chain, most structured source first:
//! Open Graph tags, then in-page markup, then (for the title) the URL itself.

use crate::utils::norm;
use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use url::Url;

static SELECTOR_OG_TITLE: Lazy<Selector> =
    Lazy::new(|| Selector::parse(r#"meta[property="og:title"]"#).unwrap());
static SELECTOR_OG_IMAGE: Lazy<Selector> =
    Lazy::new(|| Selector::parse(r#"meta[property="og:image"]"#).unwrap());
static SELECTOR_H1_H2: Lazy<Selector> = Lazy::new(|| Selector::parse("h1, h2").unwrap());
static SELECTOR_IMG: Lazy<Selector> = Lazy::new(|| Selector::parse("img[src]").unwrap());
static SELECTOR_PUBLISHED_PROP: Lazy<Selector> =
    Lazy::new(|| Selector::parse(r#"meta[property="article:published_time"]"#).unwrap());
static SELECTOR_PUBLISHED_NAME: Lazy<Selector> =
    Lazy::new(|| Selector::parse(r#"meta[name="article:published_time"]"#).unwrap());
static SELECTOR_TIME_PUBLISHED: Lazy<Selector> =
    Lazy::new(|| Selector::parse(r#"time[itemprop="datePublished"]"#).unwrap());

/// Article title: `og:title`, else the first `h1`/`h2`, else the URL.
pub fn page_title(doc: &Html, url: &Url) -> String {
    let og = doc
        .select(&SELECTOR_OG_TITLE)
        .next()
        .and_then(|el| el.value().attr("content"))
        .map(norm)
        .filter(|t| !t.is_empty());
    if let Some(title) = og {
        return title;
    }

    let heading = doc
        .select(&SELECTOR_H1_H2)
        .next()
        .map(|el| norm(&el.text().collect::<String>()))
        .filter(|t| !t.is_empty());
    heading.unwrap_or_else(|| url.to_string())
}

/// Banner image URL: `og:image`, else the first `<img src>` resolved
/// against the article URL.
pub fn image_url(doc: &Html, base: &Url) -> Option<String> {
    let og = doc
        .select(&SELECTOR_OG_IMAGE)
        .next()
        .and_then(|el| el.value().attr("content"))
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(str::to_string);
    if og.is_some() {
        return og;
    }

    doc.select(&SELECTOR_IMG)
        .next()
        .and_then(|el| el.value().attr("src"))
        .and_then(|src| base.join(src).ok())
        .map(|u| u.to_string())
}

/// Source-declared publication time, from `article:published_time` meta tags
/// or a `time[itemprop=datePublished]` element. `None` when absent or empty.
pub fn posted_at(doc: &Html) -> Option<String> {
    let meta_content = doc
        .select(&SELECTOR_PUBLISHED_PROP)
        .next()
        .or_else(|| doc.select(&SELECTOR_PUBLISHED_NAME).next())
        .and_then(|el| el.value().attr("content"));

    let value = meta_content.or_else(|| {
        doc.select(&SELECTOR_TIME_PUBLISHED).next().and_then(|el| {
            el.value()
                .attr("content")
                .or_else(|| el.value().attr("datetime"))
        })
    });

    value.map(str::trim).filter(|v| !v.is_empty()).map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url() -> Url {
        Url::parse("https://med.example.com/portal/noticias/post/").unwrap()
    }

    #[test]
    fn test_title_prefers_og() {
        let html = r#"
            <head><meta property="og:title" content="  Saiu o edital  HEX "/></head>
            <body><h1>Outro título</h1></body>
        "#;
        let doc = Html::parse_document(html);
        assert_eq!(page_title(&doc, &url()), "Saiu o edital HEX");
    }

    #[test]
    fn test_title_falls_back_to_heading_then_url() {
        let doc = Html::parse_document("<h2>Título do post</h2>");
        assert_eq!(page_title(&doc, &url()), "Título do post");

        let empty = Html::parse_document("<p>nada</p>");
        assert_eq!(page_title(&empty, &url()), url().to_string());
    }

    #[test]
    fn test_image_og_then_first_img() {
        let html = r#"<meta property="og:image" content="https://cdn.example.com/banner.png"/>"#;
        let doc = Html::parse_document(html);
        assert_eq!(
            image_url(&doc, &url()),
            Some("https://cdn.example.com/banner.png".to_string())
        );

        let doc = Html::parse_document(r#"<img src="../banner.jpg"/>"#);
        assert_eq!(
            image_url(&doc, &url()),
            Some("https://med.example.com/portal/noticias/banner.jpg".to_string())
        );

        let doc = Html::parse_document("<p>sem imagem</p>");
        assert_eq!(image_url(&doc, &url()), None);
    }

    #[test]
    fn test_posted_at_chain() {
        let doc = Html::parse_document(
            r#"<meta property="article:published_time" content="2026-01-01T12:00:00+00:00"/>"#,
        );
        assert_eq!(posted_at(&doc), Some("2026-01-01T12:00:00+00:00".to_string()));

        let doc = Html::parse_document(
            r#"<time itemprop="datePublished" datetime="2026-01-02">2 de janeiro</time>"#,
        );
        assert_eq!(posted_at(&doc), Some("2026-01-02".to_string()));

        let doc = Html::parse_document(r#"<meta name="article:published_time" content="  "/>"#);
        assert_eq!(posted_at(&doc), None);
    }
}
