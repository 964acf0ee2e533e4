//! Command-line interface definitions for edital_watch.
//!
//! All options have defaults matching the tracked portal; the binary runs
//! with no arguments in the common case.

use clap::Parser;

/// Command-line arguments for the edital_watch application.
///
/// # Examples
///
/// ```sh
/// # Default run: index the portal, update data/editais.json
/// edital_watch
///
/// # Slower, smaller run against a custom store path
/// edital_watch -o /var/lib/editais.json --limit 10 --delay-ms 2000
///
/// # Skip OCR even when tesseract is installed
/// edital_watch --no-ocr
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Path of the JSON history store
    #[arg(short, long, default_value = "data/editais.json")]
    pub output: String,

    /// News listing page to index
    #[arg(long, default_value = crate::scrapers::portal::DEFAULT_LIST_URL)]
    pub list_url: String,

    /// Maximum number of listed articles to check per run
    #[arg(short, long, default_value_t = 30)]
    pub limit: usize,

    /// User-Agent header sent with every request
    #[arg(long, env = "EDITAL_WATCH_USER_AGENT", default_value = "ResidMedBot/1.9 (+contato: seu-email)")]
    pub user_agent: String,

    /// Politeness delay between article fetches, in milliseconds
    #[arg(long, default_value_t = 500)]
    pub delay_ms: u64,

    /// Disable OCR enrichment even when tesseract is installed
    #[arg(long)]
    pub no_ocr: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::parse_from(["edital_watch"]);
        assert_eq!(cli.output, "data/editais.json");
        assert_eq!(cli.limit, 30);
        assert_eq!(cli.delay_ms, 500);
        assert!(!cli.no_ocr);
        assert_eq!(cli.list_url, crate::scrapers::portal::DEFAULT_LIST_URL);
    }

    #[test]
    fn test_cli_overrides() {
        let cli = Cli::parse_from([
            "edital_watch",
            "-o",
            "/tmp/editais.json",
            "--limit",
            "5",
            "--no-ocr",
        ]);
        assert_eq!(cli.output, "/tmp/editais.json");
        assert_eq!(cli.limit, 5);
        assert!(cli.no_ocr);
    }
}
