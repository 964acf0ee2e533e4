//! Site scrapers.
//!
//! One publisher is tracked today, via [`portal`]. Each scraper follows the
//! same two-phase pattern:
//!
//! 1. **Indexing**: discover article URLs from the site's listing page
//! 2. **Fetching**: download individual articles (and banner images) for the
//!    extraction pipeline
//!
//! Scrapers own the HTTP client and all request policy (user agent, timeout,
//! politeness delay); the extraction pipeline never performs I/O.

pub mod portal;
