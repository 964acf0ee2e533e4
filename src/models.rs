//! Data models for extracted announcements and their persisted form.
//!
//! This module defines the core data structures used throughout the application:
//! - [`Announcement`]: One article's extracted structured content, keyed by URL
//! - [`Section`]: A recognized tabular block with a resolved title
//! - [`RowPair`]: A label/value row, the legacy two-column projection
//! - [`NamePair`]: A transient "Nome (SIGLA)" association harvested from body text
//!
//! The serde field names (`nome`, `secoes`, `linhas`, ...) match the JSON store
//! layout consumed by downstream clients, so renaming them is a breaking change.

use serde::{Deserialize, Serialize};

/// The persisted record representing one article's extracted content.
///
/// An `Announcement` is created transiently per extraction pass and then merged
/// into the persistent store by [`crate::store::merge`]. The `link` field is the
/// canonical article URL and the sole merge identity; two announcements with the
/// same `link` are the same entity.
///
/// Optional fields stay `None` when a pass could not resolve them; the merge is
/// null-preserving, so a later partial pass never erases previously captured
/// enrichment fields.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Announcement {
    /// Filesystem-safe identifier derived from the title (collision-tolerant).
    #[serde(default)]
    pub slug: String,
    /// Raw article title metadata.
    #[serde(default)]
    pub nome: String,
    /// Human-facing resolved name; may differ from `nome`.
    pub display_title: Option<String>,
    /// Short institutional label, typically an acronym.
    pub instituicao: Option<String>,
    /// Canonical article URL; unique identity, immutable once assigned.
    #[serde(default)]
    pub link: String,
    /// Banner image URL, when the article declares one.
    pub imagem: Option<String>,
    /// Compatibility projection of the first section when it is exactly two columns.
    #[serde(default)]
    pub dados: Vec<RowPair>,
    /// Every recognized tabular block, in document order.
    #[serde(default)]
    pub secoes: Vec<Section>,
    /// Validated external URL of the organizing body.
    pub link_banca: Option<String>,
    /// Source-declared publication time (ISO-8601-like string).
    pub posted_at: Option<String>,
    /// Extraction time (UTC, RFC 3339); always set on freshly extracted records.
    #[serde(default)]
    pub captured_at: String,
}

impl Announcement {
    /// Timestamp used for descending store ordering: `posted_at` when present,
    /// else `captured_at`. Both are ISO-8601-like, so they sort correctly as
    /// plain strings.
    pub fn sort_key(&self) -> &str {
        self.posted_at.as_deref().unwrap_or(&self.captured_at)
    }
}

/// One recognized tabular block within an article.
///
/// Invariants enforced by the segmenter:
/// - at least 2 data rows remain after header stripping;
/// - every row in `linhas` has the same length, equal to the section's
///   column count (rows are padded with empty strings).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Section {
    /// Resolved caption; defaults to `"Resumo"` when no caption is found.
    pub titulo: String,
    /// Header row cells, possibly empty when the table declares no header.
    #[serde(default)]
    pub headers: Vec<String>,
    /// Rectangular data rows.
    pub linhas: Vec<Vec<String>>,
}

impl Section {
    /// Column count of the rectangular row data (0 for an empty section,
    /// which the segmenter never materializes).
    pub fn column_count(&self) -> usize {
        self.linhas.first().map(Vec::len).unwrap_or(0)
    }
}

/// A label/value row. The legacy store exposed the first summary table as a
/// flat list of `{etapa, data}` objects; `dados` keeps that shape alive.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct RowPair {
    /// Row label, e.g. an exam stage.
    pub etapa: String,
    /// Row value, e.g. a date or date range.
    pub data: String,
}

/// A harvested "Nome (SIGLA)" association from the opening paragraphs.
///
/// Transient: never persisted directly. Its resolution feeds
/// [`Announcement::display_title`] and [`Announcement::instituicao`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamePair {
    /// Full institution name, case preserved as written.
    pub nome: String,
    /// Acronym as written, 2-10 uppercase letters, optionally hyphen-joined.
    pub sigla: String,
}

impl NamePair {
    /// The `"Nome (SIGLA)"` rendering used as a display title.
    pub fn display(&self) -> String {
        format!("{} ({})", self.nome, self.sigla)
    }
}
