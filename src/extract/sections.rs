//! Table section segmentation.
//!
//! Scans a parsed article for tables shaped like summary blocks (two or more
//! columns, at least two data rows after header stripping) and attaches a
//! title to each by scanning the flattened document backward for the nearest
//! preceding bold span or heading.
//!
//! # Title attribution
//!
//! The word "Aviso" is a recurring placeholder caption on the portal's notice
//! boxes and is never a real section title, so the backward scan skips it.
//! When no usable caption precedes a table the section falls back to the
//! generic `"Resumo"` title.

use crate::extract::document::{self, FlatNode};
use crate::models::Section;
use crate::utils::norm;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use tracing::debug;

/// Title given to a section when no caption precedes its table.
pub const DEFAULT_TITLE: &str = "Resumo";

static AVISO_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^\s*aviso\s*$").unwrap());

static SELECTOR_TABLE: Lazy<Selector> = Lazy::new(|| Selector::parse("table").unwrap());
static SELECTOR_TR: Lazy<Selector> = Lazy::new(|| Selector::parse("tr").unwrap());
static SELECTOR_CELL: Lazy<Selector> = Lazy::new(|| Selector::parse("td, th").unwrap());
static SELECTOR_TH: Lazy<Selector> = Lazy::new(|| Selector::parse("th").unwrap());

/// One `<tr>` before header resolution.
struct RawRow {
    cells: Vec<String>,
    has_th: bool,
    in_thead: bool,
}

/// Extract every qualifying table as a [`Section`], in document order.
///
/// A table qualifies when, after header stripping, it still has at least two
/// data rows and at least two columns. Rows are padded with empty strings to
/// the table's column count so each section is rectangular.
pub fn segment(doc: &Html) -> Vec<Section> {
    let flat = document::flatten(doc);
    let mut sections = Vec::new();

    for (idx, table) in doc.select(&SELECTOR_TABLE).enumerate() {
        let Some((headers, linhas)) = table_body(&table) else {
            continue;
        };
        let titulo = document::table_position(&flat, idx)
            .and_then(|pos| title_before(&flat, pos))
            .unwrap_or_else(|| DEFAULT_TITLE.to_string());
        debug!(table = idx, %titulo, rows = linhas.len(), "Accepted table section");
        sections.push(Section { titulo, headers, linhas });
    }

    sections
}

/// Reverse scan from the table's flattened position for the nearest usable
/// caption: the first bold span or heading whose normalized text is non-empty
/// and is not the "Aviso" placeholder.
fn title_before(nodes: &[FlatNode], table_pos: usize) -> Option<String> {
    nodes[..table_pos].iter().rev().find_map(|n| match n {
        FlatNode::Bold(t) | FlatNode::Heading(t) => {
            if !t.is_empty() && !AVISO_RE.is_match(t) {
                Some(t.clone())
            } else {
                None
            }
        }
        FlatNode::Table(_) => None,
    })
}

/// Collect a table's header and rectangular data rows, or `None` when the
/// table does not match the summary-table shape.
fn table_body(table: &ElementRef) -> Option<(Vec<String>, Vec<Vec<String>>)> {
    let mut raw_rows = Vec::new();
    for tr in table.select(&SELECTOR_TR) {
        let cells: Vec<String> = tr
            .select(&SELECTOR_CELL)
            .map(|cell| norm(&cell.text().collect::<String>()))
            .collect();
        if cells.iter().all(String::is_empty) {
            continue;
        }
        raw_rows.push(RawRow {
            has_th: tr.select(&SELECTOR_TH).next().is_some(),
            in_thead: inside_thead(&tr),
            cells,
        });
    }

    let columns = raw_rows.iter().map(|r| r.cells.len()).max().unwrap_or(0);
    if columns < 2 {
        return None;
    }

    // Header row: an explicit thead row, or the first row carrying th markup.
    let header_idx = raw_rows
        .iter()
        .position(|r| r.in_thead)
        .or_else(|| raw_rows.first().filter(|r| r.has_th).map(|_| 0));
    let headers = match header_idx {
        Some(i) => raw_rows.remove(i).cells,
        None => Vec::new(),
    };

    // A data row that merely repeats the header text is a rendering artifact.
    if !headers.is_empty() {
        raw_rows.retain(|r| !rows_equal_ci(&r.cells, &headers));
    }

    if raw_rows.len() < 2 {
        return None;
    }

    let linhas = raw_rows
        .into_iter()
        .map(|mut r| {
            r.cells.resize(columns, String::new());
            r.cells
        })
        .collect();
    Some((headers, linhas))
}

fn inside_thead(tr: &ElementRef) -> bool {
    for ancestor in tr.ancestors() {
        let Some(el) = ElementRef::wrap(ancestor) else {
            continue;
        };
        match el.value().name() {
            "thead" => return true,
            "table" => return false,
            _ => {}
        }
    }
    false
}

fn rows_equal_ci(a: &[String], b: &[String]) -> bool {
    a.len() == b.len()
        && a.iter()
            .zip(b)
            .all(|(x, y)| x.to_lowercase() == y.to_lowercase())
}
