//! Flattened document model used for backward title attribution.
//!
//! The segmenter needs to find "the nearest bold/heading text before this
//! table", tolerating arbitrary intervening markup. Instead of walking the
//! live tree backwards, the document is flattened once into an ordered
//! sequence of typed nodes; the title lookup is then a linear reverse scan
//! over a slice, which is much easier to reason about and to test.

use crate::utils::norm;
use scraper::{ElementRef, Html};

/// A node of interest in document order. Markup that can never carry a
/// section title (paragraph runs, anchors, images, ...) is not recorded;
/// the reverse scan skips it implicitly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlatNode {
    /// A `<strong>` or `<b>` span, with normalized text.
    Bold(String),
    /// An `<h2>`/`<h3>`/`<h4>` heading, with normalized text.
    Heading(String),
    /// A `<table>`; the index matches the table's position among all tables
    /// in document order.
    Table(usize),
}

/// Flatten a parsed document into the ordered node sequence.
///
/// Table indices count every `<table>` element in document order, nested ones
/// included, matching the order a `table` selector yields.
pub fn flatten(doc: &Html) -> Vec<FlatNode> {
    let mut nodes = Vec::new();
    let mut table_idx = 0usize;

    for node in doc.root_element().descendants() {
        let Some(el) = ElementRef::wrap(node) else {
            continue;
        };
        match el.value().name() {
            "strong" | "b" => {
                nodes.push(FlatNode::Bold(norm(&el.text().collect::<String>())));
            }
            "h2" | "h3" | "h4" => {
                nodes.push(FlatNode::Heading(norm(&el.text().collect::<String>())));
            }
            "table" => {
                nodes.push(FlatNode::Table(table_idx));
                table_idx += 1;
            }
            _ => {}
        }
    }

    nodes
}

/// Position of the `table_idx`-th table within the flattened sequence.
pub fn table_position(nodes: &[FlatNode], table_idx: usize) -> Option<usize> {
    nodes
        .iter()
        .position(|n| matches!(n, FlatNode::Table(i) if *i == table_idx))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flatten_orders_nodes() {
        let html = r#"
            <article>
                <h2>Cronograma</h2>
                <p><strong>Resumo A</strong></p>
                <table><tr><td>x</td><td>y</td></tr></table>
                <p><b>Resumo B</b></p>
                <table><tr><td>z</td><td>w</td></tr></table>
            </article>
        "#;
        let doc = Html::parse_document(html);
        let nodes = flatten(&doc);

        assert_eq!(
            nodes,
            vec![
                FlatNode::Heading("Cronograma".to_string()),
                FlatNode::Bold("Resumo A".to_string()),
                FlatNode::Table(0),
                FlatNode::Bold("Resumo B".to_string()),
                FlatNode::Table(1),
            ]
        );
        assert_eq!(table_position(&nodes, 0), Some(2));
        assert_eq!(table_position(&nodes, 1), Some(4));
    }

    #[test]
    fn test_flatten_normalizes_text() {
        let html = "<b>  Resumo \n  Edital </b>";
        let doc = Html::parse_document(html);
        assert_eq!(flatten(&doc), vec![FlatNode::Bold("Resumo Edital".to_string())]);
    }

    #[test]
    fn test_bold_inside_table_comes_after_table_node() {
        // A bold span inside a cell must not be "before" its own table.
        let html = "<table><tr><td><strong>Dentro</strong></td><td>x</td></tr></table>";
        let doc = Html::parse_document(html);
        let nodes = flatten(&doc);
        assert_eq!(nodes[0], FlatNode::Table(0));
        assert_eq!(nodes[1], FlatNode::Bold("Dentro".to_string()));
    }
}
