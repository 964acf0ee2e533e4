//! The persistent announcement store and the record merger.
//!
//! The store is a single JSON array of [`Announcement`] records. Loading is
//! deliberately forgiving: a missing, unreadable, or malformed file is
//! treated as an empty store, and individual entries that fail to
//! deserialize or lack a key are skipped, so one bad entry never loses the
//! rest of the history.
//!
//! # Merge policy
//!
//! Union-style, null-preserving upsert keyed by the article URL: a new
//! non-null value overwrites, a new null (or empty) value never erases a
//! previously captured one. Later passes with partial extraction success
//! (say, OCR failed this run) therefore cannot drop enrichment fields
//! captured earlier.

use crate::models::Announcement;
use std::collections::HashMap;
use std::error::Error;
use std::path::Path;
use tokio::fs;
use tracing::{info, instrument, warn};

/// Read the existing store, treating every failure mode as an empty store.
#[instrument(level = "info", skip_all, fields(path = %path))]
pub async fn load_store(path: &str) -> Vec<Announcement> {
    let text = match fs::read_to_string(path).await {
        Ok(text) => text,
        Err(_) => {
            info!("No existing store; starting empty");
            return Vec::new();
        }
    };

    let values = match serde_json::from_str::<serde_json::Value>(&text) {
        Ok(serde_json::Value::Array(values)) => values,
        Ok(_) => {
            warn!("Store is not a JSON array; treating as empty");
            return Vec::new();
        }
        Err(e) => {
            warn!(error = %e, "Store is unreadable JSON; treating as empty");
            return Vec::new();
        }
    };

    let total = values.len();
    let records: Vec<Announcement> = values
        .into_iter()
        .filter_map(|v| serde_json::from_value::<Announcement>(v).ok())
        .filter(|a| !a.link.is_empty())
        .collect();
    if records.len() < total {
        warn!(
            skipped = total - records.len(),
            kept = records.len(),
            "Skipped malformed store entries"
        );
    } else {
        info!(count = records.len(), "Loaded existing store");
    }
    records
}

/// Upsert a batch of freshly extracted records into the existing store and
/// return the new ordered sequence.
///
/// Records are keyed by `link`; the result is sorted descending by
/// `posted_at` (falling back to `captured_at`) using lexical comparison,
/// which is correct for ISO-8601-like timestamps. The sort is stable, so
/// ties keep insertion order: existing records first, then new keys in
/// batch order.
pub fn merge(existing: Vec<Announcement>, new_items: Vec<Announcement>) -> Vec<Announcement> {
    let mut order: Vec<String> = Vec::new();
    let mut by_key: HashMap<String, Announcement> = HashMap::new();

    for record in existing {
        if record.link.is_empty() {
            continue;
        }
        if !by_key.contains_key(&record.link) {
            order.push(record.link.clone());
        }
        by_key.insert(record.link.clone(), record);
    }

    for item in new_items {
        if item.link.is_empty() {
            continue;
        }
        match by_key.get_mut(&item.link) {
            Some(prev) => merge_record(prev, item),
            None => {
                order.push(item.link.clone());
                by_key.insert(item.link.clone(), item);
            }
        }
    }

    let mut merged: Vec<Announcement> = order
        .into_iter()
        .filter_map(|key| by_key.remove(&key))
        .collect();
    merged.sort_by(|a, b| b.sort_key().cmp(a.sort_key()));
    merged
}

/// Field-level union: a populated value from `item` overwrites, an absent
/// one keeps whatever `prev` already had.
fn merge_record(prev: &mut Announcement, item: Announcement) {
    fn keep_string(slot: &mut String, value: String) {
        if !value.is_empty() {
            *slot = value;
        }
    }
    fn keep_option(slot: &mut Option<String>, value: Option<String>) {
        if value.is_some() {
            *slot = value;
        }
    }

    keep_string(&mut prev.slug, item.slug);
    keep_string(&mut prev.nome, item.nome);
    keep_string(&mut prev.captured_at, item.captured_at);
    keep_option(&mut prev.display_title, item.display_title);
    keep_option(&mut prev.instituicao, item.instituicao);
    keep_option(&mut prev.imagem, item.imagem);
    keep_option(&mut prev.link_banca, item.link_banca);
    keep_option(&mut prev.posted_at, item.posted_at);
    if !item.dados.is_empty() {
        prev.dados = item.dados;
    }
    if !item.secoes.is_empty() {
        prev.secoes = item.secoes;
    }
}

/// Write the full merged sequence back as the new store contents, creating
/// parent directories as needed. Always called at the end of a run, even
/// when the sequence is empty, so a run never leaves no output file.
#[instrument(level = "info", skip_all, fields(path = %path, count = records.len()))]
pub async fn write_store(path: &str, records: &[Announcement]) -> Result<(), Box<dyn Error>> {
    if let Some(parent) = Path::new(path).parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).await?;
        }
    }
    let json = serde_json::to_string_pretty(records)?;
    fs::write(path, json).await?;
    info!("Wrote store");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(link: &str, posted: Option<&str>, captured: &str) -> Announcement {
        Announcement {
            link: link.to_string(),
            posted_at: posted.map(str::to_string),
            captured_at: captured.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_merge_orders_descending_by_timestamp() {
        let merged = merge(
            vec![
                record("https://a/", Some("2024-01-01"), "2024-01-01T01:00:00Z"),
                record("https://b/", Some("2024-01-02"), "2024-01-02T01:00:00Z"),
            ],
            vec![record("https://c/", None, "2024-01-03")],
        );
        let links: Vec<&str> = merged.iter().map(|a| a.link.as_str()).collect();
        // "c" sorts by its captured_at since it has no posted_at.
        assert_eq!(links, vec!["https://c/", "https://b/", "https://a/"]);
    }

    #[test]
    fn test_merge_null_preservation() {
        let mut prev = record("https://a/", None, "2024-01-01T00:00:00Z");
        prev.instituicao = Some("HEX".to_string());
        prev.link_banca = Some("https://banca.example.org/".to_string());

        let mut item = record("https://a/", None, "2024-01-02T00:00:00Z");
        item.link_banca = Some("https://banca.example.org/".to_string());
        // instituicao stays None on the new record: OCR failed this run.

        let merged = merge(vec![prev], vec![item]);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].instituicao.as_deref(), Some("HEX"));
        assert_eq!(merged[0].link_banca.as_deref(), Some("https://banca.example.org/"));
        // Fresh non-null values did overwrite.
        assert_eq!(merged[0].captured_at, "2024-01-02T00:00:00Z");
    }

    #[test]
    fn test_merge_empty_string_and_vec_never_erase() {
        use crate::models::{RowPair, Section};

        let mut prev = record("https://a/", None, "2024-01-01T00:00:00Z");
        prev.slug = "resumo-edital-hex".to_string();
        prev.nome = "Saiu o edital HEX".to_string();
        prev.dados = vec![RowPair {
            etapa: "Inscrições".to_string(),
            data: "01/01".to_string(),
        }];
        prev.secoes = vec![Section {
            titulo: "Resumo".to_string(),
            headers: vec![],
            linhas: vec![
                vec!["Inscrições".to_string(), "01/01".to_string()],
                vec!["Prova".to_string(), "15/02".to_string()],
            ],
        }];

        // A later pass where the first section stopped being two-column
        // (empty dados) and a sparse legacy-shaped entry (empty slug/secoes).
        let item = record("https://a/", None, "2024-01-02T00:00:00Z");
        assert!(item.slug.is_empty() && item.dados.is_empty() && item.secoes.is_empty());

        let merged = merge(vec![prev], vec![item]);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].slug, "resumo-edital-hex");
        assert_eq!(merged[0].nome, "Saiu o edital HEX");
        assert_eq!(merged[0].dados.len(), 1);
        assert_eq!(merged[0].secoes.len(), 1);
        assert_eq!(merged[0].secoes[0].linhas.len(), 2);
        // The fresh timestamp still lands.
        assert_eq!(merged[0].captured_at, "2024-01-02T00:00:00Z");
    }

    #[test]
    fn test_merge_new_non_null_overwrites() {
        let mut prev = record("https://a/", None, "2024-01-01T00:00:00Z");
        prev.instituicao = Some("VELHA".to_string());
        let mut item = record("https://a/", None, "2024-01-02T00:00:00Z");
        item.instituicao = Some("NOVA".to_string());

        let merged = merge(vec![prev], vec![item]);
        assert_eq!(merged[0].instituicao.as_deref(), Some("NOVA"));
    }

    #[test]
    fn test_merge_is_idempotent() {
        let batch = vec![
            record("https://a/", Some("2024-01-01"), "2024-01-05T00:00:00Z"),
            record("https://b/", Some("2024-01-02"), "2024-01-05T00:00:00Z"),
        ];
        let once = merge(Vec::new(), batch.clone());
        let twice = merge(once.clone(), batch);

        assert_eq!(once.len(), 2);
        assert_eq!(twice.len(), 2);
        for (a, b) in once.iter().zip(&twice) {
            assert_eq!(a.link, b.link);
            assert_eq!(a.posted_at, b.posted_at);
            assert_eq!(a.captured_at, b.captured_at);
        }
    }

    #[test]
    fn test_merge_no_duplicate_keys() {
        let merged = merge(
            vec![record("https://a/", None, "2024-01-01T00:00:00Z")],
            vec![
                record("https://a/", None, "2024-01-02T00:00:00Z"),
                record("https://a/", None, "2024-01-03T00:00:00Z"),
            ],
        );
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].captured_at, "2024-01-03T00:00:00Z");
    }

    #[test]
    fn test_merge_skips_keyless_records() {
        let merged = merge(
            vec![record("", None, "2024-01-01T00:00:00Z")],
            vec![record("", None, "2024-01-02T00:00:00Z")],
        );
        assert!(merged.is_empty());
    }

    #[tokio::test]
    async fn test_load_store_tolerates_missing_and_malformed() {
        assert!(load_store("/nonexistent/editais.json").await.is_empty());

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("editais.json");
        let path_str = path.to_str().unwrap();

        tokio::fs::write(&path, "{ not json").await.unwrap();
        assert!(load_store(path_str).await.is_empty());

        tokio::fs::write(&path, r#"{"um": "objeto"}"#).await.unwrap();
        assert!(load_store(path_str).await.is_empty());

        tokio::fs::write(&path, r#"[{"link": "https://a/"}, {"link": ""}, 42]"#)
            .await
            .unwrap();
        let records = load_store(path_str).await;
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].link, "https://a/");
    }

    #[tokio::test]
    async fn test_write_store_round_trip_creates_parents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data/editais.json");
        let path_str = path.to_str().unwrap();

        let records = vec![record("https://a/", Some("2024-01-01"), "2024-01-02T00:00:00Z")];
        write_store(path_str, &records).await.unwrap();

        let loaded = load_store(path_str).await;
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].link, "https://a/");

        // An empty run still leaves a valid (empty) store behind.
        write_store(path_str, &[]).await.unwrap();
        assert!(load_store(path_str).await.is_empty());
    }
}
