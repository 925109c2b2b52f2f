//! Aggregates pre-computed embeddings from per-domain Chroma stores.
//!
//! Layout: `<base>/<collection>/chroma.sqlite3`, one collection per immediate
//! subdirectory. Each store's `embeddings_queue` rows carry a JSON `metadata`
//! column and a `vector` blob of packed little-endian `f32`s. A bad row is
//! dropped; a store that cannot be opened is skipped, and one that fails
//! mid-scan keeps the rows read before the failure. A missing base directory
//! yields an empty corpus. Nothing here aborts the whole load.

use std::path::{Path, PathBuf};

use rusqlite::{Connection, OpenFlags, Row};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use ragdb_core::types::CorpusEntry;
use ragdb_core::{Error, Result};

pub const STORE_FILE: &str = "chroma.sqlite3";
pub const RECORDS_TABLE: &str = "embeddings_queue";
const DOCUMENT_KEY: &str = "chroma:document";
const NAME_KEY: &str = "name";

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("vector blob of {0} bytes is not a whole number of f32s")]
    Misaligned(usize),
    #[error("metadata is not valid JSON: {0}")]
    Metadata(#[from] serde_json::Error),
    #[error("column read failed: {0}")]
    Column(#[from] rusqlite::Error),
}

/// Counters for one load pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct LoadReport {
    pub collections_scanned: usize,
    pub collections_loaded: usize,
    pub records_loaded: usize,
    pub records_dropped: usize,
}

pub fn load_corpus(base_dir: &Path) -> Vec<CorpusEntry> { load_corpus_with_report(base_dir).0 }

/// Run the blocking load on tokio's blocking pool.
pub async fn load_corpus_async(base_dir: PathBuf) -> Vec<CorpusEntry> {
    match tokio::task::spawn_blocking(move || load_corpus(&base_dir)).await {
        Ok(entries) => entries,
        Err(e) => {
            warn!(error = %e, "corpus load task failed");
            Vec::new()
        }
    }
}

pub fn load_corpus_with_report(base_dir: &Path) -> (Vec<CorpusEntry>, LoadReport) {
    let mut report = LoadReport::default();
    let collections = match discover_collections(base_dir) {
        Ok(c) => c,
        Err(e) => {
            warn!(error = %e, "returning empty corpus");
            return (Vec::new(), report);
        }
    };
    debug!(base = %base_dir.display(), candidates = collections.len(), "discovered collections");

    let mut entries = Vec::new();
    for dir in collections {
        report.collections_scanned += 1;
        let store = dir.join(STORE_FILE);
        if !store.is_file() {
            debug!(dir = %dir.display(), "no store file, skipping");
            continue;
        }
        match load_collection(&dir, &store, &mut report) {
            Ok(Some(mut loaded)) => {
                report.collections_loaded += 1;
                report.records_loaded += loaded.len();
                entries.append(&mut loaded);
            }
            Ok(None) => info!(store = %store.display(), table = RECORDS_TABLE, "records table missing, skipping"),
            Err(e) => warn!(store = %store.display(), error = %e, "failed to read store, skipping"),
        }
    }
    info!(
        base = %base_dir.display(),
        records = report.records_loaded,
        dropped = report.records_dropped,
        collections = report.collections_loaded,
        "corpus loaded"
    );
    (entries, report)
}

/// Immediate subdirectories of `base_dir`, sorted by name.
pub fn discover_collections(base_dir: &Path) -> Result<Vec<PathBuf>> {
    if !base_dir.is_dir() {
        return Err(Error::CorpusUnavailable(base_dir.to_path_buf()));
    }
    Ok(WalkDir::new(base_dir)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_map(std::result::Result::ok)
        .filter(|e| e.file_type().is_dir())
        .map(walkdir::DirEntry::into_path)
        .collect())
}

/// `Ok(None)` when the store lacks the records table.
fn load_collection(dir: &Path, store: &Path, report: &mut LoadReport) -> rusqlite::Result<Option<Vec<CorpusEntry>>> {
    let conn = Connection::open_with_flags(store, OpenFlags::SQLITE_OPEN_READ_ONLY)?;
    if !has_table(&conn, RECORDS_TABLE)? {
        return Ok(None);
    }
    let fallback_name = dir.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();

    let mut stmt = conn.prepare(&format!("SELECT metadata, vector FROM {RECORDS_TABLE} ORDER BY rowid"))?;
    let mut rows = stmt.query([])?;
    let mut out = Vec::new();
    let mut row_no = 0usize;
    loop {
        let row = match rows.next() {
            Ok(Some(row)) => row,
            Ok(None) => break,
            Err(e) => {
                warn!(store = %store.display(), after_row = row_no, error = %e, "read failed, keeping rows decoded so far");
                break;
            }
        };
        row_no += 1;
        match decode_row(row, &fallback_name) {
            Ok(entry) => out.push(entry),
            Err(e) => {
                report.records_dropped += 1;
                warn!(store = %store.display(), row = row_no, error = %e, "dropping record");
            }
        }
    }
    Ok(Some(out))
}

fn has_table(conn: &Connection, name: &str) -> rusqlite::Result<bool> {
    let n: i64 = conn.query_row(
        "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
        [name],
        |r| r.get(0),
    )?;
    Ok(n > 0)
}

fn decode_row(row: &Row<'_>, fallback_name: &str) -> std::result::Result<CorpusEntry, DecodeError> {
    let metadata: String = row.get(0)?;
    let blob: Vec<u8> = row.get(1)?;
    let meta: Value = serde_json::from_str(&metadata)?;
    let vector = decode_vector(&blob)?;
    let content = meta.get(DOCUMENT_KEY).and_then(Value::as_str).unwrap_or_default().to_string();
    let name = meta
        .get(NAME_KEY)
        .and_then(Value::as_str)
        .filter(|n| !n.is_empty())
        .unwrap_or(fallback_name)
        .to_string();
    Ok(CorpusEntry { name, content, vector })
}

/// Decode tightly packed little-endian `f32`s.
pub fn decode_vector(bytes: &[u8]) -> std::result::Result<Vec<f32>, DecodeError> {
    if bytes.len() % 4 != 0 {
        return Err(DecodeError::Misaligned(bytes.len()));
    }
    Ok(bytes.chunks_exact(4).map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]])).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_packed_floats() {
        let bytes: Vec<u8> = [1.5f32, -2.0, 0.25].iter().flat_map(|f| f.to_le_bytes()).collect();
        assert_eq!(decode_vector(&bytes).expect("decode"), vec![1.5, -2.0, 0.25]);
        assert!(decode_vector(&[]).expect("empty").is_empty());
    }

    #[test]
    fn misaligned_blob_is_an_error() {
        assert!(matches!(decode_vector(&[0, 0, 128, 63, 1]), Err(DecodeError::Misaligned(5))));
    }
}
