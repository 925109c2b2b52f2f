use std::path::Path;

use rusqlite::{params, Connection};
use tempfile::TempDir;

use ragdb_core::types::CorpusEntry;
use ragdb_corpus::{
    build_domain_prompt, load_corpus, load_corpus_async, load_corpus_with_report, rank, render_context, CorpusCache,
    Domain,
};

fn blob(v: &[f32]) -> Vec<u8> { v.iter().flat_map(|f| f.to_le_bytes()).collect() }

fn write_store(dir: &Path, rows: &[(&str, Vec<u8>)]) {
    std::fs::create_dir_all(dir).expect("mkdir");
    let conn = Connection::open(dir.join("chroma.sqlite3")).expect("open store");
    conn.execute_batch("CREATE TABLE embeddings_queue (seq_id INTEGER PRIMARY KEY, metadata TEXT, vector BLOB)")
        .expect("create table");
    for (meta, vector) in rows {
        conn.execute("INSERT INTO embeddings_queue (metadata, vector) VALUES (?1, ?2)", params![meta, vector])
            .expect("insert");
    }
}

fn entry(name: &str, content: &str) -> CorpusEntry {
    CorpusEntry { name: name.into(), content: content.into(), vector: vec![] }
}

#[test]
fn loads_entries_across_collections_in_name_order() {
    let tmp = TempDir::new().unwrap();
    write_store(
        &tmp.path().join("b-acts"),
        &[(r#"{"name":"Act B","chroma:document":"consumer protection"}"#, blob(&[0.0, 1.0]))],
    );
    write_store(
        &tmp.path().join("a-acts"),
        &[
            (r#"{"name":"Act A","chroma:document":"contract law basics"}"#, blob(&[1.0, 0.0])),
            (r#"{"name":"Act A2","chroma:document":"tort"}"#, blob(&[0.5, 0.5])),
        ],
    );

    let corpus = load_corpus(tmp.path());
    let names: Vec<&str> = corpus.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(names, vec!["Act A", "Act A2", "Act B"]);
    assert_eq!(corpus[0].content, "contract law basics");
    assert_eq!(corpus[0].vector, vec![1.0, 0.0]);
}

#[test]
fn corrupt_row_is_dropped_and_valid_row_kept() {
    let tmp = TempDir::new().unwrap();
    write_store(
        &tmp.path().join("legal"),
        &[
            ("{not json", blob(&[1.0])),
            (r#"{"name":"Good","chroma:document":"ok"}"#, blob(&[1.0, 2.0])),
            (r#"{"name":"Odd"}"#, vec![1, 2, 3]),
        ],
    );
    let (corpus, report) = load_corpus_with_report(tmp.path());
    assert_eq!(corpus.len(), 1);
    assert_eq!(corpus[0].name, "Good");
    assert_eq!(report.records_loaded, 1);
    assert_eq!(report.records_dropped, 2);
}

#[test]
fn missing_base_dir_yields_empty_corpus() {
    let tmp = TempDir::new().unwrap();
    assert!(load_corpus(&tmp.path().join("nope")).is_empty());
}

#[test]
fn read_failure_mid_scan_keeps_earlier_rows() {
    let tmp = TempDir::new().unwrap();
    let dir = tmp.path().join("statutes");
    std::fs::create_dir_all(&dir).unwrap();
    let store = dir.join("chroma.sqlite3");
    {
        let conn = Connection::open(&store).unwrap();
        conn.execute_batch(
            "PRAGMA page_size = 4096;
             CREATE TABLE embeddings_queue (seq_id INTEGER PRIMARY KEY, metadata TEXT, vector BLOB)",
        )
        .unwrap();
        let body = "x".repeat(1500);
        for i in 0..60 {
            let meta = format!(r#"{{"name":"Sec {i}","chroma:document":"{body}"}}"#);
            conn.execute("INSERT INTO embeddings_queue (metadata, vector) VALUES (?1, ?2)", params![meta, blob(&[1.0])])
                .unwrap();
        }
    }
    // Later rows live in the trailing leaf pages; clobber them.
    let mut bytes = std::fs::read(&store).unwrap();
    let len = bytes.len();
    bytes[len - 4 * 4096..].fill(0xFF);
    std::fs::write(&store, bytes).unwrap();

    let (corpus, report) = load_corpus_with_report(tmp.path());
    assert!(!corpus.is_empty());
    assert!(corpus.len() < 60);
    assert_eq!(corpus[0].name, "Sec 0");
    assert_eq!(report.collections_loaded, 1);
    assert_eq!(report.records_loaded, corpus.len());
}

#[test]
fn directories_without_usable_store_are_skipped() {
    let tmp = TempDir::new().unwrap();
    std::fs::create_dir_all(tmp.path().join("empty-dir")).unwrap();
    let no_table = tmp.path().join("no-table");
    std::fs::create_dir_all(&no_table).unwrap();
    Connection::open(no_table.join("chroma.sqlite3"))
        .unwrap()
        .execute_batch("CREATE TABLE other (x INTEGER)")
        .unwrap();
    write_store(&tmp.path().join("real"), &[(r#"{"name":"R","chroma:document":"x"}"#, blob(&[1.0]))]);
    std::fs::write(tmp.path().join("stray.txt"), "not a collection").unwrap();

    let (corpus, report) = load_corpus_with_report(tmp.path());
    assert_eq!(corpus.len(), 1);
    assert_eq!(report.collections_scanned, 3);
    assert_eq!(report.collections_loaded, 1);
}

#[test]
fn name_and_content_fall_back_when_metadata_lacks_them() {
    let tmp = TempDir::new().unwrap();
    write_store(&tmp.path().join("gst-rules"), &[("{}", blob(&[0.1]))]);
    let corpus = load_corpus(tmp.path());
    assert_eq!(corpus[0].name, "gst-rules");
    assert_eq!(corpus[0].content, "");
}

#[tokio::test]
async fn async_load_matches_blocking_load() {
    let tmp = TempDir::new().unwrap();
    write_store(&tmp.path().join("c"), &[(r#"{"name":"N","chroma:document":"d"}"#, blob(&[1.0]))]);
    let a = load_corpus_async(tmp.path().to_path_buf()).await;
    assert_eq!(a, load_corpus(tmp.path()));
}

#[test]
fn content_match_selects_only_relevant_entry() {
    let corpus = vec![entry("Act A", "contract law basics"), entry("Act B", "consumer protection")];
    let out = rank(&corpus, "contract", 15);
    assert_eq!(out.len(), 1);
    assert_eq!(out[0].entry.name, "Act A");
    assert_eq!(out[0].score, 1);
}

#[test]
fn ties_keep_corpus_order() {
    let corpus = vec![entry("one", "tax"), entry("two", "tax"), entry("three", "none"), entry("four", "tax")];
    let names: Vec<String> = rank(&corpus, "tax", 15).into_iter().map(|s| s.entry.name).collect();
    assert_eq!(names, vec!["one", "two", "four"]);
}

#[test]
fn blank_query_returns_leading_entries_unscored() {
    let corpus: Vec<CorpusEntry> = (0..20).map(|i| entry(&format!("e{i}"), "text")).collect();
    let out = rank(&corpus, "   ", 15);
    assert_eq!(out.len(), 15);
    assert_eq!(out[0].entry.name, "e0");
    assert!(out.iter().all(|s| s.score == 0));
}

#[test]
fn results_are_bounded_and_sorted() {
    let corpus: Vec<CorpusEntry> = (0..40)
        .map(|i| {
            let content = if i % 3 == 0 { "income tax return" } else if i % 3 == 1 { "tax" } else { "filing" };
            entry(&format!("doc {i}"), content)
        })
        .collect();
    let out = rank(&corpus, "income tax", 15);
    assert!(out.len() <= 15);
    assert!(out.windows(2).all(|w| w[0].score >= w[1].score));
    assert!(out.iter().all(|s| s.score > 0));
    assert_eq!(out[0].score, 2);
}

#[test]
fn cache_serves_snapshot_until_refreshed() {
    let tmp = TempDir::new().unwrap();
    write_store(&tmp.path().join("a"), &[(r#"{"name":"A","chroma:document":"x"}"#, blob(&[1.0]))]);
    let cache = CorpusCache::new();
    assert_eq!(cache.get_or_load(tmp.path()).len(), 1);

    write_store(&tmp.path().join("b"), &[(r#"{"name":"B","chroma:document":"y"}"#, blob(&[1.0]))]);
    assert_eq!(cache.get_or_load(tmp.path()).len(), 1);
    assert_eq!(cache.len(), 1);

    assert!(cache.refresh(tmp.path()));
    assert_eq!(cache.get_or_load(tmp.path()).len(), 2);
}

#[test]
fn cache_does_not_remember_missing_dirs() {
    let tmp = TempDir::new().unwrap();
    let base = tmp.path().join("later");
    let cache = CorpusCache::new();
    assert!(cache.get_or_load(&base).is_empty());
    assert!(cache.is_empty());

    write_store(&base.join("c"), &[(r#"{"name":"C","chroma:document":"z"}"#, blob(&[1.0]))]);
    assert_eq!(cache.get_or_load(&base).len(), 1);
}

#[test]
fn renders_ranked_entries_under_domain_preamble() {
    let ranked = rank(&[entry("Act A", "contract law basics")], "contract", 15);
    let legal = render_context(Domain::Legal, &ranked);
    assert!(legal.starts_with("You are a highly skilled AI Legal Assistant"));
    assert!(legal.ends_with("- Act A: contract law basics\n"));
    assert!(render_context(Domain::Finance, &[]).contains("finance knowledge sources"));
    assert_eq!("Finance".parse::<Domain>(), Ok(Domain::Finance));
    assert!("medical".parse::<Domain>().is_err());
}

#[test]
fn domain_prompt_carries_guidelines_contract_and_query() {
    let ranked = rank(&[entry("Act A", "contract law basics")], "contract", 15);

    let legal = build_domain_prompt(Domain::Legal, "  Is a verbal contract valid?  ", &ranked);
    assert!(legal.starts_with(&render_context(Domain::Legal, &ranked)));
    assert!(legal.contains("Your role and guidelines:"));
    assert!(legal.contains("\"suggestions\""));
    assert!(legal.contains("User's query:\n\"Is a verbal contract valid?\""));
    assert!(legal.trim_end().ends_with("Remember you are only allowed to give a JSON output."));

    let finance = build_domain_prompt(Domain::Finance, "add 500 for groceries", &ranked);
    let sources = finance.find("- Act A: contract law basics").expect("entries rendered");
    let query = finance.find("<user-query>").expect("query block");
    assert!(sources < query);
    assert!(finance.contains("\"task\""));
    assert!(finance.contains("User's query: add 500 for groceries\n</user-query>"));
    assert!(finance.contains("Do not include any text, markdown, or commentary outside the JSON."));
}
