//! ragdb-corpus
//!
//! Per-domain knowledge corpora: loading pre-computed embeddings from Chroma
//! stores on disk, lexical ranking against a query, an explicit-invalidation
//! cache, and rendering ranked entries into prompt context.

pub mod cache;
pub mod context;
pub mod loader;
pub mod scorer;

pub use cache::CorpusCache;
pub use context::{build_domain_prompt, render_context, Domain};
pub use loader::{load_corpus, load_corpus_async, load_corpus_with_report, LoadReport};
pub use scorer::{rank, DEFAULT_TOP_K};
