//! ragdb-upload
//!
//! User-uploaded documents: chunk, embed and upsert into a vector index
//! ([`UploadIndexer`]), answer questions scoped to one document
//! ([`QueryRouter`]), and track which documents have been ingested
//! ([`KnownFiles`]).

pub mod ingest;
pub mod query;
pub mod registry;

pub use ingest::UploadIndexer;
pub use query::{build_document_prompt, DocumentAnswer, DEFAULT_DOCUMENT_TOP_K, PromptMode, QueryRouter, NO_RELEVANT_INFORMATION};
pub use registry::KnownFiles;
