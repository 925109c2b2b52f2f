use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Empty document: {0}")]
    EmptyDocument(String),

    #[error("Embedding failed: {0}")]
    EmbeddingFailure(String),

    #[error("Missing input: {0}")]
    MissingInput(&'static str),

    #[error("Index unavailable: {0}")]
    IndexUnavailable(String),

    /// An upsert failed part-way through a document. `indexed` records were
    /// written before the failure and remain in the index.
    #[error("Ingest stopped after {indexed} of {total} chunks: {reason}")]
    PartialIngest { indexed: usize, total: usize, reason: String },

    /// Base directory of a domain corpus does not exist. Loaders treat this
    /// as an empty corpus and only log it.
    #[error("Corpus unavailable: {}", .0.display())]
    CorpusUnavailable(PathBuf),

    #[error("Known-files registry: {0}")]
    Registry(String),

    #[error("Config: {0}")]
    Config(String),
}

impl Error {
    pub fn embedding(err: impl std::fmt::Display) -> Self { Self::EmbeddingFailure(err.to_string()) }

    pub fn index(err: impl std::fmt::Display) -> Self { Self::IndexUnavailable(err.to_string()) }
}

pub type Result<T> = std::result::Result<T, Error>;
