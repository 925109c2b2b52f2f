//! Domain types shared by the corpus and upload paths.

use serde::{Deserialize, Serialize};

/// A contiguous slice of a source document.
///
/// - `content`: the text payload, never empty
/// - `source_name`: logical document identity (usually the uploaded file name)
/// - `index`: position among the chunks of `source_name`, gapless from 0
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    pub content: String,
    pub source_name: String,
    pub index: usize,
}

/// One pre-computed knowledge item loaded from a per-domain store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorpusEntry {
    pub name: String,
    pub content: String,
    pub vector: Vec<f32>,
}

/// A corpus entry annotated with its lexical relevance score.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredEntry {
    pub entry: CorpusEntry,
    pub score: u32,
}

/// Metadata persisted next to every indexed chunk vector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkMetadata {
    pub source_name: String,
    pub chunk_index: usize,
    pub content: String,
}

/// A record handed to the nearest-neighbor index.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexRecord {
    pub id: String,
    pub vector: Vec<f32>,
    pub metadata: ChunkMetadata,
}

/// A nearest-neighbor match. Higher `similarity` is better.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexMatch {
    pub metadata: ChunkMetadata,
    pub similarity: f32,
}

/// Exact-match predicate applied by the index before ranking.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetadataFilter {
    pub source_name: Option<String>,
}

impl MetadataFilter {
    pub fn source(name: impl Into<String>) -> Self { Self { source_name: Some(name.into()) } }

    pub fn matches(&self, meta: &ChunkMetadata) -> bool {
        match &self.source_name {
            Some(s) => *s == meta.source_name,
            None => true,
        }
    }
}

/// Citation surface for one chunk used to answer a document question.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocumentMatch {
    pub source_name: String,
    pub chunk_index: usize,
    pub similarity: f32,
}

impl From<&IndexMatch> for DocumentMatch {
    fn from(m: &IndexMatch) -> Self {
        Self { source_name: m.metadata.source_name.clone(), chunk_index: m.metadata.chunk_index, similarity: m.similarity }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct IngestResult {
    pub chunk_count: usize,
}

/// How chunk record ids are minted on ingest.
///
/// `Random` mints a fresh UUID per chunk. `ContentHash` derives the id from
/// source name, chunk index and content, so re-ingesting the same document
/// overwrites its records instead of duplicating them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdStrategy {
    #[default]
    Random,
    ContentHash,
}
