use std::sync::Arc;

use futures::{stream, StreamExt, TryStreamExt};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use ragdb_core::chunker::{chunk_document, ChunkingConfig};
use ragdb_core::config::UploadSettings;
use ragdb_core::traits::{Embedder, VectorIndex};
use ragdb_core::types::{Chunk, ChunkMetadata, IdStrategy, IndexRecord, IngestResult};
use ragdb_core::{Error, Result};

use crate::registry::KnownFiles;

/// Turns a document into indexed chunk records.
///
/// Every chunk is embedded before the first write, so an embedding failure
/// leaves the index untouched. Upserts run in chunk order; if one fails the
/// error reports how many records were already written.
pub struct UploadIndexer {
    embedder: Arc<dyn Embedder>,
    index: Arc<dyn VectorIndex>,
    registry: Arc<KnownFiles>,
    chunking: ChunkingConfig,
    id_strategy: IdStrategy,
    embed_concurrency: usize,
}

impl UploadIndexer {
    pub fn new(embedder: Arc<dyn Embedder>, index: Arc<dyn VectorIndex>, registry: Arc<KnownFiles>) -> Self {
        Self {
            embedder,
            index,
            registry,
            chunking: ChunkingConfig::default(),
            id_strategy: IdStrategy::default(),
            embed_concurrency: 1,
        }
    }

    pub fn from_settings(
        embedder: Arc<dyn Embedder>,
        index: Arc<dyn VectorIndex>,
        registry: Arc<KnownFiles>,
        chunking: ChunkingConfig,
        uploads: &UploadSettings,
    ) -> Result<Self> {
        Ok(Self::new(embedder, index, registry)
            .with_chunking(chunking)?
            .with_id_strategy(uploads.id_strategy)
            .with_embed_concurrency(uploads.embed_concurrency))
    }

    pub fn with_chunking(mut self, chunking: ChunkingConfig) -> Result<Self> {
        chunking.validate()?;
        self.chunking = chunking;
        Ok(self)
    }

    pub fn with_id_strategy(mut self, id_strategy: IdStrategy) -> Self {
        self.id_strategy = id_strategy;
        self
    }

    /// Embedding requests in flight at once; clamped to at least 1.
    pub fn with_embed_concurrency(mut self, n: usize) -> Self {
        self.embed_concurrency = n.max(1);
        self
    }

    pub fn registry(&self) -> &KnownFiles { &self.registry }

    #[instrument(skip(self, text), fields(embedder = self.embedder.embedder_id()))]
    pub async fn ingest(&self, source_name: &str, text: &str) -> Result<IngestResult> {
        if source_name.trim().is_empty() {
            return Err(Error::MissingInput("source_name"));
        }
        if text.trim().is_empty() {
            return Err(Error::EmptyDocument(source_name.to_string()));
        }
        let chunks = chunk_document(source_name, text, &self.chunking)?;
        let total = chunks.len();
        debug!(chunks = total, "document chunked");

        let vectors = self.embed_chunks(&chunks).await?;

        for (indexed, (chunk, vector)) in chunks.into_iter().zip(vectors).enumerate() {
            let record = IndexRecord {
                id: self.record_id(&chunk),
                vector,
                metadata: ChunkMetadata { source_name: chunk.source_name, chunk_index: chunk.index, content: chunk.content },
            };
            if let Err(e) = self.index.upsert(record).await {
                warn!(indexed, total, error = %e, "upsert failed, ingest stopped");
                return Err(Error::PartialIngest { indexed, total, reason: e.to_string() });
            }
            debug!(chunk = indexed, "chunk indexed");
        }

        self.registry.register(source_name).await?;
        info!(chunks = total, "document indexed");
        Ok(IngestResult { chunk_count: total })
    }

    /// Vectors in chunk order, whatever the concurrency.
    async fn embed_chunks(&self, chunks: &[Chunk]) -> Result<Vec<Vec<f32>>> {
        let embedder = &self.embedder;
        stream::iter(chunks)
            .map(|chunk| async move {
                let vector = embedder
                    .embed(&chunk.content)
                    .await
                    .map_err(|e| Error::embedding(format!("chunk {}: {e}", chunk.index)))?;
                if vector.is_empty() {
                    return Err(Error::embedding(format!("chunk {}: empty vector", chunk.index)));
                }
                Ok(vector)
            })
            .buffered(self.embed_concurrency)
            .try_collect()
            .await
    }

    fn record_id(&self, chunk: &Chunk) -> String {
        match self.id_strategy {
            IdStrategy::Random => Uuid::new_v4().to_string(),
            IdStrategy::ContentHash => {
                let mut h = blake3::Hasher::new();
                h.update(chunk.source_name.as_bytes());
                h.update(&[0]);
                h.update(&(chunk.index as u64).to_le_bytes());
                h.update(chunk.content.as_bytes());
                h.finalize().to_hex().to_string()
            }
        }
    }
}
