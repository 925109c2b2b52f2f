use async_trait::async_trait;

use crate::types::{IndexMatch, IndexRecord, MetadataFilter};

#[async_trait]
pub trait Embedder: Send + Sync {
    /// Stable identifier for the provider/model (e.g. `fake:d768`).
    fn embedder_id(&self) -> &str;
    /// Embed one non-empty text.
    async fn embed(&self, text: &str) -> anyhow::Result<Vec<f32>>;
}

#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Insert or replace the record with `record.id`.
    async fn upsert(&self, record: IndexRecord) -> anyhow::Result<()>;
    /// Up to `top_k` records passing `filter`, most similar first.
    async fn query(&self, vector: &[f32], top_k: usize, filter: &MetadataFilter) -> anyhow::Result<Vec<IndexMatch>>;
}
