use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::RwLock;

use ragdb_core::traits::VectorIndex;
use ragdb_core::types::{IndexMatch, IndexRecord, MetadataFilter};

/// Exact cosine search over records held in memory. Records keep insertion
/// order, so equal similarities come back oldest first.
#[derive(Default)]
pub struct MemoryIndex {
    records: RwLock<Vec<IndexRecord>>,
}

impl MemoryIndex {
    pub fn new() -> Self { Self::default() }

    pub async fn len(&self) -> usize { self.records.read().await.len() }

    pub async fn is_empty(&self) -> bool { self.records.read().await.is_empty() }

    pub async fn records(&self) -> Vec<IndexRecord> { self.records.read().await.clone() }
}

#[async_trait]
impl VectorIndex for MemoryIndex {
    async fn upsert(&self, record: IndexRecord) -> Result<()> {
        let mut records = self.records.write().await;
        match records.iter_mut().find(|r| r.id == record.id) {
            Some(slot) => *slot = record,
            None => records.push(record),
        }
        Ok(())
    }

    async fn query(&self, vector: &[f32], top_k: usize, filter: &MetadataFilter) -> Result<Vec<IndexMatch>> {
        let records = self.records.read().await;
        let mut matches: Vec<IndexMatch> = records
            .iter()
            .filter(|r| filter.matches(&r.metadata))
            .map(|r| IndexMatch { metadata: r.metadata.clone(), similarity: cosine_similarity(vector, &r.vector) })
            .collect();
        matches.sort_by(|a, b| b.similarity.total_cmp(&a.similarity));
        matches.truncate(top_k);
        Ok(matches)
    }
}

/// 0.0 when either vector has zero norm or the dimensions differ.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let (mut dot, mut na, mut nb) = (0.0f64, 0.0f64, 0.0f64);
    for (x, y) in a.iter().zip(b) {
        let (x, y) = (f64::from(*x), f64::from(*y));
        dot += x * y;
        na += x * x;
        nb += y * y;
    }
    if na == 0.0 || nb == 0.0 {
        return 0.0;
    }
    (dot / (na.sqrt() * nb.sqrt())) as f32
}

#[cfg(test)]
mod tests {
    use super::cosine_similarity;

    #[test]
    fn cosine_orders_similarities() {
        let q = [1.0, 0.0];
        assert!(cosine_similarity(&q, &[1.0, 0.0]) > cosine_similarity(&q, &[1.0, 1.0]));
        assert_eq!(cosine_similarity(&q, &[0.0, 0.0]), 0.0);
        assert_eq!(cosine_similarity(&q, &[1.0]), 0.0);
    }
}
