use std::hash::{Hash, Hasher};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use twox_hash::XxHash64;

use ragdb_core::traits::Embedder;

/// Token-hashing embedder: deterministic, L2-normalised, no model files.
///
/// Texts sharing tokens land close together, which is enough for tests and
/// offline development.
pub struct FakeEmbedder {
    dim: usize,
    id: String,
}

impl FakeEmbedder {
    pub fn new(dim: usize) -> Self { Self { dim, id: format!("fake:xxh64:d{dim}") } }

    pub fn dim(&self) -> usize { self.dim }

    pub fn embed_sync(&self, text: &str) -> Result<Vec<f32>> {
        if text.trim().is_empty() {
            return Err(anyhow!("Cannot embed empty text"));
        }
        if self.dim == 0 {
            return Err(anyhow!("FakeEmbedder dimension must be positive"));
        }
        let mut v = vec![0f32; self.dim];
        for (i, token) in text.split_whitespace().enumerate() {
            let mut hasher = XxHash64::with_seed(0);
            token.to_lowercase().hash(&mut hasher);
            let h = hasher.finish();
            let idx = usize::try_from(h % self.dim as u64)?;
            #[allow(clippy::cast_precision_loss)]
            let val = ((h >> 32) as u32) as f32 / u32::MAX as f32;
            #[allow(clippy::cast_precision_loss)]
            let jitter = (i % 3) as f32 * 0.01;
            v[idx] += val + jitter;
        }
        let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt().max(1e-6);
        for x in &mut v { *x /= norm; }
        Ok(v)
    }
}

#[async_trait]
impl Embedder for FakeEmbedder {
    fn embedder_id(&self) -> &str { &self.id }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> { self.embed_sync(text) }
}
