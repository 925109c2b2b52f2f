//! Embedding collaborators.
//!
//! `get_default_embedder` respects `APP_USE_FAKE_EMBEDDINGS=1` to switch to the
//! [`FakeEmbedder`] for fast and deterministic outputs in tests and development.

use anyhow::Result;
use tracing::info;

use ragdb_core::config::{EmbeddingProvider, EmbeddingSettings};
use ragdb_core::traits::Embedder;

pub mod fake;
pub mod gemini;

pub use fake::FakeEmbedder;
pub use gemini::GeminiEmbedder;

pub fn fake_requested() -> bool {
    std::env::var("APP_USE_FAKE_EMBEDDINGS")
        .ok()
        .is_some_and(|v| v == "1" || v.eq_ignore_ascii_case("true"))
}

pub fn get_default_embedder(settings: &EmbeddingSettings) -> Result<Box<dyn Embedder>> {
    if fake_requested() || settings.provider == EmbeddingProvider::Fake {
        info!(dim = settings.dim, "using FakeEmbedder");
        return Ok(Box::new(FakeEmbedder::new(settings.dim)));
    }
    let embedder = GeminiEmbedder::from_settings(settings)?;
    info!(model = %settings.model, "using Gemini embeddings");
    Ok(Box::new(embedder))
}
