//! Remote embedding client for the Gemini `embedContent` endpoint.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use ragdb_core::config::EmbeddingSettings;
use ragdb_core::traits::Embedder;

pub struct GeminiEmbedder {
    base_url: String,
    model: String,
    api_key: String,
    dim: usize,
    id: String,
    http: Client,
}

impl GeminiEmbedder {
    /// Build from settings, reading the key from `settings.api_key_env`.
    pub fn from_settings(settings: &EmbeddingSettings) -> Result<Self> {
        let api_key = std::env::var(&settings.api_key_env)
            .map_err(|_| anyhow!("{} is not set", settings.api_key_env))?;
        Ok(Self::new(&settings.base_url, &settings.model, api_key, settings.dim))
    }

    pub fn new(base_url: &str, model: &str, api_key: String, dim: usize) -> Self {
        let base_url = base_url.trim_end_matches('/').to_string();
        let id = format!("gemini:{model}:d{dim}");
        Self { base_url, model: model.to_string(), api_key, dim, id, http: Client::new() }
    }

    fn endpoint(&self) -> String { format!("{}/models/{}:embedContent", self.base_url, self.model) }
}

#[derive(Serialize)]
struct EmbedContentRequest<'a> {
    model: String,
    content: Content<'a>,
}

#[derive(Serialize)]
struct Content<'a> {
    parts: [Part<'a>; 1],
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
struct EmbedContentResponse {
    embedding: Option<ContentEmbedding>,
    #[serde(default)]
    embeddings: Vec<ContentEmbedding>,
}

#[derive(Deserialize)]
struct ContentEmbedding {
    #[serde(default)]
    values: Vec<f32>,
}

/// Single-item and batch response shapes both carry the vector; take the first.
fn vector_from_response(body: &str, dim: usize) -> Result<Vec<f32>> {
    let parsed: EmbedContentResponse = serde_json::from_str(body).map_err(|e| anyhow!("decode failed: {e}"))?;
    let values = parsed
        .embedding
        .or_else(|| parsed.embeddings.into_iter().next())
        .map(|e| e.values)
        .unwrap_or_default();
    if values.is_empty() {
        return Err(anyhow!("Failed to generate embedding: response carried no values"));
    }
    if values.len() != dim {
        return Err(anyhow!("dim mismatch: got {} expected {}", values.len(), dim));
    }
    Ok(values)
}

#[async_trait]
impl Embedder for GeminiEmbedder {
    fn embedder_id(&self) -> &str { &self.id }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        if text.trim().is_empty() {
            return Err(anyhow!("Cannot embed empty text"));
        }
        let payload = EmbedContentRequest { model: format!("models/{}", self.model), content: Content { parts: [Part { text }] } };
        let resp = self
            .http
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| anyhow!("request failed: {e}"))?;
        let status = resp.status();
        let body = resp.text().await.map_err(|e| anyhow!("read body failed: {e}"))?;
        if !status.is_success() {
            return Err(anyhow!("embedding HTTP {status}: {body}"));
        }
        vector_from_response(&body, self.dim)
    }
}

#[cfg(test)]
mod tests {
    use super::vector_from_response;

    #[test]
    fn reads_single_embedding_shape() {
        let v = vector_from_response(r#"{"embedding":{"values":[0.1,0.2,0.3]}}"#, 3).expect("vector");
        assert_eq!(v, vec![0.1, 0.2, 0.3]);
    }

    #[test]
    fn reads_batch_embedding_shape() {
        let v = vector_from_response(r#"{"embeddings":[{"values":[1.0,0.0]}]}"#, 2).expect("vector");
        assert_eq!(v, vec![1.0, 0.0]);
    }

    #[test]
    fn empty_or_mismatched_vectors_fail() {
        assert!(vector_from_response(r#"{"embedding":{"values":[]}}"#, 3).is_err());
        assert!(vector_from_response(r"{}", 3).is_err());
        assert!(vector_from_response(r#"{"embedding":{"values":[1.0]}}"#, 3).is_err());
    }
}
