use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, instrument};

use ragdb_core::traits::{Embedder, VectorIndex};
use ragdb_core::types::{DocumentMatch, MetadataFilter};
use ragdb_core::{Error, Result};

pub const NO_RELEVANT_INFORMATION: &str = "No relevant information found in this document.";
pub const DEFAULT_DOCUMENT_TOP_K: usize = 5;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocumentAnswer {
    pub context_block: String,
    pub matches: Vec<DocumentMatch>,
}

impl DocumentAnswer {
    fn no_matches() -> Self { Self { context_block: NO_RELEVANT_INFORMATION.to_string(), matches: Vec::new() } }

    pub fn is_empty(&self) -> bool { self.matches.is_empty() }
}

/// Answers questions against the chunks of one uploaded document.
pub struct QueryRouter {
    embedder: Arc<dyn Embedder>,
    index: Arc<dyn VectorIndex>,
}

impl QueryRouter {
    pub fn new(embedder: Arc<dyn Embedder>, index: Arc<dyn VectorIndex>) -> Self { Self { embedder, index } }

    #[instrument(skip(self))]
    pub async fn answer_from_document(&self, source_name: &str, query: &str, top_k: usize) -> Result<DocumentAnswer> {
        if source_name.trim().is_empty() {
            return Err(Error::MissingInput("source_name"));
        }
        if query.trim().is_empty() {
            return Err(Error::MissingInput("query"));
        }
        let vector = self.embedder.embed(query).await.map_err(Error::embedding)?;
        let hits = self
            .index
            .query(&vector, top_k, &MetadataFilter::source(source_name))
            .await
            .map_err(Error::index)?;
        debug!(hits = hits.len(), "document query");
        if hits.is_empty() {
            return Ok(DocumentAnswer::no_matches());
        }

        let context_block = hits
            .iter()
            .enumerate()
            .map(|(i, h)| format!("Chunk {}:\n{}", i + 1, h.metadata.content))
            .collect::<Vec<_>>()
            .join("\n\n");
        Ok(DocumentAnswer { context_block, matches: hits.iter().map(DocumentMatch::from).collect() })
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PromptMode {
    #[default]
    General,
    /// Answer strictly from the document and say so when it is silent.
    Legal,
}

impl PromptMode {
    fn system_prompt(self) -> &'static str {
        match self {
            Self::General => "You are a helpful assistant. Use the provided context to answer the question.",
            Self::Legal => concat!(
                "You are a legal assistant. Answer strictly using the provided document context.\n",
                "If the answer is not present, say \"The document does not contain this information.\"",
            ),
        }
    }
}

/// Generation prompt wrapping a document answer's context block.
pub fn build_document_prompt(answer: &DocumentAnswer, question: &str, mode: PromptMode) -> String {
    format!(
        "{}\n\nDOCUMENT CONTEXT:\n{}\n\nUSER QUESTION:\n{}\n\nANSWER:",
        mode.system_prompt(),
        answer.context_block,
        question.trim()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn legal_prompt_is_strict() {
        let answer = DocumentAnswer { context_block: "Chunk 1:\nclause".into(), matches: vec![] };
        let p = build_document_prompt(&answer, " what? ", PromptMode::Legal);
        assert!(p.starts_with("You are a legal assistant."));
        assert!(p.contains("DOCUMENT CONTEXT:\nChunk 1:\nclause\n\nUSER QUESTION:\nwhat?\n\nANSWER:"));
        assert!(build_document_prompt(&answer, "q", PromptMode::General).starts_with("You are a helpful assistant."));
    }
}
