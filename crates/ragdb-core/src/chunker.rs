//! Fixed-size overlapping character windows.
//!
//! Offsets count `char`s, so a window never splits a UTF-8 sequence. The walk
//! stops as soon as a window reaches the end of the text: the final chunk is
//! always longer than `overlap`, which keeps chunk count at
//! `ceil((len - overlap) / (size - overlap))` and lets the text be rebuilt by
//! dropping the first `overlap` chars of every chunk after the first.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::types::Chunk;

pub const DEFAULT_CHUNK_SIZE: usize = 800;
pub const DEFAULT_CHUNK_OVERLAP: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingConfig {
    pub size: usize,
    pub overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self { Self { size: DEFAULT_CHUNK_SIZE, overlap: DEFAULT_CHUNK_OVERLAP } }
}

impl ChunkingConfig {
    pub fn new(size: usize, overlap: usize) -> Result<Self> {
        let cfg = Self { size, overlap };
        cfg.validate()?;
        Ok(cfg)
    }

    /// `size` must exceed `overlap`, otherwise the window never advances.
    pub fn validate(&self) -> Result<()> {
        if self.size <= self.overlap {
            return Err(Error::InvalidConfiguration(format!(
                "chunk size ({}) must be greater than overlap ({})",
                self.size, self.overlap
            )));
        }
        Ok(())
    }

    fn step(&self) -> usize { self.size - self.overlap }
}

/// Split `text` into windows of `size` chars overlapping by `overlap` chars.
pub fn chunk(text: &str, size: usize, overlap: usize) -> Result<Vec<String>> {
    let cfg = ChunkingConfig::new(size, overlap)?;
    Ok(split(text, &cfg))
}

/// Chunk a document and stamp each piece with its source and position.
pub fn chunk_document(source_name: &str, text: &str, cfg: &ChunkingConfig) -> Result<Vec<Chunk>> {
    cfg.validate()?;
    Ok(split(text, cfg)
        .into_iter()
        .enumerate()
        .map(|(index, content)| Chunk { content, source_name: source_name.to_string(), index })
        .collect())
}

fn split(text: &str, cfg: &ChunkingConfig) -> Vec<String> {
    // Byte offset of every char boundary, plus the end of the string.
    let bounds: Vec<usize> = text.char_indices().map(|(i, _)| i).chain(std::iter::once(text.len())).collect();
    let len = bounds.len() - 1;
    let mut chunks = Vec::new();
    let mut start = 0usize;
    while start < len {
        let end = (start + cfg.size).min(len);
        chunks.push(text[bounds[start]..bounds[end]].to_string());
        if end == len { break; }
        start += cfg.step();
    }
    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_text_yields_no_chunks() {
        assert!(chunk("", 800, 100).expect("chunk").is_empty());
    }

    #[test]
    fn short_text_is_single_chunk() {
        let out = chunk("hello world", 800, 100).expect("chunk");
        assert_eq!(out, vec!["hello world".to_string()]);
    }

    #[test]
    fn multibyte_chars_are_never_split() {
        let text = "é".repeat(25);
        let out = chunk(&text, 10, 2).expect("chunk");
        for c in &out { assert!(c.chars().all(|ch| ch == 'é')); }
        assert_eq!(out[0].chars().count(), 10);
    }

    #[test]
    fn degenerate_window_is_rejected() {
        assert!(matches!(chunk("abc", 100, 100), Err(Error::InvalidConfiguration(_))));
        assert!(matches!(chunk("abc", 10, 50), Err(Error::InvalidConfiguration(_))));
    }
}
