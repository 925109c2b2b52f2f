//! Lexical relevance ranking over an in-memory corpus.
//!
//! +2 when the entry name contains the whole query, +1 for every query word
//! found in the content. Zero-score entries are dropped and ties keep corpus
//! order (`sort_by` is stable).

use ragdb_core::types::{CorpusEntry, ScoredEntry};

pub const DEFAULT_TOP_K: usize = 15;

pub fn rank(corpus: &[CorpusEntry], query: &str, top_k: usize) -> Vec<ScoredEntry> {
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return corpus.iter().take(top_k).map(|e| ScoredEntry { entry: e.clone(), score: 0 }).collect();
    }
    let words: Vec<&str> = query.split_whitespace().collect();

    let mut scored: Vec<ScoredEntry> = corpus
        .iter()
        .filter_map(|e| {
            let score = score_entry(e, &query, &words);
            (score > 0).then(|| ScoredEntry { entry: e.clone(), score })
        })
        .collect();
    scored.sort_by(|a, b| b.score.cmp(&a.score));
    scored.truncate(top_k);
    scored
}

/// `query` must already be trimmed and lowercased; `words` split from it.
pub fn score_entry(entry: &CorpusEntry, query: &str, words: &[&str]) -> u32 {
    let mut score = 0;
    if entry.name.to_lowercase().contains(query) {
        score += 2;
    }
    let content = entry.content.to_lowercase();
    for word in words {
        if content.contains(word) {
            score += 1;
        }
    }
    score
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(name: &str, content: &str) -> CorpusEntry {
        CorpusEntry { name: name.into(), content: content.into(), vector: vec![] }
    }

    #[test]
    fn name_match_outweighs_single_word() {
        let corpus = vec![entry("misc", "tax rules"), entry("Tax Code", "nothing relevant")];
        let out = rank(&corpus, "tax", 10);
        assert_eq!(out[0].entry.name, "Tax Code");
        assert_eq!(out[0].score, 2);
        assert_eq!(out[1].score, 1);
    }

    #[test]
    fn repeated_query_words_count_each_time() {
        let corpus = vec![entry("a", "fire safety")];
        assert_eq!(rank(&corpus, "fire fire", 5)[0].score, 2);
    }
}
