//! Keyword-match retrieval over chunks.
//!
//! Scores each chunk by the total number of case-insensitive, literal
//! substring occurrences of every whitespace-separated query token. The
//! match is not word-boundary aware: `"cat"` also counts inside
//! `"concatenate"`.
//!
//! # Ranking
//!
//! 1. Tokenize the query on whitespace (no stopword removal).
//! 2. Score every chunk: `Σ count(chunk, token)`.
//! 3. Drop chunks scoring zero.
//! 4. Stable sort by score, descending (ties keep input order).
//! 5. Truncate to [`MAX_RESULTS`].

use serde::Serialize;

use crate::insights::split_sentences;
use crate::models::DocumentChunk;

/// Maximum number of chunks returned by [`retrieve_relevant`].
pub const MAX_RESULTS: usize = 5;

/// A chunk paired with its keyword score.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredChunk<'a> {
    pub chunk: &'a DocumentChunk,
    pub score: usize,
}

/// Rank `chunks` against `query`, returning at most [`MAX_RESULTS`] matches.
pub fn retrieve_relevant<'a>(query: &str, chunks: &'a [DocumentChunk]) -> Vec<ScoredChunk<'a>> {
    let tokens = query_tokens(query);
    if tokens.is_empty() {
        return Vec::new();
    }

    let mut scored: Vec<ScoredChunk<'a>> = chunks
        .iter()
        .map(|chunk| ScoredChunk {
            chunk,
            score: score_text(&chunk.text, &tokens),
        })
        .filter(|s| s.score > 0)
        .collect();

    // sort_by is stable, so equal scores stay in chunk order
    scored.sort_by(|a, b| b.score.cmp(&a.score));
    scored.truncate(MAX_RESULTS);
    scored
}

/// Pick up to `limit` sentences of `text` that best match `question`,
/// returned in their original order.
pub fn relevant_sentences<'a>(question: &str, text: &'a str, limit: usize) -> Vec<&'a str> {
    let tokens = query_tokens(question);
    if tokens.is_empty() || limit == 0 {
        return Vec::new();
    }

    let mut scored: Vec<(usize, usize, &str)> = split_sentences(text)
        .into_iter()
        .enumerate()
        .map(|(i, s)| (i, score_text(s, &tokens), s))
        .filter(|(_, score, _)| *score > 0)
        .collect();

    scored.sort_by(|a, b| b.1.cmp(&a.1));
    scored.truncate(limit);
    scored.sort_by_key(|(i, _, _)| *i);
    scored.into_iter().map(|(_, _, s)| s).collect()
}

/// Non-overlapping occurrences of `needle` in `haystack`. Both should
/// already be lowercased by the caller if case-insensitivity is wanted.
pub fn count_occurrences(haystack: &str, needle: &str) -> usize {
    if needle.is_empty() {
        return 0;
    }
    haystack.matches(needle).count()
}

fn query_tokens(query: &str) -> Vec<String> {
    query.split_whitespace().map(str::to_lowercase).collect()
}

fn score_text(text: &str, tokens: &[String]) -> usize {
    let lower = text.to_lowercase();
    tokens.iter().map(|t| count_occurrences(&lower, t)).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_chunks(texts: &[&str]) -> Vec<DocumentChunk> {
        texts
            .iter()
            .enumerate()
            .map(|(i, t)| DocumentChunk {
                id: format!("d_chunk_{}", i),
                document_id: "d".to_string(),
                chunk_index: i,
                text: t.to_string(),
                start: 0,
                end: t.chars().count(),
                hash: String::new(),
            })
            .collect()
    }

    #[test]
    fn test_ties_keep_original_order() {
        let chunks = make_chunks(&["the cat sat", "the dog ran", "birds fly"]);
        let results = retrieve_relevant("cat dog", &chunks);
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].chunk.text, "the cat sat");
        assert_eq!(results[1].chunk.text, "the dog ran");
        assert_eq!(results[0].score, 1);
        assert_eq!(results[1].score, 1);
    }

    #[test]
    fn test_higher_scores_first() {
        let chunks = make_chunks(&["rust", "Rust and RUST and rust", "rust rust"]);
        let results = retrieve_relevant("rust", &chunks);
        let scores: Vec<usize> = results.iter().map(|r| r.score).collect();
        assert_eq!(scores, [3, 2, 1]);
        assert_eq!(results[0].chunk.chunk_index, 1);
    }

    #[test]
    fn test_substring_matches_inside_words() {
        let chunks = make_chunks(&["concatenate the category"]);
        let results = retrieve_relevant("cat", &chunks);
        assert_eq!(results[0].score, 2);
    }

    #[test]
    fn test_repeated_query_tokens_count_twice() {
        let chunks = make_chunks(&["one cat"]);
        assert_eq!(retrieve_relevant("cat cat", &chunks)[0].score, 2);
    }

    #[test]
    fn test_never_more_than_five() {
        let texts: Vec<String> = (0..20).map(|i| format!("match number {}", i)).collect();
        let refs: Vec<&str> = texts.iter().map(String::as_str).collect();
        let chunks = make_chunks(&refs);
        let results = retrieve_relevant("match", &chunks);
        assert_eq!(results.len(), MAX_RESULTS);
        let indices: Vec<usize> = results.iter().map(|r| r.chunk.chunk_index).collect();
        assert_eq!(indices, [0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_empty_query_or_chunks() {
        let chunks = make_chunks(&["anything"]);
        assert!(retrieve_relevant("   ", &chunks).is_empty());
        assert!(retrieve_relevant("anything", &[]).is_empty());
    }

    #[test]
    fn test_count_occurrences_non_overlapping() {
        assert_eq!(count_occurrences("aaaa", "aa"), 2);
        assert_eq!(count_occurrences("abc", ""), 0);
        assert_eq!(count_occurrences("", "a"), 0);
    }

    #[test]
    fn test_relevant_sentences_keep_document_order() {
        let text = "Rust is fast. Python is popular. Rust has ownership and Rust has borrowing. Go is simple.";
        let picked = relevant_sentences("rust ownership", text, 2);
        assert_eq!(
            picked,
            ["Rust is fast", "Rust has ownership and Rust has borrowing"]
        );
        assert!(relevant_sentences("haskell", text, 3).is_empty());
    }
}
