//! Model-free text statistics.
//!
//! [`compute_insights`] derives word/sentence counts, reading time, a
//! coarse language guess, and a readability estimate from raw text. No
//! provider is involved and the result depends only on the input.

use serde::{Deserialize, Serialize};

use crate::models::Complexity;

/// Average adult reading speed used for the reading-time estimate.
pub const WORDS_PER_MINUTE: usize = 200;

/// Fraction of function-word tokens above which text is labelled English.
pub const ENGLISH_RATIO_THRESHOLD: f64 = 0.10;

const ENGLISH_FUNCTION_WORDS: &[&str] = &[
    "the", "and", "is", "in", "to", "of", "a", "an", "that", "it", "with", "for", "as", "was",
    "on", "are", "be", "this", "by", "or", "at", "from", "have", "has", "not", "but", "they",
    "we", "you", "he", "she", "which", "their", "were", "been",
];

/// Local statistics for a piece of text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextStats {
    pub word_count: usize,
    pub sentence_count: usize,
    pub reading_time_minutes: usize,
    /// `"english"` or `"unknown"`.
    pub language: String,
    pub avg_words_per_sentence: f64,
    /// Flesch reading ease, clamped to `[0, 100]`.
    pub readability_score: f64,
    pub complexity: Complexity,
}

/// Compute [`TextStats`] for `text`. Empty input yields all-zero counts.
pub fn compute_insights(text: &str) -> TextStats {
    let words: Vec<&str> = text.split_whitespace().collect();
    let word_count = words.len();
    let sentence_count = count_sentences(text);

    if word_count == 0 {
        return TextStats {
            word_count: 0,
            sentence_count,
            reading_time_minutes: 0,
            language: "unknown".to_string(),
            avg_words_per_sentence: 0.0,
            readability_score: 0.0,
            complexity: Complexity::Low,
        };
    }

    let effective_sentences = sentence_count.max(1);
    let avg_words_per_sentence = word_count as f64 / effective_sentences as f64;
    let syllables: usize = words.iter().map(|w| estimate_syllables(w)).sum();
    let readability_score = flesch_reading_ease(word_count, effective_sentences, syllables);

    TextStats {
        word_count,
        sentence_count,
        reading_time_minutes: word_count.div_ceil(WORDS_PER_MINUTE),
        language: detect_language(&words).to_string(),
        avg_words_per_sentence,
        readability_score,
        complexity: complexity_for(readability_score),
    }
}

/// Map a readability score onto a complexity tier.
pub fn complexity_for(readability: f64) -> Complexity {
    if readability >= 60.0 {
        Complexity::Low
    } else if readability >= 30.0 {
        Complexity::Medium
    } else {
        Complexity::High
    }
}

/// Split text into trimmed, non-empty sentences on `.`, `!` and `?`.
pub fn split_sentences(text: &str) -> Vec<&str> {
    text.split(['.', '!', '?'])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect()
}

fn count_sentences(text: &str) -> usize {
    split_sentences(text).len()
}

fn detect_language(words: &[&str]) -> &'static str {
    let hits = words
        .iter()
        .map(|w| normalize_token(w))
        .filter(|w| ENGLISH_FUNCTION_WORDS.contains(&w.as_str()))
        .count();
    if hits as f64 / words.len() as f64 > ENGLISH_RATIO_THRESHOLD {
        "english"
    } else {
        "unknown"
    }
}

fn normalize_token(token: &str) -> String {
    token
        .trim_matches(|c: char| !c.is_alphanumeric())
        .to_lowercase()
}

/// Vowel-group syllable estimate; every word counts at least one.
fn estimate_syllables(word: &str) -> usize {
    let w = normalize_token(word);
    let mut count = 0;
    let mut prev_vowel = false;
    for c in w.chars() {
        let vowel = matches!(c, 'a' | 'e' | 'i' | 'o' | 'u' | 'y');
        if vowel && !prev_vowel {
            count += 1;
        }
        prev_vowel = vowel;
    }
    // silent trailing e
    if count > 1 && w.ends_with('e') && !w.ends_with("le") {
        count -= 1;
    }
    count.max(1)
}

fn flesch_reading_ease(words: usize, sentences: usize, syllables: usize) -> f64 {
    let words = words as f64;
    let score = 206.835 - 1.015 * (words / sentences as f64) - 84.6 * (syllables as f64 / words);
    score.clamp(0.0, 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_text() {
        let stats = compute_insights("");
        assert_eq!(stats.word_count, 0);
        assert_eq!(stats.reading_time_minutes, 0);
        assert_eq!(stats.sentence_count, 0);
        assert_eq!(stats.language, "unknown");
    }

    #[test]
    fn test_whitespace_only() {
        let stats = compute_insights("  \n\t  ");
        assert_eq!(stats.word_count, 0);
        assert_eq!(stats.reading_time_minutes, 0);
    }

    #[test]
    fn test_word_count_discards_empty_tokens() {
        let stats = compute_insights("  one   two\n\nthree  ");
        assert_eq!(stats.word_count, 3);
    }

    #[test]
    fn test_reading_time_rounds_up() {
        let text = vec!["word"; 200].join(" ");
        assert_eq!(compute_insights(&text).reading_time_minutes, 1);
        let text = vec!["word"; 201].join(" ");
        assert_eq!(compute_insights(&text).reading_time_minutes, 2);
        assert_eq!(compute_insights("just three words").reading_time_minutes, 1);
    }

    #[test]
    fn test_language_english() {
        let stats = compute_insights("The cat is on the mat and it is happy.");
        assert_eq!(stats.language, "english");
    }

    #[test]
    fn test_language_unknown() {
        let stats = compute_insights("Lorem ipsum dolor sit amet, consectetur adipiscing elit.");
        assert_eq!(stats.language, "unknown");
    }

    #[test]
    fn test_sentence_count() {
        let stats = compute_insights("First one. Second one! Third?  ...");
        assert_eq!(stats.sentence_count, 3);
    }

    #[test]
    fn test_simple_text_reads_easily() {
        let stats = compute_insights("The dog ran. The cat sat. We had fun.");
        assert!(stats.readability_score >= 60.0, "{}", stats.readability_score);
        assert_eq!(stats.complexity, Complexity::Low);
    }

    #[test]
    fn test_dense_text_is_complex() {
        let text = "Institutional interoperability considerations necessitate comprehensive \
                    organizational standardization methodologies notwithstanding \
                    jurisdictional heterogeneity and administrative fragmentation";
        let stats = compute_insights(text);
        assert_eq!(stats.complexity, Complexity::High);
        assert!(stats.readability_score >= 0.0);
    }

    #[test]
    fn test_deterministic() {
        let text = "Alpha beta. Gamma delta epsilon!";
        assert_eq!(compute_insights(text), compute_insights(text));
    }

    #[test]
    fn test_syllables() {
        assert_eq!(estimate_syllables("cat"), 1);
        assert_eq!(estimate_syllables("table"), 2);
        assert_eq!(estimate_syllables("make"), 1);
        assert_eq!(estimate_syllables("rhythm"), 1);
        assert_eq!(estimate_syllables("!!"), 1);
    }
}
