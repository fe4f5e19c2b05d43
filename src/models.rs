//! Core data models used throughout doclens.
//!
//! These types represent the documents and chunks held by a
//! [`DocumentStore`](crate::store::DocumentStore), plus the derived
//! insight and keyword bundles produced by analysis.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An ingested document. Content is immutable once created.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub content: String,
    pub metadata: DocumentMetadata,
}

/// Descriptive metadata recorded at ingestion time.
///
/// `processed_at` and `chunk_count` are filled in once, after the
/// document has been chunked.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentMetadata {
    pub filename: String,
    pub file_type: String,
    pub size_bytes: u64,
    pub created_at: DateTime<Utc>,
    pub processed_at: Option<DateTime<Utc>>,
    pub chunk_count: Option<usize>,
    /// Provider-specific or processor-specific extras.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extras: BTreeMap<String, serde_json::Value>,
}

/// A contiguous window of a document's content.
///
/// `start` and `end` are character offsets into the parent content,
/// so `content.chars().skip(start).take(end - start)` equals `text`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentChunk {
    pub id: String,
    pub document_id: String,
    pub chunk_index: usize,
    pub text: String,
    pub start: usize,
    pub end: usize,
    /// SHA-256 of `text`, hex encoded.
    pub hash: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    Negative,
    #[default]
    Neutral,
}

impl Sentiment {
    /// Lenient parse of provider text. Returns `None` when no label is recognised.
    pub fn parse(s: &str) -> Option<Self> {
        let lower = s.trim().to_lowercase();
        if lower.starts_with("pos") {
            Some(Self::Positive)
        } else if lower.starts_with("neg") {
            Some(Self::Negative)
        } else if lower.starts_with("neu") || lower == "mixed" {
            Some(Self::Neutral)
        } else {
            None
        }
    }
}

impl fmt::Display for Sentiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Positive => "positive",
            Self::Negative => "negative",
            Self::Neutral => "neutral",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Complexity {
    Low,
    #[default]
    Medium,
    High,
}

impl Complexity {
    /// Lenient parse of provider text (`low`/`simple`, `medium`, `high`/`complex`).
    pub fn parse(s: &str) -> Option<Self> {
        let lower = s.trim().to_lowercase();
        if lower.starts_with("low") || lower.starts_with("simple") || lower.starts_with("easy") {
            Some(Self::Low)
        } else if lower.starts_with("med") || lower.starts_with("moderate") {
            Some(Self::Medium)
        } else if lower.starts_with("high") || lower.starts_with("complex") {
            Some(Self::High)
        } else {
            None
        }
    }
}

impl fmt::Display for Complexity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        };
        f.write_str(s)
    }
}

/// Midpoint of the 0–100 readability scale; used when nothing better is known.
pub const DEFAULT_READABILITY: f64 = 50.0;

/// Coarse, regenerated-per-request summary of a document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsightBundle {
    pub sentiment: Sentiment,
    pub complexity: Complexity,
    pub readability_score: f64,
    pub topics: Vec<String>,
    pub key_insights: Vec<String>,
    pub recommendations: Vec<String>,
}

impl Default for InsightBundle {
    fn default() -> Self {
        Self {
            sentiment: Sentiment::default(),
            complexity: Complexity::default(),
            readability_score: DEFAULT_READABILITY,
            topics: Vec::new(),
            key_insights: Vec::new(),
            recommendations: Vec::new(),
        }
    }
}

/// Keyword extraction result. Lists keep the order the provider gave them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordBundle {
    pub keywords: Vec<String>,
    pub entities: Vec<String>,
    pub topics: Vec<String>,
    pub concepts: Vec<String>,
}

impl KeywordBundle {
    pub fn is_empty(&self) -> bool {
        self.keywords.is_empty()
            && self.entities.is_empty()
            && self.topics.is_empty()
            && self.concepts.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentiment_parse_is_lenient() {
        assert_eq!(Sentiment::parse("Positive"), Some(Sentiment::Positive));
        assert_eq!(Sentiment::parse(" negative."), Some(Sentiment::Negative));
        assert_eq!(Sentiment::parse("NEUTRAL"), Some(Sentiment::Neutral));
        assert_eq!(Sentiment::parse("ecstatic"), None);
    }

    #[test]
    fn complexity_parse_is_lenient() {
        assert_eq!(Complexity::parse("HIGH"), Some(Complexity::High));
        assert_eq!(Complexity::parse("moderate"), Some(Complexity::Medium));
        assert_eq!(Complexity::parse("low complexity"), Some(Complexity::Low));
        assert_eq!(Complexity::parse("?"), None);
    }

    #[test]
    fn insight_defaults() {
        let b = InsightBundle::default();
        assert_eq!(b.sentiment, Sentiment::Neutral);
        assert_eq!(b.complexity, Complexity::Medium);
        assert_eq!(b.readability_score, DEFAULT_READABILITY);
        assert!(b.topics.is_empty());
    }

    #[test]
    fn serde_uses_lowercase_labels() {
        let json = serde_json::to_string(&Sentiment::Positive).unwrap();
        assert_eq!(json, "\"positive\"");
        let c: Complexity = serde_json::from_str("\"high\"").unwrap();
        assert_eq!(c, Complexity::High);
    }
}
