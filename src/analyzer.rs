//! Document analysis orchestration.
//!
//! [`DocumentAnalyzer`] owns no global state: the store, the provider, and
//! the processor registry are all handed to it. Each operation loads a
//! document from the store, runs the local pipeline (chunking, heuristics,
//! retrieval), and, where a model is involved, sends one prompt and parses
//! the reply with [`crate::parse`].
//!
//! Provider failures never reach the caller. They are logged with
//! `tracing::warn!` and the operation returns a default or locally-derived
//! result with `degraded = true`. Errors that do propagate are caller
//! mistakes (unknown document ID, unreadable file) or store failures.

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use chrono::Utc;
use futures::future::join_all;
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::chunk::{chunk_text, content_hash};
use crate::config::Config;
use crate::insights::{compute_insights, TextStats};
use crate::models::{Document, DocumentChunk, DocumentMetadata, InsightBundle, KeywordBundle};
use crate::parse::{parse_insights, parse_keywords, parse_questions};
use crate::processor::{ProcessingResult, ProcessorRegistry};
use crate::provider::{invoke_with_timeout, LanguageModel};
use crate::retrieve::{relevant_sentences, retrieve_relevant};
use crate::store::DocumentStore;

/// Sentences returned by the keyword fallback when the provider cannot answer.
const FALLBACK_ANSWER_SENTENCES: usize = 3;

#[derive(Debug, Clone, Serialize)]
pub struct Summary {
    pub text: String,
    pub degraded: bool,
}

/// Local statistics plus the provider's insight bundle.
#[derive(Debug, Clone, Serialize)]
pub struct DocumentInsights {
    pub document_id: String,
    pub stats: TextStats,
    pub bundle: InsightBundle,
    pub degraded: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct Answer {
    pub text: String,
    /// Indices of the chunks used as context.
    pub sources: Vec<usize>,
    pub degraded: bool,
}

/// An owned chunk with its keyword score.
#[derive(Debug, Clone, Serialize)]
pub struct RankedChunk {
    pub chunk: DocumentChunk,
    pub score: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct Comparison {
    pub first: DocumentInsights,
    pub second: DocumentInsights,
    pub shared_topics: Vec<String>,
    pub shared_keywords: Vec<String>,
}

type InsightCache = RwLock<HashMap<(String, String), InsightBundle>>;

pub struct DocumentAnalyzer {
    config: Config,
    store: Arc<dyn DocumentStore>,
    provider: Arc<dyn LanguageModel>,
    processors: Arc<ProcessorRegistry>,
    // keyed by (document id, content hash)
    insight_cache: InsightCache,
}

impl DocumentAnalyzer {
    /// Analyzer with the built-in text and PDF processors.
    pub fn new(
        config: Config,
        store: Arc<dyn DocumentStore>,
        provider: Arc<dyn LanguageModel>,
    ) -> Self {
        Self::with_processors(config, store, provider, ProcessorRegistry::with_defaults())
    }

    /// Analyzer with a caller-supplied processor registry.
    pub fn with_processors(
        config: Config,
        store: Arc<dyn DocumentStore>,
        provider: Arc<dyn LanguageModel>,
        processors: ProcessorRegistry,
    ) -> Self {
        Self {
            config,
            store,
            provider,
            processors: Arc::new(processors),
            insight_cache: RwLock::new(HashMap::new()),
        }
    }

    /// The configuration this analyzer was built with.
    pub fn config(&self) -> &Config {
        &self.config
    }

    // ============ Ingestion ============

    /// Extract, chunk, and store a file.
    ///
    /// Extraction runs on the blocking thread pool.
    ///
    /// # Errors
    ///
    /// Returns an error if no processor supports the file, the file cannot
    /// be read or extracted, or the store rejects the document.
    pub async fn ingest_path(&self, path: &Path) -> Result<Document> {
        let processors = Arc::clone(&self.processors);
        let owned = path.to_path_buf();
        let result = tokio::task::spawn_blocking(move || processors.process(&owned))
            .await
            .context("document processing task failed")?
            .with_context(|| format!("Failed to ingest {}", path.display()))?;
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());
        self.ingest_processed(filename, result).await
    }

    /// Chunk and store text that is already in memory.
    pub async fn ingest_text(&self, filename: &str, text: &str) -> Result<Document> {
        let result = ProcessingResult {
            text: text.to_string(),
            file_type: "text".to_string(),
            size_bytes: text.len() as u64,
        };
        self.ingest_processed(filename.to_string(), result).await
    }

    async fn ingest_processed(&self, filename: String, result: ProcessingResult) -> Result<Document> {
        let id = Uuid::new_v4().to_string();
        let chunks = chunk_text(
            &id,
            &result.text,
            self.config.chunking.window_size,
            self.config.chunking.overlap,
        )?;
        let chunk_count = chunks.len();

        let doc = Document {
            id: id.clone(),
            content: result.text,
            metadata: DocumentMetadata {
                filename,
                file_type: result.file_type,
                size_bytes: result.size_bytes,
                created_at: Utc::now(),
                processed_at: None,
                chunk_count: None,
                extras: Default::default(),
            },
        };
        self.store.insert(doc).await?;
        self.store.replace_chunks(&id, chunks).await?;

        let doc = self.document(&id).await?;
        info!(
            document_id = %doc.id,
            filename = %doc.metadata.filename,
            chunk_count,
            "document ingested"
        );
        Ok(doc)
    }

    /// Fetch a document, failing if it does not exist.
    pub async fn document(&self, id: &str) -> Result<Document> {
        self.store
            .get(id)
            .await?
            .ok_or_else(|| anyhow!("Document not found: {}", id))
    }

    /// A document's chunks in index order.
    ///
    /// # Errors
    ///
    /// Returns an error if the document does not exist.
    pub async fn chunks(&self, id: &str) -> Result<Vec<DocumentChunk>> {
        self.document(id).await?;
        self.store.chunks(id).await
    }

    /// Remove a document, its chunks, and its cached insights. Returns whether it existed.
    pub async fn remove(&self, id: &str) -> Result<bool> {
        let removed = self.store.remove(id).await?;
        if let Ok(mut cache) = self.insight_cache.write() {
            cache.retain(|(doc_id, _), _| doc_id != id);
        }
        Ok(removed)
    }

    // ============ Local analysis ============

    /// Local statistics; never calls the provider.
    pub async fn stats(&self, id: &str) -> Result<TextStats> {
        let doc = self.document(id).await?;
        Ok(compute_insights(&doc.content))
    }

    /// Chunks most relevant to `concept`, best first.
    pub async fn similar_concepts(&self, id: &str, concept: &str) -> Result<Vec<RankedChunk>> {
        let chunks = self.chunks(id).await?;
        Ok(retrieve_relevant(concept, &chunks)
            .into_iter()
            .map(|s| RankedChunk {
                chunk: s.chunk.clone(),
                score: s.score,
            })
            .collect())
    }

    // ============ Provider-backed analysis ============

    /// Short summary. Empty and `degraded` when the provider fails.
    ///
    /// # Errors
    ///
    /// Returns an error only if the document does not exist.
    pub async fn summarize(&self, id: &str) -> Result<Summary> {
        let doc = self.document(id).await?;
        let prompt = format!(
            "Summarize the following document in a short paragraph.\n\n\
             Document:\n{}\n\nSummary:",
            self.context(&doc.content)
        );
        Ok(match self.complete("summarize", &prompt).await {
            Some(raw) => Summary {
                text: raw.trim().to_string(),
                degraded: false,
            },
            None => Summary {
                text: String::new(),
                degraded: true,
            },
        })
    }

    /// Local statistics plus the provider's insight bundle, cached per content.
    ///
    /// On provider failure the bundle keeps local complexity and readability
    /// and is marked `degraded`.
    pub async fn insights(&self, id: &str) -> Result<DocumentInsights> {
        let doc = self.document(id).await?;
        let stats = compute_insights(&doc.content);
        let key = (doc.id.clone(), content_hash(&doc.content));

        if let Some(bundle) = self.cached_insights(&key) {
            return Ok(DocumentInsights {
                document_id: doc.id,
                stats,
                bundle,
                degraded: false,
            });
        }

        let prompt = format!(
            "Analyze the document below. Respond with a JSON object with keys \
             \"sentiment\" (positive, negative or neutral), \"complexity\" (low, medium or high), \
             \"readability_score\" (0-100), \"topics\", \"key_insights\" and \
             \"recommendations\" (lists of strings).\n\nDocument:\n{}",
            self.context(&doc.content)
        );

        let (bundle, degraded) = match self.complete("insights", &prompt).await {
            Some(raw) => {
                let bundle = parse_insights(&raw);
                if let Ok(mut cache) = self.insight_cache.write() {
                    cache.insert(key, bundle.clone());
                }
                (bundle, false)
            }
            None => (
                InsightBundle {
                    complexity: stats.complexity,
                    readability_score: stats.readability_score,
                    ..InsightBundle::default()
                },
                true,
            ),
        };

        Ok(DocumentInsights {
            document_id: doc.id,
            stats,
            bundle,
            degraded,
        })
    }

    /// Keywords, entities, topics, and concepts. Empty when the provider fails.
    pub async fn keywords(&self, id: &str) -> Result<KeywordBundle> {
        let doc = self.document(id).await?;
        let prompt = format!(
            "Extract keywords from the document below. Respond with a JSON object with keys \
             \"keywords\", \"entities\", \"topics\" and \"concepts\", each a list of strings.\
             \n\nDocument:\n{}",
            self.context(&doc.content)
        );
        Ok(self
            .complete("keywords", &prompt)
            .await
            .map(|raw| parse_keywords(&raw))
            .unwrap_or_default())
    }

    /// Study questions about the document, at most `analysis.max_questions`.
    pub async fn questions(&self, id: &str) -> Result<Vec<String>> {
        let doc = self.document(id).await?;
        let max = self.config.analysis.max_questions;
        let prompt = format!(
            "Write up to {} questions a reader should be able to answer after reading \
             the document below. Respond with a JSON object with key \"questions\" \
             (a list of strings).\n\nDocument:\n{}",
            max,
            self.context(&doc.content)
        );
        let mut questions = self
            .complete("questions", &prompt)
            .await
            .map(|raw| parse_questions(&raw))
            .unwrap_or_default();
        questions.truncate(max);
        Ok(questions)
    }

    /// Answer `question` from the document's most relevant chunks.
    ///
    /// Without a provider, the answer is the best keyword-matching sentences.
    pub async fn answer(&self, id: &str, question: &str) -> Result<Answer> {
        let doc = self.document(id).await?;
        let chunks = self.store.chunks(id).await?;
        let ranked = retrieve_relevant(question, &chunks);

        let (context, sources) = if ranked.is_empty() {
            match chunks.first() {
                Some(c) => (c.text.clone(), vec![c.chunk_index]),
                None => (String::new(), Vec::new()),
            }
        } else {
            let texts: Vec<&str> = ranked.iter().map(|s| s.chunk.text.as_str()).collect();
            let indices = ranked.iter().map(|s| s.chunk.chunk_index).collect();
            (texts.join("\n\n"), indices)
        };

        let prompt = format!(
            "Answer the question using only the context below. If the context does not \
             contain the answer, say so.\n\nContext:\n{}\n\nQuestion: {}\n\nAnswer:",
            self.context(&context),
            question
        );

        Ok(match self.complete("answer", &prompt).await {
            Some(raw) => Answer {
                text: raw.trim().to_string(),
                sources,
                degraded: false,
            },
            None => {
                let sentences =
                    relevant_sentences(question, &doc.content, FALLBACK_ANSWER_SENTENCES);
                let text = if sentences.is_empty() {
                    String::new()
                } else {
                    format!("{}.", sentences.join(". "))
                };
                Answer {
                    text,
                    sources,
                    degraded: true,
                }
            }
        })
    }

    /// Insights for several documents at once. Results follow the order of `ids`.
    pub async fn insights_many(&self, ids: &[String]) -> Vec<(String, Result<DocumentInsights>)> {
        join_all(
            ids.iter()
                .map(|id| async move { (id.clone(), self.insights(id).await) }),
        )
        .await
    }

    /// Analyze two documents concurrently and report what they share.
    pub async fn compare(&self, first: &str, second: &str) -> Result<Comparison> {
        let (first, second, kw_first, kw_second) = futures::try_join!(
            self.insights(first),
            self.insights(second),
            self.keywords(first),
            self.keywords(second),
        )?;

        let shared_topics = intersect(&first.bundle.topics, &second.bundle.topics);
        let shared_keywords = intersect(&kw_first.keywords, &kw_second.keywords);

        Ok(Comparison {
            first,
            second,
            shared_topics,
            shared_keywords,
        })
    }

    // ============ Helpers ============

    /// Send a prompt; `None` (after logging) on any provider failure.
    async fn complete(&self, task: &str, prompt: &str) -> Option<String> {
        let deadline = Duration::from_secs(self.config.analysis.call_deadline_secs);
        match invoke_with_timeout(self.provider.as_ref(), prompt, deadline).await {
            Ok(completion) => Some(completion.content),
            Err(e) => {
                warn!(
                    task,
                    provider = self.provider.name(),
                    error = %e,
                    "provider call failed, returning degraded result"
                );
                None
            }
        }
    }

    fn context<'a>(&self, text: &'a str) -> &'a str {
        truncate_chars(text, self.config.analysis.max_context_chars)
    }

    fn cached_insights(&self, key: &(String, String)) -> Option<InsightBundle> {
        self.insight_cache
            .read()
            .ok()
            .and_then(|cache| cache.get(key).cloned())
    }
}

/// The first `max` characters of `text`.
fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => text,
    }
}

/// Items of `a` also present in `b` (case-insensitive), in `a`'s order, without repeats.
fn intersect(a: &[String], b: &[String]) -> Vec<String> {
    let b_lower: Vec<String> = b.iter().map(|s| s.to_lowercase()).collect();
    let mut seen: Vec<String> = Vec::new();
    let mut out = Vec::new();
    for item in a {
        let lower = item.to_lowercase();
        if b_lower.contains(&lower) && !seen.contains(&lower) {
            seen.push(lower);
            out.push(item.clone());
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_chars() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("abc", 10), "abc");
        assert_eq!(truncate_chars("abc", 0), "");
    }

    #[test]
    fn test_intersect_case_insensitive_in_order() {
        let a = vec!["Rust".to_string(), "Go".to_string(), "rust".to_string()];
        let b = vec!["RUST".to_string(), "python".to_string()];
        assert_eq!(intersect(&a, &b), vec!["Rust"]);
        assert!(intersect(&a, &[]).is_empty());
    }
}
