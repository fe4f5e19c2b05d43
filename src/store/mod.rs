//! Storage abstraction for documents and their chunks.
//!
//! The [`DocumentStore`] trait is the only way the analyzer touches
//! persisted state, so a persistent backend can replace [`InMemoryStore`]
//! without changes to chunking, parsing, or retrieval.
//!
//! Implementations must be `Send + Sync` and do their own locking; callers
//! may share one store across concurrent requests.

pub mod memory;

pub use memory::InMemoryStore;

use anyhow::Result;
use async_trait::async_trait;

use crate::models::{Document, DocumentChunk};

/// Abstract document store.
///
/// | Method | Purpose |
/// |--------|---------|
/// | [`insert`](DocumentStore::insert) | Add a document, returning its ID |
/// | [`replace_chunks`](DocumentStore::replace_chunks) | Set a document's chunks and record the chunk count |
/// | [`get`](DocumentStore::get) | Fetch one document |
/// | [`chunks`](DocumentStore::chunks) | Fetch a document's chunks in index order |
/// | [`list`](DocumentStore::list) | All documents, oldest first |
/// | [`remove`](DocumentStore::remove) | Drop a document and its chunks |
/// | [`clear`](DocumentStore::clear) | Drop everything |
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Insert a document. An existing document with the same ID is replaced.
    async fn insert(&self, doc: Document) -> Result<String>;

    /// Replace all chunks of `doc_id`, setting its `chunk_count` and
    /// `processed_at`. Fails if the document does not exist.
    async fn replace_chunks(&self, doc_id: &str, chunks: Vec<DocumentChunk>) -> Result<()>;

    async fn get(&self, id: &str) -> Result<Option<Document>>;

    async fn chunks(&self, doc_id: &str) -> Result<Vec<DocumentChunk>>;

    async fn list(&self) -> Result<Vec<Document>>;

    /// Remove a document and its chunks. Returns whether it existed.
    async fn remove(&self, id: &str) -> Result<bool>;

    async fn clear(&self) -> Result<()>;
}
