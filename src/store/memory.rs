//! In-memory [`DocumentStore`] implementation.
//!
//! Uses `HashMap`s behind `std::sync::RwLock`. Chunks are kept per
//! document, so removing a document drops its chunks with it.

use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;
use chrono::Utc;

use crate::models::{Document, DocumentChunk};

use super::DocumentStore;

/// In-memory store for the CLI and tests.
pub struct InMemoryStore {
    docs: RwLock<HashMap<String, Document>>,
    chunks: RwLock<HashMap<String, Vec<DocumentChunk>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            docs: RwLock::new(HashMap::new()),
            chunks: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn read<T>(lock: &RwLock<T>) -> Result<RwLockReadGuard<'_, T>> {
    lock.read().map_err(|_| anyhow!("document store lock poisoned"))
}

fn write<T>(lock: &RwLock<T>) -> Result<RwLockWriteGuard<'_, T>> {
    lock.write().map_err(|_| anyhow!("document store lock poisoned"))
}

#[async_trait]
impl DocumentStore for InMemoryStore {
    async fn insert(&self, doc: Document) -> Result<String> {
        let id = doc.id.clone();
        write(&self.docs)?.insert(id.clone(), doc);
        Ok(id)
    }

    async fn replace_chunks(&self, doc_id: &str, mut chunks: Vec<DocumentChunk>) -> Result<()> {
        // lock order: docs, then chunks
        let mut docs = write(&self.docs)?;
        let doc = match docs.get_mut(doc_id) {
            Some(d) => d,
            None => bail!("Document not found: {}", doc_id),
        };
        chunks.sort_by_key(|c| c.chunk_index);
        doc.metadata.chunk_count = Some(chunks.len());
        doc.metadata.processed_at = Some(Utc::now());
        write(&self.chunks)?.insert(doc_id.to_string(), chunks);
        Ok(())
    }

    async fn get(&self, id: &str) -> Result<Option<Document>> {
        Ok(read(&self.docs)?.get(id).cloned())
    }

    async fn chunks(&self, doc_id: &str) -> Result<Vec<DocumentChunk>> {
        Ok(read(&self.chunks)?
            .get(doc_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn list(&self) -> Result<Vec<Document>> {
        let mut docs: Vec<Document> = read(&self.docs)?.values().cloned().collect();
        docs.sort_by(|a, b| {
            a.metadata
                .created_at
                .cmp(&b.metadata.created_at)
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(docs)
    }

    async fn remove(&self, id: &str) -> Result<bool> {
        let mut docs = write(&self.docs)?;
        let existed = docs.remove(id).is_some();
        write(&self.chunks)?.remove(id);
        Ok(existed)
    }

    async fn clear(&self) -> Result<()> {
        let mut docs = write(&self.docs)?;
        docs.clear();
        write(&self.chunks)?.clear();
        Ok(())
    }
}
