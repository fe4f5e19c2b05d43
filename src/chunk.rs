//! Fixed-window text chunker.
//!
//! Splits document content into overlapping [`DocumentChunk`]s of at most
//! `window` characters. Consecutive windows start `window - overlap`
//! characters apart, so neighbours share `overlap` characters; the final
//! window is clipped to the end of the content and may be shorter.
//!
//! Offsets are counted in characters (Unicode scalar values), never bytes,
//! so a window boundary cannot land inside a multi-byte code point.
//!
//! Each chunk gets a deterministic ID derived from its document ID and
//! index, plus a SHA-256 hash of its text for staleness detection.
//!
//! # Example
//!
//! ```rust
//! use doclens::chunk::chunk_text;
//!
//! let chunks = chunk_text("doc-1", "abcdefghij", 4, 1).unwrap();
//! let texts: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();
//! assert_eq!(texts, ["abcd", "defg", "ghij", "j"]);
//! ```

use sha2::{Digest, Sha256};
use thiserror::Error;
use tracing::debug;

use crate::models::DocumentChunk;

/// Invalid window/overlap combination. Raised before any chunking happens.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChunkError {
    #[error("chunk window size must be > 0")]
    ZeroWindow,
    #[error("chunk overlap ({overlap}) must be smaller than the window size ({window})")]
    OverlapTooLarge { window: usize, overlap: usize },
}

/// Check a window/overlap pair without chunking anything.
pub fn validate_window(window: usize, overlap: usize) -> Result<(), ChunkError> {
    if window == 0 {
        return Err(ChunkError::ZeroWindow);
    }
    if overlap >= window {
        return Err(ChunkError::OverlapTooLarge { window, overlap });
    }
    Ok(())
}

/// Split `text` into overlapping windows.
///
/// # Guarantees
///
/// - Chunk `i` covers `[start_i, min(start_i + window, len))` with
///   `start_0 = 0` and `start_{i+1} = start_i + window - overlap`.
/// - Text no longer than `window` (including empty text) yields exactly
///   one chunk equal to the whole text.
/// - The last chunk always ends at the content length.
/// - Same inputs always produce the same chunks, IDs and hashes included.
pub fn chunk_text(
    document_id: &str,
    text: &str,
    window: usize,
    overlap: usize,
) -> Result<Vec<DocumentChunk>, ChunkError> {
    validate_window(window, overlap)?;

    // Byte offset of every char boundary, with text.len() as the sentinel.
    let boundaries: Vec<usize> = text
        .char_indices()
        .map(|(i, _)| i)
        .chain(std::iter::once(text.len()))
        .collect();
    let len = boundaries.len() - 1;

    if len <= window {
        return Ok(vec![make_chunk(document_id, 0, text, 0, len)]);
    }

    let step = window - overlap;
    let mut chunks = Vec::with_capacity(len.div_ceil(step));
    let mut start = 0;
    let mut index = 0;

    while start < len {
        let end = (start + window).min(len);
        let piece = &text[boundaries[start]..boundaries[end]];
        chunks.push(make_chunk(document_id, index, piece, start, end));
        index += 1;
        start += step;
    }

    debug!(
        document_id,
        input_chars = len,
        chunk_count = chunks.len(),
        window,
        overlap,
        "text chunked"
    );

    Ok(chunks)
}

/// SHA-256 of a string, hex encoded.
pub fn content_hash(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    format!("{:x}", hasher.finalize())
}

fn make_chunk(document_id: &str, index: usize, text: &str, start: usize, end: usize) -> DocumentChunk {
    DocumentChunk {
        id: format!("{}_chunk_{}", document_id, index),
        document_id: document_id.to_string(),
        chunk_index: index,
        text: text.to_string(),
        start,
        end,
        hash: content_hash(text),
    }
}
