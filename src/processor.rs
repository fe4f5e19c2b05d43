//! Document processors: turn a file on disk into plain UTF-8 text.
//!
//! A [`DocumentProcessor`] declares which paths it handles and extracts
//! their text. [`ProcessorRegistry`] picks the first registered processor
//! whose [`supports`](DocumentProcessor::supports) matches, by file
//! extension (case-insensitive).
//!
//! ```rust
//! use doclens::processor::ProcessorRegistry;
//! use std::path::Path;
//!
//! let registry = ProcessorRegistry::with_defaults();
//! assert!(registry.find(Path::new("notes.MD")).is_some());
//! assert!(registry.find(Path::new("image.png")).is_none());
//! ```

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("no processor supports {}", .0.display())]
    Unsupported(PathBuf),
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{} is not valid UTF-8 text", .0.display())]
    NotUtf8(PathBuf),
    #[error("PDF extraction failed for {}: {message}", .path.display())]
    Pdf { path: PathBuf, message: String },
}

/// Text extracted from a file plus what the processor learned about it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessingResult {
    pub text: String,
    /// Detected file type (e.g. `"text"`, `"markdown"`, `"pdf"`).
    pub file_type: String,
    pub size_bytes: u64,
}

/// Extracts text from one family of file formats.
pub trait DocumentProcessor: Send + Sync {
    fn name(&self) -> &str;

    /// Whether this processor can handle `path`.
    fn supports(&self, path: &Path) -> bool;

    fn process(&self, path: &Path) -> Result<ProcessingResult, ProcessError>;
}

fn extension_lower(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
}

fn read_bytes(path: &Path) -> Result<Vec<u8>, ProcessError> {
    std::fs::read(path).map_err(|source| ProcessError::Io {
        path: path.to_path_buf(),
        source,
    })
}

// ============ Plain text ============

/// Plain text and Markdown files.
pub struct TextProcessor;

const TEXT_EXTENSIONS: &[&str] = &["txt", "text", "md", "markdown"];

impl DocumentProcessor for TextProcessor {
    fn name(&self) -> &str {
        "text"
    }

    fn supports(&self, path: &Path) -> bool {
        extension_lower(path).is_some_and(|e| TEXT_EXTENSIONS.contains(&e.as_str()))
    }

    fn process(&self, path: &Path) -> Result<ProcessingResult, ProcessError> {
        let bytes = read_bytes(path)?;
        let size_bytes = bytes.len() as u64;
        let text = String::from_utf8(bytes).map_err(|_| ProcessError::NotUtf8(path.to_path_buf()))?;
        let file_type = match extension_lower(path).as_deref() {
            Some("md") | Some("markdown") => "markdown",
            _ => "text",
        };
        Ok(ProcessingResult {
            text,
            file_type: file_type.to_string(),
            size_bytes,
        })
    }
}

// ============ PDF ============

/// PDF files, via `pdf-extract`.
pub struct PdfProcessor;

impl DocumentProcessor for PdfProcessor {
    fn name(&self) -> &str {
        "pdf"
    }

    fn supports(&self, path: &Path) -> bool {
        extension_lower(path).as_deref() == Some("pdf")
    }

    fn process(&self, path: &Path) -> Result<ProcessingResult, ProcessError> {
        let bytes = read_bytes(path)?;
        let text = pdf_extract::extract_text_from_mem(&bytes).map_err(|e| ProcessError::Pdf {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Ok(ProcessingResult {
            text,
            file_type: "pdf".to_string(),
            size_bytes: bytes.len() as u64,
        })
    }
}

// ============ Registry ============

/// Ordered set of processors; the first match wins.
pub struct ProcessorRegistry {
    processors: Vec<Box<dyn DocumentProcessor>>,
}

impl ProcessorRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            processors: Vec::new(),
        }
    }

    /// Registry with the built-in text and PDF processors.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(TextProcessor));
        registry.register(Box::new(PdfProcessor));
        registry
    }

    pub fn register(&mut self, processor: Box<dyn DocumentProcessor>) {
        self.processors.push(processor);
    }

    pub fn find(&self, path: &Path) -> Option<&dyn DocumentProcessor> {
        self.processors
            .iter()
            .find(|p| p.supports(path))
            .map(|p| p.as_ref())
    }

    /// Extract text from `path` with the first processor that supports it.
    pub fn process(&self, path: &Path) -> Result<ProcessingResult, ProcessError> {
        let processor = self
            .find(path)
            .ok_or_else(|| ProcessError::Unsupported(path.to_path_buf()))?;
        debug!(path = %path.display(), processor = processor.name(), "processing document");
        processor.process(path)
    }

    pub fn is_empty(&self) -> bool {
        self.processors.is_empty()
    }
}

impl Default for ProcessorRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}
