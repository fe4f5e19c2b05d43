//! # doclens
//!
//! Document analysis for plain text, Markdown, and PDF files.
//!
//! doclens ingests a document, splits it into overlapping character
//! windows, computes local readability statistics, and asks a language
//! model for summaries, insights, keywords, study questions, and answers.
//! Model replies are free text; the parser recovers structured fields from
//! JSON when present and from labelled lines otherwise. When no model is
//! configured, or a call fails, every operation still returns a result
//! built from local heuristics and marked as degraded.
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────┐   ┌──────────────┐   ┌─────────────┐
//! │ Processors │──▶│   Chunker    │──▶│    Store    │
//! │ txt/md/pdf │   │ char windows │   │ (in memory) │
//! └────────────┘   └──────────────┘   └──────┬──────┘
//!                                            │
//!                  ┌─────────────────────────┤
//!                  ▼                         ▼
//!           ┌─────────────┐          ┌──────────────┐
//!           │  Retriever  │          │   Provider   │──▶ Parser
//!           │  (keyword)  │          │ OpenAI/Ollama│
//!           └─────────────┘          └──────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! doclens stats report.pdf
//! doclens chunk notes.md --window 500 --overlap 50
//! doclens --config doclens.toml insights report.pdf --json
//! doclens --config doclens.toml ask report.pdf "What was the revenue?"
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`analyzer`] | Orchestrates ingestion and analysis |
//! | [`chunk`] | Overlapping character-window chunking |
//! | [`config`] | TOML configuration parsing |
//! | [`insights`] | Local text statistics and readability |
//! | [`models`] | Core data types |
//! | [`parse`] | Structured field recovery from model output |
//! | [`processor`] | File-to-text extraction |
//! | [`provider`] | Language model providers |
//! | [`report`] | Human-readable CLI output |
//! | [`retrieve`] | Keyword-match chunk ranking |
//! | [`store`] | Document storage |

pub mod analyzer;
pub mod chunk;
pub mod config;
pub mod insights;
pub mod models;
pub mod parse;
pub mod processor;
pub mod provider;
pub mod report;
pub mod retrieve;
pub mod store;
