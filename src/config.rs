//! TOML configuration.
//!
//! Every section and field has a default, so an empty file (or no file at
//! all, via [`Config::default`]) is a valid configuration with the
//! provider disabled.
//!
//! ```toml
//! [chunking]
//! window_size = 1000
//! overlap = 200
//!
//! [provider]
//! kind = "openai"          # disabled | openai | ollama
//! model = "gpt-4o-mini"
//! timeout_secs = 60
//!
//! [analysis]
//! max_context_chars = 6000
//! ```

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

use crate::chunk::validate_window;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub chunking: ChunkingConfig,
    #[serde(default)]
    pub provider: ProviderConfig,
    #[serde(default)]
    pub analysis: AnalysisConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChunkingConfig {
    /// Window size in characters.
    #[serde(default = "default_window_size")]
    pub window_size: usize,
    /// Characters shared by consecutive windows. Must be smaller than `window_size`.
    #[serde(default = "default_overlap")]
    pub overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            window_size: default_window_size(),
            overlap: default_overlap(),
        }
    }
}

fn default_window_size() -> usize {
    1000
}
fn default_overlap() -> usize {
    200
}

#[derive(Debug, Deserialize, Clone)]
pub struct ProviderConfig {
    #[serde(default = "default_kind")]
    pub kind: String,
    #[serde(default)]
    pub model: Option<String>,
    /// Overrides the provider's default endpoint (OpenAI-compatible gateways, remote Ollama).
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            kind: default_kind(),
            model: None,
            base_url: None,
            timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
            temperature: default_temperature(),
        }
    }
}

impl ProviderConfig {
    pub fn is_enabled(&self) -> bool {
        self.kind != "disabled"
    }
}

fn default_kind() -> String {
    "disabled".to_string()
}
fn default_timeout_secs() -> u64 {
    60
}
fn default_max_retries() -> u32 {
    2
}
fn default_temperature() -> f32 {
    0.3
}

#[derive(Debug, Deserialize, Clone)]
pub struct AnalysisConfig {
    /// Maximum characters of document text included in one prompt.
    #[serde(default = "default_max_context_chars")]
    pub max_context_chars: usize,
    #[serde(default = "default_max_questions")]
    pub max_questions: usize,
    /// Deadline for one provider call, retries included.
    #[serde(default = "default_call_deadline_secs")]
    pub call_deadline_secs: u64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            max_context_chars: default_max_context_chars(),
            max_questions: default_max_questions(),
            call_deadline_secs: default_call_deadline_secs(),
        }
    }
}

fn default_max_context_chars() -> usize {
    6000
}
fn default_max_questions() -> usize {
    5
}
fn default_call_deadline_secs() -> u64 {
    300
}

/// Read, parse, and validate a config file.
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    let config = parse_config(&content)?;
    Ok(config)
}

/// Parse and validate config text.
pub fn parse_config(content: &str) -> Result<Config> {
    let config: Config = toml::from_str(content).with_context(|| "Failed to parse config file")?;
    validate(&config)?;
    Ok(config)
}

pub fn validate(config: &Config) -> Result<()> {
    validate_window(config.chunking.window_size, config.chunking.overlap)
        .context("Invalid [chunking] section")?;

    if config.analysis.max_context_chars == 0 {
        anyhow::bail!("analysis.max_context_chars must be > 0");
    }

    match config.provider.kind.as_str() {
        "disabled" | "openai" | "ollama" => {}
        other => anyhow::bail!(
            "Unknown provider kind: '{}'. Must be disabled, openai, or ollama.",
            other
        ),
    }

    if config.provider.is_enabled() && config.provider.model.is_none() {
        anyhow::bail!(
            "provider.model must be specified when provider kind is '{}'",
            config.provider.kind
        );
    }

    if config.analysis.call_deadline_secs == 0 {
        anyhow::bail!("analysis.call_deadline_secs must be > 0");
    }

    if config.provider.timeout_secs == 0 {
        anyhow::bail!("provider.timeout_secs must be > 0");
    }

    Ok(())
}
