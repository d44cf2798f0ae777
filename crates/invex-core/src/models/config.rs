//! Configuration structures for the extraction pipeline.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{InvexError, Result};

/// Main configuration for the invex pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InvexConfig {
    /// Hosted model configuration.
    pub llm: LlmConfig,

    /// Text extraction and classification configuration.
    pub extraction: ExtractionConfig,

    /// CSV export configuration.
    pub export: ExportConfig,
}

impl Default for InvexConfig {
    fn default() -> Self {
        Self {
            llm: LlmConfig::default(),
            extraction: ExtractionConfig::default(),
            export: ExportConfig::default(),
        }
    }
}

/// Hosted model endpoint configuration.
///
/// The API key is deliberately not part of the config file; it is read from
/// the environment at call time.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Base URL of an OpenAI-compatible API.
    pub base_url: String,

    /// Model identifier.
    pub model: String,

    /// Sampling temperature.
    pub temperature: f64,

    /// Request timeout in seconds.
    pub timeout_secs: u64,

    /// Maximum characters of document text embedded into the prompt.
    pub max_prompt_chars: usize,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.groq.com/openai/v1".to_string(),
            model: "llama-3.1-8b-instant".to_string(),
            temperature: 0.0,
            timeout_secs: 60,
            max_prompt_chars: 12_000,
        }
    }
}

/// Text extraction and classification configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Character cap for the raw-text fallback preview.
    pub preview_chars: usize,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            preview_chars: 2000,
        }
    }
}

/// CSV export configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Directory under which session export directories are created.
    pub output_dir: PathBuf,

    /// Also write one CSV per invoice next to the combined file.
    pub per_invoice: bool,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("exports"),
            per_invoice: true,
        }
    }
}

impl InvexConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &std::path::Path) -> std::result::Result<Self, std::io::Error> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string()))
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &std::path::Path) -> std::result::Result<(), std::io::Error> {
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string()))?;
        std::fs::write(path, content)
    }

    /// Look up a value by dotted key (e.g. "llm.model").
    pub fn lookup(&self, key: &str) -> Option<serde_json::Value> {
        let json = serde_json::to_value(self).ok()?;
        let mut current = json;
        for part in key.split('.') {
            current = current.get(part)?.clone();
        }
        Some(current)
    }

    /// Set a value by dotted key, keeping the rest of the config intact.
    ///
    /// Fails when the path does not exist, points into a non-object, or the
    /// new value does not fit the field's type.
    pub fn set_key(&mut self, key: &str, value: serde_json::Value) -> Result<()> {
        let mut json = serde_json::to_value(&*self)
            .map_err(|e| InvexError::Config(e.to_string()))?;

        let parts: Vec<&str> = key.split('.').collect();
        let mut current = &mut json;

        for (i, part) in parts.iter().enumerate() {
            if i == parts.len() - 1 {
                let obj = current
                    .as_object_mut()
                    .ok_or_else(|| InvexError::Config(format!("not an object path: {key}")))?;
                if !obj.contains_key(*part) {
                    return Err(InvexError::Config(format!("unknown configuration key: {key}")));
                }
                obj.insert((*part).to_string(), value.clone());
            } else {
                current = current
                    .get_mut(*part)
                    .ok_or_else(|| InvexError::Config(format!("unknown configuration key: {key}")))?;
            }
        }

        *self = serde_json::from_value(json)
            .map_err(|e| InvexError::Config(format!("invalid value for {key}: {e}")))?;
        Ok(())
    }
}
