//! LLM configuration loading and provider selection.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::types::{LLMProvider, ResolvedProvider};

pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_ANTHROPIC_MODEL: &str = "claude-3-5-haiku-20241022";
pub const DEFAULT_GROQ_MODEL: &str = "llama-3.3-70b-versatile";

/// Structured extraction wants near-deterministic output.
pub const DEFAULT_TEMPERATURE: f64 = 0.1;
pub const DEFAULT_MAX_TOKENS: usize = 2048;

/// Stored LLM configuration (llm-config.json).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LLMConfig {
    #[serde(default = "default_preferred")]
    pub preferred_provider: String,
    #[serde(default)]
    pub openai_api_key: Option<String>,
    #[serde(default)]
    pub anthropic_api_key: Option<String>,
    #[serde(default)]
    pub groq_api_key: Option<String>,
    #[serde(default = "default_openai_model")]
    pub openai_model: String,
    #[serde(default = "default_anthropic_model")]
    pub anthropic_model: String,
    #[serde(default = "default_groq_model")]
    pub groq_model: String,
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: usize,
    /// Path the config was loaded from.
    #[serde(skip)]
    pub config_path: PathBuf,
}

fn default_preferred() -> String {
    "auto".into()
}
fn default_openai_model() -> String {
    DEFAULT_OPENAI_MODEL.into()
}
fn default_anthropic_model() -> String {
    DEFAULT_ANTHROPIC_MODEL.into()
}
fn default_groq_model() -> String {
    DEFAULT_GROQ_MODEL.into()
}
fn default_temperature() -> f64 {
    DEFAULT_TEMPERATURE
}
fn default_max_tokens() -> usize {
    DEFAULT_MAX_TOKENS
}

impl Default for LLMConfig {
    fn default() -> Self {
        Self {
            preferred_provider: "auto".into(),
            openai_api_key: None,
            anthropic_api_key: None,
            groq_api_key: None,
            openai_model: DEFAULT_OPENAI_MODEL.into(),
            anthropic_model: DEFAULT_ANTHROPIC_MODEL.into(),
            groq_model: DEFAULT_GROQ_MODEL.into(),
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
            config_path: PathBuf::new(),
        }
    }
}

impl LLMConfig {
    /// Load config from file, falling back to env vars and defaults.
    pub fn load(config_path: &Path) -> Self {
        let mut config: LLMConfig = match std::fs::read_to_string(config_path) {
            Ok(s) => serde_json::from_str(&s).unwrap_or_else(|e| {
                warn!("Ignoring malformed {}: {}", config_path.display(), e);
                LLMConfig::default()
            }),
            Err(_) => LLMConfig::default(),
        };

        config.config_path = config_path.to_path_buf();

        // Env vars as fallback for API keys
        if config.openai_api_key.is_none() {
            config.openai_api_key = std::env::var("OPENAI_API_KEY").ok();
        }
        if config.anthropic_api_key.is_none() {
            config.anthropic_api_key = std::env::var("ANTHROPIC_API_KEY").ok();
        }
        if config.groq_api_key.is_none() {
            config.groq_api_key = std::env::var("GROQ_API_KEY").ok();
        }

        match config.resolve_provider() {
            Some(p) => info!("LLM provider: {} ({})", p.provider, p.model),
            None => warn!("No LLM provider configured; worklog parsing will degrade"),
        }

        config
    }

    /// Resolve which provider and model to use.
    pub fn resolve_provider(&self) -> Option<ResolvedProvider> {
        let pick = |provider: LLMProvider, model: &str, key: &Option<String>| {
            key.as_ref()
                .filter(|k| !k.trim().is_empty())
                .map(|k| ResolvedProvider {
                    provider,
                    model: model.to_string(),
                    api_key: k.clone(),
                })
        };

        // Explicit preference
        if self.preferred_provider != "auto" {
            return match self.preferred_provider.as_str() {
                "openai" => pick(LLMProvider::OpenAI, &self.openai_model, &self.openai_api_key),
                "anthropic" => pick(
                    LLMProvider::Anthropic,
                    &self.anthropic_model,
                    &self.anthropic_api_key,
                ),
                "groq" => pick(LLMProvider::Groq, &self.groq_model, &self.groq_api_key),
                _ => None,
            };
        }

        // Auto mode: Anthropic > Groq > OpenAI
        pick(LLMProvider::Anthropic, &self.anthropic_model, &self.anthropic_api_key)
            .or_else(|| pick(LLMProvider::Groq, &self.groq_model, &self.groq_api_key))
            .or_else(|| pick(LLMProvider::OpenAI, &self.openai_model, &self.openai_api_key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auto_prefers_anthropic_then_groq() {
        let mut config = LLMConfig {
            groq_api_key: Some("gsk".into()),
            openai_api_key: Some("sk".into()),
            ..Default::default()
        };
        assert_eq!(config.resolve_provider().unwrap().provider, LLMProvider::Groq);

        config.anthropic_api_key = Some("ak".into());
        let resolved = config.resolve_provider().unwrap();
        assert_eq!(resolved.provider, LLMProvider::Anthropic);
        assert_eq!(resolved.model, DEFAULT_ANTHROPIC_MODEL);
    }

    #[test]
    fn test_explicit_preference_without_key() {
        let config = LLMConfig {
            preferred_provider: "openai".into(),
            groq_api_key: Some("gsk".into()),
            ..Default::default()
        };
        assert!(config.resolve_provider().is_none());
    }

    #[test]
    fn test_blank_keys_are_ignored() {
        let config = LLMConfig {
            anthropic_api_key: Some("  ".into()),
            ..Default::default()
        };
        assert!(config.resolve_provider().is_none());
    }

    #[test]
    fn test_load_reads_file_and_defaults_missing_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("llm-config.json");
        std::fs::write(
            &path,
            r#"{"preferred_provider": "groq", "groq_api_key": "gsk", "groq_model": "llama-3.1-8b-instant"}"#,
        )
        .unwrap();

        let config = LLMConfig::load(&path);
        assert_eq!(config.config_path, path);
        assert_eq!(config.temperature, DEFAULT_TEMPERATURE);
        let resolved = config.resolve_provider().unwrap();
        assert_eq!(resolved.provider, LLMProvider::Groq);
        assert_eq!(resolved.model, "llama-3.1-8b-instant");
    }
}
