//! The generative client seam.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, info, warn};

use opstrack_core::{Error, Result};

use crate::config::LLMConfig;
use crate::extract::extract_json;
use crate::providers::{self, CompletionRequest};
use crate::types::{ChatMessage, ResolvedProvider};

/// A model that turns a prompt into a JSON value.
#[async_trait]
pub trait GenerativeClient: Send + Sync {
    /// Generate a structured (JSON) reply for the prompt.
    async fn generate_structured(&self, prompt: &str, system_prompt: &str) -> Result<Value>;

    /// Check that the model endpoint is reachable and accepts our key.
    async fn health(&self) -> Result<()>;

    /// Model name reported in health checks.
    fn model(&self) -> &str;
}

/// Generative client backed by a hosted provider over HTTP.
pub struct HttpGenerativeClient {
    http: reqwest::Client,
    resolved: ResolvedProvider,
    temperature: f64,
    max_tokens: usize,
}

impl HttpGenerativeClient {
    /// Build a client for the configured provider, or `None` if no provider
    /// has a key.
    pub fn from_config(config: &LLMConfig, timeout: Duration) -> Result<Option<Self>> {
        let Some(resolved) = config.resolve_provider() else {
            return Ok(None);
        };
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Http(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Some(Self {
            http,
            resolved,
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        }))
    }

    pub fn provider(&self) -> &ResolvedProvider {
        &self.resolved
    }
}

#[async_trait]
impl GenerativeClient for HttpGenerativeClient {
    async fn generate_structured(&self, prompt: &str, system_prompt: &str) -> Result<Value> {
        let messages = [ChatMessage::system(system_prompt), ChatMessage::user(prompt)];
        let request = CompletionRequest {
            messages: &messages,
            model: &self.resolved.model,
            api_key: &self.resolved.api_key,
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };

        let reply = providers::complete(&self.http, self.resolved.provider, &request).await?;
        debug!("Model replied with {} chars", reply.len());
        extract_json(&reply)
    }

    async fn health(&self) -> Result<()> {
        providers::probe(
            &self.http,
            self.resolved.provider,
            &self.resolved.model,
            &self.resolved.api_key,
        )
        .await
    }

    fn model(&self) -> &str {
        &self.resolved.model
    }
}

/// Stand-in used when no provider is configured. Every call fails, so the
/// engine degrades to warnings instead of refusing to start.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnconfiguredClient;

const UNCONFIGURED: &str = "No LLM provider configured";

#[async_trait]
impl GenerativeClient for UnconfiguredClient {
    async fn generate_structured(&self, _prompt: &str, _system_prompt: &str) -> Result<Value> {
        Err(Error::Invocation(UNCONFIGURED.into()))
    }

    async fn health(&self) -> Result<()> {
        Err(Error::Config(UNCONFIGURED.into()))
    }

    fn model(&self) -> &str {
        "none"
    }
}

/// Pick the client for this configuration.
pub fn client_from_config(config: &LLMConfig, timeout: Duration) -> Arc<dyn GenerativeClient> {
    match HttpGenerativeClient::from_config(config, timeout) {
        Ok(Some(client)) => {
            info!(
                "Generative client: {} ({})",
                client.resolved.provider, client.resolved.model
            );
            Arc::new(client)
        }
        Ok(None) => Arc::new(UnconfiguredClient),
        Err(e) => {
            warn!("Generative client unavailable: {}", e);
            Arc::new(UnconfiguredClient)
        }
    }
}
