//! External LLM provider calls.
//!
//! OpenAI and Groq share the chat-completions format; Anthropic uses the
//! Messages API with a separate system field. Calls are non-streaming: the
//! engine needs the whole JSON reply before it can validate anything.

use reqwest::Client;
use serde_json::{json, Value};
use tracing::{debug, error};

use opstrack_core::{Error, Result};

use crate::types::{ChatMessage, LLMProvider};

const OPENAI_URL: &str = "https://api.openai.com/v1";
const GROQ_URL: &str = "https://api.groq.com/openai/v1";
const ANTHROPIC_URL: &str = "https://api.anthropic.com/v1";
const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Request parameters for one completion.
#[derive(Debug, Clone)]
pub struct CompletionRequest<'a> {
    pub messages: &'a [ChatMessage],
    pub model: &'a str,
    pub api_key: &'a str,
    pub temperature: f64,
    pub max_tokens: usize,
}

/// Run a completion and return the reply text.
pub async fn complete(
    client: &Client,
    provider: LLMProvider,
    request: &CompletionRequest<'_>,
) -> Result<String> {
    match provider {
        LLMProvider::OpenAI => complete_openai_compat(client, OPENAI_URL, request).await,
        LLMProvider::Groq => complete_openai_compat(client, GROQ_URL, request).await,
        LLMProvider::Anthropic => complete_anthropic(client, request).await,
    }
}

/// Complete against OpenAI-compatible APIs (OpenAI, Groq) in JSON mode.
async fn complete_openai_compat(
    client: &Client,
    base_url: &str,
    request: &CompletionRequest<'_>,
) -> Result<String> {
    let msgs: Vec<Value> = request
        .messages
        .iter()
        .map(|m| json!({"role": m.role, "content": m.content}))
        .collect();

    let body = json!({
        "model": request.model,
        "messages": msgs,
        "temperature": request.temperature,
        "max_tokens": request.max_tokens,
        "response_format": {"type": "json_object"},
    });

    let url = format!("{}/chat/completions", base_url);
    debug!("Completing via {} with model {}", url, request.model);

    let response = client
        .post(&url)
        .header("Authorization", format!("Bearer {}", request.api_key))
        .header("Content-Type", "application/json")
        .json(&body)
        .send()
        .await
        .map_err(request_error)?;

    let parsed = read_success(response).await?;
    parsed["choices"][0]["message"]["content"]
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| Error::Invocation("completion has no message content".into()))
}

/// Complete against Anthropic's Messages API.
async fn complete_anthropic(client: &Client, request: &CompletionRequest<'_>) -> Result<String> {
    // Separate system message from conversation
    let system_msg: Option<&str> = request
        .messages
        .iter()
        .find(|m| m.role == "system")
        .map(|m| m.content.as_str());

    let conv_msgs: Vec<Value> = request
        .messages
        .iter()
        .filter(|m| m.role != "system")
        .map(|m| json!({"role": m.role, "content": m.content}))
        .collect();

    let mut body = json!({
        "model": request.model,
        "messages": conv_msgs,
        "temperature": request.temperature,
        "max_tokens": request.max_tokens,
    });
    if let Some(sys) = system_msg {
        body["system"] = json!(sys);
    }

    debug!("Completing via Anthropic with model {}", request.model);

    let response = client
        .post(format!("{}/messages", ANTHROPIC_URL))
        .header("x-api-key", request.api_key)
        .header("anthropic-version", ANTHROPIC_VERSION)
        .header("Content-Type", "application/json")
        .json(&body)
        .send()
        .await
        .map_err(request_error)?;

    let parsed = read_success(response).await?;
    let text: String = parsed["content"]
        .as_array()
        .map(|blocks| {
            blocks
                .iter()
                .filter(|b| b["type"] == "text")
                .filter_map(|b| b["text"].as_str())
                .collect()
        })
        .unwrap_or_default();

    if text.is_empty() {
        return Err(Error::Invocation("completion has no text content".into()));
    }
    Ok(text)
}

/// Check that a key and endpoint answer, without generating anything large.
pub async fn probe(client: &Client, provider: LLMProvider, model: &str, api_key: &str) -> Result<()> {
    let response = match provider {
        LLMProvider::OpenAI | LLMProvider::Groq => {
            let base = if provider == LLMProvider::OpenAI { OPENAI_URL } else { GROQ_URL };
            client
                .get(format!("{}/models", base))
                .header("Authorization", format!("Bearer {}", api_key))
                .send()
                .await
        }
        LLMProvider::Anthropic => {
            client
                .post(format!("{}/messages", ANTHROPIC_URL))
                .header("x-api-key", api_key)
                .header("anthropic-version", ANTHROPIC_VERSION)
                .header("Content-Type", "application/json")
                .json(&json!({
                    "model": model,
                    "max_tokens": 1,
                    "messages": [{"role": "user", "content": "Hi"}],
                }))
                .send()
                .await
        }
    }
    .map_err(request_error)?;

    if response.status().is_success() {
        Ok(())
    } else {
        Err(Error::Invocation(format!("API returned status {}", response.status())))
    }
}

async fn read_success(response: reqwest::Response) -> Result<Value> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        error!("Provider returned {}: {}", status, body);
        return Err(Error::Invocation(format!("API error {}: {}", status, body)));
    }
    response
        .json::<Value>()
        .await
        .map_err(|e| Error::Invocation(format!("unreadable provider response: {}", e)))
}

fn request_error(e: reqwest::Error) -> Error {
    if e.is_timeout() {
        Error::Invocation(format!("request timed out: {}", e))
    } else {
        Error::Http(format!("Request failed: {}", e))
    }
}
