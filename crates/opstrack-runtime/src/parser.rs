//! Worklog parser: the top-level resolution pipeline.
//!
//! text → normalize → hints → prompt → model → validate → aggregate.
//! `parse` never fails: every failure path ends as a warning on an
//! otherwise empty result.

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

use opstrack_core::{EngineSettings, Error, Result};
use opstrack_llm::GenerativeClient;
use opstrack_resolve::{aggregate, CandidateEntity, EntityResolver, EntryValidator, ParseResult};
use opstrack_text::{extract_hints, hint_tags, normalize};

use crate::candidates::CandidateProvider;
use crate::prompt::PromptBuilder;
use crate::types::{HealthState, HealthStatus, ParseRequest};

/// Resolves free-text worklogs into structured entries.
pub struct WorklogParser {
    client: Arc<dyn GenerativeClient>,
    candidates: Arc<dyn CandidateProvider>,
    resolver: EntityResolver,
    model_timeout: Duration,
}

impl WorklogParser {
    pub fn new(
        client: Arc<dyn GenerativeClient>,
        candidates: Arc<dyn CandidateProvider>,
        settings: &EngineSettings,
    ) -> Self {
        let resolver = EntityResolver::from_settings(settings);
        info!(
            "Worklog parser ready: model={}, similarity={}, timeout={}s",
            client.model(),
            resolver.similarity_name(),
            settings.model_timeout.as_secs()
        );
        Self {
            client,
            candidates,
            resolver,
            model_timeout: settings.model_timeout,
        }
    }

    /// Parse one free-text report.
    pub async fn parse(&self, request: &ParseRequest) -> ParseResult {
        let request_id = Uuid::new_v4();
        let span = info_span!("parse", %request_id, user_id = %request.user_id);
        self.parse_inner(request).instrument(span).await
    }

    async fn parse_inner(&self, request: &ParseRequest) -> ParseResult {
        let normalized = normalize(&request.text);
        if normalized.is_empty() {
            warn!("Empty worklog text");
            return ParseResult::degraded("No worklog text to parse");
        }

        let hints = extract_hints(&normalized);
        debug!("Hints: {:?}", hint_tags(&hints));

        let (projects, work_types) = match self.load_pools().await {
            Ok(pools) => pools,
            Err(e) => {
                warn!("Candidate load failed: {}", e);
                return ParseResult::degraded(format!("Failed to load candidates: {}", e));
            }
        };

        let prompt = PromptBuilder::new(&normalized, request.target_date)
            .hints(&hints)
            .projects(&projects)
            .work_types(&work_types)
            .build();
        debug!("Prompt: {} chars", prompt.user.chars().count());

        let response = match self.invoke(&prompt.user, &prompt.system).await {
            Ok(v) => v,
            Err(e) => {
                warn!("Model invocation failed: {}", e);
                return ParseResult::degraded(e.to_string());
            }
        };

        let (raw_entries, mut warnings) = match split_response(response) {
            Ok(parts) => parts,
            Err(e) => {
                warn!("Unusable model response: {}", e);
                return ParseResult::degraded(e.to_string());
            }
        };

        let validator = EntryValidator::new(&self.resolver);
        let (entries, entry_warnings) = validator.validate_all(&raw_entries, &projects, &work_types);
        warnings.extend(entry_warnings);

        let result = aggregate(entries, warnings);
        info!(
            "Parsed {} entries ({}h, {} warnings)",
            result.entries.len(),
            result.total_hours,
            result.warnings.len()
        );
        result
    }

    /// One snapshot of both pools for the whole request.
    async fn load_pools(&self) -> Result<(Vec<CandidateEntity>, Vec<CandidateEntity>)> {
        self.candidates.list_active().await
    }

    async fn invoke(&self, prompt: &str, system_prompt: &str) -> Result<Value> {
        match tokio::time::timeout(
            self.model_timeout,
            self.client.generate_structured(prompt, system_prompt),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(Error::Timeout(self.model_timeout)),
        }
    }

    /// Probe the model. Never fails; problems are reported in the status.
    pub async fn check_health(&self) -> HealthStatus {
        let model = self.client.model().to_string();
        let probe = match tokio::time::timeout(self.model_timeout, self.client.health()).await {
            Ok(result) => result,
            Err(_) => Err(Error::Timeout(self.model_timeout)),
        };

        match probe {
            Ok(()) => HealthStatus {
                status: HealthState::Healthy,
                model,
                message: "Model is reachable".into(),
            },
            Err(e) => {
                warn!("Model health check failed: {}", e);
                HealthStatus {
                    status: HealthState::Unhealthy,
                    model,
                    message: e.to_string(),
                }
            }
        }
    }
}

/// Pull `entries` and model `warnings` out of the reply. A bare array is
/// taken as the entries list.
fn split_response(response: Value) -> Result<(Vec<Value>, Vec<String>)> {
    match response {
        Value::Array(entries) => Ok((entries, Vec::new())),
        Value::Object(mut obj) => {
            let entries = match obj.remove("entries") {
                Some(Value::Array(entries)) => entries,
                Some(Value::Null) | None => Vec::new(),
                Some(_) => {
                    return Err(Error::ResponseFormat("\"entries\" is not an array".into()))
                }
            };
            let warnings = match obj.remove("warnings") {
                Some(Value::Array(items)) => items
                    .into_iter()
                    .filter_map(|w| match w {
                        Value::String(s) if !s.trim().is_empty() => Some(s),
                        _ => None,
                    })
                    .collect(),
                Some(Value::String(s)) if !s.trim().is_empty() => vec![s],
                _ => Vec::new(),
            };
            Ok((entries, warnings))
        }
        other => Err(Error::ResponseFormat(format!(
            "expected a JSON object, got {}",
            other
        ))),
    }
}
