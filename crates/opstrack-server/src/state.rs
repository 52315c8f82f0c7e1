//! Shared application state.

use std::sync::Arc;

use opstrack_core::TrackerConfig;
use opstrack_llm::{client_from_config, GenerativeClient, LLMConfig};
use opstrack_runtime::{CachedCandidateProvider, CandidateProvider, JsonCandidateProvider, WorklogParser};

/// Shared application state accessible from all route handlers.
pub struct AppState {
    pub config: TrackerConfig,
    pub parser: WorklogParser,
    pub candidates: Arc<CachedCandidateProvider>,
}

impl AppState {
    /// Wire the parser from configuration: the LLM config file next to the
    /// data dir and the `candidates.json` directory behind a TTL cache.
    pub fn new(config: TrackerConfig) -> Self {
        let llm_config = LLMConfig::load(&config.data_paths.llm_config_file);
        let client = client_from_config(&llm_config, config.engine.model_timeout);
        let directory: Arc<dyn CandidateProvider> =
            Arc::new(JsonCandidateProvider::new(&config.data_paths.candidates_file));
        Self::with_parts(config, client, directory)
    }

    /// Build state around an explicit client and candidate source.
    pub fn with_parts(
        config: TrackerConfig,
        client: Arc<dyn GenerativeClient>,
        directory: Arc<dyn CandidateProvider>,
    ) -> Self {
        let candidates = Arc::new(CachedCandidateProvider::new(
            directory,
            config.engine.candidate_ttl,
        ));
        let parser = WorklogParser::new(client, candidates.clone(), &config.engine);
        Self {
            config,
            parser,
            candidates,
        }
    }
}
