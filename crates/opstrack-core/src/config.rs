//! Configuration and data directory management.

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::Error;

/// Paths to the files the tracker reads from its data directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataPaths {
    /// Root data directory (e.g., `data/`).
    pub root: PathBuf,
    /// Project and work-type directory (`data/candidates.json`).
    pub candidates_file: PathBuf,
    /// LLM configuration (`data/llm-config.json`).
    pub llm_config_file: PathBuf,
}

impl DataPaths {
    /// Create data paths from a root directory. Creates the root if needed.
    pub fn new(root: impl AsRef<Path>) -> std::io::Result<Self> {
        let root = root.as_ref().to_path_buf();
        std::fs::create_dir_all(&root)?;
        Ok(Self {
            candidates_file: root.join("candidates.json"),
            llm_config_file: root.join("llm-config.json"),
            root,
        })
    }
}

/// String similarity strategy used by the fuzzy matching stage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SimilarityKind {
    /// Jaro-Winkler: shared characters in order plus a common-prefix bonus.
    #[default]
    JaroWinkler,
    /// Character-set Jaccard overlap.
    Jaccard,
}

impl std::fmt::Display for SimilarityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::JaroWinkler => write!(f, "jaro-winkler"),
            Self::Jaccard => write!(f, "jaccard"),
        }
    }
}

impl FromStr for SimilarityKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "jaro-winkler" | "jaro_winkler" | "jarowinkler" => Ok(Self::JaroWinkler),
            "jaccard" => Ok(Self::Jaccard),
            other => Err(Error::Config(format!("unknown similarity strategy: {}", other))),
        }
    }
}

/// Tunables for the resolution engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineSettings {
    /// Minimum fuzzy score for a project match.
    pub project_threshold: f64,
    /// Minimum fuzzy score for a work-type match.
    pub work_type_threshold: f64,
    pub similarity: SimilarityKind,
    /// Upper bound on a single model call.
    pub model_timeout: Duration,
    /// How long a candidate snapshot may be reused. Zero disables caching.
    pub candidate_ttl: Duration,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            project_threshold: 0.6,
            work_type_threshold: 0.5,
            similarity: SimilarityKind::JaroWinkler,
            model_timeout: Duration::from_secs(30),
            candidate_ttl: Duration::from_secs(300),
        }
    }
}

impl EngineSettings {
    /// Read settings from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read settings through an arbitrary key lookup. Unparseable values fall
    /// back to the defaults with a warning.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let project_threshold = parse_or(&lookup, "OPSTRACK_PROJECT_THRESHOLD", defaults.project_threshold)
            .clamp(0.0, 1.0);
        let work_type_threshold =
            parse_or(&lookup, "OPSTRACK_WORKTYPE_THRESHOLD", defaults.work_type_threshold)
                .clamp(0.0, 1.0);
        let similarity = parse_or(&lookup, "OPSTRACK_SIMILARITY", defaults.similarity);
        let timeout_secs = parse_or(
            &lookup,
            "OPSTRACK_MODEL_TIMEOUT_SECS",
            defaults.model_timeout.as_secs(),
        );
        let ttl_secs = parse_or(
            &lookup,
            "OPSTRACK_CANDIDATE_TTL_SECS",
            defaults.candidate_ttl.as_secs(),
        );

        Self {
            project_threshold,
            work_type_threshold,
            similarity,
            model_timeout: Duration::from_secs(timeout_secs.max(1)),
            candidate_ttl: Duration::from_secs(ttl_secs),
        }
    }
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T
where
    T: FromStr,
{
    match lookup(key) {
        Some(raw) => match raw.trim().parse() {
            Ok(v) => v,
            Err(_) => {
                warn!("Ignoring invalid {}={:?}", key, raw);
                default
            }
        },
        None => default,
    }
}

/// Top-level tracker configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackerConfig {
    /// HTTP server port.
    pub port: u16,
    /// Data directory paths.
    pub data_paths: DataPaths,
    pub engine: EngineSettings,
}

impl TrackerConfig {
    /// Create configuration from environment and defaults.
    pub fn from_env(data_dir: impl AsRef<Path>) -> std::io::Result<Self> {
        let port = std::env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(3004);

        let data_paths = DataPaths::new(data_dir)?;

        Ok(Self {
            port,
            data_paths,
            engine: EngineSettings::from_env(),
        })
    }
}
