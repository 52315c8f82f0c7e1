//! Opstrack Core: error type and engine configuration shared by every crate.

pub mod config;
pub mod error;

pub use config::{DataPaths, EngineSettings, SimilarityKind, TrackerConfig};
pub use error::{Error, Result};
