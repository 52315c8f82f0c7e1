//! Generative model access for worklog parsing.
//!
//! The engine talks to the model only through [`GenerativeClient`], so tests
//! and alternative backends can be injected. The HTTP implementation sends a
//! single non-streaming completion and extracts the JSON object from the
//! reply text.

pub mod client;
pub mod config;
pub mod extract;
pub mod providers;
pub mod types;

pub use client::{client_from_config, GenerativeClient, HttpGenerativeClient, UnconfiguredClient};
pub use config::LLMConfig;
pub use extract::extract_json;
pub use types::*;
