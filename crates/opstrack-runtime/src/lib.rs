//! Worklog parse runtime: wires normalization, the candidate directory, the
//! generative model and entry resolution into one request pipeline.

pub mod candidates;
pub mod parser;
pub mod prompt;
pub mod types;

pub use candidates::{CachedCandidateProvider, CandidateProvider, JsonCandidateProvider, StaticCandidates};
pub use parser::WorklogParser;
pub use prompt::{Prompt, PromptBuilder};
pub use types::*;
