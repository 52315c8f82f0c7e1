//! Resolvers: reconcile untrusted model output against the known projects
//! and work-type categories.
//!
//! The matcher walks a fixed ladder of stages (id, code, name, fuzzy) and the
//! stage that hits decides the confidence band. The validator applies it to
//! each raw entry and the aggregator assembles the final result.

pub mod aggregate;
pub mod matcher;
pub mod similarity;
pub mod types;
pub mod validate;

pub use aggregate::aggregate;
pub use matcher::EntityResolver;
pub use similarity::{similarity_for, CharJaccard, JaroWinkler, StringSimilarity};
pub use types::*;
pub use validate::EntryValidator;
