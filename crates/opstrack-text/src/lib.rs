//! Opstrack Text: worklog text normalization, keyword hints and the static
//! vocabulary they read from.

pub mod hints;
pub mod normalizer;
pub mod vocab;

pub use hints::{extract_hints, hint_tags, suggested_codes, Hint};
pub use normalizer::{expand_aliases, normalize, strip_postposition};
pub use vocab::KeywordKind;
