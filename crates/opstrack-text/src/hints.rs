//! Keyword hint extraction: advisory signals for the model prompt.

use serde::Serialize;

use crate::vocab::{KeywordKind, KeywordTable, PROJECT_KEYWORDS, WORK_TYPE_KEYWORDS};

/// A known keyword found in the input text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Hint {
    pub kind: KeywordKind,
    pub keyword: String,
    /// Vocabulary code the keyword maps to.
    pub code: &'static str,
}

impl std::fmt::Display for Hint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.kind, self.keyword)
    }
}

/// Scan normalized text for project and work-type keywords.
///
/// Project hits come first, each group in keyword priority order.
pub fn extract_hints(text: &str) -> Vec<Hint> {
    if text.is_empty() {
        return Vec::new();
    }
    let upper = text.to_uppercase();

    let mut hints = Vec::new();
    collect(&PROJECT_KEYWORDS, &upper, &mut hints);
    collect(&WORK_TYPE_KEYWORDS, &upper, &mut hints);
    hints
}

fn collect(table: &KeywordTable, upper: &str, out: &mut Vec<Hint>) {
    out.extend(table.matches_in(upper).map(|entry| Hint {
        kind: table.kind(),
        keyword: entry.keyword.clone(),
        code: entry.code,
    }));
}

/// Tagged form of the hints (`project:<kw>` / `worktype:<kw>`).
pub fn hint_tags(hints: &[Hint]) -> Vec<String> {
    hints.iter().map(|h| h.to_string()).collect()
}

/// Distinct codes suggested for `kind`, highest priority first.
pub fn suggested_codes(hints: &[Hint], kind: KeywordKind) -> Vec<&'static str> {
    let mut codes: Vec<&'static str> = Vec::new();
    for hint in hints.iter().filter(|h| h.kind == kind) {
        if !codes.contains(&hint.code) {
            codes.push(hint.code);
        }
    }
    codes
}
