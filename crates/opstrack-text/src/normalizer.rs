//! Worklog text normalization: phonetic alias expansion, Korean particle
//! stripping and whitespace cleanup.

use once_cell::sync::Lazy;
use regex::{NoExpand, Regex, RegexBuilder};

use crate::vocab::{POSTPOSITIONS, PROJECT_ALIASES, WORK_TYPE_ALIASES};

/// Compiled alias table: case-insensitive literal trigger → expansion.
struct AliasTable {
    rules: Vec<(Regex, &'static str)>,
}

impl AliasTable {
    fn compile(aliases: &[(&'static str, &'static str)]) -> Self {
        let rules = aliases
            .iter()
            .filter_map(|&(trigger, expansion)| {
                RegexBuilder::new(&regex::escape(trigger))
                    .case_insensitive(true)
                    .build()
                    .ok()
                    .map(|re| (re, expansion))
            })
            .collect();
        Self { rules }
    }

    fn apply(&self, text: &str) -> String {
        let mut out = text.to_string();
        for (re, expansion) in &self.rules {
            if re.is_match(&out) {
                out = re.replace_all(&out, NoExpand(expansion)).into_owned();
            }
        }
        out
    }
}

static PROJECT_ALIAS_TABLE: Lazy<AliasTable> = Lazy::new(|| AliasTable::compile(PROJECT_ALIASES));
static WORK_TYPE_ALIAS_TABLE: Lazy<AliasTable> =
    Lazy::new(|| AliasTable::compile(WORK_TYPE_ALIASES));

/// Normalize free-form worklog text.
///
/// 1. Expand project aliases, then work-type aliases.
/// 2. Strip at most one trailing particle per whitespace token.
/// 3. Collapse whitespace runs and trim.
pub fn normalize(text: &str) -> String {
    if text.trim().is_empty() {
        return String::new();
    }

    let expanded = expand_aliases(text);

    expanded
        .split_whitespace()
        .map(strip_postposition)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Apply both alias dictionaries, each in its own order.
pub fn expand_aliases(text: &str) -> String {
    let text = PROJECT_ALIAS_TABLE.apply(text);
    WORK_TYPE_ALIAS_TABLE.apply(&text)
}

/// Remove the longest trailing particle from `token` whose removal leaves a
/// usable stem.
///
/// A stem is usable if it contains an ASCII alphanumeric or is at least two
/// characters long. At most one particle is removed.
pub fn strip_postposition(token: &str) -> &str {
    for particle in POSTPOSITIONS.iter() {
        if let Some(prefix) = token.strip_suffix(particle) {
            if is_usable_stem(prefix) {
                return prefix;
            }
        }
    }
    token
}

fn is_usable_stem(prefix: &str) -> bool {
    prefix.chars().any(|c| c.is_ascii_alphanumeric()) || prefix.chars().count() >= 2
}
