//! String similarity strategies for the fuzzy matching stage.

use std::collections::HashSet;

use opstrack_core::SimilarityKind;

/// Case-insensitive string similarity in `[0, 1]`.
///
/// Implementations return 1.0 for identical strings and 0.0 when either side
/// is empty.
pub trait StringSimilarity: Send + Sync {
    fn similarity(&self, a: &str, b: &str) -> f64;

    fn name(&self) -> &'static str;
}

/// Jaro-Winkler similarity (shared characters in order, common-prefix bonus).
#[derive(Debug, Clone, Copy, Default)]
pub struct JaroWinkler;

impl StringSimilarity for JaroWinkler {
    fn similarity(&self, a: &str, b: &str) -> f64 {
        let (a, b) = (a.trim(), b.trim());
        if a.is_empty() || b.is_empty() {
            return 0.0;
        }
        strsim::jaro_winkler(&a.to_lowercase(), &b.to_lowercase())
    }

    fn name(&self) -> &'static str {
        "jaro-winkler"
    }
}

/// Character-set Jaccard: `|A ∩ B| / |A ∪ B|` over lowercased characters.
#[derive(Debug, Clone, Copy, Default)]
pub struct CharJaccard;

impl StringSimilarity for CharJaccard {
    fn similarity(&self, a: &str, b: &str) -> f64 {
        let (a, b) = (a.trim(), b.trim());
        if a.is_empty() || b.is_empty() {
            return 0.0;
        }
        let set_a: HashSet<char> = a.to_lowercase().chars().collect();
        let set_b: HashSet<char> = b.to_lowercase().chars().collect();
        let intersection = set_a.intersection(&set_b).count();
        let union = set_a.union(&set_b).count();
        intersection as f64 / union as f64
    }

    fn name(&self) -> &'static str {
        "jaccard"
    }
}

/// Strategy for a configured kind.
pub fn similarity_for(kind: SimilarityKind) -> Box<dyn StringSimilarity> {
    match kind {
        SimilarityKind::JaroWinkler => Box::new(JaroWinkler),
        SimilarityKind::Jaccard => Box::new(CharJaccard),
    }
}
