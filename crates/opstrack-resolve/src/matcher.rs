//! Multi-stage entity matcher.
//!
//! Stages run in a fixed order and the first one that hits wins. Every stage
//! except the fuzzy one returns the first candidate in pool order that
//! satisfies it, not the best-scoring one, so the caller's pool order is
//! part of the result.

use opstrack_core::EngineSettings;
use tracing::debug;

use crate::similarity::{similarity_for, StringSimilarity};
use crate::types::{CandidateEntity, EntityMatch, MatchStage, FUZZY_SCALE};

/// Ids are compared on this many leading characters in the prefix stage.
const ID_PREFIX_LEN: usize = 8;
/// Names shorter than this never match by reverse containment.
const MIN_CONTAINED_NAME_LEN: usize = 3;

pub const DEFAULT_PROJECT_THRESHOLD: f64 = 0.6;
pub const DEFAULT_WORK_TYPE_THRESHOLD: f64 = 0.5;

/// Resolves raw text or id guesses against a candidate pool.
pub struct EntityResolver {
    similarity: Box<dyn StringSimilarity>,
    project_threshold: f64,
    work_type_threshold: f64,
}

impl EntityResolver {
    pub fn new(similarity: Box<dyn StringSimilarity>) -> Self {
        Self {
            similarity,
            project_threshold: DEFAULT_PROJECT_THRESHOLD,
            work_type_threshold: DEFAULT_WORK_TYPE_THRESHOLD,
        }
    }

    pub fn from_settings(settings: &EngineSettings) -> Self {
        Self::new(similarity_for(settings.similarity))
            .with_thresholds(settings.project_threshold, settings.work_type_threshold)
    }

    pub fn with_thresholds(mut self, project: f64, work_type: f64) -> Self {
        self.project_threshold = project;
        self.work_type_threshold = work_type;
        self
    }

    pub fn similarity_name(&self) -> &'static str {
        self.similarity.name()
    }

    /// Match a project guess (id, code or name).
    pub fn match_project<'a>(
        &self,
        term: &str,
        candidates: &'a [CandidateEntity],
    ) -> Option<EntityMatch<'a>> {
        self.resolve(term, candidates, self.project_threshold, false)
    }

    /// Match a work-type guess. Also checks the localized (Korean) name.
    pub fn match_work_type<'a>(
        &self,
        term: &str,
        candidates: &'a [CandidateEntity],
    ) -> Option<EntityMatch<'a>> {
        self.resolve(term, candidates, self.work_type_threshold, true)
    }

    /// Exact-id and id-prefix stages only.
    pub fn match_by_id<'a>(
        &self,
        term: &str,
        candidates: &'a [CandidateEntity],
    ) -> Option<EntityMatch<'a>> {
        let term = term.trim();
        if term.is_empty() {
            return None;
        }
        let lower = term.to_lowercase();
        id_stage(&lower, candidates)
    }

    fn resolve<'a>(
        &self,
        term: &str,
        candidates: &'a [CandidateEntity],
        threshold: f64,
        localized: bool,
    ) -> Option<EntityMatch<'a>> {
        let term = term.trim();
        if term.is_empty() || candidates.is_empty() {
            return None;
        }
        let lower = term.to_lowercase();
        let upper = term.to_uppercase();

        let found = id_stage(&lower, candidates)
            .or_else(|| code_stage(&lower, candidates))
            .or_else(|| name_stage(&upper, candidates))
            .or_else(|| {
                if localized {
                    localized_stage(&upper, candidates)
                } else {
                    None
                }
            })
            .or_else(|| self.fuzzy_stage(term, candidates, threshold));

        match &found {
            Some(m) => debug!(
                "Matched {:?} -> {} via {:?} ({:.2})",
                term, m.candidate.id, m.stage, m.confidence
            ),
            None => debug!("No candidate for {:?} among {}", term, candidates.len()),
        }
        found
    }

    /// Best `max(sim(term, name), sim(term, code))` over the pool; ties keep
    /// the earlier candidate.
    fn fuzzy_stage<'a>(
        &self,
        term: &str,
        candidates: &'a [CandidateEntity],
        threshold: f64,
    ) -> Option<EntityMatch<'a>> {
        let mut best: Option<(&'a CandidateEntity, f64)> = None;
        for candidate in candidates {
            let score = self
                .similarity
                .similarity(term, &candidate.name)
                .max(self.similarity.similarity(term, &candidate.code));
            if best.map_or(true, |(_, s)| score > s) {
                best = Some((candidate, score));
            }
        }

        let (candidate, score) = best?;
        (score >= threshold).then(|| EntityMatch {
            candidate,
            confidence: score * FUZZY_SCALE,
            stage: MatchStage::Fuzzy,
        })
    }
}

fn hit(candidate: &CandidateEntity, stage: MatchStage) -> EntityMatch<'_> {
    EntityMatch {
        candidate,
        confidence: stage.base_confidence(),
        stage,
    }
}

fn first_chars(s: &str, n: usize) -> &str {
    match s.char_indices().nth(n) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

/// Stages 1 and 1b. `lower` is the lowercased term.
fn id_stage<'a>(lower: &str, candidates: &'a [CandidateEntity]) -> Option<EntityMatch<'a>> {
    if let Some(c) = candidates
        .iter()
        .find(|c| !c.id.is_empty() && c.id.to_lowercase() == lower)
    {
        return Some(hit(c, MatchStage::ExactId));
    }

    if lower.chars().count() < ID_PREFIX_LEN {
        return None;
    }
    let term_prefix = first_chars(lower, ID_PREFIX_LEN);
    candidates
        .iter()
        .find(|c| {
            if c.id.is_empty() {
                return false;
            }
            let id = c.id.to_lowercase();
            id.starts_with(term_prefix) || lower.starts_with(first_chars(&id, ID_PREFIX_LEN))
        })
        .map(|c| hit(c, MatchStage::IdPrefix))
}

/// Stages 2 and 2b.
fn code_stage<'a>(lower: &str, candidates: &'a [CandidateEntity]) -> Option<EntityMatch<'a>> {
    if let Some(c) = candidates
        .iter()
        .find(|c| !c.code.is_empty() && c.code.to_lowercase() == lower)
    {
        return Some(hit(c, MatchStage::ExactCode));
    }

    candidates
        .iter()
        .find(|c| {
            if c.code.is_empty() {
                return false;
            }
            let code = c.code.to_lowercase();
            code.starts_with(lower) || lower.starts_with(code.as_str())
        })
        .map(|c| hit(c, MatchStage::CodePrefix))
}

/// Stages 3 and 3b. `upper` is the uppercased term.
fn name_stage<'a>(upper: &str, candidates: &'a [CandidateEntity]) -> Option<EntityMatch<'a>> {
    if let Some(c) = candidates
        .iter()
        .find(|c| !c.name.is_empty() && c.name.to_uppercase().contains(upper))
    {
        return Some(hit(c, MatchStage::NameContains));
    }

    candidates
        .iter()
        .find(|c| {
            c.name.chars().count() >= MIN_CONTAINED_NAME_LEN
                && upper.contains(c.name.to_uppercase().as_str())
        })
        .map(|c| hit(c, MatchStage::NameContained))
}

/// Stage 3c, work types only.
fn localized_stage<'a>(upper: &str, candidates: &'a [CandidateEntity]) -> Option<EntityMatch<'a>> {
    candidates
        .iter()
        .find(|c| match c.localized_name.as_deref().map(str::trim) {
            Some(localized) if !localized.is_empty() => {
                let localized = localized.to_uppercase();
                localized.contains(upper) || upper.contains(localized.as_str())
            }
            _ => false,
        })
        .map(|c| hit(c, MatchStage::LocalizedName))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::similarity::{CharJaccard, JaroWinkler};

    fn resolver() -> EntityResolver {
        EntityResolver::new(Box::new(JaroWinkler))
    }

    fn projects() -> Vec<CandidateEntity> {
        vec![
            CandidateEntity::new("3f2a9c10-aaaa-4bbb-8ccc-000000000001", "MES-2024", "MES Upgrade"),
            CandidateEntity::new("888888-160", "888888-160", "OQC Infra"),
            CandidateEntity::new("7d1e4b22-dddd-4eee-8fff-000000000002", "DX-2510", "2510 OQC Digitalization Infrastructure"),
        ]
    }

    fn work_types() -> Vec<CandidateEntity> {
        vec![
            CandidateEntity::new("wt-1", "DESIGN", "Design").with_localized_name("설계"),
            CandidateEntity::new("wt-2", "DEV", "Development").with_localized_name("개발"),
            CandidateEntity::new("wt-3", "MEETING", "Meeting").with_localized_name("회의"),
        ]
    }

    #[test]
    fn test_exact_id_scenario() {
        let pool = vec![CandidateEntity::new("888888-160", "888888-160", "OQC Infra")];
        let m = resolver().match_project("888888-160", &pool).unwrap();
        assert_eq!(m.candidate.id, "888888-160");
        assert_eq!(m.confidence, 1.0);
        assert_eq!(m.stage, MatchStage::ExactId);
    }

    #[test]
    fn test_name_containment_scenario() {
        let pool = vec![CandidateEntity::new("x", "y", "2510 OQC Digitalization Infrastructure")];
        let m = resolver().match_project("OQC", &pool).unwrap();
        assert_eq!(m.confidence, 0.8);
        assert_eq!(m.stage, MatchStage::NameContains);
    }

    #[test]
    fn test_exact_id_preempts_better_looking_candidates() {
        // The term is also a perfect name match for a later candidate
        let pool = vec![
            CandidateEntity::new("MES Upgrade", "A", "Unrelated"),
            CandidateEntity::new("p-2", "MES", "MES Upgrade"),
        ];
        let m = resolver().match_project("mes upgrade", &pool).unwrap();
        assert_eq!(m.candidate.id, "MES Upgrade");
        assert_eq!(m.confidence, 1.0);
    }

    #[test]
    fn test_id_prefix_handles_truncated_uuid() {
        let pool = projects();
        let m = resolver().match_project("7d1e4b22-dd", &pool).unwrap();
        assert_eq!(m.candidate.code, "DX-2510");
        assert_eq!(m.stage, MatchStage::IdPrefix);
        assert_eq!(m.confidence, 0.98);

        // Hallucinated tail after a correct prefix
        let m = resolver().match_by_id("3F2A9C10-zzzz", &pool).unwrap();
        assert_eq!(m.candidate.code, "MES-2024");
    }

    #[test]
    fn test_short_terms_skip_id_prefix() {
        let pool = projects();
        assert!(resolver().match_by_id("3f2a9c1", &pool).is_none());
    }

    #[test]
    fn test_code_exact_and_prefix() {
        let pool = projects();
        let m = resolver().match_project("dx-2510", &pool).unwrap();
        assert_eq!(m.stage, MatchStage::ExactCode);
        assert_eq!(m.confidence, 0.95);

        let m = resolver().match_project("MES", &pool).unwrap();
        assert_eq!(m.stage, MatchStage::CodePrefix);
        assert_eq!(m.confidence, 0.90);
        assert_eq!(m.candidate.code, "MES-2024");
    }

    #[test]
    fn test_reverse_containment() {
        let pool = projects();
        let m = resolver()
            .match_project("worked on OQC Infra cabling", &pool)
            .unwrap();
        assert_eq!(m.stage, MatchStage::NameContained);
        assert_eq!(m.confidence, 0.75);
        assert_eq!(m.candidate.id, "888888-160");
    }

    #[test]
    fn test_reverse_containment_needs_three_chars() {
        let pool = vec![CandidateEntity::new("p-1", "", "QA")];
        let r = EntityResolver::new(Box::new(JaroWinkler)).with_thresholds(0.99, 0.99);
        assert!(r.match_project("QA regression run", &pool).is_none());
    }

    #[test]
    fn test_first_hit_in_pool_order_wins() {
        // Both names contain "OQC". The earlier, less specific one is chosen.
        let pool = vec![
            CandidateEntity::new("p-a", "A-1", "OQC Legacy Reports"),
            CandidateEntity::new("p-b", "B-1", "OQC"),
        ];
        let m = resolver().match_project("OQC", &pool).unwrap();
        assert_eq!(m.candidate.id, "p-a");
        assert_eq!(m.stage, MatchStage::NameContains);

        let reversed: Vec<_> = pool.into_iter().rev().collect();
        let m = resolver().match_project("OQC", &reversed).unwrap();
        assert_eq!(m.candidate.id, "p-b");
    }

    #[test]
    fn test_localized_name_for_work_types_only() {
        let pool = work_types();
        let m = resolver().match_work_type("설계", &pool).unwrap();
        assert_eq!(m.candidate.id, "wt-1");
        assert_eq!(m.stage, MatchStage::LocalizedName);
        assert_eq!(m.confidence, 0.8);

        // Term containing the localized name
        let m = resolver().match_work_type("주간회의", &pool).unwrap();
        assert_eq!(m.candidate.id, "wt-3");

        // Projects never look at localized names
        let strict = EntityResolver::new(Box::new(JaroWinkler)).with_thresholds(0.99, 0.99);
        assert!(strict.match_project("설계", &pool).is_none());
    }

    #[test]
    fn test_empty_localized_name_never_matches() {
        let pool = vec![
            CandidateEntity::new("wt-0", "X", "Xyz").with_localized_name(""),
            CandidateEntity::new("wt-1", "DESIGN", "Design").with_localized_name("설계"),
        ];
        let m = resolver().match_work_type("설계", &pool).unwrap();
        assert_eq!(m.candidate.id, "wt-1");
        assert_eq!(m.stage, MatchStage::LocalizedName);

        assert!(resolver().match_work_type("교육", &pool).is_none());
    }

    #[test]
    fn test_short_id_prefixes_long_term() {
        // Ids under 8 chars compare whole against the start of the term
        let pool = vec![
            CandidateEntity::new("1", "ALPHA", "Alpha"),
            CandidateEntity::new("2", "BETA", "Beta"),
        ];
        let m = resolver().match_work_type("2510 OQC development", &pool).unwrap();
        assert_eq!(m.candidate.id, "2");
        assert_eq!(m.stage, MatchStage::IdPrefix);
        assert_eq!(m.confidence, 0.98);

        // Terms under 8 chars skip the prefix stage
        assert!(resolver().match_work_type("2510", &pool).is_none());
    }

    #[test]
    fn test_fuzzy_confidence_is_scaled() {
        let pool = projects();
        let m = resolver().match_project("MES Upgarde", &pool).unwrap();
        assert_eq!(m.stage, MatchStage::Fuzzy);
        assert_eq!(m.candidate.code, "MES-2024");
        assert!(m.confidence <= 0.7);
        assert!(m.confidence >= 0.6 * 0.7);
    }

    #[test]
    fn test_fuzzy_respects_threshold() {
        let pool = projects();
        assert!(resolver().match_project("zzzz qqqq", &pool).is_none());
    }

    #[test]
    fn test_fuzzy_with_jaccard_strategy() {
        let pool = vec![CandidateEntity::new("wt-1", "WT-DEV", "Development")];
        let r = EntityResolver::new(Box::new(CharJaccard));
        let m = r.match_work_type("Develpment", &pool).unwrap();
        assert_eq!(m.stage, MatchStage::Fuzzy);
        assert!(m.confidence <= 0.7);
        assert_eq!(r.similarity_name(), "jaccard");
    }

    #[test]
    fn test_empty_inputs() {
        assert!(resolver().match_project("   ", &projects()).is_none());
        assert!(resolver().match_project("OQC", &[]).is_none());
        assert!(resolver().match_by_id("", &projects()).is_none());
    }

    #[test]
    fn test_empty_code_never_prefix_matches() {
        let pool = vec![
            CandidateEntity::new("p-1", "", "Alpha"),
            CandidateEntity::new("p-2", "BETA", "Beta"),
        ];
        let m = resolver().match_project("BETA-7", &pool).unwrap();
        assert_eq!(m.candidate.id, "p-2");
        assert_eq!(m.stage, MatchStage::CodePrefix);
    }
}
