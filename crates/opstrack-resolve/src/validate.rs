//! Entry validation: reconcile one model entry against the candidate pools.

use serde_json::Value;
use tracing::{debug, warn};

use opstrack_core::Result;

use crate::matcher::EntityResolver;
use crate::types::{CandidateEntity, EntityMatch, RawEntry, ResolvedEntry};

pub const MIN_HOURS: f64 = 0.5;
pub const MAX_HOURS: f64 = 24.0;
pub const DEFAULT_HOURS: f64 = 1.0;
pub const DEFAULT_CONFIDENCE: f64 = 0.5;

/// Validates raw entries using a shared resolver.
pub struct EntryValidator<'r> {
    resolver: &'r EntityResolver,
}

#[derive(Clone, Copy)]
enum Pool {
    Project,
    WorkType,
}

impl<'r> EntryValidator<'r> {
    pub fn new(resolver: &'r EntityResolver) -> Self {
        Self { resolver }
    }

    /// Validate one entry of the model's `entries` array.
    pub fn validate(
        &self,
        index: usize,
        value: &Value,
        projects: &[CandidateEntity],
        work_types: &[CandidateEntity],
    ) -> Result<ResolvedEntry> {
        let raw = RawEntry::from_value(index, value)?;
        Ok(self.resolve_entry(&raw, projects, work_types))
    }

    /// Validate a batch. Rejected entries are dropped and reported as
    /// warnings; the rest keep their order.
    pub fn validate_all(
        &self,
        values: &[Value],
        projects: &[CandidateEntity],
        work_types: &[CandidateEntity],
    ) -> (Vec<ResolvedEntry>, Vec<String>) {
        let mut entries = Vec::with_capacity(values.len());
        let mut warnings = Vec::new();

        for (index, value) in values.iter().enumerate() {
            match self.validate(index, value, projects, work_types) {
                Ok(entry) => entries.push(entry),
                Err(e) => {
                    warn!("Skipping model entry: {}", e);
                    warnings.push(e.to_string());
                }
            }
        }

        (entries, warnings)
    }

    /// Resolve entities and clamp numbers for an already-parsed entry.
    pub fn resolve_entry(
        &self,
        raw: &RawEntry,
        projects: &[CandidateEntity],
        work_types: &[CandidateEntity],
    ) -> ResolvedEntry {
        let (project_id, project_name) = self.resolve_side(
            raw.project_id.as_deref(),
            raw.project_name.as_deref(),
            projects,
            Pool::Project,
        );
        let (work_type_id, work_type_name) = self.resolve_side(
            raw.work_type_id.as_deref(),
            raw.work_type_name.as_deref(),
            work_types,
            Pool::WorkType,
        );

        ResolvedEntry {
            project_id,
            project_name,
            work_type_id,
            work_type_name,
            description: raw.description.clone().unwrap_or_default(),
            hours: raw.hours.unwrap_or(DEFAULT_HOURS).clamp(MIN_HOURS, MAX_HOURS),
            confidence: raw.confidence.unwrap_or(DEFAULT_CONFIDENCE).clamp(0.0, 1.0),
        }
    }

    /// Id first (exact/prefix), then the id as a free term, then the name.
    /// Unresolved sides keep the model's name and no id.
    fn resolve_side(
        &self,
        id: Option<&str>,
        name: Option<&str>,
        pool: &[CandidateEntity],
        kind: Pool,
    ) -> (Option<String>, Option<String>) {
        let full_match = |term: &str| match kind {
            Pool::Project => self.resolver.match_project(term, pool),
            Pool::WorkType => self.resolver.match_work_type(term, pool),
        };

        let found: Option<EntityMatch<'_>> = id
            .and_then(|id| self.resolver.match_by_id(id, pool).or_else(|| full_match(id)))
            .or_else(|| name.and_then(|name| full_match(name)));

        match found {
            Some(m) => (Some(m.candidate.id.clone()), Some(m.candidate.name.clone())),
            None => {
                if id.is_some() || name.is_some() {
                    debug!("Unresolved guess id={:?} name={:?}", id, name);
                }
                (None, name.map(str::to_string))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::similarity::JaroWinkler;
    use serde_json::json;

    fn resolver() -> EntityResolver {
        EntityResolver::new(Box::new(JaroWinkler))
    }

    fn projects() -> Vec<CandidateEntity> {
        vec![
            CandidateEntity::new("3f2a9c10-aaaa-4bbb-8ccc-000000000001", "MES-2024", "MES Upgrade"),
            CandidateEntity::new("888888-160", "888888-160", "OQC Infra"),
        ]
    }

    fn work_types() -> Vec<CandidateEntity> {
        vec![
            CandidateEntity::new("wt-1", "DESIGN", "Design").with_localized_name("설계"),
            CandidateEntity::new("wt-2", "DEV", "Development").with_localized_name("개발"),
        ]
    }

    #[test]
    fn test_clamps_and_defaults() {
        let r = resolver();
        let v = EntryValidator::new(&r);
        let entry = v
            .validate(0, &json!({"hours": 30, "confidence": 1.5, "description": null}), &[], &[])
            .unwrap();
        assert_eq!(entry.hours, 24.0);
        assert_eq!(entry.confidence, 1.0);
        assert_eq!(entry.description, "");

        let entry = v.validate(1, &json!({}), &[], &[]).unwrap();
        assert_eq!(entry.hours, 1.0);
        assert_eq!(entry.confidence, 0.5);

        let entry = v
            .validate(2, &json!({"hours": 0.1, "confidence": -3, "description": "x"}), &[], &[])
            .unwrap();
        assert_eq!(entry.hours, 0.5);
        assert_eq!(entry.confidence, 0.0);
    }

    #[test]
    fn test_adopts_exact_project_id() {
        let r = resolver();
        let (p, w) = (projects(), work_types());
        let entry = EntryValidator::new(&r)
            .validate(0, &json!({"projectId": "888888-160", "projectName": "wrong name"}), &p, &w)
            .unwrap();
        assert_eq!(entry.project_id.as_deref(), Some("888888-160"));
        assert_eq!(entry.project_name.as_deref(), Some("OQC Infra"));
    }

    #[test]
    fn test_truncated_id_resolves_by_prefix() {
        let r = resolver();
        let (p, w) = (projects(), work_types());
        let entry = EntryValidator::new(&r)
            .validate(0, &json!({"projectId": "3f2a9c10-aaaa"}), &p, &w)
            .unwrap();
        assert_eq!(entry.project_id.as_deref(), Some("3f2a9c10-aaaa-4bbb-8ccc-000000000001"));
    }

    #[test]
    fn test_hallucinated_id_falls_back_to_name() {
        let r = resolver();
        let (p, w) = (projects(), work_types());
        let entry = EntryValidator::new(&r)
            .validate(
                0,
                &json!({"projectId": "qqqq", "projectName": "OQC", "workTypeName": "설계"}),
                &p,
                &w,
            )
            .unwrap();
        assert_eq!(entry.project_id.as_deref(), Some("888888-160"));
        assert_eq!(entry.work_type_id.as_deref(), Some("wt-1"));
        assert_eq!(entry.work_type_name.as_deref(), Some("Design"));
    }

    #[test]
    fn test_id_used_as_code_term() {
        let r = resolver();
        let (p, w) = (projects(), work_types());
        let entry = EntryValidator::new(&r)
            .validate(0, &json!({"projectId": "MES-2024", "workTypeId": "dev"}), &p, &w)
            .unwrap();
        assert_eq!(entry.project_id.as_deref(), Some("3f2a9c10-aaaa-4bbb-8ccc-000000000001"));
        assert_eq!(entry.work_type_id.as_deref(), Some("wt-2"));
    }

    #[test]
    fn test_unresolved_keeps_model_name_without_id() {
        let r = resolver();
        let (p, w) = (projects(), work_types());
        let entry = EntryValidator::new(&r)
            .validate(
                0,
                &json!({"projectId": "qqqq-9999", "projectName": "Zebra Warehouse", "hours": 2}),
                &p,
                &w,
            )
            .unwrap();
        assert_eq!(entry.project_id, None);
        assert_eq!(entry.project_name.as_deref(), Some("Zebra Warehouse"));
        assert_eq!(entry.work_type_id, None);
        assert_eq!(entry.work_type_name, None);
    }

    #[test]
    fn test_validate_all_isolates_bad_entries() {
        let r = resolver();
        let (p, w) = (projects(), work_types());
        let values = vec![
            json!({"projectName": "OQC", "hours": 3}),
            json!("not an entry"),
            json!({"description": {"text": "nested"}}),
            json!({"projectName": "MES Upgrade", "hours": 5}),
        ];
        let (entries, warnings) = EntryValidator::new(&r).validate_all(&values, &p, &w);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].hours, 3.0);
        assert_eq!(entries[1].hours, 5.0);
        assert_eq!(warnings.len(), 2);
        assert!(warnings[0].starts_with("Entry 1 rejected"));
        assert!(warnings[1].starts_with("Entry 2 rejected"));
    }

    #[test]
    fn test_resolved_fields_always_in_range() {
        let r = resolver();
        let v = EntryValidator::new(&r);
        for hours in [json!(-5), json!(0), json!(12.5), json!(1e9), json!("7"), json!(true)] {
            for conf in [json!(-1), json!(0.3), json!(2), json!("high")] {
                let e = v.validate(0, &json!({"hours": hours, "confidence": conf}), &[], &[]).unwrap();
                assert!((MIN_HOURS..=MAX_HOURS).contains(&e.hours));
                assert!((0.0..=1.0).contains(&e.confidence));
            }
        }
    }
}
