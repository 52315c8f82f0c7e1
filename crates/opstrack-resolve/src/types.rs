//! Resolver types.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use opstrack_core::{Error, Result};

/// A known project or work-type category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateEntity {
    pub id: String,
    pub code: String,
    pub name: String,
    /// Korean display name (work-type categories).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub localized_name: Option<String>,
}

impl CandidateEntity {
    pub fn new(id: impl Into<String>, code: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            code: code.into(),
            name: name.into(),
            localized_name: None,
        }
    }

    pub fn with_localized_name(mut self, localized: impl Into<String>) -> Self {
        self.localized_name = Some(localized.into());
        self
    }
}

/// The matcher stage that produced a hit. Determines the confidence band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStage {
    ExactId,
    IdPrefix,
    ExactCode,
    CodePrefix,
    NameContains,
    NameContained,
    LocalizedName,
    Fuzzy,
}

impl MatchStage {
    /// Fixed confidence of a non-fuzzy stage. Fuzzy hits scale their score
    /// by [`FUZZY_SCALE`] instead.
    pub fn base_confidence(self) -> f64 {
        match self {
            MatchStage::ExactId => 1.0,
            MatchStage::IdPrefix => 0.98,
            MatchStage::ExactCode => 0.95,
            MatchStage::CodePrefix => 0.90,
            MatchStage::NameContains => 0.80,
            MatchStage::NameContained => 0.75,
            MatchStage::LocalizedName => 0.80,
            MatchStage::Fuzzy => FUZZY_SCALE,
        }
    }
}

/// Fuzzy scores are multiplied by this, so a fuzzy hit never reaches the
/// containment bands.
pub const FUZZY_SCALE: f64 = 0.7;

/// A candidate chosen for a term.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EntityMatch<'a> {
    pub candidate: &'a CandidateEntity,
    pub confidence: f64,
    pub stage: MatchStage,
}

/// One model-produced entry with every field optional.
///
/// Ids and names accept strings or numbers. `hours` and `confidence` accept
/// numbers or numeric strings; anything else reads as absent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawEntry {
    pub project_id: Option<String>,
    pub project_name: Option<String>,
    pub work_type_id: Option<String>,
    pub work_type_name: Option<String>,
    pub description: Option<String>,
    pub hours: Option<f64>,
    pub confidence: Option<f64>,
}

impl RawEntry {
    /// Read a raw entry out of the model's JSON.
    ///
    /// Fails when the entry is not an object or its description is a
    /// nested array/object.
    pub fn from_value(index: usize, value: &Value) -> Result<Self> {
        let obj = value.as_object().ok_or_else(|| Error::EntryValidation {
            index,
            reason: format!("expected an object, got {}", json_type(value)),
        })?;

        let field = |keys: &[&str]| keys.iter().find_map(|k| obj.get(*k)).filter(|v| !v.is_null());

        let description = match field(&["description", "desc"]) {
            None => None,
            Some(Value::String(s)) => Some(s.clone()),
            Some(v @ (Value::Number(_) | Value::Bool(_))) => Some(v.to_string()),
            Some(other) => {
                return Err(Error::EntryValidation {
                    index,
                    reason: format!("description must be text, got {}", json_type(other)),
                })
            }
        };

        Ok(Self {
            project_id: field(&["projectId", "project_id"]).and_then(scalar_text),
            project_name: field(&["projectName", "project_name", "project"]).and_then(scalar_text),
            work_type_id: field(&["workTypeId", "work_type_id"]).and_then(scalar_text),
            work_type_name: field(&["workTypeName", "work_type_name", "workType"])
                .and_then(scalar_text),
            description,
            hours: field(&["hours"]).and_then(number),
            confidence: field(&["confidence"]).and_then(number),
        })
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    let text = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };
    (!text.is_empty()).then_some(text)
}

/// Numbers and numeric strings. Booleans are not numbers here.
fn number(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    n.filter(|v| v.is_finite())
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// A validated worklog entry.
///
/// Ids are either taken from the candidate pool or absent. An unresolved
/// entity keeps the model's name text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedEntry {
    pub project_id: Option<String>,
    pub project_name: Option<String>,
    pub work_type_id: Option<String>,
    pub work_type_name: Option<String>,
    pub description: String,
    /// In `[0.5, 24.0]`.
    pub hours: f64,
    /// In `[0.0, 1.0]`.
    pub confidence: f64,
}

/// Final output of a parse.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParseResult {
    pub entries: Vec<ResolvedEntry>,
    pub total_hours: f64,
    pub warnings: Vec<String>,
}

impl ParseResult {
    /// Empty result carrying a single warning.
    pub fn degraded(message: impl Into<String>) -> Self {
        Self {
            entries: Vec::new(),
            total_hours: 0.0,
            warnings: vec![message.into()],
        }
    }
}
