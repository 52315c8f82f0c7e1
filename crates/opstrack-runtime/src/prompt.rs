//! Prompt assembly for worklog extraction.

use std::fmt::Write as _;

use chrono::NaiveDate;

use opstrack_resolve::CandidateEntity;
use opstrack_text::{hint_tags, suggested_codes, Hint, KeywordKind};

const SYSTEM_PROMPT: &str = "You turn free-form work reports into structured worklog entries. \
Reports mix Korean and English. Split the report into separate entries, one per distinct piece of work. \
Pick projects and work types ONLY from the provided lists and copy their ids exactly. \
If nothing in a list fits, set the id to null and put your best guess in the name field. \
Express hours as decimal numbers (30분 = 0.5, 반나절 = 4, 하루 종일 = 8). \
Give each entry a confidence between 0 and 1. \
Respond with a single JSON object and nothing else.";

const RESPONSE_SCHEMA: &str = r#"{
  "entries": [
    {
      "projectId": "id from the project list or null",
      "projectName": "project name",
      "workTypeId": "id from the work type list or null",
      "workTypeName": "work type name",
      "description": "short description of the work",
      "hours": 1.5,
      "confidence": 0.9
    }
  ],
  "warnings": ["anything ambiguous in the report"]
}"#;

/// System and user prompt for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub system: String,
    pub user: String,
}

/// Composes the model instruction from the normalized report, the date, the
/// keyword hints and the candidate vocabulary.
pub struct PromptBuilder<'a> {
    text: &'a str,
    target_date: NaiveDate,
    hints: &'a [Hint],
    projects: &'a [CandidateEntity],
    work_types: &'a [CandidateEntity],
}

impl<'a> PromptBuilder<'a> {
    pub fn new(text: &'a str, target_date: NaiveDate) -> Self {
        Self {
            text,
            target_date,
            hints: &[],
            projects: &[],
            work_types: &[],
        }
    }

    pub fn hints(mut self, hints: &'a [Hint]) -> Self {
        self.hints = hints;
        self
    }

    pub fn projects(mut self, projects: &'a [CandidateEntity]) -> Self {
        self.projects = projects;
        self
    }

    pub fn work_types(mut self, work_types: &'a [CandidateEntity]) -> Self {
        self.work_types = work_types;
        self
    }

    pub fn build(&self) -> Prompt {
        let mut user = String::new();

        let _ = writeln!(user, "Date: {}", self.target_date.format("%Y-%m-%d (%A)"));
        let _ = writeln!(user, "\nReport:\n{}", self.text);

        if !self.hints.is_empty() {
            let _ = writeln!(user, "\nKeywords spotted: {}", hint_tags(self.hints).join(", "));
            push_codes(&mut user, "project", &suggested_codes(self.hints, KeywordKind::Project));
            push_codes(
                &mut user,
                "work type",
                &suggested_codes(self.hints, KeywordKind::WorkType),
            );
        }

        user.push_str("\nProjects (id | code | name):\n");
        push_pool(&mut user, self.projects);
        user.push_str("\nWork types (id | code | name | Korean name):\n");
        push_pool(&mut user, self.work_types);

        let _ = write!(user, "\nRespond in this JSON format:\n{}", RESPONSE_SCHEMA);

        Prompt {
            system: SYSTEM_PROMPT.to_string(),
            user,
        }
    }
}

fn push_codes(out: &mut String, label: &str, codes: &[&str]) {
    if !codes.is_empty() {
        let _ = writeln!(out, "Suggested {} codes: {}", label, codes.join(", "));
    }
}

fn push_pool(out: &mut String, pool: &[CandidateEntity]) {
    if pool.is_empty() {
        out.push_str("(none)\n");
        return;
    }
    for c in pool {
        let _ = write!(out, "- {} | {} | {}", c.id, c.code, c.name);
        if let Some(localized) = c.localized_name.as_deref().filter(|l| !l.is_empty()) {
            let _ = write!(out, " | {}", localized);
        }
        out.push('\n');
    }
}
