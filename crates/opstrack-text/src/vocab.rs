//! Static vocabulary: phonetic aliases, Korean particles and keyword → code
//! tables.
//!
//! The tables are fixed at build time. Anything that needs an ordering
//! (particles longest-first, keywords by priority) is sorted once on first
//! use and reused afterwards.

use once_cell::sync::Lazy;
use serde::Serialize;
use std::collections::HashSet;

/// Korean transliterations of project names and codes → canonical spelling.
///
/// Applied in order. A later trigger that also occurs inside an earlier
/// expansion would fire on it, so keep expansions ASCII.
pub const PROJECT_ALIASES: &[(&str, &str)] = &[
    ("오큐씨", "OQC"),
    ("아이큐씨", "IQC"),
    ("피큐씨", "PQC"),
    ("엠이에스", "MES"),
    ("에스피씨", "SPC"),
    ("이알피", "ERP"),
    ("피엘엠", "PLM"),
    ("큐엠에스", "QMS"),
    ("디지털라이제이션", "Digitalization"),
    ("digitalisation", "Digitalization"),
    ("스마트팩토리", "Smart Factory"),
    ("대시보드", "Dashboard"),
    ("인프라", "Infra"),
];

/// Korean transliterations of work-type terms → canonical spelling.
///
/// Longer triggers come before the shorter ones they contain
/// (`코드리뷰` before `리뷰`).
pub const WORK_TYPE_ALIASES: &[(&str, &str)] = &[
    ("코드리뷰", "Code Review"),
    ("리뷰", "Review"),
    ("미팅", "Meeting"),
    ("디자인", "Design"),
    ("테스트", "Test"),
    ("디버깅", "Debugging"),
    ("리팩토링", "Refactoring"),
    ("리팩터링", "Refactoring"),
    ("디플로이", "Deploy"),
    ("모니터링", "Monitoring"),
    ("트러블슈팅", "Troubleshooting"),
    ("프로토타이핑", "Prototyping"),
    ("데브옵스", "DevOps"),
];

/// Korean grammatical particles that may trail a token.
const POSTPOSITION_LIST: &[&str] = &[
    "을", "를", "이", "가", "은", "는", "의", "에", "로", "도", "만", "과", "와", "랑",
    "에서", "으로", "에게", "한테", "까지", "부터", "보다", "처럼", "이랑", "하고",
    "에서는", "으로는", "에게서", "한테서", "에서도", "까지는",
];

/// Particles ordered longest-first so a longer particle is never shadowed by
/// its own last syllable.
pub static POSTPOSITIONS: Lazy<Vec<&'static str>> = Lazy::new(|| {
    let mut particles: Vec<&'static str> = POSTPOSITION_LIST.to_vec();
    particles.sort_by_key(|p| std::cmp::Reverse(p.chars().count()));
    particles.dedup();
    particles
});

/// Which candidate pool a keyword points into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum KeywordKind {
    Project,
    #[serde(rename = "worktype")]
    WorkType,
}

impl std::fmt::Display for KeywordKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            KeywordKind::Project => write!(f, "project"),
            KeywordKind::WorkType => write!(f, "worktype"),
        }
    }
}

/// One keyword → code mapping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KeywordEntry {
    /// Uppercased keyword.
    pub keyword: String,
    pub code: &'static str,
    /// Higher wins when several keywords suggest different codes.
    pub priority: u8,
}

/// Deduplicated keyword table held in priority order.
#[derive(Debug)]
pub struct KeywordTable {
    kind: KeywordKind,
    entries: Vec<KeywordEntry>,
}

impl KeywordTable {
    /// Build a table from `(keyword, code, priority)` rows.
    ///
    /// Rows are sorted by priority (desc), then keyword length (desc), then
    /// keyword. The first row for a given uppercased keyword is kept.
    pub fn build(kind: KeywordKind, rows: &[(&str, &'static str, u8)]) -> Self {
        let mut entries: Vec<KeywordEntry> = rows
            .iter()
            .filter(|(kw, _, _)| !kw.trim().is_empty())
            .map(|&(kw, code, priority)| KeywordEntry {
                keyword: kw.trim().to_uppercase(),
                code,
                priority,
            })
            .collect();

        entries.sort_by(|a, b| {
            b.priority
                .cmp(&a.priority)
                .then_with(|| b.keyword.chars().count().cmp(&a.keyword.chars().count()))
                .then_with(|| a.keyword.cmp(&b.keyword))
        });

        let mut seen = HashSet::new();
        entries.retain(|e| seen.insert(e.keyword.clone()));

        Self { kind, entries }
    }

    pub fn kind(&self) -> KeywordKind {
        self.kind
    }

    /// All entries, in priority order.
    pub fn entries(&self) -> &[KeywordEntry] {
        &self.entries
    }

    /// Entries whose keyword occurs in `upper_text`, in priority order.
    /// The caller uppercases the text once.
    pub fn matches_in<'a>(&'a self, upper_text: &'a str) -> impl Iterator<Item = &'a KeywordEntry> + 'a {
        self.entries
            .iter()
            .filter(move |e| upper_text.contains(e.keyword.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Project keyword → project code.
pub static PROJECT_KEYWORDS: Lazy<KeywordTable> = Lazy::new(|| {
    KeywordTable::build(
        KeywordKind::Project,
        &[
            ("OQC", "OQC", 90),
            ("IQC", "IQC", 90),
            ("PQC", "PQC", 90),
            ("MES", "MES", 80),
            ("SPC", "SPC", 80),
            ("QMS", "QMS", 80),
            ("ERP", "ERP", 70),
            ("PLM", "PLM", 70),
            ("SMART FACTORY", "SMART-FACTORY", 60),
            ("DIGITALIZATION", "DX", 50),
            ("DASHBOARD", "DASHBOARD", 40),
            ("INFRA", "INFRA", 30),
            ("OQC", "OQC", 10),
        ],
    )
});

/// Work-type keyword → work-type code.
pub static WORK_TYPE_KEYWORDS: Lazy<KeywordTable> = Lazy::new(|| {
    KeywordTable::build(
        KeywordKind::WorkType,
        &[
            ("CODE REVIEW", "REVIEW", 95),
            ("REVIEW", "REVIEW", 80),
            ("검토", "REVIEW", 80),
            ("DESIGN", "DESIGN", 80),
            ("설계", "DESIGN", 80),
            ("DEVELOP", "DEV", 70),
            ("개발", "DEV", 70),
            ("구현", "DEV", 70),
            ("REFACTORING", "DEV", 70),
            ("DEBUGGING", "DEBUG", 75),
            ("TROUBLESHOOTING", "DEBUG", 75),
            ("TEST", "TEST", 70),
            ("검증", "TEST", 70),
            ("DEPLOY", "DEPLOY", 70),
            ("배포", "DEPLOY", 70),
            ("MEETING", "MEETING", 60),
            ("회의", "MEETING", 60),
            ("문서", "DOC", 50),
            ("보고서", "DOC", 55),
            ("분석", "ANALYSIS", 50),
            ("MONITORING", "OPS", 45),
            ("DEVOPS", "OPS", 45),
            ("운영", "OPS", 40),
            ("교육", "EDU", 40),
            ("지원", "SUPPORT", 30),
            ("PROTOTYPING", "DEV", 65),
            ("MEETING", "MEETING", 10),
        ],
    )
});
