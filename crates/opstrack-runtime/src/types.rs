//! Runtime types.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One free-text worklog submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParseRequest {
    pub text: String,
    #[serde(default)]
    pub user_id: String,
    /// Day the work was performed. Defaults to today (local time).
    #[serde(default = "today")]
    pub target_date: NaiveDate,
}

fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

impl ParseRequest {
    pub fn new(text: impl Into<String>, user_id: impl Into<String>, target_date: NaiveDate) -> Self {
        Self {
            text: text.into(),
            user_id: user_id.into(),
            target_date,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthState {
    Healthy,
    Unhealthy,
}

/// Result of probing the generative model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: HealthState,
    pub model: String,
    pub message: String,
}

impl HealthStatus {
    pub fn is_healthy(&self) -> bool {
        self.status == HealthState::Healthy
    }
}
