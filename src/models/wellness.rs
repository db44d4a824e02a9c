// SPDX-License-Identifier: MIT

//! Daily wellness records and score blocks.

use serde::{Deserialize, Serialize};

/// Fitness signal: raw facts plus its 0-100 score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitnessScoreBlock {
    pub steps: i64,
    pub calories: f64,
    pub active_minutes: i64,
    pub score: f64,
}

/// Issue-tracker signal: ticket counts plus its 0-100 score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JiraScoreBlock {
    pub total_tickets: usize,
    pub completed_tickets: usize,
    pub in_progress_tickets: usize,
    pub score: f64,
}

/// Calendar signal: today's meeting count plus its 0-100 score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalendarScoreBlock {
    pub meetings: usize,
    pub score: f64,
}

/// One persisted wellness score per user per day, keyed (user_id, date).
///
/// Score blocks are optional on read so historical records written before a
/// signal existed still deserialize; a missing block is excluded from
/// per-signal averages rather than counted as zero.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyWellnessRecord {
    pub user_id: String,
    /// UTC calendar day, `YYYY-MM-DD`
    pub date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fitness: Option<FitnessScoreBlock>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jira: Option<JiraScoreBlock>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub calendar: Option<CalendarScoreBlock>,
    #[serde(default)]
    pub total_score: f64,
    /// When this record was last computed (RFC 3339)
    pub last_updated: String,
}

impl DailyWellnessRecord {
    /// Document id in the wellness store.
    pub fn doc_id(user_id: &str, date: &str) -> String {
        format!("{}_{}", user_id, date)
    }
}

/// Per-signal historical averages.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AverageScores {
    pub fitness: f64,
    pub jira: f64,
    pub calendar: f64,
}

/// Overall wellness summary across all recorded days.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OverallWellness {
    pub user_id: String,
    pub days_recorded: usize,
    pub average_scores: AverageScores,
    pub overall_wellness_score: f64,
}
