// SPDX-License-Identifier: MIT

//! Recommendation types. Never persisted; produced fresh per call.

use serde::{Deserialize, Serialize};

/// Which signal a recommendation came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecommendationKind {
    Jira,
    Calendar,
    Fitness,
    General,
}

/// A single actionable recommendation. Lower priority value wins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub priority: u8,
    #[serde(rename = "type")]
    pub kind: RecommendationKind,
    pub message: String,
}

/// Response wrapper carrying the single top recommendation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendationResponse {
    pub user_id: String,
    pub recommendation: Recommendation,
    /// Call time (RFC 3339); recommendations are never cached
    pub generated_at: String,
    pub source: String,
}
