// SPDX-License-Identifier: MIT

//! Data models for the application.

pub mod credential;
pub mod facts;
pub mod goals;
pub mod recommendation;
pub mod wellness;

pub use credential::{Credential, Provider};
pub use facts::{events_on_day, CalendarEvent, FitnessFacts, Ticket};
pub use goals::{GoalsUpdate, UserGoals};
pub use recommendation::{Recommendation, RecommendationKind, RecommendationResponse};
pub use wellness::{
    AverageScores, CalendarScoreBlock, DailyWellnessRecord, FitnessScoreBlock, JiraScoreBlock,
    OverallWellness,
};
