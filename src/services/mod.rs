// SPDX-License-Identifier: MIT

//! Business logic services.

pub mod calendar;
pub mod fitness;
pub mod jira;
pub mod oauth;
pub mod recommendation;
pub mod scoring;
pub mod wellness;

pub use calendar::CalendarService;
pub use fitness::FitnessService;
pub use jira::JiraService;
pub use recommendation::RecommendationService;
pub use wellness::WellnessService;
