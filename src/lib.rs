// SPDX-License-Identifier: MIT

//! Daypulse API server library.
//!
//! Aggregates fitness, calendar, and issue-tracker signals behind
//! per-provider OAuth connections into a daily wellness score and a
//! top-priority recommendation.

pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::Config;
use db::FirestoreDb;
use services::{
    CalendarService, FitnessService, JiraService, RecommendationService, WellnessService,
};

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub db: FirestoreDb,
    pub fitness: FitnessService,
    pub calendar: CalendarService,
    pub jira: JiraService,
    pub wellness: WellnessService,
    pub recommendations: RecommendationService,
}
