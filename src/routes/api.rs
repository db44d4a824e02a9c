// SPDX-License-Identifier: MIT

//! Data API routes: wellness scores, recommendations, goals, tickets.

use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::Result;
use crate::models::{
    DailyWellnessRecord, GoalsUpdate, OverallWellness, RecommendationResponse, Ticket, UserGoals,
};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/wellness/daily", get(daily_wellness))
        .route("/api/wellness/overall", get(overall_wellness))
        .route("/api/recommendations", get(recommendations))
        .route("/api/goals", get(get_goals).put(update_goals))
        .route("/api/jira/tickets", get(jira_tickets))
}

#[derive(Deserialize)]
pub struct UserParams {
    user_id: String,
}

/// Today's wellness score, computed or served from the fresh cached record.
async fn daily_wellness(
    State(state): State<Arc<AppState>>,
    Query(params): Query<UserParams>,
) -> Result<Json<DailyWellnessRecord>> {
    let record = state.wellness.daily_score(&params.user_id).await?;
    Ok(Json(record))
}

/// Averages over every recorded day.
async fn overall_wellness(
    State(state): State<Arc<AppState>>,
    Query(params): Query<UserParams>,
) -> Result<Json<OverallWellness>> {
    let summary = state.wellness.overall_score(&params.user_id).await?;
    Ok(Json(summary))
}

/// The single top recommendation, always computed fresh.
async fn recommendations(
    State(state): State<Arc<AppState>>,
    Query(params): Query<UserParams>,
) -> Result<Json<RecommendationResponse>> {
    let response = state.recommendations.top_recommendation(&params.user_id).await?;
    Ok(Json(response))
}

/// Current goals (defaults when never set).
async fn get_goals(
    State(state): State<Arc<AppState>>,
    Query(params): Query<UserParams>,
) -> Result<Json<UserGoals>> {
    let goals = state.wellness.goals(&params.user_id).await?;
    Ok(Json(goals))
}

/// Partial goals update; rejected before any write when a value is not
/// positive.
async fn update_goals(
    State(state): State<Arc<AppState>>,
    Query(params): Query<UserParams>,
    Json(update): Json<GoalsUpdate>,
) -> Result<Json<UserGoals>> {
    let goals = state.wellness.update_goals(&params.user_id, &update).await?;
    tracing::info!(user_id = %params.user_id, "Goals updated");
    Ok(Json(goals))
}

#[derive(Serialize)]
pub struct TicketsResponse {
    pub user_id: String,
    pub tickets: Vec<Ticket>,
}

/// Open tickets assigned to the user, highest priority first.
async fn jira_tickets(
    State(state): State<Arc<AppState>>,
    Query(params): Query<UserParams>,
) -> Result<Json<TicketsResponse>> {
    let tickets = state.jira.assigned_tickets(&params.user_id).await?;
    Ok(Json(TicketsResponse {
        user_id: params.user_id,
        tickets,
    }))
}
