// SPDX-License-Identifier: MIT

//! Provider connection routes: start OAuth, receive the callback, report
//! connection status.

use axum::{
    extract::{Path, Query, State},
    response::Redirect,
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::{AppError, Result};
use crate::models::Provider;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/permissions/status", get(connection_status))
        .route("/permissions/{provider}/connect", get(connect))
        .route("/permissions/{provider}/callback", get(callback))
}

#[derive(Deserialize)]
pub struct UserParams {
    user_id: String,
}

#[derive(Serialize)]
pub struct ConnectResponse {
    pub auth_url: String,
}

fn parse_provider(raw: &str) -> Result<Provider> {
    Provider::parse(raw)
        .ok_or_else(|| AppError::BadRequest(format!("unknown provider '{}'", raw)))
}

/// Start the OAuth flow for a provider; the frontend opens the returned URL.
async fn connect(
    State(state): State<Arc<AppState>>,
    Path(provider): Path<String>,
    Query(params): Query<UserParams>,
) -> Result<Json<ConnectResponse>> {
    let provider = parse_provider(&provider)?;

    let auth_url = match provider {
        Provider::Fitness => state.fitness.auth_url(&params.user_id),
        Provider::Calendar => state.calendar.auth_url(&params.user_id),
        Provider::IssueTracker => state.jira.auth_url(&params.user_id),
    };

    tracing::info!(user_id = %params.user_id, %provider, "OAuth flow started");
    Ok(Json(ConnectResponse { auth_url }))
}

#[derive(Deserialize)]
pub struct CallbackParams {
    #[serde(default)]
    code: Option<String>,
    /// Carries the user id through the provider round trip.
    #[serde(default)]
    state: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// OAuth callback target. The browser lands here, so every outcome is a
/// redirect back to the frontend; failures carry a reason, never a 5xx.
async fn callback(
    State(state): State<Arc<AppState>>,
    Path(provider): Path<String>,
    Query(params): Query<CallbackParams>,
) -> Redirect {
    let base = format!(
        "{}/permissions?connected={}",
        state.config.frontend_root_url, provider
    );

    let failure = |msg: &str| {
        tracing::warn!(provider = %provider, error = %msg, "OAuth callback failed");
        Redirect::temporary(&format!(
            "{}&status=error&msg={}",
            base,
            urlencoding::encode(msg)
        ))
    };

    if let Some(error) = &params.error {
        return failure(&format!("provider denied authorization: {}", error));
    }

    let Ok(provider) = parse_provider(&provider) else {
        return failure("unknown provider");
    };
    let Some(code) = &params.code else {
        return failure("missing authorization code");
    };
    let Some(user_id) = &params.state else {
        return failure("missing state parameter");
    };

    let result = match provider {
        Provider::Fitness => state.fitness.handle_callback(code, user_id).await,
        Provider::Calendar => state.calendar.handle_callback(code, user_id).await,
        Provider::IssueTracker => state.jira.handle_callback(code, user_id).await,
    };

    match result {
        Ok(_) => Redirect::temporary(&format!(
            "{}&status=success&user_id={}",
            base,
            urlencoding::encode(user_id)
        )),
        Err(e) => failure(&e.to_string()),
    }
}

#[derive(Serialize)]
pub struct ConnectionStatus {
    pub user_id: String,
    pub fitness: bool,
    pub calendar: bool,
    pub issue_tracker: bool,
}

/// Which providers have a stored credential for this user.
async fn connection_status(
    State(state): State<Arc<AppState>>,
    Query(params): Query<UserParams>,
) -> Result<Json<ConnectionStatus>> {
    let user_id = params.user_id;

    let fitness = state
        .db
        .get_credential(&user_id, Provider::Fitness)
        .await?
        .is_some();
    let calendar = state
        .db
        .get_credential(&user_id, Provider::Calendar)
        .await?
        .is_some();
    let issue_tracker = state
        .db
        .get_credential(&user_id, Provider::IssueTracker)
        .await?
        .is_some();

    Ok(Json(ConnectionStatus {
        user_id,
        fitness,
        calendar,
        issue_tracker,
    }))
}
