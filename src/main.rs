// SPDX-License-Identifier: MIT

//! Daypulse API Server
//!
//! Connects Google Fit, Google Calendar, and Jira on a user's behalf and
//! serves daily wellness scores and recommendations.

use daypulse::{
    config::Config,
    db::FirestoreDb,
    services::{
        CalendarService, FitnessService, JiraService, RecommendationService, WellnessService,
    },
    AppState,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging for GCP
    init_logging();

    // Load configuration from environment
    let config = Config::from_env().expect("Failed to load configuration");
    tracing::info!(port = config.port, "Starting Daypulse API");

    // Initialize Firestore database
    let db = FirestoreDb::new(&config.gcp_project_id)
        .await
        .expect("Failed to connect to Firestore");

    // Refresh locks are shared across all provider adapters so each
    // (user, provider) credential refreshes at most once at a time.
    let refresh_locks = Arc::new(dashmap::DashMap::new());

    let fitness = FitnessService::new(&config, db.clone(), refresh_locks.clone());
    let calendar = CalendarService::new(&config, db.clone(), refresh_locks.clone());
    let jira = JiraService::new(&config, db.clone(), refresh_locks);

    let wellness = WellnessService::new(
        db.clone(),
        fitness.clone(),
        calendar.clone(),
        jira.clone(),
    );
    let recommendations = RecommendationService::new(
        db.clone(),
        fitness.clone(),
        calendar.clone(),
        jira.clone(),
    );

    // Build shared state
    let state = Arc::new(AppState {
        config: config.clone(),
        db,
        fitness,
        calendar,
        jira,
        wellness,
        recommendations,
    });

    // Build router
    let app = daypulse::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging (GCP-compliant).
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("daypulse=debug".parse().unwrap())
                .add_directive("info".parse().unwrap()),
        )
        .with(format)
        .init();
}
