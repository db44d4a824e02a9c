// SPDX-License-Identifier: MIT

use daypulse::config::Config;
use daypulse::db::FirestoreDb;
use daypulse::routes::create_router;
use daypulse::services::{
    CalendarService, FitnessService, JiraService, RecommendationService, WellnessService,
};
use daypulse::AppState;
use std::sync::Arc;

/// Check if emulator is available via environment variable.
#[allow(dead_code)]
pub fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Skip test with message if emulator not available.
#[macro_export]
macro_rules! require_emulator {
    () => {
        if !crate::common::emulator_available() {
            eprintln!("⚠️  Skipping: FIRESTORE_EMULATOR_HOST not set");
            return;
        }
    };
}

/// Create a test database connection.
#[allow(dead_code)]
pub async fn test_db() -> FirestoreDb {
    FirestoreDb::new("test-project")
        .await
        .expect("Failed to connect to Firestore emulator")
}

/// Create a mock database connection (offline).
#[allow(dead_code)]
pub fn test_db_offline() -> FirestoreDb {
    FirestoreDb::new_mock()
}

/// Build the full service graph over the given database.
#[allow(dead_code)]
pub fn build_state(config: Config, db: FirestoreDb) -> Arc<AppState> {
    let refresh_locks = Arc::new(dashmap::DashMap::new());

    let fitness = FitnessService::new(&config, db.clone(), refresh_locks.clone());
    let calendar = CalendarService::new(&config, db.clone(), refresh_locks.clone());
    let jira = JiraService::new(&config, db.clone(), refresh_locks);

    let wellness = WellnessService::new(db.clone(), fitness.clone(), calendar.clone(), jira.clone());
    let recommendations =
        RecommendationService::new(db.clone(), fitness.clone(), calendar.clone(), jira.clone());

    Arc::new(AppState {
        config,
        db,
        fitness,
        calendar,
        jira,
        wellness,
        recommendations,
    })
}

/// Create a test app with offline mock dependencies.
/// Returns the router and the shared state.
#[allow(dead_code)]
pub fn create_test_app() -> (axum::Router, Arc<AppState>) {
    let state = build_state(Config::default(), test_db_offline());
    (create_router(state.clone()), state)
}
