// SPDX-License-Identifier: MIT

//! Token refresh lifecycle against the Firestore emulator with a mocked
//! provider.
//!
//! Run with FIRESTORE_EMULATOR_HOST set; skipped otherwise.

mod common;

use chrono::{Duration, Utc};
use std::collections::BTreeMap;
use std::sync::Arc;
use wiremock::matchers::{body_string_contains, method, path, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

use daypulse::config::Config;
use daypulse::db::FirestoreDb;
use daypulse::error::AppError;
use daypulse::models::{Credential, Provider};
use daypulse::services::FitnessService;

fn unique_user(tag: &str) -> String {
    format!("{}-{}", tag, Utc::now().timestamp_nanos_opt().unwrap_or(0))
}

fn expired_credential(user_id: &str, refresh_token: Option<&str>) -> Credential {
    Credential {
        user_id: user_id.to_string(),
        provider: Provider::Fitness,
        access_token: "stale_token".to_string(),
        refresh_token: refresh_token.map(String::from),
        token_uri: "https://oauth2.googleapis.com/token".to_string(),
        client_id: "test_google_id".to_string(),
        client_secret: "test_google_secret".to_string(),
        scopes: vec![],
        expiry: Some(Utc::now() - Duration::hours(1)),
        provider_extra: BTreeMap::new(),
        updated_at: String::new(),
    }
}

async fn fitness_service(db: FirestoreDb, server: &MockServer) -> FitnessService {
    FitnessService::with_endpoints(
        &Config::default(),
        db,
        Arc::new(dashmap::DashMap::new()),
        &format!("{}/auth", server.uri()),
        &format!("{}/token", server.uri()),
        &server.uri(),
    )
}

#[tokio::test]
async fn test_expired_token_refreshed_once_and_persisted() {
    require_emulator!();

    let server = MockServer::start().await;

    // Exactly one refresh, even though three dataset reads follow.
    Mock::given(method("POST"))
        .and(path("/token"))
        .and(body_string_contains("grant_type=refresh_token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "access_token": "refreshed_token",
            "expires_in": 3600
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path_regex("^/users/me/dataSources/.*"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "point": [{"value": [{"intVal": 4200, "fpVal": 310.5}]}]
        })))
        .expect(3)
        .mount(&server)
        .await;

    let db = common::test_db().await;
    let user_id = unique_user("refresh");
    db.set_credential(&expired_credential(&user_id, Some("rt")))
        .await
        .unwrap();

    let service = fitness_service(db.clone(), &server).await;
    let facts = service.daily_facts(&user_id).await.unwrap();
    assert_eq!(facts.steps, 4200);
    assert_eq!(facts.active_minutes, 4200);
    assert!((facts.calories - 310.5).abs() < f64::EPSILON);

    // The refreshed token was written back before use.
    let stored = db
        .get_credential(&user_id, Provider::Fitness)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.access_token, "refreshed_token");
    assert!(stored.expiry.unwrap() > Utc::now());
    assert_eq!(stored.refresh_token.as_deref(), Some("rt"));
}

#[tokio::test]
async fn test_rotated_refresh_token_replaces_stored_one() {
    require_emulator!();

    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "access_token": "refreshed_token",
            "refresh_token": "rotated_rt",
            "expires_in": 3600
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path_regex("^/users/me/dataSources/.*"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"point": []})))
        .mount(&server)
        .await;

    let db = common::test_db().await;
    let user_id = unique_user("rotate");
    db.set_credential(&expired_credential(&user_id, Some("old_rt")))
        .await
        .unwrap();

    let service = fitness_service(db.clone(), &server).await;
    service.daily_facts(&user_id).await.unwrap();

    let stored = db
        .get_credential(&user_id, Provider::Fitness)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.refresh_token.as_deref(), Some("rotated_rt"));
}

#[tokio::test]
async fn test_rejected_refresh_requires_reauth() {
    require_emulator!();

    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
            "error": "invalid_grant"
        })))
        .mount(&server)
        .await;

    let db = common::test_db().await;
    let user_id = unique_user("reauth");
    db.set_credential(&expired_credential(&user_id, Some("revoked_rt")))
        .await
        .unwrap();

    let service = fitness_service(db.clone(), &server).await;
    let err = service.daily_facts(&user_id).await.unwrap_err();
    assert!(matches!(err, AppError::ReauthRequired(Provider::Fitness)));

    // The stale credential stays put; reconnecting will overwrite it.
    let stored = db
        .get_credential(&user_id, Provider::Fitness)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.access_token, "stale_token");
}

#[tokio::test]
async fn test_expired_without_refresh_token_requires_reauth() {
    require_emulator!();

    let server = MockServer::start().await;
    let db = common::test_db().await;
    let user_id = unique_user("no-rt");
    db.set_credential(&expired_credential(&user_id, None))
        .await
        .unwrap();

    let service = fitness_service(db.clone(), &server).await;
    let err = service.daily_facts(&user_id).await.unwrap_err();
    assert!(matches!(err, AppError::ReauthRequired(Provider::Fitness)));
}

#[tokio::test]
async fn test_missing_credential_is_not_connected() {
    require_emulator!();

    let server = MockServer::start().await;
    let db = common::test_db().await;
    let service = fitness_service(db, &server).await;

    let err = service
        .daily_facts(&unique_user("absent"))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotConnected(Provider::Fitness)));
}
