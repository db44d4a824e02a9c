// SPDX-License-Identifier: MIT

//! Full daily-score recompute through all three mocked providers.

mod common;

use chrono::{Duration, Utc};
use std::collections::BTreeMap;
use std::sync::Arc;
use wiremock::matchers::{method, path, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

use daypulse::config::Config;
use daypulse::db::FirestoreDb;
use daypulse::models::{Credential, DailyWellnessRecord, Provider};
use daypulse::services::jira::CLOUD_ID_KEY;
use daypulse::services::{CalendarService, FitnessService, JiraService, WellnessService};
use daypulse::time_utils::{format_utc_rfc3339, today_utc};

fn live_credential(user_id: &str, provider: Provider) -> Credential {
    Credential {
        user_id: user_id.to_string(),
        provider,
        access_token: "live_token".to_string(),
        refresh_token: Some("rt".to_string()),
        token_uri: "https://example.invalid/token".to_string(),
        client_id: "cid".to_string(),
        client_secret: "cs".to_string(),
        scopes: vec![],
        expiry: Some(Utc::now() + Duration::hours(1)),
        provider_extra: BTreeMap::new(),
        updated_at: String::new(),
    }
}

fn wellness_over(db: FirestoreDb, server: &MockServer) -> WellnessService {
    let config = Config::default();
    let locks = Arc::new(dashmap::DashMap::new());
    let auth = format!("{}/auth", server.uri());
    let token = format!("{}/token", server.uri());

    let fitness = FitnessService::with_endpoints(
        &config,
        db.clone(),
        locks.clone(),
        &auth,
        &token,
        &server.uri(),
    );
    let calendar = CalendarService::with_endpoints(
        &config,
        db.clone(),
        locks.clone(),
        &auth,
        &token,
        &server.uri(),
    );
    let jira = JiraService::with_endpoints(&config, db.clone(), locks, &auth, &token, &server.uri());

    WellnessService::new(db, fitness, calendar, jira)
}

#[tokio::test]
async fn test_stale_record_recomputed_and_overwritten() {
    require_emulator!();

    let server = MockServer::start().await;

    // Fitness: every data source reads back 8000 / 2000.0 / 8000, which
    // caps every goal ratio at 1.0 for the default goals.
    Mock::given(method("GET"))
        .and(path_regex("^/users/me/dataSources/.*"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "point": [{"value": [{"intVal": 8000, "fpVal": 2000.0}]}]
        })))
        .expect(3)
        .mount(&server)
        .await;

    // Jira: one open in-progress ticket. 100 * (0.8*0 + 0.2*1) = 20.0
    Mock::given(method("GET"))
        .and(path("/ex/jira/site-123/rest/api/3/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "issues": [{
                "key": "PROJ-1",
                "fields": {
                    "summary": "Ship it",
                    "priority": {"name": "High"},
                    "status": {"name": "In Progress"}
                }
            }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    // Calendar: nothing starts today, so the meeting count is 0.
    Mock::given(method("GET"))
        .and(path("/calendars/primary/events"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "items": [{
                "id": "e1",
                "summary": "Planning",
                "start": {"dateTime": "2020-01-01T09:00:00Z"},
                "end": {"dateTime": "2020-01-01T10:00:00Z"}
            }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let db = common::test_db().await;
    let user_id = format!(
        "recompute-{}",
        Utc::now().timestamp_nanos_opt().unwrap_or(0)
    );
    let date = today_utc();

    db.set_credential(&live_credential(&user_id, Provider::Fitness))
        .await
        .unwrap();
    db.set_credential(&live_credential(&user_id, Provider::Calendar))
        .await
        .unwrap();
    let mut jira_credential = live_credential(&user_id, Provider::IssueTracker);
    jira_credential
        .provider_extra
        .insert(CLOUD_ID_KEY.to_string(), "site-123".to_string());
    db.set_credential(&jira_credential).await.unwrap();

    let old_stamp = format_utc_rfc3339(Utc::now() - Duration::hours(7));
    db.upsert_wellness(&DailyWellnessRecord {
        user_id: user_id.clone(),
        date: date.clone(),
        fitness: None,
        jira: None,
        calendar: None,
        total_score: 1.0,
        last_updated: old_stamp.clone(),
    })
    .await
    .unwrap();

    let wellness = wellness_over(db.clone(), &server);
    let record = wellness.daily_score(&user_id).await.unwrap();

    // 100*0.4 + 20*0.4 + 100*0.2 = 68.0
    assert_eq!(record.fitness.as_ref().unwrap().score, 100.0);
    assert_eq!(record.jira.as_ref().unwrap().score, 20.0);
    assert_eq!(record.calendar.as_ref().unwrap().score, 100.0);
    assert_eq!(record.calendar.as_ref().unwrap().meetings, 0);
    assert_eq!(record.total_score, 68.0);
    assert_ne!(record.last_updated, old_stamp);

    // The stale record was overwritten in the store.
    let stored = db.get_wellness(&user_id, &date).await.unwrap().unwrap();
    assert_eq!(stored.total_score, 68.0);

    // A second call inside the reuse window serves the stored record and
    // makes no further provider calls (the mock expectations above hold).
    let again = wellness.daily_score(&user_id).await.unwrap();
    assert_eq!(again.last_updated, record.last_updated);
}
