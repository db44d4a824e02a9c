// SPDX-License-Identifier: MIT

//! Google Calendar adapter: current-month events from the primary
//! calendar, normalized for scoring and recommendations.

use chrono::{DateTime, Datelike, Days, Utc};
use serde::Deserialize;

use crate::config::Config;
use crate::db::FirestoreDb;
use crate::error::AppError;
use crate::models::{CalendarEvent, Credential, Provider};
use crate::services::oauth::{
    valid_credential, OAuthClient, RefreshLocks, TokenRequestStyle,
};

const GOOGLE_AUTH_URI: &str = "https://accounts.google.com/o/oauth2/auth";
const GOOGLE_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
const CALENDAR_API_BASE: &str = "https://www.googleapis.com/calendar/v3";

/// Google Calendar provider adapter.
#[derive(Clone)]
pub struct CalendarService {
    oauth: OAuthClient,
    http: reqwest::Client,
    api_base: String,
    db: FirestoreDb,
    refresh_locks: RefreshLocks,
}

impl CalendarService {
    pub fn new(config: &Config, db: FirestoreDb, refresh_locks: RefreshLocks) -> Self {
        Self::with_endpoints(
            config,
            db,
            refresh_locks,
            GOOGLE_AUTH_URI,
            GOOGLE_TOKEN_URI,
            CALENDAR_API_BASE,
        )
    }

    /// Construct against explicit endpoints (used by tests).
    pub fn with_endpoints(
        config: &Config,
        db: FirestoreDb,
        refresh_locks: RefreshLocks,
        auth_uri: &str,
        token_uri: &str,
        api_base: &str,
    ) -> Self {
        let http = crate::services::oauth::http_client();
        let oauth = OAuthClient::new(
            http.clone(),
            Provider::Calendar,
            auth_uri,
            token_uri,
            &config.google_client_id,
            &config.google_client_secret,
            config.callback_url(Provider::Calendar.as_str()),
            vec![
                "https://www.googleapis.com/auth/calendar.events.readonly".to_string(),
                "https://www.googleapis.com/auth/calendar.readonly".to_string(),
            ],
            vec![
                ("access_type", "offline".to_string()),
                ("include_granted_scopes", "true".to_string()),
                ("prompt", "consent".to_string()),
            ],
            TokenRequestStyle::Form,
        );
        Self {
            oauth,
            http,
            api_base: api_base.to_string(),
            db,
            refresh_locks,
        }
    }

    /// Authorization URL for connecting Google Calendar.
    pub fn auth_url(&self, user_id: &str) -> String {
        self.oauth.authorization_url(user_id)
    }

    /// Exchange the callback code and persist the credential.
    pub async fn handle_callback(&self, code: &str, user_id: &str) -> Result<Credential, AppError> {
        let token = self.oauth.exchange_code(code).await?;
        let credential = self.oauth.credential_from_token(user_id, &token, Utc::now());
        self.db.set_credential(&credential).await?;
        tracing::info!(user_id, "Google Calendar connected, credential stored");
        Ok(credential)
    }

    /// Events for the current month, normalized.
    pub async fn month_events(&self, user_id: &str) -> Result<Vec<CalendarEvent>, AppError> {
        let credential =
            valid_credential(&self.db, &self.oauth, &self.refresh_locks, user_id).await?;

        let (start, end) = month_bounds(Utc::now());
        let url = format!("{}/calendars/primary/events", self.api_base);

        let response = self
            .http
            .get(&url)
            .bearer_auth(&credential.access_token)
            .query(&[
                ("timeMin", start.to_rfc3339()),
                ("timeMax", end.to_rfc3339()),
                ("singleEvents", "true".to_string()),
                ("orderBy", "startTime".to_string()),
            ])
            .send()
            .await
            .map_err(|e| AppError::upstream(Provider::Calendar, e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::upstream(
                Provider::Calendar,
                format!("HTTP {}: {}", status, body),
            ));
        }

        let events: EventsResponse = response.json().await.map_err(|e| {
            AppError::upstream(Provider::Calendar, format!("JSON parse error: {}", e))
        })?;

        Ok(events.items.into_iter().map(RawEvent::normalize).collect())
    }
}

/// First instant of the current month and of the next month (UTC).
fn month_bounds(now: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
    let today = now.date_naive();
    let first = today.with_day(1).unwrap_or(today);
    // Jumping 32 days forward always lands in the next month.
    let next = first + Days::new(32);
    let next_first = next.with_day(1).unwrap_or(next);

    (
        first.and_hms_opt(0, 0, 0).unwrap_or_default().and_utc(),
        next_first.and_hms_opt(0, 0, 0).unwrap_or_default().and_utc(),
    )
}

#[derive(Debug, Deserialize)]
struct EventsResponse {
    #[serde(default)]
    items: Vec<RawEvent>,
}

#[derive(Debug, Deserialize)]
struct RawEvent {
    #[serde(default)]
    id: String,
    summary: Option<String>,
    #[serde(default)]
    start: EventTime,
    #[serde(default)]
    end: EventTime,
    organizer: Option<Organizer>,
}

impl RawEvent {
    fn normalize(self) -> CalendarEvent {
        CalendarEvent {
            id: self.id,
            title: self.summary.unwrap_or_else(|| "No Title".to_string()),
            start: self.start.best(),
            end: self.end.best(),
            calendar: self
                .organizer
                .and_then(|o| o.email)
                .unwrap_or_else(|| "primary".to_string()),
        }
    }
}

/// Google event times are either a timed `dateTime` or an all-day `date`.
#[derive(Debug, Default, Deserialize)]
struct EventTime {
    #[serde(rename = "dateTime")]
    date_time: Option<String>,
    date: Option<String>,
}

impl EventTime {
    fn best(self) -> String {
        self.date_time.or(self.date).unwrap_or_default()
    }
}

#[derive(Debug, Deserialize)]
struct Organizer {
    email: Option<String>,
}
