// SPDX-License-Identifier: MIT

//! Google Fit adapter: turns a valid credential into today's normalized
//! fitness totals (steps, calories, active minutes).

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::config::Config;
use crate::db::FirestoreDb;
use crate::error::AppError;
use crate::models::{Credential, FitnessFacts, Provider};
use crate::services::oauth::{
    valid_credential, OAuthClient, RefreshLocks, TokenRequestStyle,
};

const GOOGLE_AUTH_URI: &str = "https://accounts.google.com/o/oauth2/auth";
const GOOGLE_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
const FITNESS_API_BASE: &str = "https://www.googleapis.com/fitness/v1";

const STEPS_SOURCE: &str =
    "derived:com.google.step_count.delta:com.google.android.gms:estimated_steps";
const CALORIES_SOURCE: &str =
    "derived:com.google.calories.expended:com.google.android.gms:merge_calories_expended";
const ACTIVE_MINUTES_SOURCE: &str =
    "derived:com.google.active_minutes:com.google.android.gms:merge_active_minutes";

/// Google Fit provider adapter.
#[derive(Clone)]
pub struct FitnessService {
    oauth: OAuthClient,
    http: reqwest::Client,
    api_base: String,
    db: FirestoreDb,
    refresh_locks: RefreshLocks,
}

impl FitnessService {
    pub fn new(config: &Config, db: FirestoreDb, refresh_locks: RefreshLocks) -> Self {
        Self::with_endpoints(
            config,
            db,
            refresh_locks,
            GOOGLE_AUTH_URI,
            GOOGLE_TOKEN_URI,
            FITNESS_API_BASE,
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
            Provider::Fitness,
            auth_uri,
            token_uri,
            &config.google_client_id,
            &config.google_client_secret,
            config.callback_url(Provider::Fitness.as_str()),
            vec![
                "https://www.googleapis.com/auth/fitness.activity.read".to_string(),
                "https://www.googleapis.com/auth/fitness.location.read".to_string(),
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

    /// Authorization URL for connecting Google Fit.
    pub fn auth_url(&self, user_id: &str) -> String {
        self.oauth.authorization_url(user_id)
    }

    /// Exchange the callback code and persist the credential.
    pub async fn handle_callback(&self, code: &str, user_id: &str) -> Result<Credential, AppError> {
        let token = self.oauth.exchange_code(code).await?;
        let credential = self.oauth.credential_from_token(user_id, &token, Utc::now());
        self.db.set_credential(&credential).await?;
        tracing::info!(user_id, "Google Fit connected, credential stored");
        Ok(credential)
    }

    /// Today's totals: provider-local midnight (UTC) to now.
    pub async fn daily_facts(&self, user_id: &str) -> Result<FitnessFacts, AppError> {
        let credential =
            valid_credential(&self.db, &self.oauth, &self.refresh_locks, user_id).await?;

        let now = Utc::now();
        let dataset_id = today_dataset_id(now);

        let steps = self
            .aggregate(&credential.access_token, STEPS_SOURCE, &dataset_id)
            .await?;
        let calories = self
            .aggregate(&credential.access_token, CALORIES_SOURCE, &dataset_id)
            .await?;
        let active = self
            .aggregate(&credential.access_token, ACTIVE_MINUTES_SOURCE, &dataset_id)
            .await?;

        Ok(FitnessFacts {
            steps: steps.int_total,
            calories: calories.fp_total,
            active_minutes: active.int_total,
        })
    }

    /// Fetch one data source's dataset and sum its point values.
    async fn aggregate(
        &self,
        access_token: &str,
        data_source_id: &str,
        dataset_id: &str,
    ) -> Result<Totals, AppError> {
        let url = format!(
            "{}/users/me/dataSources/{}/datasets/{}",
            self.api_base, data_source_id, dataset_id
        );

        let response = self
            .http
            .get(&url)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| AppError::upstream(Provider::Fitness, e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::upstream(
                Provider::Fitness,
                format!("HTTP {}: {}", status, body),
            ));
        }

        let dataset: Dataset = response
            .json()
            .await
            .map_err(|e| AppError::upstream(Provider::Fitness, format!("JSON parse error: {}", e)))?;

        Ok(dataset.totals())
    }
}

/// Dataset id covering UTC midnight to `now`, in nanoseconds.
fn today_dataset_id(now: DateTime<Utc>) -> String {
    let start = now
        .date_naive()
        .and_hms_opt(0, 0, 0)
        .unwrap_or_default()
        .and_utc();
    format!(
        "{}-{}",
        start.timestamp() * 1_000_000_000,
        now.timestamp() * 1_000_000_000
    )
}

/// Summed point values; missing per-point values count as 0.
#[derive(Debug, Default, Clone, Copy)]
struct Totals {
    int_total: i64,
    fp_total: f64,
}

#[derive(Debug, Deserialize)]
struct Dataset {
    #[serde(default)]
    point: Vec<DataPoint>,
}

impl Dataset {
    fn totals(&self) -> Totals {
        let mut totals = Totals::default();
        for point in &self.point {
            for value in &point.value {
                totals.int_total += value.int_val.unwrap_or(0);
                totals.fp_total += value.fp_val.unwrap_or(0.0);
            }
        }
        totals
    }
}

#[derive(Debug, Deserialize)]
struct DataPoint {
    #[serde(default)]
    value: Vec<DataValue>,
}

#[derive(Debug, Deserialize)]
struct DataValue {
    #[serde(rename = "intVal")]
    int_val: Option<i64>,
    #[serde(rename = "fpVal")]
    fp_val: Option<f64>,
}
