// SPDX-License-Identifier: MIT

//! OAuth client machinery shared by the provider adapters.
//!
//! Handles:
//! - Authorization URL construction (state = user_id, scopes sorted)
//! - Authorization-code exchange
//! - Refresh-token exchange
//! - The refresh-on-expiry read path with per-(user, provider) locking

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use serde::Deserialize;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::db::FirestoreDb;
use crate::error::AppError;
use crate::models::{Credential, Provider};

/// Bounded timeout applied to every outbound provider call.
const REQUEST_TIMEOUT_SECS: u64 = 10;

/// Per-(user, provider) mutexes serializing token refresh attempts.
pub type RefreshLocks = Arc<DashMap<String, Arc<Mutex<()>>>>;

/// Build the shared HTTP client with the provider-call timeout.
pub fn http_client() -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
        .build()
        .expect("failed to build HTTP client")
}

/// How a provider's token endpoint expects its parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenRequestStyle {
    /// application/x-www-form-urlencoded (Google)
    Form,
    /// application/json (Atlassian)
    Json,
}

/// OAuth client for one provider's authorization and token endpoints.
#[derive(Clone)]
pub struct OAuthClient {
    http: reqwest::Client,
    provider: Provider,
    auth_uri: String,
    token_uri: String,
    client_id: String,
    client_secret: String,
    redirect_uri: String,
    /// Provider-fixed scopes, kept sorted so repeated authorization
    /// requests are scope-stable.
    scopes: Vec<String>,
    /// Extra authorization-request parameters (e.g. Google's offline
    /// access flags, Atlassian's audience).
    extra_auth_params: Vec<(&'static str, String)>,
    token_style: TokenRequestStyle,
}

impl OAuthClient {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        http: reqwest::Client,
        provider: Provider,
        auth_uri: impl Into<String>,
        token_uri: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        redirect_uri: impl Into<String>,
        mut scopes: Vec<String>,
        extra_auth_params: Vec<(&'static str, String)>,
        token_style: TokenRequestStyle,
    ) -> Self {
        scopes.sort();
        Self {
            http,
            provider,
            auth_uri: auth_uri.into(),
            token_uri: token_uri.into(),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            redirect_uri: redirect_uri.into(),
            scopes,
            extra_auth_params,
            token_style,
        }
    }

    pub fn provider(&self) -> Provider {
        self.provider
    }

    /// Authorization-request URL carrying `state = user_id`.
    pub fn authorization_url(&self, user_id: &str) -> String {
        let mut params: Vec<(&str, String)> = vec![
            ("client_id", self.client_id.clone()),
            ("redirect_uri", self.redirect_uri.clone()),
            ("response_type", "code".to_string()),
            ("scope", self.scopes.join(" ")),
            ("state", user_id.to_string()),
        ];
        for (name, value) in &self.extra_auth_params {
            params.push((name, value.clone()));
        }

        let query = params
            .iter()
            .map(|(name, value)| format!("{}={}", name, urlencoding::encode(value)))
            .collect::<Vec<_>>()
            .join("&");

        format!("{}?{}", self.auth_uri, query)
    }

    /// Exchange an authorization code for tokens.
    pub async fn exchange_code(&self, code: &str) -> Result<TokenResponse, AppError> {
        let params = [
            ("grant_type", "authorization_code"),
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("code", code),
            ("redirect_uri", self.redirect_uri.as_str()),
        ];

        let response = self
            .token_request(&params)
            .await
            .map_err(|e| AppError::AuthExchange(format!("Token exchange request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, body = %body, provider = %self.provider, "Token exchange failed");
            return Err(AppError::AuthExchange(format!(
                "Token exchange failed with status {}",
                status
            )));
        }

        response
            .json()
            .await
            .map_err(|e| AppError::AuthExchange(format!("Failed to parse token response: {}", e)))
    }

    /// Refresh an expired access token. Called at most once per read.
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenResponse, AppError> {
        let params = [
            ("grant_type", "refresh_token"),
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("refresh_token", refresh_token),
        ];

        let response = self.token_request(&params).await.map_err(|e| {
            AppError::upstream(self.provider, format!("Token refresh request failed: {}", e))
        })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();

            // A rejected refresh token means the grant is gone; the user
            // must re-consent.
            if status.is_client_error() {
                tracing::warn!(status = %status, provider = %self.provider, "Refresh token rejected");
                return Err(AppError::ReauthRequired(self.provider));
            }

            return Err(AppError::upstream(
                self.provider,
                format!("HTTP {}: {}", status, body),
            ));
        }

        response.json().await.map_err(|e| {
            AppError::upstream(self.provider, format!("Failed to parse refresh response: {}", e))
        })
    }

    async fn token_request(
        &self,
        params: &[(&str, &str)],
    ) -> Result<reqwest::Response, reqwest::Error> {
        let request = self.http.post(&self.token_uri);
        match self.token_style {
            TokenRequestStyle::Form => request.form(params).send().await,
            TokenRequestStyle::Json => {
                let body: serde_json::Map<String, serde_json::Value> = params
                    .iter()
                    .map(|(k, v)| ((*k).to_string(), serde_json::Value::from(*v)))
                    .collect();
                request.json(&body).send().await
            }
        }
    }

    /// Build a storable credential from a token-exchange response.
    pub fn credential_from_token(
        &self,
        user_id: &str,
        token: &TokenResponse,
        now: DateTime<Utc>,
    ) -> Credential {
        Credential {
            user_id: user_id.to_string(),
            provider: self.provider,
            access_token: token.access_token.clone(),
            refresh_token: token.refresh_token.clone(),
            token_uri: self.token_uri.clone(),
            client_id: self.client_id.clone(),
            client_secret: self.client_secret.clone(),
            scopes: self.scopes.clone(),
            expiry: token.expiry(now),
            provider_extra: Default::default(),
            updated_at: String::new(),
        }
    }
}

/// Token endpoint response (exchange and refresh).
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub expires_in: Option<i64>,
    #[serde(default)]
    pub scope: Option<String>,
}

impl TokenResponse {
    /// Absolute expiry derived from `expires_in`.
    pub fn expiry(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.expires_in.map(|secs| now + Duration::seconds(secs))
    }
}

/// Load a usable credential for the read path, refreshing on expiry.
///
/// 1. Load the credential; `NotConnected` if absent.
/// 2. If expired with a refresh token, refresh exactly once under the
///    per-(user, provider) lock and persist before use.
/// 3. If expired without a refresh token, `ReauthRequired`.
pub async fn valid_credential(
    db: &FirestoreDb,
    oauth: &OAuthClient,
    locks: &RefreshLocks,
    user_id: &str,
) -> Result<Credential, AppError> {
    let provider = oauth.provider();

    let credential = db
        .get_credential(user_id, provider)
        .await?
        .ok_or(AppError::NotConnected(provider))?;

    if !credential.is_expired(Utc::now()) {
        return Ok(credential);
    }

    // Serialize refresh attempts per (user, provider): concurrent refreshes
    // with the same stale refresh token race the provider's rotation policy.
    let lock = locks
        .entry(Credential::doc_id(user_id, provider))
        .or_insert_with(|| Arc::new(Mutex::new(())))
        .clone();
    let _guard = lock.lock().await;

    // Re-read after acquiring the lock: another task may have refreshed.
    let credential = db
        .get_credential(user_id, provider)
        .await?
        .ok_or(AppError::NotConnected(provider))?;

    let now = Utc::now();
    if !credential.is_expired(now) {
        return Ok(credential);
    }

    let refresh_token = credential
        .refresh_token
        .clone()
        .ok_or(AppError::ReauthRequired(provider))?;

    tracing::info!(user_id, provider = %provider, "Access token expired, refreshing");

    let token = oauth.refresh(&refresh_token).await?;

    let mut updated = credential;
    updated.access_token = token.access_token.clone();
    updated.expiry = token.expiry(now);
    if let Some(rotated) = token.refresh_token {
        updated.refresh_token = Some(rotated);
    }

    db.set_credential(&updated).await?;

    tracing::info!(user_id, provider = %provider, "Token refreshed and stored");
    Ok(updated)
}
