// SPDX-License-Identifier: MIT

//! Atlassian Jira adapter (3LO OAuth).
//!
//! The callback must resolve which Jira cloud site the grant covers before
//! the credential is usable; the site id is kept in `provider_extra`.

use chrono::Utc;
use serde::Deserialize;

use crate::config::Config;
use crate::db::FirestoreDb;
use crate::error::AppError;
use crate::models::{Credential, Provider, Ticket};
use crate::services::oauth::{
    valid_credential, OAuthClient, RefreshLocks, TokenRequestStyle,
};

const JIRA_AUTH_URI: &str = "https://auth.atlassian.com/authorize";
const JIRA_TOKEN_URI: &str = "https://auth.atlassian.com/oauth/token";
const JIRA_API_BASE: &str = "https://api.atlassian.com";

/// Key under which the resolved cloud site id is stored on the credential.
pub const CLOUD_ID_KEY: &str = "cloud_id";

/// Open tickets assigned to the caller, highest priority first.
const TICKET_JQL: &str =
    "assignee = currentUser() AND statusCategory != Done ORDER BY priority DESC";
const MAX_TICKETS: usize = 5;

/// Jira provider adapter.
#[derive(Clone)]
pub struct JiraService {
    oauth: OAuthClient,
    http: reqwest::Client,
    api_base: String,
    db: FirestoreDb,
    refresh_locks: RefreshLocks,
}

impl JiraService {
    pub fn new(config: &Config, db: FirestoreDb, refresh_locks: RefreshLocks) -> Self {
        Self::with_endpoints(
            config,
            db,
            refresh_locks,
            JIRA_AUTH_URI,
            JIRA_TOKEN_URI,
            JIRA_API_BASE,
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
            Provider::IssueTracker,
            auth_uri,
            token_uri,
            &config.jira_client_id,
            &config.jira_client_secret,
            config.callback_url(Provider::IssueTracker.as_str()),
            vec![
                "read:jira-user".to_string(),
                "read:jira-work".to_string(),
                "offline_access".to_string(),
            ],
            vec![
                ("audience", "api.atlassian.com".to_string()),
                ("prompt", "consent".to_string()),
            ],
            TokenRequestStyle::Json,
        );
        Self {
            oauth,
            http,
            api_base: api_base.to_string(),
            db,
            refresh_locks,
        }
    }

    /// Authorization URL for connecting Jira.
    pub fn auth_url(&self, user_id: &str) -> String {
        self.oauth.authorization_url(user_id)
    }

    /// Exchange the callback code, resolve the cloud site, persist.
    pub async fn handle_callback(&self, code: &str, user_id: &str) -> Result<Credential, AppError> {
        let token = self.oauth.exchange_code(code).await?;

        // The access token alone is not usable: Jira REST calls are rooted
        // at a cloud site id, resolved via accessible-resources.
        let cloud_id = self.resolve_cloud_id(&token.access_token).await?;

        let mut credential = self.oauth.credential_from_token(user_id, &token, Utc::now());
        credential
            .provider_extra
            .insert(CLOUD_ID_KEY.to_string(), cloud_id);

        self.db.set_credential(&credential).await?;
        tracing::info!(user_id, "Jira connected, credential stored");
        Ok(credential)
    }

    /// First accessible Jira cloud site for this grant.
    async fn resolve_cloud_id(&self, access_token: &str) -> Result<String, AppError> {
        let url = format!("{}/oauth/token/accessible-resources", self.api_base);

        let response = self
            .http
            .get(&url)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| {
                AppError::ResourceResolution(format!("accessible-resources request failed: {}", e))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(AppError::ResourceResolution(format!(
                "accessible-resources returned HTTP {}",
                status
            )));
        }

        let resources: Vec<AccessibleResource> = response.json().await.map_err(|e| {
            AppError::ResourceResolution(format!("Failed to parse accessible-resources: {}", e))
        })?;

        resources
            .into_iter()
            .next()
            .map(|r| r.id)
            .ok_or_else(|| {
                AppError::ResourceResolution("no accessible Jira site for this account".to_string())
            })
    }

    /// Up to 5 open tickets assigned to the caller, highest priority first.
    pub async fn assigned_tickets(&self, user_id: &str) -> Result<Vec<Ticket>, AppError> {
        let credential =
            valid_credential(&self.db, &self.oauth, &self.refresh_locks, user_id).await?;

        let cloud_id = credential
            .provider_extra
            .get(CLOUD_ID_KEY)
            .cloned()
            .ok_or_else(|| {
                AppError::ResourceResolution(
                    "no Jira site recorded for this credential".to_string(),
                )
            })?;

        let url = format!("{}/ex/jira/{}/rest/api/3/search", self.api_base, cloud_id);

        let response = self
            .http
            .get(&url)
            .bearer_auth(&credential.access_token)
            .query(&[
                ("jql", TICKET_JQL),
                ("maxResults", "5"),
                ("fields", "summary,priority,status"),
            ])
            .send()
            .await
            .map_err(|e| AppError::upstream(Provider::IssueTracker, e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::upstream(
                Provider::IssueTracker,
                format!("HTTP {}: {}", status, body),
            ));
        }

        let search: SearchResponse = response.json().await.map_err(|e| {
            AppError::upstream(Provider::IssueTracker, format!("JSON parse error: {}", e))
        })?;

        Ok(search
            .issues
            .into_iter()
            .take(MAX_TICKETS)
            .map(RawIssue::normalize)
            .collect())
    }
}

#[derive(Debug, Deserialize)]
struct AccessibleResource {
    id: String,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    issues: Vec<RawIssue>,
}

#[derive(Debug, Deserialize)]
struct RawIssue {
    key: String,
    #[serde(default)]
    fields: RawFields,
}

#[derive(Debug, Default, Deserialize)]
struct RawFields {
    summary: Option<String>,
    priority: Option<NamedField>,
    status: Option<NamedField>,
}

#[derive(Debug, Deserialize)]
struct NamedField {
    name: String,
}

impl RawIssue {
    fn normalize(self) -> Ticket {
        Ticket {
            key: self.key,
            summary: self.fields.summary.unwrap_or_default(),
            priority: self.fields.priority.map(|p| p.name).unwrap_or_default(),
            status: self.fields.status.map(|s| s.name).unwrap_or_default(),
        }
    }
}
