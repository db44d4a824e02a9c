// SPDX-License-Identifier: MIT

//! Application configuration loaded from environment variables.

use std::env;

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Google OAuth client ID (shared by the Fit and Calendar connections)
    pub google_client_id: String,
    /// Google OAuth client secret
    pub google_client_secret: String,
    /// Atlassian OAuth client ID
    pub jira_client_id: String,
    /// Atlassian OAuth client secret
    pub jira_client_secret: String,
    /// Public URL of this backend, used to build OAuth callback URLs
    pub backend_root_url: String,
    /// Frontend URL for post-OAuth redirects
    pub frontend_root_url: String,
    /// GCP project ID (Firestore)
    pub gcp_project_id: String,
    /// Server port
    pub port: u16,
}

impl Default for Config {
    /// Default config for testing only.
    fn default() -> Self {
        Self {
            google_client_id: "test_google_id".to_string(),
            google_client_secret: "test_google_secret".to_string(),
            jira_client_id: "test_jira_id".to_string(),
            jira_client_secret: "test_jira_secret".to_string(),
            backend_root_url: "http://localhost:8000".to_string(),
            frontend_root_url: "http://localhost:5173".to_string(),
            gcp_project_id: "test-project".to_string(),
            port: 8080,
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let backend_root_url =
            env::var("BACKEND_ROOT_URL").unwrap_or_else(|_| "http://localhost:8000".to_string());

        Ok(Self {
            google_client_id: env::var("GOOGLE_CLIENT_ID")
                .map_err(|_| ConfigError::Missing("GOOGLE_CLIENT_ID"))?,
            google_client_secret: env::var("GOOGLE_CLIENT_SECRET")
                .map(|v| v.trim().to_string())
                .map_err(|_| ConfigError::Missing("GOOGLE_CLIENT_SECRET"))?,
            jira_client_id: env::var("JIRA_CLIENT_ID")
                .map_err(|_| ConfigError::Missing("JIRA_CLIENT_ID"))?,
            jira_client_secret: env::var("JIRA_CLIENT_SECRET")
                .map(|v| v.trim().to_string())
                .map_err(|_| ConfigError::Missing("JIRA_CLIENT_SECRET"))?,
            frontend_root_url: env::var("FRONTEND_ROOT_URL")
                .unwrap_or_else(|_| "http://localhost:5173".to_string()),
            gcp_project_id: env::var("GCP_PROJECT_ID").unwrap_or_else(|_| "local-dev".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8000".to_string())
                .parse()
                .unwrap_or(8000),
            backend_root_url,
        })
    }

    /// OAuth callback URL for a provider, rooted at this backend.
    pub fn callback_url(&self, provider: &str) -> String {
        format!("{}/permissions/{}/callback", self.backend_root_url, provider)
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),
}
