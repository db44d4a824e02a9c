// SPDX-License-Identifier: MIT

//! Per-(user, provider) OAuth credential records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// The three external delegated-access services.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Provider {
    Fitness,
    Calendar,
    IssueTracker,
}

impl Provider {
    /// Wire/storage name of the provider.
    pub fn as_str(self) -> &'static str {
        match self {
            Provider::Fitness => "fitness",
            Provider::Calendar => "calendar",
            Provider::IssueTracker => "issue_tracker",
        }
    }

    /// Parse a provider from its wire name.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "fitness" => Some(Provider::Fitness),
            "calendar" => Some(Provider::Calendar),
            "issue_tracker" => Some(Provider::IssueTracker),
            _ => None,
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stored OAuth token material authorizing calls on a user's behalf.
///
/// One document per (user_id, provider), overwritten on reconnect and on
/// token refresh. Adapters borrow a read copy and write back refreshed
/// tokens through the credential store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credential {
    pub user_id: String,
    pub provider: Provider,
    pub access_token: String,
    pub refresh_token: Option<String>,
    /// Token endpoint used for refreshes
    pub token_uri: String,
    pub client_id: String,
    pub client_secret: String,
    /// Granted scopes, kept in canonical sorted order
    pub scopes: Vec<String>,
    /// Access token expiry; absent means the provider reported none
    pub expiry: Option<DateTime<Utc>>,
    /// Provider-specific follow-up data (e.g. Atlassian cloud id)
    #[serde(default)]
    pub provider_extra: BTreeMap<String, String>,
    /// Last write timestamp (RFC 3339)
    pub updated_at: String,
}

impl Credential {
    /// Document id in the credential store.
    pub fn doc_id(user_id: &str, provider: Provider) -> String {
        format!("{}_{}", user_id, provider.as_str())
    }

    /// Whether the access token has expired as of `now`.
    ///
    /// A credential without an expiry is treated as non-expiring.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        match self.expiry {
            Some(expiry) => expiry <= now,
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn make_credential(expiry: Option<DateTime<Utc>>) -> Credential {
        Credential {
            user_id: "u1".to_string(),
            provider: Provider::Fitness,
            access_token: "at".to_string(),
            refresh_token: Some("rt".to_string()),
            token_uri: "https://oauth2.googleapis.com/token".to_string(),
            client_id: "cid".to_string(),
            client_secret: "cs".to_string(),
            scopes: vec![],
            expiry,
            provider_extra: BTreeMap::new(),
            updated_at: String::new(),
        }
    }

    #[test]
    fn test_expiry_in_past_is_expired() {
        let now = Utc::now();
        let cred = make_credential(Some(now - Duration::seconds(1)));
        assert!(cred.is_expired(now));
    }

    #[test]
    fn test_expiry_in_future_not_expired() {
        let now = Utc::now();
        let cred = make_credential(Some(now + Duration::hours(1)));
        assert!(!cred.is_expired(now));
    }

    #[test]
    fn test_no_expiry_never_expired() {
        let cred = make_credential(None);
        assert!(!cred.is_expired(Utc::now()));
    }

    #[test]
    fn test_provider_round_trip() {
        for p in [Provider::Fitness, Provider::Calendar, Provider::IssueTracker] {
            assert_eq!(Provider::parse(p.as_str()), Some(p));
        }
        assert_eq!(Provider::parse("email"), None);
    }
}
