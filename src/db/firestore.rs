// SPDX-License-Identifier: MIT

//! Firestore client wrapper with typed operations.
//!
//! Provides high-level operations for:
//! - Credentials (per-user, per-provider OAuth tokens)
//! - Goals (per-user fitness goals)
//! - Wellness records (one per user per day)

use crate::db::collections;
use crate::error::AppError;
use crate::models::{Credential, DailyWellnessRecord, Provider, UserGoals};
use crate::time_utils::format_utc_rfc3339;

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreDb {
    client: Option<firestore::FirestoreDb>,
}

impl FirestoreDb {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, AppError> {
        // If the emulator environment variable is set, use unauthenticated connection
        // to avoid local credential warnings and leakage.
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self, AppError> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            AppError::Database(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a mock Firestore client for testing (offline mode).
    ///
    /// All database operations will return an error if called.
    pub fn new_mock() -> Self {
        Self { client: None }
    }

    /// Helper to get the client or return an error if offline.
    fn get_client(&self) -> Result<&firestore::FirestoreDb, AppError> {
        self.client
            .as_ref()
            .ok_or_else(|| AppError::Database("Database not connected (offline mode)".to_string()))
    }

    // ─── Credential Operations ───────────────────────────────────

    /// Get the stored credential for a user and provider.
    pub async fn get_credential(
        &self,
        user_id: &str,
        provider: Provider,
    ) -> Result<Option<Credential>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::USER_TOKENS)
            .obj()
            .one(&Credential::doc_id(user_id, provider))
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Upsert a credential, stamping `updated_at`. Last write wins.
    pub async fn set_credential(&self, credential: &Credential) -> Result<(), AppError> {
        let mut credential = credential.clone();
        credential.updated_at = format_utc_rfc3339(chrono::Utc::now());

        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::USER_TOKENS)
            .document_id(Credential::doc_id(&credential.user_id, credential.provider))
            .object(&credential)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    // ─── Goal Operations ─────────────────────────────────────────

    /// Get a user's stored goals, if any were ever set.
    pub async fn get_goals(&self, user_id: &str) -> Result<Option<UserGoals>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::USER_GOALS)
            .obj()
            .one(user_id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Store a user's goals.
    pub async fn set_goals(&self, user_id: &str, goals: &UserGoals) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::USER_GOALS)
            .document_id(user_id)
            .object(goals)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    // ─── Wellness Record Operations ──────────────────────────────

    /// Get the wellness record for a user and calendar day.
    pub async fn get_wellness(
        &self,
        user_id: &str,
        date: &str,
    ) -> Result<Option<DailyWellnessRecord>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::WELLNESS_SCORES)
            .obj()
            .one(&DailyWellnessRecord::doc_id(user_id, date))
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Upsert a daily wellness record (one per user per day).
    pub async fn upsert_wellness(&self, record: &DailyWellnessRecord) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::WELLNESS_SCORES)
            .document_id(DailyWellnessRecord::doc_id(&record.user_id, &record.date))
            .object(record)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// All wellness records for a user, oldest day first.
    pub async fn wellness_history(
        &self,
        user_id: &str,
    ) -> Result<Vec<DailyWellnessRecord>, AppError> {
        let user_id = user_id.to_string();
        self.get_client()?
            .fluent()
            .select()
            .from(collections::WELLNESS_SCORES)
            .filter(move |q| q.for_all([q.field("user_id").eq(user_id.clone())]))
            .order_by([("date", firestore::FirestoreQueryDirection::Ascending)])
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}
