// SPDX-License-Identifier: MIT

//! Database layer (Firestore).

pub mod firestore;

pub use firestore::FirestoreDb;

/// Collection names as constants.
pub mod collections {
    /// OAuth credentials, keyed `{user_id}_{provider}`
    pub const USER_TOKENS: &str = "user_tokens";
    /// Fitness goals, keyed by user_id
    pub const USER_GOALS: &str = "user_goals";
    /// Daily wellness records, keyed `{user_id}_{date}`
    pub const WELLNESS_SCORES: &str = "wellness_scores";
}
