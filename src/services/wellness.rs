// SPDX-License-Identifier: MIT

//! Wellness aggregator: staleness-gated daily score cache plus historical
//! averages.
//!
//! A daily record is reused as long as it is younger than the reuse window;
//! a stale or missing record triggers a full recompute through all three
//! provider adapters. Recomputes for the same (user, day) are coalesced so
//! concurrent callers do not all hit the providers.

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::db::FirestoreDb;
use crate::error::AppError;
use crate::models::{
    events_on_day, AverageScores, DailyWellnessRecord, GoalsUpdate, OverallWellness, UserGoals,
};
use crate::services::calendar::CalendarService;
use crate::services::fitness::FitnessService;
use crate::services::jira::JiraService;
use crate::services::scoring;
use crate::time_utils::{format_utc_rfc3339, today_utc};

/// How long a computed daily score is trusted before recomputing.
const REUSE_WINDOW_HOURS: i64 = 6;

/// Per-user mutexes coalescing concurrent recomputes.
///
/// Keyed by user rather than (user, date) so the map stays bounded by the
/// active user count instead of gaining an entry per user per day. A user
/// only ever recomputes today's record, so the coarser key serializes the
/// same work.
type ComputeLocks = Arc<DashMap<String, Arc<Mutex<()>>>>;

/// Daily wellness scoring service.
#[derive(Clone)]
pub struct WellnessService {
    db: FirestoreDb,
    fitness: FitnessService,
    calendar: CalendarService,
    jira: JiraService,
    compute_locks: ComputeLocks,
}

impl WellnessService {
    pub fn new(
        db: FirestoreDb,
        fitness: FitnessService,
        calendar: CalendarService,
        jira: JiraService,
    ) -> Self {
        Self {
            db,
            fitness,
            calendar,
            jira,
            compute_locks: Arc::new(DashMap::new()),
        }
    }

    /// Today's wellness record: reused when fresh, recomputed when stale.
    ///
    /// A failed recompute propagates its error and leaves any previously
    /// stored record for the day untouched.
    pub async fn daily_score(&self, user_id: &str) -> Result<DailyWellnessRecord, AppError> {
        let date = today_utc();

        if let Some(record) = self.reusable_record(user_id, &date, Utc::now()).await? {
            return Ok(record);
        }

        // Single-flight: one recompute per user at a time; latecomers wait
        // and then pick up the winner's record from the store.
        let lock = self.compute_lock(user_id);
        let _guard = lock.lock().await;

        if let Some(record) = self.reusable_record(user_id, &date, Utc::now()).await? {
            return Ok(record);
        }

        self.recompute_and_store(user_id, &date).await
    }

    /// The recompute lock for a user, shared across calls and dates.
    fn compute_lock(&self, user_id: &str) -> Arc<Mutex<()>> {
        self.compute_locks
            .entry(user_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// The stored record for (user, date) if it is still inside the reuse
    /// window, returned exactly as stored.
    async fn reusable_record(
        &self,
        user_id: &str,
        date: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<DailyWellnessRecord>, AppError> {
        Ok(self
            .db
            .get_wellness(user_id, date)
            .await?
            .filter(|record| within_reuse_window(&record.last_updated, now)))
    }

    /// Compute all three scores, aggregate, and overwrite the day's record.
    async fn recompute_and_store(
        &self,
        user_id: &str,
        date: &str,
    ) -> Result<DailyWellnessRecord, AppError> {
        let goals = self.goals(user_id).await?;

        // Any adapter failure aborts the whole recompute; no partial record
        // is ever written.
        let fitness_facts = self.fitness.daily_facts(user_id).await?;
        let tickets = self.jira.assigned_tickets(user_id).await?;
        let events = self.calendar.month_events(user_id).await?;
        let meetings = events_on_day(&events, date).len();

        let fitness = scoring::fitness_score(&fitness_facts, &goals)?;
        let jira = scoring::jira_score(&tickets);
        let calendar = scoring::calendar_score(meetings);

        let total = scoring::total_score(fitness.score, jira.score, calendar.score);

        let record = DailyWellnessRecord {
            user_id: user_id.to_string(),
            date: date.to_string(),
            fitness: Some(fitness),
            jira: Some(jira),
            calendar: Some(calendar),
            total_score: total,
            last_updated: format_utc_rfc3339(Utc::now()),
        };

        self.db.upsert_wellness(&record).await?;

        tracing::info!(user_id, date, total_score = total, "Daily wellness score computed");
        Ok(record)
    }

    /// Historical averages across all recorded days.
    ///
    /// Records missing a signal block are excluded from that signal's
    /// average rather than counted as zero.
    pub async fn overall_score(&self, user_id: &str) -> Result<OverallWellness, AppError> {
        let records = self.db.wellness_history(user_id).await?;
        if records.is_empty() {
            return Err(AppError::RecordNotFound(format!(
                "no wellness history for user {}",
                user_id
            )));
        }

        let fitness: Vec<f64> = records
            .iter()
            .filter_map(|r| r.fitness.as_ref().map(|b| b.score))
            .collect();
        let jira: Vec<f64> = records
            .iter()
            .filter_map(|r| r.jira.as_ref().map(|b| b.score))
            .collect();
        let calendar: Vec<f64> = records
            .iter()
            .filter_map(|r| r.calendar.as_ref().map(|b| b.score))
            .collect();
        let totals: Vec<f64> = records.iter().map(|r| r.total_score).collect();

        Ok(OverallWellness {
            user_id: user_id.to_string(),
            days_recorded: records.len(),
            average_scores: AverageScores {
                fitness: mean_or_zero(&fitness),
                jira: mean_or_zero(&jira),
                calendar: mean_or_zero(&calendar),
            },
            overall_wellness_score: mean_or_zero(&totals),
        })
    }

    /// The user's goals, falling back to defaults when never set.
    pub async fn goals(&self, user_id: &str) -> Result<UserGoals, AppError> {
        Ok(self.db.get_goals(user_id).await?.unwrap_or_default())
    }

    /// Validate and persist a partial goals update.
    pub async fn update_goals(
        &self,
        user_id: &str,
        update: &GoalsUpdate,
    ) -> Result<UserGoals, AppError> {
        update.validate()?;
        let mut goals = self.goals(user_id).await?;
        goals.apply(update)?;
        self.db.set_goals(user_id, &goals).await?;
        Ok(goals)
    }
}

/// Whether a record computed at `last_updated` is still trusted at `now`.
///
/// An unparseable timestamp counts as stale so the record gets rebuilt.
pub fn within_reuse_window(last_updated: &str, now: DateTime<Utc>) -> bool {
    match DateTime::parse_from_rfc3339(last_updated) {
        Ok(ts) => {
            now.signed_duration_since(ts.with_timezone(&Utc))
                < Duration::hours(REUSE_WINDOW_HOURS)
        }
        Err(_) => false,
    }
}

fn mean_or_zero(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    scoring::round2(values.iter().sum::<f64>() / values.len() as f64)
}
