// SPDX-License-Identifier: MIT

//! Recommendation engine: reduce live provider signals to the single
//! highest-priority suggestion for right now.
//!
//! Unlike wellness scoring, a provider failure here is not fatal. Each
//! source degrades to its empty value independently so one disconnected
//! provider never hides advice derived from the others.

use chrono::Utc;

use crate::db::FirestoreDb;
use crate::error::AppError;
use crate::models::{
    events_on_day, FitnessFacts, Recommendation, RecommendationKind, RecommendationResponse,
    Ticket, UserGoals,
};
use crate::services::calendar::CalendarService;
use crate::services::fitness::FitnessService;
use crate::services::jira::JiraService;
use crate::time_utils::{format_utc_rfc3339, today_utc};

/// Fraction of a fitness goal below which a nudge fires.
const FITNESS_NUDGE_RATIO: f64 = 0.7;

/// Outcome of one provider fetch on the recommendation path.
enum SourceData<T> {
    Live(T),
    Unavailable,
}

impl<T: Default> SourceData<T> {
    /// The live value, or the source's empty default.
    fn into_value(self) -> T {
        match self {
            SourceData::Live(value) => value,
            SourceData::Unavailable => T::default(),
        }
    }
}

fn tag<T>(source: &str, user_id: &str, result: Result<T, AppError>) -> SourceData<T> {
    match result {
        Ok(value) => SourceData::Live(value),
        Err(e) => {
            tracing::warn!(user_id, source, error = %e, "Source unavailable for recommendations");
            SourceData::Unavailable
        }
    }
}

/// Top-recommendation service.
#[derive(Clone)]
pub struct RecommendationService {
    db: FirestoreDb,
    fitness: FitnessService,
    calendar: CalendarService,
    jira: JiraService,
}

impl RecommendationService {
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
        }
    }

    /// The single highest-priority recommendation for today.
    pub async fn top_recommendation(
        &self,
        user_id: &str,
    ) -> Result<RecommendationResponse, AppError> {
        let goals = self.db.get_goals(user_id).await?.unwrap_or_default();

        let tickets = tag("jira", user_id, self.jira.assigned_tickets(user_id).await);
        let events = tag("calendar", user_id, self.calendar.month_events(user_id).await);
        let facts = tag("fitness", user_id, self.fitness.daily_facts(user_id).await);

        let tickets = tickets.into_value();
        let events = events.into_value();
        let facts = facts.into_value();

        let meetings_today = events_on_day(&events, &today_utc()).len();
        let candidates = build_candidates(&tickets, meetings_today, &facts, &goals);

        Ok(RecommendationResponse {
            user_id: user_id.to_string(),
            recommendation: pick_top(candidates),
            generated_at: format_utc_rfc3339(Utc::now()),
            source: "fresh".to_string(),
        })
    }
}

/// Candidate recommendations in ladder order: tickets, then meetings, then
/// movement. Evaluation order matters because the final sort is stable.
fn build_candidates(
    tickets: &[Ticket],
    meetings_today: usize,
    facts: &FitnessFacts,
    goals: &UserGoals,
) -> Vec<Recommendation> {
    let mut candidates = Vec::new();

    let high = tickets.iter().filter(|t| t.priority.contains("High")).count();
    let medium = tickets
        .iter()
        .filter(|t| t.priority.contains("Medium"))
        .count();
    let low = tickets.iter().filter(|t| t.priority.contains("Low")).count();

    if high > 0 {
        candidates.push(Recommendation {
            priority: 1,
            kind: RecommendationKind::Jira,
            message: format!("{} high-priority task(s) pending, complete them first", high),
        });
    } else if medium > 0 {
        candidates.push(Recommendation {
            priority: 2,
            kind: RecommendationKind::Jira,
            message: format!("{} medium-priority task(s) left, plan before meetings", medium),
        });
    } else if low > 0 {
        candidates.push(Recommendation {
            priority: 4,
            kind: RecommendationKind::Jira,
            message: format!("{} low-priority task(s) can wait until you have free time", low),
        });
    }

    // The calendar always produces a candidate; a quiet day is itself a
    // signal worth surfacing.
    if meetings_today > 6 {
        candidates.push(Recommendation {
            priority: 1,
            kind: RecommendationKind::Calendar,
            message: "Too many meetings today, block an hour for deep work".to_string(),
        });
    } else if meetings_today >= 3 {
        candidates.push(Recommendation {
            priority: 3,
            kind: RecommendationKind::Calendar,
            message: "Balanced meeting day, schedule short recovery breaks".to_string(),
        });
    } else {
        candidates.push(Recommendation {
            priority: 4,
            kind: RecommendationKind::Calendar,
            message: "Light meeting day, a good window for deep work".to_string(),
        });
    }

    if (facts.steps as f64) < FITNESS_NUDGE_RATIO * goals.step_goal {
        candidates.push(Recommendation {
            priority: 2,
            kind: RecommendationKind::Fitness,
            message: format!(
                "Only {}/{} steps so far, take a 10-minute walk",
                facts.steps, goals.step_goal
            ),
        });
    }

    if (facts.active_minutes as f64) < FITNESS_NUDGE_RATIO * goals.active_minute_goal {
        candidates.push(Recommendation {
            priority: 2,
            kind: RecommendationKind::Fitness,
            message: format!(
                "Only {}/{} active minutes today, get moving",
                facts.active_minutes, goals.active_minute_goal
            ),
        });
    }

    candidates
}

/// Lowest priority number wins; ties keep insertion order. An empty ladder
/// yields the all-clear recommendation.
fn pick_top(mut candidates: Vec<Recommendation>) -> Recommendation {
    candidates.sort_by_key(|c| c.priority);
    candidates.into_iter().next().unwrap_or(Recommendation {
        priority: 5,
        kind: RecommendationKind::General,
        message: "No major issues, stay consistent today".to_string(),
    })
}
