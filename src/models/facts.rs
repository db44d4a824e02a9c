// SPDX-License-Identifier: MIT

//! Normalized provider facts, decoupled from each provider's wire format.

use serde::{Deserialize, Serialize};

/// Today's fitness totals from the fitness tracker.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct FitnessFacts {
    /// Integer sum of step counts over today's data points
    pub steps: i64,
    /// Floating-point sum of expended calories
    pub calories: f64,
    /// Integer sum of active minutes
    pub active_minutes: i64,
}

/// A normalized calendar event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalendarEvent {
    pub id: String,
    pub title: String,
    /// Start timestamp, or the all-day date for events without a timed start
    pub start: String,
    pub end: String,
    /// Organizer email, or "primary" when not reported
    pub calendar: String,
}

/// Events whose start falls on the given UTC calendar day (`YYYY-MM-DD`).
///
/// Timed starts are RFC 3339 and all-day starts are bare dates, so a string
/// prefix match covers both.
pub fn events_on_day<'a>(events: &'a [CalendarEvent], date: &str) -> Vec<&'a CalendarEvent> {
    events.iter().filter(|e| e.start.starts_with(date)).collect()
}

/// A normalized issue-tracker ticket.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ticket {
    pub key: String,
    pub summary: String,
    /// Provider-side priority name (e.g. "High", "Medium")
    pub priority: String,
    /// Provider-side status name (e.g. "In Progress", "Done")
    pub status: String,
}
