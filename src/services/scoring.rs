// SPDX-License-Identifier: MIT

//! Pure scoring functions: normalized facts + goals in, 0-100 scores out.
//! No I/O here; the wellness service wires these to the provider adapters.

use crate::error::AppError;
use crate::models::{
    CalendarScoreBlock, FitnessFacts, FitnessScoreBlock, JiraScoreBlock, Ticket, UserGoals,
};

/// Signal weights for the daily total.
pub const WEIGHT_FITNESS: f64 = 0.4;
pub const WEIGHT_JIRA: f64 = 0.4;
pub const WEIGHT_CALENDAR: f64 = 0.2;

/// Round to two decimal places (all scores are stored this way).
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Fitness score: weighted goal-completion ratios, each capped at 1.0.
///
/// Goals must be positive; a zero goal is a division-by-zero waiting to
/// happen and is rejected, never treated as satisfied.
pub fn fitness_score(
    facts: &FitnessFacts,
    goals: &UserGoals,
) -> Result<FitnessScoreBlock, AppError> {
    for (name, goal) in [
        ("step_goal", goals.step_goal),
        ("calorie_goal", goals.calorie_goal),
        ("active_minute_goal", goals.active_minute_goal),
    ] {
        if !goal.is_finite() || goal <= 0.0 {
            return Err(AppError::InvalidGoal(format!(
                "{} must be positive to compute a fitness score",
                name
            )));
        }
    }

    let steps_ratio = (facts.steps as f64 / goals.step_goal).min(1.0);
    let calories_ratio = (facts.calories / goals.calorie_goal).min(1.0);
    let active_ratio = (facts.active_minutes as f64 / goals.active_minute_goal).min(1.0);

    let score = round2((steps_ratio * 0.5 + calories_ratio * 0.3 + active_ratio * 0.2) * 100.0);

    Ok(FitnessScoreBlock {
        steps: facts.steps,
        calories: facts.calories,
        active_minutes: facts.active_minutes,
        score,
    })
}

fn is_done_like(status: &str) -> bool {
    matches!(status.to_lowercase().as_str(), "done" | "resolved")
}

fn is_in_progress_like(status: &str) -> bool {
    matches!(status.to_lowercase().as_str(), "in progress" | "in-review")
}

/// Issue-tracker score: no backlog is a perfect score; otherwise reward
/// completion heavily and in-progress work lightly.
pub fn jira_score(tickets: &[Ticket]) -> JiraScoreBlock {
    let total = tickets.len();
    if total == 0 {
        return JiraScoreBlock {
            total_tickets: 0,
            completed_tickets: 0,
            in_progress_tickets: 0,
            score: 100.0,
        };
    }

    let completed = tickets.iter().filter(|t| is_done_like(&t.status)).count();
    let in_progress = tickets
        .iter()
        .filter(|t| is_in_progress_like(&t.status))
        .count();

    let completion_ratio = completed as f64 / total as f64;
    let progress_ratio = in_progress as f64 / total as f64;

    JiraScoreBlock {
        total_tickets: total,
        completed_tickets: completed,
        in_progress_tickets: in_progress,
        score: round2((completion_ratio * 0.8 + progress_ratio * 0.2) * 100.0),
    }
}

/// Calendar score from today's meeting count.
///
/// The bands are deliberately non-monotonic (3-6 meetings is considered the
/// healthy balance); the literal thresholds are load-bearing and must not
/// be "corrected".
pub fn calendar_score(meetings: usize) -> CalendarScoreBlock {
    let score = if meetings == 0 {
        100.0
    } else if meetings <= 2 {
        70.0
    } else if meetings <= 6 {
        100.0
    } else {
        (120.0 - meetings as f64 * 10.0).max(60.0)
    };

    CalendarScoreBlock {
        meetings,
        score: round2(score),
    }
}

/// Weighted daily total over the three signal scores.
pub fn total_score(fitness: f64, jira: f64, calendar: f64) -> f64 {
    round2(fitness * WEIGHT_FITNESS + jira * WEIGHT_JIRA + calendar * WEIGHT_CALENDAR)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ticket(status: &str) -> Ticket {
        Ticket {
            key: "T-1".to_string(),
            summary: String::new(),
            priority: "High".to_string(),
            status: status.to_string(),
        }
    }

    #[test]
    fn test_fitness_score_zero_activity_is_zero() {
        let facts = FitnessFacts::default();
        let block = fitness_score(&facts, &UserGoals::default()).unwrap();
        assert_eq!(block.score, 0.0);
    }

    #[test]
    fn test_fitness_score_exact_goals_is_hundred() {
        let facts = FitnessFacts {
            steps: 8000,
            calories: 2000.0,
            active_minutes: 30,
        };
        let block = fitness_score(&facts, &UserGoals::default()).unwrap();
        assert_eq!(block.score, 100.0);
    }

    #[test]
    fn test_fitness_ratios_capped_at_goal() {
        // Overshooting every goal must not exceed 100.
        let facts = FitnessFacts {
            steps: 50_000,
            calories: 9000.0,
            active_minutes: 600,
        };
        let block = fitness_score(&facts, &UserGoals::default()).unwrap();
        assert_eq!(block.score, 100.0);
    }

    #[test]
    fn test_fitness_partial_progress() {
        // 4000/8000 steps = 0.5 ratio, rest zero: 0.5 * 0.5 * 100 = 25.0
        let facts = FitnessFacts {
            steps: 4000,
            calories: 0.0,
            active_minutes: 0,
        };
        let block = fitness_score(&facts, &UserGoals::default()).unwrap();
        assert_eq!(block.score, 25.0);
    }

    #[test]
    fn test_fitness_zero_goal_rejected() {
        let goals = UserGoals {
            step_goal: 0.0,
            ..UserGoals::default()
        };
        let err = fitness_score(&FitnessFacts::default(), &goals).unwrap_err();
        assert!(matches!(err, AppError::InvalidGoal(_)));
    }

    #[test]
    fn test_jira_score_no_backlog_is_perfect() {
        let block = jira_score(&[]);
        assert_eq!(block.score, 100.0);
        assert_eq!(block.total_tickets, 0);
    }

    #[test]
    fn test_jira_score_mixed_statuses() {
        // 5 tickets: 2 done-like, 1 in-progress-like.
        // 100 * (0.8 * 0.4 + 0.2 * 0.2) = 36.0
        let tickets = vec![
            ticket("Done"),
            ticket("Resolved"),
            ticket("In Progress"),
            ticket("To Do"),
            ticket("Blocked"),
        ];
        let block = jira_score(&tickets);
        assert_eq!(block.completed_tickets, 2);
        assert_eq!(block.in_progress_tickets, 1);
        assert_eq!(block.score, 36.0);
    }

    #[test]
    fn test_jira_status_matching_case_insensitive() {
        let tickets = vec![ticket("DONE"), ticket("in-review")];
        let block = jira_score(&tickets);
        assert_eq!(block.completed_tickets, 1);
        assert_eq!(block.in_progress_tickets, 1);
    }

    #[test]
    fn test_calendar_score_bands() {
        assert_eq!(calendar_score(0).score, 100.0);
        assert_eq!(calendar_score(1).score, 70.0);
        assert_eq!(calendar_score(2).score, 70.0);
        assert_eq!(calendar_score(3).score, 100.0);
        assert_eq!(calendar_score(5).score, 100.0);
        assert_eq!(calendar_score(6).score, 100.0);
        assert_eq!(calendar_score(7).score, 60.0);
    }

    #[test]
    fn test_calendar_score_eight_meeting_boundary() {
        // 120 - 80 = 40, floored at 60.
        assert_eq!(calendar_score(8).score, 60.0);
    }

    #[test]
    fn test_total_score_weighting() {
        // 80*0.4 + 50*0.4 + 100*0.2 = 72.0
        assert_eq!(total_score(80.0, 50.0, 100.0), 72.0);
    }

    #[test]
    fn test_round2() {
        assert_eq!(round2(36.666_666), 36.67);
        assert_eq!(round2(100.0), 100.0);
    }
}
