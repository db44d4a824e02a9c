// SPDX-License-Identifier: MIT

//! User fitness goals with explicit defaults.
//!
//! Defaults apply when a goal was never set; a stored goal is always a
//! positive number, so "missing" and "explicit zero" are never confused.

use serde::{Deserialize, Serialize};

use crate::error::AppError;

pub const DEFAULT_STEP_GOAL: f64 = 8000.0;
pub const DEFAULT_CALORIE_GOAL: f64 = 2000.0;
pub const DEFAULT_ACTIVE_MINUTE_GOAL: f64 = 30.0;

/// Daily fitness goals for a user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserGoals {
    pub step_goal: f64,
    pub calorie_goal: f64,
    pub active_minute_goal: f64,
}

impl Default for UserGoals {
    fn default() -> Self {
        Self {
            step_goal: DEFAULT_STEP_GOAL,
            calorie_goal: DEFAULT_CALORIE_GOAL,
            active_minute_goal: DEFAULT_ACTIVE_MINUTE_GOAL,
        }
    }
}

/// Partial goal update; absent fields keep their current value.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GoalsUpdate {
    pub step_goal: Option<f64>,
    pub calorie_goal: Option<f64>,
    pub active_minute_goal: Option<f64>,
}

impl GoalsUpdate {
    /// Check provided values without applying them, so a bad update is
    /// rejected before any store access.
    pub fn validate(&self) -> Result<(), AppError> {
        if let Some(v) = self.step_goal {
            validate_goal("step_goal", v)?;
        }
        if let Some(v) = self.calorie_goal {
            validate_goal("calorie_goal", v)?;
        }
        if let Some(v) = self.active_minute_goal {
            validate_goal("active_minute_goal", v)?;
        }
        Ok(())
    }
}

impl UserGoals {
    /// Apply a partial update, rejecting non-positive or non-finite values.
    ///
    /// Invalid values are rejected, never clamped.
    pub fn apply(&mut self, update: &GoalsUpdate) -> Result<(), AppError> {
        if let Some(v) = update.step_goal {
            validate_goal("step_goal", v)?;
            self.step_goal = v;
        }
        if let Some(v) = update.calorie_goal {
            validate_goal("calorie_goal", v)?;
            self.calorie_goal = v;
        }
        if let Some(v) = update.active_minute_goal {
            validate_goal("active_minute_goal", v)?;
            self.active_minute_goal = v;
        }
        Ok(())
    }
}

fn validate_goal(name: &str, value: f64) -> Result<(), AppError> {
    if !value.is_finite() || value <= 0.0 {
        return Err(AppError::InvalidGoal(format!(
            "{} must be a positive number, got {}",
            name, value
        )));
    }
    Ok(())
}
