// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Guided-activity step runner.
//!
//! Drives one user through the ordered steps of one activity:
//!
//! ```text
//! NotStarted -> InProgress(0) -> ... -> InProgress(N-1) -> Completed
//! ```
//!
//! Transitions only move forward. Rejected calls (advancing past the last
//! step, completing early) leave the runner untouched. Countdowns are
//! cosmetic: `tick` never advances a step and never gates `complete`.

use crate::db::ProgressStore;
use crate::error::AppError;
use crate::models::{Activity, Completion, Step};
use crate::time_utils::now_rfc3339;
use serde::Serialize;
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Where a run currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    NotStarted,
    InProgress { step: usize },
    Completed,
}

impl RunState {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunState::NotStarted => "not_started",
            RunState::InProgress { .. } => "in_progress",
            RunState::Completed => "completed",
        }
    }
}

/// Countdown of the active step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Countdown {
    remaining: u32,
}

impl Countdown {
    fn for_step(step: &Step) -> Option<Self> {
        step.is_timed().then_some(Self {
            remaining: step.duration,
        })
    }

    fn is_running(&self) -> bool {
        self.remaining > 0
    }
}

/// Result of a `complete` call that was not rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum CompletionOutcome {
    /// First completion for this (user, activity); points were granted.
    Recorded { points_awarded: u32 },
    /// A completion already existed; nothing was granted.
    AlreadyCompleted,
}

#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    #[error("activity '{0}' has no steps")]
    EmptyActivity(String),

    #[error("no active run for activity '{0}'")]
    NoActiveRun(String),

    #[error("activity not finished: on step {current} of {total}")]
    NotAtLastStep { current: usize, total: usize },

    #[error("run has not been started")]
    NotStarted,

    /// Persistence failed; the runner is unchanged and the call can be retried.
    #[error(transparent)]
    Storage(#[from] AppError),
}

impl From<RunnerError> for AppError {
    fn from(err: RunnerError) -> Self {
        match err {
            RunnerError::EmptyActivity(_) => AppError::BadRequest(err.to_string()),
            RunnerError::NoActiveRun(_) => AppError::NotFound(err.to_string()),
            RunnerError::NotAtLastStep { .. } | RunnerError::NotStarted => {
                AppError::Conflict(err.to_string())
            }
            RunnerError::Storage(inner) => inner,
        }
    }
}

/// Serializable view of a run for the presentation layer.
#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct RunSnapshot {
    pub activity_id: String,
    /// "not_started", "in_progress" or "completed"
    pub state: String,
    /// Index of the displayed step; `None` before start
    pub step_index: Option<usize>,
    pub total_steps: usize,
    /// Displayed step
    pub step: Option<Step>,
    /// Seconds left on the countdown; `None` for untimed steps
    pub remaining_seconds: Option<u32>,
    pub timer_running: bool,
    /// The client should offer "complete" instead of "next"
    pub can_complete: bool,
}

/// Ephemeral per-user state for one guided activity.
#[derive(Debug, Clone)]
pub struct StepRunner {
    activity: Arc<Activity>,
    state: RunState,
    countdown: Option<Countdown>,
}

impl StepRunner {
    /// Create a runner in the `NotStarted` state.
    pub fn new(activity: Arc<Activity>) -> Self {
        Self {
            activity,
            state: RunState::NotStarted,
            countdown: None,
        }
    }

    /// Create a runner and start it.
    pub fn started(activity: Arc<Activity>) -> Result<Self, RunnerError> {
        let mut runner = Self::new(activity);
        if !runner.start() {
            return Err(RunnerError::EmptyActivity(runner.activity.id.clone()));
        }
        Ok(runner)
    }

    pub fn activity(&self) -> &Arc<Activity> {
        &self.activity
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    /// Index of the displayed step. A completed run still shows its last step.
    pub fn current_index(&self) -> Option<usize> {
        match self.state {
            RunState::NotStarted => None,
            RunState::InProgress { step } => Some(step),
            RunState::Completed => self.activity.last_step_index(),
        }
    }

    pub fn current_step(&self) -> Option<&Step> {
        self.current_index().and_then(|i| self.activity.steps.get(i))
    }

    /// Seconds left on the active countdown, if the step is timed.
    pub fn remaining_seconds(&self) -> Option<u32> {
        self.countdown.map(|c| c.remaining)
    }

    pub fn timer_running(&self) -> bool {
        self.countdown.is_some_and(|c| c.is_running())
    }

    /// True while the last step is displayed and not yet completed.
    pub fn is_on_last_step(&self) -> bool {
        match self.state {
            RunState::InProgress { step } => Some(step) == self.activity.last_step_index(),
            _ => false,
        }
    }

    /// Activate step 0. Returns `false` if already started or the activity has no steps.
    pub fn start(&mut self) -> bool {
        if self.state != RunState::NotStarted || self.activity.steps.is_empty() {
            return false;
        }
        self.activate(0);
        true
    }

    /// Move to the next step, replacing any countdown.
    ///
    /// Returns `false` (no state change) on the last step, before start, or
    /// after completion.
    pub fn advance(&mut self) -> bool {
        let RunState::InProgress { step } = self.state else {
            return false;
        };
        if step + 1 >= self.activity.steps.len() {
            return false;
        }
        self.activate(step + 1);
        true
    }

    /// Count the active countdown down by one second.
    ///
    /// Returns `false` when no countdown is running. Reaching zero stops the
    /// timer; the step stays displayed.
    pub fn tick(&mut self) -> bool {
        if !matches!(self.state, RunState::InProgress { .. }) {
            return false;
        }
        match self.countdown.as_mut() {
            Some(countdown) if countdown.is_running() => {
                countdown.remaining -= 1;
                true
            }
            _ => false,
        }
    }

    /// Record completion for `user_id` and grant the activity's points once.
    ///
    /// Completing an already completed activity (in this run or an earlier
    /// one) is not an error and grants nothing. On a storage error the
    /// runner stays on the last step so the call can be retried.
    pub async fn complete(
        &mut self,
        user_id: &str,
        store: &dyn ProgressStore,
    ) -> Result<CompletionOutcome, RunnerError> {
        match self.state {
            RunState::Completed => return Ok(CompletionOutcome::AlreadyCompleted),
            RunState::NotStarted => return Err(RunnerError::NotStarted),
            RunState::InProgress { step } if !self.is_on_last_step() => {
                return Err(RunnerError::NotAtLastStep {
                    current: step + 1,
                    total: self.activity.steps.len(),
                });
            }
            RunState::InProgress { .. } => {}
        }

        let activity_id = self.activity.id.as_str();

        if store.has_completed(user_id, activity_id).await? {
            tracing::debug!(user_id, activity_id, "Activity already completed, ignoring");
            self.finish();
            return Ok(CompletionOutcome::AlreadyCompleted);
        }

        let completion = Completion {
            user_id: user_id.to_string(),
            activity_id: activity_id.to_string(),
            points_awarded: self.activity.points,
            completed_at: now_rfc3339(),
        };

        let outcome = if store.record_completion(&completion).await? {
            tracing::info!(
                user_id,
                activity_id,
                points = completion.points_awarded,
                "Activity completed"
            );
            CompletionOutcome::Recorded {
                points_awarded: completion.points_awarded,
            }
        } else {
            CompletionOutcome::AlreadyCompleted
        };

        self.finish();
        Ok(outcome)
    }

    pub fn snapshot(&self) -> RunSnapshot {
        RunSnapshot {
            activity_id: self.activity.id.clone(),
            state: self.state.as_str().to_string(),
            step_index: self.current_index(),
            total_steps: self.activity.steps.len(),
            step: self.current_step().cloned(),
            remaining_seconds: self.remaining_seconds(),
            timer_running: self.timer_running(),
            can_complete: self.is_on_last_step(),
        }
    }

    fn activate(&mut self, index: usize) {
        self.state = RunState::InProgress { step: index };
        self.countdown = self.activity.steps.get(index).and_then(Countdown::for_step);
    }

    fn finish(&mut self) {
        self.state = RunState::Completed;
        self.countdown = None;
    }
}
