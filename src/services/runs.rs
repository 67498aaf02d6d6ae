// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-memory registry of active runs, one per (user, activity).
//!
//! Runs are never persisted. A run is discarded when it completes, when the
//! user abandons it, or when the sweeper finds it older than the TTL.

use crate::db::ProgressStore;
use crate::models::Activity;
use crate::services::runner::{CompletionOutcome, RunSnapshot, RunnerError, StepRunner};
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct RunKey {
    user_id: String,
    activity_id: String,
}

impl RunKey {
    fn new(user_id: &str, activity_id: &str) -> Self {
        Self {
            user_id: user_id.to_string(),
            activity_id: activity_id.to_string(),
        }
    }
}

#[derive(Debug)]
struct ActiveRun {
    /// Distinguishes a run from a later restart of the same activity
    id: u64,
    runner: StepRunner,
    started_at: DateTime<Utc>,
}

/// Active runs shared by all request handlers.
#[derive(Debug, Default)]
pub struct RunRegistry {
    runs: DashMap<RunKey, ActiveRun>,
    next_id: AtomicU64,
}

impl RunRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a fresh run, replacing any unfinished run of the same activity.
    pub fn start(
        &self,
        user_id: &str,
        activity: Arc<Activity>,
    ) -> Result<RunSnapshot, RunnerError> {
        let key = RunKey::new(user_id, &activity.id);
        let runner = StepRunner::started(activity)?;
        let snapshot = runner.snapshot();

        let replaced = self
            .runs
            .insert(
                key,
                ActiveRun {
                    id: self.next_id.fetch_add(1, Ordering::Relaxed),
                    runner,
                    started_at: Utc::now(),
                },
            )
            .is_some();

        tracing::debug!(
            user_id,
            activity_id = %snapshot.activity_id,
            replaced,
            "Run started"
        );
        Ok(snapshot)
    }

    pub fn snapshot(&self, user_id: &str, activity_id: &str) -> Result<RunSnapshot, RunnerError> {
        self.runs
            .get(&RunKey::new(user_id, activity_id))
            .map(|run| run.runner.snapshot())
            .ok_or_else(|| RunnerError::NoActiveRun(activity_id.to_string()))
    }

    /// Advance the run. The flag is `false` when the call was a no-op.
    pub fn advance(
        &self,
        user_id: &str,
        activity_id: &str,
    ) -> Result<(bool, RunSnapshot), RunnerError> {
        self.with_run(user_id, activity_id, StepRunner::advance)
    }

    /// Tick the run's countdown. The flag is `false` when no countdown was running.
    pub fn tick(
        &self,
        user_id: &str,
        activity_id: &str,
    ) -> Result<(bool, RunSnapshot), RunnerError> {
        self.with_run(user_id, activity_id, StepRunner::tick)
    }

    /// Complete the run and discard it.
    ///
    /// Works on a copy so no map lock is held across the store call. If the
    /// store fails the registered run is left as it was. A run started again
    /// while the store call was pending is kept.
    pub async fn complete(
        &self,
        user_id: &str,
        activity_id: &str,
        store: &dyn ProgressStore,
    ) -> Result<(CompletionOutcome, RunSnapshot), RunnerError> {
        let key = RunKey::new(user_id, activity_id);
        let (run_id, mut runner) = self
            .runs
            .get(&key)
            .map(|run| (run.id, run.runner.clone()))
            .ok_or_else(|| RunnerError::NoActiveRun(activity_id.to_string()))?;

        let outcome = runner.complete(user_id, store).await?;
        self.runs.remove_if(&key, |_, run| run.id == run_id);

        Ok((outcome, runner.snapshot()))
    }

    /// Drop a run without recording anything. Returns `false` if none existed.
    pub fn abandon(&self, user_id: &str, activity_id: &str) -> bool {
        let removed = self
            .runs
            .remove(&RunKey::new(user_id, activity_id))
            .is_some();
        if removed {
            tracing::debug!(user_id, activity_id, "Run abandoned");
        }
        removed
    }

    /// Remove runs started more than `max_age` ago. Returns how many were dropped.
    pub fn prune_older_than(&self, max_age: Duration) -> usize {
        let cutoff = Utc::now() - max_age;
        let before = self.runs.len();
        self.runs.retain(|_, run| run.started_at > cutoff);
        before.saturating_sub(self.runs.len())
    }

    pub fn len(&self) -> usize {
        self.runs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }

    fn with_run(
        &self,
        user_id: &str,
        activity_id: &str,
        op: fn(&mut StepRunner) -> bool,
    ) -> Result<(bool, RunSnapshot), RunnerError> {
        let mut run = self
            .runs
            .get_mut(&RunKey::new(user_id, activity_id))
            .ok_or_else(|| RunnerError::NoActiveRun(activity_id.to_string()))?;
        let changed = op(&mut run.runner);
        Ok((changed, run.runner.snapshot()))
    }
}
