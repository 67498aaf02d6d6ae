// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Guided-activity run routes.
//!
//! The client starts a run, calls `tick` once per second while a step is
//! timed, `advance` on "next", and `complete` on the last step.

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::routes::api::AchievementSummary;
use crate::services::rewards::grant_achievements;
use crate::services::{CompletionOutcome, RunSnapshot};
use crate::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::post,
    Extension, Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/api/runs/{activity_id}",
            post(start_run).get(get_run).delete(abandon_run),
        )
        .route("/api/runs/{activity_id}/advance", post(advance_run))
        .route("/api/runs/{activity_id}/tick", post(tick_run))
        .route("/api/runs/{activity_id}/complete", post(complete_run))
}

/// Response for operations that may be a no-op.
#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct RunUpdateResponse {
    /// `false` when the call was rejected without changing the run
    pub changed: bool,
    pub run: RunSnapshot,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct CompleteRunResponse {
    #[serde(flatten)]
    #[cfg_attr(feature = "binding-generation", ts(flatten))]
    pub outcome: CompletionOutcome,
    pub run: RunSnapshot,
    /// User totals after the completion (absent if they could not be read)
    pub total_points: Option<u32>,
    pub level: Option<u32>,
    pub new_achievements: Vec<AchievementSummary>,
}

/// Start a fresh run of an activity.
async fn start_run(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(activity_id): Path<String>,
) -> Result<(StatusCode, Json<RunSnapshot>)> {
    let activity = state
        .catalog
        .activity(&activity_id)
        .ok_or_else(|| AppError::NotFound(format!("Activity {} not found", activity_id)))?
        .clone();

    let snapshot = state.runs.start(&user.user_id, activity)?;
    Ok((StatusCode::CREATED, Json(snapshot)))
}

async fn get_run(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(activity_id): Path<String>,
) -> Result<Json<RunSnapshot>> {
    Ok(Json(state.runs.snapshot(&user.user_id, &activity_id)?))
}

async fn advance_run(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(activity_id): Path<String>,
) -> Result<Json<RunUpdateResponse>> {
    let (changed, run) = state.runs.advance(&user.user_id, &activity_id)?;
    if !changed {
        tracing::debug!(user_id = %user.user_id, %activity_id, "Advance ignored");
    }
    Ok(Json(RunUpdateResponse { changed, run }))
}

async fn tick_run(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(activity_id): Path<String>,
) -> Result<Json<RunUpdateResponse>> {
    let (changed, run) = state.runs.tick(&user.user_id, &activity_id)?;
    Ok(Json(RunUpdateResponse { changed, run }))
}

/// Complete the run on its last step.
///
/// Completing an activity the user already finished before succeeds with
/// `already_completed` and grants nothing.
async fn complete_run(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(activity_id): Path<String>,
) -> Result<Json<CompleteRunResponse>> {
    let (outcome, run) = state
        .runs
        .complete(&user.user_id, &activity_id, state.store.as_ref())
        .await?;

    let mut new_achievements = Vec::new();
    if matches!(outcome, CompletionOutcome::Recorded { .. }) {
        match grant_achievements(state.store.as_ref(), &state.catalog, &user.user_id).await {
            Ok(unlocked) => {
                new_achievements = unlocked
                    .into_iter()
                    .map(|a| AchievementSummary::new(a, true))
                    .collect();
            }
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    user_id = %user.user_id,
                    "Failed to evaluate achievements"
                );
            }
        }
    }

    let profile = match state.store.get_user(&user.user_id).await {
        Ok(profile) => profile,
        Err(e) => {
            tracing::warn!(error = %e, user_id = %user.user_id, "Failed to read user totals");
            None
        }
    };

    Ok(Json(CompleteRunResponse {
        outcome,
        run,
        total_points: profile.as_ref().map(|p| p.points),
        level: profile.as_ref().map(|p| p.level),
        new_achievements,
    }))
}

/// Discard a run without recording anything.
async fn abandon_run(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(activity_id): Path<String>,
) -> Result<StatusCode> {
    if state.runs.abandon(&user.user_id, &activity_id) {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound(format!(
            "No active run for activity {}",
            activity_id
        )))
    }
}
