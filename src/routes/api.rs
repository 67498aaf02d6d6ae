// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! API routes for authenticated users: profile, catalog and achievements.

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::user::{level_for_points, POINTS_PER_LEVEL};
use crate::models::{Achievement, Activity, Step};
use crate::AppState;
use axum::{
    extract::{Path, State},
    routing::get,
    Extension, Json, Router,
};
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// API routes (require authentication via JWT).
/// The auth middleware is applied in routes/mod.rs for these routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/me", get(get_me))
        .route("/api/activities", get(list_activities))
        .route("/api/activities/{activity_id}", get(get_activity))
        .route("/api/achievements", get(list_achievements))
}

// ─── User Profile ────────────────────────────────────────────

/// Current user response.
#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct UserResponse {
    pub user_id: String,
    pub username: String,
    pub points: u32,
    pub level: u32,
    /// Points still missing for the next level
    pub points_to_next_level: u32,
    pub achievements: Vec<String>,
    pub completed_activities: u32,
    pub created_at: String,
}

/// Get current user profile.
async fn get_me(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<UserResponse>> {
    let profile = state
        .store
        .get_user(&user.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {} not found", user.user_id)))?;
    let completions = state.store.list_completions(&user.user_id).await?;

    let next_threshold = level_for_points(profile.points) * POINTS_PER_LEVEL;

    Ok(Json(UserResponse {
        points_to_next_level: next_threshold.saturating_sub(profile.points),
        user_id: profile.user_id,
        username: profile.username,
        points: profile.points,
        level: profile.level,
        achievements: profile.achievements,
        completed_activities: completions.len() as u32,
        created_at: profile.created_at,
    }))
}

// ─── Activity Catalog ────────────────────────────────────────

#[derive(Serialize, Clone, Debug)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ActivitySummary {
    pub id: String,
    pub name: String,
    pub icon: String,
    pub description: String,
    pub category: String,
    pub category_name: String,
    pub category_icon: String,
    pub points: u32,
    pub duration_minutes: u32,
    pub step_count: usize,
    /// Whether the current user has already earned this activity's points
    pub completed: bool,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ActivitiesResponse {
    pub activities: Vec<ActivitySummary>,
    pub total: u32,
    pub completed: u32,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ActivityDetailResponse {
    #[serde(flatten)]
    #[cfg_attr(feature = "binding-generation", ts(flatten))]
    pub summary: ActivitySummary,
    pub steps: Vec<Step>,
}

fn summarize(state: &AppState, activity: &Activity, completed: bool) -> ActivitySummary {
    let (category_name, category_icon) = state
        .catalog
        .category(&activity.category)
        .map(|c| (c.name.clone(), c.icon.clone()))
        .unwrap_or_default();

    ActivitySummary {
        id: activity.id.clone(),
        name: activity.name.clone(),
        icon: activity.icon.clone(),
        description: activity.description.clone(),
        category: activity.category.clone(),
        category_name,
        category_icon,
        points: activity.points,
        duration_minutes: activity.duration_minutes,
        step_count: activity.step_count(),
        completed,
    }
}

/// List the catalog, flagging activities the user already completed.
async fn list_activities(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<ActivitiesResponse>> {
    let completions = state.store.list_completions(&user.user_id).await?;
    let completed: HashSet<&str> = completions
        .iter()
        .map(|c| c.activity_id.as_str())
        .collect();

    let activities: Vec<ActivitySummary> = state
        .catalog
        .activities()
        .iter()
        .map(|a| summarize(&state, a, completed.contains(a.id.as_str())))
        .collect();
    let completed_count = activities.iter().filter(|a| a.completed).count() as u32;

    Ok(Json(ActivitiesResponse {
        total: activities.len() as u32,
        completed: completed_count,
        activities,
    }))
}

/// One activity with its steps.
async fn get_activity(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(activity_id): Path<String>,
) -> Result<Json<ActivityDetailResponse>> {
    let activity = state
        .catalog
        .activity(&activity_id)
        .ok_or_else(|| AppError::NotFound(format!("Activity {} not found", activity_id)))?;
    let completed = state
        .store
        .has_completed(&user.user_id, &activity.id)
        .await?;

    Ok(Json(ActivityDetailResponse {
        summary: summarize(&state, activity, completed),
        steps: activity.steps.clone(),
    }))
}

// ─── Achievements ────────────────────────────────────────────

#[derive(Serialize, Clone, Debug)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct AchievementSummary {
    pub id: String,
    pub name: String,
    pub icon: String,
    pub description: String,
    pub unlocked: bool,
}

impl AchievementSummary {
    pub fn new(achievement: &Achievement, unlocked: bool) -> Self {
        Self {
            id: achievement.id.clone(),
            name: achievement.name.clone(),
            icon: achievement.icon.clone(),
            description: achievement.description.clone(),
            unlocked,
        }
    }
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct AchievementsResponse {
    pub achievements: Vec<AchievementSummary>,
    pub unlocked: u32,
}

/// All achievement definitions with the user's unlock status.
async fn list_achievements(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<AchievementsResponse>> {
    let profile = state
        .store
        .get_user(&user.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {} not found", user.user_id)))?;

    let achievements: Vec<AchievementSummary> = state
        .catalog
        .achievements()
        .iter()
        .map(|a| AchievementSummary::new(a, profile.achievements.contains(&a.id)))
        .collect();
    let unlocked = achievements.iter().filter(|a| a.unlocked).count() as u32;

    Ok(Json(AchievementsResponse {
        achievements,
        unlocked,
    }))
}
