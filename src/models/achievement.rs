// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Achievement definitions (static catalog data).

use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// An achievement a user can unlock.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Achievement {
    pub id: String,
    pub name: String,
    pub icon: String,
    #[serde(default)]
    pub description: String,
    /// Condition that unlocks the achievement
    pub rule: AchievementRule,
}

/// Unlock condition, evaluated after every recorded completion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AchievementRule {
    /// At least `count` distinct activities completed
    CompletedCount { count: u32 },
    /// Every activity of a category completed
    CategoryComplete { category: String },
    /// One specific activity completed
    ActivityCompleted { activity_id: String },
    /// Point total reached
    PointsAtLeast { points: u32 },
}
