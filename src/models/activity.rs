// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Guided activity model: ordered instructional steps plus reward metadata.

use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// One instructional step of a guided activity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Step {
    /// Text shown to the user while the step is active
    pub instruction: String,
    /// Seconds the step should stay active; 0 means manual advance, no timer
    #[serde(default)]
    pub duration: u32,
    /// Display label (e.g. "preparation", "breathing_in")
    pub kind: String,
}

impl Step {
    /// Whether activating this step starts a countdown.
    pub fn is_timed(&self) -> bool {
        self.duration > 0
    }
}

/// A guided activity from the static catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Activity {
    /// Stable identifier (e.g. "ansiedade_5sentidos")
    pub id: String,
    /// Display name
    pub name: String,
    /// Emoji icon
    pub icon: String,
    /// Short description for listings
    #[serde(default)]
    pub description: String,
    /// Category id (see [`Category`])
    pub category: String,
    /// Points granted on first completion
    pub points: u32,
    /// Expected total duration, display only
    pub duration_minutes: u32,
    /// Ordered steps; never empty once loaded into a catalog
    pub steps: Vec<Step>,
}

impl Activity {
    pub fn step_count(&self) -> usize {
        self.steps.len()
    }

    /// Index of the terminal step, or `None` for an activity without steps.
    pub fn last_step_index(&self) -> Option<usize> {
        self.steps.len().checked_sub(1)
    }
}

/// Activity category metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Category {
    pub id: String,
    pub name: String,
    pub icon: String,
}
