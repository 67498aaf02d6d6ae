// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Persisted record of a finished activity.

use serde::{Deserialize, Serialize};

/// One completion per (user, activity); the store rejects duplicates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Completion {
    pub user_id: String,
    pub activity_id: String,
    /// Points granted by this completion
    pub points_awarded: u32,
    /// When the completion was recorded (RFC3339)
    pub completed_at: String,
}

impl Completion {
    /// Deterministic document ID enforcing one completion per pair.
    pub fn document_id(user_id: &str, activity_id: &str) -> String {
        format!(
            "{}:{}",
            urlencoding::encode(user_id),
            urlencoding::encode(activity_id)
        )
    }
}
