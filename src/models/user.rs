//! User model for storage and API.

use serde::{Deserialize, Serialize};

/// Points needed per level.
pub const POINTS_PER_LEVEL: u32 = 50;

/// User profile stored in Firestore.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Normalized username (also used as document ID)
    pub user_id: String,
    /// Username as typed at first login
    pub username: String,
    /// Running point total
    #[serde(default)]
    pub points: u32,
    /// Current level, derived from points and never lowered
    #[serde(default = "default_level")]
    pub level: u32,
    /// Unlocked achievement ids
    #[serde(default)]
    pub achievements: Vec<String>,
    /// When user first logged in
    pub created_at: String,
    /// Last login timestamp
    pub last_active: String,
}

fn default_level() -> u32 {
    1
}

impl User {
    /// Create a fresh profile for a first login.
    pub fn new(username: &str, now: &str) -> Self {
        Self {
            user_id: normalize_username(username),
            username: username.trim().to_string(),
            points: 0,
            level: 1,
            achievements: Vec::new(),
            created_at: now.to_string(),
            last_active: now.to_string(),
        }
    }

    /// Add points and raise the level if the new total warrants it.
    ///
    /// Returns `true` if the level went up.
    pub fn add_points(&mut self, points: u32) -> bool {
        self.points = self.points.saturating_add(points);
        let new_level = level_for_points(self.points);
        if new_level > self.level {
            self.level = new_level;
            true
        } else {
            false
        }
    }

    /// Add achievement ids not already unlocked. Returns how many were new.
    pub fn unlock(&mut self, ids: &[String]) -> usize {
        let mut added = 0;
        for id in ids {
            if !self.achievements.contains(id) {
                self.achievements.push(id.clone());
                added += 1;
            }
        }
        added
    }
}

/// Level for a point total: one level per 50 points, starting at 1.
pub fn level_for_points(points: u32) -> u32 {
    points / POINTS_PER_LEVEL + 1
}

/// Usernames are case-insensitive; the normalized form is the user ID.
pub fn normalize_username(username: &str) -> String {
    username.trim().to_lowercase()
}
