//! Database layer: the progress store and its backends (Firestore, in-memory).

pub mod firestore;
pub mod memory;

pub use firestore::FirestoreDb;
pub use memory::MemoryStore;

use crate::error::AppError;
use crate::models::{Completion, User};
use async_trait::async_trait;

/// Collection names as constants.
pub mod collections {
    pub const USERS: &str = "users";
    /// Completion records (keyed by `Completion::document_id`)
    pub const COMPLETIONS: &str = "completions";
}

/// Persistence consumed by the step runner and the API.
///
/// No operation writes a whole user document over an existing one. Points
/// and level change only in `record_completion`, together with the
/// completion record; the other writes touch their own fields.
#[async_trait]
pub trait ProgressStore: Send + Sync {
    /// Get a user by their normalized ID.
    async fn get_user(&self, user_id: &str) -> Result<Option<User>, AppError>;

    /// Create a user profile. Returns `false` without writing if the user exists.
    async fn create_user(&self, user: &User) -> Result<bool, AppError>;

    /// Set `last_active` on an existing user and return the profile.
    ///
    /// Returns `None` if the user does not exist.
    async fn touch_user(
        &self,
        user_id: &str,
        last_active: &str,
    ) -> Result<Option<User>, AppError>;

    /// Has this user already completed this activity?
    async fn has_completed(&self, user_id: &str, activity_id: &str) -> Result<bool, AppError>;

    /// Store the completion and add `completion.points_awarded` to the user.
    ///
    /// Returns `false` without writing anything if a completion for the same
    /// (user, activity) pair already exists.
    async fn record_completion(&self, completion: &Completion) -> Result<bool, AppError>;

    /// All completions of a user.
    async fn list_completions(&self, user_id: &str) -> Result<Vec<Completion>, AppError>;

    /// Add achievement ids to the user's unlocked set (already unlocked ids are skipped).
    async fn unlock_achievements(&self, user_id: &str, ids: &[String]) -> Result<(), AppError>;
}
