// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-process progress store for local development and tests.

use crate::db::ProgressStore;
use crate::error::AppError;
use crate::models::{Completion, User};
use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

/// Progress store backed by concurrent maps.
///
/// The completion map entry is held while the user's points are updated,
/// so two concurrent completions of the same pair cannot both grant points.
#[derive(Debug, Default)]
pub struct MemoryStore {
    users: DashMap<String, User>,
    /// Keyed by `Completion::document_id`
    completions: DashMap<String, Completion>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProgressStore for MemoryStore {
    async fn get_user(&self, user_id: &str) -> Result<Option<User>, AppError> {
        Ok(self.users.get(user_id).map(|u| u.clone()))
    }

    async fn create_user(&self, user: &User) -> Result<bool, AppError> {
        match self.users.entry(user.user_id.clone()) {
            Entry::Occupied(_) => Ok(false),
            Entry::Vacant(slot) => {
                slot.insert(user.clone());
                Ok(true)
            }
        }
    }

    async fn touch_user(
        &self,
        user_id: &str,
        last_active: &str,
    ) -> Result<Option<User>, AppError> {
        Ok(self.users.get_mut(user_id).map(|mut user| {
            user.last_active = last_active.to_string();
            user.clone()
        }))
    }

    async fn has_completed(&self, user_id: &str, activity_id: &str) -> Result<bool, AppError> {
        Ok(self
            .completions
            .contains_key(&Completion::document_id(user_id, activity_id)))
    }

    async fn record_completion(&self, completion: &Completion) -> Result<bool, AppError> {
        let key = Completion::document_id(&completion.user_id, &completion.activity_id);

        match self.completions.entry(key) {
            Entry::Occupied(_) => Ok(false),
            Entry::Vacant(slot) => {
                let Some(mut user) = self.users.get_mut(&completion.user_id) else {
                    return Err(AppError::NotFound(format!(
                        "User {} not found",
                        completion.user_id
                    )));
                };
                user.add_points(completion.points_awarded);
                slot.insert(completion.clone());
                Ok(true)
            }
        }
    }

    async fn list_completions(&self, user_id: &str) -> Result<Vec<Completion>, AppError> {
        let mut completions: Vec<Completion> = self
            .completions
            .iter()
            .filter(|entry| entry.user_id == user_id)
            .map(|entry| entry.value().clone())
            .collect();
        completions.sort_by(|a, b| a.completed_at.cmp(&b.completed_at));
        Ok(completions)
    }

    async fn unlock_achievements(&self, user_id: &str, ids: &[String]) -> Result<(), AppError> {
        let mut user = self
            .users
            .get_mut(user_id)
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", user_id)))?;
        user.unlock(ids);
        Ok(())
    }
}
