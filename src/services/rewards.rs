// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Achievement evaluation after a recorded completion.

use crate::db::ProgressStore;
use crate::error::AppError;
use crate::models::{Achievement, AchievementRule, Completion, User};
use crate::services::ActivityCatalog;
use std::collections::HashSet;

/// Does the user (with these completions) satisfy the rule?
pub fn rule_satisfied(
    rule: &AchievementRule,
    catalog: &ActivityCatalog,
    user: &User,
    completed: &HashSet<&str>,
) -> bool {
    match rule {
        AchievementRule::CompletedCount { count } => completed.len() >= *count as usize,
        AchievementRule::CategoryComplete { category } => {
            let mut activities = catalog.activities_in_category(category).peekable();
            activities.peek().is_some()
                && activities.all(|a| completed.contains(a.id.as_str()))
        }
        AchievementRule::ActivityCompleted { activity_id } => {
            completed.contains(activity_id.as_str())
        }
        AchievementRule::PointsAtLeast { points } => user.points >= *points,
    }
}

/// Achievements the user qualifies for but has not unlocked yet.
pub fn newly_unlocked<'a>(
    catalog: &'a ActivityCatalog,
    user: &User,
    completions: &[Completion],
) -> Vec<&'a Achievement> {
    let completed: HashSet<&str> = completions
        .iter()
        .map(|c| c.activity_id.as_str())
        .collect();

    catalog
        .achievements()
        .iter()
        .filter(|a| !user.achievements.contains(&a.id))
        .filter(|a| rule_satisfied(&a.rule, catalog, user, &completed))
        .collect()
}

/// Evaluate and persist achievements for a user. Returns the new ones.
pub async fn grant_achievements<'a>(
    store: &dyn ProgressStore,
    catalog: &'a ActivityCatalog,
    user_id: &str,
) -> Result<Vec<&'a Achievement>, AppError> {
    let user = store
        .get_user(user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {} not found", user_id)))?;
    let completions = store.list_completions(user_id).await?;

    let unlocked = newly_unlocked(catalog, &user, &completions);
    if unlocked.is_empty() {
        return Ok(unlocked);
    }

    let ids: Vec<String> = unlocked.iter().map(|a| a.id.clone()).collect();
    store.unlock_achievements(user_id, &ids).await?;

    tracing::info!(user_id, achievements = ?ids, "Achievements unlocked");
    Ok(unlocked)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;

    fn completion(activity_id: &str) -> Completion {
        Completion {
            user_id: "ana".to_string(),
            activity_id: activity_id.to_string(),
            points_awarded: 0,
            completed_at: "2026-01-01T10:00:00Z".to_string(),
        }
    }

    fn ids(achievements: &[&Achievement]) -> Vec<String> {
        achievements.iter().map(|a| a.id.clone()).collect()
    }

    #[test]
    fn test_first_completion_unlocks_first_step() {
        let catalog = ActivityCatalog::builtin().unwrap();
        let user = User::new("ana", "now");

        let unlocked = newly_unlocked(catalog, &user, &[completion("respiracao_478")]);
        assert_eq!(ids(&unlocked), vec!["primeiro_passo"]);
    }

    #[test]
    fn test_category_requires_every_activity() {
        let catalog = ActivityCatalog::builtin().unwrap();
        let mut user = User::new("ana", "now");
        user.achievements.push("primeiro_passo".to_string());

        let partial = newly_unlocked(catalog, &user, &[completion("respiracao_478")]);
        assert!(partial.is_empty());

        let full = newly_unlocked(
            catalog,
            &user,
            &[
                completion("respiracao_478"),
                completion("meditacao_guiada"),
            ],
        );
        assert_eq!(ids(&full), vec!["meditacao_mestre"]);
    }

    #[test]
    fn test_specific_activity_and_points() {
        let catalog = ActivityCatalog::builtin().unwrap();
        let mut user = User::new("ana", "now");
        user.points = 120;

        let unlocked = newly_unlocked(catalog, &user, &[completion("ansiedade_5sentidos")]);
        assert_eq!(
            ids(&unlocked),
            vec!["primeiro_passo", "calma_interior", "centenario"]
        );
    }

    #[test]
    fn test_already_unlocked_are_skipped() {
        let catalog = ActivityCatalog::builtin().unwrap();
        let mut user = User::new("ana", "now");
        user.achievements = vec!["primeiro_passo".to_string(), "calma_interior".to_string()];

        let unlocked = newly_unlocked(catalog, &user, &[completion("ansiedade_5sentidos")]);
        assert!(unlocked.is_empty());
    }

    #[tokio::test]
    async fn test_grant_achievements_persists() {
        let catalog = ActivityCatalog::builtin().unwrap();
        let store = MemoryStore::new();
        store.create_user(&User::new("ana", "now")).await.unwrap();
        store
            .record_completion(&Completion {
                points_awarded: 22,
                ..completion("ansiedade_5sentidos")
            })
            .await
            .unwrap();

        let granted = grant_achievements(&store, catalog, "ana").await.unwrap();
        assert_eq!(ids(&granted), vec!["primeiro_passo", "calma_interior"]);

        // Second evaluation finds nothing new
        let again = grant_achievements(&store, catalog, "ana").await.unwrap();
        assert!(again.is_empty());

        let user = store.get_user("ana").await.unwrap().unwrap();
        assert_eq!(user.achievements, vec!["primeiro_passo", "calma_interior"]);
    }
}
