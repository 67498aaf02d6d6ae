// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Static activity catalog: activities, categories and achievements.
//!
//! The catalog is loaded once at startup and never mutated afterwards.

use crate::models::{Achievement, AchievementRule, Activity, Category};
use serde::Deserialize;
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use std::sync::{Arc, OnceLock};

/// Catalog shipped with the binary.
const BUILTIN_CATALOG_JSON: &str = include_str!("../../data/catalog.json");

static BUILTIN: OnceLock<ActivityCatalog> = OnceLock::new();

/// On-disk catalog layout.
#[derive(Deserialize)]
struct CatalogDocument {
    categories: Vec<Category>,
    activities: Vec<Activity>,
    #[serde(default)]
    achievements: Vec<Achievement>,
}

/// Read-only lookup tables for activities, categories and achievements.
#[derive(Debug, Default, Clone)]
pub struct ActivityCatalog {
    categories: Vec<Category>,
    activities: Vec<Arc<Activity>>,
    achievements: Vec<Achievement>,
}

impl ActivityCatalog {
    /// The catalog embedded in the binary, parsed on first use.
    pub fn builtin() -> Result<&'static ActivityCatalog, CatalogError> {
        if let Some(catalog) = BUILTIN.get() {
            return Ok(catalog);
        }
        let catalog = Self::load_from_json(BUILTIN_CATALOG_JSON)?;
        Ok(BUILTIN.get_or_init(|| catalog))
    }

    /// Load a catalog from a JSON file.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, CatalogError> {
        let json_data =
            fs::read_to_string(path.as_ref()).map_err(|e| CatalogError::IoError(e.to_string()))?;
        Self::load_from_json(&json_data)
    }

    /// Load and validate a catalog from a JSON string.
    pub fn load_from_json(json_data: &str) -> Result<Self, CatalogError> {
        let document: CatalogDocument = serde_json::from_str(json_data)
            .map_err(|e| CatalogError::ParseError(e.to_string()))?;

        let catalog = Self {
            categories: document.categories,
            activities: document.activities.into_iter().map(Arc::new).collect(),
            achievements: document.achievements,
        };
        catalog.validate()?;

        tracing::info!(
            activities = catalog.activities.len(),
            categories = catalog.categories.len(),
            achievements = catalog.achievements.len(),
            "Loaded activity catalog"
        );
        Ok(catalog)
    }

    fn validate(&self) -> Result<(), CatalogError> {
        let category_ids: HashSet<&str> = self.categories.iter().map(|c| c.id.as_str()).collect();

        let mut activity_ids = HashSet::new();
        for activity in &self.activities {
            if !activity_ids.insert(activity.id.as_str()) {
                return Err(CatalogError::Invalid(format!(
                    "duplicate activity id '{}'",
                    activity.id
                )));
            }
            if activity.steps.is_empty() {
                return Err(CatalogError::Invalid(format!(
                    "activity '{}' has no steps",
                    activity.id
                )));
            }
            if !category_ids.contains(activity.category.as_str()) {
                return Err(CatalogError::Invalid(format!(
                    "activity '{}' references unknown category '{}'",
                    activity.id, activity.category
                )));
            }
        }

        let mut achievement_ids = HashSet::new();
        for achievement in &self.achievements {
            if !achievement_ids.insert(achievement.id.as_str()) {
                return Err(CatalogError::Invalid(format!(
                    "duplicate achievement id '{}'",
                    achievement.id
                )));
            }
            match &achievement.rule {
                AchievementRule::CategoryComplete { category }
                    if !category_ids.contains(category.as_str()) =>
                {
                    return Err(CatalogError::Invalid(format!(
                        "achievement '{}' references unknown category '{}'",
                        achievement.id, category
                    )));
                }
                AchievementRule::ActivityCompleted { activity_id }
                    if !activity_ids.contains(activity_id.as_str()) =>
                {
                    return Err(CatalogError::Invalid(format!(
                        "achievement '{}' references unknown activity '{}'",
                        achievement.id, activity_id
                    )));
                }
                _ => {}
            }
        }

        Ok(())
    }

    /// Activities in catalog order.
    pub fn activities(&self) -> &[Arc<Activity>] {
        &self.activities
    }

    pub fn activity(&self, id: &str) -> Option<&Arc<Activity>> {
        self.activities.iter().find(|a| a.id == id)
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    pub fn category(&self, id: &str) -> Option<&Category> {
        self.categories.iter().find(|c| c.id == id)
    }

    /// Activities belonging to a category.
    pub fn activities_in_category<'a>(
        &'a self,
        category: &'a str,
    ) -> impl Iterator<Item = &'a Arc<Activity>> + 'a {
        self.activities.iter().filter(move |a| a.category == category)
    }

    pub fn achievements(&self) -> &[Achievement] {
        &self.achievements
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("IO error: {0}")]
    IoError(String),
    #[error("Parse error: {0}")]
    ParseError(String),
    #[error("Invalid catalog: {0}")]
    Invalid(String),
}
