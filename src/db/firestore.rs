// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore-backed progress store.
//!
//! Collections:
//! - `users/{user_id}`: profile, points, level, achievements
//! - `completions/{user_id}:{activity_id}`: one document per finished activity

use crate::db::{collections, ProgressStore};
use crate::error::AppError;
use crate::models::{Completion, User};
use async_trait::async_trait;
use firestore::{path, paths, FirestoreConsistencySelector, FirestoreWritePrecondition};
use futures_util::TryStreamExt;

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreDb {
    client: Option<firestore::FirestoreDb>,
}

/// Document ID for a user; usernames may contain characters Firestore rejects.
fn user_doc_id(user_id: &str) -> String {
    urlencoding::encode(user_id).into_owned()
}

impl FirestoreDb {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, AppError> {
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self, AppError> {
        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            AppError::Database(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(project = project_id, "Connected to Firestore Emulator");

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create an offline client for testing.
    ///
    /// All database operations will return an error if called.
    pub fn new_mock() -> Self {
        Self { client: None }
    }

    fn get_client(&self) -> Result<&firestore::FirestoreDb, AppError> {
        self.client
            .as_ref()
            .ok_or_else(|| AppError::Database("Database not connected (offline mode)".to_string()))
    }

    async fn get_completion(
        &self,
        user_id: &str,
        activity_id: &str,
    ) -> Result<Option<Completion>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::COMPLETIONS)
            .obj()
            .one(&Completion::document_id(user_id, activity_id))
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}

#[async_trait]
impl ProgressStore for FirestoreDb {
    async fn get_user(&self, user_id: &str) -> Result<Option<User>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::USERS)
            .obj()
            .one(&user_doc_id(user_id))
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn create_user(&self, user: &User) -> Result<bool, AppError> {
        let result: Result<(), _> = self
            .get_client()?
            .fluent()
            .insert()
            .into(collections::USERS)
            .document_id(user_doc_id(&user.user_id))
            .object(user)
            .execute()
            .await;

        match result {
            Ok(()) => Ok(true),
            Err(firestore::errors::FirestoreError::DataConflictError(_)) => Ok(false),
            Err(e) => Err(AppError::Database(e.to_string())),
        }
    }

    async fn touch_user(
        &self,
        user_id: &str,
        last_active: &str,
    ) -> Result<Option<User>, AppError> {
        let Some(mut user) = self.get_user(user_id).await? else {
            return Ok(None);
        };
        user.last_active = last_active.to_string();

        // Field mask: points written concurrently by a completion survive
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .fields(paths!(User::{last_active}))
            .in_col(collections::USERS)
            .precondition(FirestoreWritePrecondition::Exists(true))
            .document_id(user_doc_id(user_id))
            .object(&user)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(Some(user))
    }

    async fn has_completed(&self, user_id: &str, activity_id: &str) -> Result<bool, AppError> {
        Ok(self.get_completion(user_id, activity_id).await?.is_some())
    }

    /// Writes the completion and the new point total in one transaction.
    ///
    /// The existing completion and the user are read inside the transaction,
    /// so a concurrent write to either document aborts the commit instead of
    /// being overwritten. The completion write also carries an
    /// `exists = false` precondition. A retry after an aborted commit sees
    /// the committed state and returns `false` for a duplicate.
    async fn record_completion(&self, completion: &Completion) -> Result<bool, AppError> {
        let client = self.get_client()?;
        let user_id = completion.user_id.as_str();
        let activity_id = completion.activity_id.as_str();
        let completion_id = Completion::document_id(user_id, activity_id);

        let mut transaction = client
            .begin_transaction()
            .await
            .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;

        // Reads through this client join the transaction for conflict detection
        let reader = client.clone_with_consistency_selector(
            FirestoreConsistencySelector::Transaction(transaction.transaction_id().clone()),
        );

        let existing: Option<Completion> = reader
            .fluent()
            .select()
            .by_id_in(collections::COMPLETIONS)
            .obj()
            .one(&completion_id)
            .await
            .map_err(|e| {
                AppError::Database(format!("Failed to read completion in transaction: {}", e))
            })?;

        if existing.is_some() {
            tracing::debug!(user_id, activity_id, "Completion already recorded");
            let _ = transaction.rollback().await;
            return Ok(false);
        }

        let current: Option<User> = reader
            .fluent()
            .select()
            .by_id_in(collections::USERS)
            .obj()
            .one(&user_doc_id(user_id))
            .await
            .map_err(|e| AppError::Database(format!("Failed to read user in transaction: {}", e)))?;

        let Some(mut user) = current else {
            let _ = transaction.rollback().await;
            return Err(AppError::NotFound(format!("User {} not found", user_id)));
        };
        let leveled_up = user.add_points(completion.points_awarded);

        client
            .fluent()
            .update()
            .in_col(collections::COMPLETIONS)
            .precondition(FirestoreWritePrecondition::Exists(false))
            .document_id(&completion_id)
            .object(completion)
            .add_to_transaction(&mut transaction)
            .map_err(|e| {
                AppError::Database(format!("Failed to add completion to transaction: {}", e))
            })?;

        client
            .fluent()
            .update()
            .fields(paths!(User::{points, level}))
            .in_col(collections::USERS)
            .precondition(FirestoreWritePrecondition::Exists(true))
            .document_id(user_doc_id(user_id))
            .object(&user)
            .add_to_transaction(&mut transaction)
            .map_err(|e| AppError::Database(format!("Failed to add user to transaction: {}", e)))?;

        transaction
            .commit()
            .await
            .map_err(|e| AppError::Database(format!("Transaction commit failed: {}", e)))?;

        tracing::info!(
            user_id,
            activity_id,
            points = completion.points_awarded,
            total_points = user.points,
            leveled_up,
            "Completion recorded"
        );

        Ok(true)
    }

    async fn list_completions(&self, user_id: &str) -> Result<Vec<Completion>, AppError> {
        let stream = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::COMPLETIONS)
            .filter(|q| q.for_all([q.field("user_id").eq(user_id)]))
            .order_by([(
                "completed_at",
                firestore::FirestoreQueryDirection::Ascending,
            )])
            .obj::<Completion>()
            .stream_query_with_errors()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        stream
            .try_collect()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn unlock_achievements(&self, user_id: &str, ids: &[String]) -> Result<(), AppError> {
        let client = self.get_client()?;
        if self.get_user(user_id).await?.is_none() {
            return Err(AppError::NotFound(format!("User {} not found", user_id)));
        }
        if ids.is_empty() {
            return Ok(());
        }

        // Server-side array union; the rest of the profile is not rewritten
        let mut transaction = client
            .begin_transaction()
            .await
            .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;

        client
            .fluent()
            .update()
            .in_col(collections::USERS)
            .precondition(FirestoreWritePrecondition::Exists(true))
            .document_id(user_doc_id(user_id))
            .transforms(|t| {
                t.fields([t
                    .field(path!(User::achievements))
                    .append_missing_elements(ids.iter().cloned())])
            })
            .only_transform()
            .add_to_transaction(&mut transaction)
            .map_err(|e| {
                AppError::Database(format!("Failed to add achievements to transaction: {}", e))
            })?;

        transaction
            .commit()
            .await
            .map_err(|e| AppError::Database(format!("Transaction commit failed: {}", e)))?;
        Ok(())
    }
}
