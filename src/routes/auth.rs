// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Username login and logout.
//!
//! Login has no password: any username is accepted and the account is
//! created on first use.

use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::{Validate, ValidationError};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use crate::error::{AppError, Result};
use crate::middleware::auth::{create_jwt, SESSION_COOKIE, SESSION_TTL_SECS};
use crate::models::user::{normalize_username, User};
use crate::time_utils::now_rfc3339;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/login", post(login))
        .route("/auth/logout", post(logout))
}

/// Login request body.
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(
        length(min = 1, max = 32, message = "username must be 1-32 characters"),
        custom(function = "validate_username")
    )]
    pub username: String,
}

fn validate_username(username: &str) -> std::result::Result<(), ValidationError> {
    if username.chars().any(char::is_control) {
        return Err(ValidationError::new("invalid_characters"));
    }
    Ok(())
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct LoginResponse {
    pub user_id: String,
    pub username: String,
    pub token: String,
    pub new_user: bool,
}

/// Log in (creating the user if needed), returning a JWT and session cookie.
async fn login(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(body): Json<LoginRequest>,
) -> Result<(CookieJar, Json<LoginResponse>)> {
    let request = LoginRequest {
        username: body.username.trim().to_string(),
    };
    request
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let user_id = normalize_username(&request.username);
    let now = now_rfc3339();

    // Existing profiles only get `last_active`; points are never rewritten here
    let (user, new_user) = match state.store.touch_user(&user_id, &now).await? {
        Some(user) => (user, false),
        None => {
            let user = User::new(&request.username, &now);
            if state.store.create_user(&user).await? {
                (user, true)
            } else {
                // Created by a concurrent login
                let existing = state.store.get_user(&user_id).await?.ok_or_else(|| {
                    AppError::Database(format!("User {} vanished during login", user_id))
                })?;
                (existing, false)
            }
        }
    };

    tracing::info!(user_id = %user.user_id, new_user, "User logged in");

    let token = create_jwt(&user.user_id, &state.config.jwt_signing_key)?;

    let cookie = Cookie::build((SESSION_COOKIE, token.clone()))
        .path("/")
        .http_only(true)
        .secure(state.config.frontend_url.starts_with("https://"))
        .same_site(SameSite::Lax)
        .max_age(time::Duration::seconds(SESSION_TTL_SECS as i64));

    Ok((
        jar.add(cookie),
        Json(LoginResponse {
            user_id: user.user_id,
            username: user.username,
            token,
            new_user,
        }),
    ))
}

/// Clear the session cookie. In-flight runs are left to the sweeper.
async fn logout(jar: CookieJar) -> (CookieJar, StatusCode) {
    (
        jar.remove(Cookie::build(SESSION_COOKIE).path("/")),
        StatusCode::NO_CONTENT,
    )
}
