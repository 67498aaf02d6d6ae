// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! MindCare: guided wellbeing activities with points and achievements.
//!
//! This crate provides the backend API that walks users through guided
//! activities step by step and rewards them on completion.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::Config;
use db::ProgressStore;
use services::{ActivityCatalog, RunRegistry};
use std::sync::Arc;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub store: Arc<dyn ProgressStore>,
    pub catalog: ActivityCatalog,
    pub runs: RunRegistry,
}
