// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod achievement;
pub mod activity;
pub mod completion;
pub mod user;

pub use achievement::{Achievement, AchievementRule};
pub use activity::{Activity, Category, Step};
pub use completion::Completion;
pub use user::User;
