// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod catalog;
pub mod rewards;
pub mod runner;
pub mod runs;

pub use catalog::{ActivityCatalog, CatalogError};
pub use runner::{CompletionOutcome, RunSnapshot, RunState, RunnerError, StepRunner};
pub use runs::RunRegistry;
