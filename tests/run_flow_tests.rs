// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! End-to-end tests of guided-activity runs over HTTP.

use axum::http::StatusCode;
use serde_json::Value;
use tower::ServiceExt;

mod common;
use common::{authed, create_test_app, json_body, seed_user};

const FIVE_SENSES: &str = "/api/runs/ansiedade_5sentidos";

async fn call(app: &axum::Router, method: &str, uri: &str, token: &str) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(authed(method, uri, token))
        .await
        .unwrap();
    let status = response.status();
    let body = if status == StatusCode::NO_CONTENT {
        Value::Null
    } else {
        json_body(response).await
    };
    (status, body)
}

async fn advance_to_last(app: &axum::Router, base: &str, token: &str, total: usize) {
    for expected in 1..total {
        let (status, body) = call(app, "POST", &format!("{}/advance", base), token).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["changed"], true);
        assert_eq!(body["run"]["step_index"], expected);
    }
}

#[tokio::test]
async fn test_five_senses_full_run() {
    let (app, state) = create_test_app();
    let token = seed_user(&state, "ana").await;

    // Start: first step is untimed
    let (status, run) = call(&app, "POST", FIVE_SENSES, &token).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(run["state"], "in_progress");
    assert_eq!(run["step_index"], 0);
    assert_eq!(run["total_steps"], 7);
    assert!(run["remaining_seconds"].is_null());
    assert_eq!(run["timer_running"], false);
    assert_eq!(run["can_complete"], false);

    // Completing early is rejected and changes nothing
    let (status, body) = call(&app, "POST", &format!("{}/complete", FIVE_SENSES), &token).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "conflict");
    let (_, run) = call(&app, "GET", FIVE_SENSES, &token).await;
    assert_eq!(run["step_index"], 0);

    // Step 1 has a 45 second countdown
    let (_, body) = call(&app, "POST", &format!("{}/advance", FIVE_SENSES), &token).await;
    assert_eq!(body["changed"], true);
    assert_eq!(body["run"]["remaining_seconds"], 45);
    assert_eq!(body["run"]["timer_running"], true);

    let (_, body) = call(&app, "POST", &format!("{}/tick", FIVE_SENSES), &token).await;
    assert_eq!(body["changed"], true);
    assert_eq!(body["run"]["remaining_seconds"], 44);
    assert_eq!(body["run"]["step_index"], 1);

    // Advancing mid-countdown replaces the timer with the next step's
    let (_, body) = call(&app, "POST", &format!("{}/advance", FIVE_SENSES), &token).await;
    assert_eq!(body["run"]["step_index"], 2);
    assert_eq!(body["run"]["remaining_seconds"], 40);

    for expected in 3..7 {
        let (_, body) = call(&app, "POST", &format!("{}/advance", FIVE_SENSES), &token).await;
        assert_eq!(body["run"]["step_index"], expected);
    }

    // Last step: untimed, completable, advance is a no-op
    let (_, body) = call(&app, "POST", &format!("{}/advance", FIVE_SENSES), &token).await;
    assert_eq!(body["changed"], false);
    assert_eq!(body["run"]["step_index"], 6);
    assert_eq!(body["run"]["can_complete"], true);
    assert!(body["run"]["remaining_seconds"].is_null());

    let (status, body) = call(&app, "POST", &format!("{}/complete", FIVE_SENSES), &token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["outcome"], "recorded");
    assert_eq!(body["points_awarded"], 22);
    assert_eq!(body["total_points"], 22);
    assert_eq!(body["level"], 1);
    assert_eq!(body["run"]["state"], "completed");
    assert_eq!(body["run"]["step_index"], 6);
    assert_eq!(body["run"]["can_complete"], false);

    let unlocked: Vec<&str> = body["new_achievements"]
        .as_array()
        .unwrap()
        .iter()
        .map(|a| a["id"].as_str().unwrap())
        .collect();
    assert_eq!(unlocked, vec!["primeiro_passo", "calma_interior"]);

    // The finished run is discarded
    let (status, _) = call(&app, "GET", FIVE_SENSES, &token).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let profile = state.store.get_user("ana").await.unwrap().unwrap();
    assert_eq!(profile.points, 22);
}

#[tokio::test]
async fn test_repeat_completion_grants_nothing() {
    let (app, state) = create_test_app();
    let token = seed_user(&state, "bruno").await;
    let base = "/api/runs/tres_coisas_boas";

    for round in 0..2 {
        let (status, _) = call(&app, "POST", base, &token).await;
        assert_eq!(status, StatusCode::CREATED);
        advance_to_last(&app, base, &token, 3).await;

        let (status, body) = call(&app, "POST", &format!("{}/complete", base), &token).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["total_points"], 10);
        if round == 0 {
            assert_eq!(body["outcome"], "recorded");
            assert_eq!(body["points_awarded"], 10);
        } else {
            assert_eq!(body["outcome"], "already_completed");
            assert!(body.get("points_awarded").is_none());
            assert!(body["new_achievements"].as_array().unwrap().is_empty());
        }
    }

    let completions = state.store.list_completions("bruno").await.unwrap();
    assert_eq!(completions.len(), 1);
}

#[tokio::test]
async fn test_restart_replaces_run() {
    let (app, state) = create_test_app();
    let token = seed_user(&state, "carla").await;
    let base = "/api/runs/respiracao_quadrada";

    call(&app, "POST", base, &token).await;
    call(&app, "POST", &format!("{}/advance", base), &token).await;

    let (status, run) = call(&app, "POST", base, &token).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(run["step_index"], 0);
    assert_eq!(run["remaining_seconds"], 4);
    assert_eq!(state.runs.len(), 1);
}

#[tokio::test]
async fn test_tick_runs_down_and_stops() {
    let (app, state) = create_test_app();
    let token = seed_user(&state, "davi").await;
    let base = "/api/runs/respiracao_quadrada";

    call(&app, "POST", base, &token).await;
    for remaining in (0..4).rev() {
        let (_, body) = call(&app, "POST", &format!("{}/tick", base), &token).await;
        assert_eq!(body["changed"], true);
        assert_eq!(body["run"]["remaining_seconds"], remaining);
    }

    // Expired countdown: tick is a no-op and the step stays put
    let (_, body) = call(&app, "POST", &format!("{}/tick", base), &token).await;
    assert_eq!(body["changed"], false);
    assert_eq!(body["run"]["remaining_seconds"], 0);
    assert_eq!(body["run"]["timer_running"], false);
    assert_eq!(body["run"]["step_index"], 0);
}

#[tokio::test]
async fn test_abandon_run() {
    let (app, state) = create_test_app();
    let token = seed_user(&state, "eva").await;
    let base = "/api/runs/meditacao_guiada";

    call(&app, "POST", base, &token).await;
    let (status, _) = call(&app, "DELETE", base, &token).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert!(state.runs.is_empty());

    let (status, _) = call(&app, "DELETE", base, &token).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // Nothing was recorded
    assert!(!state
        .store
        .has_completed("eva", "meditacao_guiada")
        .await
        .unwrap());
}

#[tokio::test]
async fn test_unknown_activity_and_missing_run() {
    let (app, state) = create_test_app();
    let token = seed_user(&state, "fabio").await;

    let (status, body) = call(&app, "POST", "/api/runs/nao_existe", &token).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_found");

    for suffix in ["", "/advance", "/tick", "/complete"] {
        let method = if suffix.is_empty() { "GET" } else { "POST" };
        let uri = format!("/api/runs/yoga_basico{}", suffix);
        let (status, _) = call(&app, method, &uri, &token).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{} {}", method, uri);
    }
}

#[tokio::test]
async fn test_runs_are_per_user() {
    let (app, state) = create_test_app();
    let first = seed_user(&state, "gabi").await;
    let second = seed_user(&state, "hugo").await;
    let base = "/api/runs/journaling_diario";

    call(&app, "POST", base, &first).await;
    call(&app, "POST", &format!("{}/advance", base), &first).await;

    let (status, _) = call(&app, "GET", base, &second).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, run) = call(&app, "POST", base, &second).await;
    assert_eq!(run["step_index"], 0);
    let (_, run) = call(&app, "GET", base, &first).await;
    assert_eq!(run["step_index"], 1);
}
