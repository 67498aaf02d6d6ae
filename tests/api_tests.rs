// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Profile, catalog and achievement endpoint tests.

use axum::http::StatusCode;
use mindcare::models::Completion;
use tower::ServiceExt;

mod common;
use common::{authed, create_test_app, json_body, seed_user};

#[tokio::test]
async fn test_me_for_new_user() {
    let (app, state) = create_test_app();
    let token = seed_user(&state, "lia").await;

    let response = app.oneshot(authed("GET", "/api/me", &token)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    assert_eq!(body["user_id"], "lia");
    assert_eq!(body["points"], 0);
    assert_eq!(body["level"], 1);
    assert_eq!(body["points_to_next_level"], 50);
    assert_eq!(body["completed_activities"], 0);
    assert!(body["achievements"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_me_for_deleted_user() {
    let (app, state) = create_test_app();
    let token =
        mindcare::middleware::auth::create_jwt("fantasma", &state.config.jwt_signing_key).unwrap();

    let response = app.oneshot(authed("GET", "/api/me", &token)).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_me_reflects_completions() {
    let (app, state) = create_test_app();
    let token = seed_user(&state, "rui").await;

    for (activity_id, points) in [
        ("caminhada_mindful", 25),
        ("yoga_basico", 20),
        ("meditacao_guiada", 15),
    ] {
        let completion = Completion {
            user_id: "rui".to_string(),
            activity_id: activity_id.to_string(),
            points_awarded: points,
            completed_at: "2026-03-01T10:00:00Z".to_string(),
        };
        assert!(state.store.record_completion(&completion).await.unwrap());
    }

    let response = app.oneshot(authed("GET", "/api/me", &token)).await.unwrap();
    let body = json_body(response).await;
    assert_eq!(body["points"], 60);
    assert_eq!(body["level"], 2);
    assert_eq!(body["points_to_next_level"], 40);
    assert_eq!(body["completed_activities"], 3);
}

#[tokio::test]
async fn test_list_activities_flags_completed() {
    let (app, state) = create_test_app();
    let token = seed_user(&state, "sara").await;

    let completion = Completion {
        user_id: "sara".to_string(),
        activity_id: "respiracao_478".to_string(),
        points_awarded: 10,
        completed_at: "2026-03-01T10:00:00Z".to_string(),
    };
    state.store.record_completion(&completion).await.unwrap();

    let response = app
        .oneshot(authed("GET", "/api/activities", &token))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    assert_eq!(body["total"], 8);
    assert_eq!(body["completed"], 1);

    let activities = body["activities"].as_array().unwrap();
    let breathing = activities
        .iter()
        .find(|a| a["id"] == "respiracao_478")
        .unwrap();
    assert_eq!(breathing["completed"], true);
    assert_eq!(breathing["category"], "mindfulness");
    assert_eq!(breathing["step_count"], 6);

    let five_senses = activities
        .iter()
        .find(|a| a["id"] == "ansiedade_5sentidos")
        .unwrap();
    assert_eq!(five_senses["completed"], false);
    assert_eq!(five_senses["points"], 22);
}

#[tokio::test]
async fn test_activity_detail() {
    let (app, state) = create_test_app();
    let token = seed_user(&state, "tiago").await;

    let response = app
        .clone()
        .oneshot(authed("GET", "/api/activities/ansiedade_5sentidos", &token))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    assert_eq!(body["name"], "Técnica 5-4-3-2-1");
    let durations: Vec<u64> = body["steps"]
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["duration"].as_u64().unwrap())
        .collect();
    assert_eq!(durations, vec![0, 45, 40, 35, 30, 20, 0]);

    let response = app
        .oneshot(authed("GET", "/api/activities/nao_existe", &token))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_achievements_listing() {
    let (app, state) = create_test_app();
    let token = seed_user(&state, "vera").await;
    state
        .store
        .unlock_achievements("vera", &["primeiro_passo".to_string()])
        .await
        .unwrap();

    let response = app
        .oneshot(authed("GET", "/api/achievements", &token))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    assert_eq!(body["unlocked"], 1);
    let achievements = body["achievements"].as_array().unwrap();
    assert_eq!(achievements.len(), 5);
    assert_eq!(achievements[0]["id"], "primeiro_passo");
    assert_eq!(achievements[0]["unlocked"], true);
    assert!(achievements[1..].iter().all(|a| a["unlocked"] == false));
}
