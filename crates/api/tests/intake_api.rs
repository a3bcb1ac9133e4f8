//! HTTP-level tests for the application form: step transitions,
//! attachments and the submission pipeline.

mod common;

use std::time::Duration;

use axum::http::StatusCode;
use common::{body_json, complete_draft, delete, get, open_session, patch_json, post_empty, post_file, ready_to_submit};
use serde_json::json;

// ---------------------------------------------------------------------------
// Step transitions
// ---------------------------------------------------------------------------

#[tokio::test]
async fn new_session_starts_clean_on_first_step() {
    let test = common::build_test_app();
    let id = open_session(test.app(), "fellowship").await;

    let json = body_json(get(test.app(), &format!("/api/v1/intake/{id}")).await).await;
    assert_eq!(json["data"]["step"], "personal_info");
    assert_eq!(json["data"]["step_number"], 1);
    assert_eq!(json["data"]["total_steps"], 3);
    assert_eq!(json["data"]["dirty"], false);
    assert_eq!(json["data"]["loading"], false);
}

#[tokio::test]
async fn unknown_variant_is_rejected() {
    let test = common::build_test_app();
    let response = post_empty(test.app(), "/api/v1/intake?variant=bootcamp").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn advance_with_missing_names_stays_on_step() {
    let test = common::build_test_app();
    let id = open_session(test.app(), "fellowship").await;
    patch_json(
        test.app(),
        &format!("/api/v1/intake/{id}"),
        json!({ "email": "ada@example.org" }),
    )
    .await;

    let response = post_empty(test.app(), &format!("/api/v1/intake/{id}/advance")).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["code"], "VALIDATION_ERROR");
    assert_eq!(json["error"], "First name is required");

    let json = body_json(get(test.app(), &format!("/api/v1/intake/{id}")).await).await;
    assert_eq!(json["data"]["step"], "personal_info");
    assert_eq!(json["data"]["dirty"], true);
}

#[tokio::test]
async fn advance_then_retreat_keeps_fields() {
    let test = common::build_test_app();
    let id = open_session(test.app(), "fellowship").await;
    patch_json(test.app(), &format!("/api/v1/intake/{id}"), complete_draft()).await;

    let response = post_empty(test.app(), &format!("/api/v1/intake/{id}/advance")).await;
    let json = body_json(response).await;
    assert_eq!(json["data"]["change"]["from"], "personal_info");
    assert_eq!(json["data"]["change"]["to"], "education");
    assert_eq!(json["data"]["change"]["reset_scroll"], true);

    let response = post_empty(test.app(), &format!("/api/v1/intake/{id}/retreat")).await;
    let json = body_json(response).await;
    assert_eq!(json["data"]["session"]["step"], "personal_info");
    assert_eq!(json["data"]["session"]["draft"]["first_name"], "Ada");
}

#[tokio::test]
async fn unknown_draft_field_is_rejected() {
    let test = common::build_test_app();
    let id = open_session(test.app(), "fellowship").await;
    let response = patch_json(
        test.app(),
        &format!("/api/v1/intake/{id}"),
        json!({ "favourite_colour": "green" }),
    )
    .await;
    assert!(response.status().is_client_error());
}

#[tokio::test]
async fn missing_session_is_404() {
    let test = common::build_test_app();
    let response = get(
        test.app(),
        "/api/v1/intake/00000000-0000-0000-0000-000000000000",
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// ---------------------------------------------------------------------------
// Attachments
// ---------------------------------------------------------------------------

#[tokio::test]
async fn attach_and_detach_document() {
    let test = common::build_test_app();
    let id = open_session(test.app(), "fellowship").await;

    let response = post_file(
        test.app(),
        &format!("/api/v1/intake/{id}/attachments/deck"),
        "deck.pdf",
        "application/pdf",
        b"%PDF deck",
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["draft"]["attachments"]["deck"]["file_name"], "deck.pdf");
    assert_eq!(json["data"]["dirty"], true);

    let response = delete(test.app(), &format!("/api/v1/intake/{id}/attachments/deck")).await;
    let json = body_json(response).await;
    assert!(json["data"]["draft"]["attachments"]["deck"].is_null());
    assert_eq!(json["data"]["dirty"], false);
}

#[tokio::test]
async fn unknown_document_kind_is_rejected() {
    let test = common::build_test_app();
    let id = open_session(test.app(), "fellowship").await;
    let response = post_file(
        test.app(),
        &format!("/api/v1/intake/{id}/attachments/portrait"),
        "me.png",
        "image/png",
        b"png",
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// ---------------------------------------------------------------------------
// Submission
// ---------------------------------------------------------------------------

#[tokio::test]
async fn submit_persists_mirrors_and_lands_on_success() {
    let test = common::build_test_app();
    let id = ready_to_submit(&test, "fellowship").await;

    let response = post_empty(test.app(), &format!("/api/v1/intake/{id}/submit")).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["change"]["to"], "success");
    assert_eq!(json["data"]["session"]["step"], "success");
    assert_eq!(json["data"]["session"]["loading"], false);
    assert_eq!(json["data"]["session"]["dirty"], false);
    assert!(json["data"]["record_id"].is_string());

    let rows = test.platform.rows("applications");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["email"], "ada@example.org");
    assert!(rows[0]["resume_path"].is_string());

    let mirrored = test.state.mirror.entries().await.unwrap();
    assert_eq!(mirrored.len(), 1);

    // A finished form accepts no more transitions.
    let response = post_empty(test.app(), &format!("/api/v1/intake/{id}/submit")).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn house_variant_goes_to_its_own_table() {
    let test = common::build_test_app();
    let id = ready_to_submit(&test, "house").await;

    let response = post_empty(test.app(), &format!("/api/v1/intake/{id}/submit")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(test.platform.rows("houseapplications").len(), 1);
    assert!(test.platform.rows("applications").is_empty());
}

#[tokio::test]
async fn concurrent_submits_insert_once() {
    let mut config = common::test_config();
    config.intake.settle_delay = Duration::from_millis(300);
    let test = common::build_test_app_with(config);
    let id = ready_to_submit(&test, "fellowship").await;

    let uri = format!("/api/v1/intake/{id}/submit");
    let (first, second) = tokio::join!(post_empty(test.app(), &uri), post_empty(test.app(), &uri));

    let mut statuses = [first.status(), second.status()];
    statuses.sort();
    assert_eq!(statuses, [StatusCode::OK, StatusCode::CONFLICT]);

    let conflict = if first.status() == StatusCode::CONFLICT { first } else { second };
    assert_eq!(body_json(conflict).await["code"], "CONFLICT");
    assert_eq!(test.platform.rows("applications").len(), 1);
    assert_eq!(test.state.mirror.entries().await.unwrap().len(), 1);
}

#[tokio::test]
async fn insert_failure_returns_502_and_allows_retry() {
    let test = common::build_test_app();
    let id = ready_to_submit(&test, "fellowship").await;
    test.platform.fail_table("applications");

    let response = post_empty(test.app(), &format!("/api/v1/intake/{id}/submit")).await;
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    assert_eq!(body_json(response).await["code"], "SUBMISSION_FAILED");

    let json = body_json(get(test.app(), &format!("/api/v1/intake/{id}")).await).await;
    assert_eq!(json["data"]["step"], "additional");
    assert_eq!(json["data"]["loading"], false);
    assert_eq!(json["data"]["draft"]["first_name"], "Ada");

    test.platform.clear_failures();
    let response = post_empty(test.app(), &format!("/api/v1/intake/{id}/submit")).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn upload_failure_still_submits_with_null_path() {
    let test = common::build_test_app();
    let id = ready_to_submit(&test, "fellowship").await;
    test.platform.fail_uploads_with_prefix("resumes/");

    let response = post_empty(test.app(), &format!("/api/v1/intake/{id}/submit")).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["session"]["step"], "success");

    let failed: Vec<_> = json["data"]["report"]["steps"]
        .as_array()
        .unwrap()
        .iter()
        .filter(|s| !s["error"].is_null())
        .map(|s| s["name"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(failed, vec!["upload_resume"]);

    let rows = test.platform.rows("applications");
    assert!(rows[0]["resume_path"].is_null());
}

#[tokio::test]
async fn discard_removes_session() {
    let test = common::build_test_app();
    let id = open_session(test.app(), "fellowship").await;

    let response = delete(test.app(), &format!("/api/v1/intake/{id}")).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    let response = get(test.app(), &format!("/api/v1/intake/{id}")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
