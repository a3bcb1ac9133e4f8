//! Back-office endpoints: application review, document links and the
//! analytics dashboard.

mod common;

use axum::http::StatusCode;
use common::{
    body_json, get, get_auth, patch_json_auth, post_json, submit_application,
};
use fellowship_core::record::ApplicationStatus;
use serde_json::json;

// ---------------------------------------------------------------------------
// Access
// ---------------------------------------------------------------------------

#[tokio::test]
async fn application_list_requires_staff() {
    let test = common::build_test_app();
    let (_, fellow) = test.member("fellow@example.org", "fellow", true);

    let response = get_auth(test.app(), "/api/v1/admin/applications", &fellow).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = get(test.app(), "/api/v1/admin/applications").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn super_admin_is_staff() {
    let test = common::build_test_app();
    let (_, token) = test.member("owner@example.org", "super_admin", false);

    let response = get_auth(test.app(), "/api/v1/admin/applications", &token).await;
    assert_eq!(response.status(), StatusCode::OK);
}

// ---------------------------------------------------------------------------
// Application list
// ---------------------------------------------------------------------------

#[tokio::test]
async fn lists_both_variants_from_platform() {
    let test = common::build_test_app();
    let (_, admin) = test.member("root@example.org", "admin", true);
    submit_application(&test, "fellowship").await;
    submit_application(&test, "house").await;

    let json = body_json(get_auth(test.app(), "/api/v1/admin/applications", &admin).await).await;
    assert_eq!(json["data"]["total"], 2);
    assert_eq!(json["data"]["source"], "platform");

    let response = get_auth(
        test.app(),
        "/api/v1/admin/applications?variant=house",
        &admin,
    )
    .await;
    let json = body_json(response).await;
    assert_eq!(json["data"]["total"], 1);
    assert_eq!(json["data"]["items"][0]["variant"], "house");
    assert_eq!(json["data"]["items"][0]["name"], "Ada Lovelace");
    assert_eq!(json["data"]["items"][0]["status"], "pending");
}

#[tokio::test]
async fn falls_back_to_mirror_when_platform_is_down() {
    let test = common::build_test_app();
    let (_, admin) = test.member("root@example.org", "admin", true);
    submit_application(&test, "fellowship").await;

    test.platform.fail_table("applications");
    test.platform.fail_table("houseapplications");

    let response = get_auth(test.app(), "/api/v1/admin/applications", &admin).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["source"], "mirror");
    assert_eq!(json["data"]["total"], 1);
    assert_eq!(json["data"]["items"][0]["email"], "ada@example.org");
}

#[tokio::test]
async fn status_filter_and_update() {
    let test = common::build_test_app();
    let (_, admin) = test.member("root@example.org", "admin", true);
    let record_id = submit_application(&test, "fellowship").await;

    let response = patch_json_auth(
        test.app(),
        &format!("/api/v1/admin/applications/{record_id}/status"),
        json!({ "variant": "fellowship", "status": "accepted" }),
        &admin,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"]["status"], "accepted");
    assert_eq!(test.platform.rows("applications")[0]["status"], "accepted");

    let mirrored = test.state.mirror.entries().await.unwrap();
    assert_eq!(mirrored[0].status, ApplicationStatus::Accepted);

    let json = body_json(
        get_auth(test.app(), "/api/v1/admin/applications?status=pending", &admin).await,
    )
    .await;
    assert_eq!(json["data"]["total"], 0);
}

#[tokio::test]
async fn unknown_status_is_rejected() {
    let test = common::build_test_app();
    let (_, admin) = test.member("root@example.org", "admin", true);
    let record_id = submit_application(&test, "fellowship").await;

    let response = patch_json_auth(
        test.app(),
        &format!("/api/v1/admin/applications/{record_id}/status"),
        json!({ "status": "maybe" }),
        &admin,
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// ---------------------------------------------------------------------------
// Documents
// ---------------------------------------------------------------------------

#[tokio::test]
async fn document_link_points_at_stored_resume() {
    let test = common::build_test_app();
    let (_, admin) = test.member("root@example.org", "admin", true);
    let record_id = submit_application(&test, "fellowship").await;

    let response = get_auth(
        test.app(),
        &format!("/api/v1/admin/applications/{record_id}/documents/resume"),
        &admin,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    let url = json["data"]["url"].as_str().unwrap();
    assert!(url.starts_with("memory://applications/resumes/"));
    assert_eq!(json["data"]["expires_in"], 3600);
}

#[tokio::test]
async fn missing_document_is_404() {
    let test = common::build_test_app();
    let (_, admin) = test.member("root@example.org", "admin", true);
    let record_id = submit_application(&test, "fellowship").await;

    let response = get_auth(
        test.app(),
        &format!("/api/v1/admin/applications/{record_id}/documents/memo"),
        &admin,
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// ---------------------------------------------------------------------------
// Analytics
// ---------------------------------------------------------------------------

#[tokio::test]
async fn analyst_sees_traffic_and_application_counts() {
    let test = common::build_test_app();
    let (_, analyst) = test.member("numbers@example.org", "analyst", true);
    submit_application(&test, "fellowship").await;

    for new_visitor in [true, false, true] {
        let response = post_json(
            test.app(),
            "/api/v1/analytics/page-views",
            json!({ "path": "/apply", "new_visitor": new_visitor }),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    let response = get_auth(test.app(), "/api/v1/admin/analytics", &analyst).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["page_views"]["/apply"], 3);
    assert_eq!(json["data"]["total_page_views"], 3);
    assert_eq!(json["data"]["visitor_count"], 2);
    assert_eq!(json["data"]["applications"]["total"], 1);
    assert_eq!(json["data"]["applications"]["by_status"]["pending"], 1);
    assert_eq!(json["data"]["applications"]["by_status"]["accepted"], 0);
}

#[tokio::test]
async fn analyst_cannot_review_applications() {
    let test = common::build_test_app();
    let (_, analyst) = test.member("numbers@example.org", "analyst", true);

    let response = get_auth(test.app(), "/api/v1/admin/applications", &analyst).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn page_view_path_must_be_absolute() {
    let test = common::build_test_app();
    let response = post_json(
        test.app(),
        "/api/v1/analytics/page-views",
        json!({ "path": "apply" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn unknown_paths_share_one_counter() {
    let test = common::build_test_app();
    let (_, analyst) = test.member("numbers@example.org", "analyst", true);

    for path in ["/random/a8f3c1", "/nope", "/house/events/7"] {
        let response = post_json(
            test.app(),
            "/api/v1/analytics/page-views",
            json!({ "path": path }),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    let json = body_json(get_auth(test.app(), "/api/v1/admin/analytics", &analyst).await).await;
    let page_views = json["data"]["page_views"].as_object().unwrap();
    assert_eq!(page_views.len(), 2);
    assert_eq!(page_views["other"], 2);
    assert_eq!(page_views["/house"], 1);
    assert!(!page_views.contains_key("/nope"));
    assert!(!page_views.contains_key("/random/a8f3c1"));
    assert_eq!(json["data"]["total_page_views"], 3);
}
