//! Integration tests for the RPC router
//!
//! Drives every procedure over HTTP against in-memory stores.

use axum::body::Body;
use axum::http::StatusCode;
use crudkit::error::ErrorKind;
use crudkit::prelude::*;
use crudkit::resource::{DeleteOutput, ListOutput};
use crudkit::testing::TestApp;
use serde_json::json;

struct Widget;

impl Resource for Widget {
    type Record = Record;
    const NAME: &'static str = "Widget";
    const PATH: &'static str = "widget";
    const TABLE: &'static str = "widgets";
    const ACCESS: AccessTier = AccessTier::Protected;
    const SOFT_DELETE: bool = true;
    const SEARCH_FIELDS: &'static [&'static str] = &["name", "description"];
}

struct Invoice;

impl Resource for Invoice {
    type Record = Record;
    const NAME: &'static str = "Invoice";
    const PATH: &'static str = "invoice";
    const TABLE: &'static str = "invoices";
    const ACCESS: AccessTier = AccessTier::Admin;
    const SOFT_DELETE: bool = false;
    const SEARCH_FIELDS: &'static [&'static str] = &["name"];
}

struct Notice;

impl Resource for Notice {
    type Record = Record;
    const NAME: &'static str = "Notice";
    const PATH: &'static str = "notice";
    const TABLE: &'static str = "notices";
    const ACCESS: AccessTier = AccessTier::Public;
    const SOFT_DELETE: bool = false;
    const SEARCH_FIELDS: &'static [&'static str] = &["name"];
}

fn app() -> TestApp {
    TestApp::new()
        .resource::<Widget>()
        .resource::<Invoice>()
        .resource::<Notice>()
        .as_caller(Caller::user("user-1"))
}

async fn create_widget(app: &TestApp, name: &str) -> Record {
    let response = app.call("widget.create", json!({ "name": name })).await;
    assert_eq!(response.status, StatusCode::OK, "{:?}", response.body);
    response.json()
}

#[tokio::test]
async fn test_create_then_get() {
    let app = app();
    let created = create_widget(&app, "Bolt").await;
    assert_eq!(created.status, "ACTIVE");

    let response = app.call("widget.get", json!({ "id": created.id })).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.json::<Record>(), created);
}

#[tokio::test]
async fn test_create_rejects_server_assigned_fields() {
    let app = app();
    let response = app
        .call(
            "widget.create",
            json!({ "name": "Bolt", "createdAt": "2025-01-01T00:00:00Z" }),
        )
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.error_kind(), ErrorKind::ValidationError);
    assert_eq!(response.body["error"]["status"], "BAD_REQUEST");
}

#[tokio::test]
async fn test_malformed_json_is_validation_error() {
    let app = app();
    let response = app
        .call_raw("widget.create", Body::from("{\"name\": "))
        .await;
    assert_eq!(response.error_kind(), ErrorKind::ValidationError);
}

#[tokio::test]
async fn test_get_unknown_id_is_not_found() {
    let app = app();
    let response = app
        .call("widget.get", json!({ "id": "00000000-0000-0000-0000-000000000000" }))
        .await;

    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(response.error_kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn test_list_with_empty_body_uses_defaults() {
    let app = app();
    for name in ["Alpha", "Beta", "Gamma"] {
        create_widget(&app, name).await;
    }

    let response = app.call_raw("widget.list", Body::empty()).await;
    assert_eq!(response.status, StatusCode::OK);

    let page: ListOutput<Record> = response.json();
    assert_eq!(page.items.len(), 3);
    assert_eq!(page.pagination.page, 1);
    assert_eq!(page.pagination.limit, 20);
    assert_eq!(page.pagination.total, 3);
    assert_eq!(page.pagination.total_pages, 1);
}

#[tokio::test]
async fn test_list_search_sort_and_paging() {
    let app = app();
    for name in ["bolt", "Nut", "Washer", "Anchor bolt"] {
        create_widget(&app, name).await;
    }

    let response = app
        .call(
            "widget.list",
            json!({ "search": "BOLT", "sortBy": "name", "sortOrder": "asc", "limit": 1 }),
        )
        .await;
    let page: ListOutput<Record> = response.json();
    assert_eq!(page.pagination.total, 2);
    assert_eq!(page.pagination.total_pages, 2);
    assert_eq!(page.items.len(), 1);
    assert_eq!(page.items[0].name, "Anchor bolt");

    let response = app
        .call(
            "widget.list",
            json!({ "search": "bolt", "sortBy": "name", "sortOrder": "asc", "limit": 1, "page": 2 }),
        )
        .await;
    let page: ListOutput<Record> = response.json();
    assert_eq!(page.items[0].name, "bolt");
}

#[tokio::test]
async fn test_list_bounds_are_validation_errors() {
    let app = app();
    for body in [json!({ "page": 0 }), json!({ "limit": 0 }), json!({ "limit": 101 })] {
        let response = app.call("widget.list", body).await;
        assert_eq!(response.status, StatusCode::BAD_REQUEST);
        assert_eq!(response.error_kind(), ErrorKind::ValidationError);
    }
}

#[tokio::test]
async fn test_update_merges_partial_data() {
    let app = app();
    let created = create_widget(&app, "Bolt").await;

    let response = app
        .call(
            "widget.update",
            json!({ "id": created.id, "data": { "description": "M6 x 20" } }),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);

    let updated: Record = response.json();
    assert_eq!(updated.name, "Bolt");
    assert_eq!(updated.description.as_deref(), Some("M6 x 20"));
    assert_eq!(updated.created_at, created.created_at);
}

#[tokio::test]
async fn test_update_unknown_id_is_not_found() {
    let app = app();
    let response = app
        .call(
            "widget.update",
            json!({ "id": "00000000-0000-0000-0000-000000000001", "data": { "name": "X" } }),
        )
        .await;
    assert_eq!(response.error_kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn test_soft_delete_restore_cycle() {
    let app = app();
    let created = create_widget(&app, "Bolt").await;

    let response = app.call("widget.delete", json!({ "id": created.id })).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(
        response.json::<DeleteOutput>(),
        DeleteOutput {
            success: true,
            id: created.id
        }
    );

    let again = app.call("widget.delete", json!({ "id": created.id })).await;
    assert_eq!(again.status, StatusCode::OK);

    let hidden = app.call("widget.get", json!({ "id": created.id })).await;
    assert_eq!(hidden.error_kind(), ErrorKind::NotFound);

    let page: ListOutput<Record> = app.call("widget.list", json!({})).await.json();
    assert_eq!(page.pagination.total, 0);

    let restored = app.call("widget.restore", json!({ "id": created.id })).await;
    assert_eq!(restored.status, StatusCode::OK);
    assert!(restored.json::<Record>().deleted_at.is_none());

    let visible = app.call("widget.get", json!({ "id": created.id })).await;
    assert_eq!(visible.status, StatusCode::OK);
}

#[tokio::test]
async fn test_admin_can_list_deleted() {
    let app = app();
    let created = create_widget(&app, "Bolt").await;
    app.call("widget.delete", json!({ "id": created.id })).await;

    let user_page: ListOutput<Record> = app
        .call("widget.list", json!({ "includeDeleted": true }))
        .await
        .json();
    assert_eq!(user_page.pagination.total, 0);

    let admin = app.clone().as_caller(Caller::admin("admin-1"));
    let admin_page: ListOutput<Record> = admin
        .call("widget.list", json!({ "includeDeleted": true }))
        .await
        .json();
    assert_eq!(admin_page.pagination.total, 1);
    assert!(admin_page.items[0].deleted_at.is_some());
}

#[tokio::test]
async fn test_hard_delete_resource_has_no_restore() {
    let app = app().as_caller(Caller::admin("admin-1"));
    let created: Record = app
        .call("invoice.create", json!({ "name": "INV-1" }))
        .await
        .json();

    let restore = app.call("invoice.restore", json!({ "id": created.id })).await;
    assert_eq!(restore.status, StatusCode::NOT_FOUND);
    assert_eq!(restore.error_kind(), ErrorKind::NotFound);

    let deleted = app.call("invoice.delete", json!({ "id": created.id })).await;
    assert_eq!(deleted.status, StatusCode::OK);

    let gone = app.call("invoice.get", json!({ "id": created.id })).await;
    assert_eq!(gone.error_kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn test_access_tiers_over_http() {
    let anonymous = app().anonymous();
    let response = anonymous.call("widget.list", json!({})).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.body["error"]["status"], "UNAUTHORIZED");

    let public = anonymous.call("notice.create", json!({ "name": "Hello" })).await;
    assert_eq!(public.status, StatusCode::OK);

    let user = app();
    let response = user.call("invoice.list", json!({})).await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);
    assert_eq!(response.error_kind(), ErrorKind::Forbidden);

    let admin = app().as_caller(Caller {
        user_id: "root".to_string(),
        role: Role::SuperAdmin,
    });
    let response = admin.call("invoice.list", json!({})).await;
    assert_eq!(response.status, StatusCode::OK);
}

#[tokio::test]
async fn test_access_is_checked_before_the_body() {
    let anonymous = app().anonymous();
    let response = anonymous
        .call_raw("widget.create", Body::from("{\"name\": "))
        .await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);

    let response = app()
        .call_raw("invoice.create", Body::from("not json"))
        .await;
    assert_eq!(response.error_kind(), ErrorKind::Forbidden);
}

#[tokio::test]
async fn test_oversized_body_is_payload_too_large() {
    let app = app();
    let name = "x".repeat(3 * 1024 * 1024);
    let response = app.call("widget.create", json!({ "name": name })).await;

    assert_eq!(response.status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(response.error_kind(), ErrorKind::ValidationError);
    assert_eq!(response.body["error"]["status"], "PAYLOAD_TOO_LARGE");
}

#[tokio::test]
async fn test_error_body_never_carries_detail() {
    let app = app();
    let response = app
        .call("widget.get", json!({ "id": "00000000-0000-0000-0000-000000000002" }))
        .await;

    let message = response.body["error"]["message"].as_str().unwrap();
    assert_eq!(message, ErrorCatalog::global().message(ErrorKind::NotFound));
    assert!(!response.body.to_string().contains("00000000-0000-0000-0000-000000000002"));
}
