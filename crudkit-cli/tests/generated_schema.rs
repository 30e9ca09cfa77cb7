//! Generated schemas compile against crudkit
//!
//! `fixtures/widget_schema.rs` is the schema emitted for the Widget resource
//! (admin, soft delete, `name,description`). It is compiled here and must stay
//! byte-identical to what the emitter renders today.

use crudkit::config::ScaffoldSettings;
use crudkit::prelude::*;
use crudkit::testing::TestApp;
use crudkit_cli::scaffold::{parse_search_fields, ModelName, ScaffoldConfig, ScaffoldEmitter};
use http::StatusCode;
use serde_json::json;
use std::path::Path;

#[allow(dead_code)]
#[path = "fixtures/widget_schema.rs"]
mod widget_schema;

use widget_schema::Widget;

const WIDGET_SCHEMA: &str = include_str!("fixtures/widget_schema.rs");

fn widget_config() -> ScaffoldConfig {
    ScaffoldConfig {
        model: ModelName::parse("Widget").unwrap(),
        access: AccessTier::Admin,
        with_soft_delete: true,
        searchable_fields: parse_search_fields("name,description").unwrap(),
    }
}

#[test]
fn test_emitted_schema_matches_compiled_fixture() {
    let emitter = ScaffoldEmitter::new(widget_config(), ScaffoldSettings::default()).unwrap();
    let files = emitter.generate().unwrap();

    let schema = files
        .iter()
        .find(|file| file.path == Path::new("src/schemas/widget.rs"))
        .unwrap();
    assert_eq!(schema.content, WIDGET_SCHEMA);
}

#[test]
fn test_fixture_constants() {
    assert_eq!(Widget::NAME, "Widget");
    assert_eq!(Widget::PATH, "widget");
    assert_eq!(Widget::TABLE, "widgets");
    assert_eq!(Widget::ACCESS, AccessTier::Admin);
    assert!(Widget::SOFT_DELETE);
    assert_eq!(Widget::SEARCH_FIELDS, ["name", "description"]);
}

#[tokio::test]
async fn test_fixture_serves_procedures() {
    let app = TestApp::new()
        .resource::<Widget>()
        .as_caller(Caller::admin("admin-1"));

    let created = app.call("widget.create", json!({ "name": "Sprocket" })).await;
    assert_eq!(created.status, StatusCode::OK);
    let record: Record = created.json();

    let deleted = app.call("widget.delete", json!({ "id": record.id })).await;
    assert_eq!(deleted.status, StatusCode::OK);

    let restored = app.call("widget.restore", json!({ "id": record.id })).await;
    assert_eq!(restored.status, StatusCode::OK);
    assert!(restored.json::<Record>().deleted_at.is_none());

    let user = TestApp::new()
        .resource::<Widget>()
        .as_caller(Caller::user("user-1"));
    let response = user.call("widget.list", json!({})).await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);
}
