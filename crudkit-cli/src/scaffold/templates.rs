//! Embedded code templates for resource scaffolding
//!
//! Templates are rendered with minijinja. Name-case helpers are available as
//! the `pascal`, `camel`, `kebab`, `snake` and `plural` filters.

use minijinja::{AutoEscape, Environment};
use serde::Serialize;
use thiserror::Error;

use super::helpers::TemplateHelpers;

/// Template rendering errors
#[derive(Debug, Error)]
pub enum TemplateError {
    /// Template failed to compile or render
    #[error("template '{name}' failed: {source}")]
    Render {
        /// Template name
        name: String,
        /// Underlying error
        source: minijinja::Error,
    },
}

/// Resource marker type, access tier and delete policy
pub const SCHEMA_TEMPLATE: &str = r#"//! {{ model }} resource

use crudkit::prelude::*;

/// {{ model }} records in `{{ table }}`
pub struct {{ model }};

impl Resource for {{ model }} {
    type Record = Record;
    const NAME: &'static str = "{{ model }}";
    const PATH: &'static str = "{{ model | camel }}";
    const TABLE: &'static str = "{{ table }}";
    const ACCESS: AccessTier = AccessTier::{{ access | pascal }};
    const SOFT_DELETE: bool = {% if soft_delete %}true{% else %}false{% endif %};
    const SEARCH_FIELDS: &'static [&'static str] = &[{% for field in search_fields %}"{{ field }}"{% if not loop.last %}, {% endif %}{% endfor %}];
}

/// Stored {{ model | kebab }}
pub type {{ model }}Record = Record;

/// Create input for `{{ model | camel }}.create`
pub type Create{{ model }}Input = CreateInput;

/// Partial update for `{{ model | camel }}.update`
pub type Update{{ model }}Data = UpdateData;

/// Page of {{ model | plural | kebab }}
pub type {{ model | plural }}Page = ListOutput<Record>;
"#;

/// Per-request service constructor
pub const SERVICE_TEMPLATE: &str = r#"//! {{ model }} service

use crudkit::prelude::*;

use crate::schemas::{{ model | snake }}::{{ model }};

/// CRUD operations on {{ model | plural | kebab }}
pub type {{ model }}Service = CrudService<{{ model }}>;

/// Service bound to the caller in `ctx`
///
/// # Errors
///
/// Returns an internal error if no {{ model | kebab }} store is registered
pub fn {{ model | snake }}_service(ctx: &Context) -> Result<{{ model }}Service, ApiError> {
    {{ model }}Service::new(ctx)
}
"#;

/// Procedure registration
pub const ROUTER_TEMPLATE: &str = r#"//! {{ model }} procedures

use crudkit::router::ApiRouter;

use crate::schemas::{{ model | snake }}::{{ model }};

/// Add `{{ model | camel }}.*` procedures to the API
#[must_use]
pub fn {{ model | snake }}_routes(api: ApiRouter) -> ApiRouter {
    api.resource::<{{ model }}>()
}
"#;

/// Integration tests over in-memory stores
pub const TEST_TEMPLATE: &str = r#"//! {{ model }} API tests

#[path = "{{ schema_path }}"]
mod {{ model | snake }}_schema;

use crudkit::prelude::*;
use crudkit::testing::TestApp;
use serde_json::json;
use {{ model | snake }}_schema::{{ model }};

fn app() -> TestApp {
    TestApp::new()
        .resource::<{{ model }}>()
{% if access == "admin" %}
        .as_caller(Caller::admin("admin-1"))
{% else %}
        .as_caller(Caller::user("user-1"))
{% endif %}
}

async fn create(app: &TestApp, body: serde_json::Value) -> Record {
    let response = app.call("{{ model | camel }}.create", body).await;
    assert_eq!(response.status.as_u16(), 200, "{:?}", response.body);
    response.json()
}

#[tokio::test]
async fn creates_and_gets_{{ model | snake }}() {
    let app = app();
    let created = create(&app, json!({ "name": "Zephyr" })).await;
    assert_eq!(created.name, "Zephyr");
    assert_eq!(created.status, "ACTIVE");

    let response = app.call("{{ model | camel }}.get", json!({ "id": created.id })).await;
    assert_eq!(response.status.as_u16(), 200);
    assert_eq!(response.json::<Record>(), created);
}

#[tokio::test]
async fn lists_{{ model | plural | snake }}_by_search() {
    let app = app();
    create(&app, json!({ "name": "Zephyr"{% if search_field != "name" %}, "{{ search_field }}": "{{ search_sample }}"{% endif %} })).await;
    create(&app, json!({ "name": "Quartz" })).await;

    let all: ListOutput<Record> = app.call("{{ model | camel }}.list", json!({})).await.json();
    assert_eq!(all.pagination.total, 2);

    let found: ListOutput<Record> = app
        .call("{{ model | camel }}.list", json!({ "search": "zephyr" }))
        .await
        .json();
    assert_eq!(found.pagination.total, 1);
    assert_eq!(found.items[0].name, "Zephyr");
}

#[tokio::test]
async fn rejects_invalid_input() {
    let app = app();
    let response = app.call("{{ model | camel }}.create", json!({ "name": "" })).await;
    assert_eq!(response.status.as_u16(), 400);
    assert_eq!(response.error_kind(), ErrorKind::ValidationError);

    let response = app.call("{{ model | camel }}.list", json!({ "limit": 101 })).await;
    assert_eq!(response.status.as_u16(), 400);
}

#[tokio::test]
async fn missing_{{ model | snake }}_is_not_found() {
    let app = app();
    let response = app
        .call("{{ model | camel }}.get", json!({ "id": "00000000-0000-0000-0000-000000000000" }))
        .await;
    assert_eq!(response.status.as_u16(), 404);
}

#[tokio::test]
async fn updates_{{ model | snake }}() {
    let app = app();
    let created = create(&app, json!({ "name": "Zephyr" })).await;

    let response = app
        .call(
            "{{ model | camel }}.update",
            json!({ "id": created.id, "data": { "description": "Updated" } }),
        )
        .await;
    assert_eq!(response.status.as_u16(), 200);

    let updated: Record = response.json();
    assert_eq!(updated.name, "Zephyr");
    assert_eq!(updated.description.as_deref(), Some("Updated"));
}
{% if soft_delete %}

#[tokio::test]
async fn soft_deletes_and_restores_{{ model | snake }}() {
    let app = app();
    let created = create(&app, json!({ "name": "Zephyr" })).await;

    let response = app.call("{{ model | camel }}.delete", json!({ "id": created.id })).await;
    assert_eq!(response.status.as_u16(), 200);
    assert_eq!(response.body["success"], true);

    let after = app.call("{{ model | camel }}.get", json!({ "id": created.id })).await;
{% if access == "admin" %}
    assert!(after.json::<Record>().deleted_at.is_some());
{% else %}
    assert_eq!(after.status.as_u16(), 404);
{% endif %}

    let restored = app.call("{{ model | camel }}.restore", json!({ "id": created.id })).await;
    assert_eq!(restored.status.as_u16(), 200);
    assert!(restored.json::<Record>().deleted_at.is_none());
}
{% else %}

#[tokio::test]
async fn hard_deletes_{{ model | snake }}() {
    let app = app();
    let created = create(&app, json!({ "name": "Zephyr" })).await;

    let response = app.call("{{ model | camel }}.delete", json!({ "id": created.id })).await;
    assert_eq!(response.status.as_u16(), 200);

    let gone = app.call("{{ model | camel }}.get", json!({ "id": created.id })).await;
    assert_eq!(gone.status.as_u16(), 404);

    let restore = app.call("{{ model | camel }}.restore", json!({ "id": created.id })).await;
    assert_eq!(restore.status.as_u16(), 404);
}
{% endif %}
{% if access == "admin" %}

#[tokio::test]
async fn requires_admin_role() {
    let app = app().as_caller(Caller::user("user-1"));
    let response = app.call("{{ model | camel }}.list", json!({})).await;
    assert_eq!(response.status.as_u16(), 403);
}
{% elif access == "protected" %}

#[tokio::test]
async fn requires_authentication() {
    let app = app().anonymous();
    let response = app.call("{{ model | camel }}.list", json!({})).await;
    assert_eq!(response.status.as_u16(), 401);
}
{% else %}

#[tokio::test]
async fn allows_anonymous_callers() {
    let app = app().anonymous();
    let response = app.call("{{ model | camel }}.list", json!({})).await;
    assert_eq!(response.status.as_u16(), 200);
}
{% endif %}
"#;

/// Table definition shown in the next-steps hint
pub const MIGRATION_TEMPLATE: &str = r"CREATE TABLE IF NOT EXISTS {{ table }} (
    id UUID PRIMARY KEY,
    name VARCHAR(255) NOT NULL,
    description VARCHAR(1000),
    email VARCHAR(255),
    status VARCHAR(50) NOT NULL DEFAULT 'ACTIVE',
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
{% if soft_delete %}
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    deleted_at TIMESTAMPTZ
);

CREATE INDEX IF NOT EXISTS idx_{{ table }}_deleted_at ON {{ table }} (deleted_at);
{% else %}
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
);
{% endif %}
CREATE INDEX IF NOT EXISTS idx_{{ table }}_created_at ON {{ table }} (created_at);
";

/// Template names and sources
pub const TEMPLATES: [(&str, &str); 5] = [
    ("schema", SCHEMA_TEMPLATE),
    ("service", SERVICE_TEMPLATE),
    ("router", ROUTER_TEMPLATE),
    ("test", TEST_TEMPLATE),
    ("migration", MIGRATION_TEMPLATE),
];

/// Compiled templates
pub struct TemplateRegistry {
    env: Environment<'static>,
}

impl TemplateRegistry {
    /// Compile the embedded templates
    ///
    /// # Errors
    ///
    /// Returns an error if a template does not parse
    pub fn new() -> Result<Self, TemplateError> {
        let mut env = Environment::new();
        env.set_auto_escape_callback(|_| AutoEscape::None);
        env.set_trim_blocks(true);
        env.set_lstrip_blocks(true);
        env.set_keep_trailing_newline(true);

        env.add_filter("pascal", |value: String| TemplateHelpers::to_pascal_case(&value));
        env.add_filter("camel", |value: String| TemplateHelpers::to_camel_case(&value));
        env.add_filter("kebab", |value: String| TemplateHelpers::to_kebab_case(&value));
        env.add_filter("snake", |value: String| TemplateHelpers::to_snake_case(&value));
        env.add_filter("plural", |value: String| TemplateHelpers::pluralize(&value));

        for (name, source) in TEMPLATES {
            env.add_template(name, source)
                .map_err(|source| TemplateError::Render {
                    name: name.to_string(),
                    source,
                })?;
        }

        Ok(Self { env })
    }

    /// Render a template
    ///
    /// # Errors
    ///
    /// Returns an error if the template is unknown or rendering fails
    pub fn render<S: Serialize>(&self, name: &str, ctx: &S) -> Result<String, TemplateError> {
        self.env
            .get_template(name)
            .and_then(|template| template.render(ctx))
            .map_err(|source| TemplateError::Render {
                name: name.to_string(),
                source,
            })
    }
}
