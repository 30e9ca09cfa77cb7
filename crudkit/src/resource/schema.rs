//! Standard record shape and RPC input/output types
//!
//! JSON field names are camelCase. All inputs reject unknown keys, so a
//! create input carrying `id`, `createdAt` or `updatedAt` fails validation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError, ValidationErrors};

use super::{Columns, FieldValue, RecordShape};

/// Largest accepted page size
pub const MAX_LIMIT: u32 = 100;

const DEFAULT_LIMIT: u32 = 20;
const DEFAULT_STATUS: &str = "ACTIVE";
const MAX_NAME_LENGTH: usize = 255;
const MAX_DESCRIPTION_LENGTH: usize = 1000;
const MAX_STATUS_LENGTH: usize = 50;

/// A stored record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    /// Server-assigned id
    pub id: Uuid,
    /// Display name
    pub name: String,
    /// Free-form description
    pub description: Option<String>,
    /// Contact email
    pub email: Option<String>,
    /// Status label
    pub status: String,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Last update time
    pub updated_at: DateTime<Utc>,
    /// Soft-delete marker
    #[sqlx(default)]
    #[serde(default)]
    pub deleted_at: Option<DateTime<Utc>>,
}

fn default_status() -> String {
    DEFAULT_STATUS.to_string()
}

/// Create input: the record without server-assigned fields
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CreateInput {
    /// Display name
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    /// Free-form description
    #[serde(default)]
    #[validate(length(max = 1000))]
    pub description: Option<String>,
    /// Contact email
    #[serde(default)]
    #[validate(email)]
    pub email: Option<String>,
    /// Status label
    #[serde(default = "default_status")]
    #[validate(length(min = 1, max = 50))]
    pub status: String,
}

impl CreateInput {
    /// Create input with only a name
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            email: None,
            status: default_status(),
        }
    }
}

impl Columns for CreateInput {
    fn columns(&self) -> Vec<(&'static str, FieldValue)> {
        vec![
            ("name", FieldValue::Text(Some(self.name.clone()))),
            ("description", FieldValue::Text(self.description.clone())),
            ("email", FieldValue::Text(self.email.clone())),
            ("status", FieldValue::Text(Some(self.status.clone()))),
        ]
    }
}

// Present-but-null becomes `Some(None)`; absent stays `None` via `#[serde(default)]`.
fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Partial update of a [`CreateInput`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UpdateData {
    /// New name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// New description; `Some(None)` clears it
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub description: Option<Option<String>>,
    /// New email; `Some(None)` clears it
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub email: Option<Option<String>>,
    /// New status
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

impl UpdateData {
    /// No field is set
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.email.is_none()
            && self.status.is_none()
    }
}

fn check_length(
    errors: &mut ValidationErrors,
    field: &'static str,
    value: &str,
    min: usize,
    max: usize,
) {
    let len = value.chars().count();
    if len < min || len > max {
        errors.add(field, ValidationError::new("length"));
    }
}

impl Validate for UpdateData {
    fn validate(&self) -> Result<(), ValidationErrors> {
        #[derive(Validate)]
        struct EmailValidator<'a> {
            #[validate(email)]
            email: &'a str,
        }

        let mut errors = ValidationErrors::new();

        if let Some(name) = &self.name {
            check_length(&mut errors, "name", name, 1, MAX_NAME_LENGTH);
        }
        if let Some(Some(description)) = &self.description {
            check_length(&mut errors, "description", description, 0, MAX_DESCRIPTION_LENGTH);
        }
        if let Some(Some(email)) = &self.email {
            if (EmailValidator { email }).validate().is_err() {
                errors.add("email", ValidationError::new("email"));
            }
        }
        if let Some(status) = &self.status {
            check_length(&mut errors, "status", status, 1, MAX_STATUS_LENGTH);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

impl Columns for UpdateData {
    fn columns(&self) -> Vec<(&'static str, FieldValue)> {
        let mut columns = Vec::new();
        if let Some(name) = &self.name {
            columns.push(("name", FieldValue::Text(Some(name.clone()))));
        }
        if let Some(description) = &self.description {
            columns.push(("description", FieldValue::Text(description.clone())));
        }
        if let Some(email) = &self.email {
            columns.push(("email", FieldValue::Text(email.clone())));
        }
        if let Some(status) = &self.status {
            columns.push(("status", FieldValue::Text(Some(status.clone()))));
        }
        columns
    }
}

impl RecordShape for Record {
    type Create = CreateInput;
    type Update = UpdateData;

    fn id(&self) -> Uuid {
        self.id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    fn deleted_at(&self) -> Option<DateTime<Utc>> {
        self.deleted_at
    }

    fn set_deleted_at(&mut self, at: Option<DateTime<Utc>>) {
        self.deleted_at = at;
    }

    fn text(&self, column: &str) -> Option<&str> {
        match column {
            "name" => Some(&self.name),
            "description" => self.description.as_deref(),
            "email" => self.email.as_deref(),
            "status" => Some(&self.status),
            _ => None,
        }
    }

    fn from_create(id: Uuid, input: CreateInput, now: DateTime<Utc>) -> Self {
        Self {
            id,
            name: input.name,
            description: input.description,
            email: input.email,
            status: input.status,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }

    fn apply_update(&mut self, patch: UpdateData, now: DateTime<Utc>) {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(description) = patch.description {
            self.description = description;
        }
        if let Some(email) = patch.email {
            self.email = email;
        }
        if let Some(status) = patch.status {
            self.status = status;
        }
        self.updated_at = now;
    }
}

/// Sortable columns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortField {
    /// Creation time
    #[default]
    CreatedAt,
    /// Last update time
    UpdatedAt,
    /// Name
    Name,
}

impl SortField {
    /// SQL column name
    #[must_use]
    pub const fn column(self) -> &'static str {
        match self {
            Self::CreatedAt => "created_at",
            Self::UpdatedAt => "updated_at",
            Self::Name => "name",
        }
    }
}

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    /// Ascending
    Asc,
    /// Descending
    #[default]
    Desc,
}

impl SortOrder {
    /// SQL keyword
    #[must_use]
    pub const fn as_sql(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

const fn default_page() -> u32 {
    1
}

const fn default_limit() -> u32 {
    DEFAULT_LIMIT
}

/// `list` input
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ListInput {
    /// 1-based page number
    #[serde(default = "default_page")]
    #[validate(range(min = 1))]
    pub page: u32,
    /// Page size
    #[serde(default = "default_limit")]
    #[validate(range(min = 1, max = 100))]
    pub limit: u32,
    /// Case-insensitive substring matched against the resource's search fields
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, max = 255))]
    pub search: Option<String>,
    /// Sort column
    #[serde(default)]
    pub sort_by: SortField,
    /// Sort direction
    #[serde(default)]
    pub sort_order: SortOrder,
    /// Include soft-deleted records (admin callers only)
    #[serde(default)]
    pub include_deleted: bool,
}

impl Default for ListInput {
    fn default() -> Self {
        Self {
            page: default_page(),
            limit: default_limit(),
            search: None,
            sort_by: SortField::default(),
            sort_order: SortOrder::default(),
            include_deleted: false,
        }
    }
}

impl ListInput {
    /// Input for a given page
    #[must_use]
    pub fn page(page: u32, limit: u32) -> Self {
        Self {
            page,
            limit,
            ..Self::default()
        }
    }

    /// Rows skipped before this page
    #[must_use]
    pub fn offset(&self) -> u64 {
        u64::from(self.page.saturating_sub(1)) * u64::from(self.limit)
    }
}

/// Pagination summary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    /// Requested page
    pub page: u32,
    /// Requested page size
    pub limit: u32,
    /// Matching rows across all pages
    pub total: u64,
    /// `ceil(total / limit)`
    pub total_pages: u64,
}

impl PageInfo {
    /// Compute the summary for a page
    #[must_use]
    pub fn new(page: u32, limit: u32, total: u64) -> Self {
        let total_pages = if limit == 0 {
            0
        } else {
            total.div_ceil(u64::from(limit))
        };
        Self {
            page,
            limit,
            total,
            total_pages,
        }
    }
}

/// `list` output
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListOutput<T> {
    /// Records on this page
    pub items: Vec<T>,
    /// Pagination summary
    pub pagination: PageInfo,
}

/// `get` input
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GetInput {
    /// Record id
    pub id: Uuid,
}

/// `update` input
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateInput<D> {
    /// Record id
    pub id: Uuid,
    /// Fields to change
    pub data: D,
}

/// `delete` input
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DeleteInput {
    /// Record id
    pub id: Uuid,
}

/// `restore` input
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RestoreInput {
    /// Record id
    pub id: Uuid,
}

/// `delete` output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteOutput {
    /// Always `true` on success
    pub success: bool,
    /// Deleted record id
    pub id: Uuid,
}
