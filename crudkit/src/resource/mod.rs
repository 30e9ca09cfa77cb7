//! Resource definitions
//!
//! A resource is a zero-sized marker type that names a table, an access
//! tier, a delete policy and the fields searched by `list`. The record shape
//! is an associated type so a resource can bring its own columns; the
//! standard shape ([`Record`], [`CreateInput`], [`UpdateData`]) covers what
//! the scaffold generator emits.

pub mod schema;

pub use schema::{
    CreateInput, DeleteInput, DeleteOutput, GetInput, ListInput, ListOutput, PageInfo, Record,
    RestoreInput, SortField, SortOrder, UpdateData, UpdateInput, MAX_LIMIT,
};

use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;
use validator::Validate;

/// Caller-authorization level gating a resource's operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessTier {
    /// Anyone, authenticated or not
    Public,
    /// Any authenticated caller
    #[default]
    Protected,
    /// Callers with an admin role
    Admin,
}

impl AccessTier {
    /// All tiers in prompt order
    pub const ALL: [Self; 3] = [Self::Public, Self::Protected, Self::Admin];

    /// Lowercase name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Public => "public",
            Self::Protected => "protected",
            Self::Admin => "admin",
        }
    }
}

impl fmt::Display for AccessTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unknown access tier name
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("access must be one of: public, protected, admin (got '{0}')")]
pub struct ParseAccessTierError(pub String);

impl FromStr for AccessTier {
    type Err = ParseAccessTierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|tier| tier.as_str() == s)
            .ok_or_else(|| ParseAccessTierError(s.to_string()))
    }
}

/// Column value used when writing to a SQL store
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// Nullable text
    Text(Option<String>),
    /// Nullable boolean
    Bool(Option<bool>),
    /// Nullable integer
    Int(Option<i64>),
    /// Nullable timestamp
    Timestamp(Option<DateTime<Utc>>),
}

/// Input types that can be written as a list of columns
pub trait Columns {
    /// Column name and value pairs, in a stable order
    fn columns(&self) -> Vec<(&'static str, FieldValue)>;
}

/// Shape of a stored record and its write inputs
pub trait RecordShape: Clone + Send + Sync + Serialize + DeserializeOwned + Unpin + 'static {
    /// Create input (server-assigned fields excluded)
    type Create: Columns + Validate + DeserializeOwned + Serialize + Clone + Send + Sync + 'static;
    /// Partial update input
    type Update: Columns + Validate + DeserializeOwned + Serialize + Clone + Send + Sync + 'static;

    /// Record id
    fn id(&self) -> Uuid;

    /// Creation timestamp
    fn created_at(&self) -> DateTime<Utc>;

    /// Last update timestamp
    fn updated_at(&self) -> DateTime<Utc>;

    /// Soft-delete marker
    fn deleted_at(&self) -> Option<DateTime<Utc>>;

    /// Set or clear the soft-delete marker
    fn set_deleted_at(&mut self, at: Option<DateTime<Utc>>);

    /// Text value of a column, for search and sorting in memory
    fn text(&self, column: &str) -> Option<&str>;

    /// Build a new record from create input and server-assigned values
    fn from_create(id: Uuid, input: Self::Create, now: DateTime<Utc>) -> Self;

    /// Merge a partial update
    fn apply_update(&mut self, patch: Self::Update, now: DateTime<Utc>);
}

/// A CRUD resource
pub trait Resource: Send + Sync + 'static {
    /// Stored record type
    type Record: RecordShape;

    /// PascalCase model name
    const NAME: &'static str;

    /// camelCase path segment used in RPC routes
    const PATH: &'static str;

    /// SQL table name
    const TABLE: &'static str;

    /// Access tier for every operation
    const ACCESS: AccessTier;

    /// Whether `delete` marks records instead of removing them
    const SOFT_DELETE: bool;

    /// Text columns searched by `list`
    const SEARCH_FIELDS: &'static [&'static str];
}

/// Create input of a resource
pub type CreateOf<R> = <<R as Resource>::Record as RecordShape>::Create;

/// Update input of a resource
pub type UpdateOf<R> = <<R as Resource>::Record as RecordShape>::Update;
