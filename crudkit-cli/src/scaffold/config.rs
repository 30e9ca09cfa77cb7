//! Resolved scaffold configuration

use crudkit::resource::AccessTier;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::fmt;
use thiserror::Error;

use super::helpers::TemplateHelpers;

static PASCAL_CASE: Lazy<Regex> = Lazy::new(|| {
    #[allow(clippy::expect_used)]
    Regex::new(r"^[A-Z][a-zA-Z0-9]*$").expect("valid model name pattern")
});

/// Text columns of the standard record that `list` can search
pub const SEARCHABLE_COLUMNS: [&str; 4] = ["name", "description", "email", "status"];

/// Invalid scaffold input
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// Empty model name
    #[error("Model name is required")]
    EmptyModel,

    /// Model name is not PascalCase
    #[error("Model name must be PascalCase (e.g., Project, OrganizationMember): '{0}'")]
    InvalidModel(String),

    /// Searchable field is not a text column
    #[error("Unknown searchable field '{field}' (expected one of: {})", SEARCHABLE_COLUMNS.join(", "))]
    UnknownSearchField {
        /// Offending name
        field: String,
    },

    /// Empty searchable field list
    #[error("At least one searchable field is required")]
    NoSearchFields,
}

/// A validated PascalCase model name
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct ModelName(String);

impl ModelName {
    /// Validate a model name
    ///
    /// # Errors
    ///
    /// Returns an error if the name is empty or not `^[A-Z][a-zA-Z0-9]*$`
    pub fn parse(name: &str) -> Result<Self, ConfigError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ConfigError::EmptyModel);
        }
        if !PASCAL_CASE.is_match(name) {
            return Err(ConfigError::InvalidModel(name.to_string()));
        }
        Ok(Self(name.to_string()))
    }

    /// `PascalCase` form
    #[must_use]
    pub fn pascal(&self) -> &str {
        &self.0
    }

    /// camelCase form, used for file stems and RPC paths
    #[must_use]
    pub fn camel(&self) -> String {
        TemplateHelpers::to_camel_case(&self.0)
    }

    /// kebab-case form
    #[must_use]
    pub fn kebab(&self) -> String {
        TemplateHelpers::to_kebab_case(&self.0)
    }

    /// `snake_case` form, used for module names
    #[must_use]
    pub fn snake(&self) -> String {
        TemplateHelpers::to_snake_case(&self.0)
    }

    /// Table name
    #[must_use]
    pub fn table(&self) -> String {
        TemplateHelpers::to_table_name(&self.0)
    }
}

impl fmt::Display for ModelName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Parse a comma-separated searchable field list
///
/// Blank entries are ignored and duplicates dropped, keeping first occurrence order.
///
/// # Errors
///
/// Returns an error for names outside [`SEARCHABLE_COLUMNS`] or an empty list
pub fn parse_search_fields(list: &str) -> Result<Vec<String>, ConfigError> {
    let mut fields: Vec<String> = Vec::new();
    for field in list.split(',').map(str::trim).filter(|f| !f.is_empty()) {
        if !SEARCHABLE_COLUMNS.contains(&field) {
            return Err(ConfigError::UnknownSearchField {
                field: field.to_string(),
            });
        }
        if !fields.iter().any(|f| f == field) {
            fields.push(field.to_string());
        }
    }

    if fields.is_empty() {
        return Err(ConfigError::NoSearchFields);
    }
    Ok(fields)
}

/// Everything the emitter needs to render one resource
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScaffoldConfig {
    /// Model name
    pub model: ModelName,
    /// Access tier
    pub access: AccessTier,
    /// Soft delete instead of hard delete
    pub with_soft_delete: bool,
    /// Searched columns, in order
    pub searchable_fields: Vec<String>,
}
