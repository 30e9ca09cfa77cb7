//! Error message catalog
//!
//! Maps each [`ErrorKind`] name to the message shown to API clients. The
//! catalog can be loaded from TOML so deployments can localize messages:
//!
//! ```toml
//! [messages]
//! UNAUTHORIZED = "Authentication is required"
//! NOT_FOUND = "Resource not found"
//! ```
//!
//! The key set must equal the kind set; [`ErrorCatalog::drift`] reports any
//! difference and `crudkit verify` fails on it.

use once_cell::sync::{Lazy, OnceCell};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use thiserror::Error;

use super::ErrorKind;

static INSTALLED: OnceCell<ErrorCatalog> = OnceCell::new();
static BUILTIN: Lazy<ErrorCatalog> = Lazy::new(ErrorCatalog::default);

const LAST_RESORT: &str = "An unexpected error occurred";

/// Catalog loading errors
#[derive(Debug, Error)]
pub enum CatalogError {
    /// File could not be read
    #[error("Failed to read error catalog {path}: {source}")]
    Io {
        /// Catalog path
        path: String,
        /// Underlying error
        source: std::io::Error,
    },

    /// File is not valid catalog TOML
    #[error("Invalid error catalog: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Kind-to-message table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorCatalog {
    messages: BTreeMap<String, String>,
}

impl Default for ErrorCatalog {
    fn default() -> Self {
        let messages = [
            (ErrorKind::Unauthorized, "Authentication is required"),
            (ErrorKind::Forbidden, "You do not have permission to perform this action"),
            (ErrorKind::InvalidCredentials, "Email address or password is incorrect"),
            (ErrorKind::ValidationError, "The submitted input is invalid"),
            (ErrorKind::Conflict, "The resource conflicts with existing data"),
            (ErrorKind::NotFound, "Resource not found"),
            (ErrorKind::InternalError, "A system error occurred"),
        ]
        .into_iter()
        .map(|(kind, message)| (kind.as_str().to_string(), message.to_string()))
        .collect();

        Self { messages }
    }
}

impl ErrorCatalog {
    /// Build a catalog from explicit entries
    pub fn from_entries<K, V>(entries: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            messages: entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Parse a catalog from TOML text
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not a table with a `messages` table of strings
    pub fn from_toml_str(text: &str) -> Result<Self, CatalogError> {
        Ok(toml::from_str(text)?)
    }

    /// Load a catalog file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed
    pub fn load(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Serialize to TOML
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails
    pub fn to_toml_string(&self) -> Result<String, toml::ser::Error> {
        toml::to_string(self)
    }

    /// Message for a kind, falling back to the `INTERNAL_ERROR` message
    #[must_use]
    pub fn message(&self, kind: ErrorKind) -> &str {
        self.messages
            .get(kind.as_str())
            .or_else(|| self.messages.get(ErrorKind::InternalError.as_str()))
            .map_or(LAST_RESORT, String::as_str)
    }

    /// Catalog keys in sorted order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.messages.keys().map(String::as_str)
    }

    /// Compare catalog keys against the kind set
    #[must_use]
    pub fn drift(&self) -> CatalogDrift {
        let kinds: BTreeSet<&str> = ErrorKind::ALL.iter().map(|k| k.as_str()).collect();
        let keys: BTreeSet<&str> = self.keys().collect();

        CatalogDrift {
            missing: kinds.difference(&keys).map(|k| (*k).to_string()).collect(),
            extra: keys.difference(&kinds).map(|k| (*k).to_string()).collect(),
        }
    }

    /// Install as the process-wide catalog
    ///
    /// Returns `false` if a catalog was already installed.
    #[must_use = "a second install is ignored"]
    pub fn install(self) -> bool {
        INSTALLED.set(self).is_ok()
    }

    /// The installed catalog, or the built-in one
    pub fn global() -> &'static Self {
        INSTALLED.get().unwrap_or(&BUILTIN)
    }
}

/// Difference between catalog keys and error kinds
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogDrift {
    /// Kinds with no message
    pub missing: Vec<String>,
    /// Messages with no kind
    pub extra: Vec<String>,
}

impl CatalogDrift {
    /// No missing and no extra keys
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.missing.is_empty() && self.extra.is_empty()
    }
}
