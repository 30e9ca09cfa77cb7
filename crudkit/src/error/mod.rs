//! Error taxonomy and HTTP error mapping
//!
//! Every failure that crosses the service boundary is one of the seven
//! [`ErrorKind`]s. The HTTP layer turns an [`ApiError`] into a status code and
//! a message drawn from the installed [`ErrorCatalog`]; the internal detail
//! carried by the error is logged but never sent to the client.

pub mod catalog;

pub use catalog::{CatalogDrift, CatalogError, ErrorCatalog};

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::store::StoreError;

/// Symbolic error kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    /// Caller is not authenticated
    Unauthorized,
    /// Caller is authenticated but lacks the required tier
    Forbidden,
    /// Login attempt with a wrong email or password
    InvalidCredentials,
    /// Input failed shape or field validation
    ValidationError,
    /// Write conflicts with existing data
    Conflict,
    /// Record does not exist (or is soft-deleted for this caller)
    NotFound,
    /// Anything unexpected
    InternalError,
}

impl ErrorKind {
    /// All kinds, in catalog order
    pub const ALL: [Self; 7] = [
        Self::Unauthorized,
        Self::Forbidden,
        Self::InvalidCredentials,
        Self::ValidationError,
        Self::Conflict,
        Self::NotFound,
        Self::InternalError,
    ];

    /// Symbolic name used as the catalog key and in error bodies
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unauthorized => "UNAUTHORIZED",
            Self::Forbidden => "FORBIDDEN",
            Self::InvalidCredentials => "INVALID_CREDENTIALS",
            Self::ValidationError => "VALIDATION_ERROR",
            Self::Conflict => "CONFLICT",
            Self::NotFound => "NOT_FOUND",
            Self::InternalError => "INTERNAL_ERROR",
        }
    }

    /// Parse a symbolic name
    #[must_use]
    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == code)
    }

    /// HTTP status for this kind
    #[must_use]
    pub const fn status(self) -> StatusCode {
        match self {
            Self::Unauthorized | Self::InvalidCredentials => StatusCode::UNAUTHORIZED,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::ValidationError => StatusCode::BAD_REQUEST,
            Self::Conflict => StatusCode::CONFLICT,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Transport status class name
    #[must_use]
    pub const fn transport_code(self) -> &'static str {
        match self {
            Self::Unauthorized | Self::InvalidCredentials => "UNAUTHORIZED",
            Self::Forbidden => "FORBIDDEN",
            Self::ValidationError => "BAD_REQUEST",
            Self::Conflict => "CONFLICT",
            Self::NotFound => "NOT_FOUND",
            Self::InternalError => "INTERNAL_SERVER_ERROR",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned by services and handlers
#[derive(Debug, Error)]
#[error("{kind}: {detail}")]
pub struct ApiError {
    kind: ErrorKind,
    detail: String,
    status: Option<StatusCode>,
}

impl ApiError {
    /// Create an error of the given kind with an internal detail message
    pub fn new(kind: ErrorKind, detail: impl Into<String>) -> Self {
        Self {
            kind,
            detail: detail.into(),
            status: None,
        }
    }

    /// Caller is not authenticated
    #[must_use]
    pub fn unauthorized() -> Self {
        Self::new(ErrorKind::Unauthorized, "authentication required")
    }

    /// Caller lacks the required access tier
    pub fn forbidden(detail: impl Into<String>) -> Self {
        Self::new(ErrorKind::Forbidden, detail)
    }

    /// Invalid input
    pub fn validation(detail: impl Into<String>) -> Self {
        Self::new(ErrorKind::ValidationError, detail)
    }

    /// Request body over the configured limit
    ///
    /// Reported as a `VALIDATION_ERROR` with HTTP status 413.
    #[must_use]
    pub fn payload_too_large(detail: impl Into<String>) -> Self {
        Self {
            status: Some(StatusCode::PAYLOAD_TOO_LARGE),
            ..Self::validation(detail)
        }
    }

    /// Conflicting write
    pub fn conflict(detail: impl Into<String>) -> Self {
        Self::new(ErrorKind::Conflict, detail)
    }

    /// Missing record
    pub fn not_found(detail: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, detail)
    }

    /// Unexpected failure
    pub fn internal(detail: impl Into<String>) -> Self {
        Self::new(ErrorKind::InternalError, detail)
    }

    /// The symbolic kind
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// HTTP status sent to the client
    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.status.unwrap_or_else(|| self.kind.status())
    }

    /// Internal detail (never sent to clients)
    #[must_use]
    pub fn detail(&self) -> &str {
        &self.detail
    }

    /// User-facing message from the installed catalog
    #[must_use]
    pub fn message(&self) -> &'static str {
        ErrorCatalog::global().message(self.kind)
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        let kind = match &err {
            StoreError::UniqueViolation(_) | StoreError::ForeignKeyViolation(_) => {
                ErrorKind::Conflict
            }
            StoreError::RowNotFound => ErrorKind::NotFound,
            StoreError::Other(_) => ErrorKind::InternalError,
        };
        Self::new(kind, err.to_string())
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        Self::validation(format_validation_errors(&errors))
    }
}

/// Error response body
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorBody {
    /// Error payload
    pub error: ErrorPayload,
}

/// Error payload within [`ErrorBody`]
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorPayload {
    /// Symbolic kind
    pub code: ErrorKind,
    /// Catalog message
    pub message: String,
    /// Transport status class
    pub status: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self.kind {
            ErrorKind::InternalError => tracing::error!(error = %self, "internal error"),
            ErrorKind::Conflict => tracing::warn!(error = %self, "conflict"),
            ErrorKind::Unauthorized | ErrorKind::Forbidden | ErrorKind::InvalidCredentials => {
                tracing::info!(error = %self, "authorization error");
            }
            ErrorKind::ValidationError | ErrorKind::NotFound => {
                tracing::debug!(error = %self, "client error");
            }
        }

        let status = self.status();
        let transport = match self.status {
            Some(status) if status == StatusCode::PAYLOAD_TOO_LARGE => "PAYLOAD_TOO_LARGE",
            _ => self.kind.transport_code(),
        };
        let body = ErrorBody {
            error: ErrorPayload {
                code: self.kind,
                message: self.message().to_string(),
                status: transport.to_string(),
            },
        };

        (status, Json(body)).into_response()
    }
}

/// Format validation errors as `field: code` lines
#[must_use]
pub fn format_validation_errors(errors: &validator::ValidationErrors) -> String {
    let mut messages: Vec<String> = errors
        .field_errors()
        .into_iter()
        .flat_map(|(field, field_errors)| {
            field_errors.iter().map(move |error| {
                error.message.as_ref().map_or_else(
                    || format!("{field}: {}", error.code),
                    |message| format!("{field}: {message}"),
                )
            })
        })
        .collect();
    messages.sort();
    messages.join("\n")
}
