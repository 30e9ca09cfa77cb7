//! Request extractors for RPC handlers

use axum::{
    body::Bytes,
    extract::{FromRequest, FromRequestParts, Request},
};
use http::{request::Parts, HeaderMap, StatusCode};
use serde::de::DeserializeOwned;
use uuid::Uuid;

use super::AppState;
use crate::error::ApiError;
use crate::service::{Caller, Context, Role};

/// Header carrying the authenticated user id
pub const USER_ID_HEADER: &str = "x-user-id";

/// Header carrying the authenticated user's role
pub const USER_ROLE_HEADER: &str = "x-user-role";

/// Header carrying the request correlation id
pub const CORRELATION_ID_HEADER: &str = "x-correlation-id";

/// JSON procedure input
///
/// An empty body is read as `{}` so inputs with all-default fields can be
/// sent without one. Malformed JSON, unknown keys and wrong types are
/// `VALIDATION_ERROR`s; a body over the limit is one too, sent with status
/// 413. Field-level validation happens in the service.
#[derive(Debug, Clone, Copy, Default)]
pub struct RpcJson<T>(pub T);

impl<T, S> FromRequest<S> for RpcJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = Bytes::from_request(req, state).await.map_err(|err| {
            if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
                ApiError::payload_too_large(err.body_text())
            } else {
                ApiError::validation(format!("failed to read body: {err}"))
            }
        })?;

        let body: &[u8] = if bytes.iter().all(u8::is_ascii_whitespace) {
            b"{}"
        } else {
            &bytes
        };

        serde_json::from_slice(body)
            .map(Self)
            .map_err(|err| ApiError::validation(format!("invalid input: {err}")))
    }
}

/// Per-request [`Context`] built from identity headers
///
/// A missing or empty `x-user-id` yields an anonymous context. A missing
/// `x-user-role` means a regular user; an unrecognized role is rejected as
/// `UNAUTHORIZED`. Without `x-correlation-id` a fresh id is generated.
#[derive(Debug, Clone)]
pub struct RequestContext(pub Context);

impl FromRequestParts<AppState> for RequestContext {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let correlation_id = header(&parts.headers, CORRELATION_ID_HEADER)
            .map_or_else(|| Uuid::new_v4().to_string(), ToString::to_string);

        let mut ctx = Context::new(state.registry()).with_correlation_id(correlation_id);
        if let Some(caller) = caller_from_headers(&parts.headers)? {
            ctx = ctx.with_caller(caller);
        }

        Ok(Self(ctx))
    }
}

fn header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

fn caller_from_headers(headers: &HeaderMap) -> Result<Option<Caller>, ApiError> {
    let Some(user_id) = header(headers, USER_ID_HEADER) else {
        return Ok(None);
    };

    let role = match header(headers, USER_ROLE_HEADER) {
        Some(value) => value.parse::<Role>().map_err(|err| {
            ApiError::new(crate::error::ErrorKind::Unauthorized, err.to_string())
        })?,
        None => Role::User,
    };

    Ok(Some(Caller {
        user_id: user_id.to_string(),
        role,
    }))
}
