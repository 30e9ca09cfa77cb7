//! Test helpers
//!
//! [`TestApp`] wires resources to in-memory stores and drives the RPC router
//! with `tower::ServiceExt::oneshot`, so handler tests need no database or
//! listener.
//!
//! ```rust,no_run
//! use crudkit::prelude::*;
//! use crudkit::testing::TestApp;
//! use serde_json::json;
//!
//! # struct Widget;
//! # impl Resource for Widget {
//! #     type Record = Record;
//! #     const NAME: &'static str = "Widget";
//! #     const PATH: &'static str = "widget";
//! #     const TABLE: &'static str = "widgets";
//! #     const ACCESS: AccessTier = AccessTier::Public;
//! #     const SOFT_DELETE: bool = true;
//! #     const SEARCH_FIELDS: &'static [&'static str] = &["name"];
//! # }
//! # async fn example() {
//! let app = TestApp::new().resource::<Widget>();
//! let response = app.call("widget.create", json!({ "name": "Bolt" })).await;
//! assert_eq!(response.status, 200);
//! # }
//! ```

use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

use crate::error::{ErrorBody, ErrorKind};
use crate::resource::Resource;
use crate::router::{ApiRouter, AppState, CORRELATION_ID_HEADER, USER_ID_HEADER, USER_ROLE_HEADER};
use crate::service::{Caller, Context};
use crate::store::{MemoryStore, StoreRegistry};

/// Router over in-memory stores
#[derive(Clone, Default)]
pub struct TestApp {
    registry: Arc<StoreRegistry>,
    api: ApiRouter,
    caller: Option<Caller>,
}

impl TestApp {
    /// App with no resources and no caller
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve a resource from a fresh [`MemoryStore`]
    #[must_use]
    pub fn resource<R: Resource>(mut self) -> Self {
        self.registry
            .register::<R>(Arc::new(MemoryStore::<R>::new()));
        self.api = self.api.resource::<R>();
        self
    }

    /// Send later calls as this caller
    #[must_use]
    pub fn as_caller(mut self, caller: Caller) -> Self {
        self.caller = Some(caller);
        self
    }

    /// Send later calls without identity headers
    #[must_use]
    pub fn anonymous(mut self) -> Self {
        self.caller = None;
        self
    }

    /// Service context matching this app's registry and caller
    #[must_use]
    pub fn context(&self) -> Context {
        let ctx = Context::new(Arc::clone(&self.registry));
        match &self.caller {
            Some(caller) => ctx.with_caller(caller.clone()),
            None => ctx,
        }
    }

    /// The finished router
    #[must_use]
    pub fn router(&self) -> Router {
        self.api
            .clone()
            .into_router(AppState::new(Arc::clone(&self.registry)))
    }

    /// Call a procedure such as `widget.list` with a JSON body
    ///
    /// # Panics
    ///
    /// Panics if the request cannot be built or the body is not JSON
    pub async fn call(&self, procedure: &str, body: Value) -> TestResponse {
        self.call_raw(procedure, Body::from(body.to_string())).await
    }

    /// Call a procedure with a raw body
    ///
    /// # Panics
    ///
    /// Panics if the request cannot be built or the body is not JSON
    pub async fn call_raw(&self, procedure: &str, body: Body) -> TestResponse {
        let mut request = Request::builder()
            .method(Method::POST)
            .uri(format!("/rpc/{procedure}"))
            .header("content-type", "application/json")
            .header(CORRELATION_ID_HEADER, "test-correlation-id");

        if let Some(caller) = &self.caller {
            request = request
                .header(USER_ID_HEADER, caller.user_id.as_str())
                .header(USER_ROLE_HEADER, caller.role.as_str());
        }

        let response = self
            .router()
            .oneshot(request.body(body).expect("request"))
            .await
            .expect("infallible");

        let status = response.status();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("body")
            .to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("JSON response body")
        };

        TestResponse { status, body }
    }
}

/// Status and JSON body of a call
#[derive(Debug, Clone)]
pub struct TestResponse {
    /// HTTP status
    pub status: StatusCode,
    /// Parsed body
    pub body: Value,
}

impl TestResponse {
    /// Deserialize the body
    ///
    /// # Panics
    ///
    /// Panics if the body does not have the requested shape
    #[must_use]
    pub fn json<T: DeserializeOwned>(&self) -> T {
        serde_json::from_value(self.body.clone()).expect("response shape")
    }

    /// Error kind of an error response
    ///
    /// # Panics
    ///
    /// Panics if the body is not an error body
    #[must_use]
    pub fn error_kind(&self) -> ErrorKind {
        self.json::<ErrorBody>().error.code
    }
}
