//! RPC-style HTTP router
//!
//! Each resource gets `POST /rpc/{path}.{procedure}` endpoints taking and
//! returning JSON:
//!
//! | Procedure | Input | Output |
//! |-----------|-------|--------|
//! | `list` | [`ListInput`] | [`ListOutput`] |
//! | `get` | [`GetInput`] | record |
//! | `create` | create input | record |
//! | `update` | [`UpdateInput`] | record |
//! | `delete` | [`DeleteInput`] | [`DeleteOutput`] |
//! | `restore` | [`RestoreInput`] (soft-delete resources only) | record |
//!
//! The caller's access tier is checked before the body is read.

mod extract;

pub use extract::{
    RequestContext, RpcJson, CORRELATION_ID_HEADER, USER_ID_HEADER, USER_ROLE_HEADER,
};

use axum::{routing::post, Json, Router};
use std::sync::Arc;

use crate::error::ApiError;
use crate::resource::{
    CreateOf, DeleteInput, DeleteOutput, GetInput, ListInput, ListOutput, Resource, RestoreInput,
    UpdateInput, UpdateOf,
};
use crate::service::{Context, CrudService};
use crate::store::StoreRegistry;

/// State shared by all RPC handlers
#[derive(Debug, Clone)]
pub struct AppState {
    registry: Arc<StoreRegistry>,
}

impl AppState {
    /// State over a store registry
    #[must_use]
    pub const fn new(registry: Arc<StoreRegistry>) -> Self {
        Self { registry }
    }

    /// Shared registry
    #[must_use]
    pub fn registry(&self) -> Arc<StoreRegistry> {
        Arc::clone(&self.registry)
    }
}

/// Builder collecting resource routes
#[derive(Clone, Default)]
pub struct ApiRouter {
    router: Router<AppState>,
    procedures: Vec<String>,
}

impl ApiRouter {
    /// Router with no resources
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add the procedures of a resource
    #[must_use]
    pub fn resource<R: Resource>(mut self) -> Self {
        let mut router = self
            .router
            .route(&rpc_path::<R>("list"), post(list::<R>))
            .route(&rpc_path::<R>("get"), post(get::<R>))
            .route(&rpc_path::<R>("create"), post(create::<R>))
            .route(&rpc_path::<R>("update"), post(update::<R>))
            .route(&rpc_path::<R>("delete"), post(delete::<R>));
        let mut names = vec!["list", "get", "create", "update", "delete"];

        if R::SOFT_DELETE {
            router = router.route(&rpc_path::<R>("restore"), post(restore::<R>));
            names.push("restore");
        }

        self.router = router;
        self.procedures
            .extend(names.into_iter().map(|name| format!("{}.{name}", R::PATH)));
        self
    }

    /// Registered procedure names, e.g. `widget.list`
    #[must_use]
    pub fn procedures(&self) -> &[String] {
        &self.procedures
    }

    /// Finish with shared state
    ///
    /// Unknown paths answer with a `NOT_FOUND` error body.
    pub fn into_router(self, state: AppState) -> Router {
        self.router
            .fallback(|| async { ApiError::not_found("no such procedure") })
            .with_state(state)
    }
}

fn rpc_path<R: Resource>(procedure: &str) -> String {
    format!("/rpc/{}.{procedure}", R::PATH)
}

// Runs before the body is parsed.
fn authorized<R: Resource>(ctx: &Context) -> Result<CrudService<R>, ApiError> {
    let service = CrudService::<R>::new(ctx)?;
    service.authorize()?;
    Ok(service)
}

async fn list<R: Resource>(
    RequestContext(ctx): RequestContext,
    input: Result<RpcJson<ListInput>, ApiError>,
) -> Result<Json<ListOutput<R::Record>>, ApiError> {
    let service = authorized::<R>(&ctx)?;
    let RpcJson(input) = input?;
    Ok(Json(service.list(input).await?))
}

async fn get<R: Resource>(
    RequestContext(ctx): RequestContext,
    input: Result<RpcJson<GetInput>, ApiError>,
) -> Result<Json<R::Record>, ApiError> {
    let service = authorized::<R>(&ctx)?;
    let RpcJson(input) = input?;
    Ok(Json(service.get(input.id).await?))
}

async fn create<R: Resource>(
    RequestContext(ctx): RequestContext,
    input: Result<RpcJson<CreateOf<R>>, ApiError>,
) -> Result<Json<R::Record>, ApiError> {
    let service = authorized::<R>(&ctx)?;
    let RpcJson(input) = input?;
    Ok(Json(service.create(input).await?))
}

async fn update<R: Resource>(
    RequestContext(ctx): RequestContext,
    input: Result<RpcJson<UpdateInput<UpdateOf<R>>>, ApiError>,
) -> Result<Json<R::Record>, ApiError> {
    let service = authorized::<R>(&ctx)?;
    let RpcJson(input) = input?;
    Ok(Json(service.update(input.id, input.data).await?))
}

async fn delete<R: Resource>(
    RequestContext(ctx): RequestContext,
    input: Result<RpcJson<DeleteInput>, ApiError>,
) -> Result<Json<DeleteOutput>, ApiError> {
    let service = authorized::<R>(&ctx)?;
    let RpcJson(input) = input?;
    Ok(Json(service.delete(input.id).await?))
}

async fn restore<R: Resource>(
    RequestContext(ctx): RequestContext,
    input: Result<RpcJson<RestoreInput>, ApiError>,
) -> Result<Json<R::Record>, ApiError> {
    let service = authorized::<R>(&ctx)?;
    let RpcJson(input) = input?;
    Ok(Json(service.restore(input.id).await?))
}
