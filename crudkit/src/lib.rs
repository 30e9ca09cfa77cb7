//! crudkit - generic CRUD services for scaffolded resources
//!
//! A resource is a marker type implementing [`resource::Resource`]. Given a
//! store registered for it, crudkit provides:
//!
//! - Paginated, searchable listing with strict input validation
//! - Create, update, soft delete, restore, and hard delete operations
//! - An RPC-style `axum` router with access tiers per resource
//! - A fixed error taxonomy with a message catalog
//!
//! # Example
//!
//! ```rust,no_run
//! use crudkit::prelude::*;
//!
//! struct Widget;
//!
//! impl Resource for Widget {
//!     type Record = Record;
//!     const NAME: &'static str = "Widget";
//!     const PATH: &'static str = "widget";
//!     const TABLE: &'static str = "widgets";
//!     const ACCESS: AccessTier = AccessTier::Protected;
//!     const SOFT_DELETE: bool = true;
//!     const SEARCH_FIELDS: &'static [&'static str] = &["name"];
//! }
//!
//! # async fn run() -> anyhow::Result<()> {
//! let config = CrudkitConfig::load_for_service("widgets")?;
//! let app = App::connect(config).await?;
//! app.register::<Widget>();
//! app.serve(ApiRouter::new().resource::<Widget>()).await?;
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]

pub mod bootstrap;
pub mod config;
pub mod error;
pub mod observability;
pub mod resource;
pub mod router;
pub mod service;
pub mod store;
pub mod testing;

/// Commonly used types
pub mod prelude {
    pub use crate::bootstrap::App;
    pub use crate::config::CrudkitConfig;
    pub use crate::error::{ApiError, ErrorCatalog, ErrorKind};
    pub use crate::resource::{
        AccessTier, CreateInput, ListInput, ListOutput, Record, Resource, UpdateData,
    };
    pub use crate::router::ApiRouter;
    pub use crate::service::{Caller, Context, CrudService, Role};
    pub use crate::store::{MemoryStore, PgStore, Store, StoreRegistry};
}
