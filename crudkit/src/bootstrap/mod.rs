//! Process bootstrap
//!
//! [`App`] owns the process-wide pieces: configuration, the connection pool
//! and the store registry. The error catalog is installed on connect.

use anyhow::Context as _;
use axum::extract::DefaultBodyLimit;
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::FromRow;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::config::{CrudkitConfig, ErrorSettings};
use crate::error::{CatalogError, ErrorCatalog};
use crate::resource::Resource;
use crate::router::{ApiRouter, AppState};
use crate::store::{PgStore, StoreRegistry};

/// Install the configured error catalog, or keep the built-in one
///
/// A catalog whose keys differ from the error kinds is still installed;
/// the difference is logged.
///
/// # Errors
///
/// Returns an error if the configured file cannot be read or parsed
pub fn install_catalog(settings: &ErrorSettings) -> Result<(), CatalogError> {
    let Some(path) = &settings.catalog else {
        return Ok(());
    };

    let catalog = ErrorCatalog::load(path)?;
    let drift = catalog.drift();
    if !drift.is_clean() {
        warn!(
            path = %path.display(),
            missing = ?drift.missing,
            extra = ?drift.extra,
            "error catalog does not match error kinds"
        );
    }

    if catalog.install() {
        info!(path = %path.display(), "error catalog installed");
    } else {
        warn!("error catalog already installed, keeping the first one");
    }
    Ok(())
}

/// A running service's shared state
pub struct App {
    config: CrudkitConfig,
    pool: PgPool,
    registry: Arc<StoreRegistry>,
}

impl App {
    /// Install the error catalog and connect the database pool
    ///
    /// # Errors
    ///
    /// Returns an error if the catalog cannot be loaded or the database is unreachable
    pub async fn connect(config: CrudkitConfig) -> anyhow::Result<Self> {
        install_catalog(&config.errors)?;

        let pool = PgPoolOptions::new()
            .max_connections(config.database.max_connections)
            .acquire_timeout(config.database.acquire_timeout())
            .connect(&config.database.url)
            .await
            .context("failed to connect to database")?;

        info!(
            service = %config.service.name,
            max_connections = config.database.max_connections,
            "database pool ready"
        );

        Ok(Self {
            config,
            pool,
            registry: Arc::new(StoreRegistry::new()),
        })
    }

    /// Register a PostgreSQL store for a resource
    pub fn register<R>(&self)
    where
        R: Resource,
        R::Record: for<'r> FromRow<'r, PgRow>,
    {
        self.registry
            .register::<R>(Arc::new(PgStore::<R>::new(self.pool.clone())));
    }

    /// Loaded configuration
    #[must_use]
    pub const fn config(&self) -> &CrudkitConfig {
        &self.config
    }

    /// Connection pool
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Store registry
    #[must_use]
    pub fn registry(&self) -> Arc<StoreRegistry> {
        Arc::clone(&self.registry)
    }

    /// Serve the API until Ctrl-C or SIGTERM, then close the pool
    ///
    /// # Errors
    ///
    /// Returns an error if the listener cannot bind or the server fails
    pub async fn serve(self, api: ApiRouter) -> anyhow::Result<()> {
        for procedure in api.procedures() {
            tracing::debug!(procedure = %procedure, "route registered");
        }

        let router = api
            .into_router(AppState::new(self.registry()))
            .layer(DefaultBodyLimit::max(self.config.api.body_limit_bytes));

        let listener = TcpListener::bind(&self.config.service.bind)
            .await
            .with_context(|| format!("failed to bind {}", self.config.service.bind))?;
        info!(address = %self.config.service.bind, "listening");

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        info!("closing database connections");
        self.pool.close().await;
        Ok(())
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!(error = %err, "failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                warn!(error = %err, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    info!("shutdown signal received");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_catalog_configured() {
        assert!(install_catalog(&ErrorSettings::default()).is_ok());
    }

    #[test]
    fn test_unreadable_catalog() {
        let settings = ErrorSettings {
            catalog: Some("/nonexistent/errors.toml".into()),
        };
        assert!(matches!(
            install_catalog(&settings),
            Err(CatalogError::Io { .. })
        ));
    }
}
