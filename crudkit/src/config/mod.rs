//! Configuration
//!
//! Configuration is layered with figment, highest priority first:
//!
//! 1. Environment variables (`CRUDKIT_` prefix, `__` for nesting)
//! 2. `./crudkit.toml`
//! 3. `~/.config/crudkit/{service}/config.toml`
//! 4. `/etc/crudkit/{service}/config.toml`
//! 5. Built-in defaults
//!
//! Example: `CRUDKIT_DATABASE__MAX_CONNECTIONS=20`.
//!
//! ```toml
//! [service]
//! name = "inventory"
//! bind = "0.0.0.0:8080"
//!
//! [database]
//! url = "postgres://app@localhost/inventory"
//! max_connections = 10
//!
//! [errors]
//! catalog = "config/errors.toml"
//!
//! [scaffold]
//! routers_dir = "src/routers"
//! lint_command = ["rustfmt", "--edition", "2021"]
//! ```

use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

const ENV_PREFIX: &str = "CRUDKIT_";
const LOCAL_CONFIG: &str = "crudkit.toml";

/// Service identity and listener
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceSettings {
    /// Service name, also used to locate config files
    pub name: String,
    /// Listen address
    pub bind: String,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            name: "crudkit".to_string(),
            bind: "127.0.0.1:3000".to_string(),
        }
    }
}

/// PostgreSQL pool settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseSettings {
    /// Connection URL
    pub url: String,
    /// Pool size
    pub max_connections: u32,
    /// Seconds to wait for a pooled connection
    pub acquire_timeout_secs: u64,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            url: "postgres://localhost/crudkit".to_string(),
            max_connections: 10,
            acquire_timeout_secs: 5,
        }
    }
}

impl DatabaseSettings {
    /// Acquire timeout as a Duration
    #[must_use]
    pub const fn acquire_timeout(&self) -> Duration {
        Duration::from_secs(self.acquire_timeout_secs)
    }
}

/// HTTP API settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiSettings {
    /// Largest accepted request body
    pub body_limit_bytes: usize,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            body_limit_bytes: 256 * 1024,
        }
    }
}

/// Error catalog location
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ErrorSettings {
    /// Catalog TOML file; the built-in catalog is used when unset
    pub catalog: Option<PathBuf>,
}

/// Code generator settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScaffoldSettings {
    /// Directory for generated routers
    pub routers_dir: PathBuf,
    /// Directory for generated services
    pub services_dir: PathBuf,
    /// Directory for generated schemas
    pub schemas_dir: PathBuf,
    /// Directory for generated tests
    pub tests_dir: PathBuf,
    /// Subtree scanned for placeholder markers
    pub source_root: PathBuf,
    /// Formatter run on generated files; the paths are appended
    pub lint_command: Vec<String>,
    /// Commit message; `{kebab}` is replaced by the kebab-case model name
    pub commit_message: String,
}

impl Default for ScaffoldSettings {
    fn default() -> Self {
        Self {
            routers_dir: PathBuf::from("src/routers"),
            services_dir: PathBuf::from("src/services"),
            schemas_dir: PathBuf::from("src/schemas"),
            tests_dir: PathBuf::from("tests"),
            source_root: PathBuf::from("src"),
            lint_command: vec![
                "rustfmt".to_string(),
                "--edition".to_string(),
                "2021".to_string(),
            ],
            commit_message: "chore(scaffold): add {kebab} api".to_string(),
        }
    }
}

/// Complete configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrudkitConfig {
    /// Service settings
    #[serde(default)]
    pub service: ServiceSettings,
    /// Database settings
    #[serde(default)]
    pub database: DatabaseSettings,
    /// API settings
    #[serde(default)]
    pub api: ApiSettings,
    /// Error catalog settings
    #[serde(default)]
    pub errors: ErrorSettings,
    /// Generator settings
    #[serde(default)]
    pub scaffold: ScaffoldSettings,
}

impl CrudkitConfig {
    /// Load configuration for a service from all layers
    ///
    /// # Errors
    ///
    /// Returns an error if a config file is malformed or a value has the wrong type
    pub fn load_for_service(service_name: &str) -> anyhow::Result<Self> {
        let mut figment = Self::defaults()?;

        let system_config = PathBuf::from("/etc/crudkit")
            .join(service_name)
            .join("config.toml");
        if system_config.exists() {
            figment = figment.merge(Toml::file(&system_config));
        }

        let user_config = Self::recommended_path(service_name);
        if user_config.exists() {
            figment = figment.merge(Toml::file(&user_config));
        }

        let local_config = PathBuf::from(LOCAL_CONFIG);
        if local_config.exists() {
            figment = figment.merge(Toml::file(&local_config));
        }

        figment = figment.merge(Env::prefixed(ENV_PREFIX).split("__").lowercase(true));

        Ok(figment.extract()?)
    }

    /// Load configuration from one file plus environment overrides
    ///
    /// A missing file leaves the defaults in place.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is malformed or a value has the wrong type
    pub fn load_from(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let config = Self::defaults()?
            .merge(Toml::file(path.as_ref()))
            .merge(Env::prefixed(ENV_PREFIX).split("__").lowercase(true))
            .extract()?;
        Ok(config)
    }

    fn defaults() -> anyhow::Result<Figment> {
        Ok(Figment::new().merge(Toml::string(&toml::to_string(&Self::default())?)))
    }

    /// User config path: `~/.config/crudkit/{service}/config.toml`
    #[must_use]
    pub fn recommended_path(service_name: &str) -> PathBuf {
        dirs::config_dir().map_or_else(
            || PathBuf::from(LOCAL_CONFIG),
            |config_dir| {
                config_dir
                    .join("crudkit")
                    .join(service_name)
                    .join("config.toml")
            },
        )
    }
}
