//! Logging setup
//!
//! One global `tracing` subscriber per process. Filtering follows `RUST_LOG`;
//! without it debug builds log `debug,crudkit=trace` and release builds `info`.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn default_directives() -> &'static str {
    if cfg!(debug_assertions) {
        "debug,crudkit=trace"
    } else {
        "info"
    }
}

/// Filter from `RUST_LOG`, or the given directives
#[must_use]
pub fn env_filter(fallback: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback))
}

/// Install the global subscriber
///
/// Pretty output in debug builds, JSON lines in release builds.
///
/// ```rust,no_run
/// # fn main() -> anyhow::Result<()> {
/// crudkit::observability::init()?;
/// tracing::info!("service starting");
/// # Ok(())
/// # }
/// ```
///
/// # Errors
///
/// Returns an error if a global subscriber is already installed
pub fn init() -> anyhow::Result<()> {
    let filter = env_filter(default_directives());

    #[cfg(debug_assertions)]
    {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().pretty())
            .try_init()?;
    }

    #[cfg(not(debug_assertions))]
    {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .try_init()?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_init_fails() {
        let _ = init();
        assert!(init().is_err());
    }
}
