//! crudkit CLI tool

#![forbid(unsafe_code)]
#![deny(clippy::all, clippy::pedantic, clippy::nursery)]
#![warn(clippy::cargo)]
#![allow(clippy::cognitive_complexity)]
#![allow(clippy::multiple_crate_versions)]

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use crudkit::config::CrudkitConfig;
use crudkit::observability::env_filter;
use crudkit::resource::AccessTier;
use crudkit_cli::commands::{GenCommand, ScaffoldCommand, VerifyCommand};
use crudkit_cli::scaffold::ScaffoldArgs;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "crudkit")]
#[command(version)]
#[command(about = "Scaffold CRUD resources and check for drift", long_about = None)]
struct Cli {
    /// Configuration file (defaults to the layered lookup)
    #[arg(long, global = true, env = "CRUDKIT_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate, format and commit a resource
    Gen {
        /// Model name (`PascalCase`, e.g., `Project`, `OrganizationMember`)
        model: String,
        /// Access level
        #[arg(long, default_value = "protected")]
        access: AccessTier,
        /// Hard delete instead of soft delete
        #[arg(long)]
        no_soft_delete: bool,
        /// Searchable fields (comma-separated)
        #[arg(long)]
        fields: Option<String>,
        /// Skip commit hooks (only honored when CI is set)
        #[arg(long)]
        no_verify: bool,
        /// Overwrite existing files
        #[arg(long)]
        force: bool,
        /// Write files without committing
        #[arg(long)]
        no_commit: bool,
    },
    /// Generate a resource; prompts unless --model is given
    Scaffold {
        /// Model name; enables non-interactive mode
        #[arg(long)]
        model: Option<String>,
        /// Access level: public, protected or admin
        #[arg(long)]
        access: Option<String>,
        /// Soft delete: `true` or `1` enable it
        #[arg(long)]
        with_soft_delete: Option<String>,
        /// Searchable fields (comma-separated, default `name`)
        #[arg(long)]
        searchable_fields: Option<String>,
        /// Overwrite existing files
        #[arg(long)]
        force: bool,
    },
    /// Check for placeholder markers and error catalog drift
    Verify {
        /// Source tree to scan (defaults to the configured source root)
        #[arg(long)]
        root: Option<PathBuf>,
        /// Error catalog file (defaults to the configured catalog)
        #[arg(long)]
        catalog: Option<PathBuf>,
    },
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter("warn"))
        .with_writer(std::io::stderr)
        .compact()
        .try_init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing();

    let config = match &cli.config {
        Some(path) => CrudkitConfig::load_from(path),
        None => CrudkitConfig::load_for_service("crudkit"),
    }
    .context("Failed to load configuration")?;

    let root = std::env::current_dir().context("Failed to get current directory")?;

    match cli.command {
        Commands::Gen {
            model,
            access,
            no_soft_delete,
            fields,
            no_verify,
            force,
            no_commit,
        } => {
            let cmd = GenCommand {
                model,
                access,
                soft_delete: !no_soft_delete,
                fields,
                no_verify,
                force,
                no_commit,
            };
            cmd.execute(&root, &config.scaffold)?;
        }
        Commands::Scaffold {
            model,
            access,
            with_soft_delete,
            searchable_fields,
            force,
        } => {
            let args = ScaffoldArgs {
                model,
                access,
                with_soft_delete,
                searchable_fields,
            };
            ScaffoldCommand::new(args, force).execute(&root, &config.scaffold)?;
        }
        Commands::Verify { root: scan_root, catalog } => {
            let scan_root = scan_root.unwrap_or_else(|| root.join(&config.scaffold.source_root));
            let catalog = catalog.or_else(|| config.errors.catalog.clone());
            VerifyCommand::new(scan_root, catalog).execute()?;
        }
    }

    Ok(())
}
