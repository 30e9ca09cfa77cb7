//! Renders and writes the files for one resource
//!
//! Four files are produced for a model, at paths derived from its camelCase
//! name:
//! - Schema (`{schemas_dir}/{camel}.rs`)
//! - Service (`{services_dir}/{camel}.rs`)
//! - Router (`{routers_dir}/{camel}.rs`)
//! - Tests (`{tests_dir}/{camel}_test.rs`)

use crudkit::config::ScaffoldSettings;
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

use super::config::ScaffoldConfig;
use super::helpers::TemplateHelpers;
use super::resolver::{Prompter, ResolveError};
use super::templates::{TemplateError, TemplateRegistry};

/// Emitter failures
#[derive(Debug, Error)]
pub enum EmitError {
    /// Rendering failed
    #[error(transparent)]
    Template(#[from] TemplateError),

    /// Target files already exist
    #[error("Refusing to overwrite existing files (use --force):{}", list_paths(.0))]
    Conflicts(Vec<PathBuf>),

    /// File could not be written
    #[error("Failed to write {path}: {source}")]
    Io {
        /// Target path
        path: PathBuf,
        /// Underlying error
        source: std::io::Error,
    },

    /// Files absent after writing
    #[error("Generated files are missing:{}", list_paths(.0))]
    Missing(Vec<PathBuf>),

    /// Overwrite confirmation failed
    #[error(transparent)]
    Prompt(#[from] ResolveError),
}

fn list_paths(paths: &[PathBuf]) -> String {
    paths.iter().fold(String::new(), |mut out, path| {
        let _ = write!(out, "\n  {}", path.display());
        out
    })
}

/// What to do when a target file already exists
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverwritePolicy {
    /// Overwrite without asking
    Force,
    /// Ask the operator
    Confirm,
    /// Fail and list the files
    Refuse,
}

/// Represents a generated file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedFile {
    /// Relative path from project root
    pub path: PathBuf,
    /// File content
    pub content: String,
    /// File description for user feedback
    pub description: String,
}

/// Resource file generator
pub struct ScaffoldEmitter {
    config: ScaffoldConfig,
    settings: ScaffoldSettings,
    templates: TemplateRegistry,
}

impl ScaffoldEmitter {
    /// Create an emitter for one resource
    ///
    /// # Errors
    ///
    /// Returns an error if the embedded templates fail to compile
    pub fn new(config: ScaffoldConfig, settings: ScaffoldSettings) -> Result<Self, EmitError> {
        Ok(Self {
            config,
            settings,
            templates: TemplateRegistry::new()?,
        })
    }

    /// Resolved configuration
    #[must_use]
    pub const fn config(&self) -> &ScaffoldConfig {
        &self.config
    }

    /// Target paths, relative to the project root, in generation order
    #[must_use]
    pub fn paths(&self) -> [PathBuf; 4] {
        let camel = self.config.model.camel();
        [
            self.settings.schemas_dir.join(format!("{camel}.rs")),
            self.settings.services_dir.join(format!("{camel}.rs")),
            self.settings.routers_dir.join(format!("{camel}.rs")),
            self.settings.tests_dir.join(format!("{camel}_test.rs")),
        ]
    }

    fn metadata(&self) -> serde_json::Value {
        let [schema_path, ..] = self.paths();
        let schema_from_tests = TemplateHelpers::relative_path(&self.settings.tests_dir, &schema_path);

        let search_field = self
            .config
            .searchable_fields
            .first()
            .map_or("name", String::as_str);
        let search_sample = if search_field == "email" {
            "zephyr@example.com"
        } else {
            "Zephyr"
        };

        serde_json::json!({
            "model": self.config.model.pascal(),
            "table": self.config.model.table(),
            "access": self.config.access.as_str(),
            "soft_delete": self.config.with_soft_delete,
            "search_fields": self.config.searchable_fields,
            "search_field": search_field,
            "search_sample": search_sample,
            "schema_path": schema_from_tests.to_string_lossy().replace('\\', "/"),
        })
    }

    /// Render all four files
    ///
    /// # Errors
    ///
    /// Returns an error if rendering fails
    pub fn generate(&self) -> Result<Vec<GeneratedFile>, EmitError> {
        let metadata = self.metadata();
        let model = self.config.model.pascal();
        let [schema, service, router, test] = self.paths();

        let files = [
            (schema, "schema", format!("Resource definition for {model}")),
            (service, "service", format!("Service for {model}")),
            (router, "router", format!("Procedures for {model}")),
            (test, "test", format!("API tests for {model}")),
        ];

        files
            .into_iter()
            .map(|(path, template, description)| {
                Ok(GeneratedFile {
                    path,
                    content: self.templates.render(template, &metadata)?,
                    description,
                })
            })
            .collect()
    }

    /// `CREATE TABLE` statement for the resource
    ///
    /// # Errors
    ///
    /// Returns an error if rendering fails
    pub fn migration_sql(&self) -> Result<String, EmitError> {
        Ok(self.templates.render("migration", &self.metadata())?)
    }
}

/// Existing files among the targets
#[must_use]
pub fn find_conflicts(root: &Path, files: &[GeneratedFile]) -> Vec<PathBuf> {
    files
        .iter()
        .map(|file| &file.path)
        .filter(|path| root.join(path).exists())
        .cloned()
        .collect()
}

/// Apply the overwrite policy to existing targets
///
/// # Errors
///
/// Returns [`EmitError::Conflicts`] if targets exist and overwriting is not allowed
pub fn check_conflicts(
    root: &Path,
    files: &[GeneratedFile],
    policy: OverwritePolicy,
    prompter: &mut dyn Prompter,
) -> Result<(), EmitError> {
    let conflicts = find_conflicts(root, files);
    if conflicts.is_empty() {
        return Ok(());
    }

    let allowed = match policy {
        OverwritePolicy::Force => true,
        OverwritePolicy::Confirm => prompter.confirm_overwrite(&conflicts)?,
        OverwritePolicy::Refuse => false,
    };

    if allowed {
        warn!(count = conflicts.len(), "overwriting existing files");
        Ok(())
    } else {
        Err(EmitError::Conflicts(conflicts))
    }
}

/// Write files under `root`, creating parent directories
///
/// Returns the written paths, joined to `root`.
///
/// # Errors
///
/// Returns an error if a directory or file cannot be written
pub fn write_files(root: &Path, files: &[GeneratedFile]) -> Result<Vec<PathBuf>, EmitError> {
    let mut written = Vec::with_capacity(files.len());

    for file in files {
        let path = root.join(&file.path);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|source| EmitError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        fs::write(&path, &file.content).map_err(|source| EmitError::Io {
            path: path.clone(),
            source,
        })?;
        debug!(path = %path.display(), bytes = file.content.len(), "wrote file");
        written.push(path);
    }

    Ok(written)
}

/// Confirm every generated file exists
///
/// # Errors
///
/// Returns [`EmitError::Missing`] listing every absent file
pub fn verify_written(root: &Path, files: &[GeneratedFile]) -> Result<(), EmitError> {
    let missing: Vec<PathBuf> = files
        .iter()
        .map(|file| &file.path)
        .filter(|path| !root.join(path).is_file())
        .cloned()
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(EmitError::Missing(missing))
    }
}
