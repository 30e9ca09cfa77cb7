//! One-shot generation: resolve, emit, format, stage and commit
//!
//! # Example
//!
//! ```bash
//! crudkit gen Widget --access admin --fields name,description
//! ```

use anyhow::{Context, Result};
use console::style;
use crudkit::config::ScaffoldSettings;
use crudkit::resource::AccessTier;
use std::path::Path;
use tracing::warn;

use super::{emit_resource, print_next_steps};
use crate::scaffold::{resolve, DialoguerPrompter, OverwritePolicy, ScaffoldArgs};
use crate::vcs::{commit_message, hook_bypass_allowed, lint_fix, Git, CI_ENV};

/// `crudkit gen`
#[derive(Debug, Clone)]
#[allow(clippy::struct_excessive_bools)]
pub struct GenCommand {
    /// Model name
    pub model: String,
    /// Access tier
    pub access: AccessTier,
    /// Soft delete (on unless `--no-soft-delete`)
    pub soft_delete: bool,
    /// Searchable fields
    pub fields: Option<String>,
    /// Skip commit hooks, honored only under CI
    pub no_verify: bool,
    /// Overwrite existing files
    pub force: bool,
    /// Leave files uncommitted
    pub no_commit: bool,
}

impl GenCommand {
    fn args(&self) -> ScaffoldArgs {
        ScaffoldArgs {
            model: Some(self.model.clone()),
            access: Some(self.access.as_str().to_string()),
            with_soft_delete: Some(self.soft_delete.to_string()),
            searchable_fields: self.fields.clone(),
        }
    }

    /// Execute the command
    ///
    /// A failing formatter is reported and ignored; every other failure aborts.
    ///
    /// # Errors
    ///
    /// Returns an error if resolution, emission, staging or committing fails
    pub fn execute(&self, root: &Path, settings: &ScaffoldSettings) -> Result<()> {
        let mut prompter = DialoguerPrompter::new();
        let config = resolve(&self.args(), &mut prompter)?;
        let kebab = config.model.kebab();

        let policy = if self.force {
            OverwritePolicy::Force
        } else {
            OverwritePolicy::Refuse
        };
        let emitted = emit_resource(root, config, settings, policy, &mut prompter)?;
        let paths = emitted.paths();

        if let Err(err) = lint_fix(root, &settings.lint_command, &paths) {
            warn!(error = %err, "lint fix failed");
            println!(
                "{} {}",
                style("!").yellow().bold(),
                style(format!("Formatter failed, files left as generated: {err}")).yellow()
            );
        }

        if self.no_commit {
            println!("\n{}", style("Skipping commit (--no-commit)").dim());
        } else {
            let ci = std::env::var(CI_ENV).ok();
            let bypass = hook_bypass_allowed(self.no_verify, ci.as_deref());
            if self.no_verify && !bypass {
                println!(
                    "{}",
                    style("--no-verify ignored outside CI; running commit hooks").yellow()
                );
            }

            let git = Git::new(root);
            let message = commit_message(&settings.commit_message, &kebab);
            git.stage(&paths).context("Failed to stage generated files")?;
            git.commit(&message, &paths, bypass)
                .context("Failed to commit generated files")?;
            println!(
                "\n{} {}",
                style("Committed:").green().bold(),
                style(&message).dim()
            );
        }

        print_next_steps(&emitted, settings)
    }
}
