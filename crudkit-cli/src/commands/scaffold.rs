//! Strict resource scaffolding
//!
//! Prompts for every field unless `--model` is given, in which case
//! `--access` and `--with-soft-delete` are required. Files are written but
//! not committed.

use anyhow::Result;
use console::style;
use crudkit::config::ScaffoldSettings;
use std::path::Path;

use super::{emit_resource, print_next_steps};
use crate::scaffold::{resolve, DialoguerPrompter, OverwritePolicy, Prompter, ResolveError, ScaffoldArgs};

const USAGE: &str = "Usage: crudkit scaffold --model ModelName --access [public|protected|admin] --with-soft-delete [true|false]";

/// `crudkit scaffold`
pub struct ScaffoldCommand {
    args: ScaffoldArgs,
    force: bool,
}

impl ScaffoldCommand {
    /// Create a new command instance
    #[must_use]
    pub const fn new(args: ScaffoldArgs, force: bool) -> Self {
        Self { args, force }
    }

    fn policy(&self) -> OverwritePolicy {
        if self.force {
            OverwritePolicy::Force
        } else if self.args.is_non_interactive() {
            OverwritePolicy::Refuse
        } else {
            OverwritePolicy::Confirm
        }
    }

    /// Execute with terminal prompts
    ///
    /// # Errors
    ///
    /// Returns an error if resolution or emission fails
    pub fn execute(&self, root: &Path, settings: &ScaffoldSettings) -> Result<()> {
        self.execute_with(root, settings, &mut DialoguerPrompter::new())
    }

    /// Execute with a given prompter
    ///
    /// # Errors
    ///
    /// Returns an error if resolution or emission fails
    pub fn execute_with(
        &self,
        root: &Path,
        settings: &ScaffoldSettings,
        prompter: &mut dyn Prompter,
    ) -> Result<()> {
        let config = match resolve(&self.args, prompter) {
            Ok(config) => config,
            Err(err @ ResolveError::MissingFlags(_)) => {
                eprintln!("{}", style(USAGE).dim());
                return Err(err.into());
            }
            Err(err) => return Err(err.into()),
        };

        let emitted = emit_resource(root, config, settings, self.policy(), prompter)?;
        print_next_steps(&emitted, settings)
    }
}
