//! Git and formatter handoff for generated files

use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use thiserror::Error;
use tracing::{debug, info};

/// Environment variable that marks a CI run
pub const CI_ENV: &str = "CI";

/// External command failures
#[derive(Debug, Error)]
pub enum VcsError {
    /// Program could not be started
    #[error("Failed to run {program}: {source}")]
    Spawn {
        /// Program name
        program: String,
        /// Underlying error
        source: std::io::Error,
    },

    /// Program exited unsuccessfully
    #[error("{command} failed ({status}): {stderr}")]
    Failed {
        /// Command line
        command: String,
        /// Exit status
        status: String,
        /// Captured stderr
        stderr: String,
    },

    /// Configured command is empty
    #[error("Lint command is empty")]
    EmptyCommand,
}

/// Whether an environment value means "on"
///
/// # Examples
///
/// ```
/// # use crudkit_cli::vcs::is_truthy;
/// assert!(is_truthy("true"));
/// assert!(is_truthy("1"));
/// assert!(!is_truthy("false"));
/// assert!(!is_truthy(""));
/// ```
#[must_use]
pub fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

/// Hooks are skipped only when asked for and running under CI
#[must_use]
pub fn hook_bypass_allowed(no_verify: bool, ci: Option<&str>) -> bool {
    no_verify && ci.is_some_and(is_truthy)
}

/// Commit message for a model, from a template containing `{kebab}`
///
/// # Examples
///
/// ```
/// # use crudkit_cli::vcs::commit_message;
/// assert_eq!(
///     commit_message("chore(scaffold): add {kebab} api", "order-item"),
///     "chore(scaffold): add order-item api"
/// );
/// ```
#[must_use]
pub fn commit_message(template: &str, kebab: &str) -> String {
    template.replace("{kebab}", kebab)
}

fn run(mut command: Command) -> Result<Output, VcsError> {
    let program = command.get_program().to_string_lossy().into_owned();
    let line = std::iter::once(command.get_program())
        .chain(command.get_args())
        .map(OsStr::to_string_lossy)
        .collect::<Vec<_>>()
        .join(" ");
    debug!(command = %line, "running");

    let output = command
        .output()
        .map_err(|source| VcsError::Spawn { program, source })?;

    if output.status.success() {
        Ok(output)
    } else {
        Err(VcsError::Failed {
            command: line,
            status: output.status.to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        })
    }
}

/// Run the formatter on exactly these files
///
/// # Errors
///
/// Returns an error if the command is empty, cannot start, or fails
pub fn lint_fix(root: &Path, command: &[String], paths: &[PathBuf]) -> Result<(), VcsError> {
    let (program, args) = command.split_first().ok_or(VcsError::EmptyCommand)?;

    let mut cmd = Command::new(program);
    cmd.current_dir(root).args(args).args(paths);
    run(cmd)?;
    Ok(())
}

/// Git working tree
#[derive(Debug, Clone)]
pub struct Git {
    root: PathBuf,
}

impl Git {
    /// Git commands run in `root`
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn git(&self) -> Command {
        let mut cmd = Command::new("git");
        cmd.current_dir(&self.root);
        cmd
    }

    /// Whether `root` is inside a work tree
    #[must_use]
    pub fn is_repository(&self) -> bool {
        let mut cmd = self.git();
        cmd.args(["rev-parse", "--is-inside-work-tree"]);
        run(cmd).is_ok()
    }

    /// Stage only these paths
    ///
    /// # Errors
    ///
    /// Returns an error if `git add` fails
    pub fn stage(&self, paths: &[PathBuf]) -> Result<(), VcsError> {
        let mut cmd = self.git();
        cmd.arg("add").arg("--").args(paths);
        run(cmd)?;
        Ok(())
    }

    /// Commit only these paths
    ///
    /// # Errors
    ///
    /// Returns an error if `git commit` fails, including a rejecting hook
    pub fn commit(&self, message: &str, paths: &[PathBuf], no_verify: bool) -> Result<(), VcsError> {
        let mut cmd = self.git();
        cmd.args(["commit", "-m", message]);
        if no_verify {
            cmd.arg("--no-verify");
        }
        cmd.arg("--").args(paths);
        run(cmd)?;

        info!(commit = %message, files = paths.len(), no_verify, "committed");
        Ok(())
    }
}
