//! Drift verification command

use anyhow::{Context, Result};
use console::style;
use std::path::PathBuf;

use crate::verify::{DriftReport, DriftVerifier};

/// `crudkit verify`
#[derive(Debug, Clone)]
pub struct VerifyCommand {
    root: PathBuf,
    catalog: Option<PathBuf>,
}

impl VerifyCommand {
    /// Verify `root` against the given catalog, or the built-in one
    #[must_use]
    pub const fn new(root: PathBuf, catalog: Option<PathBuf>) -> Self {
        Self { root, catalog }
    }

    /// Execute the command
    ///
    /// # Errors
    ///
    /// Returns an error if the checks cannot run or any check fails
    pub fn execute(&self) -> Result<DriftReport> {
        let report = DriftVerifier::new(&self.root)
            .with_catalog(self.catalog.clone())
            .run()
            .context("Failed to run drift verification")?;

        print_report(&report, &self.root);

        if !report.is_clean() {
            anyhow::bail!("Drift detected");
        }
        Ok(report)
    }
}

fn print_report(report: &DriftReport, root: &std::path::Path) {
    if report.markers.is_empty() {
        println!(
            "{} No placeholder markers in {}",
            style("✓").green(),
            root.display()
        );
    } else {
        println!(
            "{} Placeholder markers in {} files:",
            style("✗").red().bold(),
            report.marker_files().len()
        );
        for marker in &report.markers {
            println!(
                "  {}:{} {}",
                marker.path.display(),
                marker.line,
                style(&marker.text).dim()
            );
        }
    }

    if report.catalog.is_clean() {
        println!("{} Error catalog matches error kinds", style("✓").green());
    } else {
        println!("{} Error catalog drift:", style("✗").red().bold());
        for key in &report.catalog.missing {
            println!("  missing message: {}", style(key).yellow());
        }
        for key in &report.catalog.extra {
            println!("  unknown key: {}", style(key).yellow());
        }
    }
}
