//! CLI command implementations

pub mod gen;
pub mod scaffold;
pub mod verify;

pub use gen::GenCommand;
pub use scaffold::ScaffoldCommand;
pub use verify::VerifyCommand;

use anyhow::{Context, Result};
use console::style;
use crudkit::config::ScaffoldSettings;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::scaffold::{
    check_conflicts, verify_written, write_files, GeneratedFile, OverwritePolicy, Prompter,
    ScaffoldConfig, ScaffoldEmitter,
};
use crate::verify::scan_files;

fn spinner() -> Result<ProgressBar> {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .context("Failed to set progress style")?,
    );
    spinner.enable_steady_tick(Duration::from_millis(100));
    Ok(spinner)
}

/// Files written for one resource
pub struct Emitted {
    /// Emitter used, for next-step hints
    pub emitter: ScaffoldEmitter,
    /// Rendered files, paths relative to the project root
    pub files: Vec<GeneratedFile>,
}

impl Emitted {
    /// Relative paths of the written files
    #[must_use]
    pub fn paths(&self) -> Vec<PathBuf> {
        self.files.iter().map(|file| file.path.clone()).collect()
    }
}

/// Render, check for conflicts, write and verify one resource
///
/// # Errors
///
/// Returns an error on rendering failure, refused overwrite, write failure,
/// a missing file after writing, or a placeholder marker in generated source
pub fn emit_resource(
    root: &Path,
    config: ScaffoldConfig,
    settings: &ScaffoldSettings,
    policy: OverwritePolicy,
    prompter: &mut dyn Prompter,
) -> Result<Emitted> {
    println!(
        "\n{} {} {}",
        style("Scaffolding CRUD for").cyan().bold(),
        style(config.model.pascal()).green().bold(),
        style("...").cyan().bold()
    );

    let emitter = ScaffoldEmitter::new(config, settings.clone())
        .context("Failed to create scaffold emitter")?;
    let files = emitter
        .generate()
        .context("Failed to generate scaffold files")?;

    check_conflicts(root, &files, policy, prompter)?;

    let spinner = spinner()?;
    spinner.set_message("Writing files...");
    let written = write_files(root, &files);
    spinner.finish_and_clear();
    written?;

    verify_written(root, &files)?;

    let paths: Vec<PathBuf> = files.iter().map(|file| file.path.clone()).collect();
    let markers = scan_files(root, &paths).context("Failed to check generated files")?;
    if let Some(marker) = markers.first() {
        anyhow::bail!(
            "Generated file contains a placeholder marker: {}:{}",
            marker.path.display(),
            marker.line
        );
    }

    println!(
        "\n{} {} files:",
        style("Generated").green().bold(),
        files.len()
    );
    for file in &files {
        println!(
            "  {} {} ({})",
            style("✓").green(),
            style(file.path.display()).dim(),
            style(&file.description).dim()
        );
    }

    Ok(Emitted { emitter, files })
}

fn module_declaration(file_stem: &str, module: &str) -> String {
    if file_stem == module {
        format!("pub mod {module};")
    } else {
        format!("#[path = \"{file_stem}.rs\"] pub mod {module};")
    }
}

/// Print registration, migration and test hints
///
/// # Errors
///
/// Returns an error if the migration snippet cannot be rendered
pub fn print_next_steps(emitted: &Emitted, settings: &ScaffoldSettings) -> Result<()> {
    let config = emitted.emitter.config();
    let model = config.model.pascal();
    let camel = config.model.camel();
    let snake = config.model.snake();
    let declaration = module_declaration(&camel, &snake);

    println!(
        "\n{} CRUD scaffold for {} is ready!",
        style("✨").green().bold(),
        style(model).green().bold()
    );

    println!("\n{}", style("Next steps:").cyan().bold());
    for (step, dir) in [
        (1, &settings.schemas_dir),
        (2, &settings.services_dir),
        (3, &settings.routers_dir),
    ] {
        println!(
            "  {step}. Add to {}: {}",
            dir.join("mod.rs").display(),
            style(&declaration).yellow()
        );
    }
    println!(
        "  4. Register the store and routes: {} {}",
        style(format!("app.register::<{model}>();")).yellow(),
        style(format!("api = {snake}_routes(api);")).yellow()
    );
    println!("  5. Create the table:");
    let sql = emitted
        .emitter
        .migration_sql()
        .context("Failed to render migration")?;
    for line in sql.lines() {
        println!("       {}", style(line).yellow());
    }
    println!(
        "  6. Run the tests: {}",
        style(format!("cargo test --test {camel}_test")).yellow()
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_module_declaration() {
        assert_eq!(module_declaration("widget", "widget"), "pub mod widget;");
        assert_eq!(
            module_declaration("orderItem", "order_item"),
            "#[path = \"orderItem.rs\"] pub mod order_item;"
        );
    }
}
