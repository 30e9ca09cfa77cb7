//! Turns flags or prompt answers into a [`ScaffoldConfig`]
//!
//! The run is non-interactive as soon as a model name is passed. In that mode
//! access and soft-delete must both be given; nothing is prompted for.
//! Without a model name every field is prompted for.

use crudkit::resource::{AccessTier, ParseAccessTierError};
use dialoguer::{theme::ColorfulTheme, Confirm, Input, Select};
use std::path::PathBuf;
use thiserror::Error;

use super::config::{parse_search_fields, ConfigError, ModelName, ScaffoldConfig};

/// Searchable field list used when none is given
pub const DEFAULT_SEARCH_FIELDS: &str = "name";

/// Resolution failures
#[derive(Debug, Error)]
pub enum ResolveError {
    /// Required flags absent in non-interactive mode
    #[error("Missing required flags in non-interactive mode: {}", .0.join(", "))]
    MissingFlags(Vec<String>),

    /// Access tier is not one of the known names
    #[error(transparent)]
    InvalidAccess(#[from] ParseAccessTierError),

    /// Model name or searchable fields rejected
    #[error(transparent)]
    InvalidInput(#[from] ConfigError),

    /// Terminal prompt failed
    #[error("Prompt failed: {0}")]
    Prompt(#[from] dialoguer::Error),
}

/// Raw scaffold flags, as typed by the operator
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScaffoldArgs {
    /// `--model`
    pub model: Option<String>,
    /// `--access`
    pub access: Option<String>,
    /// `--with-soft-delete`
    pub with_soft_delete: Option<String>,
    /// `--searchable-fields`
    pub searchable_fields: Option<String>,
}

impl ScaffoldArgs {
    /// Whether prompts are skipped
    #[must_use]
    pub const fn is_non_interactive(&self) -> bool {
        self.model.is_some()
    }
}

/// Soft-delete flag value: only `true` and `1` enable it
///
/// # Examples
///
/// ```
/// # use crudkit_cli::scaffold::parse_soft_delete_flag;
/// assert!(parse_soft_delete_flag("true"));
/// assert!(parse_soft_delete_flag("1"));
/// assert!(!parse_soft_delete_flag("yes"));
/// ```
#[must_use]
pub fn parse_soft_delete_flag(value: &str) -> bool {
    matches!(value, "true" | "1")
}

/// Source of interactive answers
pub trait Prompter {
    /// Ask for a model name
    ///
    /// # Errors
    ///
    /// Returns an error if the terminal cannot be read
    fn model_name(&mut self) -> Result<String, ResolveError>;

    /// Ask for an access tier
    ///
    /// # Errors
    ///
    /// Returns an error if the terminal cannot be read
    fn access(&mut self, default: AccessTier) -> Result<AccessTier, ResolveError>;

    /// Ask whether to soft delete
    ///
    /// # Errors
    ///
    /// Returns an error if the terminal cannot be read
    fn soft_delete(&mut self, default: bool) -> Result<bool, ResolveError>;

    /// Ask for a comma-separated searchable field list
    ///
    /// # Errors
    ///
    /// Returns an error if the terminal cannot be read
    fn searchable_fields(&mut self, default: &str) -> Result<String, ResolveError>;

    /// Ask whether existing files may be overwritten
    ///
    /// # Errors
    ///
    /// Returns an error if the terminal cannot be read
    fn confirm_overwrite(&mut self, paths: &[PathBuf]) -> Result<bool, ResolveError>;
}

/// Terminal prompts
#[derive(Default)]
pub struct DialoguerPrompter {
    theme: ColorfulTheme,
}

impl DialoguerPrompter {
    /// Prompter with the colorful theme
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl Prompter for DialoguerPrompter {
    fn model_name(&mut self) -> Result<String, ResolveError> {
        let name = Input::<String>::with_theme(&self.theme)
            .with_prompt("Model name (PascalCase, e.g., Project, OrganizationMember)")
            .validate_with(|input: &String| -> Result<(), String> {
                ModelName::parse(input)
                    .map(|_| ())
                    .map_err(|e| e.to_string())
            })
            .interact_text()?;
        Ok(name)
    }

    fn access(&mut self, default: AccessTier) -> Result<AccessTier, ResolveError> {
        let names: Vec<&str> = AccessTier::ALL.iter().map(|tier| tier.as_str()).collect();
        let default_index = AccessTier::ALL
            .iter()
            .position(|tier| *tier == default)
            .unwrap_or_default();

        let selection = Select::with_theme(&self.theme)
            .with_prompt("Access level")
            .items(&names)
            .default(default_index)
            .interact()?;
        Ok(AccessTier::ALL[selection])
    }

    fn soft_delete(&mut self, default: bool) -> Result<bool, ResolveError> {
        Ok(Confirm::with_theme(&self.theme)
            .with_prompt("Include soft delete functionality?")
            .default(default)
            .interact()?)
    }

    fn searchable_fields(&mut self, default: &str) -> Result<String, ResolveError> {
        Ok(Input::<String>::with_theme(&self.theme)
            .with_prompt("Searchable fields (comma-separated)")
            .default(default.to_string())
            .interact_text()?)
    }

    fn confirm_overwrite(&mut self, paths: &[PathBuf]) -> Result<bool, ResolveError> {
        for path in paths {
            eprintln!("  exists: {}", path.display());
        }
        Ok(Confirm::with_theme(&self.theme)
            .with_prompt("Overwrite these files?")
            .default(false)
            .interact()?)
    }
}

/// Resolve a complete configuration
///
/// # Errors
///
/// Returns an error for missing flags in non-interactive mode, an unknown
/// access tier, an invalid model name or searchable field, or a failed prompt
pub fn resolve(
    args: &ScaffoldArgs,
    prompter: &mut dyn Prompter,
) -> Result<ScaffoldConfig, ResolveError> {
    if let Some(model) = &args.model {
        return resolve_flags(model, args);
    }

    let model = ModelName::parse(&prompter.model_name()?)?;
    let access = prompter.access(AccessTier::Protected)?;
    let with_soft_delete = prompter.soft_delete(false)?;
    let fields = prompter.searchable_fields(DEFAULT_SEARCH_FIELDS)?;

    Ok(ScaffoldConfig {
        model,
        access,
        with_soft_delete,
        searchable_fields: parse_search_fields(&fields)?,
    })
}

fn resolve_flags(model: &str, args: &ScaffoldArgs) -> Result<ScaffoldConfig, ResolveError> {
    let mut missing = Vec::new();
    if args.with_soft_delete.is_none() {
        missing.push("--with-soft-delete".to_string());
    }
    if args.access.as_deref().is_none_or(str::is_empty) {
        missing.push("--access".to_string());
    }

    let (Some(soft_delete), Some(access)) = (&args.with_soft_delete, &args.access) else {
        return Err(ResolveError::MissingFlags(missing));
    };
    if !missing.is_empty() {
        return Err(ResolveError::MissingFlags(missing));
    }

    let access: AccessTier = access.parse()?;
    let fields = args
        .searchable_fields
        .as_deref()
        .unwrap_or(DEFAULT_SEARCH_FIELDS);

    Ok(ScaffoldConfig {
        model: ModelName::parse(model)?,
        access,
        with_soft_delete: parse_soft_delete_flag(soft_delete),
        searchable_fields: parse_search_fields(fields)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Replays fixed answers and records what was asked
    #[derive(Default)]
    struct Scripted {
        model: String,
        access: Option<AccessTier>,
        soft_delete: Option<bool>,
        fields: Option<String>,
        asked: Vec<&'static str>,
        defaults: Vec<String>,
    }

    impl Prompter for Scripted {
        fn model_name(&mut self) -> Result<String, ResolveError> {
            self.asked.push("model");
            Ok(self.model.clone())
        }

        fn access(&mut self, default: AccessTier) -> Result<AccessTier, ResolveError> {
            self.asked.push("access");
            self.defaults.push(default.to_string());
            Ok(self.access.unwrap_or(default))
        }

        fn soft_delete(&mut self, default: bool) -> Result<bool, ResolveError> {
            self.asked.push("soft_delete");
            self.defaults.push(default.to_string());
            Ok(self.soft_delete.unwrap_or(default))
        }

        fn searchable_fields(&mut self, default: &str) -> Result<String, ResolveError> {
            self.asked.push("fields");
            self.defaults.push(default.to_string());
            Ok(self.fields.clone().unwrap_or_else(|| default.to_string()))
        }

        fn confirm_overwrite(&mut self, _paths: &[PathBuf]) -> Result<bool, ResolveError> {
            self.asked.push("overwrite");
            Ok(false)
        }
    }

    fn flags(model: &str) -> ScaffoldArgs {
        ScaffoldArgs {
            model: Some(model.to_string()),
            access: Some("admin".to_string()),
            with_soft_delete: Some("true".to_string()),
            searchable_fields: Some("name,description".to_string()),
        }
    }

    #[test]
    fn test_non_interactive_never_prompts() {
        let mut prompter = Scripted::default();
        let config = resolve(&flags("Widget"), &mut prompter).unwrap();

        assert!(prompter.asked.is_empty());
        assert_eq!(config.model.pascal(), "Widget");
        assert_eq!(config.access, AccessTier::Admin);
        assert!(config.with_soft_delete);
        assert_eq!(config.searchable_fields, vec!["name", "description"]);
    }

    #[test]
    fn test_missing_flags_are_listed() {
        let args = ScaffoldArgs {
            model: Some("Widget".to_string()),
            ..ScaffoldArgs::default()
        };
        let err = resolve(&args, &mut Scripted::default()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Missing required flags in non-interactive mode: --with-soft-delete, --access"
        );

        let args = ScaffoldArgs {
            with_soft_delete: Some("false".to_string()),
            ..args
        };
        let err = resolve(&args, &mut Scripted::default()).unwrap_err();
        assert!(matches!(err, ResolveError::MissingFlags(ref m) if m == &["--access"]));
    }

    #[test]
    fn test_soft_delete_literals() {
        for (value, expected) in [("true", true), ("1", true), ("false", false), ("yes", false), ("TRUE", false)] {
            let args = ScaffoldArgs {
                with_soft_delete: Some(value.to_string()),
                ..flags("Widget")
            };
            let config = resolve(&args, &mut Scripted::default()).unwrap();
            assert_eq!(config.with_soft_delete, expected, "{value}");
        }
    }

    #[test]
    fn test_unknown_access_is_rejected() {
        let args = ScaffoldArgs {
            access: Some("owner".to_string()),
            ..flags("Widget")
        };
        assert!(matches!(
            resolve(&args, &mut Scripted::default()),
            Err(ResolveError::InvalidAccess(_))
        ));
    }

    #[test]
    fn test_searchable_fields_default_to_name() {
        let args = ScaffoldArgs {
            searchable_fields: None,
            ..flags("Widget")
        };
        let config = resolve(&args, &mut Scripted::default()).unwrap();
        assert_eq!(config.searchable_fields, vec!["name"]);
    }

    #[test]
    fn test_flag_model_must_be_pascal_case() {
        assert!(matches!(
            resolve(&flags("widget"), &mut Scripted::default()),
            Err(ResolveError::InvalidInput(ConfigError::InvalidModel(_)))
        ));
    }

    #[test]
    fn test_interactive_defaults() {
        let mut prompter = Scripted {
            model: "OrganizationMember".to_string(),
            ..Scripted::default()
        };
        let config = resolve(&ScaffoldArgs::default(), &mut prompter).unwrap();

        assert_eq!(prompter.asked, vec!["model", "access", "soft_delete", "fields"]);
        assert_eq!(prompter.defaults, vec!["protected", "false", "name"]);
        assert_eq!(config.access, AccessTier::Protected);
        assert!(!config.with_soft_delete);
        assert_eq!(config.searchable_fields, vec!["name"]);
    }

    #[test]
    fn test_interactive_answers() {
        let mut prompter = Scripted {
            model: "Widget".to_string(),
            access: Some(AccessTier::Public),
            soft_delete: Some(true),
            fields: Some("email, status".to_string()),
            ..Scripted::default()
        };
        let config = resolve(&ScaffoldArgs::default(), &mut prompter).unwrap();
        assert_eq!(config.access, AccessTier::Public);
        assert!(config.with_soft_delete);
        assert_eq!(config.searchable_fields, vec!["email", "status"]);
    }
}
