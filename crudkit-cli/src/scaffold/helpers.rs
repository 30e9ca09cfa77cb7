//! Name-case helpers for code generation

use inflector::Inflector;
use std::path::{Component, Path, PathBuf};

/// Naming conventions used by the templates
pub struct TemplateHelpers;

impl TemplateHelpers {
    /// Convert string to `snake_case`
    ///
    /// # Examples
    ///
    /// ```
    /// # use crudkit_cli::scaffold::TemplateHelpers;
    /// assert_eq!(TemplateHelpers::to_snake_case("OrderItem"), "order_item");
    /// ```
    #[must_use]
    pub fn to_snake_case(input: &str) -> String {
        input.to_snake_case()
    }

    /// Convert string to `PascalCase`
    ///
    /// # Examples
    ///
    /// ```
    /// # use crudkit_cli::scaffold::TemplateHelpers;
    /// assert_eq!(TemplateHelpers::to_pascal_case("order_item"), "OrderItem");
    /// ```
    #[must_use]
    pub fn to_pascal_case(input: &str) -> String {
        input.to_pascal_case()
    }

    /// Convert string to camelCase
    ///
    /// # Examples
    ///
    /// ```
    /// # use crudkit_cli::scaffold::TemplateHelpers;
    /// assert_eq!(TemplateHelpers::to_camel_case("OrderItem"), "orderItem");
    /// ```
    #[must_use]
    pub fn to_camel_case(input: &str) -> String {
        input.to_camel_case()
    }

    /// Convert string to kebab-case
    ///
    /// # Examples
    ///
    /// ```
    /// # use crudkit_cli::scaffold::TemplateHelpers;
    /// assert_eq!(TemplateHelpers::to_kebab_case("OrderItem"), "order-item");
    /// ```
    #[must_use]
    pub fn to_kebab_case(input: &str) -> String {
        input.to_kebab_case()
    }

    /// Pluralize a word
    #[must_use]
    pub fn pluralize(input: &str) -> String {
        input.to_plural()
    }

    /// Table name: plural `snake_case`
    ///
    /// # Examples
    ///
    /// ```
    /// # use crudkit_cli::scaffold::TemplateHelpers;
    /// assert_eq!(TemplateHelpers::to_table_name("Category"), "categories");
    /// assert_eq!(TemplateHelpers::to_table_name("OrderItem"), "order_items");
    /// ```
    #[must_use]
    pub fn to_table_name(model: &str) -> String {
        Self::pluralize(&Self::to_snake_case(model))
    }

    /// Relative path from a directory to a file, both relative to the same root
    ///
    /// Used for `#[path]` attributes in generated tests.
    ///
    /// # Examples
    ///
    /// ```
    /// # use crudkit_cli::scaffold::TemplateHelpers;
    /// # use std::path::{Path, PathBuf};
    /// assert_eq!(
    ///     TemplateHelpers::relative_path(Path::new("tests"), Path::new("src/schemas/widget.rs")),
    ///     PathBuf::from("../src/schemas/widget.rs")
    /// );
    /// ```
    #[must_use]
    pub fn relative_path(from_dir: &Path, to_file: &Path) -> PathBuf {
        let from: Vec<Component<'_>> = from_dir
            .components()
            .filter(|c| !matches!(c, Component::CurDir))
            .collect();
        let to: Vec<Component<'_>> = to_file
            .components()
            .filter(|c| !matches!(c, Component::CurDir))
            .collect();

        let common = from
            .iter()
            .zip(&to)
            .take_while(|(a, b)| a == b)
            .count();

        let mut path = PathBuf::new();
        for _ in common..from.len() {
            path.push("..");
        }
        for component in &to[common..] {
            path.push(component.as_os_str());
        }
        path
    }
}
