//! Resource scaffolding
//!
//! Flags or prompts are resolved into a [`ScaffoldConfig`], which the
//! [`ScaffoldEmitter`] renders into a schema, a service, a router and an
//! integration test for the resource.

pub mod config;
pub mod emitter;
pub mod helpers;
pub mod resolver;
pub mod templates;

pub use config::{parse_search_fields, ConfigError, ModelName, ScaffoldConfig, SEARCHABLE_COLUMNS};
pub use emitter::{
    check_conflicts, find_conflicts, verify_written, write_files, EmitError, GeneratedFile,
    OverwritePolicy, ScaffoldEmitter,
};
pub use helpers::TemplateHelpers;
pub use resolver::{
    parse_soft_delete_flag, resolve, DialoguerPrompter, Prompter, ResolveError, ScaffoldArgs,
};
pub use templates::{TemplateError, TemplateRegistry};
