//! crudkit CLI library
//!
//! Generates resource files for crudkit services and checks a project for
//! drift. The `crudkit` binary is a thin clap front end over [`commands`].

#![forbid(unsafe_code)]
#![deny(clippy::all, clippy::pedantic, clippy::nursery)]
#![warn(clippy::cargo)]
#![allow(clippy::cognitive_complexity)]
#![allow(clippy::multiple_crate_versions)]

pub mod commands;
pub mod scaffold;
pub mod vcs;
pub mod verify;

pub use commands::{GenCommand, ScaffoldCommand, VerifyCommand};
pub use scaffold::{ScaffoldArgs, ScaffoldConfig, ScaffoldEmitter};
pub use verify::{DriftReport, DriftVerifier};
