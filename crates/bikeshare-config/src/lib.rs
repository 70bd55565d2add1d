//! # Bikeshare Config
//!
//! Type-safe configuration management with hot-reloading for the dashboard.
//!
//! This crate provides configuration loading from TOML files, environment
//! overrides, validation, and an atomically swappable cache that the
//! dashboard's watch mode updates whenever the selections change.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod cache;
pub mod defaults;
pub mod loader;
pub mod schema;
pub mod validator;

pub use cache::*;
pub use defaults::*;
pub use loader::*;
pub use schema::*;
pub use validator::*;
