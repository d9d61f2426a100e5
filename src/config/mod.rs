//! Configuration module
//!
//! This module contains components for loading and validating the settings
//! file.

mod loader;
mod model;

pub use loader::{
    build_release_config, check_schema_version, find_repository_root, load_release_config,
    load_settings, resolve_project_root,
};
pub use model::{ReleaseConfig, Settings};
