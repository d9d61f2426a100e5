//! Release builder
//!
//! Assembles a mod release from a declarative settings file: compiles the
//! binary, lays out the release folder from source patterns, stamps the
//! version and packs the result.

pub mod cli;
pub mod config;
pub mod constants;
pub mod errors;
pub mod file_ops;
pub mod logging;
pub mod release;
pub mod resolve;
pub mod structure;
pub mod utils;
pub mod workflow;

pub mod prelude {
    pub use crate::cli::{get_log_file, get_matches, get_release_options, get_verbosity};
    pub use crate::config::{ReleaseConfig, Settings, load_release_config};
    pub use crate::errors::{
        Error, Result, config_parsing_error, file_operation_error, generic_error,
        glob_pattern_error, invalid_deletion_scope_error, no_match_error, path_escape_error,
    };
    pub use crate::logging::{LogLevel, format_message, init_default_logger, init_logger};
    pub use crate::resolve::{MacroContext, PathResolver, ReleaseLayout};
    pub use crate::structure::{FolderPolicy, StructureAssembler, StructureMapping};
    pub use crate::workflow::{ReleaseOptions, ReleaseOutcome, make_release, run_release};
}
