//! Resolution module
//!
//! This module contains the macro expansion and the path resolution used by
//! every build step.

mod macros;
mod paths;

pub use macros::{MacroContext, contains_unresolved, unresolved_placeholder};
pub use paths::{PathResolver, ReleaseLayout};
