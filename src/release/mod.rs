//! Release steps around the structure assembly
//!
//! Compiling, versioning, packaging and the changelog excerpt.

mod changelog;
mod compile;
mod package;
mod version;

pub use changelog::{extract_description, process_github_links, read_description};
pub use compile::compile_binary;
pub use package::{
    ARCHIVE_EXTENSION, archive_path, format_positional, format_printf, make_archive, release_name,
    release_tag,
};
pub use version::{ReleaseVersion, extract_version, parse_assembly_version, update_version_file};
