//! Release structure module
//!
//! This module contains the declarative structure mapping and the assembler
//! that materialises it in the release folder.

mod assembler;
mod mapping;

pub use assembler::{AssemblyReport, FolderPolicy, StructureAssembler, glob_matches};
pub use mapping::{
    MappingEntry, PatternKind, SourcePattern, StructureMapping, compare_destination_keys,
};
