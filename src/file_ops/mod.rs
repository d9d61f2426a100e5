//! File operations module
//!
//! This module contains the chroot-checked filesystem primitives used by the
//! structure assembler and the release steps.

mod safe_fs;

pub use safe_fs::{CopyOutcome, DeleteMode, check_chroot, copy_file_or_tree, delete, make_dirs};
