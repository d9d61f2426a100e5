//! Filesystem primitives guarded by a chroot check
//!
//! Each operation takes the allowed root explicitly and validates the path
//! right before touching the disk, independently of how the caller derived
//! the path.

use std::io;
use std::path::{Path, PathBuf};

use fs_extra::{dir, file};
use log::{debug, info};

use crate::errors::{
    Result, file_operation_error, invalid_filename_error, path_escape_error, source_missing_error,
};
use crate::utils::{absolute_path, is_within};

/// How `delete` treats a target that does not exist
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteMode {
    /// Nothing to delete is fine (wiping the release folder before a build)
    Tolerant,
    /// The target is an expected artifact and must be there
    MustExist,
}

/// What `copy_file_or_tree` did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CopyOutcome {
    /// A single file was copied into the destination folder
    File,
    /// A folder was copied as a subfolder of the destination folder
    Folder,
    /// The source did not exist and was not required
    Skipped,
}

/// Validates that `path` is within `chroot` and returns its absolute form
///
/// # Arguments
/// * `path` - The path to check
/// * `chroot` - The allowed root
/// * `action` - Name of the action reported in the error
///
/// # Errors
/// * `PathEscape` if the normalised path is outside of the root
pub fn check_chroot(path: &Path, chroot: &Path, action: &str) -> Result<PathBuf> {
    let abs_path = absolute_path(path)?;
    let abs_chroot = absolute_path(chroot)?;
    if !is_within(&abs_path, &abs_chroot) {
        return Err(path_escape_error(abs_path, abs_chroot, action));
    }
    Ok(abs_path)
}

/// Creates a folder and all its parents inside `chroot`
///
/// # Returns
/// * `Result<bool>` - True if the folder did not exist before
pub fn make_dirs(folder: &Path, chroot: &Path) -> Result<bool> {
    let abs_path = check_chroot(folder, chroot, "MAKE PATH")?;
    if abs_path.is_dir() {
        return Ok(false);
    }
    info!("=> create folder: {}", abs_path.display());
    std::fs::create_dir_all(&abs_path)
        .map_err(|e| file_operation_error(e, abs_path.clone(), "create directory"))?;
    Ok(true)
}

/// Copies a file or a whole folder into a destination folder
///
/// Files land directly in `dest`, overwriting a file with the same name.
/// Folders are copied as `dest/<folder name>`. The destination folder is
/// created on demand, so nothing is created when the source is skipped.
///
/// # Arguments
/// * `src` - The file or folder to copy
/// * `src_chroot` - Root the source must be in
/// * `dest` - The destination folder
/// * `dest_chroot` - Root the destination must be in
/// * `must_exist` - Whether a missing source is an error
///
/// # Errors
/// * `PathEscape` if either path is outside of its root
/// * `SourceMissing` if the source does not exist and `must_exist` is set
/// * `FileOperation` if the copy fails
pub fn copy_file_or_tree(
    src: &Path,
    src_chroot: &Path,
    dest: &Path,
    dest_chroot: &Path,
    must_exist: bool,
) -> Result<CopyOutcome> {
    let abs_src = check_chroot(src, src_chroot, "COPY-FROM")?;
    let abs_dest = check_chroot(dest, dest_chroot, "COPY-TO")?;

    if abs_src.is_file() {
        make_dirs(&abs_dest, dest_chroot)?;
        info!("=> copy file: {}", abs_src.display());
        let file_name = abs_src
            .file_name()
            .ok_or_else(|| invalid_filename_error(abs_src.clone()))?;
        let options = file::CopyOptions::new().overwrite(true);
        file::copy(&abs_src, abs_dest.join(file_name), &options).map_err(|e| {
            file_operation_error(io::Error::other(e), abs_src.clone(), "copy")
        })?;
        Ok(CopyOutcome::File)
    } else if abs_src.is_dir() {
        make_dirs(&abs_dest, dest_chroot)?;
        info!("=> copy folder: {}", abs_src.display());
        let options = dir::CopyOptions::new();
        dir::copy(&abs_src, &abs_dest, &options).map_err(|e| {
            file_operation_error(io::Error::other(e), abs_src.clone(), "copy folder")
        })?;
        Ok(CopyOutcome::Folder)
    } else if must_exist {
        Err(source_missing_error(abs_src))
    } else {
        info!("=> skipping: {}", abs_src.display());
        Ok(CopyOutcome::Skipped)
    }
}

/// Deletes a file or a folder tree inside `chroot`
///
/// # Returns
/// * `Result<bool>` - True if something was deleted
///
/// # Errors
/// * `PathEscape` if the path is outside of the root
/// * `SourceMissing` if nothing exists at the path in `MustExist` mode
pub fn delete(path: &Path, chroot: &Path, mode: DeleteMode) -> Result<bool> {
    let abs_path = check_chroot(path, chroot, "DELETE")?;
    if abs_path.is_file() {
        info!("=> drop file: {}", abs_path.display());
        file::remove(&abs_path).map_err(|e| {
            file_operation_error(io::Error::other(e), abs_path.clone(), "delete")
        })?;
        Ok(true)
    } else if abs_path.is_dir() {
        info!("=> drop folder: {}", abs_path.display());
        dir::remove(&abs_path).map_err(|e| {
            file_operation_error(io::Error::other(e), abs_path.clone(), "delete folder")
        })?;
        Ok(true)
    } else {
        match mode {
            DeleteMode::Tolerant => {
                debug!("=> nothing to drop: {}", abs_path.display());
                Ok(false)
            }
            DeleteMode::MustExist => Err(source_missing_error(abs_path)),
        }
    }
}
