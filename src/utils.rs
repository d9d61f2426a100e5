use std::fs::create_dir_all;
use std::path::{Component, Path, PathBuf};

use directories::ProjectDirs;

use crate::constants::{APPLICATION, ORGANIZATION, QUALIFIER};
use crate::errors::{Result, file_operation_error, generic_error, invalid_filename_error};

/// Lexically normalises a path
///
/// `.` components are dropped, `..` removes the previous component and
/// repeated separators collapse. The filesystem is never consulted, so
/// symlinks are not followed. A `..` directly under the root stays at the
/// root, the same way `/..` names `/`.
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match normalized.components().next_back() {
                Some(Component::Normal(_)) => {
                    normalized.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => normalized.push(".."),
            },
            other => normalized.push(other.as_os_str()),
        }
    }
    if normalized.as_os_str().is_empty() {
        normalized.push(".");
    }
    normalized
}

/// Makes a path absolute against the working directory and normalises it
pub fn absolute_path(path: &Path) -> Result<PathBuf> {
    let absolute = std::path::absolute(path)
        .map_err(|e| file_operation_error(e, path.to_path_buf(), "make absolute"))?;
    Ok(normalize_path(&absolute))
}

/// Checks whether `path` is equal to or nested under `root`
///
/// Both paths are normalised first and compared component by component, so
/// `/a/bc` is not considered to be inside `/a/b`.
pub fn is_within(path: &Path, root: &Path) -> bool {
    normalize_path(path).starts_with(normalize_path(root))
}

/// Converts a path to `&str`, failing on non-unicode names
pub fn path_to_str(path: &Path) -> Result<&str> {
    path.to_str()
        .ok_or_else(|| invalid_filename_error(path.to_path_buf()))
}

/// Expands `~` and environment variables in a settings path
///
/// Unknown variables are left as written.
pub fn expand_path(path: &str) -> String {
    match shellexpand::full(path) {
        Ok(expanded) => expanded.to_string(),
        Err(_) => shellexpand::tilde(path).to_string(),
    }
}

pub(crate) fn find_project_folder() -> Result<ProjectDirs> {
    let folder = ProjectDirs::from(QUALIFIER, ORGANIZATION, APPLICATION)
        .ok_or_else(|| generic_error("Failed to determine project directories"))?;

    if !folder.data_dir().exists() {
        create_dir_all(folder.data_dir()).map_err(|e| {
            file_operation_error(e, folder.data_dir().to_path_buf(), "create directory")
        })?;
    }
    Ok(folder)
}
