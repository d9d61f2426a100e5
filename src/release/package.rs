//! Release packaging
//!
//! Names the archive after the release version and runs the configured
//! archiver on the release top-level folder.

use std::path::{Path, PathBuf};
use std::process::Command;

use log::{info, warn};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::config::Settings;
use crate::errors::{Result, command_error, file_operation_error, generic_error, source_missing_error};
use crate::file_ops::{DeleteMode, delete, make_dirs};
use crate::resolve::PathResolver;

use super::version::ReleaseVersion;

/// Extension of the archives built by the archiver
pub const ARCHIVE_EXTENSION: &str = "zip";

static POSITIONAL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\{([0-3])\}").expect("Failed to compile regex pattern for POSITIONAL_RE")
});

static RELEASE_TAG_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^.+?_v(.+?)\.zip$").expect("Failed to compile regex pattern for RELEASE_TAG_RE")
});

/// Substitutes `%d` placeholders with the given numbers in order
///
/// `%%` is a literal percent sign.
///
/// # Errors
/// Returns an error if the number of placeholders differs from the number
/// of values
pub fn format_printf(format: &str, values: &[u32]) -> Result<String> {
    let mut result = String::with_capacity(format.len());
    let mut values_iter = values.iter();
    let mut chars = format.chars();
    while let Some(c) = chars.next() {
        if c != '%' {
            result.push(c);
            continue;
        }
        match chars.next() {
            Some('%') => result.push('%'),
            Some('d') => {
                let value = values_iter.next().ok_or_else(|| {
                    generic_error(&format!("Not enough values for format \"{format}\""))
                })?;
                result.push_str(&value.to_string());
            }
            other => {
                return Err(generic_error(&format!(
                    "Unsupported placeholder \"%{}\" in format \"{format}\"",
                    other.map(String::from).unwrap_or_default()
                )));
            }
        }
    }
    if values_iter.next().is_some() {
        return Err(generic_error(&format!(
            "Too many values for format \"{format}\""
        )));
    }
    Ok(result)
}

/// Substitutes `{0}`..`{3}` with the version parts
pub fn format_positional(format: &str, version: ReleaseVersion) -> String {
    let parts = version.parts();
    POSITIONAL_RE
        .replace_all(format, |captures: &regex::Captures| {
            captures[1]
                .parse::<usize>()
                .ok()
                .and_then(|index| parts.get(index))
                .map(u32::to_string)
                .unwrap_or_default()
        })
        .into_owned()
}

/// Builds the archive base name for a version
///
/// `RELEASE_NAME_FREE_FORMAT` wins when set. Otherwise the build format is
/// used for a non-zero build and the three-part format for the rest.
pub fn release_name(
    settings: &Settings,
    resolver: &PathResolver,
    version: ReleaseVersion,
) -> Result<String> {
    let macros = resolver.macros();
    match settings.release_name_free_format.as_deref() {
        Some(free_format) if !free_format.is_empty() => {
            Ok(format_positional(&macros.resolve(free_format)?, version))
        }
        _ if version.build != 0 => macros.resolve(&format_printf(
            &settings.release_name_with_build_fmt,
            &version.parts(),
        )?),
        _ => macros.resolve(&format_printf(
            &settings.release_name_fmt,
            &version.parts()[..3],
        )?),
    }
}

/// Absolute path of the archive for a release name
///
/// The archive goes into `ARCHIVE_DEST`, counted from the project root.
pub fn archive_path(settings: &Settings, resolver: &PathResolver, name: &str) -> Result<PathBuf> {
    let relative = if settings.archive_dest.is_empty() {
        format!("/{name}.{ARCHIVE_EXTENSION}")
    } else {
        format!("/{}/{name}.{ARCHIVE_EXTENSION}", settings.archive_dest)
    };
    resolver.resolve_source_path(&relative, false)
}

/// Archives the release top-level folder
///
/// The archiver runs in the release folder and gets the archive path and the
/// top-level folder name appended to its arguments.
///
/// # Errors
/// * `Generic` if the archive exists and `overwrite` is false, or the
///   archiver command is empty
/// * `Command` if the archiver fails
/// * `SourceMissing` if the archive was not created
pub fn make_archive(
    archiver: &[String],
    archive: &Path,
    resolver: &PathResolver,
    overwrite: bool,
) -> Result<PathBuf> {
    let layout = resolver.layout();
    if archive.exists() {
        if !overwrite {
            return Err(generic_error(&format!(
                "Package for this version already exists: {}",
                archive.display()
            )));
        }
        warn!("=> package already exists. DELETING.");
        delete(archive, &layout.project_root, DeleteMode::MustExist)?;
    }
    if let Some(parent) = archive.parent() {
        make_dirs(parent, &layout.project_root)?;
    }

    let (program, args) = archiver
        .split_first()
        .ok_or_else(|| generic_error("Archiver command is empty"))?;
    let top_folder = layout
        .release_root
        .strip_prefix(&layout.release_folder)
        .map_err(|_| source_missing_error(layout.release_root.clone()))?;

    info!("=> archiver: {}", archiver.join(" "));
    let status = Command::new(program)
        .args(args)
        .arg(archive)
        .arg(top_folder)
        .current_dir(&layout.release_folder)
        .status()
        .map_err(|e| file_operation_error(e, PathBuf::from(program), "execute"))?;
    if !status.success() {
        return Err(command_error(program, status.code()));
    }
    if !archive.exists() {
        return Err(source_missing_error(archive.to_path_buf()));
    }
    info!("=> stored in: {}", archive.display());
    Ok(archive.to_path_buf())
}

/// Extracts the release tag from an archive file name
///
/// `KIS_v1.2.3.zip` gives `1.2.3`.
pub fn release_tag(archive_name: &str) -> Option<String> {
    RELEASE_TAG_RE
        .captures(archive_name)
        .map(|captures| captures[1].to_string())
}
