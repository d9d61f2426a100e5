//! Settings loading functionality
//!
//! This module reads the settings file, checks its schema version and turns
//! it into a [`ReleaseConfig`] with every root resolved.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use log::{debug, info};

use crate::constants::{
    GITHUB_PROJECT_ROOT, MAX_REPOSITORY_SEARCH_DEPTH, SUPPORTED_JSON_SCHEMA_VERSION,
};
use crate::resolve::{ReleaseLayout, contains_unresolved};
use crate::utils::{absolute_path, expand_path, normalize_path};

use super::model::{ReleaseConfig, Settings};

/// Loads settings from a file
///
/// Files ending in `.yaml` or `.yml` are read as YAML, anything else as
/// JSON.
///
/// # Errors
/// Returns an error if the file cannot be read, cannot be parsed, has an
/// unknown key or an unsupported schema version
pub fn load_settings(file: &Path) -> Result<Settings> {
    info!("Load settings from: {}", file.display());
    let content = fs::read_to_string(file)
        .with_context(|| format!("Failed to read settings file {}", file.display()))?;

    let is_yaml = matches!(
        file.extension().and_then(|ext| ext.to_str()),
        Some("yaml" | "yml")
    );
    let settings: Settings = if is_yaml {
        serde_yaml::from_str(&content).map_err(|e| {
            anyhow!(
                "Failed to parse settings file {}: {}\nPlease check the YAML syntax.",
                file.display(),
                e
            )
        })?
    } else {
        serde_json::from_str(&content).map_err(|e| {
            anyhow!(
                "Failed to parse settings file {}: {}\nPlease check the JSON syntax.",
                file.display(),
                e
            )
        })?
    };

    check_schema_version(settings.json_schema_version.as_deref())?;
    Ok(settings)
}

/// Checks that settings of this schema version can be handled
///
/// A version is supported when its major part equals the supported one and
/// its minor part is not newer.
pub fn check_schema_version(schema_version: Option<&str>) -> Result<()> {
    let schema_version = schema_version.ok_or_else(|| anyhow!("JSON schema is not defined"))?;
    let (major, minor) = parse_schema_version(schema_version)?;
    let (supported_major, supported_minor) = parse_schema_version(SUPPORTED_JSON_SCHEMA_VERSION)?;
    if major != supported_major || minor > supported_minor {
        return Err(anyhow!(
            "Unsupported schema version {schema_version} (supported: {SUPPORTED_JSON_SCHEMA_VERSION})"
        ));
    }
    Ok(())
}

fn parse_schema_version(version: &str) -> Result<(u32, u32)> {
    let (major, minor) = version
        .split_once('.')
        .ok_or_else(|| anyhow!("Malformed schema version: {version}"))?;
    let major = major
        .trim()
        .parse()
        .with_context(|| format!("Malformed schema version: {version}"))?;
    let minor = minor
        .trim()
        .parse()
        .with_context(|| format!("Malformed schema version: {version}"))?;
    Ok((major, minor))
}

/// Finds the repository that contains `start`
///
/// Walks up the folder tree until a folder with a `.git` entry is found.
pub fn find_repository_root(start: &Path) -> Result<PathBuf> {
    let mut current = absolute_path(start)?;
    for _ in 0..MAX_REPOSITORY_SEARCH_DEPTH {
        if current.join(".git").exists() {
            return Ok(current);
        }
        match current.parent() {
            Some(parent) => current = parent.to_path_buf(),
            None => break,
        }
    }
    Err(anyhow!(
        "Cannot find GitHub repository for: {}",
        start.display()
    ))
}

/// Resolves the absolute project root
///
/// `#github` looks for the enclosing repository of the settings folder. Any
/// other value is counted from the settings folder, with `~` and environment
/// variables expanded.
pub fn resolve_project_root(project_root: &str, settings_dir: &Path) -> Result<PathBuf> {
    if project_root == GITHUB_PROJECT_ROOT {
        let root = find_repository_root(settings_dir)?;
        info!("Found GitHub repository at: {}", root.display());
        Ok(root)
    } else {
        let root = absolute_path(&settings_dir.join(expand_path(project_root)))?;
        info!(
            "Set repository path from settings: {} (PROJECT_ROOT={project_root})",
            root.display()
        );
        Ok(root)
    }
}

/// Builds the run configuration from loaded settings
///
/// # Errors
/// Returns an error if a root cannot be resolved, a root setting has an
/// unresolved macro, the folders are not nested properly or the structure
/// table is malformed
pub fn build_release_config(settings: Settings, settings_dir: &Path) -> Result<ReleaseConfig> {
    let settings_dir = absolute_path(settings_dir)?;
    let project_root = resolve_project_root(&settings.project_root, &settings_dir)?;
    let macros = settings.macro_context(&project_root.to_string_lossy())?;

    let resolve_folder = |key: &str, value: &str| -> Result<String> {
        let resolved = macros
            .resolve(value)
            .with_context(|| format!("Cannot resolve {key}"))?;
        if contains_unresolved(&resolved) {
            return Err(anyhow!("Setting {key} is unresolved: {resolved}"));
        }
        Ok(resolved)
    };

    let source_root = project_root.join(resolve_folder("SOURCE", &settings.source)?);
    let release_folder = project_root.join(resolve_folder("RELEASE", &settings.release)?);
    let release_root = release_folder.join(resolve_folder(
        "RELEASE_TOP_FOLDER",
        &settings.release_top_folder,
    )?);
    let package_root = release_root.join(resolve_folder(
        "RELEASE_MOD_FOLDER",
        &settings.release_mod_folder,
    )?);

    let layout = ReleaseLayout::new(
        &project_root,
        &normalize_path(&source_root),
        &release_folder,
        &release_root,
        &package_root,
    )?;
    debug!("{layout:?}");

    let mapping = settings.structure_mapping()?;
    info!("Release structure has {} entries", mapping.len());

    Ok(ReleaseConfig {
        settings,
        settings_dir,
        macros,
        layout,
        mapping,
    })
}

/// Loads a settings file and builds the run configuration from it
///
/// The folder of the file becomes the working folder of the build.
pub fn load_release_config(file: &Path) -> Result<ReleaseConfig> {
    let file = absolute_path(file)?;
    let settings = load_settings(&file)?;
    let settings_dir = file
        .parent()
        .ok_or_else(|| anyhow!("Settings file has no parent folder: {}", file.display()))?;
    build_release_config(settings, settings_dir)
}
