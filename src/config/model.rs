//! Settings data structures
//!
//! This module contains the settings file model. Keys are upper-case, the
//! same way they are referenced as `{NAME}` macros.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::Deserialize;

use crate::errors::{Result, generic_error};
use crate::resolve::{MacroContext, ReleaseLayout};
use crate::structure::{FolderPolicy, StructureMapping};

/// Release builder settings
///
/// Every string setting can reference other settings as `{NAME}` macros.
/// Paths starting with `/` are rooted: source paths at the project root,
/// destination paths at the release top-level folder.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields, rename_all = "SCREAMING_SNAKE_CASE")]
pub struct Settings {
    /// Settings format version, checked against the supported one
    pub json_schema_version: Option<String>,
    /// Name of the mod, used by most defaults
    #[serde(default)]
    pub package_name: Option<String>,
    /// Repository root relative to the settings file, or `#github`
    #[serde(default = "default_project_root")]
    pub project_root: String,
    /// Source folder relative to the project root
    #[serde(default = "default_source")]
    pub source: String,
    /// File to extract the version from, relative to `SOURCE`
    #[serde(default = "default_assembly_info_file")]
    pub assembly_info_file: String,
    /// Binary the compile step must produce, relative to `SOURCE`
    #[serde(default = "default_compiled_binary")]
    pub compiled_binary: String,
    /// JSON version file to stamp; `null` or empty disables the step
    #[serde(default = "default_miniavc_version_file")]
    pub miniavc_version_file: Option<String>,
    /// Release folder relative to the project root
    #[serde(default = "default_release")]
    pub release: String,
    /// Top-level folder inside the release folder that gets archived
    #[serde(default = "default_release_top_folder")]
    pub release_top_folder: String,
    /// Package folder inside the top-level folder
    #[serde(default = "default_release_mod_folder")]
    pub release_mod_folder: String,
    /// Folder for the archive, relative to the project root
    #[serde(default)]
    pub archive_dest: String,
    /// Archive name, `%d` placeholders take MAJOR, MINOR and PATCH
    #[serde(default = "default_release_name_fmt")]
    pub release_name_fmt: String,
    /// Archive name when BUILD is not zero, `%d` take all four parts
    #[serde(default = "default_release_name_with_build_fmt")]
    pub release_name_with_build_fmt: String,
    /// Archive name with `{0}`..`{3}` positional version parts; overrides
    /// the other two formats
    #[serde(default)]
    pub release_name_free_format: Option<String>,
    /// Executable that compiles the binary, relative to the settings folder
    #[serde(default)]
    pub shell_compile_binary_script: Option<String>,
    /// Archiver command; the archive path and the top-level folder name are
    /// appended
    #[serde(default = "default_shell_zip_binary")]
    pub shell_zip_binary: Vec<String>,
    /// Changelog to take the release description from, a source path
    #[serde(default)]
    pub changelog_file: Option<String>,
    /// Regex matching the line that ends the release description
    #[serde(default = "default_changelog_breaker")]
    pub changelog_breaker: String,
    /// `owner/name` of the GitHub repository used to expand issue links
    #[serde(default)]
    pub github_repo: Option<String>,
    /// Create every structure folder even when nothing is copied into it
    #[serde(default)]
    pub eager_folders: bool,
    /// Extra user macros
    #[serde(default)]
    pub macros: BTreeMap<String, String>,
    /// Release structure: destination key to source patterns
    #[serde(default)]
    pub structure: BTreeMap<String, Vec<String>>,
}

impl Settings {
    /// Builds the macro context for these settings
    ///
    /// Every string setting is available by its key. `PROJECT_ROOT` is
    /// replaced by the resolved absolute root.
    ///
    /// # Errors
    /// Returns an error if a user macro shadows a setting
    pub fn macro_context(&self, project_root: &str) -> Result<MacroContext> {
        let builtins: Vec<(&str, Option<String>)> = vec![
            ("PACKAGE_NAME", self.package_name.clone()),
            ("PROJECT_ROOT", Some(project_root.to_string())),
            ("SOURCE", Some(self.source.clone())),
            ("ASSEMBLY_INFO_FILE", Some(self.assembly_info_file.clone())),
            ("COMPILED_BINARY", Some(self.compiled_binary.clone())),
            ("MINIAVC_VERSION_FILE", self.miniavc_version_file.clone()),
            ("RELEASE", Some(self.release.clone())),
            ("RELEASE_TOP_FOLDER", Some(self.release_top_folder.clone())),
            ("RELEASE_MOD_FOLDER", Some(self.release_mod_folder.clone())),
            ("ARCHIVE_DEST", Some(self.archive_dest.clone())),
            ("RELEASE_NAME_FMT", Some(self.release_name_fmt.clone())),
            (
                "RELEASE_NAME_WITH_BUILD_FMT",
                Some(self.release_name_with_build_fmt.clone()),
            ),
            ("RELEASE_NAME_FREE_FORMAT", self.release_name_free_format.clone()),
            (
                "SHELL_COMPILE_BINARY_SCRIPT",
                self.shell_compile_binary_script.clone(),
            ),
            ("CHANGELOG_FILE", self.changelog_file.clone()),
            ("GITHUB_REPO", self.github_repo.clone()),
        ];

        for key in self.macros.keys() {
            if builtins.iter().any(|(name, _)| name == key) {
                return Err(generic_error(&format!(
                    "Macro \"{key}\" in MACROS shadows a setting with the same name"
                )));
            }
        }

        Ok(builtins
            .into_iter()
            .map(|(key, value)| (key.to_string(), value))
            .chain(
                self.macros
                    .iter()
                    .map(|(key, value)| (key.clone(), Some(value.clone()))),
            )
            .collect())
    }

    /// Parses the `STRUCTURE` table into the typed mapping
    pub fn structure_mapping(&self) -> Result<StructureMapping> {
        StructureMapping::from_settings(&self.structure)
    }

    pub fn folder_policy(&self) -> FolderPolicy {
        if self.eager_folders {
            FolderPolicy::Eager
        } else {
            FolderPolicy::Lazy
        }
    }
}

/// Settings with every root resolved, built once per run
#[derive(Debug, Clone)]
pub struct ReleaseConfig {
    pub settings: Settings,
    /// Folder of the settings file, the working folder of the compile step
    pub settings_dir: PathBuf,
    pub macros: MacroContext,
    pub layout: ReleaseLayout,
    pub mapping: StructureMapping,
}

fn default_project_root() -> String {
    crate::constants::GITHUB_PROJECT_ROOT.to_string()
}

fn default_source() -> String {
    "Source".to_string()
}

fn default_assembly_info_file() -> String {
    "Properties/AssemblyInfo.cs".to_string()
}

fn default_compiled_binary() -> String {
    "bin/Release/{PACKAGE_NAME}.dll".to_string()
}

fn default_miniavc_version_file() -> Option<String> {
    Some("/{PACKAGE_NAME}.version".to_string())
}

fn default_release() -> String {
    "Release".to_string()
}

fn default_release_top_folder() -> String {
    "GameData".to_string()
}

fn default_release_mod_folder() -> String {
    "{PACKAGE_NAME}".to_string()
}

fn default_release_name_fmt() -> String {
    "{PACKAGE_NAME}_v%d.%d.%d".to_string()
}

fn default_release_name_with_build_fmt() -> String {
    "{PACKAGE_NAME}_v%d.%d.%d_build%d".to_string()
}

fn default_shell_zip_binary() -> Vec<String> {
    vec!["zip".to_string(), "-r".to_string(), "-q".to_string()]
}

fn default_changelog_breaker() -> String {
    r"^\s*$".to_string()
}
