//! Source and destination path resolution
//!
//! Source patterns may reach anywhere inside the project, destination
//! patterns must never leave the release top-level folder.

use std::path::{Path, PathBuf};

use log::debug;

use crate::constants::ROOT_PREFIX;
use crate::errors::{Result, path_escape_error, unresolved_path_error};
use crate::utils::{is_within, normalize_path};

use super::macros::{MacroContext, contains_unresolved};

/// Absolute folders of a release build
///
/// All paths are absolute and normalised. Construct with
/// [`ReleaseLayout::new`], which checks the nesting rules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseLayout {
    /// Repository root, the containment root for every source path
    pub project_root: PathBuf,
    /// Base of relative source patterns
    pub source_root: PathBuf,
    /// Folder wiped before every build (`{RELEASE}`)
    pub release_folder: PathBuf,
    /// Top-level folder of the delivered tree, the containment root for
    /// destination paths (`{RELEASE}/GameData`)
    pub release_root: PathBuf,
    /// Base of relative destination keys (`{RELEASE_MOD_FOLDER}`)
    pub package_root: PathBuf,
}

impl ReleaseLayout {
    /// Builds a layout from absolute folders
    ///
    /// # Errors
    /// * `PathEscape` if the source root is outside the project root
    /// * `PathEscape` if the release folder is the project root itself or
    ///   outside of it, since it gets wiped on every build
    /// * `PathEscape` if the top-level folder is outside the release folder
    /// * `PathEscape` if the package folder is outside the top-level folder
    pub fn new(
        project_root: &Path,
        source_root: &Path,
        release_folder: &Path,
        release_root: &Path,
        package_root: &Path,
    ) -> Result<Self> {
        let layout = ReleaseLayout {
            project_root: normalize_path(project_root),
            source_root: normalize_path(source_root),
            release_folder: normalize_path(release_folder),
            release_root: normalize_path(release_root),
            package_root: normalize_path(package_root),
        };

        if !is_within(&layout.source_root, &layout.project_root) {
            return Err(path_escape_error(
                layout.source_root,
                layout.project_root,
                "SOURCE",
            ));
        }
        if layout.release_folder == layout.project_root
            || !is_within(&layout.release_folder, &layout.project_root)
        {
            return Err(path_escape_error(
                layout.release_folder,
                layout.project_root,
                "RELEASE",
            ));
        }
        if !is_within(&layout.release_root, &layout.release_folder) {
            return Err(path_escape_error(
                layout.release_root,
                layout.release_folder,
                "RELEASE_TOP_FOLDER",
            ));
        }
        if !is_within(&layout.package_root, &layout.release_root) {
            return Err(path_escape_error(
                layout.package_root,
                layout.release_root,
                "RELEASE_MOD_FOLDER",
            ));
        }
        Ok(layout)
    }
}

/// Turns pattern strings into absolute, contained paths
#[derive(Debug, Clone, Copy)]
pub struct PathResolver<'a> {
    layout: &'a ReleaseLayout,
    macros: &'a MacroContext,
}

impl<'a> PathResolver<'a> {
    pub fn new(layout: &'a ReleaseLayout, macros: &'a MacroContext) -> Self {
        PathResolver { layout, macros }
    }

    pub fn layout(&self) -> &'a ReleaseLayout {
        self.layout
    }

    pub fn macros(&self) -> &'a MacroContext {
        self.macros
    }

    /// Expands a source pattern into an absolute path
    ///
    /// A pattern starting with `/` is counted from the project root, any
    /// other pattern from the source folder. Upcasting with `..` is fine as
    /// long as the result stays inside the project root.
    ///
    /// # Errors
    /// * Macro errors from the expansion
    /// * `UnresolvedPath` if a placeholder stays unresolved and
    ///   `allow_unresolved` is false
    /// * `PathEscape` if the path leaves the project root
    pub fn resolve_source_path(&self, pattern: &str, allow_unresolved: bool) -> Result<PathBuf> {
        self.resolve_in(
            pattern,
            &self.layout.project_root,
            &self.layout.source_root,
            allow_unresolved,
            "SOURCE-PATH",
        )
    }

    /// Expands a destination pattern into an absolute path
    ///
    /// A pattern starting with `/` is counted from the release top-level
    /// folder, any other pattern from the package folder. The result must
    /// stay inside the top-level folder.
    pub fn resolve_dest_path(&self, pattern: &str, allow_unresolved: bool) -> Result<PathBuf> {
        self.resolve_in(
            pattern,
            &self.layout.release_root,
            &self.layout.package_root,
            allow_unresolved,
            "RELEASE-PATH",
        )
    }

    fn resolve_in(
        &self,
        pattern: &str,
        root: &Path,
        relative_base: &Path,
        allow_unresolved: bool,
        action: &str,
    ) -> Result<PathBuf> {
        let expanded = self.macros.resolve_with(pattern, allow_unresolved)?;
        let (base, relative) = match expanded.strip_prefix(ROOT_PREFIX) {
            Some(rest) => (root, rest),
            None => (relative_base, expanded.as_str()),
        };
        let path = normalize_path(&base.join(relative.trim_start_matches(ROOT_PREFIX)));

        if contains_unresolved(&expanded) && !allow_unresolved {
            return Err(unresolved_path_error(&path.to_string_lossy()));
        }
        if !is_within(&path, root) {
            return Err(path_escape_error(path, root.to_path_buf(), action));
        }

        debug!("Resolved \"{pattern}\" => {}", path.display());
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::Error;

    fn layout() -> ReleaseLayout {
        ReleaseLayout::new(
            Path::new("/repo"),
            Path::new("/repo/Source"),
            Path::new("/repo/Release"),
            Path::new("/repo/Release/GameData"),
            Path::new("/repo/Release/GameData/KIS"),
        )
        .unwrap()
    }

    fn macros() -> MacroContext {
        MacroContext::new()
            .with("PACKAGE_NAME", "KIS")
            .with("UPCAST", "../..")
            .with_unset("ARCHIVE_DEST")
    }

    #[test]
    fn test_source_paths() {
        let layout = layout();
        let macros = macros();
        let resolver = PathResolver::new(&layout, &macros);

        assert_eq!(
            resolver.resolve_source_path("bin/Release/{PACKAGE_NAME}.dll", false).unwrap(),
            PathBuf::from("/repo/Source/bin/Release/KIS.dll")
        );
        assert_eq!(
            resolver.resolve_source_path("/LICENSE.md", false).unwrap(),
            PathBuf::from("/repo/LICENSE.md")
        );
        assert_eq!(
            resolver.resolve_source_path("../Parts/*.cfg", false).unwrap(),
            PathBuf::from("/repo/Parts/*.cfg")
        );
        assert_eq!(
            resolver.resolve_source_path("", false).unwrap(),
            PathBuf::from("/repo/Source")
        );
    }

    #[test]
    fn test_source_path_escape() {
        let layout = layout();
        let macros = macros();
        let resolver = PathResolver::new(&layout, &macros);

        for pattern in ["../../etc/passwd", "/../outside", "{UPCAST}/x", "/Parts/../../x"] {
            match resolver.resolve_source_path(pattern, false) {
                Err(Error::PathEscape { root, .. }) => assert_eq!(root, PathBuf::from("/repo")),
                other => panic!("Expected escape for {pattern}, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_dest_paths() {
        let layout = layout();
        let macros = macros();
        let resolver = PathResolver::new(&layout, &macros);

        assert_eq!(
            resolver.resolve_dest_path("Parts", false).unwrap(),
            PathBuf::from("/repo/Release/GameData/KIS/Parts")
        );
        assert_eq!(
            resolver.resolve_dest_path("/", false).unwrap(),
            PathBuf::from("/repo/Release/GameData")
        );
        assert_eq!(
            resolver.resolve_dest_path("/Shared/Sub", false).unwrap(),
            PathBuf::from("/repo/Release/GameData/Shared/Sub")
        );
        assert_eq!(
            resolver.resolve_dest_path("..", false).unwrap(),
            PathBuf::from("/repo/Release/GameData")
        );
    }

    #[test]
    fn test_dest_path_escape() {
        let layout = layout();
        let macros = macros();
        let resolver = PathResolver::new(&layout, &macros);

        for pattern in ["../..", "/..", "../../Other", "/../../Source"] {
            match resolver.resolve_dest_path(pattern, false) {
                Err(Error::PathEscape { root, .. }) => {
                    assert_eq!(root, PathBuf::from("/repo/Release/GameData"))
                }
                other => panic!("Expected escape for {pattern}, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_unresolved_paths() {
        let layout = layout();
        let macros = macros();
        let resolver = PathResolver::new(&layout, &macros);

        let result = resolver.resolve_source_path("/{ARCHIVE_DEST}/x.zip", false);
        assert!(matches!(result, Err(Error::UnresolvedPath { .. })));

        let result = resolver.resolve_source_path("{MISSING}/x", false);
        assert!(matches!(result, Err(Error::UnknownMacro { .. })));

        let path = resolver.resolve_source_path("{MISSING}/x", true).unwrap();
        assert!(contains_unresolved(&path.to_string_lossy()));
    }

    #[test]
    fn test_layout_rejects_bad_nesting() {
        let result = ReleaseLayout::new(
            Path::new("/repo"),
            Path::new("/elsewhere"),
            Path::new("/repo/Release"),
            Path::new("/repo/Release/GameData"),
            Path::new("/repo/Release/GameData/KIS"),
        );
        assert!(matches!(result, Err(Error::PathEscape { .. })));

        let result = ReleaseLayout::new(
            Path::new("/repo"),
            Path::new("/repo"),
            Path::new("/repo"),
            Path::new("/repo/GameData"),
            Path::new("/repo/GameData/KIS"),
        );
        assert!(matches!(result, Err(Error::PathEscape { .. })));

        let result = ReleaseLayout::new(
            Path::new("/repo"),
            Path::new("/repo"),
            Path::new("/repo/Release"),
            Path::new("/repo/Release/GameData"),
            Path::new("/repo/Release/Other"),
        );
        assert!(matches!(result, Err(Error::PathEscape { .. })));
    }
}
