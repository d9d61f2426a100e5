//! Release structure assembly
//!
//! Walks the mapping in processing order and materialises every entry in
//! the release folder. The first error aborts the assembly; whatever was
//! already copied stays on disk until the next build wipes it.
//!
//! Running two assemblies against the same release folder at the same time
//! is not supported.

use std::path::{Component, Path, PathBuf};

use glob::{MatchOptions, Pattern, glob_with};
use log::{debug, info, warn};

use crate::errors::{
    Result, file_operation_error, glob_pattern_error, invalid_deletion_scope_error,
    no_match_error,
};
use crate::file_ops::{CopyOutcome, DeleteMode, copy_file_or_tree, delete, make_dirs};
use crate::resolve::{PathResolver, contains_unresolved};
use crate::utils::path_to_str;

use super::mapping::{MappingEntry, PatternKind, SourcePattern, StructureMapping};

/// When the folder of a mapping entry is created
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FolderPolicy {
    /// Only when the first item is copied into it
    #[default]
    Lazy,
    /// For every entry, even when nothing gets copied
    Eager,
}

/// Counters of what an assembly did
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AssemblyReport {
    pub entries: usize,
    pub folders_created: usize,
    pub files_copied: usize,
    pub folders_copied: usize,
    pub items_deleted: usize,
    pub patterns_skipped: usize,
}

/// Materialises a [`StructureMapping`] in the release folder
#[derive(Debug, Clone, Copy)]
pub struct StructureAssembler<'a> {
    resolver: PathResolver<'a>,
    folder_policy: FolderPolicy,
    sources_must_exist: bool,
}

impl<'a> StructureAssembler<'a> {
    pub fn new(resolver: PathResolver<'a>) -> Self {
        StructureAssembler {
            resolver,
            folder_policy: FolderPolicy::Lazy,
            sources_must_exist: true,
        }
    }

    pub fn folder_policy(mut self, policy: FolderPolicy) -> Self {
        self.folder_policy = policy;
        self
    }

    /// Whether a matched source that vanished before the copy is an error
    pub fn sources_must_exist(mut self, must_exist: bool) -> Self {
        self.sources_must_exist = must_exist;
        self
    }

    /// Builds the release structure
    ///
    /// # Errors
    /// Any macro, path, matching or filesystem error of any entry. Entries
    /// processed before the failing one are not rolled back.
    pub fn assemble(&self, mapping: &StructureMapping) -> Result<AssemblyReport> {
        info!("=== START: Building release structure:");
        let mut report = AssemblyReport::default();
        for entry in mapping.ordered_entries() {
            self.assemble_entry(entry, &mut report)?;
            report.entries += 1;
        }
        info!("=== END: Building release structure");
        debug!("{report:?}");
        Ok(report)
    }

    fn assemble_entry(&self, entry: &MappingEntry, report: &mut AssemblyReport) -> Result<()> {
        let layout = self.resolver.layout();
        let dest_path = self.resolver.resolve_dest_path(&entry.destination_key, false)?;
        info!("Release folder: {}", dest_path.display());

        if self.folder_policy == FolderPolicy::Eager && make_dirs(&dest_path, &layout.release_root)? {
            report.folders_created += 1;
        }
        let existed = dest_path.is_dir();

        if let Some(copy_sources) = self.collect_copy_sources(entry, report)? {
            if copy_sources.is_empty() {
                info!("=> skip empty folder: {}", dest_path.display());
            }
            for source in &copy_sources {
                let outcome = copy_file_or_tree(
                    source,
                    &layout.project_root,
                    &dest_path,
                    &layout.release_root,
                    self.sources_must_exist,
                )?;
                match outcome {
                    CopyOutcome::File => report.files_copied += 1,
                    CopyOutcome::Folder => report.folders_copied += 1,
                    CopyOutcome::Skipped => {}
                }
            }
        }
        if !existed && dest_path.is_dir() {
            report.folders_created += 1;
        }

        for pattern in entry.delete_patterns() {
            self.drop_matches(entry, &dest_path, pattern, report)?;
        }
        Ok(())
    }

    /// Expands the copy patterns of an entry
    ///
    /// Returns `None` when the entry has no copy pattern that got as far as
    /// matching, and the (possibly empty) list of matches otherwise.
    fn collect_copy_sources(
        &self,
        entry: &MappingEntry,
        report: &mut AssemblyReport,
    ) -> Result<Option<Vec<PathBuf>>> {
        let mut copy_sources: Option<Vec<PathBuf>> = None;
        for source_pattern in entry.copy_patterns() {
            let allow_no_matches = source_pattern.kind == PatternKind::Optional;
            let pattern = self
                .resolver
                .resolve_source_path(&source_pattern.pattern, allow_no_matches)?;
            let pattern_str = path_to_str(&pattern)?;
            if allow_no_matches && contains_unresolved(pattern_str) {
                info!("=> skip unresolved copy pattern: {pattern_str}");
                report.patterns_skipped += 1;
                continue;
            }

            let layout = self.resolver.layout();
            let root = if pattern.starts_with(&layout.source_root) {
                &layout.source_root
            } else {
                &layout.project_root
            };
            let entry_sources = glob_matches(&literal_root_pattern(root, &pattern)?)?;
            if entry_sources.is_empty() {
                if !allow_no_matches {
                    return Err(no_match_error(pattern_str));
                }
                info!("=> skip copy pattern \"{pattern_str}\" since no matches found");
                report.patterns_skipped += 1;
            }
            copy_sources
                .get_or_insert_with(Vec::new)
                .extend(entry_sources);
        }
        Ok(copy_sources)
    }

    /// Deletes the release items selected by a cleanup pattern
    fn drop_matches(
        &self,
        entry: &MappingEntry,
        dest_path: &Path,
        source_pattern: &SourcePattern,
        report: &mut AssemblyReport,
    ) -> Result<()> {
        let joined = if entry.destination_key.is_empty() {
            source_pattern.pattern.clone()
        } else {
            format!("{}/{}", entry.destination_key, source_pattern.pattern)
        };
        let cleanup_path = self.resolver.resolve_dest_path(&joined, false)?;
        if !is_direct_child(&source_pattern.pattern, &cleanup_path, dest_path) {
            return Err(invalid_deletion_scope_error(
                cleanup_path,
                dest_path.to_path_buf(),
            ));
        }

        let cleanup_str = path_to_str(&cleanup_path)?;
        let targets = glob_matches(&literal_root_pattern(dest_path, &cleanup_path)?)?;
        if targets.is_empty() {
            info!("=> skip cleanup pattern \"{cleanup_str}\" since no matches found");
            report.patterns_skipped += 1;
            return Ok(());
        }
        for target in targets {
            if target.parent() != Some(dest_path) {
                warn!("=> not a direct child, keep: {}", target.display());
                continue;
            }
            if delete(&target, &self.resolver.layout().release_root, DeleteMode::Tolerant)? {
                report.items_deleted += 1;
            }
        }
        Ok(())
    }
}

/// A cleanup pattern may only name entries directly inside the folder of
/// its own entry: no root prefix, no nesting, no upcasting.
fn is_direct_child(raw_pattern: &str, cleanup_path: &Path, dest_path: &Path) -> bool {
    if raw_pattern.starts_with(crate::constants::ROOT_PREFIX) {
        return false;
    }
    match cleanup_path.strip_prefix(dest_path) {
        Ok(relative) => {
            let mut components = relative.components();
            matches!(
                (components.next(), components.next()),
                (Some(Component::Normal(_)), None)
            )
        }
        Err(_) => false,
    }
}

/// Builds a glob pattern from a resolved path where `root` is taken
/// literally and only the part below it is matched
fn literal_root_pattern(root: &Path, path: &Path) -> Result<String> {
    let relative = match path.strip_prefix(root) {
        Ok(relative) => relative,
        Err(_) => return Ok(Pattern::escape(path_to_str(path)?)),
    };
    let mut pattern = Pattern::escape(path_to_str(root)?);
    if !relative.as_os_str().is_empty() {
        if !pattern.ends_with(std::path::MAIN_SEPARATOR) {
            pattern.push(std::path::MAIN_SEPARATOR);
        }
        pattern.push_str(path_to_str(relative)?);
    }
    Ok(pattern)
}

/// Expands a glob pattern against the filesystem
///
/// `*` and `?` do not cross folder boundaries, `**` matches any number of
/// nested folders, and names starting with a dot are only matched by a
/// pattern that spells the dot out.
pub fn glob_matches(pattern: &str) -> Result<Vec<PathBuf>> {
    let options = MatchOptions {
        case_sensitive: true,
        require_literal_separator: true,
        require_literal_leading_dot: true,
    };
    glob_with(pattern, options)
        .map_err(|e| glob_pattern_error(e, pattern))?
        .map(|res| {
            res.map_err(|e| {
                let path = e.path().to_path_buf();
                file_operation_error(std::io::Error::from(e), path, "access")
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_direct_child() {
        let dest = Path::new("/r/GameData/KIS/Parts");
        assert!(is_direct_child("*.bak", Path::new("/r/GameData/KIS/Parts/*.bak"), dest));
        assert!(!is_direct_child("sub/x", Path::new("/r/GameData/KIS/Parts/sub/x"), dest));
        assert!(!is_direct_child("..", Path::new("/r/GameData/KIS"), dest));
        assert!(!is_direct_child(".", Path::new("/r/GameData/KIS/Parts"), dest));
        assert!(!is_direct_child("/x", Path::new("/r/GameData/KIS/Parts/x"), dest));
        assert!(!is_direct_child("../Other/x", Path::new("/r/GameData/KIS/Other/x"), dest));
    }

    #[test]
    fn test_glob_matches_recursive() {
        let temp = tempfile::tempdir().unwrap();
        let root = temp.path();
        std::fs::create_dir_all(root.join("Parts/Sub/Deep")).unwrap();
        std::fs::write(root.join("Parts/a.cfg"), "").unwrap();
        std::fs::write(root.join("Parts/Sub/b.cfg"), "").unwrap();
        std::fs::write(root.join("Parts/Sub/Deep/c.cfg"), "").unwrap();
        std::fs::write(root.join("Parts/Sub/readme.txt"), "").unwrap();
        std::fs::write(root.join("Parts/.hidden.cfg"), "").unwrap();

        let pattern = format!("{}/Parts/**/*.cfg", root.display());
        let matches = glob_matches(&pattern).unwrap();
        let names: Vec<String> = matches
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names.len(), 3, "Unexpected matches: {names:?}");
        for expected in ["a.cfg", "b.cfg", "c.cfg"] {
            assert!(names.contains(&expected.to_string()));
        }

        // A single star stays within one folder
        let pattern = format!("{}/Parts/*.cfg", root.display());
        assert_eq!(glob_matches(&pattern).unwrap().len(), 1);
    }

    #[cfg(unix)]
    #[test]
    fn test_literal_root_pattern() {
        let root = Path::new("/repo/My [Mod]");
        let pattern = literal_root_pattern(root, &root.join("Parts/*.cfg")).unwrap();
        assert_eq!(pattern, "/repo/My [[]Mod[]]/Parts/*.cfg");
        assert_eq!(literal_root_pattern(root, root).unwrap(), "/repo/My [[]Mod[]]");
        assert_eq!(
            literal_root_pattern(Path::new("/other"), Path::new("/x/*")).unwrap(),
            "/x/[*]"
        );
    }

    #[test]
    fn test_glob_matches_invalid_pattern() {
        assert!(matches!(
            glob_matches("/tmp/[unclosed"),
            Err(crate::errors::Error::GlobPattern { .. })
        ));
    }
}
