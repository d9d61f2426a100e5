//! Release version extraction and stamping
//!
//! The version comes from the `AssemblyVersion` attribute of the sources and
//! is written back into the JSON version file shipped with the release.

use std::fmt;
use std::fs;
use std::path::Path;

use log::{info, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use serde_json::{Value, json};

use crate::errors::{Result, file_operation_error, version_extraction_error};

/// Matches `[assembly: AssemblyVersion("X.Y.Z")]` with an optional fourth
/// part; patch and build may be `*`
static ASSEMBLY_VERSION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"^\s*\[assembly: AssemblyVersion.*\("(\d+)\.(\d+)\.(\*|\d+)(.(\*|\d+))?"\)\]"#)
        .expect("Failed to compile regex pattern for ASSEMBLY_VERSION_RE")
});

/// Four-part release version
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct ReleaseVersion {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
    pub build: u32,
}

impl ReleaseVersion {
    pub fn new(major: u32, minor: u32, patch: u32, build: u32) -> Self {
        ReleaseVersion {
            major,
            minor,
            patch,
            build,
        }
    }

    pub fn parts(&self) -> [u32; 4] {
        [self.major, self.minor, self.patch, self.build]
    }
}

impl fmt::Display for ReleaseVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "v{}.{}, patch {}, build {}",
            self.major, self.minor, self.patch, self.build
        )
    }
}

/// Finds the assembly version in the content of a source file
///
/// Lines commented out with `//` are skipped. Returns `None` when no line
/// has the attribute. Auto-generated parts (`*`) fall back to 0.
pub fn parse_assembly_version(content: &str) -> Option<std::result::Result<ReleaseVersion, String>> {
    content
        .lines()
        .filter(|line| !line.trim_start().starts_with("//"))
        .find_map(|line| ASSEMBLY_VERSION_RE.captures(line))
        .map(|captures| -> std::result::Result<ReleaseVersion, String> {
            let part = |index: usize, name: &str| -> std::result::Result<u32, String> {
                match captures.get(index).map(|m| m.as_str()) {
                    None => Ok(0),
                    Some("*") => {
                        warn!("Couldn't resolve version {name}, fallback to 0");
                        Ok(0)
                    }
                    Some(value) => value
                        .parse()
                        .map_err(|e| format!("Bad version {name} \"{value}\": {e}")),
                }
            };
            Ok(ReleaseVersion::new(
                part(1, "MAJOR")?,
                part(2, "MINOR")?,
                part(3, "PATCH")?,
                part(5, "BUILD")?,
            ))
        })
}

/// Extracts the release version from an assembly info file
///
/// # Errors
/// * `FileOperation` if the file cannot be read
/// * `VersionExtraction` if there is no version attribute or it is malformed
pub fn extract_version(file: &Path) -> Result<ReleaseVersion> {
    info!("Extract release version...");
    info!("=> AssemblyInfo: {}", file.display());
    let content = fs::read_to_string(file)
        .map_err(|e| file_operation_error(e, file.to_path_buf(), "read"))?;

    let version = parse_assembly_version(&content)
        .ok_or_else(|| version_extraction_error(file.to_path_buf(), "no AssemblyVersion attribute"))?
        .map_err(|detail| version_extraction_error(file.to_path_buf(), &detail))?;
    info!("=> found version: {version}");
    Ok(version)
}

/// Writes the version into the `VERSION` object of a JSON version file
///
/// The file is rewritten with sorted keys and four-space indentation.
///
/// # Errors
/// * `FileOperation` if the file cannot be read or written
/// * `VersionExtraction` if the file is not JSON or has no `VERSION` object
pub fn update_version_file(file: &Path, version: ReleaseVersion) -> Result<()> {
    info!("Update version file: {}", file.display());
    let content = fs::read_to_string(file)
        .map_err(|e| file_operation_error(e, file.to_path_buf(), "read"))?;
    let mut document: Value = serde_json::from_str(&content)
        .map_err(|e| version_extraction_error(file.to_path_buf(), &e.to_string()))?;

    let version_object = document
        .get_mut("VERSION")
        .and_then(Value::as_object_mut)
        .ok_or_else(|| version_extraction_error(file.to_path_buf(), "cannot find VERSION"))?;
    version_object.insert("MAJOR".to_string(), json!(version.major));
    version_object.insert("MINOR".to_string(), json!(version.minor));
    version_object.insert("PATCH".to_string(), json!(version.patch));
    version_object.insert("BUILD".to_string(), json!(version.build));

    let mut buffer = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buffer, formatter);
    document
        .serialize(&mut serializer)
        .map_err(|e| version_extraction_error(file.to_path_buf(), &e.to_string()))?;
    fs::write(file, buffer).map_err(|e| file_operation_error(e, file.to_path_buf(), "write"))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(content: &str) -> ReleaseVersion {
        parse_assembly_version(content).unwrap().unwrap()
    }

    #[test]
    fn test_three_and_four_part_versions() {
        assert_eq!(
            parse(r#"[assembly: AssemblyVersion("1.4.2")]"#),
            ReleaseVersion::new(1, 4, 2, 0)
        );
        assert_eq!(
            parse(r#"[assembly: AssemblyVersion("1.4.2.7")]"#),
            ReleaseVersion::new(1, 4, 2, 7)
        );
    }

    #[test]
    fn test_auto_parts_fall_back_to_zero() {
        assert_eq!(
            parse(r#"[assembly: AssemblyVersion("2.0.*")]"#),
            ReleaseVersion::new(2, 0, 0, 0)
        );
        assert_eq!(
            parse(r#"[assembly: AssemblyVersion("2.0.3.*")]"#),
            ReleaseVersion::new(2, 0, 3, 0)
        );
    }

    #[test]
    fn test_comments_are_skipped() {
        let content = r#"
using System.Reflection;
// [assembly: AssemblyVersion("9.9.9")]
[assembly: AssemblyTitle("KIS")]
[assembly: AssemblyVersion("1.2.3")]
[assembly: AssemblyFileVersion("1.2.3.4")]
"#;
        assert_eq!(parse(content), ReleaseVersion::new(1, 2, 3, 0));
        assert!(parse_assembly_version("// nothing here").is_none());
    }

    #[test]
    fn test_extract_version_missing_attribute() {
        let temp = tempfile::tempdir().unwrap();
        let file = temp.path().join("AssemblyInfo.cs");
        fs::write(&file, "[assembly: AssemblyTitle(\"KIS\")]\n").unwrap();
        assert!(matches!(
            extract_version(&file),
            Err(crate::errors::Error::VersionExtraction { .. })
        ));
    }

    #[test]
    fn test_update_version_file() {
        let temp = tempfile::tempdir().unwrap();
        let file = temp.path().join("KIS.version");
        fs::write(
            &file,
            r#"{"NAME": "KIS", "VERSION": {"MAJOR": 0, "MINOR": 0, "PATCH": 0, "BUILD": 0}, "DOWNLOAD": "x"}"#,
        )
        .unwrap();

        update_version_file(&file, ReleaseVersion::new(1, 2, 3, 4)).unwrap();
        let content = fs::read_to_string(&file).unwrap();
        let document: Value = serde_json::from_str(&content).unwrap();
        assert_eq!(document["VERSION"]["MAJOR"], 1);
        assert_eq!(document["VERSION"]["BUILD"], 4);
        assert_eq!(document["NAME"], "KIS");
        assert!(content.contains("\n    \"DOWNLOAD\""), "Four-space indent: {content}");
        assert!(
            content.find("DOWNLOAD").unwrap() < content.find("NAME").unwrap(),
            "Keys are sorted"
        );
    }

    #[test]
    fn test_update_version_file_without_version() {
        let temp = tempfile::tempdir().unwrap();
        let file = temp.path().join("KIS.version");
        fs::write(&file, r#"{"NAME": "KIS"}"#).unwrap();
        assert!(update_version_file(&file, ReleaseVersion::default()).is_err());
    }
}
