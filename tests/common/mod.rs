#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

pub const ASSEMBLY_INFO: &str = r#"using System.Reflection;

[assembly: AssemblyTitle("KIS")]
// [assembly: AssemblyVersion("0.0.1")]
[assembly: AssemblyVersion("1.4.2.7")]
"#;

pub const VERSION_FILE: &str = r#"{
    "NAME": "KIS",
    "URL": "https://example.com/KIS.version",
    "VERSION": {"MAJOR": 0, "MINOR": 0, "PATCH": 0, "BUILD": 0}
}"#;

pub const CHANGELOG: &str = "# 1.4.2 (2024-05-01)\n* [Fix #33] Stacking of parts.\n* See [setup](wiki/Setup).\n\n# 1.4.1\n* Older entry\n";

pub const SETTINGS: &str = r#"{
    "JSON_SCHEMA_VERSION": "1.1",
    "PACKAGE_NAME": "KIS",
    "CHANGELOG_FILE": "/CHANGELOG.md",
    "GITHUB_REPO": "ihsoft/KIS",
    "MACROS": {
        "PARTS": "Parts"
    },
    "STRUCTURE": {
        "/": ["/LICENSE.md"],
        "/{PACKAGE_NAME}": ["/{PACKAGE_NAME}.version"],
        "{PARTS}": ["/{PARTS}/*"],
        "-{PARTS}": ["*.bak"],
        "Plugins": ["{COMPILED_BINARY}"],
        "Extras": ["?/Extras/*"]
    }
}"#;

/// A checked out mod repository with the settings file in `Tools/`
pub struct Repository {
    pub temp: TempDir,
    pub root: PathBuf,
    pub settings: PathBuf,
}

impl Repository {
    pub fn path(&self, relative: &str) -> PathBuf {
        self.root.join(relative)
    }
}

fn write(path: &Path, content: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
}

/// Creates a repository with the given settings
pub fn create_repository_with(settings: &str) -> Repository {
    let temp = tempfile::tempdir().unwrap();
    let root = release_builder::utils::absolute_path(temp.path()).unwrap();

    fs::create_dir_all(root.join(".git")).unwrap();
    write(&root.join("LICENSE.md"), "license");
    write(&root.join("CHANGELOG.md"), CHANGELOG);
    write(&root.join("KIS.version"), VERSION_FILE);
    write(&root.join("Source/Properties/AssemblyInfo.cs"), ASSEMBLY_INFO);
    write(&root.join("Source/bin/Release/KIS.dll"), "binary");
    for name in ["a.cfg", "b.cfg", "c.cfg", "old.bak"] {
        write(&root.join("Parts").join(name), name);
    }

    let settings_path = root.join("Tools/release_setup.json");
    write(&settings_path, settings);

    Repository {
        temp,
        root,
        settings: settings_path,
    }
}

pub fn create_repository() -> Repository {
    create_repository_with(SETTINGS)
}
