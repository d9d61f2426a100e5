mod common;

use std::fs;

use release_builder::config::load_release_config;
use release_builder::release::ReleaseVersion;
use release_builder::workflow::{ReleaseOptions, make_release, run_release};

fn options(settings: &std::path::Path) -> ReleaseOptions {
    ReleaseOptions {
        settings_path: settings.to_path_buf(),
        ..ReleaseOptions::default()
    }
}

#[test]
fn test_release_without_package() {
    let repository = common::create_repository();

    let outcome = make_release(&options(&repository.settings)).unwrap();

    assert_eq!(outcome.version, ReleaseVersion::new(1, 4, 2, 7));
    assert_eq!(outcome.archive, None);
    assert_eq!(outcome.release_tag, None);

    let game_data = repository.path("Release/GameData");
    assert!(game_data.join("LICENSE.md").is_file());
    assert!(game_data.join("KIS/KIS.version").is_file());
    assert!(game_data.join("KIS/Plugins/KIS.dll").is_file());
    for name in ["a.cfg", "b.cfg", "c.cfg"] {
        assert!(game_data.join("KIS/Parts").join(name).is_file());
    }
    assert!(!game_data.join("KIS/Parts/old.bak").exists());
    assert!(!game_data.join("KIS/Extras").exists());

    // The version file is stamped before it is copied
    let stamped = fs::read_to_string(game_data.join("KIS/KIS.version")).unwrap();
    let document: serde_json::Value = serde_json::from_str(&stamped).unwrap();
    assert_eq!(document["VERSION"]["MAJOR"], 1);
    assert_eq!(document["VERSION"]["MINOR"], 4);
    assert_eq!(document["VERSION"]["PATCH"], 2);
    assert_eq!(document["VERSION"]["BUILD"], 7);

    let description = outcome.description.unwrap();
    assert!(description.starts_with("# 1.4.2"));
    assert!(description.contains("[#33](https://github.com/ihsoft/KIS/issues/33)"));
    assert!(description.contains("(https://github.com/ihsoft/KIS/wiki/Setup)"));
    assert!(!description.contains("Older entry"));
}

#[test]
fn test_release_folder_is_wiped() {
    let repository = common::create_repository();
    let stale = repository.path("Release/GameData/KIS/Parts/stale.cfg");
    fs::create_dir_all(stale.parent().unwrap()).unwrap();
    fs::write(&stale, "stale").unwrap();

    make_release(&options(&repository.settings)).unwrap();
    assert!(!stale.exists());
    assert!(repository.path("Release/GameData/KIS/Parts/a.cfg").exists());
}

#[test]
fn test_missing_required_source_fails() {
    let repository = common::create_repository_with(
        r#"{
            "JSON_SCHEMA_VERSION": "1.1",
            "PACKAGE_NAME": "KIS",
            "MINIAVC_VERSION_FILE": null,
            "STRUCTURE": {"Docs": ["/Docs/*.pdf"]}
        }"#,
    );

    let error = make_release(&options(&repository.settings)).unwrap_err();
    let message = format!("{error:#}");
    assert!(message.contains("Nothing is found for pattern"), "{message}");
    assert!(message.contains("add prefix \"?\""), "{message}");
}

#[test]
fn test_missing_version_attribute_fails() {
    let repository = common::create_repository();
    fs::write(
        repository.path("Source/Properties/AssemblyInfo.cs"),
        "[assembly: AssemblyTitle(\"KIS\")]\n",
    )
    .unwrap();

    let config = load_release_config(&repository.settings).unwrap();
    let error = run_release(config, &options(&repository.settings)).unwrap_err();
    assert!(format!("{error:#}").contains("Cannot extract version"));
}

#[cfg(unix)]
#[test]
fn test_release_with_package() {
    let repository = common::create_repository_with(
        r#"{
            "JSON_SCHEMA_VERSION": "1.1",
            "PACKAGE_NAME": "KIS",
            "ARCHIVE_DEST": "Archives",
            "SHELL_ZIP_BINARY": ["sh", "-c", "test -d \"$1\" && echo packed > \"$0\""],
            "STRUCTURE": {"Parts": ["/Parts/*.cfg"]}
        }"#,
    );
    let mut options = options(&repository.settings);
    options.make_package = true;

    let outcome = make_release(&options).unwrap();
    let archive = repository.path("Archives/KIS_v1.4.2_build7.zip");
    assert_eq!(outcome.archive.as_deref(), Some(archive.as_path()));
    assert_eq!(outcome.release_tag.as_deref(), Some("1.4.2_build7"));
    assert_eq!(fs::read_to_string(&archive).unwrap().trim(), "packed");

    // A second build refuses to replace the archive unless asked
    let error = make_release(&options).unwrap_err();
    assert!(format!("{error:#}").contains("already exists"));

    options.overwrite = true;
    make_release(&options).unwrap();
    assert!(archive.exists());
}

#[cfg(unix)]
#[test]
fn test_compile_step() {
    use std::os::unix::fs::PermissionsExt;

    let repository = common::create_repository_with(
        r#"{
            "JSON_SCHEMA_VERSION": "1.1",
            "PACKAGE_NAME": "KIS",
            "SHELL_COMPILE_BINARY_SCRIPT": "make_binary.sh",
            "COMPILED_BINARY": "bin/Release/Fresh.dll",
            "STRUCTURE": {"Plugins": ["{COMPILED_BINARY}"]}
        }"#,
    );
    let script = repository.path("Tools/make_binary.sh");
    fs::write(&script, "#!/bin/sh\ntouch ../Source/bin/Release/Fresh.dll\n").unwrap();
    let mut permissions = fs::metadata(&script).unwrap().permissions();
    permissions.set_mode(0o755);
    fs::set_permissions(&script, permissions).unwrap();

    let mut options = options(&repository.settings);
    options.skip_compile = true;
    assert!(make_release(&options).is_err(), "The binary does not exist yet");

    options.skip_compile = false;
    make_release(&options).unwrap();
    assert!(repository.path("Release/GameData/KIS/Plugins/Fresh.dll").is_file());
}
