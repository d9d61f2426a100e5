use std::path::PathBuf;

use clap::{Arg, ArgGroup, ArgMatches, Command, command, crate_authors, crate_description, crate_name, crate_version};

use crate::constants::{
    DEFAULT_JSON_HELP, JSON_HELP, LOCAL_LOGGING_HELP, LOG_FILE_DEFAULT, LOG_FILE_HELP,
    OVERWRITE_HELP, PACKAGE_HELP, RELEASE_JSON_FILE, SKIP_COMPILE_HELP, VERBOSE_HELP,
};
use crate::errors::{Result, generic_error};
use crate::logging::LogLevel;
use crate::utils::find_project_folder;
use crate::workflow::ReleaseOptions;

/// Builds the command-line interface
///
/// Defines the following arguments:
/// - `json`: Settings file to load
/// - `default_json`: Load `release_setup.json` from the working directory
/// - `package`: Build the release archive
/// - `overwrite`: Replace an existing archive
/// - `skip_compile`: Use the existing binary
/// - `verbose`, `log_file`, `log_locally`: Logging setup
pub fn build_command() -> Command {
    let arg_json = Arg::new("json")
        .short('j')
        .long("json")
        .value_name("FILE")
        .help(JSON_HELP);

    let arg_default_json = Arg::new("default_json")
        .short('J')
        .help(DEFAULT_JSON_HELP)
        .action(clap::ArgAction::SetTrue);

    let arg_package = Arg::new("package")
        .short('p')
        .long("package")
        .help(PACKAGE_HELP)
        .action(clap::ArgAction::SetTrue);

    let arg_overwrite = Arg::new("overwrite")
        .short('o')
        .long("overwrite")
        .help(OVERWRITE_HELP)
        .action(clap::ArgAction::SetTrue);

    let arg_skip_compile = Arg::new("skip_compile")
        .long("skip-compile")
        .help(SKIP_COMPILE_HELP)
        .action(clap::ArgAction::SetTrue);

    // define arg for verbosity level
    let arg_verbose = Arg::new("verbose")
        .short('v')
        .long("verbose")
        .help(VERBOSE_HELP)
        .action(clap::ArgAction::Count);

    // define arg for log file
    let log_file = Arg::new("log_file")
        .short('l')
        .long("log-file")
        .help(LOG_FILE_HELP);

    // define arg for local logging
    let log_locally = Arg::new("log_locally")
        .short('L')
        .long("log-locally")
        .help(LOCAL_LOGGING_HELP)
        .action(clap::ArgAction::SetTrue);

    command!()
        .author(crate_authors!())
        .about(crate_description!())
        .name(crate_name!())
        .version(crate_version!())
        .arg(arg_json)
        .arg(arg_default_json)
        .arg(arg_package)
        .arg(arg_overwrite)
        .arg(arg_skip_compile)
        .arg(log_file)
        .arg(log_locally)
        .arg(arg_verbose)
        .group(
            ArgGroup::new("settings")
                .args(["json", "default_json"])
                .required(true),
        )
}

/// Parses the process arguments
pub fn get_matches() -> ArgMatches {
    build_command().get_matches()
}

/// Gets the verbosity level from the number of `-v` flags
pub fn get_verbosity(matches: &ArgMatches) -> LogLevel {
    let verbose_count = matches.get_count("verbose");
    LogLevel::from_occurrences(verbose_count)
}

/// Gets the log file path, if file logging was requested
///
/// A relative file name goes to the per-user data folder unless
/// `--log-locally` is set. `-L` alone logs to the default file name in the
/// working directory.
pub fn get_log_file(matches: &ArgMatches) -> Result<Option<PathBuf>> {
    let filename = match (
        matches.get_one::<String>("log_file"),
        matches.get_flag("log_locally"),
    ) {
        (Some(filename), _) => PathBuf::from(filename),
        (None, true) => PathBuf::from(LOG_FILE_DEFAULT),
        (None, false) => return Ok(None),
    };
    if matches.get_flag("log_locally") || filename.is_absolute() {
        Ok(Some(filename))
    } else {
        let folder = find_project_folder()?;
        Ok(Some(folder.data_dir().join(filename)))
    }
}

/// Converts the arguments into release options
pub fn get_release_options(matches: &ArgMatches) -> Result<ReleaseOptions> {
    let settings_path = match matches.get_one::<String>("json") {
        Some(path) => PathBuf::from(path),
        None if matches.get_flag("default_json") => PathBuf::from(RELEASE_JSON_FILE),
        None => return Err(generic_error("No settings file given")),
    };
    Ok(ReleaseOptions {
        settings_path,
        make_package: matches.get_flag("package"),
        overwrite: matches.get_flag("overwrite"),
        skip_compile: matches.get_flag("skip_compile"),
    })
}
