/// Constants used throughout the application
///
/// This module centralises all constants used in the application to make
/// them easier to manage and update.

/// Qualifier string used for application identification
pub const QUALIFIER: &str = "com";

/// Organisation name used for application identification
pub const ORGANIZATION: &str = "Ondřej Vágner";

/// Application name used for identification
///
/// This is used for the per-user folder where the log file is kept.
pub const APPLICATION: &str = "release_builder";

/// Version of the settings file format this build understands
///
/// A settings file is accepted when its major part matches and its minor
/// part is not newer.
pub const SUPPORTED_JSON_SCHEMA_VERSION: &str = "1.1";

/// Settings file searched in the working directory with `-J`
pub const RELEASE_JSON_FILE: &str = "release_setup.json";

/// Special `PROJECT_ROOT` value: find the enclosing git repository
pub const GITHUB_PROJECT_ROOT: &str = "#github";

/// How many parent folders are visited while looking for `.git`
pub const MAX_REPOSITORY_SEARCH_DEPTH: usize = 50;

/// Macro names with this prefix cannot be referenced
pub const RESTRICTED_MACRO_PREFIX: &str = "__";

/// Marker embedded into a placeholder that could not be resolved
pub const UNRESOLVED_MARKER: &str = "=>NULL";

/// Pattern prefix: the pattern may match nothing
pub const OPTIONAL_PREFIX: char = '?';

/// Pattern prefix: the pattern selects release files to delete
pub const DELETE_PREFIX: char = '-';

/// Prefix of rooted destination keys and source patterns
pub const ROOT_PREFIX: char = '/';

/// Help text for the JSON settings command-line option
pub const JSON_HELP: &str = "Load settings from a JSON or YAML file. The working directory is counted from the file path";

/// Help text for the default settings command-line option
pub const DEFAULT_JSON_HELP: &str = "Find release_setup.json in the working directory and load settings from it";

/// Help text for the package command-line option
pub const PACKAGE_HELP: &str = "Request creating of the release archive";

/// Help text for the overwrite command-line option
pub const OVERWRITE_HELP: &str = "Allow overwriting the release archive when one exists";

/// Help text for the skip-compile command-line option
pub const SKIP_COMPILE_HELP: &str = "Do not run the compile script, use the existing binary";

/// Help text for the verbose command-line option
pub const VERBOSE_HELP: &str = "Increase verbosity level (can be used multiple times)";

/// Help text for the log file command-line option
pub const LOG_FILE_HELP: &str = "Write the log to this file";

/// Help text for the local logging command-line option
pub const LOCAL_LOGGING_HELP: &str = "Keep the log file in the working directory";

/// Default log file name
pub const LOG_FILE_DEFAULT: &str = "release_builder.log";
