use glob::PatternError;
use std::error::Error as StdError;
use std::fmt;
use std::io;
use std::path::PathBuf;

/// Custom error type for the release builder
///
/// Every variant is fatal: the build stops on the first error and the
/// partially assembled release folder is left on disk for inspection.
#[derive(Debug)]
pub enum Error {
    /// A macro needs itself to get resolved
    MacroCycle { template: String, key: String },
    /// A macro name has no corresponding setting
    UnknownMacro { key: String },
    /// A macro name uses the reserved internal prefix
    RestrictedMacro { key: String },
    /// A resolved path lies outside of its mandated root
    PathEscape {
        path: PathBuf,
        root: PathBuf,
        action: String,
    },
    /// A required path still contains an unresolved macro
    UnresolvedPath { path: String },
    /// A plain pattern matched nothing
    NoMatch { pattern: String },
    /// A matched source disappeared before it could be copied
    SourceMissing { path: PathBuf },
    /// A deletion pattern addresses something other than a direct child
    InvalidDeletionScope { pattern: PathBuf, target: PathBuf },
    /// Error related to file operations
    FileOperation {
        source: io::Error,
        path: PathBuf,
        operation: String,
    },
    /// Error related to glob pattern syntax
    GlobPattern {
        source: PatternError,
        pattern: String,
    },
    /// Error related to configuration parsing
    ConfigParsing {
        source: Box<dyn StdError + Send + Sync>,
        detail: String,
    },
    /// The release version cannot be determined
    VersionExtraction { path: PathBuf, detail: String },
    /// An external command failed
    Command { command: String, code: Option<i32> },
    /// Error when a filename is not valid Unicode
    InvalidFilename { path: PathBuf },
    /// Generic error with a message
    Generic { message: String },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::MacroCycle { template, key } => write!(
                f,
                "Recursive macro \"{template}\": key \"{key}\" needs itself to get resolved"
            ),
            Error::UnknownMacro { key } => write!(f, "Unknown macro key: {key}"),
            Error::RestrictedMacro { key } => write!(f, "Restricted macro key: {key}"),
            Error::PathEscape { path, root, action } => write!(
                f,
                "Action {action} is not permitted above the root: {} (root={})",
                path.display(),
                root.display()
            ),
            Error::UnresolvedPath { path } => write!(
                f,
                "Cannot construct path due to unresolved component(s): {path}"
            ),
            Error::NoMatch { pattern } => write!(
                f,
                "Nothing is found for pattern: {pattern}\n\
                 HINT: If this pattern is allowed to return nothing then add prefix \"?\""
            ),
            Error::SourceMissing { path } => {
                write!(f, "Source path not found: {}", path.display())
            }
            Error::InvalidDeletionScope { pattern, target } => write!(
                f,
                "Cleanup pattern must designate an entity in the target folder: pattern={}, target={}",
                pattern.display(),
                target.display()
            ),
            Error::FileOperation {
                path, operation, ..
            } => {
                write!(f, "Failed to {} file: {}", operation, path.display())
            }
            Error::GlobPattern { pattern, .. } => {
                write!(f, "Invalid glob pattern: {pattern}")
            }
            Error::ConfigParsing { detail, .. } => {
                write!(f, "Configuration parsing error: {detail}")
            }
            Error::VersionExtraction { path, detail } => {
                write!(f, "Cannot extract version from {}: {detail}", path.display())
            }
            Error::Command { command, code } => match code {
                Some(code) => write!(f, "Command '{command}' failed with exit code {code}"),
                None => write!(f, "Command '{command}' was terminated by a signal"),
            },
            Error::InvalidFilename { path } => {
                write!(f, "Filename is not valid unicode: {}", path.display())
            }
            Error::Generic { message } => {
                write!(f, "{message}")
            }
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Error::FileOperation { source, .. } => Some(source),
            Error::GlobPattern { source, .. } => Some(source),
            Error::ConfigParsing { source, .. } => Some(source.as_ref()),
            _ => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Error::FileOperation {
            source: err,
            path: PathBuf::new(),
            operation: "perform operation on".to_string(),
        }
    }
}

impl From<PatternError> for Error {
    fn from(err: PatternError) -> Self {
        Error::GlobPattern {
            source: err,
            pattern: String::new(),
        }
    }
}

/// Custom Result type for the release builder
///
/// # Examples
/// ```
/// use release_builder::prelude::{Result, generic_error};
///
/// fn example_function() -> Result<String> {
///     Ok("success".to_string())
///
///     // Or return an error
///     // Err(generic_error("Something went wrong"))
/// }
/// ```
pub type Result<T> = std::result::Result<T, Error>;

/// Helper function to create a macro cycle error
pub fn macro_cycle_error(template: &str, key: &str) -> Error {
    Error::MacroCycle {
        template: template.to_string(),
        key: key.to_string(),
    }
}

/// Helper function to create an unknown macro error
pub fn unknown_macro_error(key: &str) -> Error {
    Error::UnknownMacro {
        key: key.to_string(),
    }
}

/// Helper function to create a restricted macro error
pub fn restricted_macro_error(key: &str) -> Error {
    Error::RestrictedMacro {
        key: key.to_string(),
    }
}

/// Helper function to create a path escape error
pub fn path_escape_error(path: PathBuf, root: PathBuf, action: &str) -> Error {
    Error::PathEscape {
        path,
        root,
        action: action.to_string(),
    }
}

/// Helper function to create an unresolved path error
pub fn unresolved_path_error(path: &str) -> Error {
    Error::UnresolvedPath {
        path: path.to_string(),
    }
}

/// Helper function to create a no-match error
pub fn no_match_error(pattern: &str) -> Error {
    Error::NoMatch {
        pattern: pattern.to_string(),
    }
}

/// Helper function to create a source missing error
pub fn source_missing_error(path: PathBuf) -> Error {
    Error::SourceMissing { path }
}

/// Helper function to create an invalid deletion scope error
pub fn invalid_deletion_scope_error(pattern: PathBuf, target: PathBuf) -> Error {
    Error::InvalidDeletionScope { pattern, target }
}

/// Helper function to create a file operation error
pub fn file_operation_error(err: io::Error, path: PathBuf, operation: &str) -> Error {
    Error::FileOperation {
        source: err,
        path,
        operation: operation.to_string(),
    }
}

/// Helper function to create a glob pattern error
pub fn glob_pattern_error(err: PatternError, pattern: &str) -> Error {
    Error::GlobPattern {
        source: err,
        pattern: pattern.to_string(),
    }
}

/// Helper function to create a config parsing error
pub fn config_parsing_error<E: StdError + Send + Sync + 'static>(err: E, detail: &str) -> Error {
    Error::ConfigParsing {
        source: Box::new(err),
        detail: detail.to_string(),
    }
}

/// Helper function to create a version extraction error
pub fn version_extraction_error(path: PathBuf, detail: &str) -> Error {
    Error::VersionExtraction {
        path,
        detail: detail.to_string(),
    }
}

/// Helper function to create an external command error
pub fn command_error(command: &str, code: Option<i32>) -> Error {
    Error::Command {
        command: command.to_string(),
        code,
    }
}

/// Helper function to create an invalid filename error
pub fn invalid_filename_error(path: PathBuf) -> Error {
    Error::InvalidFilename { path }
}

/// Helper function to create a generic error
pub fn generic_error(message: &str) -> Error {
    Error::Generic {
        message: message.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_macro_errors() {
        let error = macro_cycle_error("{A}", "B");
        let error_string = format!("{error}");
        assert!(error_string.contains("{A}"));
        assert!(error_string.contains("\"B\""));

        let error = unknown_macro_error("NOPE");
        assert_eq!(format!("{error}"), "Unknown macro key: NOPE");

        let error = restricted_macro_error("__SECRET");
        assert_eq!(format!("{error}"), "Restricted macro key: __SECRET");
    }

    #[test]
    fn test_path_escape_error() {
        let error = path_escape_error(
            PathBuf::from("/project/../etc"),
            PathBuf::from("/project"),
            "COPY-FROM",
        );

        let error_string = format!("{error}");
        assert!(
            error_string.contains("COPY-FROM"),
            "Error message should contain the action"
        );
        assert!(
            error_string.contains("root=/project"),
            "Error message should contain the root"
        );
    }

    #[test]
    fn test_no_match_error_has_hint() {
        let error = no_match_error("/project/Source/*.dll");

        let error_string = format!("{error}");
        assert!(error_string.contains("/project/Source/*.dll"));
        assert!(
            error_string.contains("add prefix \"?\""),
            "Error message should suggest the optional prefix"
        );
    }

    #[test]
    fn test_invalid_deletion_scope_error() {
        let error = invalid_deletion_scope_error(
            PathBuf::from("/release/Parts/sub/file.txt"),
            PathBuf::from("/release/Parts"),
        );

        let error_string = format!("{error}");
        assert!(error_string.contains("pattern=/release/Parts/sub/file.txt"));
        assert!(error_string.contains("target=/release/Parts"));
    }

    #[test]
    fn test_file_operation_error() {
        let path = PathBuf::from("/test/path");
        let io_error = io::Error::new(io::ErrorKind::NotFound, "File not found");
        let error = file_operation_error(io_error, path.clone(), "read");

        let error_string = format!("{error}");
        assert!(
            error_string.contains("read"),
            "Error message should contain the operation"
        );
        assert!(
            error_string.contains("/test/path"),
            "Error message should contain the path"
        );
        assert!(error.source().is_some());
    }

    #[test]
    fn test_command_error() {
        assert_eq!(
            format!("{}", command_error("make_binary.cmd", Some(2))),
            "Command 'make_binary.cmd' failed with exit code 2"
        );
        assert!(format!("{}", command_error("zip", None)).contains("signal"));
    }

    #[test]
    fn test_error_conversion() {
        let io_error = io::Error::new(io::ErrorKind::NotFound, "File not found");
        let error: Error = io_error.into();
        assert!(
            format!("{error}").contains("Failed to perform operation on file"),
            "Error message should contain the underlying error"
        );

        let pattern_error = glob::Pattern::new("[").err().unwrap();
        let error: Error = pattern_error.into();
        assert!(
            format!("{error}").contains("Invalid glob pattern"),
            "Error message should contain the underlying error"
        );
    }
}
