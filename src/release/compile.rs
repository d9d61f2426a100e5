//! Compile step

use std::path::Path;
use std::process::Command;

use log::{error, info};

use crate::errors::{Result, command_error, file_operation_error, source_missing_error};

/// Runs the compile script and checks that it produced the binary
///
/// The script runs with `working_dir` as its current folder and gets no
/// arguments.
///
/// # Errors
/// * `FileOperation` if the script cannot be started
/// * `Command` if the script exits with a non-zero code
/// * `SourceMissing` if the binary does not exist afterwards
pub fn compile_binary(script: &Path, working_dir: &Path, binary: &Path) -> Result<()> {
    info!("Compiling sources in PROD mode...");
    info!("=> script: {}", script.display());
    let status = Command::new(script)
        .current_dir(working_dir)
        .status()
        .map_err(|e| file_operation_error(e, script.to_path_buf(), "execute"))?;

    if !status.success() {
        match status.code() {
            Some(code) => error!("Compilation failed with exit code {code}"),
            None => error!("Compilation was terminated by a signal"),
        }
        return Err(command_error(&script.to_string_lossy(), status.code()));
    }
    if !binary.exists() {
        error!("Compilation failed. Cannot find target binary: {}", binary.display());
        return Err(source_missing_error(binary.to_path_buf()));
    }
    info!("=> binary: {}", binary.display());
    Ok(())
}
