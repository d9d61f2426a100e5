//! Changelog excerpt for the release description

use std::fs;
use std::path::Path;

use log::info;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::errors::{Result, config_parsing_error, file_operation_error};

static ISSUE_LINK_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"#(\d+)").expect("Failed to compile regex pattern for ISSUE_LINK_RE"));

static WIKI_LINK_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\[(.+?)\]\((wiki/.+?)\)").expect("Failed to compile regex pattern for WIKI_LINK_RE")
});

/// Takes the top section of a changelog
///
/// Leading blank lines are skipped, then lines are collected until one
/// matches `breaker` at its start (the line is trimmed before matching).
/// The result is trimmed.
pub fn extract_description(content: &str, breaker: &Regex) -> String {
    let mut description = String::new();
    for line in content.lines() {
        let trimmed = line.trim();
        if description.is_empty() && trimmed.is_empty() {
            continue;
        }
        if breaker.find(trimmed).is_some_and(|m| m.start() == 0) {
            break;
        }
        description.push_str(line);
        description.push('\n');
    }
    description.trim().to_string()
}

/// Reads a changelog file and extracts the release description from it
///
/// # Errors
/// * `ConfigParsing` if the breaker is not a valid regex
/// * `FileOperation` if the file cannot be read
pub fn read_description(file: &Path, breaker: &str) -> Result<String> {
    let breaker_re = Regex::new(breaker)
        .map_err(|e| config_parsing_error(e, &format!("Invalid changelog breaker: {breaker}")))?;
    info!("Extract release description from: {}", file.display());
    let content = fs::read_to_string(file)
        .map_err(|e| file_operation_error(e, file.to_path_buf(), "read"))?;
    Ok(extract_description(&content, &breaker_re))
}

/// Replaces repository-local links with absolute GitHub links
///
/// `#123` becomes a link to the issue and `[text](wiki/Page)` a link to the
/// wiki page of `repo` (`owner/name`).
pub fn process_github_links(markup: &str, repo: &str) -> String {
    let repo = repo.replace('$', "$$");
    let markup = ISSUE_LINK_RE.replace_all(
        markup,
        format!("[#${{1}}](https://github.com/{repo}/issues/${{1}})").as_str(),
    );
    WIKI_LINK_RE
        .replace_all(
            &markup,
            format!("[${{1}}](https://github.com/{repo}/${{2}})").as_str(),
        )
        .into_owned()
}
