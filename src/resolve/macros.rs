//! Macro expansion
//!
//! Settings values may reference other settings with `{NAME}` placeholders,
//! e.g. `bin/Release/{PACKAGE_NAME}.dll`. Placeholders are expanded
//! recursively: a substituted value is itself scanned for placeholders.

use std::collections::HashMap;

use log::trace;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::constants::{RESTRICTED_MACRO_PREFIX, UNRESOLVED_MARKER};
use crate::errors::{Result, macro_cycle_error, restricted_macro_error, unknown_macro_error};

/// Placeholder syntax. Tokens starting with a digit (`{0}`) are format
/// arguments, not macros.
static MACRO_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("Failed to compile regex pattern for MACRO_RE")
});

/// Returns the placeholder that replaces a macro which has no value
pub fn unresolved_placeholder(key: &str) -> String {
    format!("{{{key}{UNRESOLVED_MARKER}}}")
}

/// Checks whether an expanded string still carries an unresolved placeholder
pub fn contains_unresolved(value: &str) -> bool {
    value.contains(UNRESOLVED_MARKER)
}

/// Named values available to `{NAME}` placeholders
///
/// A name can be known but unset (`None` or empty), which is different from
/// being unknown: an unset macro always expands to the unresolved
/// placeholder, while an unknown one is an error unless the caller allows
/// unresolved placeholders.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MacroContext {
    values: HashMap<String, Option<String>>,
}

impl MacroContext {
    /// Creates an empty context
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a macro with a value
    pub fn with(mut self, key: &str, value: &str) -> Self {
        self.values.insert(key.to_string(), Some(value.to_string()));
        self
    }

    /// Adds a known macro that has no value
    pub fn with_unset(mut self, key: &str) -> Self {
        self.values.insert(key.to_string(), None);
        self
    }

    /// Checks whether a macro name is known
    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Expands all placeholders, failing on unknown macros
    pub fn resolve(&self, template: &str) -> Result<String> {
        self.resolve_with(template, false)
    }

    /// Expands all placeholders
    ///
    /// # Arguments
    /// * `template` - The string to expand
    /// * `allow_unresolved` - When true, unknown macros become the unresolved
    ///   placeholder instead of an error
    ///
    /// # Errors
    /// * `MacroCycle` if a macro needs itself to get resolved
    /// * `RestrictedMacro` if a name starts with the reserved prefix
    /// * `UnknownMacro` if a name is unknown and `allow_unresolved` is false
    pub fn resolve_with(&self, template: &str, allow_unresolved: bool) -> Result<String> {
        let mut stack = Vec::new();
        let resolved = self.expand(template, template, &mut stack, allow_unresolved)?;
        trace!("Expanded \"{template}\" => \"{resolved}\"");
        Ok(resolved)
    }

    fn expand(
        &self,
        template: &str,
        text: &str,
        stack: &mut Vec<String>,
        allow_unresolved: bool,
    ) -> Result<String> {
        let mut result = String::with_capacity(text.len());
        let mut last = 0;
        for captures in MACRO_RE.captures_iter(text) {
            let (Some(whole), Some(key)) = (captures.get(0), captures.get(1)) else {
                continue;
            };
            result.push_str(&text[last..whole.start()]);
            result.push_str(&self.expand_macro(template, key.as_str(), stack, allow_unresolved)?);
            last = whole.end();
        }
        result.push_str(&text[last..]);
        Ok(result)
    }

    fn expand_macro(
        &self,
        template: &str,
        key: &str,
        stack: &mut Vec<String>,
        allow_unresolved: bool,
    ) -> Result<String> {
        if stack.iter().any(|parent| parent == key) {
            return Err(macro_cycle_error(template, key));
        }
        if key.starts_with(RESTRICTED_MACRO_PREFIX) {
            return Err(restricted_macro_error(key));
        }
        let value = match self.values.get(key) {
            None if allow_unresolved => return Ok(unresolved_placeholder(key)),
            None => return Err(unknown_macro_error(key)),
            Some(None) => return Ok(unresolved_placeholder(key)),
            Some(Some(value)) if value.is_empty() => return Ok(unresolved_placeholder(key)),
            Some(Some(value)) => value,
        };

        stack.push(key.to_string());
        let expanded = self.expand(template, value, stack, allow_unresolved);
        stack.pop();
        expanded
    }
}

impl FromIterator<(String, Option<String>)> for MacroContext {
    fn from_iter<I: IntoIterator<Item = (String, Option<String>)>>(iter: I) -> Self {
        MacroContext {
            values: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::Error;

    fn context() -> MacroContext {
        MacroContext::new()
            .with("PACKAGE_NAME", "KIS")
            .with("RELEASE_MOD_FOLDER", "{PACKAGE_NAME}")
            .with("COMPILED_BINARY", "bin/Release/{PACKAGE_NAME}.dll")
            .with("NESTED", "{RELEASE_MOD_FOLDER}/{COMPILED_BINARY}")
            .with_unset("RELEASE_NAME_FREE_FORMAT")
            .with("__SECRET", "hidden")
    }

    #[test]
    fn test_plain_text_is_untouched() {
        assert_eq!(context().resolve("Parts/*.cfg").unwrap(), "Parts/*.cfg");
        assert_eq!(context().resolve("").unwrap(), "");
    }

    #[test]
    fn test_nested_macros() {
        let ctx = context();
        assert_eq!(ctx.resolve("/{PACKAGE_NAME}.version").unwrap(), "/KIS.version");
        assert_eq!(
            ctx.resolve("{NESTED}").unwrap(),
            "KIS/bin/Release/KIS.dll"
        );
    }

    #[test]
    fn test_repeated_sibling_macro_is_not_a_cycle() {
        assert_eq!(
            context().resolve("{PACKAGE_NAME}_{PACKAGE_NAME}").unwrap(),
            "KIS_KIS"
        );
    }

    #[test]
    fn test_format_arguments_are_not_macros() {
        assert_eq!(
            context().resolve("{PACKAGE_NAME}_v{0}.{1}").unwrap(),
            "KIS_v{0}.{1}"
        );
    }

    #[test]
    fn test_cycle_is_detected() {
        let ctx = MacroContext::new().with("A", "{B}").with("B", "x{A}");
        for template in ["{A}", "{B}"] {
            match ctx.resolve(template) {
                Err(Error::MacroCycle { key, .. }) => assert!(key == "A" || key == "B"),
                other => panic!("Expected a cycle error, got {other:?}"),
            }
        }

        let ctx = MacroContext::new().with("SELF", "{SELF}");
        assert!(matches!(ctx.resolve("{SELF}"), Err(Error::MacroCycle { .. })));
    }

    #[test]
    fn test_restricted_macro() {
        let result = context().resolve("{__SECRET}");
        assert!(matches!(result, Err(Error::RestrictedMacro { key }) if key == "__SECRET"));

        let result = context().resolve_with("{__UNKNOWN}", true);
        assert!(matches!(result, Err(Error::RestrictedMacro { .. })));
    }

    #[test]
    fn test_unknown_macro() {
        let result = context().resolve("{NOPE}/file");
        assert!(matches!(result, Err(Error::UnknownMacro { key }) if key == "NOPE"));

        let resolved = context().resolve_with("{NOPE}/file", true).unwrap();
        assert_eq!(resolved, "{NOPE=>NULL}/file");
        assert!(contains_unresolved(&resolved));
    }

    #[test]
    fn test_unset_macro_becomes_placeholder() {
        let resolved = context().resolve("{RELEASE_NAME_FREE_FORMAT}").unwrap();
        assert_eq!(resolved, unresolved_placeholder("RELEASE_NAME_FREE_FORMAT"));
        assert!(contains_unresolved(&resolved));

        let ctx = MacroContext::new().with("EMPTY", "");
        assert!(contains_unresolved(&ctx.resolve("a/{EMPTY}").unwrap()));
    }
}
