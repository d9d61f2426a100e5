//! Declarative release structure
//!
//! A mapping entry names a destination folder and the patterns that fill it.
//! Pattern modifiers are decided once, when the raw settings strings are
//! parsed, and never re-derived from the text afterwards.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

use crate::constants::{DELETE_PREFIX, OPTIONAL_PREFIX, ROOT_PREFIX};
use crate::errors::{Result, generic_error};

/// How a pattern participates in the assembly
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatternKind {
    /// Must match at least one entry
    Plain,
    /// May match nothing (`?` prefix)
    Optional,
    /// Selects release files to remove after copying (`-` prefix)
    Delete,
}

/// A source pattern with its modifier
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourcePattern {
    pub kind: PatternKind,
    pub pattern: String,
}

impl SourcePattern {
    pub fn new(kind: PatternKind, pattern: &str) -> Self {
        SourcePattern {
            kind,
            pattern: pattern.to_string(),
        }
    }

    /// Parses a raw settings string
    ///
    /// The modifier is read from the first character of the raw string, so a
    /// macro value can never inject one.
    pub fn parse(raw: &str) -> Self {
        if let Some(rest) = raw.strip_prefix(OPTIONAL_PREFIX) {
            Self::new(PatternKind::Optional, rest)
        } else if let Some(rest) = raw.strip_prefix(DELETE_PREFIX) {
            Self::new(PatternKind::Delete, rest)
        } else {
            Self::new(PatternKind::Plain, raw)
        }
    }
}

impl From<&str> for SourcePattern {
    fn from(raw: &str) -> Self {
        SourcePattern::parse(raw)
    }
}

impl fmt::Display for SourcePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            PatternKind::Plain => write!(f, "{}", self.pattern),
            PatternKind::Optional => write!(f, "{OPTIONAL_PREFIX}{}", self.pattern),
            PatternKind::Delete => write!(f, "{DELETE_PREFIX}{}", self.pattern),
        }
    }
}

/// One destination folder and its patterns
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappingEntry {
    pub destination_key: String,
    pub patterns: Vec<SourcePattern>,
}

impl MappingEntry {
    /// Rooted keys are counted from the release top-level folder
    pub fn is_rooted(&self) -> bool {
        self.destination_key.starts_with(ROOT_PREFIX)
    }

    pub fn copy_patterns(&self) -> impl Iterator<Item = &SourcePattern> {
        self.patterns
            .iter()
            .filter(|p| p.kind != PatternKind::Delete)
    }

    pub fn delete_patterns(&self) -> impl Iterator<Item = &SourcePattern> {
        self.patterns
            .iter()
            .filter(|p| p.kind == PatternKind::Delete)
    }
}

/// Processing order of destination keys: rooted keys first, then
/// lexicographic within each group
pub fn compare_destination_keys(a: &str, b: &str) -> Ordering {
    let a_rooted = a.starts_with(ROOT_PREFIX);
    let b_rooted = b.starts_with(ROOT_PREFIX);
    b_rooted.cmp(&a_rooted).then_with(|| a.cmp(b))
}

/// The whole release structure, keyed by destination
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StructureMapping {
    entries: Vec<MappingEntry>,
}

impl StructureMapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an entry
    ///
    /// # Errors
    /// Returns an error if the destination key is already present
    pub fn insert(&mut self, destination_key: &str, patterns: Vec<SourcePattern>) -> Result<()> {
        if self.get(destination_key).is_some() {
            return Err(generic_error(&format!(
                "Duplicate destination key in structure: {destination_key}"
            )));
        }
        self.entries.push(MappingEntry {
            destination_key: destination_key.to_string(),
            patterns,
        });
        Ok(())
    }

    /// Builder-style variant of [`insert`](Self::insert) taking raw strings
    pub fn with(mut self, destination_key: &str, raw_patterns: &[&str]) -> Result<Self> {
        let patterns = raw_patterns.iter().map(|raw| SourcePattern::parse(raw)).collect();
        self.insert(destination_key, patterns)?;
        Ok(self)
    }

    /// Builds the mapping from the settings `STRUCTURE` table
    ///
    /// A key starting with `-` is the deletion shorthand: `"-Parts": ["*.bak"]`
    /// means the same as adding `"-*.bak"` to the `"Parts"` entry. Shorthand
    /// patterns are appended after the entry's own patterns.
    ///
    /// # Errors
    /// Returns an error if a shorthand pattern carries its own modifier
    pub fn from_settings(table: &BTreeMap<String, Vec<String>>) -> Result<Self> {
        let mut mapping = StructureMapping::new();
        for (key, raw_patterns) in table.iter().filter(|(key, _)| !is_shorthand(key)) {
            let patterns = raw_patterns.iter().map(|raw| SourcePattern::parse(raw)).collect();
            mapping.insert(key, patterns)?;
        }

        for (key, raw_patterns) in table.iter().filter(|(key, _)| is_shorthand(key)) {
            let target_key = &key[DELETE_PREFIX.len_utf8()..];
            let mut patterns = Vec::with_capacity(raw_patterns.len());
            for raw in raw_patterns {
                if raw.starts_with(OPTIONAL_PREFIX) || raw.starts_with(DELETE_PREFIX) {
                    return Err(generic_error(&format!(
                        "Cleanup key \"{key}\" cannot have modifiers in pattern \"{raw}\""
                    )));
                }
                patterns.push(SourcePattern::new(PatternKind::Delete, raw));
            }
            match mapping.get_mut(target_key) {
                Some(entry) => entry.patterns.extend(patterns),
                None => mapping.insert(target_key, patterns)?,
            }
        }
        Ok(mapping)
    }

    pub fn get(&self, destination_key: &str) -> Option<&MappingEntry> {
        self.entries
            .iter()
            .find(|entry| entry.destination_key == destination_key)
    }

    fn get_mut(&mut self, destination_key: &str) -> Option<&mut MappingEntry> {
        self.entries
            .iter_mut()
            .find(|entry| entry.destination_key == destination_key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in processing order
    pub fn ordered_entries(&self) -> Vec<&MappingEntry> {
        let mut entries: Vec<&MappingEntry> = self.entries.iter().collect();
        entries.sort_by(|a, b| compare_destination_keys(&a.destination_key, &b.destination_key));
        entries
    }
}

fn is_shorthand(key: &str) -> bool {
    key.starts_with(DELETE_PREFIX)
}
