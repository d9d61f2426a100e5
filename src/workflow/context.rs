//! Workflow context
//!
//! This module defines the context passed between the release steps.

use std::path::PathBuf;

use crate::config::ReleaseConfig;
use crate::release::ReleaseVersion;
use crate::resolve::PathResolver;
use crate::structure::AssemblyReport;

/// Context for the workflow
///
/// Holds the run configuration and what the steps produced so far.
#[derive(Debug, Clone)]
pub struct WorkflowContext {
    /// The configuration
    pub config: ReleaseConfig,
    /// Version extracted from the sources
    pub version: Option<ReleaseVersion>,
    /// Statistics about the run
    pub stats: WorkflowStats,
}

/// Statistics about the workflow
#[derive(Debug, Clone, Default)]
pub struct WorkflowStats {
    /// Number of steps that did their work
    pub steps_run: usize,
    /// Number of steps skipped because they are not configured or requested
    pub steps_skipped: usize,
    /// What the structure assembly did
    pub assembly: AssemblyReport,
}

/// Final output of a release build
///
/// Everything a publisher needs to upload the release.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseOutcome {
    pub version: ReleaseVersion,
    /// The archive, when packaging was requested
    pub archive: Option<PathBuf>,
    /// Tag derived from the archive name
    pub release_tag: Option<String>,
    /// Changelog excerpt, when a changelog is configured
    pub description: Option<String>,
    pub assembly: AssemblyReport,
}

impl WorkflowContext {
    /// Creates a new workflow context
    pub fn new(config: ReleaseConfig) -> Self {
        WorkflowContext {
            config,
            version: None,
            stats: WorkflowStats::default(),
        }
    }

    /// Resolver over the roots and macros of this run
    pub fn resolver(&self) -> PathResolver<'_> {
        PathResolver::new(&self.config.layout, &self.config.macros)
    }

    pub fn increment_steps_run(&mut self) {
        self.stats.steps_run += 1;
    }

    pub fn increment_steps_skipped(&mut self) {
        self.stats.steps_skipped += 1;
    }
}
