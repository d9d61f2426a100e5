//! Workflow module
//!
//! This module contains components for orchestrating the release steps.

mod context;
mod engine;

pub use context::{ReleaseOutcome, WorkflowContext, WorkflowStats};
pub use engine::{ReleaseOptions, make_release, run_release};
