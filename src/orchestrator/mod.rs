//! Workflow orchestration.
//!
//! [`WorkflowEngine`] runs the four board-loading step sequences against a
//! caller-owned [`Session`](crate::models::Session). Collaborators (build
//! system, project metadata, console, task registry) are injected through
//! [`Collaborators`] so hosts and tests can substitute their own.

mod board;
mod emulator;
pub mod engine;
mod flash;
mod steps;

use std::sync::Arc;

use crate::config::LoaderConfig;
use crate::console::ConsoleSink;
use crate::process::{ProcessTable, TaskRegistry, ToolContext};
use crate::project::{BuildSystem, CommandBuild, ProjectMetadata, ProjectSettings};

pub use engine::WorkflowEngine;

/// Host services the engine depends on.
#[derive(Clone)]
pub struct Collaborators {
    /// Runs the project's default build target.
    pub build: Arc<dyn BuildSystem>,
    /// Describes the project's executable and switches.
    pub project: Arc<dyn ProjectMetadata>,
    /// Receives every status message and mirrored tool output.
    pub console: Arc<dyn ConsoleSink>,
    /// Running background tasks, consulted by reset and the board pre-check.
    pub tasks: Arc<dyn TaskRegistry>,
    /// Table every spawned tool registers in.
    pub table: ProcessTable,
}

impl Collaborators {
    /// Stock collaborators for `config`: the configured build command,
    /// project settings from `[project]`, and a fresh process table that
    /// also serves as the task registry.
    #[must_use]
    pub fn standard(config: &LoaderConfig, console: Arc<dyn ConsoleSink>) -> Self {
        let table = ProcessTable::new();
        let ctx = ToolContext::new(
            Arc::clone(&console),
            table.clone(),
            config.project.root.clone(),
        );
        Self {
            build: Arc::new(CommandBuild::new(config.project.build.clone(), ctx)),
            project: Arc::new(ProjectSettings::from_config(config)),
            console,
            tasks: Arc::new(table.clone()),
            table,
        }
    }
}
