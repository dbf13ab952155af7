//! Project collaborators consumed by the workflow engine.
//!
//! The [`BuildSystem`] and [`ProjectMetadata`] traits decouple the engine
//! from how the host builds and describes the project. The stock
//! implementations, [`CommandBuild`] and [`ProjectSettings`], are driven by
//! the `[project]` section of the loader configuration.

pub mod build;
pub mod settings;

use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;

use crate::Result;

pub use build::CommandBuild;
pub use settings::ProjectSettings;

/// Runs the project's build.
pub trait BuildSystem: Send + Sync {
    /// Run the default (build-all) target and return its exit code.
    ///
    /// May take arbitrarily long; only the calling workflow suspends.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Spawn`](crate::AppError::Spawn) when the build
    /// could not be started at all.
    fn run_default_build_target(&self) -> Pin<Box<dyn Future<Output = Result<i32>> + Send + '_>>;
}

/// Describes the project being loaded.
pub trait ProjectMetadata: Send + Sync {
    /// Path of the primary executable object produced by the build. Only
    /// its file name is used; the workflows look it up in
    /// [`object_output_directory`](Self::object_output_directory).
    fn primary_executable_path(&self) -> PathBuf;

    /// Directory holding the build's object files, including the primary
    /// executable and the raw binary image made from it.
    fn object_output_directory(&self) -> PathBuf;

    /// Builder switches the project is compiled with.
    fn build_switches(&self) -> String;
}

/// Whether the board workflows apply to `project`: its builder switches
/// mention the `board` identifier.
#[must_use]
pub fn is_board_project(project: &dyn ProjectMetadata, board: &str) -> bool {
    project.build_switches().contains(board)
}
