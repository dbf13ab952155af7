//! Project metadata taken from the loader configuration.

use std::path::PathBuf;

use crate::config::LoaderConfig;
use crate::project::ProjectMetadata;

/// [`ProjectMetadata`] backed by the `[project]` configuration section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectSettings {
    executable: PathBuf,
    object_dir: PathBuf,
    switches: String,
}

impl ProjectSettings {
    /// Capture the project layout described by `config`.
    #[must_use]
    pub fn from_config(config: &LoaderConfig) -> Self {
        Self {
            executable: config.executable_path(),
            object_dir: config.object_dir(),
            switches: config.project.switches.clone(),
        }
    }
}

impl ProjectMetadata for ProjectSettings {
    fn primary_executable_path(&self) -> PathBuf {
        self.executable.clone()
    }

    fn object_output_directory(&self) -> PathBuf {
        self.object_dir.clone()
    }

    fn build_switches(&self) -> String {
        self.switches.clone()
    }
}
