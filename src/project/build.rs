//! Build through an external command.

use std::future::Future;
use std::pin::Pin;

use tracing::info;

use crate::process::{ProcessSession, ToolContext};
use crate::project::BuildSystem;
use crate::protocol::BUILD_TASK;
use crate::Result;

/// [`BuildSystem`] running a configured command such as
/// `gprbuild -P default.gpr`.
#[derive(Clone)]
pub struct CommandBuild {
    command: Vec<String>,
    ctx: ToolContext,
}

impl CommandBuild {
    /// Build by running `command` with `ctx`'s console and working directory.
    #[must_use]
    pub fn new(command: Vec<String>, ctx: ToolContext) -> Self {
        Self { command, ctx }
    }
}

impl BuildSystem for CommandBuild {
    fn run_default_build_target(&self) -> Pin<Box<dyn Future<Output = Result<i32>> + Send + '_>> {
        Box::pin(async move {
            let mut build = ProcessSession::spawn(BUILD_TASK, &self.command, &self.ctx)?;
            let code = build.await_exit(None).await?;
            info!(code, "build finished");
            Ok(code)
        })
    }
}
