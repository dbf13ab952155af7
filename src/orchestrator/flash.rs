//! Flash-to-board: build, convert to a raw image, write it with `st-flash`.

use tracing::info;

use crate::models::{Session, StepResult};
use crate::orchestrator::WorkflowEngine;
use crate::process::{Pattern, ProcessSession};
use crate::protocol::{FLASH_TASK, FLASH_VERIFIED, FLASH_VERIFY_STARTED, OBJCOPY_TASK};
use crate::{AppError, Result};

const OBJCOPY_FAILED: &str = "arm-eabi-objcopy Error. Exit.\n";

impl WorkflowEngine {
    pub(super) async fn flash_to_board(&self, session: &mut Session) -> Result<()> {
        self.say("\nBoard_Loader_STEP: Building Main...");
        self.build_step(session, "Compilation Error.\nExit.\n").await?;
        self.say("Build Complete!\n");

        self.say("\nBoard_Loader_STEP: Creating binary executable...");
        self.create_binary(session).await?;
        self.say("Complete!\n");

        self.say("\nBoard_Loader_STEP: Connecting to board...");
        self.write_flash(session).await?;
        self.say("Complete!\n");

        self.say("\nRunning on board...");
        Ok(())
    }

    async fn create_binary(&self, session: &mut Session) -> Result<()> {
        let command = self.command_vars().render(&self.config.tools.objcopy);
        let mut objcopy = ProcessSession::spawn(OBJCOPY_TASK, &command, &self.ctx).map_err(|err| {
            self.fail(session, "Fail to create executable from object file. Exit.\n", err)
        })?;

        let code = objcopy
            .await_exit(None)
            .await
            .map_err(|err| self.fail(session, OBJCOPY_FAILED, err))?;
        if !StepResult::ExitCode(code).succeeded(self.error_marker()) {
            return Err(self.fail(
                session,
                OBJCOPY_FAILED,
                AppError::Build(format!("{OBJCOPY_TASK} exited with code {code}")),
            ));
        }
        info!(binary = %self.command_vars().binary, "binary image created");
        Ok(())
    }

    async fn write_flash(&self, session: &mut Session) -> Result<()> {
        let command = self.command_vars().render(&self.config.tools.flash);
        let mut flash = ProcessSession::spawn(FLASH_TASK, &command, &self.ctx)
            .map_err(|err| self.fail(session, "Fail to connect. Exit.\n", err))?;

        let timeouts = &self.config.timeouts;
        let started = flash
            .await_pattern(&Pattern::literal(FLASH_VERIFY_STARTED), timeouts.flash_verify_start())
            .await;
        let verified = started
            && flash
                .await_pattern(&Pattern::literal(FLASH_VERIFIED), timeouts.flash_verified())
                .await;

        if !StepResult::PatternMatched(verified).succeeded(self.error_marker()) {
            flash.kill();
            let missing = if started { FLASH_VERIFIED } else { FLASH_VERIFY_STARTED };
            return Err(self.fail(
                session,
                "Loading Error. Exit.\n",
                AppError::PatternTimeout(format!("{FLASH_TASK} never printed {missing:?}")),
            ));
        }
        info!(pid = flash.pid().unwrap_or(0), "flash written and verified");
        Ok(())
    }
}
