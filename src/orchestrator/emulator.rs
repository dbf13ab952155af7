//! Emulator workflows: plain run, and run under a remote debugger.

use tracing::info;

use crate::models::{Action, Session};
use crate::orchestrator::steps::into_debugger_error;
use crate::orchestrator::WorkflowEngine;
use crate::process::ProcessSession;
use crate::protocol::{target_remote_command, target_remote_confirmation, EMULATOR_TASK};
use crate::{AppError, Result};

const BUILD_FAILED: &str = "Compilation Error.\nExit Emulator.\n";

impl WorkflowEngine {
    pub(super) async fn run_with_emulator(&self, session: &mut Session) -> Result<()> {
        self.say("\nEmulator_STEP: Building Main...");
        self.build_step(session, BUILD_FAILED).await?;
        self.say("Build Complete!\n");

        self.say("\nEmulator_STEP: Initialize emulator...");
        self.spawn_emulator(session, &self.config.tools.emulator)?;
        self.say("Complete!\n");

        self.say("\nRunning with emulator...");
        Ok(())
    }

    pub(super) async fn debug_with_emulator(&self, session: &mut Session) -> Result<()> {
        self.interrupt_running_debugger(session).await;

        self.say("\nEmulator_STEP: Building Main...");
        self.build_step(session, BUILD_FAILED).await?;
        self.say("Complete!\n");

        self.say("\nEmulator_STEP: Initialize emulator...");
        self.spawn_emulator(session, &self.config.tools.emulator_debug)?;
        self.say("Complete!\n");

        if !session.connection_refreshed {
            self.say("Emulator_STEP: initializing debugger...");
            if let Err(err) = self.start_debugger(session).await {
                let err = self.fail(session, "Debugger has error. Exit.\n", into_debugger_error(err));
                self.reset_all(session, Action::DebugWithEmulator);
                return Err(err);
            }
            self.say("Complete!\n");
        }

        self.say("Emulator_STEP: targeting to remote localhost...");
        if let Err(err) = self.remote_target_handshake(session).await {
            let err = self.fail(session, "Fail to get target. Exit.\n", err);
            self.reset_all(session, Action::DebugWithEmulator);
            return Err(err);
        }
        self.say("Complete!\n");

        session.connection_refreshed = true;
        Ok(())
    }

    fn spawn_emulator(&self, session: &mut Session, template: &[String]) -> Result<()> {
        let command = self.command_vars().render(template);
        let emulator = ProcessSession::spawn(EMULATOR_TASK, &command, &self.ctx)
            .map_err(|err| self.fail(session, "Fail to call emulator. Exit.\n", err))?;
        info!(pid = emulator.pid().unwrap_or(0), "emulator started");
        session.replace_connection(emulator);
        Ok(())
    }

    /// Attach the held debugger to the emulator's remote stub.
    async fn remote_target_handshake(&self, session: &mut Session) -> Result<()> {
        let port = self.config.emulator_port;
        let manager = session
            .manager
            .as_mut()
            .ok_or_else(|| AppError::Handshake("no debugger running".into()))?;
        let reply = manager
            .send_and_await_idle(
                &target_remote_command(port),
                Some(self.config.timeouts.remote_target()),
            )
            .await
            .map_err(|err| AppError::Handshake(err.to_string()))?;

        let confirmation = target_remote_confirmation(port);
        if reply.contains(&confirmation) {
            info!(port, "debugger attached to emulator");
            Ok(())
        } else {
            Err(AppError::Handshake(format!(
                "expected {confirmation:?}, got {:?}",
                reply.trim()
            )))
        }
    }
}
