//! Steps shared by several sequences.

use std::path::PathBuf;

use tracing::{info, warn};

use crate::config::CommandVars;
use crate::debugger::{DebugSession, DebugState};
use crate::models::{Session, StepResult};
use crate::orchestrator::WorkflowEngine;
use crate::{AppError, Result};

const DEBUGGER_INTERRUPTED: &str = "\nRunning Debugger Interrupted.\n";

impl WorkflowEngine {
    pub(super) fn say(&self, text: &str) {
        self.collab.console.write(text);
    }

    /// Report a failed step: print `message`, clear both session flags and
    /// hand back `err` for the caller to return.
    pub(super) fn fail(&self, session: &mut Session, message: &str, err: AppError) -> AppError {
        self.say(message);
        session.connection_refreshed = false;
        session.is_loading = false;
        warn!(%err, "workflow step failed");
        err
    }

    pub(super) fn command_vars(&self) -> CommandVars {
        self.config.command_vars(&self.executable_path())
    }

    /// The primary executable as found in the object output directory.
    pub(super) fn executable_path(&self) -> PathBuf {
        let project = &self.collab.project;
        let primary = project.primary_executable_path();
        match primary.file_name() {
            Some(name) => project.object_output_directory().join(name),
            None => primary,
        }
    }

    pub(super) fn error_marker(&self) -> &str {
        &self.config.debugger.error_marker
    }

    /// Build the project; on failure print `failure` and abort.
    pub(super) async fn build_step(&self, session: &mut Session, failure: &str) -> Result<()> {
        let err = match self.collab.build.run_default_build_target().await {
            Ok(code) if StepResult::ExitCode(code).succeeded(self.error_marker()) => {
                info!("build complete");
                return Ok(());
            }
            Ok(code) => AppError::Build(format!("build exited with code {code}")),
            Err(err) => AppError::Build(format!("build did not run: {err}")),
        };
        Err(self.fail(session, failure, err))
    }

    /// Bring a held debugger back to its prompt before reloading.
    ///
    /// A running target is interrupted and the prompt awaited. A debugger
    /// that is gone or does not answer is dropped and the connection is no
    /// longer considered refreshed; so is a session without debugger.
    pub(super) async fn interrupt_running_debugger(&self, session: &mut Session) {
        let Some(manager) = session.manager.as_mut() else {
            session.connection_refreshed = false;
            return;
        };

        let ready = if !manager.is_alive() {
            false
        } else if manager.state() == DebugState::Idle {
            true
        } else {
            match manager.interrupt() {
                Ok(()) => {
                    self.say(DEBUGGER_INTERRUPTED);
                    let limit = Some(self.config.timeouts.debugger_interrupt());
                    match manager.send_and_await_idle("", limit).await {
                        Ok(_) => true,
                        Err(err) => {
                            warn!(%err, "interrupted debugger did not return to its prompt");
                            false
                        }
                    }
                }
                Err(err) => {
                    warn!(%err, "failed to interrupt debugger");
                    false
                }
            }
        };

        if !ready {
            if let Some(manager) = session.manager.take() {
                manager.kill();
            }
            session.connection_refreshed = false;
        }
    }

    /// Launch a fresh debugger on the primary executable and wait for its
    /// first prompt. The new debugger replaces the held one even when the
    /// wait fails, so a later reset still retires it.
    pub(super) async fn start_debugger(&self, session: &mut Session) -> Result<()> {
        let command = self.command_vars().render(&self.config.tools.debugger);
        let mut manager = DebugSession::spawn(&command, &self.ctx, &self.config.debugger.prompt)?;
        let ready = manager
            .send_and_await_idle("", self.config.timeouts.debugger_ready())
            .await;
        session.replace_manager(manager);
        ready.map(|_| ())
    }

    /// Send `command` to the held debugger and require an error-free reply.
    pub(super) async fn debugger_command(&self, session: &mut Session, command: &str) -> Result<String> {
        let limit = self.config.timeouts.debugger_ready();
        let manager = session
            .manager
            .as_mut()
            .ok_or_else(|| AppError::Debugger("no debugger running".into()))?;
        let reply = manager.send_and_await_idle(command, limit).await?;

        if StepResult::DebuggerReply(reply.clone()).succeeded(self.error_marker()) {
            Ok(reply)
        } else {
            Err(AppError::Debugger(format!(
                "{command:?} failed: {}",
                reply.trim()
            )))
        }
    }
}

/// Report any failure to reach or drive the debugger as `AppError::Debugger`.
pub(super) fn into_debugger_error(err: AppError) -> AppError {
    match err {
        AppError::Debugger(_) => err,
        other => AppError::Debugger(other.to_string()),
    }
}
