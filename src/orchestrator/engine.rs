//! Single-flight workflow engine.

use std::sync::Arc;

use tracing::{debug, info, info_span, warn, Instrument};

use crate::config::LoaderConfig;
use crate::models::{Action, Session, WorkflowOutcome};
use crate::orchestrator::Collaborators;
use crate::process::ToolContext;
use crate::project;
use crate::{AppError, Result};

const DISCONNECTED: &str = "Disconnect: please ensure USB connection and restart. Exit.\n";

/// Runs board-loading workflows.
///
/// The engine itself is stateless; everything that must survive between
/// invocations lives in the [`Session`] handed to [`invoke`](Self::invoke).
pub struct WorkflowEngine {
    pub(super) config: Arc<LoaderConfig>,
    pub(super) collab: Collaborators,
    pub(super) ctx: ToolContext,
}

impl WorkflowEngine {
    /// Create an engine over `config` and `collab`.
    ///
    /// Tools run in `config.project.root` and register in `collab.table`.
    #[must_use]
    pub fn new(config: Arc<LoaderConfig>, collab: Collaborators) -> Self {
        let ctx = ToolContext::new(
            Arc::clone(&collab.console),
            collab.table.clone(),
            config.project.root.clone(),
        );
        Self {
            config,
            collab,
            ctx,
        }
    }

    /// Active configuration.
    #[must_use]
    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    /// Whether the project targets the configured board, i.e. whether the
    /// workflows should be offered at all.
    #[must_use]
    pub fn is_board_project(&self) -> bool {
        project::is_board_project(self.collab.project.as_ref(), &self.config.board)
    }

    /// Run the workflow for `action` to completion or first failure.
    ///
    /// Returns [`WorkflowOutcome::Busy`] without touching anything while
    /// another workflow holds `session.is_loading`. Whatever the outcome,
    /// `is_loading` is false once this returns.
    pub async fn invoke(&self, session: &mut Session, action: Action) -> WorkflowOutcome {
        if session.is_loading {
            debug!(%action, "workflow already running, trigger ignored");
            return WorkflowOutcome::Busy;
        }

        let span = info_span!("workflow", action = action.id());
        let result = self.dispatch(session, action).instrument(span).await;
        session.is_loading = false;

        match result {
            Ok(()) => {
                info!(%action, refreshed = session.connection_refreshed, "workflow complete");
                WorkflowOutcome::Success
            }
            Err(err) => {
                warn!(%action, %err, "workflow failed");
                WorkflowOutcome::Failure(err)
            }
        }
    }

    async fn dispatch(&self, session: &mut Session, action: Action) -> Result<()> {
        match action {
            Action::FlashToBoard => {
                session.is_loading = true;
                self.flash_to_board(session).await
            }
            Action::RunWithEmulator => {
                self.reset_all(session, action);
                session.is_loading = true;
                self.run_with_emulator(session).await
            }
            Action::LoadOnBoard => {
                if session.connection_refreshed && !self.collab.tasks.is_running(action.task_interest()) {
                    self.say(DISCONNECTED);
                    self.reset_all(session, action);
                    return Err(AppError::Disconnected(format!(
                        "{} is no longer running",
                        action.task_interest()
                    )));
                }
                session.is_loading = true;
                self.load_on_board(session).await
            }
            Action::DebugWithEmulator => {
                if session.connection_refreshed {
                    self.reset(session, action, false, true);
                    session.connection_refreshed = true;
                }
                session.is_loading = true;
                self.debug_with_emulator(session).await
            }
        }
    }

    /// Tear down the state `action` depends on.
    ///
    /// Optionally quits and drops the debugger and kills the held
    /// connection, interrupts every running task named after the action's
    /// tool, then clears both session flags. Safe to repeat.
    pub fn reset(&self, session: &mut Session, action: Action, kill_manager: bool, kill_connection: bool) {
        if kill_manager {
            if let Some(mut manager) = session.manager.take() {
                manager.quit();
            }
        }
        if kill_connection {
            if let Some(connection) = session.connection.take() {
                connection.kill();
            }
        }

        let interrupted = self.collab.tasks.interrupt_matching(action.task_interest());
        session.connection_refreshed = false;
        session.is_loading = false;
        info!(%action, kill_manager, kill_connection, interrupted, "session reset");
    }

    /// [`reset`](Self::reset) dropping both the debugger and the connection.
    pub fn reset_all(&self, session: &mut Session, action: Action) {
        self.reset(session, action, true, true);
    }

    /// Host hook for a debugger that exited on its own: tears down the
    /// board and emulator state.
    pub fn on_debugger_terminated(&self, session: &mut Session) {
        info!("debugger terminated");
        self.reset_all(session, Action::LoadOnBoard);
        self.reset_all(session, Action::RunWithEmulator);
    }

    /// Release every tool the session holds or the table lists.
    pub fn shutdown(&self, session: &mut Session) {
        for action in Action::ALL {
            self.reset_all(session, action);
        }
    }
}
