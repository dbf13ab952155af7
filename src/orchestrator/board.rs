//! Load-on-board: keep `st-util` and the debugger attached to the board
//! across invocations, reloading the freshly built executable each time.

use tracing::{debug, info};

use crate::models::{Action, Session, StepResult};
use crate::orchestrator::steps::into_debugger_error;
use crate::orchestrator::WorkflowEngine;
use crate::process::{Pattern, ProcessSession};
use crate::protocol::{
    load_command, target_extended_remote_command, BOARD_DEVICE_CONNECTED, BOARD_LISTENING,
    BOARD_SERVER_TASK, DEBUGGER_CONTINUE,
};
use crate::{AppError, Result};

const CONNECTION_LOST: &str =
    "Connection Lost. Please ensure USB connection and restart. Exit.\n";

impl WorkflowEngine {
    pub(super) async fn load_on_board(&self, session: &mut Session) -> Result<()> {
        self.interrupt_running_debugger(session).await;

        self.say("\nBoard_Loader_STEP: Building Main...");
        self.build_step(session, "Compilation Error. Exit.\n").await?;
        self.say("Build Complete!\n");

        if !session.connection_refreshed {
            self.say("Board_Loader_STEP: Connecting to board...");
            self.connect_board(session).await?;
            self.say("Complete!\n");
        }

        self.say("Board_Loader_STEP: Loading executable file...");
        if let Err(err) = self.load_executable(session).await {
            let err = self.fail(session, CONNECTION_LOST, into_debugger_error(err));
            self.reset_all(session, Action::LoadOnBoard);
            return Err(err);
        }
        self.say("Complete!\n");

        self.say("\nBoard_Loader_Complete!\n");
        let resumed = session
            .manager
            .as_mut()
            .ok_or_else(|| AppError::Debugger("no debugger running".into()))
            .and_then(|manager| manager.send_non_blocking(DEBUGGER_CONTINUE));
        if let Err(err) = resumed {
            let err = self.fail(session, CONNECTION_LOST, into_debugger_error(err));
            self.reset_all(session, Action::LoadOnBoard);
            return Err(err);
        }

        session.connection_refreshed = true;
        Ok(())
    }

    /// Start the board GDB server and wait until it reports the device and
    /// listens for the debugger.
    async fn connect_board(&self, session: &mut Session) -> Result<()> {
        if let Some(mut stale) = session.connection.take() {
            stale.kill();
            if let Err(err) = stale.await_exit(Some(self.config.timeouts.board_listening())).await {
                debug!(%err, "stale connection still exiting");
            }
        }

        let command = self.command_vars().render(&self.config.tools.board_server);
        let mut server = ProcessSession::spawn(BOARD_SERVER_TASK, &command, &self.ctx)
            .map_err(|err| self.fail(session, "Can't call stlink. Exit.\n", err))?;

        let timeouts = &self.config.timeouts;
        let connected = server
            .await_pattern(&Pattern::literal(BOARD_DEVICE_CONNECTED), timeouts.board_connected())
            .await;
        let listening = connected
            && server
                .await_pattern(&Pattern::literal(BOARD_LISTENING), timeouts.board_listening())
                .await;

        if !StepResult::PatternMatched(listening).succeeded(self.error_marker()) {
            server.kill();
            let missing = if connected { BOARD_LISTENING } else { BOARD_DEVICE_CONNECTED };
            return Err(self.fail(
                session,
                "Connection Error. Exit.\n",
                AppError::PatternTimeout(format!("{BOARD_SERVER_TASK} never printed {missing:?}")),
            ));
        }

        info!(pid = server.pid().unwrap_or(0), "board connected");
        session.replace_connection(server);
        Ok(())
    }

    /// Load the executable through the held debugger, or through a fresh one
    /// attached to the board server.
    async fn load_executable(&self, session: &mut Session) -> Result<()> {
        let load = load_command(&self.command_vars().executable);
        if session.connection_refreshed {
            self.debugger_command(session, &load).await?;
        } else {
            self.start_debugger(session).await?;
            let attach = target_extended_remote_command(self.config.board_server_port);
            self.debugger_command(session, &attach).await?;
            self.debugger_command(session, &load).await?;
        }
        info!("executable loaded");
        Ok(())
    }
}
