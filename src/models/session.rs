//! Persistent session state shared by successive workflow invocations.

use serde::Serialize;

use crate::debugger::DebugSession;
use crate::process::ProcessSession;

/// State carried from one workflow invocation to the next.
///
/// Owns at most one debugger (`manager`) and one long-running tool
/// (`connection`: the board server or the emulator). Replacing either
/// retires the previous handle first.
#[derive(Debug, Default)]
pub struct Session {
    /// Single-flight guard; true while a workflow runs.
    pub is_loading: bool,
    /// A connection and debugger were established and may be reused.
    pub connection_refreshed: bool,
    pub(crate) manager: Option<DebugSession>,
    pub(crate) connection: Option<ProcessSession>,
}

/// Serializable view of a [`Session`].
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct SessionSnapshot {
    /// See [`Session::is_loading`].
    pub is_loading: bool,
    /// See [`Session::connection_refreshed`].
    pub connection_refreshed: bool,
    /// Whether a live debugger is held.
    pub debugger_running: bool,
    /// Task name of the held connection, if it is alive.
    pub connection: Option<String>,
}

impl Session {
    /// A fresh session: nothing loading, nothing connected.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a debugger handle is held.
    #[must_use]
    pub fn has_manager(&self) -> bool {
        self.manager.is_some()
    }

    /// Whether a connection handle is held.
    #[must_use]
    pub fn has_connection(&self) -> bool {
        self.connection.is_some()
    }

    /// The held debugger, if any.
    #[must_use]
    pub fn manager(&self) -> Option<&DebugSession> {
        self.manager.as_ref()
    }

    /// The held connection, if any.
    #[must_use]
    pub fn connection(&self) -> Option<&ProcessSession> {
        self.connection.as_ref()
    }

    /// Whether the held debugger has exited on its own.
    #[must_use]
    pub fn manager_exited(&self) -> bool {
        self.manager.as_ref().is_some_and(|manager| !manager.is_alive())
    }

    /// Serializable view of the current state.
    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            is_loading: self.is_loading,
            connection_refreshed: self.connection_refreshed,
            debugger_running: self.manager.as_ref().is_some_and(DebugSession::is_alive),
            connection: self
                .connection
                .as_ref()
                .filter(|connection| connection.is_alive())
                .map(|connection| connection.name().to_owned()),
        }
    }

    /// Hold `manager`, asking the previous debugger to quit.
    pub(crate) fn replace_manager(&mut self, manager: DebugSession) {
        if let Some(mut previous) = self.manager.replace(manager) {
            previous.quit();
        }
    }

    /// Hold `connection`, killing the previous one.
    pub(crate) fn replace_connection(&mut self, connection: ProcessSession) {
        if let Some(previous) = self.connection.replace(connection) {
            previous.kill();
        }
    }
}
