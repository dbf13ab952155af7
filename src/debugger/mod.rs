//! Interactive debugger session.
//!
//! Wraps a [`ProcessSession`] running the cross debugger and speaks its
//! console prompt protocol. The session is either [`DebugState::Busy`] or
//! [`DebugState::Idle`]:
//!
//! - every command sent moves it to `Busy`;
//! - only [`DebugSession::send_and_await_idle`] moves it back to `Idle`, by
//!   consuming the next prompt marker from the debugger's output.
//!
//! Resume-style commands (`c`, `q`) go through
//! [`DebugSession::send_non_blocking`] so the workflow never waits for the
//! target to stop.

use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, info};

use crate::process::{OutputStreams, ProcessSession, ToolContext, WaitOutcome};
use crate::protocol::{DEBUGGER_QUIT, DEBUGGER_TASK};
use crate::{AppError, Result};

/// Prompt-protocol state of a [`DebugSession`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebugState {
    /// A command is in flight or the target is running.
    Busy,
    /// The debugger printed its prompt and nothing was sent since.
    Idle,
}

/// A running debugger.
#[derive(Debug)]
pub struct DebugSession {
    process: ProcessSession,
    prompt: String,
    state: DebugState,
}

impl DebugSession {
    /// Launch the debugger `command`; `prompt` is its idle marker.
    ///
    /// The new session is `Busy` until its first prompt is awaited. Error
    /// text the debugger prints on stderr lands in the reply of the command
    /// that caused it, ahead of the prompt that follows.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Spawn` if the debugger cannot be launched.
    pub fn spawn(command: &[String], ctx: &ToolContext, prompt: &str) -> Result<Self> {
        let process = ProcessSession::spawn_with(DEBUGGER_TASK, command, ctx, OutputStreams::Merged)?;
        Ok(Self {
            process,
            prompt: prompt.to_owned(),
            state: DebugState::Busy,
        })
    }

    /// Current protocol state.
    #[must_use]
    pub fn state(&self) -> DebugState {
        self.state
    }

    /// Whether the debugger process is still running.
    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.process.is_alive()
    }

    /// OS process id, when known.
    #[must_use]
    pub fn pid(&self) -> Option<u32> {
        self.process.pid()
    }

    /// Send `command` and suspend until the debugger is idle again.
    ///
    /// An empty `command` sends nothing and waits for the current idle
    /// state; it returns `""` at once when the session is already idle.
    /// Returns the reply text printed since the previous prompt.
    ///
    /// # Errors
    ///
    /// - `AppError::Timeout`: no prompt within `timeout`.
    /// - `AppError::Debugger`: the debugger exited before its prompt.
    /// - `AppError::Io`: the command could not be queued.
    pub async fn send_and_await_idle(&mut self, command: &str, timeout: Option<Duration>) -> Result<String> {
        if command.is_empty() {
            if self.state == DebugState::Idle {
                return Ok(String::new());
            }
        } else {
            self.send(command)?;
        }

        let deadline = timeout.map(|limit| Instant::now() + limit);
        let prompt = self.prompt.as_str();
        let outcome = self
            .process
            .output_mut()
            .wait_for(deadline, |text| text.find(prompt).map(|at| (at, at + prompt.len())))
            .await;

        match outcome {
            WaitOutcome::Matched(reply) => {
                self.state = DebugState::Idle;
                debug!(command, reply = reply.trim_end(), "debugger idle");
                Ok(reply)
            }
            WaitOutcome::TimedOut => Err(AppError::Timeout(format!(
                "debugger not idle within {timeout:?} after {command:?}"
            ))),
            WaitOutcome::Closed => Err(AppError::Debugger(format!(
                "debugger exited before its prompt after {command:?}"
            ))),
        }
    }

    /// Send `command` without waiting for the prompt.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Io` when the debugger's stdin is closed.
    pub fn send_non_blocking(&mut self, command: &str) -> Result<()> {
        self.send(command)
    }

    /// Interrupt the running target, as the IDE's "Debug/Interrupt" does.
    ///
    /// The debugger answers with a fresh prompt; await it with an empty
    /// [`send_and_await_idle`](Self::send_and_await_idle).
    ///
    /// # Errors
    ///
    /// Returns `AppError::Debugger` if the signal cannot be delivered.
    pub fn interrupt(&mut self) -> Result<()> {
        let pid = self
            .process
            .pid()
            .ok_or_else(|| AppError::Debugger("debugger has no process id".into()))?;
        send_interrupt(pid)?;
        self.state = DebugState::Busy;
        info!(pid, "debugger interrupted");
        Ok(())
    }

    /// Ask the debugger to quit; does not wait.
    pub fn quit(&mut self) {
        if let Err(err) = self.send(DEBUGGER_QUIT) {
            debug!(%err, "debugger already gone on quit");
        }
    }

    /// Terminate the debugger process.
    pub fn kill(&self) {
        self.process.kill();
    }

    fn send(&mut self, command: &str) -> Result<()> {
        self.state = DebugState::Busy;
        debug!(command, "debugger command");
        self.process.send_input(&format!("{command}\n"))
    }
}

#[cfg(unix)]
fn send_interrupt(pid: u32) -> Result<()> {
    use nix::sys::signal::{kill, Signal};
    use nix::unistd::Pid;

    let raw = i32::try_from(pid)
        .map_err(|_| AppError::Debugger(format!("process id {pid} out of range")))?;
    kill(Pid::from_raw(raw), Signal::SIGINT)
        .map_err(|err| AppError::Debugger(format!("failed to interrupt debugger: {err}")))
}

#[cfg(not(unix))]
fn send_interrupt(_pid: u32) -> Result<()> {
    Err(AppError::Debugger(
        "interrupting the debugger is only supported on unix hosts".into(),
    ))
}
