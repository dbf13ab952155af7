//! External tool processes.
//!
//! [`ProcessSession`] spawns one tool and exposes the primitives the
//! workflows are built from:
//!
//! | Primitive | Suspends until |
//! |-----------|----------------|
//! | [`ProcessSession::await_exit`] | the process exits, or the bound elapses (error) |
//! | [`ProcessSession::await_pattern`] | the output contains a pattern, or the bound elapses (`false`) |
//! | [`ProcessSession::send_input`] | never; queued to the stdin writer |
//! | [`ProcessSession::kill`] | never; idempotent |
//!
//! Each session runs background reader tasks (one per output pipe), a stdin
//! writer and an exit monitor, and is listed in the shared [`ProcessTable`]
//! while alive.

pub mod codec;
pub mod monitor;
pub mod output;
pub mod reader;
pub mod table;
pub mod writer;

use std::path::PathBuf;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use regex::Regex;
use tokio::io::AsyncRead;
use tokio::process::Command;
use tokio::sync::{mpsc, watch};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::console::ConsoleSink;
use crate::{AppError, Result};

pub use output::WaitOutcome;
pub use table::{ProcessTable, RunningTask, TaskRegistry};

/// Everything a spawned tool needs from its host.
#[derive(Clone)]
pub struct ToolContext {
    /// Console receiving the mirrored tool output.
    pub console: Arc<dyn ConsoleSink>,
    /// Table the process is registered in while alive.
    pub table: ProcessTable,
    /// Working directory of the tool.
    pub working_dir: PathBuf,
}

impl ToolContext {
    /// Bundle a console, a process table and a working directory.
    #[must_use]
    pub fn new(console: Arc<dyn ConsoleSink>, table: ProcessTable, working_dir: PathBuf) -> Self {
        Self {
            console,
            table,
            working_dir,
        }
    }
}

/// Output pattern awaited by [`ProcessSession::await_pattern`].
#[derive(Debug, Clone)]
pub enum Pattern {
    /// Exact substring.
    Literal(String),
    /// Regular expression.
    Regex(Regex),
}

impl Pattern {
    /// Pattern matching `text` verbatim.
    #[must_use]
    pub fn literal(text: impl Into<String>) -> Self {
        Self::Literal(text.into())
    }

    /// Pattern compiled from a regular expression.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if `source` is not a valid expression.
    pub fn regex(source: &str) -> Result<Self> {
        Regex::new(source)
            .map(Self::Regex)
            .map_err(|err| AppError::Config(format!("invalid pattern {source:?}: {err}")))
    }

    /// Byte range of the first match in `text`.
    #[must_use]
    pub fn find(&self, text: &str) -> Option<(usize, usize)> {
        match self {
            Self::Literal(needle) => text.find(needle.as_str()).map(|at| (at, at + needle.len())),
            Self::Regex(regex) => regex.find(text).map(|m| (m.start(), m.end())),
        }
    }
}

impl From<&str> for Pattern {
    fn from(text: &str) -> Self {
        Self::literal(text)
    }
}

impl std::fmt::Display for Pattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Literal(needle) => write!(f, "{needle:?}"),
            Self::Regex(regex) => write!(f, "/{}/", regex.as_str()),
        }
    }
}

/// How a tool's stdout and stderr reach its output buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputStreams {
    /// One pipe and one reader per stream. Text written to different
    /// streams may interleave in any order.
    Separate,
    /// stderr shares the stdout pipe, so the buffer keeps the order the tool
    /// wrote in. Unix only; other hosts fall back to [`Separate`](Self::Separate).
    Merged,
}

/// A running external tool.
#[derive(Debug)]
pub struct ProcessSession {
    name: String,
    pid: Option<u32>,
    output: output::OutputCursor,
    input: mpsc::UnboundedSender<String>,
    exit: watch::Receiver<Option<i32>>,
    kill: CancellationToken,
}

impl ProcessSession {
    /// Launch `command` (program followed by its arguments) as task `name`,
    /// reading stdout and stderr on separate pipes.
    ///
    /// Must be called from within a tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Spawn` when `command` is empty, the program cannot
    /// be launched (not found, permission denied), or its pipes cannot be
    /// captured.
    pub fn spawn(name: &str, command: &[String], ctx: &ToolContext) -> Result<Self> {
        Self::spawn_with(name, command, ctx, OutputStreams::Separate)
    }

    /// [`spawn`](Self::spawn) with an explicit [`OutputStreams`] layout.
    ///
    /// # Errors
    ///
    /// As [`spawn`](Self::spawn); also `AppError::Spawn` when the merged
    /// output pipe cannot be created.
    pub fn spawn_with(name: &str, command: &[String], ctx: &ToolContext, streams: OutputStreams) -> Result<Self> {
        let (program, args) = command
            .split_first()
            .ok_or_else(|| AppError::Spawn(format!("{name}: empty command")))?;

        let mut cmd = Command::new(program);
        cmd.args(args)
            .current_dir(&ctx.working_dir)
            .stdin(Stdio::piped())
            .kill_on_drop(true);
        let merged = configure_output(&mut cmd, name, streams)?;

        let mut child = cmd
            .spawn()
            .map_err(|err| AppError::Spawn(format!("failed to spawn {program}: {err}")))?;
        // The command keeps the parent's copies of a merged write end open.
        drop(cmd);

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| AppError::Spawn(format!("failed to capture {name} stdin")))?;

        let (sink, cursor) = output::channel();
        if let Some(combined) = merged {
            tokio::spawn(reader::run_reader(
                name.to_owned(),
                combined,
                sink,
                Arc::clone(&ctx.console),
            ));
        } else {
            let stdout = child
                .stdout
                .take()
                .ok_or_else(|| AppError::Spawn(format!("failed to capture {name} stdout")))?;
            let stderr = child
                .stderr
                .take()
                .ok_or_else(|| AppError::Spawn(format!("failed to capture {name} stderr")))?;
            tokio::spawn(reader::run_reader(
                name.to_owned(),
                stdout,
                sink.clone(),
                Arc::clone(&ctx.console),
            ));
            tokio::spawn(reader::run_reader(
                name.to_owned(),
                stderr,
                sink,
                Arc::clone(&ctx.console),
            ));
        }

        let pid = child.id();

        let (input_tx, input_rx) = mpsc::unbounded_channel();
        tokio::spawn(writer::run_writer(name.to_owned(), stdin, input_rx));

        let kill = CancellationToken::new();
        let table_id = ctx.table.register(RunningTask::new(name, pid, kill.clone()));
        let (exit_tx, exit_rx) = watch::channel(None);
        let _monitor = monitor::monitor_exit(
            name.to_owned(),
            child,
            kill.clone(),
            exit_tx,
            ctx.table.clone(),
            table_id,
        );

        info!(task = name, pid = pid.unwrap_or(0), program = program.as_str(), "tool process spawned");

        Ok(Self {
            name: name.to_owned(),
            pid,
            output: cursor,
            input: input_tx,
            exit: exit_rx,
            kill,
        })
    }

    /// Task name the process is registered under.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// OS process id, when known.
    #[must_use]
    pub fn pid(&self) -> Option<u32> {
        self.pid
    }

    /// Whether the process has not exited yet.
    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.exit.borrow().is_none()
    }

    /// Suspend until the process exits and return its exit code.
    ///
    /// A process ended by a signal reports
    /// [`SIGNALLED_EXIT_CODE`](monitor::SIGNALLED_EXIT_CODE).
    ///
    /// # Errors
    ///
    /// Returns `AppError::Timeout` when `timeout` elapses first, or
    /// `AppError::Io` if the exit monitor vanished.
    pub async fn await_exit(&mut self, timeout: Option<Duration>) -> Result<i32> {
        let name = self.name.clone();
        let wait = async {
            self.exit
                .wait_for(Option::is_some)
                .await
                .map(|status| status.unwrap_or(monitor::SIGNALLED_EXIT_CODE))
        };

        let status = match timeout {
            Some(limit) => tokio::time::timeout(limit, wait)
                .await
                .map_err(|_| AppError::Timeout(format!("{name} did not exit within {limit:?}")))?,
            None => wait.await,
        };

        let code = status.map_err(|_| AppError::Io(format!("{name} exit status unavailable")))?;
        debug!(task = name, code, "tool process exit observed");
        Ok(code)
    }

    /// Suspend until the combined output contains `pattern`.
    ///
    /// Returns `false` when `timeout` elapses or the output closes first;
    /// that is an expected outcome, not an error. A match consumes the
    /// output up to the end of the matched text.
    pub async fn await_pattern(&mut self, pattern: &Pattern, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let outcome = self
            .output
            .wait_for(Some(deadline), |text| pattern.find(text))
            .await;
        let matched = matches!(outcome, WaitOutcome::Matched(_));
        debug!(task = self.name, %pattern, matched, ?outcome, "pattern wait finished");
        matched
    }

    /// Queue `text` for the process's stdin; never suspends.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Io` when the stdin writer has stopped.
    pub fn send_input(&self, text: &str) -> Result<()> {
        self.input
            .send(text.to_owned())
            .map_err(|_| AppError::Io(format!("{} stdin is closed", self.name)))
    }

    /// Best-effort terminate; safe on an already-dead process.
    pub fn kill(&self) {
        if self.is_alive() {
            info!(task = self.name, pid = self.pid.unwrap_or(0), "killing tool process");
        }
        self.kill.cancel();
    }

    pub(crate) fn output_mut(&mut self) -> &mut output::OutputCursor {
        &mut self.output
    }
}

type BoxedOutput = Box<dyn AsyncRead + Unpin + Send>;

/// Wire the output pipes of `cmd`; returns the read end of a merged pipe.
fn configure_output(cmd: &mut Command, name: &str, streams: OutputStreams) -> Result<Option<BoxedOutput>> {
    #[cfg(unix)]
    if streams == OutputStreams::Merged {
        let pipe_err = |err: std::io::Error| AppError::Spawn(format!("failed to create {name} output pipe: {err}"));
        let (writer, reader) = tokio::net::unix::pipe::pipe().map_err(pipe_err)?;
        let stdout = writer.into_blocking_fd().map_err(pipe_err)?;
        let stderr = stdout.try_clone().map_err(pipe_err)?;
        cmd.stdout(stdout).stderr(stderr);
        return Ok(Some(Box::new(reader)));
    }

    #[cfg(not(unix))]
    let _ = streams;

    cmd.stdout(Stdio::piped()).stderr(Stdio::piped());
    Ok(None)
}
