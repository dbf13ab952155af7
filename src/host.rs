//! Line-oriented front end over a [`WorkflowEngine`].
//!
//! [`serve`] reads one command per line and runs triggers against a single
//! long-lived [`Session`]. Input keeps being read while a workflow runs:
//!
//! | Command during a workflow | Effect |
//! |---------------------------|--------|
//! | any trigger | ignored, reported as busy |
//! | `status` | reports the running workflow |
//! | `help` | prints the command list |
//! | `reset` | queued until the workflow ends |
//! | `quit` | abandons the workflow and shuts down |

use std::collections::VecDeque;
use std::future::Future;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, Lines};
use tracing::{debug, info, warn};

use crate::console::ConsoleSink;
use crate::models::{Action, Session, WorkflowOutcome};
use crate::orchestrator::WorkflowEngine;
use crate::{AppError, Result};

/// Command list printed on start and on `help`.
pub const HELP: &str = "commands: flash | load | run | debug | reset | status | quit\n";

/// One line of operator input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Trigger a workflow.
    Run(Action),
    /// Release every tool and clear the session.
    Reset,
    /// Print the session snapshot.
    Status,
    /// Print the command list.
    Help,
    /// Shut down.
    Quit,
}

impl Command {
    /// Parse a trimmed input line.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` for an unknown command.
    pub fn parse(input: &str) -> Result<Self> {
        match input {
            "reset" => Ok(Self::Reset),
            "status" => Ok(Self::Status),
            "help" | "?" => Ok(Self::Help),
            "quit" | "exit" => Ok(Self::Quit),
            other => other.parse().map(Self::Run),
        }
    }
}

/// Serve commands from `input` until it closes, `quit` is read or
/// `shutdown` resolves, then release everything the session holds.
///
/// # Errors
///
/// Returns `AppError::Io` when `input` cannot be read or the status
/// snapshot cannot be rendered.
pub async fn serve<R, S>(engine: &WorkflowEngine, console: &dyn ConsoleSink, input: R, shutdown: S) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    S: Future<Output = ()>,
{
    let mut session = Session::new();
    let mut lines = input.lines();
    let mut input_open = true;
    let mut deferred = VecDeque::new();
    tokio::pin!(shutdown);

    console.write(HELP);
    'serve: loop {
        let command = if let Some(command) = deferred.pop_front() {
            command
        } else {
            if !input_open {
                break;
            }
            let line = tokio::select! {
                () = &mut shutdown => {
                    info!("shutdown signal received");
                    break;
                }
                line = next_line(&mut lines) => line?,
            };
            let Some(line) = line else {
                info!("input closed");
                break;
            };
            let Some(command) = parse_line(console, &line) else {
                continue;
            };
            command
        };

        if session.manager_exited() {
            engine.on_debugger_terminated(&mut session);
        }

        match command {
            Command::Run(action) => {
                let invocation = engine.invoke(&mut session, action);
                tokio::pin!(invocation);
                let outcome = loop {
                    tokio::select! {
                        outcome = &mut invocation => break outcome,
                        () = &mut shutdown => {
                            info!(%action, "shutdown signal received mid-workflow");
                            break 'serve;
                        }
                        line = next_line(&mut lines), if input_open => {
                            let Some(line) = line? else {
                                input_open = false;
                                continue;
                            };
                            match parse_line(console, &line) {
                                Some(Command::Run(other)) => {
                                    debug!(running = %action, ignored = %other, "trigger during workflow");
                                    report(console, other, &WorkflowOutcome::Busy);
                                }
                                Some(Command::Status) => {
                                    console.write(&format!("{} is running.\n", action.label()));
                                }
                                Some(Command::Help) => console.write(HELP),
                                Some(Command::Reset) => deferred.push_back(Command::Reset),
                                Some(Command::Quit) => {
                                    info!(%action, "quit during workflow");
                                    break 'serve;
                                }
                                None => {}
                            }
                        }
                    }
                };
                report(console, action, &outcome);
            }
            Command::Reset => {
                engine.shutdown(&mut session);
                console.write("Reset.\n");
            }
            Command::Status => {
                let status = serde_json::to_string_pretty(&session.snapshot())
                    .map_err(|err| AppError::Io(format!("failed to render status: {err}")))?;
                console.write(&format!("{status}\n"));
            }
            Command::Help => console.write(HELP),
            Command::Quit => break,
        }
    }

    engine.shutdown(&mut session);
    Ok(())
}

async fn next_line<R>(lines: &mut Lines<R>) -> Result<Option<String>>
where
    R: AsyncBufRead + Unpin,
{
    lines
        .next_line()
        .await
        .map_err(|err| AppError::Io(format!("failed to read input: {err}")))
}

fn parse_line(console: &dyn ConsoleSink, line: &str) -> Option<Command> {
    let input = line.trim();
    if input.is_empty() {
        return None;
    }
    match Command::parse(input) {
        Ok(command) => Some(command),
        Err(err) => {
            warn!(%err, input, "unrecognised command");
            console.write(&format!("{err}\n{HELP}"));
            None
        }
    }
}

fn report(console: &dyn ConsoleSink, action: Action, outcome: &WorkflowOutcome) {
    match outcome {
        WorkflowOutcome::Success => {}
        WorkflowOutcome::Busy => console.write(&format!("{} ignored: a workflow is running.\n", action.label())),
        WorkflowOutcome::Failure(err) => console.write(&format!("{} failed: {err}\n", action.label())),
    }
}
