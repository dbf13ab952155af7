//! Step and workflow results.

use crate::AppError;

/// Outcome of one awaited workflow step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepResult {
    /// A tool ran to completion with this exit code.
    ExitCode(i32),
    /// An awaited output pattern was (or was not) observed in time.
    PatternMatched(bool),
    /// The debugger went idle after printing this reply.
    DebuggerReply(String),
}

impl StepResult {
    /// Whether the sequence may continue past this step.
    ///
    /// Exit code 0, a matched pattern, or a reply free of `error_marker`.
    #[must_use]
    pub fn succeeded(&self, error_marker: &str) -> bool {
        match self {
            Self::ExitCode(code) => *code == 0,
            Self::PatternMatched(matched) => *matched,
            Self::DebuggerReply(reply) => !reply.contains(error_marker),
        }
    }
}

/// Terminal signal of one [`invoke`](crate::orchestrator::WorkflowEngine::invoke).
#[derive(Debug)]
pub enum WorkflowOutcome {
    /// Every step met its condition.
    Success,
    /// A step failed; the sequence stopped there.
    Failure(AppError),
    /// Another workflow was already running; nothing happened.
    Busy,
}

impl WorkflowOutcome {
    /// Whether the workflow completed.
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }

    /// Whether the trigger was ignored by the single-flight guard.
    #[must_use]
    pub fn is_busy(&self) -> bool {
        matches!(self, Self::Busy)
    }

    /// The failure, if any.
    #[must_use]
    pub fn error(&self) -> Option<&AppError> {
        match self {
            Self::Failure(err) => Some(err),
            Self::Success | Self::Busy => None,
        }
    }

    /// Human-readable failure reason, if any.
    #[must_use]
    pub fn reason(&self) -> Option<String> {
        self.error().map(ToString::to_string)
    }
}
