//! Operator-facing message console.
//!
//! Workflow step boundaries and mirrored tool output are appended to a
//! [`ConsoleSink`]. Writes never suspend.

use std::io::Write;
use std::sync::{Arc, Mutex, PoisonError};

use tracing::warn;

/// Append-only text sink shown to the operator.
pub trait ConsoleSink: Send + Sync {
    /// Append `text` verbatim; no newline is added.
    fn write(&self, text: &str);
}

/// Console printing to the process's standard output.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdoutConsole;

impl ConsoleSink for StdoutConsole {
    fn write(&self, text: &str) {
        let mut out = std::io::stdout().lock();
        if let Err(err) = out.write_all(text.as_bytes()).and_then(|()| out.flush()) {
            warn!(%err, "failed to write console message");
        }
    }
}

/// In-memory console keeping everything written to it.
#[derive(Debug, Default, Clone)]
pub struct BufferConsole {
    text: Arc<Mutex<String>>,
}

impl BufferConsole {
    /// Create an empty console.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything written so far.
    #[must_use]
    pub fn contents(&self) -> String {
        self.text
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Whether `needle` was written at some point.
    #[must_use]
    pub fn contains(&self, needle: &str) -> bool {
        self.text
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(needle)
    }
}

impl ConsoleSink for BufferConsole {
    fn write(&self, text: &str) {
        self.text
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_str(text);
    }
}
