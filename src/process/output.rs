//! Shared output buffer between a process's reader tasks and its session.
//!
//! Reader tasks append through [`OutputSink`]; the owning session searches
//! the unread text through [`OutputCursor`]. A match consumes everything up
//! to and including the matched text, so consecutive waits observe output
//! strictly in order.

use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::watch;
use tokio::time::Instant;

/// Upper bound on unread output kept in memory: 1 MiB.
///
/// Long-running tools (emulator, board server) print continuously while no
/// one waits on them; beyond this bound the oldest unread text is dropped.
pub const MAX_BUFFERED_BYTES: usize = 1_048_576;

/// Result of [`OutputCursor::wait_for`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WaitOutcome {
    /// The matcher hit; carries the text preceding the match.
    Matched(String),
    /// The deadline passed first.
    TimedOut,
    /// Every writer closed without a match.
    Closed,
}

/// Writer half, cloned into each reader task.
#[derive(Debug, Clone)]
pub struct OutputSink {
    text: Arc<Mutex<String>>,
    notify: Arc<watch::Sender<usize>>,
}

/// Reader half, owned by the session.
#[derive(Debug)]
pub struct OutputCursor {
    text: Arc<Mutex<String>>,
    updates: watch::Receiver<usize>,
}

/// Create a connected sink/cursor pair.
#[must_use]
pub fn channel() -> (OutputSink, OutputCursor) {
    let text = Arc::new(Mutex::new(String::new()));
    let (tx, rx) = watch::channel(0);
    (
        OutputSink {
            text: Arc::clone(&text),
            notify: Arc::new(tx),
        },
        OutputCursor { text, updates: rx },
    )
}

impl OutputSink {
    /// Append `chunk` and wake the waiting cursor.
    pub fn append(&self, chunk: &str) {
        let len = {
            let mut text = self.text.lock().unwrap_or_else(PoisonError::into_inner);
            text.push_str(chunk);
            if text.len() > MAX_BUFFERED_BYTES {
                let mut cut = text.len() - MAX_BUFFERED_BYTES;
                while !text.is_char_boundary(cut) {
                    cut += 1;
                }
                text.drain(..cut);
            }
            text.len()
        };
        self.notify.send_replace(len);
    }
}

impl OutputCursor {
    /// Suspend until `find` locates a match in the unread text, `deadline`
    /// passes, or every sink is dropped.
    ///
    /// `find` returns the byte range of the match within the text it is
    /// given. On a match the text up to the end of the range is consumed.
    pub async fn wait_for<F>(&mut self, deadline: Option<Instant>, mut find: F) -> WaitOutcome
    where
        F: FnMut(&str) -> Option<(usize, usize)>,
    {
        loop {
            // Mark the current version seen before searching so an append
            // racing with the search still wakes `changed()`.
            self.updates.borrow_and_update();
            if let Some(before) = self.take_match(&mut find) {
                return WaitOutcome::Matched(before);
            }

            let changed = match deadline {
                Some(deadline) => {
                    match tokio::time::timeout_at(deadline, self.updates.changed()).await {
                        Ok(changed) => changed,
                        Err(_elapsed) => return WaitOutcome::TimedOut,
                    }
                }
                None => self.updates.changed().await,
            };

            if changed.is_err() {
                return self
                    .take_match(&mut find)
                    .map_or(WaitOutcome::Closed, WaitOutcome::Matched);
            }
        }
    }

    /// Unread text, without consuming it.
    #[must_use]
    pub fn pending(&self) -> String {
        self.text
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn take_match<F>(&self, find: &mut F) -> Option<String>
    where
        F: FnMut(&str) -> Option<(usize, usize)>,
    {
        let mut text = self.text.lock().unwrap_or_else(PoisonError::into_inner);
        let (start, end) = find(&text)?;
        let before = text[..start].to_owned();
        text.drain(..end);
        Some(before)
    }
}
