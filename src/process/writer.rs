//! Stdin writer task.
//!
//! Receives text from an unbounded channel and writes it to the tool's
//! stdin, so callers can queue input without suspending.

use tokio::io::AsyncWriteExt;
use tokio::process::ChildStdin;
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Write every queued message to `stdin`, in order.
///
/// The task exits when the channel closes (the session was dropped) or a
/// write fails (the process exited).
pub async fn run_writer(task: String, mut stdin: ChildStdin, mut input_rx: mpsc::UnboundedReceiver<String>) {
    while let Some(text) = input_rx.recv().await {
        let written = async {
            stdin.write_all(text.as_bytes()).await?;
            stdin.flush().await
        }
        .await;

        if let Err(err) = written {
            warn!(task, %err, "write to stdin failed, stopping writer");
            return;
        }
        debug!(task, input = text.trim_end(), "tool input");
    }

    debug!(task, "input channel closed");
}
