//! Exit monitor task.
//!
//! Owns the [`Child`] for the whole life of the process. It publishes the
//! exit code through a [`watch`] channel, honours kill requests arriving
//! through a [`CancellationToken`], and removes the process from the task
//! table once it is gone.

use tokio::process::Child;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::process::table::ProcessTable;

/// Exit code reported for a process terminated by a signal.
pub const SIGNALLED_EXIT_CODE: i32 = -1;

/// Spawn the monitor for `child`, registered in `table` under `table_id`.
#[must_use]
pub fn monitor_exit(
    task: String,
    mut child: Child,
    kill: CancellationToken,
    exit_tx: watch::Sender<Option<i32>>,
    table: ProcessTable,
    table_id: u64,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let result = tokio::select! {
            result = child.wait() => result,
            () = kill.cancelled() => {
                debug!(task, "kill requested");
                if let Err(err) = child.start_kill() {
                    // Already exited between the request and the kill.
                    debug!(task, %err, "start_kill failed");
                }
                child.wait().await
            }
        };

        let code = match result {
            Ok(status) => status.code().unwrap_or(SIGNALLED_EXIT_CODE),
            Err(err) => {
                warn!(task, %err, "error waiting for tool process");
                SIGNALLED_EXIT_CODE
            }
        };

        info!(task, code, "tool process exited");
        table.remove(table_id);
        exit_tx.send_replace(Some(code));
    })
}
