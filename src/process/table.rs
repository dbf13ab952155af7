//! Registry of running tool processes.
//!
//! Every spawned tool is registered under its task name (`st-util`,
//! `arm-eabi-gnatemu`, ...) until it exits. Workflow resets interrupt tasks
//! by name, and the on-board workflow checks that the board server is still
//! alive before reusing a connection.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, PoisonError};

use tokio_util::sync::CancellationToken;
use tracing::info;

/// Handle on one running background task.
#[derive(Debug, Clone)]
pub struct RunningTask {
    name: String,
    pid: Option<u32>,
    cancel: CancellationToken,
}

impl RunningTask {
    /// Describe a task; `interrupt` fires `cancel`.
    #[must_use]
    pub fn new(name: impl Into<String>, pid: Option<u32>, cancel: CancellationToken) -> Self {
        Self {
            name: name.into(),
            pid,
            cancel,
        }
    }

    /// Task name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// OS process id, when known.
    #[must_use]
    pub fn pid(&self) -> Option<u32> {
        self.pid
    }

    /// Stop the task. Safe to call repeatedly.
    pub fn interrupt(&self) {
        info!(task = self.name, pid = self.pid.unwrap_or(0), "interrupting task");
        self.cancel.cancel();
    }

    /// Whether [`interrupt`](Self::interrupt) has been called.
    #[must_use]
    pub fn is_interrupted(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

/// Source of the currently running background tasks.
pub trait TaskRegistry: Send + Sync {
    /// Snapshot of the running tasks.
    fn list_running_tasks(&self) -> Vec<RunningTask>;

    /// Whether a task whose name contains `interest` is running.
    fn is_running(&self, interest: &str) -> bool {
        self.list_running_tasks()
            .iter()
            .any(|task| task.name().contains(interest))
    }

    /// Interrupt every task whose name contains `interest`; returns how many.
    fn interrupt_matching(&self, interest: &str) -> usize {
        let matching: Vec<RunningTask> = self
            .list_running_tasks()
            .into_iter()
            .filter(|task| task.name().contains(interest))
            .collect();
        for task in &matching {
            task.interrupt();
        }
        matching.len()
    }
}

#[derive(Debug, Default)]
struct TableInner {
    next_id: u64,
    tasks: BTreeMap<u64, RunningTask>,
}

/// Process table filled by [`ProcessSession::spawn`](crate::process::ProcessSession::spawn).
///
/// Cheap to clone; clones share the same table.
#[derive(Debug, Clone, Default)]
pub struct ProcessTable {
    inner: Arc<Mutex<TableInner>>,
}

impl ProcessTable {
    /// Create an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `task`; the returned id removes it again.
    pub fn register(&self, task: RunningTask) -> u64 {
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        inner.next_id += 1;
        let id = inner.next_id;
        inner.tasks.insert(id, task);
        id
    }

    /// Drop the task registered under `id`, if still present.
    pub fn remove(&self, id: u64) {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .tasks
            .remove(&id);
    }

    /// Number of registered tasks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .tasks
            .len()
    }

    /// Whether no task is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl TaskRegistry for ProcessTable {
    fn list_running_tasks(&self) -> Vec<RunningTask> {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .tasks
            .values()
            .cloned()
            .collect()
    }
}
