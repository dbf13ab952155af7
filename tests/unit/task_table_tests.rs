//! Unit tests for the process table and task registry.

use board_loader::process::{ProcessTable, RunningTask, TaskRegistry};
use tokio_util::sync::CancellationToken;

#[test]
fn register_and_remove() {
    let table = ProcessTable::new();
    assert!(table.is_empty());

    let id = table.register(RunningTask::new("st-util", Some(42), CancellationToken::new()));
    assert_eq!(table.len(), 1);
    assert!(table.is_running("st-util"));
    assert_eq!(table.list_running_tasks()[0].pid(), Some(42));

    table.remove(id);
    assert!(table.is_empty());
    assert!(!table.is_running("st-util"));

    // Removing twice is harmless.
    table.remove(id);
}

#[test]
fn interest_matches_substrings() {
    let table = ProcessTable::new();
    table.register(RunningTask::new("arm-eabi-gnatemu", None, CancellationToken::new()));

    assert!(table.is_running("gnatemu"));
    assert!(!table.is_running("st-util"));
}

#[test]
fn interrupt_matching_cancels_only_matching_tasks() {
    let table = ProcessTable::new();
    let emulator = CancellationToken::new();
    let server = CancellationToken::new();
    table.register(RunningTask::new("arm-eabi-gnatemu", None, emulator.clone()));
    table.register(RunningTask::new("st-util", None, server.clone()));

    assert_eq!(table.interrupt_matching("arm-eabi-gnatemu"), 1);
    assert!(emulator.is_cancelled());
    assert!(!server.is_cancelled());

    assert_eq!(table.interrupt_matching("st-flash"), 0);
}

#[test]
fn interrupt_is_repeatable() {
    let task = RunningTask::new("st-flash", None, CancellationToken::new());
    task.interrupt();
    task.interrupt();
    assert!(task.is_interrupted());
    assert_eq!(task.name(), "st-flash");
}

#[test]
fn clones_share_the_table() {
    let table = ProcessTable::new();
    let other = table.clone();
    other.register(RunningTask::new("arm-eabi-gdb", None, CancellationToken::new()));
    assert_eq!(table.len(), 1);
}
