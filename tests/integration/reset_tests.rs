//! Integration tests for session reset and teardown hooks.

use board_loader::models::{Action, Session};
use board_loader::process::TaskRegistry;

use super::test_helpers::{eventually, harness};

#[tokio::test]
async fn reset_on_idle_session_is_idempotent() {
    let h = harness();
    let mut session = Session::new();

    h.engine.reset_all(&mut session, Action::LoadOnBoard);
    h.engine.reset_all(&mut session, Action::LoadOnBoard);

    assert!(!session.is_loading);
    assert!(!session.connection_refreshed);
    assert!(!session.has_manager());
    assert!(!session.has_connection());
}

#[tokio::test]
async fn reset_all_tears_down_board_session() {
    let h = harness();
    let mut session = Session::new();
    assert!(h.engine.invoke(&mut session, Action::LoadOnBoard).await.is_success());

    h.engine.reset_all(&mut session, Action::LoadOnBoard);

    assert!(!session.connection_refreshed);
    assert!(!session.has_manager());
    assert!(!session.has_connection());
    assert!(eventually(|| !h.table.is_running("st-util")).await);
    assert!(eventually(|| !h.table.is_running("arm-eabi-gdb")).await, "debugger quits on q");
}

#[tokio::test]
async fn reset_can_keep_the_debugger() {
    let h = harness();
    let mut session = Session::new();
    assert!(h.engine.invoke(&mut session, Action::DebugWithEmulator).await.is_success());

    h.engine.reset(&mut session, Action::DebugWithEmulator, false, true);

    assert!(session.has_manager());
    assert!(!session.has_connection());
    assert!(!session.connection_refreshed);
    assert!(eventually(|| !h.table.is_running("arm-eabi-gnatemu")).await);
    assert!(h.table.is_running("arm-eabi-gdb"));

    h.engine.shutdown(&mut session);
}

#[tokio::test]
async fn reset_interrupts_unowned_tasks_by_name() {
    let h = harness();
    let mut first = Session::new();
    assert!(h.engine.invoke(&mut first, Action::RunWithEmulator).await.is_success());

    // A different session still reaches the emulator through the registry.
    let mut other = Session::new();
    h.engine.reset_all(&mut other, Action::RunWithEmulator);

    assert!(eventually(|| !h.table.is_running("arm-eabi-gnatemu")).await);
}

#[tokio::test]
async fn debugger_termination_resets_everything() {
    let h = harness();
    let mut session = Session::new();
    assert!(h.engine.invoke(&mut session, Action::LoadOnBoard).await.is_success());

    h.table.interrupt_matching("arm-eabi-gdb");
    assert!(eventually(|| session.manager_exited()).await);

    h.engine.on_debugger_terminated(&mut session);

    assert!(!session.connection_refreshed);
    assert!(!session.has_manager());
    assert!(!session.has_connection());
    assert!(eventually(|| h.table.is_empty()).await);
}

#[tokio::test]
async fn shutdown_releases_every_tool() {
    let h = harness();
    let mut session = Session::new();
    assert!(h.engine.invoke(&mut session, Action::DebugWithEmulator).await.is_success());

    h.engine.shutdown(&mut session);

    assert_eq!(session.snapshot().connection, None);
    assert!(!session.snapshot().debugger_running);
    assert!(eventually(|| h.table.is_empty()).await);
}
