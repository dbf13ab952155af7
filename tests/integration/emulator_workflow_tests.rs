//! Integration tests for the emulator workflows.

use board_loader::debugger::DebugState;
use board_loader::models::{Action, Session};
use board_loader::process::TaskRegistry;
use board_loader::AppError;

use super::test_helpers::{eventually, fake_gdb, harness, harness_with, occurrences, Fakes};

fn emulator_count(table: &impl TaskRegistry) -> usize {
    table
        .list_running_tasks()
        .iter()
        .filter(|task| task.name() == "arm-eabi-gnatemu")
        .count()
}

#[tokio::test]
async fn run_with_emulator_starts_emulator() {
    let h = harness();
    let mut session = Session::new();

    let outcome = h.engine.invoke(&mut session, Action::RunWithEmulator).await;

    assert!(outcome.is_success(), "unexpected outcome: {outcome:?}");
    assert!(!session.is_loading);
    assert!(session.has_connection());
    assert!(h.table.is_running("arm-eabi-gnatemu"));
    let console = h.console.contents();
    assert!(console.contains("\nEmulator_STEP: Building Main..."));
    assert!(console.contains("\nEmulator_STEP: Initialize emulator..."));
    assert!(console.contains("\nRunning with emulator..."), "console: {console}");

    h.engine.shutdown(&mut session);
}

#[tokio::test]
async fn rerun_replaces_previous_emulator() {
    let h = harness();
    let mut session = Session::new();

    assert!(h.engine.invoke(&mut session, Action::RunWithEmulator).await.is_success());
    assert!(h.engine.invoke(&mut session, Action::RunWithEmulator).await.is_success());

    assert!(eventually(|| emulator_count(&h.table) == 1).await);
    h.engine.shutdown(&mut session);
}

#[tokio::test]
async fn emulator_build_failure() {
    let h = harness_with(Fakes::default(), 1, |_| {});
    let mut session = Session::new();

    let outcome = h.engine.invoke(&mut session, Action::RunWithEmulator).await;

    assert!(matches!(outcome.error(), Some(AppError::Build(_))));
    assert!(h.console.contains("Compilation Error.\nExit Emulator.\n"));
    assert!(!session.has_connection());
    assert!(!session.is_loading);
}

#[tokio::test]
async fn missing_emulator_fails() {
    let h = harness_with(Fakes::default(), 0, |config| {
        config.tools.emulator = vec!["/definitely/not/arm-eabi-gnatemu".into()];
    });
    let mut session = Session::new();

    let outcome = h.engine.invoke(&mut session, Action::RunWithEmulator).await;

    assert!(matches!(outcome.error(), Some(AppError::Spawn(_))));
    assert!(h.console.contains("Fail to call emulator. Exit.\n"));
    assert!(!session.is_loading);
}

#[tokio::test]
async fn debug_with_emulator_attaches_debugger() {
    let h = harness();
    let mut session = Session::new();

    let outcome = h.engine.invoke(&mut session, Action::DebugWithEmulator).await;

    assert!(outcome.is_success(), "unexpected outcome: {outcome:?}");
    assert!(!session.is_loading);
    assert!(session.connection_refreshed);
    assert_eq!(session.manager().map(|m| m.state()), Some(DebugState::Idle));
    assert!(session.has_connection());
    let console = h.console.contents();
    assert!(console.contains("Emulator_STEP: initializing debugger..."));
    assert!(console.contains("Emulator_STEP: targeting to remote localhost..."));
    assert!(console.contains("Complete!\n"), "console: {console}");

    h.engine.shutdown(&mut session);
}

#[tokio::test]
async fn second_debug_run_reuses_debugger() {
    let h = harness();
    let mut session = Session::new();

    assert!(h.engine.invoke(&mut session, Action::DebugWithEmulator).await.is_success());
    let pid = session.manager().and_then(|m| m.pid());
    let outcome = h.engine.invoke(&mut session, Action::DebugWithEmulator).await;

    assert!(outcome.is_success(), "unexpected outcome: {outcome:?}");
    assert!(session.connection_refreshed);
    assert_eq!(session.manager().and_then(|m| m.pid()), pid, "same debugger process");
    assert_eq!(occurrences(&h.console, "Emulator_STEP: initializing debugger..."), 1);
    assert_eq!(occurrences(&h.console, "Emulator_STEP: targeting to remote localhost..."), 2);
    assert!(eventually(|| emulator_count(&h.table) == 1).await);

    h.engine.shutdown(&mut session);
}

#[tokio::test]
async fn missing_confirmation_fails_handshake() {
    let fakes = Fakes {
        debugger: fake_gdb(
            "Loading section .text",
            "localhost:1234: Connection timed out.",
        ),
        ..Fakes::default()
    };
    let h = harness_with(fakes, 0, |_| {});
    let mut session = Session::new();

    let outcome = h.engine.invoke(&mut session, Action::DebugWithEmulator).await;

    assert!(matches!(outcome.error(), Some(AppError::Handshake(_))));
    assert!(h.console.contains("Fail to get target. Exit.\n"));
    assert!(!session.connection_refreshed);
    assert!(!session.has_manager());
    assert!(!session.has_connection());
    assert!(!session.is_loading);
}

#[tokio::test]
async fn silent_debugger_fails_handshake_on_timeout() {
    let fakes = Fakes {
        debugger: "trap '' INT\nprintf '(gdb) '\nexec sleep 30\n".into(),
        ..Fakes::default()
    };
    let h = harness_with(fakes, 0, |config| config.timeouts.remote_target_ms = 200);
    let mut session = Session::new();

    let outcome = h.engine.invoke(&mut session, Action::DebugWithEmulator).await;

    assert!(matches!(outcome.error(), Some(AppError::Handshake(_))));
    assert!(h.console.contains("Fail to get target. Exit.\n"));
}

#[tokio::test]
async fn missing_debugger_fails_init() {
    let h = harness_with(Fakes::default(), 0, |config| {
        config.tools.debugger = vec!["/definitely/not/arm-eabi-gdb".into()];
    });
    let mut session = Session::new();

    let outcome = h.engine.invoke(&mut session, Action::DebugWithEmulator).await;

    assert!(matches!(outcome.error(), Some(AppError::Debugger(_))), "unexpected outcome: {outcome:?}");
    assert!(h.console.contains("Debugger has error. Exit.\n"));
    assert!(!h.console.contains("targeting to remote localhost"));
    assert!(!session.has_connection(), "the emulator is reset");
    assert!(eventually(|| !h.table.is_running("arm-eabi-gnatemu")).await);
}

#[tokio::test]
async fn debugger_without_prompt_fails_init() {
    let fakes = Fakes {
        debugger: "exec sleep 30\n".into(),
        ..Fakes::default()
    };
    let h = harness_with(fakes, 0, |config| config.timeouts.debugger_ready_seconds = 1);
    let mut session = Session::new();

    let outcome = h.engine.invoke(&mut session, Action::DebugWithEmulator).await;

    assert!(matches!(outcome.error(), Some(AppError::Debugger(_))), "unexpected outcome: {outcome:?}");
    assert!(h.console.contains("Debugger has error. Exit.\n"));
    assert!(!h.console.contains("targeting to remote localhost"));
    assert!(!session.has_manager());
    assert!(!session.has_connection());
    assert!(!session.is_loading);
}

#[tokio::test]
async fn debug_build_failure_spawns_nothing() {
    let h = harness_with(Fakes::default(), 1, |_| {});
    let mut session = Session::new();

    let outcome = h.engine.invoke(&mut session, Action::DebugWithEmulator).await;

    assert!(matches!(outcome.error(), Some(AppError::Build(_))));
    assert_eq!(h.build.calls(), 1);
    assert!(h.console.contains("Compilation Error.\nExit Emulator.\n"));
    assert!(!h.console.contains("Initialize emulator"));
    assert!(!session.has_manager());
    assert!(!session.has_connection());
    assert!(!session.is_loading);
    assert!(h.table.is_empty(), "no emulator or debugger may be spawned");
}
