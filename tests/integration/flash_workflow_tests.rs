//! Integration tests for the flash-to-board workflow.

use std::path::PathBuf;
use std::sync::Arc;

use board_loader::models::{Action, Session};
use board_loader::process::TaskRegistry;
use board_loader::project::ProjectMetadata;
use board_loader::AppError;

use super::test_helpers::{eventually, harness, harness_with, harness_with_project, Fakes, FLASH_STALLS};

#[tokio::test]
async fn flash_succeeds_when_image_verifies() {
    let h = harness();
    let mut session = Session::new();

    let outcome = h.engine.invoke(&mut session, Action::FlashToBoard).await;

    assert!(outcome.is_success(), "unexpected outcome: {outcome:?}");
    assert!(!session.is_loading);
    assert_eq!(h.build.calls(), 1);
    let console = h.console.contents();
    assert!(console.contains("\nBoard_Loader_STEP: Building Main..."));
    assert!(console.contains("Build Complete!\n"));
    assert!(console.contains("\nBoard_Loader_STEP: Creating binary executable..."));
    assert!(console.contains("\nBoard_Loader_STEP: Connecting to board..."));
    assert!(console.contains("\nRunning on board..."), "console: {console}");
}

#[tokio::test]
async fn unverified_flash_is_killed_and_fails() {
    let fakes = Fakes {
        flash: FLASH_STALLS.into(),
        ..Fakes::default()
    };
    let h = harness_with(fakes, 0, |_| {});
    let mut session = Session::new();

    let outcome = h.engine.invoke(&mut session, Action::FlashToBoard).await;

    assert!(matches!(outcome.error(), Some(AppError::PatternTimeout(_))));
    assert!(!session.is_loading);
    assert!(h.console.contains("Loading Error. Exit.\n"));
    assert!(!h.console.contains("\nRunning on board..."));
    assert!(
        eventually(|| !h.table.is_running("st-flash")).await,
        "stalled st-flash must be killed"
    );
}

#[tokio::test]
async fn build_failure_stops_before_objcopy() {
    let h = harness_with(Fakes::default(), 2, |_| {});
    let mut session = Session::new();

    let outcome = h.engine.invoke(&mut session, Action::FlashToBoard).await;

    assert!(matches!(outcome.error(), Some(AppError::Build(_))));
    assert!(!session.is_loading);
    assert!(h.console.contains("Compilation Error.\nExit.\n"));
    assert!(!h.console.contains("Creating binary executable"));
    assert!(h.table.is_empty());
}

#[tokio::test]
async fn objcopy_failure_stops_before_flashing() {
    let fakes = Fakes {
        objcopy: "echo 'arm-eabi-objcopy: obj/main: No such file' >&2; exit 1\n".into(),
        ..Fakes::default()
    };
    let h = harness_with(fakes, 0, |_| {});
    let mut session = Session::new();

    let outcome = h.engine.invoke(&mut session, Action::FlashToBoard).await;

    assert!(matches!(outcome.error(), Some(AppError::Build(_))));
    assert!(h.console.contains("arm-eabi-objcopy Error. Exit.\n"));
    assert!(!h.console.contains("Connecting to board"));
}

#[tokio::test]
async fn missing_flash_tool_clears_loading() {
    let h = harness_with(Fakes::default(), 0, |config| {
        config.tools.flash = vec!["/definitely/not/st-flash".into()];
    });
    let mut session = Session::new();

    let outcome = h.engine.invoke(&mut session, Action::FlashToBoard).await;

    assert!(matches!(outcome.error(), Some(AppError::Spawn(_))));
    assert!(!session.is_loading);
    assert!(h.console.contains("Fail to connect. Exit.\n"));
}

#[tokio::test]
async fn busy_session_ignores_every_trigger() {
    let h = harness();
    let mut session = Session::new();
    session.is_loading = true;
    session.connection_refreshed = true;

    for action in Action::ALL {
        let outcome = h.engine.invoke(&mut session, action).await;
        assert!(outcome.is_busy(), "{action} should be ignored");
    }

    assert!(session.is_loading, "guard must stay untouched");
    assert!(session.connection_refreshed);
    assert_eq!(h.build.calls(), 0);
    assert!(h.table.is_empty(), "nothing may be spawned");
    assert!(h.console.contents().is_empty());
}

struct SplitLayout;

impl ProjectMetadata for SplitLayout {
    fn primary_executable_path(&self) -> PathBuf {
        PathBuf::from("/src/main")
    }

    fn object_output_directory(&self) -> PathBuf {
        PathBuf::from("/build/objects")
    }

    fn build_switches(&self) -> String {
        "--RTS=ravenscar-sfp-stm32f4".into()
    }
}

#[tokio::test]
async fn executable_is_taken_from_object_directory() {
    let h = harness_with_project(
        Fakes::default(),
        |config| {
            config.tools.objcopy = vec![
                "sh".into(),
                "-c".into(),
                "printf 'objcopy %s %s\\n' \"$0\" \"$1\"".into(),
                "{executable}".into(),
                "{binary}".into(),
            ];
        },
        Arc::new(SplitLayout),
    );
    let mut session = Session::new();

    let outcome = h.engine.invoke(&mut session, Action::FlashToBoard).await;

    assert!(outcome.is_success(), "unexpected outcome: {outcome:?}");
    assert!(
        eventually(|| h.console.contains("objcopy /build/objects/main /build/objects/main.bin\n")).await,
        "console: {}",
        h.console.contents()
    );
}
