//! Unit tests for `Action` identifiers and parsing.

use board_loader::models::Action;
use board_loader::AppError;

#[test]
fn ids_match_toolbar_buttons() {
    let ids: Vec<&str> = Action::ALL.iter().map(|action| action.id()).collect();
    assert_eq!(
        ids,
        ["flash-to-board", "load-on-board", "run-with-emulator", "debug-with-emulator"]
    );
}

#[test]
fn display_round_trips_through_from_str() {
    for action in Action::ALL {
        let parsed: Action = action.to_string().parse().expect("parse id");
        assert_eq!(parsed, action);
    }
}

#[test]
fn short_aliases_parse() {
    assert_eq!("flash".parse::<Action>().ok(), Some(Action::FlashToBoard));
    assert_eq!("load".parse::<Action>().ok(), Some(Action::LoadOnBoard));
    assert_eq!("run".parse::<Action>().ok(), Some(Action::RunWithEmulator));
    assert_eq!("debug".parse::<Action>().ok(), Some(Action::DebugWithEmulator));
}

#[test]
fn unknown_action_is_rejected() {
    let err = "erase".parse::<Action>().unwrap_err();
    assert!(matches!(err, AppError::Config(_)));
    assert!(err.to_string().contains("erase"));
}

#[test]
fn task_interest_names_the_long_running_tool() {
    assert_eq!(Action::FlashToBoard.task_interest(), "st-flash");
    assert_eq!(Action::LoadOnBoard.task_interest(), "st-util");
    assert_eq!(Action::RunWithEmulator.task_interest(), "arm-eabi-gnatemu");
    assert_eq!(Action::DebugWithEmulator.task_interest(), "arm-eabi-gnatemu");
}

#[test]
fn labels_are_human_readable() {
    assert_eq!(Action::LoadOnBoard.label(), "Load On Board");
    assert_eq!(Action::DebugWithEmulator.label(), "Debug With Emulator");
}

#[test]
fn serializes_as_kebab_case() {
    let json = serde_json::to_string(&Action::RunWithEmulator).expect("serialize");
    assert_eq!(json, "\"run-with-emulator\"");
}
