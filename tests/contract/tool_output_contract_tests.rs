//! Contract tests pinning the strings exchanged with the external tools.
//!
//! `st-flash`, `st-util` and `arm-eabi-gdb` are matched on their literal
//! output; these values must not drift.

use board_loader::protocol;

#[test]
fn flash_banners() {
    assert_eq!(protocol::FLASH_VERIFY_STARTED, "Starting verification of write complete");
    assert_eq!(protocol::FLASH_VERIFIED, "Flash written and verified! jolly good!");
}

#[test]
fn board_server_banners() {
    assert_eq!(protocol::BOARD_DEVICE_CONNECTED, "Device connected is");
    assert_eq!(protocol::BOARD_LISTENING, "Listening at");
}

#[test]
fn debugger_prompt_protocol() {
    assert_eq!(protocol::DEBUGGER_PROMPT, "(gdb) ");
    assert_eq!(protocol::DEBUGGER_ERROR_MARKER, "Error");
    assert_eq!(protocol::DEBUGGER_CONTINUE, "c");
    assert_eq!(protocol::DEBUGGER_QUIT, "q");
}

#[test]
fn debugger_commands() {
    assert_eq!(protocol::target_remote_command(1234), "target remote localhost:1234");
    assert_eq!(
        protocol::target_remote_confirmation(1234),
        "Remote debugging using localhost:1234"
    );
    assert_eq!(
        protocol::target_extended_remote_command(4242),
        "target extended-remote localhost:4242"
    );
    assert_eq!(protocol::load_command("/work/obj/main"), "load /work/obj/main");
}

#[test]
fn task_names() {
    assert_eq!(protocol::FLASH_TASK, "st-flash");
    assert_eq!(protocol::BOARD_SERVER_TASK, "st-util");
    assert_eq!(protocol::EMULATOR_TASK, "arm-eabi-gnatemu");
    assert_eq!(protocol::DEBUGGER_TASK, "arm-eabi-gdb");
    assert_eq!(protocol::OBJCOPY_TASK, "arm-eabi-objcopy");
}
