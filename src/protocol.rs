//! Fixed output and command contracts of the external tools.
//!
//! These strings are matched byte-for-byte against tool output; changing
//! them breaks compatibility with stock `st-flash`, `st-util`,
//! `arm-eabi-gnatemu` and `arm-eabi-gdb`.

/// `st-flash` banner printed once the write finished and verification began.
pub const FLASH_VERIFY_STARTED: &str = "Starting verification of write complete";

/// `st-flash` banner printed when the written image verified.
pub const FLASH_VERIFIED: &str = "Flash written and verified! jolly good!";

/// `st-util` banner printed once the ST-LINK reports a target device.
pub const BOARD_DEVICE_CONNECTED: &str = "Device connected is";

/// `st-util` banner printed once the GDB server accepts connections.
pub const BOARD_LISTENING: &str = "Listening at";

/// Debugger console prompt.
pub const DEBUGGER_PROMPT: &str = "(gdb) ";

/// Substring of a debugger reply that marks a failed command.
pub const DEBUGGER_ERROR_MARKER: &str = "Error";

/// Debugger command resuming the target.
pub const DEBUGGER_CONTINUE: &str = "c";

/// Debugger command quitting the debugger.
pub const DEBUGGER_QUIT: &str = "q";

/// Command attaching the debugger to the emulator's remote stub.
#[must_use]
pub fn target_remote_command(port: u16) -> String {
    format!("target remote localhost:{port}")
}

/// Reply confirming [`target_remote_command`] succeeded.
#[must_use]
pub fn target_remote_confirmation(port: u16) -> String {
    format!("Remote debugging using localhost:{port}")
}

/// Command attaching the debugger to the board GDB server.
#[must_use]
pub fn target_extended_remote_command(port: u16) -> String {
    format!("target extended-remote localhost:{port}")
}

/// Command loading `object` into the target.
#[must_use]
pub fn load_command(object: &str) -> String {
    format!("load {object}")
}

/// Task name of the project build.
pub const BUILD_TASK: &str = "build";

/// Task name of the binary converter.
pub const OBJCOPY_TASK: &str = "arm-eabi-objcopy";

/// Task name of the flashing tool.
pub const FLASH_TASK: &str = "st-flash";

/// Task name of the board GDB server.
pub const BOARD_SERVER_TASK: &str = "st-util";

/// Task name of the emulator.
pub const EMULATOR_TASK: &str = "arm-eabi-gnatemu";

/// Task name of the cross debugger.
pub const DEBUGGER_TASK: &str = "arm-eabi-gdb";
