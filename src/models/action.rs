//! Workflow actions the host can trigger.

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::protocol::{BOARD_SERVER_TASK, EMULATOR_TASK, FLASH_TASK};
use crate::AppError;

/// One of the four board-loading workflows.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum Action {
    /// Build, convert to a raw binary and write it to the board's flash.
    FlashToBoard,
    /// Build, connect to the board and load through the debugger.
    LoadOnBoard,
    /// Build and run in the emulator.
    RunWithEmulator,
    /// Build, run in the emulator and attach the debugger.
    DebugWithEmulator,
}

impl Action {
    /// Every action, in toolbar order.
    pub const ALL: [Self; 4] = [
        Self::FlashToBoard,
        Self::LoadOnBoard,
        Self::RunWithEmulator,
        Self::DebugWithEmulator,
    ];

    /// Stable identifier, e.g. `flash-to-board`.
    #[must_use]
    pub fn id(self) -> &'static str {
        match self {
            Self::FlashToBoard => "flash-to-board",
            Self::LoadOnBoard => "load-on-board",
            Self::RunWithEmulator => "run-with-emulator",
            Self::DebugWithEmulator => "debug-with-emulator",
        }
    }

    /// Human-readable label, e.g. `Flash To Board`.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::FlashToBoard => "Flash To Board",
            Self::LoadOnBoard => "Load On Board",
            Self::RunWithEmulator => "Run With Emulator",
            Self::DebugWithEmulator => "Debug With Emulator",
        }
    }

    /// Name of the background tool a reset of this action interrupts.
    #[must_use]
    pub fn task_interest(self) -> &'static str {
        match self {
            Self::FlashToBoard => FLASH_TASK,
            Self::LoadOnBoard => BOARD_SERVER_TASK,
            Self::RunWithEmulator | Self::DebugWithEmulator => EMULATOR_TASK,
        }
    }
}

impl Display for Action {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for Action {
    type Err = AppError;

    /// Parse an identifier (`load-on-board`) or its short alias (`load`).
    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "flash-to-board" | "flash" => Ok(Self::FlashToBoard),
            "load-on-board" | "load" => Ok(Self::LoadOnBoard),
            "run-with-emulator" | "run" => Ok(Self::RunWithEmulator),
            "debug-with-emulator" | "debug" => Ok(Self::DebugWithEmulator),
            other => Err(AppError::Config(format!("unknown action: {other}"))),
        }
    }
}
