#![forbid(unsafe_code)]

//! Board-loading workflow engine.
//!
//! Builds a project and drives `arm-eabi-objcopy`, `st-flash`, `st-util`,
//! `arm-eabi-gnatemu` and `arm-eabi-gdb` through multi-step sequences,
//! keeping board and emulator connections alive between invocations.

pub mod config;
pub mod console;
pub mod debugger;
pub mod errors;
pub mod host;
pub mod models;
pub mod orchestrator;
pub mod process;
pub mod project;
pub mod protocol;

pub use config::LoaderConfig;
pub use errors::{AppError, Result};
