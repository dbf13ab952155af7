//! Error types shared across the board loader.

use std::fmt::{Display, Formatter};

/// Shared application result type.
pub type Result<T> = std::result::Result<T, AppError>;

/// Application error enumeration covering every workflow failure mode.
#[derive(Debug)]
pub enum AppError {
    /// Configuration parsing or validation failure.
    Config(String),
    /// A tool executable could not be launched.
    Spawn(String),
    /// The build (or binary conversion) exited with a non-zero code.
    Build(String),
    /// Expected tool output was not observed within its bound.
    PatternTimeout(String),
    /// The remote-target confirmation was absent from the debugger reply.
    Handshake(String),
    /// The board connection task is no longer running.
    Disconnected(String),
    /// The debugger reported an error, exited, or never became idle.
    Debugger(String),
    /// A bounded wait elapsed.
    Timeout(String),
    /// File-system or pipe I/O failure.
    Io(String),
}

impl Display for AppError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config(msg) => write!(f, "config: {msg}"),
            Self::Spawn(msg) => write!(f, "spawn: {msg}"),
            Self::Build(msg) => write!(f, "build: {msg}"),
            Self::PatternTimeout(msg) => write!(f, "pattern timeout: {msg}"),
            Self::Handshake(msg) => write!(f, "handshake: {msg}"),
            Self::Disconnected(msg) => write!(f, "disconnected: {msg}"),
            Self::Debugger(msg) => write!(f, "debugger: {msg}"),
            Self::Timeout(msg) => write!(f, "timeout: {msg}"),
            Self::Io(msg) => write!(f, "io: {msg}"),
        }
    }
}

impl std::error::Error for AppError {}

impl From<toml::de::Error> for AppError {
    fn from(err: toml::de::Error) -> Self {
        Self::Config(format!("invalid config: {err}"))
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}
