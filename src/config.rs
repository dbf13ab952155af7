//! Loader configuration parsing and validation.
//!
//! Every field has a default, so an empty `board-loader.toml` describes the
//! stock STM32F4 tool chain: `gprbuild`, `arm-eabi-objcopy`, `st-flash`,
//! `st-util`, `arm-eabi-gnatemu` and `arm-eabi-gdb`.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::{AppError, Result};

fn default_board() -> String {
    "stm32f4".into()
}

fn default_emulator_board() -> String {
    "STM32F4".into()
}

fn default_flash_address() -> String {
    "0x8000000".into()
}

fn default_emulator_port() -> u16 {
    1234
}

fn default_board_server_port() -> u16 {
    4242
}

fn argv(parts: &[&str]) -> Vec<String> {
    parts.iter().map(|&part| part.to_owned()).collect()
}

/// Project layout and build settings.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct ProjectConfig {
    /// Project root; every tool runs with this working directory.
    #[serde(default = "default_root")]
    pub root: PathBuf,
    /// Object directory, relative to `root` unless absolute.
    #[serde(default = "default_object_dir")]
    pub object_dir: PathBuf,
    /// File name of the primary executable inside `object_dir`.
    #[serde(default = "default_main_executable")]
    pub main_executable: String,
    /// Builder switches; the workflows apply only when they name the board.
    #[serde(default = "default_switches")]
    pub switches: String,
    /// Command running the project's default build target.
    #[serde(default = "default_build_command")]
    pub build: Vec<String>,
}

fn default_root() -> PathBuf {
    PathBuf::from(".")
}

fn default_object_dir() -> PathBuf {
    PathBuf::from("obj")
}

fn default_main_executable() -> String {
    "main".into()
}

fn default_switches() -> String {
    "--RTS=ravenscar-sfp-stm32f4".into()
}

fn default_build_command() -> Vec<String> {
    argv(&["gprbuild", "-P", "default.gpr"])
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            root: default_root(),
            object_dir: default_object_dir(),
            main_executable: default_main_executable(),
            switches: default_switches(),
            build: default_build_command(),
        }
    }
}

/// Argument-vector templates for each external tool.
///
/// Templates may reference `{executable}`, `{binary}`, `{address}`,
/// `{board}` and `{port}`; see [`CommandVars::render`].
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct ToolsConfig {
    /// Converts the executable object into a raw binary image.
    #[serde(default = "default_objcopy")]
    pub objcopy: Vec<String>,
    /// Writes the binary image to the board's flash.
    #[serde(default = "default_flash")]
    pub flash: Vec<String>,
    /// GDB server bridging the debugger to the board over ST-LINK.
    #[serde(default = "default_board_server")]
    pub board_server: Vec<String>,
    /// Emulator in plain run mode.
    #[serde(default = "default_emulator")]
    pub emulator: Vec<String>,
    /// Emulator waiting for a remote debugger.
    #[serde(default = "default_emulator_debug")]
    pub emulator_debug: Vec<String>,
    /// Cross debugger.
    #[serde(default = "default_debugger")]
    pub debugger: Vec<String>,
}

fn default_objcopy() -> Vec<String> {
    argv(&["arm-eabi-objcopy", "-O", "binary", "{executable}", "{binary}"])
}

fn default_flash() -> Vec<String> {
    argv(&["st-flash", "write", "{binary}", "{address}"])
}

fn default_board_server() -> Vec<String> {
    argv(&["st-util"])
}

fn default_emulator() -> Vec<String> {
    argv(&["arm-eabi-gnatemu", "--board={board}", "{executable}"])
}

fn default_emulator_debug() -> Vec<String> {
    argv(&["arm-eabi-gnatemu", "-g", "--board={board}", "{executable}"])
}

fn default_debugger() -> Vec<String> {
    argv(&["arm-eabi-gdb", "-q", "-nx", "{executable}"])
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            objcopy: default_objcopy(),
            flash: default_flash(),
            board_server: default_board_server(),
            emulator: default_emulator(),
            emulator_debug: default_emulator_debug(),
            debugger: default_debugger(),
        }
    }
}

/// Step timeouts.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct TimeoutConfig {
    /// Bound for the flashing tool to start verification.
    #[serde(default = "default_flash_verify_start_ms")]
    pub flash_verify_start_ms: u64,
    /// Bound for the verified banner once verification started.
    #[serde(default = "default_flash_verified_ms")]
    pub flash_verified_ms: u64,
    /// Bound for the board server to report the device.
    #[serde(default = "default_board_connected_ms")]
    pub board_connected_ms: u64,
    /// Bound for the board server to start listening once connected.
    #[serde(default = "default_board_listening_ms")]
    pub board_listening_ms: u64,
    /// Bound for the `target remote` handshake.
    #[serde(default = "default_remote_target_ms")]
    pub remote_target_ms: u64,
    /// Bound for an interrupted debugger to print its prompt.
    #[serde(default = "default_debugger_interrupt_ms")]
    pub debugger_interrupt_ms: u64,
    /// Bound for the debugger to become idle; 0 means no bound.
    #[serde(default)]
    pub debugger_ready_seconds: u64,
}

fn default_flash_verify_start_ms() -> u64 {
    15_000
}

fn default_flash_verified_ms() -> u64 {
    500
}

fn default_board_connected_ms() -> u64 {
    2_000
}

fn default_board_listening_ms() -> u64 {
    500
}

fn default_remote_target_ms() -> u64 {
    4_000
}

fn default_debugger_interrupt_ms() -> u64 {
    2_000
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            flash_verify_start_ms: default_flash_verify_start_ms(),
            flash_verified_ms: default_flash_verified_ms(),
            board_connected_ms: default_board_connected_ms(),
            board_listening_ms: default_board_listening_ms(),
            remote_target_ms: default_remote_target_ms(),
            debugger_interrupt_ms: default_debugger_interrupt_ms(),
            debugger_ready_seconds: 0,
        }
    }
}

impl TimeoutConfig {
    /// Bound on the first flashing banner.
    #[must_use]
    pub fn flash_verify_start(&self) -> Duration {
        Duration::from_millis(self.flash_verify_start_ms)
    }

    /// Bound on the second flashing banner.
    #[must_use]
    pub fn flash_verified(&self) -> Duration {
        Duration::from_millis(self.flash_verified_ms)
    }

    /// Bound on the board server's device banner.
    #[must_use]
    pub fn board_connected(&self) -> Duration {
        Duration::from_millis(self.board_connected_ms)
    }

    /// Bound on the board server's listening banner.
    #[must_use]
    pub fn board_listening(&self) -> Duration {
        Duration::from_millis(self.board_listening_ms)
    }

    /// Bound on the `target remote` reply.
    #[must_use]
    pub fn remote_target(&self) -> Duration {
        Duration::from_millis(self.remote_target_ms)
    }

    /// Bound on the prompt following an interrupt.
    #[must_use]
    pub fn debugger_interrupt(&self) -> Duration {
        Duration::from_millis(self.debugger_interrupt_ms)
    }

    /// Bound on debugger idle waits, `None` when unbounded.
    #[must_use]
    pub fn debugger_ready(&self) -> Option<Duration> {
        (self.debugger_ready_seconds > 0).then(|| Duration::from_secs(self.debugger_ready_seconds))
    }
}

/// Debugger prompt protocol settings.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct DebuggerConfig {
    /// Marker the debugger prints when it is ready for a command.
    #[serde(default = "default_prompt")]
    pub prompt: String,
    /// Substring identifying a failed command in a reply.
    #[serde(default = "default_error_marker")]
    pub error_marker: String,
}

fn default_prompt() -> String {
    crate::protocol::DEBUGGER_PROMPT.into()
}

fn default_error_marker() -> String {
    crate::protocol::DEBUGGER_ERROR_MARKER.into()
}

impl Default for DebuggerConfig {
    fn default() -> Self {
        Self {
            prompt: default_prompt(),
            error_marker: default_error_marker(),
        }
    }
}

/// Loader configuration parsed from `board-loader.toml`.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct LoaderConfig {
    /// Board identifier looked for in the project's builder switches.
    #[serde(default = "default_board")]
    pub board: String,
    /// Board profile handed to the emulator.
    #[serde(default = "default_emulator_board")]
    pub emulator_board: String,
    /// Flash base address the image is written to.
    #[serde(default = "default_flash_address")]
    pub flash_address: String,
    /// Remote-debug port the emulator listens on.
    #[serde(default = "default_emulator_port")]
    pub emulator_port: u16,
    /// Port the board GDB server listens on.
    #[serde(default = "default_board_server_port")]
    pub board_server_port: u16,
    /// Project layout and build command.
    #[serde(default)]
    pub project: ProjectConfig,
    /// External tool command templates.
    #[serde(default)]
    pub tools: ToolsConfig,
    /// Step timeouts.
    #[serde(default)]
    pub timeouts: TimeoutConfig,
    /// Debugger prompt protocol.
    #[serde(default)]
    pub debugger: DebuggerConfig,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            board: default_board(),
            emulator_board: default_emulator_board(),
            flash_address: default_flash_address(),
            emulator_port: default_emulator_port(),
            board_server_port: default_board_server_port(),
            project: ProjectConfig::default(),
            tools: ToolsConfig::default(),
            timeouts: TimeoutConfig::default(),
            debugger: DebuggerConfig::default(),
        }
    }
}

impl LoaderConfig {
    /// Load and validate configuration from a TOML file path.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if the file cannot be read or contains
    /// invalid TOML, or if validation fails.
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .map_err(|err| AppError::Config(format!("failed to read config: {err}")))?;
        Self::from_toml_str(&raw)
    }

    /// Parse configuration from a TOML string and normalize paths.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if parsing or validation fails.
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let mut config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Absolute path of the primary executable object.
    #[must_use]
    pub fn executable_path(&self) -> PathBuf {
        self.object_dir().join(&self.project.main_executable)
    }

    /// Object directory resolved against the project root.
    #[must_use]
    pub fn object_dir(&self) -> PathBuf {
        self.project.root.join(&self.project.object_dir)
    }

    /// Validate ports, commands, and the project root.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` describing the first invalid field.
    pub fn validate(&mut self) -> Result<()> {
        if self.board.trim().is_empty() {
            return Err(AppError::Config("board must not be empty".into()));
        }

        if self.emulator_port == 0 || self.board_server_port == 0 {
            return Err(AppError::Config("ports must be greater than zero".into()));
        }

        if self.debugger.prompt.is_empty() {
            return Err(AppError::Config("debugger.prompt must not be empty".into()));
        }

        let commands = [
            ("project.build", &self.project.build),
            ("tools.objcopy", &self.tools.objcopy),
            ("tools.flash", &self.tools.flash),
            ("tools.board_server", &self.tools.board_server),
            ("tools.emulator", &self.tools.emulator),
            ("tools.emulator_debug", &self.tools.emulator_debug),
            ("tools.debugger", &self.tools.debugger),
        ];
        for (name, command) in commands {
            if command.first().map_or(true, |program| program.trim().is_empty()) {
                return Err(AppError::Config(format!("{name} must name a program")));
            }
        }

        let canonical_root = self
            .project
            .root
            .canonicalize()
            .map_err(|err| AppError::Config(format!("project.root invalid: {err}")))?;
        self.project.root = canonical_root;

        Ok(())
    }

    /// Placeholder values for the command templates built around
    /// `executable`.
    #[must_use]
    pub fn command_vars(&self, executable: &Path) -> CommandVars {
        let mut binary = executable.as_os_str().to_owned();
        binary.push(".bin");
        CommandVars {
            executable: executable.to_string_lossy().into_owned(),
            binary: PathBuf::from(binary).to_string_lossy().into_owned(),
            address: self.flash_address.clone(),
            board: self.emulator_board.clone(),
            port: self.emulator_port,
        }
    }
}

/// Values substituted into tool command templates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandVars {
    /// Path of the primary executable object.
    pub executable: String,
    /// Path of the raw binary image (`<executable>.bin`).
    pub binary: String,
    /// Flash base address.
    pub address: String,
    /// Emulator board profile.
    pub board: String,
    /// Emulator remote-debug port.
    pub port: u16,
}

impl CommandVars {
    /// Expand `{executable}`, `{binary}`, `{address}`, `{board}` and
    /// `{port}` in every argument of `template`.
    #[must_use]
    pub fn render(&self, template: &[String]) -> Vec<String> {
        let port = self.port.to_string();
        template
            .iter()
            .map(|arg| {
                arg.replace("{executable}", &self.executable)
                    .replace("{binary}", &self.binary)
                    .replace("{address}", &self.address)
                    .replace("{board}", &self.board)
                    .replace("{port}", &port)
            })
            .collect()
    }
}
