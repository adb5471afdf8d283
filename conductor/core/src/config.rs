//! Configuration
//!
//! Settings are read once at startup and never change afterwards.
//!
//! # Configuration Priority
//!
//! Values are resolved with the following priority (highest first):
//! 1. Environment variables
//! 2. TOML configuration file
//! 3. Default values
//!
//! The file lives at `$XDG_CONFIG_HOME/neurallink/config.toml` unless
//! `NEURALLINK_CONFIG` points somewhere else. A missing file is not an error.
//!
//! # Example Configuration
//!
//! ```toml
//! [ui]
//! fps = 20
//! max_history = 50
//! max_input = 10000
//! recovery_secs = 5
//! escape_timeout_ms = 20
//! stream_text = true
//! boot_sequence = true
//!
//! [backend]
//! kind = "ollama"            # or "echo"
//! url = "http://localhost:11434/api/chat"
//! model = "gptoss-agent"
//! timeout_secs = 30
//!
//! [speaker]
//! kind = "command"           # or "simulated"
//! device = "Kontor"
//! command = "catt -d {device} cast {url}"
//! language = "sv"
//!
//! [logging]
//! level = "info"
//! file = "core.log"
//! backup_count = 5
//! ```

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::animation::{DEFAULT_TICK_RATE, MAX_TICK_RATE};
use crate::backend::{DEFAULT_OLLAMA_MODEL, DEFAULT_OLLAMA_URL, DEFAULT_SYSTEM_PROMPT};
use crate::input::{DEFAULT_ESCAPE_TIMEOUT, DEFAULT_INPUT_CAPACITY};
use crate::playback::{DEFAULT_SPEAKER_COMMAND, DEFAULT_SPEAKER_DEVICE, DEFAULT_TTS_LANGUAGE};
use crate::session::DEFAULT_MAX_HISTORY;
use crate::state::DEFAULT_RECOVERY_DELAY;

/// Environment variable overriding the config file location
pub const CONFIG_PATH_ENV: &str = "NEURALLINK_CONFIG";

// =============================================================================
// Error Types
// =============================================================================

/// Errors that can occur when loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read config file
    #[error("Failed to read config file at {path}: {source}")]
    ReadError {
        /// The path that was attempted
        path: PathBuf,
        /// The underlying IO error
        source: std::io::Error,
    },

    /// Failed to parse TOML
    #[error("Failed to parse TOML config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Invalid configuration value
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

// =============================================================================
// Configuration Source Tracking
// =============================================================================

/// Where the effective configuration came from (highest layer that applied)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfigSource {
    /// Value from environment variable
    Env,
    /// Value from TOML configuration file
    File,
    /// Default value
    Default,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Env => write!(f, "environment"),
            Self::File => write!(f, "config file"),
            Self::Default => write!(f, "default"),
        }
    }
}

// =============================================================================
// Effective Settings
// =============================================================================

/// Which model backend to talk to
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Local Ollama server
    Ollama,
    /// Offline echo replies
    Echo,
}

impl FromStr for BackendKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "ollama" => Ok(Self::Ollama),
            "echo" | "offline" => Ok(Self::Echo),
            other => Err(ConfigError::ValidationError(format!(
                "unknown backend kind `{other}` (expected `ollama` or `echo`)"
            ))),
        }
    }
}

/// Which playback device to use
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpeakerKind {
    /// External player command
    Command,
    /// Offline simulated playback
    Simulated,
}

impl FromStr for SpeakerKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "command" => Ok(Self::Command),
            "simulated" | "offline" => Ok(Self::Simulated),
            other => Err(ConfigError::ValidationError(format!(
                "unknown speaker kind `{other}` (expected `command` or `simulated`)"
            ))),
        }
    }
}

/// Loop and display settings
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UiSettings {
    /// Ticks per second
    pub tick_rate: u32,
    /// History entries kept
    pub max_history: usize,
    /// Characters accepted in the input line
    pub max_input: usize,
    /// Dwell time in `Failed`
    pub recovery_delay: Duration,
    /// Hold time for partial escape sequences
    pub escape_timeout: Duration,
    /// Typewriter reveal of replies
    pub stream_text: bool,
    /// Play the boot intro before the first prompt
    pub boot_sequence: bool,
}

impl Default for UiSettings {
    fn default() -> Self {
        Self {
            tick_rate: DEFAULT_TICK_RATE,
            max_history: DEFAULT_MAX_HISTORY,
            max_input: DEFAULT_INPUT_CAPACITY,
            recovery_delay: DEFAULT_RECOVERY_DELAY,
            escape_timeout: DEFAULT_ESCAPE_TIMEOUT,
            stream_text: true,
            boot_sequence: true,
        }
    }
}

/// Model backend settings
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BackendSettings {
    /// Backend implementation
    pub kind: BackendKind,
    /// Chat endpoint
    pub url: String,
    /// Model name
    pub model: String,
    /// System message
    pub system_prompt: String,
    /// HTTP request timeout
    pub timeout: Duration,
}

impl Default for BackendSettings {
    fn default() -> Self {
        Self {
            kind: BackendKind::Ollama,
            url: DEFAULT_OLLAMA_URL.to_string(),
            model: DEFAULT_OLLAMA_MODEL.to_string(),
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

/// Playback settings
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SpeakerSettings {
    /// Playback implementation
    pub kind: SpeakerKind,
    /// Speaker name
    pub device: String,
    /// Player command template
    pub command: String,
    /// TTS language code
    pub language: String,
}

impl Default for SpeakerSettings {
    fn default() -> Self {
        Self {
            kind: SpeakerKind::Command,
            device: DEFAULT_SPEAKER_DEVICE.to_string(),
            command: DEFAULT_SPEAKER_COMMAND.to_string(),
            language: DEFAULT_TTS_LANGUAGE.to_string(),
        }
    }
}

/// Log output settings
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LogSettings {
    /// Default filter directive (`RUST_LOG` wins when set)
    pub level: String,
    /// Log file path
    pub file: PathBuf,
    /// Rotated files kept
    pub backup_count: usize,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: PathBuf::from("core.log"),
            backup_count: 5,
        }
    }
}

/// Complete, validated application configuration
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AppConfig {
    /// Loop and display
    pub ui: UiSettings,
    /// Model backend
    pub backend: BackendSettings,
    /// Playback
    pub speaker: SpeakerSettings,
    /// Logging
    pub logging: LogSettings,
    source: ConfigSource,
    config_file_path: Option<PathBuf>,
    warnings: Vec<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            ui: UiSettings::default(),
            backend: BackendSettings::default(),
            speaker: SpeakerSettings::default(),
            logging: LogSettings::default(),
            source: ConfigSource::Default,
            config_file_path: None,
            warnings: Vec::new(),
        }
    }
}

impl AppConfig {
    /// Highest layer that contributed a value
    #[must_use]
    pub fn source(&self) -> ConfigSource {
        self.source
    }

    /// File the configuration was read from, if any
    #[must_use]
    pub fn config_file_path(&self) -> Option<&PathBuf> {
        self.config_file_path.as_ref()
    }

    /// Ignored values found while loading (logged once logging is up)
    #[must_use]
    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=MAX_TICK_RATE).contains(&self.ui.tick_rate) {
            return Err(ConfigError::ValidationError(format!(
                "fps must be between 1 and {MAX_TICK_RATE}, got {}",
                self.ui.tick_rate
            )));
        }
        if self.ui.max_history == 0 {
            return Err(ConfigError::ValidationError("max_history must be at least 1".into()));
        }
        if self.ui.max_input == 0 {
            return Err(ConfigError::ValidationError("max_input must be at least 1".into()));
        }
        if self.speaker.kind == SpeakerKind::Command && self.speaker.command.trim().is_empty() {
            return Err(ConfigError::ValidationError("speaker command is empty".into()));
        }
        Ok(())
    }
}

// =============================================================================
// TOML Configuration Structures
// =============================================================================

/// `[ui]` section
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct UiToml {
    /// Ticks per second
    pub fps: Option<u32>,
    /// History entries kept
    pub max_history: Option<usize>,
    /// Characters accepted in the input line
    pub max_input: Option<usize>,
    /// Dwell time in `Failed`, seconds
    pub recovery_secs: Option<u64>,
    /// Hold time for partial escape sequences, milliseconds
    pub escape_timeout_ms: Option<u64>,
    /// Typewriter reveal
    pub stream_text: Option<bool>,
    /// Boot intro
    pub boot_sequence: Option<bool>,
}

/// `[backend]` section
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendToml {
    /// `ollama` or `echo`
    pub kind: Option<String>,
    /// Chat endpoint
    pub url: Option<String>,
    /// Model name
    pub model: Option<String>,
    /// System message
    pub system_prompt: Option<String>,
    /// Request timeout, seconds
    pub timeout_secs: Option<u64>,
}

/// `[speaker]` section
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeakerToml {
    /// `command` or `simulated`
    pub kind: Option<String>,
    /// Speaker name
    pub device: Option<String>,
    /// Player command template
    pub command: Option<String>,
    /// TTS language code
    pub language: Option<String>,
}

/// `[logging]` section
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingToml {
    /// Filter directive
    pub level: Option<String>,
    /// Log file path
    pub file: Option<PathBuf>,
    /// Rotated files kept
    pub backup_count: Option<usize>,
}

/// Whole configuration file
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppToml {
    /// `[ui]`
    pub ui: UiToml,
    /// `[backend]`
    pub backend: BackendToml,
    /// `[speaker]`
    pub speaker: SpeakerToml,
    /// `[logging]`
    pub logging: LoggingToml,
}

// =============================================================================
// Loading
// =============================================================================

/// Default config file location
#[must_use]
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("neurallink").join("config.toml"))
}

/// Load configuration from all sources with proper priority
///
/// # Errors
///
/// Returns an error if the config file exists but cannot be read or parsed,
/// or if the resulting values fail validation.
pub fn load_config() -> Result<AppConfig, ConfigError> {
    let path = std::env::var(CONFIG_PATH_ENV)
        .ok()
        .map(PathBuf::from)
        .or_else(default_config_path);
    load_config_from_path(path)
}

/// Load configuration from a specific file path (plus the process environment)
///
/// # Errors
///
/// See [`load_config`].
pub fn load_config_from_path(path: Option<PathBuf>) -> Result<AppConfig, ConfigError> {
    load_config_with(path, |key| std::env::var(key).ok())
}

/// Load configuration with an explicit environment lookup
///
/// # Errors
///
/// See [`load_config`].
pub fn load_config_with<F>(path: Option<PathBuf>, env: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = AppConfig::default();

    if let Some(ref config_path) = path {
        if config_path.exists() {
            let toml_content =
                std::fs::read_to_string(config_path).map_err(|e| ConfigError::ReadError {
                    path: config_path.clone(),
                    source: e,
                })?;

            let toml_config: AppToml = toml::from_str(&toml_content)?;
            apply_toml_config(&mut config, &toml_config)?;
            config.config_file_path = Some(config_path.clone());
            config.source = ConfigSource::File;

            tracing::info!(path = %config_path.display(), "Loaded configuration from file");
        } else {
            tracing::debug!(path = %config_path.display(), "Config file not found, using defaults");
        }
    }

    apply_env_config(&mut config, &env);
    config.validate()?;
    Ok(config)
}

/// Apply TOML configuration values to the config struct
fn apply_toml_config(config: &mut AppConfig, toml: &AppToml) -> Result<(), ConfigError> {
    let ui = &toml.ui;
    if let Some(fps) = ui.fps {
        config.ui.tick_rate = fps;
    }
    if let Some(n) = ui.max_history {
        config.ui.max_history = n;
    }
    if let Some(n) = ui.max_input {
        config.ui.max_input = n;
    }
    if let Some(secs) = ui.recovery_secs {
        config.ui.recovery_delay = Duration::from_secs(secs);
    }
    if let Some(ms) = ui.escape_timeout_ms {
        config.ui.escape_timeout = Duration::from_millis(ms);
    }
    if let Some(stream) = ui.stream_text {
        config.ui.stream_text = stream;
    }
    if let Some(boot) = ui.boot_sequence {
        config.ui.boot_sequence = boot;
    }

    let backend = &toml.backend;
    if let Some(kind) = &backend.kind {
        config.backend.kind = kind.parse()?;
    }
    if let Some(url) = &backend.url {
        config.backend.url.clone_from(url);
    }
    if let Some(model) = &backend.model {
        config.backend.model.clone_from(model);
    }
    if let Some(prompt) = &backend.system_prompt {
        config.backend.system_prompt.clone_from(prompt);
    }
    if let Some(secs) = backend.timeout_secs {
        config.backend.timeout = Duration::from_secs(secs);
    }

    let speaker = &toml.speaker;
    if let Some(kind) = &speaker.kind {
        config.speaker.kind = kind.parse()?;
    }
    if let Some(device) = &speaker.device {
        config.speaker.device.clone_from(device);
    }
    if let Some(command) = &speaker.command {
        config.speaker.command.clone_from(command);
    }
    if let Some(language) = &speaker.language {
        config.speaker.language.clone_from(language);
    }

    let logging = &toml.logging;
    if let Some(level) = &logging.level {
        config.logging.level = level.to_lowercase();
    }
    if let Some(file) = &logging.file {
        config.logging.file.clone_from(file);
    }
    if let Some(n) = logging.backup_count {
        config.logging.backup_count = n;
    }
    Ok(())
}

/// Reads typed values out of the environment, recording bad ones
struct EnvReader<'a, F> {
    env: &'a F,
    config: &'a mut AppConfig,
}

impl<F: Fn(&str) -> Option<String>> EnvReader<'_, F> {
    fn string(&mut self, key: &str) -> Option<String> {
        let value = (self.env)(key)?;
        self.config.source = ConfigSource::Env;
        Some(value)
    }

    fn parsed<T: FromStr>(&mut self, key: &str) -> Option<T> {
        let raw = (self.env)(key)?;
        match raw.trim().parse() {
            Ok(value) => {
                self.config.source = ConfigSource::Env;
                Some(value)
            }
            Err(_) => {
                self.config
                    .warnings
                    .push(format!("ignoring {key}={raw:?}: not a valid value"));
                None
            }
        }
    }

    fn flag(&mut self, key: &str) -> Option<bool> {
        let raw = (self.env)(key)?;
        let value = match raw.trim().to_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => true,
            "0" | "false" | "no" | "off" => false,
            _ => {
                self.config
                    .warnings
                    .push(format!("ignoring {key}={raw:?}: expected true or false"));
                return None;
            }
        };
        self.config.source = ConfigSource::Env;
        Some(value)
    }

    fn kind<T: FromStr<Err = ConfigError>>(&mut self, key: &str) -> Option<T> {
        let raw = (self.env)(key)?;
        match raw.parse() {
            Ok(value) => {
                self.config.source = ConfigSource::Env;
                Some(value)
            }
            Err(e) => {
                self.config.warnings.push(format!("ignoring {key}: {e}"));
                None
            }
        }
    }
}

/// Apply environment variables (overrides file values)
fn apply_env_config<F: Fn(&str) -> Option<String>>(config: &mut AppConfig, env: &F) {
    let mut r = EnvReader { env, config };

    if let Some(fps) = r.parsed("CLI_FPS") {
        r.config.ui.tick_rate = fps;
    }
    if let Some(n) = r.parsed("CLI_MAX_HISTORY") {
        r.config.ui.max_history = n;
    }
    if let Some(n) = r.parsed("CLI_MAX_INPUT") {
        r.config.ui.max_input = n;
    }
    if let Some(secs) = r.parsed("CLI_RECOVERY_SECS") {
        r.config.ui.recovery_delay = Duration::from_secs(secs);
    }
    if let Some(ms) = r.parsed("CLI_ESCAPE_TIMEOUT_MS") {
        r.config.ui.escape_timeout = Duration::from_millis(ms);
    }
    if let Some(stream) = r.flag("CLI_STREAM_TEXT") {
        r.config.ui.stream_text = stream;
    }
    if let Some(boot) = r.flag("CLI_BOOT_SEQUENCE") {
        r.config.ui.boot_sequence = boot;
    }

    if let Some(kind) = r.kind("NEURALLINK_BACKEND") {
        r.config.backend.kind = kind;
    }
    if let Some(url) = r.string("OLLAMA_URL") {
        r.config.backend.url = url;
    }
    if let Some(model) = r.string("OLLAMA_MODEL") {
        r.config.backend.model = model;
    }
    if let Some(prompt) = r.string("OLLAMA_SYSTEM_PROMPT") {
        r.config.backend.system_prompt = prompt;
    }
    if let Some(secs) = r.parsed("OLLAMA_TIMEOUT_SECS") {
        r.config.backend.timeout = Duration::from_secs(secs);
    }

    if let Some(kind) = r.kind("NEURALLINK_SPEAKER") {
        r.config.speaker.kind = kind;
    }
    if let Some(device) = r.string("GOOGLE_HOME_DEVICE") {
        r.config.speaker.device = device;
    }
    if let Some(command) = r.string("SPEAKER_COMMAND") {
        r.config.speaker.command = command;
    }
    if let Some(language) = r.string("TTS_LANGUAGE") {
        r.config.speaker.language = language;
    }

    if let Some(level) = r.string("LOG_LEVEL") {
        r.config.logging.level = level.to_lowercase();
    }
    if let Some(file) = r.string("LOG_FILE") {
        r.config.logging.file = PathBuf::from(file);
    }
    if let Some(n) = r.parsed("LOG_BACKUP_COUNT") {
        r.config.logging.backup_count = n;
    }
}

// =============================================================================
// Tests
// =============================================================================
