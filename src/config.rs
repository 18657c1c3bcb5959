/*!
 * Configuration for the Tether client
 */

use crate::error::{Result, TetherError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tether_connect::LaunchOptions;
use tether_proto::KNOWN_TARGETS;

pub const ENV_SPEC: &str = "TETHER_SPEC";
pub const ENV_HOST_BIN: &str = "TETHER_HOST_BIN";
pub const ENV_PORT: &str = "TETHER_PORT";

/// Client configuration: which host to launch and how to log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TetherConfig {
    /// Class/member specification shared with the host
    #[serde(default = "default_spec_path")]
    pub spec_path: PathBuf,

    /// Host executable
    #[serde(default = "default_host_program")]
    pub host_program: PathBuf,

    /// Root object kind to open a session for
    #[serde(default = "default_target")]
    pub target: String,

    /// Launch with a visible window
    #[serde(default)]
    pub visible: bool,

    /// Pass `--debug` to the host and show its log output
    #[serde(default)]
    pub debug: bool,

    /// Fixed host port (None = pick a free one)
    #[serde(default)]
    pub port: Option<u16>,

    /// Seconds to wait for the host to accept connections
    #[serde(default = "default_startup_timeout")]
    pub startup_timeout_secs: u64,

    /// Launch attempts when an auto-selected port is taken first
    #[serde(default = "default_bind_attempts")]
    pub bind_attempts: u32,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,

    /// Log file path (None = stderr)
    #[serde(default)]
    pub log_file: Option<PathBuf>,
}

impl Default for TetherConfig {
    fn default() -> Self {
        Self {
            spec_path: default_spec_path(),
            host_program: default_host_program(),
            target: default_target(),
            visible: false,
            debug: false,
            port: None,
            startup_timeout_secs: default_startup_timeout(),
            bind_attempts: default_bind_attempts(),
            log_level: LogLevel::default(),
            log_file: None,
        }
    }
}

/// Log level for diagnostic output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    #[default]
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    /// Convert to tracing::Level
    pub fn to_tracing_level(&self) -> tracing::Level {
        match self {
            LogLevel::Error => tracing::Level::ERROR,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Trace => tracing::Level::TRACE,
        }
    }
}

// Default value functions for serde
fn default_spec_path() -> PathBuf {
    PathBuf::from("specs/sandbox.json")
}

fn default_host_program() -> PathBuf {
    PathBuf::from("tether-host")
}

fn default_target() -> String {
    "chromium".to_string()
}

fn default_startup_timeout() -> u64 {
    30
}

fn default_bind_attempts() -> u32 {
    3
}

impl TetherConfig {
    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            TetherError::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        toml::from_str(&contents)
            .map_err(|e| TetherError::Config(format!("Invalid {}: {}", path.display(), e)))
    }

    /// Save configuration to a TOML file
    pub fn to_file(&self, path: &Path) -> Result<()> {
        let contents = toml::to_string_pretty(self)
            .map_err(|e| TetherError::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Apply `TETHER_SPEC`, `TETHER_HOST_BIN` and `TETHER_PORT` from the process environment
    pub fn apply_env(&mut self) -> Result<()> {
        self.apply_env_from(|key| std::env::var(key).ok())
    }

    /// Apply environment overrides read through `lookup`
    pub fn apply_env_from<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(spec) = lookup(ENV_SPEC) {
            self.spec_path = PathBuf::from(spec);
        }
        if let Some(program) = lookup(ENV_HOST_BIN) {
            self.host_program = PathBuf::from(program);
        }
        if let Some(port) = lookup(ENV_PORT) {
            let port = port
                .trim()
                .parse::<u16>()
                .map_err(|_| TetherError::Config(format!("{} is not a port: {}", ENV_PORT, port)))?;
            self.port = Some(port);
        }
        Ok(())
    }

    /// Check settings the supervisor would otherwise reject late
    pub fn validate(&self) -> Result<()> {
        if !KNOWN_TARGETS.contains(&self.target.as_str()) {
            return Err(TetherError::Config(format!(
                "Unknown target {} (expected one of {})",
                self.target,
                KNOWN_TARGETS.join(", ")
            )));
        }
        if self.startup_timeout_secs == 0 {
            return Err(TetherError::Config(
                "startup_timeout_secs must be at least 1".to_string(),
            ));
        }
        if self.bind_attempts == 0 {
            return Err(TetherError::Config(
                "bind_attempts must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// The host program to spawn.
    ///
    /// A bare default name prefers a `tether-host` installed next to the
    /// running executable over a `PATH` lookup.
    pub fn resolve_host_program(&self) -> PathBuf {
        if self.host_program != default_host_program() {
            return self.host_program.clone();
        }
        std::env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(|dir| dir.join(host_file_name())))
            .filter(|candidate| candidate.is_file())
            .unwrap_or_else(|| self.host_program.clone())
    }

    /// Supervisor options for these settings
    pub fn to_launch_options(&self) -> LaunchOptions {
        let mut options = LaunchOptions::new(
            self.resolve_host_program(),
            self.spec_path.clone(),
            self.target.clone(),
        )
        .with_visible(self.visible)
        .with_debug(self.debug)
        .with_startup_timeout(Duration::from_secs(self.startup_timeout_secs));
        options.port = self.port;
        options.bind_attempts = self.bind_attempts;
        options
    }
}

fn host_file_name() -> String {
    format!("tether-host{}", std::env::consts::EXE_SUFFIX)
}
