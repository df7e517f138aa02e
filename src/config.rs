//! Configuration management
//!
//! Handles loading, parsing, and validating the TOML configuration file:
//! classification policy, level threshold, IPC read timeout, and log level.

use color_eyre::eyre::{self, Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

use crate::sessions::PlayingPolicy;

// ============================================================================
// Public Configuration Types
// ============================================================================

/// Main configuration structure
#[derive(Debug, Clone)]
pub struct Config {
    pub settings: Settings,
}

/// Global settings
#[derive(Debug, Clone)]
pub struct Settings {
    /// Classification policy: `state` (mixer-reported activity) or `level`
    /// (unmuted and above `peak_threshold`).
    pub policy: PlayingPolicy,
    /// How long the daemon waits for a connected client's command.
    pub read_timeout: Duration,
    pub log_level: String,
}

// ============================================================================
// Config File Deserialization (TOML)
// ============================================================================

#[derive(Debug, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    settings: SettingsFile,
}

#[derive(Debug, Deserialize)]
struct SettingsFile {
    #[serde(default = "default_policy")]
    policy: String,
    #[serde(default = "default_threshold")]
    peak_threshold: f32,
    #[serde(default = "default_read_timeout_secs")]
    read_timeout_secs: u64,
    #[serde(default = "default_log_level")]
    log_level: String,
}

fn default_policy() -> String {
    "state".to_string()
}

fn default_threshold() -> f32 {
    PlayingPolicy::DEFAULT_THRESHOLD
}

fn default_read_timeout_secs() -> u64 {
    10
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for SettingsFile {
    fn default() -> Self {
        Self {
            policy: default_policy(),
            peak_threshold: default_threshold(),
            read_timeout_secs: default_read_timeout_secs(),
            log_level: default_log_level(),
        }
    }
}

// ============================================================================
// Config Implementation
// ============================================================================

impl Config {
    /// Load the config file, creating a commented default on first run.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read, parsed, or validated.
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            info!("creating default config at {}", config_path.display());
            Self::create_default_config(&config_path)?;
        }

        Self::load_from(&config_path)
    }

    /// Load from an explicit path. Used by tests.
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;

        let config_file: ConfigFile = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config: {}", path.display()))?;

        Self::from_config_file(config_file)
    }

    fn from_config_file(config_file: ConfigFile) -> Result<Self> {
        let file = config_file.settings;

        if !(0.0..=1.0).contains(&file.peak_threshold) {
            eyre::bail!(
                "Invalid peak_threshold {}. Must be between 0.0 and 1.0",
                file.peak_threshold
            );
        }

        let policy = match file.policy.as_str() {
            "state" => PlayingPolicy::State,
            "level" => PlayingPolicy::Level {
                threshold: file.peak_threshold,
            },
            other => eyre::bail!("Invalid policy '{other}'. Must be: state or level"),
        };

        match file.log_level.as_str() {
            "error" | "warn" | "info" | "debug" | "trace" => {}
            level => eyre::bail!(
                "Invalid log_level '{level}'. Must be: error, warn, info, debug, or trace"
            ),
        }

        if file.read_timeout_secs == 0 {
            eyre::bail!("Invalid read_timeout_secs 0. The client read must be bounded");
        }

        Ok(Self {
            settings: Settings {
                policy,
                read_timeout: Duration::from_secs(file.read_timeout_secs),
                log_level: file.log_level,
            },
        })
    }

    /// Path to the config file, creating the directory if needed.
    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| eyre::eyre!("Could not determine config directory"))?
            .join("sndwho");
        fs::create_dir_all(&config_dir)
            .with_context(|| format!("Failed to create config dir: {}", config_dir.display()))?;
        Ok(config_dir.join("config.toml"))
    }

    fn create_default_config(path: &Path) -> Result<()> {
        let default_config = r#"# sndwho configuration

[settings]
policy = "state"          # "state": session is playing iff the mixer reports it active
                          # "level": session is playing iff unmuted and above peak_threshold
peak_threshold = 0.001    # only used by the "level" policy (0.0 - 1.0)
read_timeout_secs = 10    # how long the daemon waits for a client's command
log_level = "info"        # error, warn, info, debug, trace
"#;
        fs::write(path, default_config)
            .with_context(|| format!("Failed to write config: {}", path.display()))?;
        Ok(())
    }

    /// Print a human-readable summary (for the `validate` command).
    pub fn print_summary(&self) {
        println!("Configuration valid\n");
        println!("Settings:");
        match self.settings.policy {
            PlayingPolicy::State => println!("  policy: state"),
            PlayingPolicy::Level { threshold } => {
                println!("  policy: level (threshold: {threshold})");
            }
        }
        println!("  read_timeout: {}s", self.settings.read_timeout.as_secs());
        println!("  log_level: {}", self.settings.log_level);

        if let Ok(path) = Self::config_path() {
            println!("\nConfig: {}", path.display());
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            settings: Settings {
                policy: PlayingPolicy::State,
                read_timeout: Duration::from_secs(default_read_timeout_secs()),
                log_level: default_log_level(),
            },
        }
    }
}
