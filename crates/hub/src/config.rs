//! Configuration management
//!
//! Every setting has a built-in default, so the config file is optional.
//! It exists for hubs that need longer to enumerate or a different retry
//! budget than the defaults.

use crate::usb::{LocatorPolicy, PowerPlan, TransferPolicy};
use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

const VALID_LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HubPowerConfig {
    #[serde(default)]
    pub locator: LocatorSettings,
    #[serde(default)]
    pub power: PowerSettings,
    #[serde(default)]
    pub hub: HubSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

/// Hub lookup settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocatorSettings {
    /// Number of device list enumerations before giving up
    #[serde(default = "LocatorSettings::default_passes")]
    pub passes: u32,
    /// Seconds to wait between enumerations
    #[serde(default = "LocatorSettings::default_retry_delay")]
    pub retry_delay_secs: u64,
}

impl Default for LocatorSettings {
    fn default() -> Self {
        Self {
            passes: Self::default_passes(),
            retry_delay_secs: Self::default_retry_delay(),
        }
    }
}

impl LocatorSettings {
    fn default_passes() -> u32 {
        2
    }

    fn default_retry_delay() -> u64 {
        4
    }
}

/// Port power transfer settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PowerSettings {
    /// Maximum control transfers for one request
    #[serde(default = "PowerSettings::default_max_attempts")]
    pub max_attempts: u32,
    /// Control transfer timeout in milliseconds
    #[serde(default = "PowerSettings::default_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for PowerSettings {
    fn default() -> Self {
        Self {
            max_attempts: Self::default_max_attempts(),
            timeout_ms: Self::default_timeout_ms(),
        }
    }
}

impl PowerSettings {
    fn default_max_attempts() -> u32 {
        3
    }

    fn default_timeout_ms() -> u64 {
        500
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HubSettings {
    /// USB configuration value the hub is put in before switching power
    #[serde(default = "HubSettings::default_configuration")]
    pub configuration: u8,
}

impl Default for HubSettings {
    fn default() -> Self {
        Self {
            configuration: Self::default_configuration(),
        }
    }
}

impl HubSettings {
    fn default_configuration() -> u8 {
        1
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// tracing level (trace, debug, info, warn, error)
    #[serde(default = "LoggingSettings::default_log_level")]
    pub log_level: String,
    /// libusb's own debug level (none, error, warn, info, debug)
    #[serde(default = "LoggingSettings::default_libusb_log_level")]
    pub libusb_log_level: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            log_level: Self::default_log_level(),
            libusb_log_level: Self::default_libusb_log_level(),
        }
    }
}

impl LoggingSettings {
    fn default_log_level() -> String {
        "warn".to_string()
    }

    fn default_libusb_log_level() -> String {
        "info".to_string()
    }
}

impl HubPowerConfig {
    /// Load configuration from the specified path, or the first standard
    /// location that exists
    pub fn load(path: Option<PathBuf>) -> Result<Self> {
        let config_path = if let Some(p) = path {
            p
        } else {
            Self::candidate_paths()
                .into_iter()
                .find(|p| p.exists())
                .ok_or_else(|| anyhow!("No configuration file found, using defaults"))?
        };

        let content = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;

        let config = Self::from_toml(&content)
            .with_context(|| format!("Failed to parse config file: {}", config_path.display()))?;

        tracing::debug!("Loaded configuration from: {}", config_path.display());
        Ok(config)
    }

    /// Parse and validate a TOML document
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: HubPowerConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Standard locations, in lookup order
    pub fn candidate_paths() -> Vec<PathBuf> {
        vec![
            Self::default_path(),
            PathBuf::from("/etc/hub-port-power/config.toml"),
        ]
    }

    /// Load the first standard location that exists, or defaults if none does
    pub fn load_or_default() -> Result<Self> {
        Self::load_or_default_from(&Self::candidate_paths())
    }

    /// Load the first of `candidates` that exists, or defaults if none does.
    ///
    /// A file that exists but cannot be read or fails validation is an error.
    pub fn load_or_default_from(candidates: &[PathBuf]) -> Result<Self> {
        match candidates.iter().find(|p| p.exists()) {
            Some(path) => Self::load(Some(path.clone())),
            None => {
                tracing::debug!("No configuration file found, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Save configuration to the specified path
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self).context("Failed to serialize configuration")?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        tracing::info!("Saved configuration to: {}", path.display());
        Ok(())
    }

    /// Get the default configuration file path
    pub fn default_path() -> PathBuf {
        if let Some(config_dir) = dirs::config_dir() {
            config_dir.join("hub-port-power").join("config.toml")
        } else {
            PathBuf::from(".config/hub-port-power/config.toml")
        }
    }

    /// Stage tunables derived from this configuration
    pub fn plan(&self) -> PowerPlan {
        PowerPlan {
            locator: LocatorPolicy {
                passes: self.locator.passes,
                retry_delay: Duration::from_secs(self.locator.retry_delay_secs),
            },
            configuration: self.hub.configuration,
            transfer: TransferPolicy {
                max_attempts: self.power.max_attempts,
                timeout: Duration::from_millis(self.power.timeout_ms),
            },
        }
    }

    pub fn libusb_log_level(&self) -> Result<rusb::LogLevel> {
        parse_libusb_log_level(&self.logging.libusb_log_level)
    }

    /// Validate configuration values
    fn validate(&self) -> Result<()> {
        if !VALID_LOG_LEVELS.contains(&self.logging.log_level.as_str()) {
            return Err(anyhow!(
                "Invalid log level '{}', must be one of: {}",
                self.logging.log_level,
                VALID_LOG_LEVELS.join(", ")
            ));
        }
        self.libusb_log_level()?;

        if self.locator.passes == 0 {
            return Err(anyhow!("locator.passes must be at least 1"));
        }
        if self.power.max_attempts == 0 {
            return Err(anyhow!("power.max_attempts must be at least 1"));
        }
        if self.power.timeout_ms == 0 {
            return Err(anyhow!("power.timeout_ms must be greater than 0"));
        }
        if self.hub.configuration == 0 {
            return Err(anyhow!("hub.configuration must be at least 1"));
        }

        Ok(())
    }
}

/// Map a libusb debug level name to [`rusb::LogLevel`]
pub fn parse_libusb_log_level(level: &str) -> Result<rusb::LogLevel> {
    match level {
        "none" => Ok(rusb::LogLevel::None),
        "error" => Ok(rusb::LogLevel::Error),
        "warn" | "warning" => Ok(rusb::LogLevel::Warning),
        "info" => Ok(rusb::LogLevel::Info),
        "debug" => Ok(rusb::LogLevel::Debug),
        other => Err(anyhow!(
            "Invalid libusb log level '{}', must be one of: none, error, warn, info, debug",
            other
        )),
    }
}

/// Resolve a user supplied config path, expanding `~`
pub fn expand_path(path: &Path) -> PathBuf {
    PathBuf::from(shellexpand::tilde(&path.to_string_lossy()).as_ref())
}
