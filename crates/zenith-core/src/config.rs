use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Configuration validation errors
#[derive(Debug, Clone)]
pub struct ConfigValidationError {
    pub field: String,
    pub message: String,
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Result of config validation
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationError>,
}

impl ValidationResult {
    /// Returns true if there are no errors (warnings are OK)
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Add an error
    pub fn add_error(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    /// Add a warning
    pub fn add_warning(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    /// Get a user-friendly message summarizing all errors
    pub fn error_summary(&self) -> String {
        if self.errors.is_empty() {
            return String::new();
        }
        self.errors
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("; ")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Directory holding all persisted state (task data, session, alerts)
    pub data_dir: PathBuf,

    /// Storage backend settings
    #[serde(default)]
    pub storage: StorageConfig,

    /// Reminder scanner settings
    #[serde(default)]
    pub reminders: RemindersConfig,

    /// UI preferences
    pub ui: UiConfig,
}

/// Which local storage mechanism backs the key-value port
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackendKind {
    /// One JSON file per key under `data_dir`
    #[default]
    File,
    /// Single key/value table in a SQLite database under `data_dir`
    Sqlite,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Backend selection
    #[serde(default)]
    pub backend: StorageBackendKind,

    /// Database filename used by the sqlite backend
    #[serde(default = "default_sqlite_file")]
    pub sqlite_file: String,
}

fn default_sqlite_file() -> String {
    "zenith.db".to_string()
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackendKind::default(),
            sqlite_file: default_sqlite_file(),
        }
    }
}

impl StorageConfig {
    /// Full path of the sqlite database under the given data directory.
    pub fn sqlite_path(&self, data_dir: &Path) -> PathBuf {
        data_dir.join(&self.sqlite_file)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemindersConfig {
    /// Whether the overdue scanner runs at all
    #[serde(default = "default_reminders_enabled")]
    pub enabled: bool,

    /// Polling cadence in seconds (default: 60, 0 disables scanning)
    #[serde(default = "default_poll_seconds")]
    pub poll_seconds: u64,
}

fn default_reminders_enabled() -> bool {
    true
}

fn default_poll_seconds() -> u64 {
    60
}

impl Default for RemindersConfig {
    fn default() -> Self {
        Self {
            enabled: default_reminders_enabled(),
            poll_seconds: default_poll_seconds(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiConfig {
    /// Window width
    pub window_width: u32,

    /// Window height
    pub window_height: u32,

    /// Dark mode enabled
    pub dark_mode: bool,
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("zenith");

        Self {
            data_dir,
            storage: StorageConfig::default(),
            reminders: RemindersConfig::default(),
            ui: UiConfig {
                window_width: 1200,
                window_height: 800,
                dark_mode: true,
            },
        }
    }
}

impl Config {
    /// Load configuration from file, creating default if it doesn't exist
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            let config = Self::default();
            config.save()?;
            return Ok(config);
        }

        let contents = std::fs::read_to_string(&config_path)
            .context("Failed to read config file")?;

        let config: Config = toml::from_str(&contents)
            .context("Failed to parse config file")?;

        Ok(config)
    }

    /// Load configuration and validate it
    ///
    /// Returns the config along with any validation warnings.
    /// Returns an error if validation fails with critical errors.
    pub fn load_validated() -> Result<(Self, ValidationResult)> {
        let config = Self::load()?;
        let validation = config.validate();

        if !validation.is_valid() {
            anyhow::bail!(
                "Configuration validation failed: {}",
                validation.error_summary()
            );
        }

        if !validation.warnings.is_empty() {
            for warning in &validation.warnings {
                tracing::warn!("Config warning: {}", warning);
            }
        }

        Ok((config, validation))
    }

    /// Validate the configuration
    ///
    /// Returns a ValidationResult containing any errors or warnings.
    pub fn validate(&self) -> ValidationResult {
        let mut result = ValidationResult::default();

        // Validate window dimensions
        if self.ui.window_width == 0 {
            result.add_error("ui.window_width", "Window width must be greater than 0");
        } else if self.ui.window_width > 10000 {
            result.add_warning("ui.window_width", "Window width is unusually large (>10000)");
        }

        if self.ui.window_height == 0 {
            result.add_error("ui.window_height", "Window height must be greater than 0");
        } else if self.ui.window_height > 10000 {
            result.add_warning("ui.window_height", "Window height is unusually large (>10000)");
        }

        // Validate reminder polling cadence
        if self.reminders.poll_seconds == 0 {
            result.add_warning(
                "reminders.poll_seconds",
                "Reminder scanning disabled (0 seconds)",
            );
        } else if self.reminders.poll_seconds > 86400 {
            result.add_warning(
                "reminders.poll_seconds",
                "Reminder polling interval is more than 24 hours",
            );
        }

        // Validate sqlite filename
        if self.storage.backend == StorageBackendKind::Sqlite
            && self.storage.sqlite_file.trim().is_empty()
        {
            result.add_error("storage.sqlite_file", "Database filename cannot be empty");
        }

        // Validate data directory (created on demand, so only warn)
        if !self.data_dir.exists() {
            result.add_warning(
                "data_dir",
                format!(
                    "Directory does not exist yet: {}",
                    self.data_dir.display()
                ),
            );
        } else if !self.data_dir.is_dir() {
            result.add_error(
                "data_dir",
                format!(
                    "Path is not a directory: {}",
                    self.data_dir.display()
                ),
            );
        }

        result
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;

        // Ensure config directory exists
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)
                .context("Failed to create config directory")?;
        }

        let contents = toml::to_string_pretty(self)
            .context("Failed to serialize config")?;

        std::fs::write(&config_path, contents)
            .context("Failed to write config file")?;

        Ok(())
    }

    /// Get the path to the configuration file
    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Failed to get config directory")?
            .join("zenith");

        Ok(config_dir.join("config.toml"))
    }
}
