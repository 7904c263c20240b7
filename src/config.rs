//! Configuration management
//!
//! Loads the storage settings and validation policy once at startup from
//! built-in defaults, an optional `config.toml`, and `HOOKSTORE_*`
//! environment overrides. The loaded configuration is immutable and passed
//! by reference into every call.

use ::config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;
use std::path::{Path, PathBuf};

use crate::security;

/// Complete application configuration
#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    #[serde(flatten)]
    pub storage: StorageConfig,

    #[serde(flatten)]
    pub policy: ValidationPolicy,
}

/// Where and how files are written
#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    /// Root directory for persisted payloads; made absolute at load time
    pub storage_root: String,

    /// Maximum size of a single persisted file in MB
    pub max_file_size_mb: u64,
}

/// Limits applied to every submitted payload
#[derive(Debug, Deserialize, Clone)]
pub struct ValidationPolicy {
    pub max_title_length: usize,
    pub max_desc_length: usize,

    /// Maximum serialized size of the data field in bytes
    pub max_data_size: u64,

    pub max_nesting_depth: usize,
    pub max_string_length: usize,
    pub max_array_length: usize,
    pub max_object_keys: usize,

    /// File extensions acceptable for stored artifacts
    pub allowed_extensions: Vec<String>,

    /// Names that must not appear as top-level keys in the data field,
    /// matched case-insensitively
    pub reserved_field_names: Vec<String>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            storage_root: "./storage".to_string(),
            max_file_size_mb: 10,
        }
    }
}

impl Default for ValidationPolicy {
    fn default() -> Self {
        Self {
            max_title_length: 64,
            max_desc_length: 512,
            max_data_size: 5 * 1024 * 1024,
            max_nesting_depth: 5,
            max_string_length: 10_000,
            max_array_length: 1000,
            max_object_keys: 100,
            allowed_extensions: ["json", "txt", "log", "csv", "xml", "yaml", "yml"]
                .map(String::from)
                .to_vec(),
            reserved_field_names: ["id", "timestamp", "title", "description", "source", "type"]
                .map(String::from)
                .to_vec(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            storage: StorageConfig::default(),
            policy: ValidationPolicy::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from defaults, an optional `config.toml`, and
    /// environment overrides, in increasing precedence.
    pub fn load() -> Result<Self, ConfigError> {
        let defaults = AppConfig::default();
        let settings = Config::builder()
            .set_default("storage_root", defaults.storage.storage_root.as_str())?
            .set_default("max_file_size_mb", defaults.storage.max_file_size_mb)?
            .set_default("max_title_length", defaults.policy.max_title_length as u64)?
            .set_default("max_desc_length", defaults.policy.max_desc_length as u64)?
            .set_default("max_data_size", defaults.policy.max_data_size)?
            .set_default("max_nesting_depth", defaults.policy.max_nesting_depth as u64)?
            .set_default("max_string_length", defaults.policy.max_string_length as u64)?
            .set_default("max_array_length", defaults.policy.max_array_length as u64)?
            .set_default("max_object_keys", defaults.policy.max_object_keys as u64)?
            .set_default("allowed_extensions", defaults.policy.allowed_extensions)?
            .set_default("reserved_field_names", defaults.policy.reserved_field_names)?
            .add_source(File::with_name("config").required(false))
            .add_source(Environment::with_prefix("HOOKSTORE"))
            .build()?;

        let mut config: AppConfig = settings.try_deserialize()?;
        config.validate()?;
        config.storage.absolutize().map_err(|e| {
            ConfigError::Message(format!("failed to resolve storage root: {}", e))
        })?;
        Ok(config)
    }

    /// Validation for all configuration values
    fn validate(&self) -> Result<(), ConfigError> {
        if self.storage.storage_root.is_empty() {
            return Err(ConfigError::Message("storage_root cannot be empty".into()));
        }

        if self.storage.max_file_size_mb == 0 {
            return Err(ConfigError::Message(
                "max_file_size_mb must be greater than 0".into(),
            ));
        }

        if self.storage.max_file_size_mb > 100 {
            return Err(ConfigError::Message(
                "max_file_size_mb too large (max 100)".into(),
            ));
        }

        if self.policy.max_title_length == 0 || self.policy.max_title_length > 1024 {
            return Err(ConfigError::Message(
                "max_title_length must be between 1 and 1024".into(),
            ));
        }

        if self.policy.max_desc_length > 4096 {
            return Err(ConfigError::Message(
                "max_desc_length too large (max 4096)".into(),
            ));
        }

        if self.policy.max_data_size == 0 {
            return Err(ConfigError::Message(
                "max_data_size must be greater than 0".into(),
            ));
        }

        if self.policy.max_nesting_depth == 0 {
            return Err(ConfigError::Message(
                "max_nesting_depth must be greater than 0".into(),
            ));
        }

        if self.policy.max_string_length == 0
            || self.policy.max_array_length == 0
            || self.policy.max_object_keys == 0
        {
            return Err(ConfigError::Message(
                "data limits must be greater than 0".into(),
            ));
        }

        for ext in &self.policy.allowed_extensions {
            if ext.is_empty() {
                return Err(ConfigError::Message(
                    "empty extension in allowed_extensions".into(),
                ));
            }
            if ext.contains('.') {
                return Err(ConfigError::Message(format!(
                    "extension should not contain dot: {}",
                    ext
                )));
            }
        }

        Ok(())
    }
}

impl StorageConfig {
    /// Get the storage root as a PathBuf
    pub fn storage_root_path(&self) -> PathBuf {
        PathBuf::from(&self.storage_root)
    }

    /// Get the maximum file size in bytes
    pub fn max_file_size_bytes(&self) -> u64 {
        self.max_file_size_mb * 1024 * 1024
    }

    fn absolutize(&mut self) -> std::io::Result<()> {
        let root = Path::new(&self.storage_root);
        if !root.is_absolute() {
            let abs = security::lexical_clean(&env::current_dir()?.join(root));
            self.storage_root = abs.to_string_lossy().into_owned();
        }
        Ok(())
    }
}

impl ValidationPolicy {
    /// Whether a data key collides with a system-owned metadata name
    pub fn is_reserved_field(&self, name: &str) -> bool {
        self.reserved_field_names
            .iter()
            .any(|reserved| reserved.eq_ignore_ascii_case(name))
    }

    /// Whether a file extension (without dot) is acceptable for storage
    pub fn allows_extension(&self, extension: &str) -> bool {
        self.allowed_extensions
            .iter()
            .any(|allowed| allowed.eq_ignore_ascii_case(extension))
    }
}
