use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{ImportError, Result};

/// Application configuration structure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Where to read CSV files and write the store
    pub import: ImportConfig,
    /// Log output
    pub logging: LoggingConfig,
}

/// Rebuild inputs and output
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportConfig {
    /// Directory holding the nine CSV exports
    pub data_dir: String,
    /// SQLite store file, replaced on every rebuild
    pub database_path: String,
    /// Fail the rebuild if foreign keys dangle after the last file
    pub enforce_foreign_keys: bool,
}

/// Log output settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter when `RUST_LOG` is unset
    pub level: String,
    /// Optional rolling JSON log file
    #[serde(default)]
    pub file_path: Option<String>,
    /// Console format, "text" or "json"
    pub format: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            import: ImportConfig {
                data_dir: "data/ethereum_go".to_string(),
                database_path: "data/ethereum_tool.db".to_string(),
                enforce_foreign_keys: false,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                file_path: None,
                format: "text".to_string(),
            },
        }
    }
}

/// Prefix of environment overrides, e.g. `ETHER_DASH__IMPORT__DATA_DIR`
pub const ENV_PREFIX: &str = "ETHER_DASH";

impl AppConfig {
    /// Load configuration from multiple sources with precedence
    ///
    /// Defaults, then `config/default`, `config/local` and `ether_dash`
    /// files in any supported format, then `ETHER_DASH__*` variables. An
    /// explicit `path` is layered last among the files and must exist.
    pub fn load(path: Option<&std::path::Path>) -> Result<Self> {
        let defaults = Self::default();
        let mut builder = Config::builder()
            // Start with default values
            .set_default("import.data_dir", defaults.import.data_dir)
            .and_then(|b| b.set_default("import.database_path", defaults.import.database_path))
            .and_then(|b| {
                b.set_default("import.enforce_foreign_keys", defaults.import.enforce_foreign_keys)
            })
            .and_then(|b| b.set_default("logging.level", defaults.logging.level))
            .and_then(|b| b.set_default("logging.format", defaults.logging.format))
            .map_err(config_error)?
            // Add config file if it exists
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            .add_source(File::with_name("ether_dash").required(false));

        if let Some(path) = path {
            builder = builder.add_source(File::from(path).required(true));
        }

        let app_config: Self = builder
            // Add environment variables with prefix
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()
            .map_err(config_error)?
            .try_deserialize()
            .map_err(config_error)?;

        // Validate configuration
        app_config.validate()?;

        Ok(app_config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.import.data_dir.trim().is_empty() {
            return Err(ImportError::InvalidConfig("import.data_dir must not be empty".into()));
        }
        if self.import.database_path.trim().is_empty() {
            return Err(ImportError::InvalidConfig(
                "import.database_path must not be empty".into(),
            ));
        }

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            return Err(ImportError::InvalidConfig(format!(
                "Invalid log level: {}. Must be one of: {:?}",
                self.logging.level, valid_levels
            )));
        }

        let valid_formats = ["text", "json"];
        if !valid_formats.contains(&self.logging.format.as_str()) {
            return Err(ImportError::InvalidConfig(format!(
                "Invalid log format: {}. Must be one of: {:?}",
                self.logging.format, valid_formats
            )));
        }

        Ok(())
    }

    /// Input directory
    #[must_use]
    pub fn data_dir(&self) -> PathBuf {
        PathBuf::from(&self.import.data_dir)
    }

    /// Store file
    #[must_use]
    pub fn database_path(&self) -> PathBuf {
        PathBuf::from(&self.import.database_path)
    }
}

fn config_error(e: config::ConfigError) -> ImportError {
    ImportError::InvalidConfig(e.to_string())
}
