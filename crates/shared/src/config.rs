//! Migrator configuration management.

use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Primary configuration file checked before building a runner.
const CONFIG_FILE: &str = "config/default.toml";

/// Migrator configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct MigratorConfig {
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Tracking-table configuration.
    #[serde(default)]
    pub storage: StorageConfig,
    /// Script directory configuration.
    #[serde(default)]
    pub paths: PathsConfig,
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Database connection URL.
    pub url: String,
    /// Schema the tracking table lives in (Postgres only).
    #[serde(default)]
    pub schema: Option<String>,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

/// Tracking-table configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Table recording applied migrations.
    #[serde(default = "default_table_name")]
    pub table_name: String,
    /// Column holding the migration name.
    #[serde(default = "default_column_name")]
    pub column_name: String,
    /// Table recording applied seed scripts.
    #[serde(default = "default_seed_table_name")]
    pub seed_table_name: String,
}

fn default_table_name() -> String {
    "SequelizeMeta".to_string()
}

fn default_column_name() -> String {
    "name".to_string()
}

fn default_seed_table_name() -> String {
    "SequelizeData".to_string()
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            table_name: default_table_name(),
            column_name: default_column_name(),
            seed_table_name: default_seed_table_name(),
        }
    }
}

/// Script directory configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct PathsConfig {
    /// Directory holding migration scripts.
    #[serde(default = "default_migrations_dir")]
    pub migrations: PathBuf,
    /// Directory holding seed scripts.
    #[serde(default = "default_seeders_dir")]
    pub seeders: PathBuf,
}

fn default_migrations_dir() -> PathBuf {
    PathBuf::from("migrations")
}

fn default_seeders_dir() -> PathBuf {
    PathBuf::from("seeders")
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            migrations: default_migrations_dir(),
            seeders: default_seeders_dir(),
        }
    }
}

impl MigratorConfig {
    /// Returns the path of the primary configuration file.
    #[must_use]
    pub fn config_file() -> &'static Path {
        Path::new(CONFIG_FILE)
    }

    /// Returns true if the primary configuration file exists.
    #[must_use]
    pub fn file_exists() -> bool {
        Self::config_file().is_file()
    }

    /// Loads configuration from environment and config files.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("TIDEMARK").separator("__"))
            .build()?;

        config.try_deserialize()
    }

    /// Builds a configuration from a bare connection URL, with defaults
    /// for everything else.
    #[must_use]
    pub fn from_url(url: &str) -> Self {
        Self {
            database: DatabaseConfig {
                url: url.to_string(),
                schema: None,
                max_connections: default_max_connections(),
                min_connections: default_min_connections(),
            },
            storage: StorageConfig::default(),
            paths: PathsConfig::default(),
        }
    }

    /// Resolves the effective configuration for a command invocation.
    ///
    /// A URL supplied on the command line takes precedence over the
    /// configured URL. When no config file exists the URL alone drives
    /// the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be loaded.
    pub fn resolve(url_override: Option<&str>) -> Result<Self, config::ConfigError> {
        match url_override {
            Some(url) if !Self::file_exists() => Ok(Self::from_url(url)),
            Some(url) => {
                let mut cfg = Self::load()?;
                cfg.database.url = url.to_string();
                Ok(cfg)
            }
            None => Self::load(),
        }
    }
}
