//! Configuration Loader
//!
//! Environment-aware loading on top of the `config` crate.

use config::{Config, Environment, File};
use std::env;
use std::path::{Path, PathBuf};
use tracing::debug;

use super::error::ConfigResult;
use super::ShopfloorConfig;

/// Environment variable selecting the deployment environment
pub const ENVIRONMENT_VAR: &str = "SHOPFLOOR_ENV";
/// Prefix for environment overrides
pub const ENV_PREFIX: &str = "SHOPFLOOR";

pub struct ConfigLoader;

impl ConfigLoader {
    /// Load from `./config` with the environment auto-detected
    pub fn load() -> ConfigResult<ShopfloorConfig> {
        Self::load_from_directory(Path::new("config"), &Self::detect_environment())
    }

    /// Load from a specific directory with an explicit environment
    pub fn load_from_directory(config_dir: &Path, environment: &str) -> ConfigResult<ShopfloorConfig> {
        let defaults = ShopfloorConfig::default();

        debug!(
            environment = environment,
            config_dir = %config_dir.display(),
            "Loading shopfloor configuration"
        );

        let settings = Config::builder()
            .set_default("environment", environment)?
            .set_default("database.url", defaults.database.url)?
            .set_default("database.max_connections", i64::from(defaults.database.max_connections))?
            .set_default(
                "database.acquire_timeout_seconds",
                defaults.database.acquire_timeout_seconds as i64,
            )?
            .set_default("database.run_migrations", defaults.database.run_migrations)?
            .set_default("events.channel_capacity", defaults.events.channel_capacity as i64)?
            .set_default("logging.level", defaults.logging.level)?
            .set_default("logging.json", defaults.logging.json)?
            .add_source(File::from(Self::file_path(config_dir, "default")).required(false))
            .add_source(File::from(Self::file_path(config_dir, environment)).required(false))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let mut config: ShopfloorConfig = settings.try_deserialize()?;
        config.environment = environment.to_string();
        config.validate()?;

        debug!(
            environment = %config.environment,
            max_connections = config.database.max_connections,
            channel_capacity = config.events.channel_capacity,
            "Configuration loaded successfully"
        );
        Ok(config)
    }

    /// Current environment from `SHOPFLOOR_ENV`, defaulting to development
    pub fn detect_environment() -> String {
        env::var(ENVIRONMENT_VAR).unwrap_or_else(|_| "development".to_string())
    }

    fn file_path(config_dir: &Path, name: &str) -> PathBuf {
        config_dir.join(format!("{name}.toml"))
    }
}
